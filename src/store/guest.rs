use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::error::CartResult;
use crate::models::CartItem;
use crate::store::GuestCartStore;

/// Guest cart persisted as a JSON file, the device-local analog of the
/// authenticated user's remote rows.
#[derive(Debug, Clone)]
pub struct JsonGuestStore {
    path: PathBuf,
}

impl JsonGuestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl GuestCartStore for JsonGuestStore {
    async fn read(&self) -> CartResult<Option<Vec<CartItem>>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, items: &[CartItem]) -> CartResult<()> {
        let bytes = serde_json::to_vec_pretty(items)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, bytes).await?;
        Ok(())
    }

    async fn clear(&self) -> CartResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
