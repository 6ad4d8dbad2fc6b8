use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Connection string for the remote cart store. Absent means the engine
    /// runs guest-only and remote operations fail with a configuration error.
    pub database_url: Option<String>,
    /// Where the guest cart file lives.
    pub guest_cart_path: PathBuf,
    /// Upper bound on any single store call.
    pub store_timeout: Duration,
    /// Extra attempts for idempotent reads. Writes are never retried.
    pub read_retries: u32,
    /// Base delay for the read back-off schedule, in milliseconds.
    pub retry_base_ms: u64,
}

impl EngineConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").ok();
        let guest_cart_path = env::var("GUEST_CART_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_guest_cart_path());
        let store_timeout = env::var("STORE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));
        let read_retries = env::var("READ_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(3);
        let retry_base_ms = env::var("RETRY_BASE_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1_000);
        Ok(Self {
            database_url,
            guest_cart_path,
            store_timeout,
            read_retries,
            retry_base_ms,
        })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            guest_cart_path: default_guest_cart_path(),
            store_timeout: Duration::from_secs(10),
            read_retries: 3,
            retry_base_ms: 1_000,
        }
    }
}

fn default_guest_cart_path() -> PathBuf {
    env::temp_dir().join("bakery_cart_guest.json")
}
