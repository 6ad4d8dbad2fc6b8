use async_trait::async_trait;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::CartResult;

/// The authenticated-user context supplied by the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            email: None,
        }
    }
}

/// The two facts the cart engine consumes about authentication: who is signed
/// in right now, and when that changes.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current(&self) -> CartResult<Option<Identity>>;

    /// Receiver that observes every sign-in, sign-out and token refresh.
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;
}

/// In-process identity provider. The storefront's session layer drives it;
/// the engine only ever reads from it.
#[derive(Debug)]
pub struct SessionBroker {
    tx: watch::Sender<Option<Identity>>,
}

impl SessionBroker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn signed_in(identity: Identity) -> Self {
        let (tx, _) = watch::channel(Some(identity));
        Self { tx }
    }

    pub fn sign_in(&self, identity: Identity) {
        self.tx.send_replace(Some(identity));
    }

    pub fn sign_out(&self) {
        self.tx.send_replace(None);
    }

    /// A token refresh re-announces the same identity; subscribers decide
    /// whether anything needs doing.
    pub fn refresh(&self, identity: Identity) {
        self.tx.send_replace(Some(identity));
    }
}

impl Default for SessionBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for SessionBroker {
    async fn current(&self) -> CartResult<Option<Identity>> {
        Ok(self.tx.borrow().clone())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broker_reports_transitions() {
        let broker = SessionBroker::new();
        assert_eq!(broker.current().await.unwrap(), None);

        let identity = Identity::new(Uuid::new_v4());
        broker.sign_in(identity.clone());
        assert_eq!(broker.current().await.unwrap(), Some(identity));

        broker.sign_out();
        assert_eq!(broker.current().await.unwrap(), None);
    }

    #[tokio::test]
    async fn subscribers_observe_changes() {
        let broker = SessionBroker::new();
        let mut rx = broker.subscribe();
        broker.sign_in(Identity::new(Uuid::new_v4()));
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_some());
    }
}
