//! The cart engine: owns the in-memory item list, decides which store backs
//! it (remote rows for an authenticated session, the local guest file
//! otherwise), and applies the pricing rules on every read.
//!
//! State changes follow mutate-then-notify: after every operation the engine
//! publishes a fresh [`CartSnapshot`] on a watch channel, and user-facing
//! outcomes go out as [`Notice`] events. Store failures never leave state
//! partially applied: either the operation is rejected before any call, the
//! in-memory list is untouched, or the list is reloaded from the source of
//! truth.

use std::sync::{Arc, Weak};

use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{CartError, CartResult};
use crate::identity::{Identity, IdentityProvider};
use crate::models::{
    BulkOrderDetails, CartItem, CartSnapshot, Product, ProductCategory, normalize_product_id,
};
use crate::notify::{Notice, NoticeSink};
use crate::pricing;
use crate::retry;
use crate::store::{GuestCartStore, NewCartRow, RemoteCartStore};

struct EngineState {
    items: Vec<CartItem>,
    loading: bool,
}

/// One engine instance per page session. Construct it with its collaborators,
/// call [`CartEngine::synchronize`] once, and let
/// [`CartEngine::spawn_identity_watcher`] keep it aligned with sign-ins and
/// sign-outs. Dropping the engine stops the watcher.
pub struct CartEngine {
    identity: Arc<dyn IdentityProvider>,
    remote: Arc<dyn RemoteCartStore>,
    guest: Arc<dyn GuestCartStore>,
    config: EngineConfig,
    state: Mutex<EngineState>,
    snapshot_tx: watch::Sender<CartSnapshot>,
    notices: NoticeSink,
}

impl CartEngine {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        remote: Arc<dyn RemoteCartStore>,
        guest: Arc<dyn GuestCartStore>,
        config: EngineConfig,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(CartSnapshot::default());
        Self {
            identity,
            remote,
            guest,
            config,
            state: Mutex::new(EngineState {
                items: Vec::new(),
                loading: false,
            }),
            snapshot_tx,
            notices: NoticeSink::new(16),
        }
    }

    /// Replaces the in-memory items from whichever store is authoritative for
    /// the current identity. Idempotent: with unchanged backing data,
    /// repeated calls produce the same list.
    ///
    /// When a session is active, the guest file is cleared as part of the
    /// load: ownership of the cart has moved to the remote store.
    pub async fn synchronize(&self) -> CartResult<()> {
        let mut state = self.state.lock().await;
        state.loading = true;
        self.publish(&state);

        let loaded = self.load_items().await;
        state.loading = false;
        match loaded {
            Ok(items) => {
                state.items = items;
                self.publish(&state);
                Ok(())
            }
            Err(err) => {
                self.publish(&state);
                tracing::error!(error = %err, "cart synchronization failed");
                Err(err)
            }
        }
    }

    async fn load_items(&self) -> CartResult<Vec<CartItem>> {
        match self.identity.current().await? {
            Some(identity) => {
                let items = self.fetch_remote_items(identity.user_id).await?;
                self.guest.clear().await?;
                Ok(items)
            }
            None => Ok(self.guest.read().await?.unwrap_or_default()),
        }
    }

    async fn fetch_remote_items(&self, user_id: Uuid) -> CartResult<Vec<CartItem>> {
        let rows = retry::retry_read(
            self.config.read_retries,
            self.config.retry_base_ms,
            self.config.store_timeout,
            || self.remote.list_rows(user_id),
        )
        .await?;
        Ok(rows.into_iter().map(|row| row.into_cart_item()).collect())
    }

    /// Adds a catalog product to the cart. Bulk products ignore the requested
    /// quantity and store their configured order size; regular products add
    /// the requested quantity to any existing line.
    pub async fn add_item(&self, product: &Product, quantity: i64) -> CartResult<()> {
        if product.category == ProductCategory::Regular && quantity < 1 {
            return Err(CartError::Validation(
                "quantity must be at least 1".to_string(),
            ));
        }
        let effective = match product.category {
            ProductCategory::Bulk => product
                .order_quantity
                .unwrap_or(pricing::DEFAULT_BULK_ORDER_QUANTITY),
            ProductCategory::Regular => quantity,
        };
        self.upsert(product, quantity, effective, None).await
    }

    /// The bulk-order intake path: an explicit unit count plus delivery
    /// metadata. Requires a bulk product.
    pub async fn add_bulk_order(
        &self,
        product: &Product,
        quantity: i64,
        details: BulkOrderDetails,
    ) -> CartResult<()> {
        if product.category != ProductCategory::Bulk {
            return Err(CartError::Validation(
                "bulk orders require a bulk product".to_string(),
            ));
        }
        if quantity < 1 {
            return Err(CartError::Validation(
                "quantity must be at least 1".to_string(),
            ));
        }
        self.upsert(product, quantity, quantity, Some(details)).await
    }

    async fn upsert(
        &self,
        product: &Product,
        requested: i64,
        effective: i64,
        details: Option<BulkOrderDetails>,
    ) -> CartResult<()> {
        let product_id = normalize_product_id(&product.id)?;

        let mut state = self.state.lock().await;
        match self.identity.current().await? {
            Some(identity) => {
                if let Err(err) = self
                    .remote_upsert(&identity, product, product_id, requested, effective, details)
                    .await
                {
                    self.notices.error("Could not save the item to your cart.");
                    tracing::error!(error = %err, product = %product_id, "remote cart upsert failed");
                    return Err(err);
                }
                state.items = self.fetch_remote_items(identity.user_id).await?;
                self.publish(&state);
            }
            None => {
                let mut next = state.items.clone();
                match next.iter_mut().find(|i| i.product_id() == product_id) {
                    Some(existing) => {
                        existing.set_quantity(effective);
                        if let Some(details) = details {
                            existing.set_bulk_details(&details);
                        }
                    }
                    None => next.push(CartItem::from_product(
                        product, product_id, effective, details,
                    )),
                }
                if let Err(err) = self.guest.write(&next).await {
                    self.notices.error("Could not save the item to your cart.");
                    return Err(err);
                }
                state.items = next;
                self.publish(&state);
            }
        }
        self.notices.success("Item added to cart.");
        Ok(())
    }

    async fn remote_upsert(
        &self,
        identity: &Identity,
        product: &Product,
        product_id: Uuid,
        requested: i64,
        effective: i64,
        details: Option<BulkOrderDetails>,
    ) -> CartResult<()> {
        let timeout = self.config.store_timeout;
        let existing = retry::retry_read(
            self.config.read_retries,
            self.config.retry_base_ms,
            timeout,
            || self.remote.find_row(identity.user_id, product_id),
        )
        .await?;

        match existing {
            Some(row) => {
                // The row update writes quantity only; delivery metadata is
                // fixed at insert time and changes by remove-then-reorder.
                let next_quantity = match product.category {
                    ProductCategory::Bulk => effective,
                    ProductCategory::Regular => row.quantity + requested,
                };
                retry::bounded(timeout, self.remote.update_quantity(row.id, next_quantity)).await
            }
            None => {
                retry::bounded(
                    timeout,
                    self.remote.insert_row(NewCartRow {
                        user_id: identity.user_id,
                        product_id,
                        quantity: effective,
                        delivery_date: details.as_ref().map(|d| d.delivery_date),
                        delivery_time: details.as_ref().map(|d| d.delivery_time),
                        observations: details.and_then(|d| d.observations),
                    }),
                )
                .await
            }
        }
    }

    /// Sets a line's quantity. Zero or negative removes the line. The update
    /// is applied optimistically and in place, preserving item order; if the
    /// remote write fails the optimistic state is discarded and the cart is
    /// reloaded from the store.
    pub async fn update_quantity(&self, product_id: Uuid, new_quantity: i64) -> CartResult<()> {
        if new_quantity <= 0 {
            return self.remove_item(product_id).await;
        }

        let mut state = self.state.lock().await;
        let Some(index) = state
            .items
            .iter()
            .position(|i| i.product_id() == product_id)
        else {
            return Ok(());
        };

        match self.identity.current().await? {
            Some(identity) => {
                let Some(row_id) = state.items[index].entry_id() else {
                    // No row id to target; reload and let the store win.
                    state.items = self.fetch_remote_items(identity.user_id).await?;
                    self.publish(&state);
                    return Ok(());
                };
                let previous_quantity = state.items[index].quantity();
                state.items[index].set_quantity(new_quantity);
                self.publish(&state);

                let write = retry::bounded(
                    self.config.store_timeout,
                    self.remote.update_quantity(row_id, new_quantity),
                )
                .await;
                if let Err(err) = write {
                    self.notices.error("Could not update the quantity.");
                    tracing::warn!(error = %err, product = %product_id, "quantity update failed, reloading cart");
                    // Restore the last known-good quantity first, so the
                    // optimistic value never survives an unreachable store.
                    state.items[index].set_quantity(previous_quantity);
                    self.publish(&state);
                    match self.fetch_remote_items(identity.user_id).await {
                        Ok(items) => {
                            state.items = items;
                            self.publish(&state);
                        }
                        Err(reload_err) => {
                            tracing::warn!(error = %reload_err, "cart reload after failed update also failed");
                        }
                    }
                    return Err(err);
                }
                Ok(())
            }
            None => {
                let mut next = state.items.clone();
                next[index].set_quantity(new_quantity);
                if let Err(err) = self.guest.write(&next).await {
                    self.notices.error("Could not update the quantity.");
                    return Err(err);
                }
                state.items = next;
                self.publish(&state);
                Ok(())
            }
        }
    }

    /// Removes a line. Removing an id that is not in the cart is a no-op.
    pub async fn remove_item(&self, product_id: Uuid) -> CartResult<()> {
        let mut state = self.state.lock().await;
        match self.identity.current().await? {
            Some(identity) => {
                let delete = retry::bounded(
                    self.config.store_timeout,
                    self.remote.delete_row(identity.user_id, product_id),
                )
                .await;
                if let Err(err) = delete {
                    self.notices.error("Could not remove the item.");
                    tracing::error!(error = %err, product = %product_id, "cart delete failed");
                    return Err(err);
                }
                state.items.retain(|i| i.product_id() != product_id);
                self.publish(&state);
                Ok(())
            }
            None => {
                let next: Vec<CartItem> = state
                    .items
                    .iter()
                    .filter(|i| i.product_id() != product_id)
                    .cloned()
                    .collect();
                if let Err(err) = self.guest.write(&next).await {
                    self.notices.error("Could not remove the item.");
                    return Err(err);
                }
                state.items = next;
                self.publish(&state);
                Ok(())
            }
        }
    }

    /// Empties the cart entirely, e.g. after checkout completes.
    pub async fn clear(&self) -> CartResult<()> {
        let mut state = self.state.lock().await;
        match self.identity.current().await? {
            Some(identity) => {
                if let Err(err) = retry::bounded(
                    self.config.store_timeout,
                    self.remote.delete_all_rows(identity.user_id),
                )
                .await
                {
                    self.notices.error("Could not clear your cart.");
                    tracing::error!(error = %err, "cart clear failed");
                    return Err(err);
                }
            }
            None => {
                if let Err(err) = self.guest.clear().await {
                    self.notices.error("Could not clear your cart.");
                    return Err(err);
                }
            }
        }
        state.items.clear();
        self.publish(&state);
        Ok(())
    }

    pub async fn items(&self) -> Vec<CartItem> {
        self.state.lock().await.items.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.loading
    }

    /// Sum of every line's charged amount.
    pub async fn cart_total_cents(&self) -> i64 {
        self.state
            .lock()
            .await
            .items
            .iter()
            .map(CartItem::line_total_cents)
            .sum()
    }

    /// Distinct line items, not summed quantities.
    pub async fn item_count(&self) -> usize {
        self.state.lock().await.items.len()
    }

    /// Watch channel carrying the latest [`CartSnapshot`]; consumers pull the
    /// current value after each notification.
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    /// Spawns the task that resynchronizes the cart on every identity
    /// transition. The task holds only a weak reference: once the engine is
    /// dropped it stops instead of applying updates to a dead session.
    pub fn spawn_identity_watcher(self: &Arc<Self>) -> JoinHandle<()> {
        let mut rx = self.identity.subscribe();
        let weak: Weak<Self> = Arc::downgrade(self);
        let mut previous = rx.borrow().clone();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let Some(engine) = weak.upgrade() else {
                    break;
                };
                let current = rx.borrow_and_update().clone();
                if previous.is_some() && current.is_none() {
                    // Shared-device hygiene: the next guest session must not
                    // inherit the signed-out user's cart.
                    if let Err(err) = engine.guest.clear().await {
                        tracing::warn!(error = %err, "failed to clear guest cart on sign-out");
                    }
                }
                if let Err(err) = engine.synchronize().await {
                    tracing::error!(error = %err, "resynchronization after identity change failed");
                }
                previous = current;
            }
        })
    }

    fn publish(&self, state: &EngineState) {
        self.snapshot_tx.send_replace(CartSnapshot {
            items: state.items.clone(),
            loading: state.loading,
        });
    }
}
