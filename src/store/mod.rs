//! Persistence seams for the two cart backings: the remote relational store
//! used by authenticated sessions and the local file used by guests. The
//! engine treats both as an item-list store reached through CRUD calls.

pub mod guest;
pub mod postgres;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::error::CartResult;
use crate::models::{BulkItem, CartItem, LinearItem, ProductCategory};

/// A persisted cart row as stored, without its product record.
#[derive(Debug, Clone)]
pub struct CartRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
}

/// Payload for inserting a new cart row.
#[derive(Debug, Clone)]
pub struct NewCartRow {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: Option<NaiveTime>,
    pub observations: Option<String>,
}

/// A cart row joined with its product record, ready to become a cart line.
#[derive(Debug, Clone)]
pub struct JoinedCartRow {
    pub row_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price_cents: i64,
    pub category: ProductCategory,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: Option<NaiveTime>,
    pub observations: Option<String>,
}

impl JoinedCartRow {
    pub fn into_cart_item(self) -> CartItem {
        match self.category {
            ProductCategory::Bulk => CartItem::Bulk(BulkItem {
                product_id: self.product_id,
                entry_id: Some(self.row_id),
                name: self.name,
                description: self.description,
                image_url: self.image_url,
                rate_per_hundred_cents: self.price_cents,
                quantity: self.quantity,
                delivery_date: self.delivery_date,
                delivery_time: self.delivery_time,
                observations: self.observations,
            }),
            ProductCategory::Regular => CartItem::Linear(LinearItem {
                product_id: self.product_id,
                entry_id: Some(self.row_id),
                name: self.name,
                description: self.description,
                image_url: self.image_url,
                unit_price_cents: self.price_cents,
                quantity: self.quantity,
            }),
        }
    }
}

/// Remote cart rows for authenticated users, one row per (user, product).
///
/// Upserts are read-check-then-write and deliberately not atomic: two rapid
/// adds for the same product may race, and the second write wins. A follow-up
/// synchronize converges the in-memory cart.
#[async_trait]
pub trait RemoteCartStore: Send + Sync {
    async fn list_rows(&self, user_id: Uuid) -> CartResult<Vec<JoinedCartRow>>;

    async fn find_row(&self, user_id: Uuid, product_id: Uuid) -> CartResult<Option<CartRow>>;

    async fn insert_row(&self, row: NewCartRow) -> CartResult<()>;

    async fn update_quantity(&self, row_id: Uuid, quantity: i64) -> CartResult<()>;

    /// Deleting an absent row is a no-op, not an error.
    async fn delete_row(&self, user_id: Uuid, product_id: Uuid) -> CartResult<()>;

    async fn delete_all_rows(&self, user_id: Uuid) -> CartResult<()>;
}

/// Guest cart persistence, shared across every guest session in the same
/// profile. Cleared on sign-out and on hand-off to a remote cart.
#[async_trait]
pub trait GuestCartStore: Send + Sync {
    async fn read(&self) -> CartResult<Option<Vec<CartItem>>>;

    async fn write(&self, items: &[CartItem]) -> CartResult<()>;

    async fn clear(&self) -> CartResult<()>;
}
