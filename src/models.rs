use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CartError, CartResult};
use crate::pricing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Regular,
    /// Priced per hundred units, ordered ahead for a delivery date.
    #[serde(rename = "encomenda")]
    Bulk,
}

impl ProductCategory {
    /// Anything the catalog does not mark as an encomenda sells per unit.
    pub fn from_db(raw: &str) -> Self {
        if raw == "encomenda" {
            ProductCategory::Bulk
        } else {
            ProductCategory::Regular
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            ProductCategory::Regular => "regular",
            ProductCategory::Bulk => "encomenda",
        }
    }
}

/// A catalog entry as the storefront hands it over. The `id` is kept raw
/// because upstream display layers are known to append suffixes to it; it is
/// normalized before it ever reaches a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Per unit for regular products, per hundred units for bulk products.
    pub price_cents: i64,
    pub category: ProductCategory,
    /// Bulk default order size; falls back to
    /// [`pricing::DEFAULT_BULK_ORDER_QUANTITY`] when unset.
    pub order_quantity: Option<i64>,
}

/// Delivery metadata collected by the bulk-order intake flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkOrderDetails {
    pub delivery_date: NaiveDate,
    pub delivery_time: NaiveTime,
    pub observations: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearItem {
    pub product_id: Uuid,
    /// Remote cart row id; absent while the item lives in a guest cart.
    pub entry_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub unit_price_cents: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkItem {
    pub product_id: Uuid,
    pub entry_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub rate_per_hundred_cents: i64,
    /// Ordered unit count (e.g. 150 pieces), not a line multiplier.
    pub quantity: i64,
    pub delivery_date: Option<NaiveDate>,
    pub delivery_time: Option<NaiveTime>,
    pub observations: Option<String>,
}

/// One cart line. The two variants carry only the fields their pricing rule
/// needs; the charged amount is always derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartItem {
    Linear(LinearItem),
    Bulk(BulkItem),
}

impl CartItem {
    /// Builds a guest-cart line from a catalog entry. `product_id` must
    /// already be normalized.
    pub fn from_product(
        product: &Product,
        product_id: Uuid,
        quantity: i64,
        details: Option<BulkOrderDetails>,
    ) -> Self {
        match product.category {
            ProductCategory::Bulk => CartItem::Bulk(BulkItem {
                product_id,
                entry_id: None,
                name: product.name.clone(),
                description: product.description.clone(),
                image_url: product.image_url.clone(),
                rate_per_hundred_cents: product.price_cents,
                quantity,
                delivery_date: details.as_ref().map(|d| d.delivery_date),
                delivery_time: details.as_ref().map(|d| d.delivery_time),
                observations: details.and_then(|d| d.observations),
            }),
            ProductCategory::Regular => CartItem::Linear(LinearItem {
                product_id,
                entry_id: None,
                name: product.name.clone(),
                description: product.description.clone(),
                image_url: product.image_url.clone(),
                unit_price_cents: product.price_cents,
                quantity,
            }),
        }
    }

    pub fn product_id(&self) -> Uuid {
        match self {
            CartItem::Linear(item) => item.product_id,
            CartItem::Bulk(item) => item.product_id,
        }
    }

    pub fn entry_id(&self) -> Option<Uuid> {
        match self {
            CartItem::Linear(item) => item.entry_id,
            CartItem::Bulk(item) => item.entry_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CartItem::Linear(item) => &item.name,
            CartItem::Bulk(item) => &item.name,
        }
    }

    pub fn quantity(&self) -> i64 {
        match self {
            CartItem::Linear(item) => item.quantity,
            CartItem::Bulk(item) => item.quantity,
        }
    }

    pub fn set_quantity(&mut self, quantity: i64) {
        match self {
            CartItem::Linear(item) => item.quantity = quantity,
            CartItem::Bulk(item) => item.quantity = quantity,
        }
    }

    pub fn is_bulk(&self) -> bool {
        matches!(self, CartItem::Bulk(_))
    }

    /// Replaces a bulk line's delivery metadata, e.g. when a repeat order
    /// names a new date. Does nothing on a linear line.
    pub fn set_bulk_details(&mut self, details: &BulkOrderDetails) {
        if let CartItem::Bulk(item) = self {
            item.delivery_date = Some(details.delivery_date);
            item.delivery_time = Some(details.delivery_time);
            item.observations = details.observations.clone();
        }
    }

    /// The amount charged for this line, re-derived on every read.
    pub fn line_total_cents(&self) -> i64 {
        match self {
            CartItem::Linear(item) => {
                pricing::linear_price_cents(item.unit_price_cents, item.quantity)
            }
            CartItem::Bulk(item) => {
                pricing::bulk_price_cents(item.rate_per_hundred_cents, item.quantity)
            }
        }
    }
}

/// The value published to subscribers after every state change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub loading: bool,
}

impl CartSnapshot {
    pub fn total_cents(&self) -> i64 {
        self.items.iter().map(CartItem::line_total_cents).sum()
    }

    /// Distinct line items, not summed quantities.
    pub fn line_count(&self) -> usize {
        self.items.len()
    }
}

/// Normalizes a raw catalog id to the canonical key expected by the stores.
///
/// Display layers append extra `-`-separated segments to product ids; a
/// hyphenated UUID has exactly five, so anything beyond that is stripped
/// before parsing. Ids that still fail to parse are rejected before any store
/// call is made.
pub fn normalize_product_id(raw: &str) -> CartResult<Uuid> {
    if let Ok(id) = Uuid::parse_str(raw) {
        return Ok(id);
    }
    let segments: Vec<&str> = raw.split('-').collect();
    if segments.len() > 5 {
        if let Ok(id) = Uuid::parse_str(&segments[..5].join("-")) {
            return Ok(id);
        }
    }
    Err(CartError::Validation(format!("malformed product id: {raw}")))
}
