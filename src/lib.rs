//! Headless cart engine for a bakery storefront.
//!
//! The engine owns the in-memory cart for one page session and keeps it
//! consistent with whichever store is authoritative for the current identity:
//! remote rows in Postgres for a signed-in user, a local JSON file for a
//! guest. Bulk ("encomenda") products are priced per hundred units and carry
//! delivery metadata; everything else is plain unit pricing.
//!
//! Collaborators are injected through traits: an [`identity::IdentityProvider`]
//! supplies the session facts, and [`store::RemoteCartStore`] /
//! [`store::GuestCartStore`] supply persistence. Consumers observe the engine
//! through a snapshot watch channel and a notice broadcast rather than
//! touching its state directly.

pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod models;
pub mod notify;
pub mod pricing;
mod retry;
pub mod store;

pub use config::EngineConfig;
pub use engine::CartEngine;
pub use error::{CartError, CartResult};
pub use models::{BulkOrderDetails, CartItem, CartSnapshot, Product, ProductCategory};
pub use notify::{Notice, NoticeKind};
