//! Hand-rolled in-memory stand-ins for the engine's store collaborators.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bakery_cart::error::{CartError, CartResult};
use bakery_cart::models::{CartItem, Product, ProductCategory};
use bakery_cart::store::{CartRow, GuestCartStore, JoinedCartRow, NewCartRow, RemoteCartStore};
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

struct StoredRow {
    id: Uuid,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i64,
    delivery_date: Option<NaiveDate>,
    delivery_time: Option<NaiveTime>,
    observations: Option<String>,
}

/// In-memory remote store. Rows keep insertion order, matching the
/// `ORDER BY created_at` of the Postgres implementation. Writes can be made
/// to fail to exercise the engine's rollback paths.
#[derive(Default)]
pub struct MemoryRemote {
    products: Mutex<HashMap<Uuid, Product>>,
    rows: Mutex<Vec<StoredRow>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_product(&self, id: Uuid, product: Product) {
        self.products.lock().unwrap().insert(id, product);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Simulates a fully unreachable store together with `set_fail_writes`.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn quantity_of(&self, user_id: Uuid, product_id: Uuid) -> Option<i64> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user_id == user_id && r.product_id == product_id)
            .map(|r| r.quantity)
    }

    fn write_guard(&self) -> CartResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CartError::StoreWrite("simulated write failure".into()));
        }
        Ok(())
    }

    fn read_guard(&self) -> CartResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CartError::StoreWrite("simulated read failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteCartStore for MemoryRemote {
    async fn list_rows(&self, user_id: Uuid) -> CartResult<Vec<JoinedCartRow>> {
        self.read_guard()?;
        let products = self.products.lock().unwrap();
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| {
                let product = products
                    .get(&r.product_id)
                    .expect("row references an unknown product");
                JoinedCartRow {
                    row_id: r.id,
                    product_id: r.product_id,
                    quantity: r.quantity,
                    name: product.name.clone(),
                    description: product.description.clone(),
                    image_url: product.image_url.clone(),
                    price_cents: product.price_cents,
                    category: product.category,
                    delivery_date: r.delivery_date,
                    delivery_time: r.delivery_time,
                    observations: r.observations.clone(),
                }
            })
            .collect())
    }

    async fn find_row(&self, user_id: Uuid, product_id: Uuid) -> CartResult<Option<CartRow>> {
        self.read_guard()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.user_id == user_id && r.product_id == product_id)
            .map(|r| CartRow {
                id: r.id,
                user_id: r.user_id,
                product_id: r.product_id,
                quantity: r.quantity,
            }))
    }

    async fn insert_row(&self, row: NewCartRow) -> CartResult<()> {
        self.write_guard()?;
        self.rows.lock().unwrap().push(StoredRow {
            id: Uuid::new_v4(),
            user_id: row.user_id,
            product_id: row.product_id,
            quantity: row.quantity,
            delivery_date: row.delivery_date,
            delivery_time: row.delivery_time,
            observations: row.observations,
        });
        Ok(())
    }

    async fn update_quantity(&self, row_id: Uuid, quantity: i64) -> CartResult<()> {
        self.write_guard()?;
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.id == row_id) {
            Some(row) => {
                row.quantity = quantity;
                Ok(())
            }
            None => Err(CartError::StoreWrite("cart row no longer exists".into())),
        }
    }

    async fn delete_row(&self, user_id: Uuid, product_id: Uuid) -> CartResult<()> {
        self.write_guard()?;
        self.rows
            .lock()
            .unwrap()
            .retain(|r| !(r.user_id == user_id && r.product_id == product_id));
        Ok(())
    }

    async fn delete_all_rows(&self, user_id: Uuid) -> CartResult<()> {
        self.write_guard()?;
        self.rows.lock().unwrap().retain(|r| r.user_id != user_id);
        Ok(())
    }
}

/// In-memory guest store. `None` means the file does not exist, which is
/// distinct from an empty cart.
#[derive(Default)]
pub struct MemoryGuest {
    items: Mutex<Option<Vec<CartItem>>>,
    fail_writes: AtomicBool,
}

impl MemoryGuest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self) -> Option<Vec<CartItem>> {
        self.items.lock().unwrap().clone()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn write_guard(&self) -> CartResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CartError::StoreWrite("simulated write failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl GuestCartStore for MemoryGuest {
    async fn read(&self) -> CartResult<Option<Vec<CartItem>>> {
        Ok(self.items.lock().unwrap().clone())
    }

    async fn write(&self, items: &[CartItem]) -> CartResult<()> {
        self.write_guard()?;
        *self.items.lock().unwrap() = Some(items.to_vec());
        Ok(())
    }

    async fn clear(&self) -> CartResult<()> {
        self.write_guard()?;
        *self.items.lock().unwrap() = None;
        Ok(())
    }
}

pub fn regular_product(id: Uuid, name: &str, price_cents: i64) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        image_url: None,
        price_cents,
        category: ProductCategory::Regular,
        order_quantity: None,
    }
}

pub fn bulk_product(id: Uuid, name: &str, rate_per_hundred_cents: i64) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        image_url: None,
        price_cents: rate_per_hundred_cents,
        category: ProductCategory::Bulk,
        order_quantity: Some(50),
    }
}
