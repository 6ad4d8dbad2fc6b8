use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{CartError, CartResult};
use crate::models::ProductCategory;
use crate::store::{CartRow, JoinedCartRow, NewCartRow, RemoteCartStore};

/// Remote cart store backed by Postgres. One row per (user, product),
/// enforced by a unique constraint; the upsert path still read-checks first
/// so an existing row's quantity can be bumped rather than replaced.
#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
}

impl PgCartStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> CartResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|err| {
                CartError::Configuration(format!("cannot reach the cart database: {err}"))
            })?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(FromRow)]
struct JoinedRecord {
    row_id: Uuid,
    product_id: Uuid,
    quantity: i64,
    delivery_date: Option<NaiveDate>,
    delivery_time: Option<NaiveTime>,
    observations: Option<String>,
    name: String,
    description: Option<String>,
    image_url: Option<String>,
    price_cents: i64,
    category: String,
}

#[derive(FromRow)]
struct RowRecord {
    id: Uuid,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i64,
}

#[async_trait]
impl RemoteCartStore for PgCartStore {
    async fn list_rows(&self, user_id: Uuid) -> CartResult<Vec<JoinedCartRow>> {
        let rows = sqlx::query_as::<_, JoinedRecord>(
            r#"
            SELECT ci.id AS row_id, ci.product_id, ci.quantity,
                   ci.delivery_date, ci.delivery_time, ci.observations,
                   p.name, p.description, p.image_url, p.price_cents, p.category
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.user_id = $1
            ORDER BY ci.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| JoinedCartRow {
                row_id: r.row_id,
                product_id: r.product_id,
                quantity: r.quantity,
                name: r.name,
                description: r.description,
                image_url: r.image_url,
                price_cents: r.price_cents,
                category: ProductCategory::from_db(&r.category),
                delivery_date: r.delivery_date,
                delivery_time: r.delivery_time,
                observations: r.observations,
            })
            .collect())
    }

    async fn find_row(&self, user_id: Uuid, product_id: Uuid) -> CartResult<Option<CartRow>> {
        let row = sqlx::query_as::<_, RowRecord>(
            "SELECT id, user_id, product_id, quantity FROM cart_items WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| CartRow {
            id: r.id,
            user_id: r.user_id,
            product_id: r.product_id,
            quantity: r.quantity,
        }))
    }

    async fn insert_row(&self, row: NewCartRow) -> CartResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cart_items (id, user_id, product_id, quantity, delivery_date, delivery_time, observations)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(row.user_id)
        .bind(row.product_id)
        .bind(row.quantity)
        .bind(row.delivery_date)
        .bind(row.delivery_time)
        .bind(row.observations)
        .execute(&self.pool)
        .await
        .map_err(|err| CartError::StoreWrite(err.to_string()))?;

        Ok(())
    }

    async fn update_quantity(&self, row_id: Uuid, quantity: i64) -> CartResult<()> {
        let result = sqlx::query("UPDATE cart_items SET quantity = $2 WHERE id = $1")
            .bind(row_id)
            .bind(quantity)
            .execute(&self.pool)
            .await
            .map_err(|err| CartError::StoreWrite(err.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(CartError::StoreWrite("cart row no longer exists".into()));
        }
        Ok(())
    }

    async fn delete_row(&self, user_id: Uuid, product_id: Uuid) -> CartResult<()> {
        sqlx::query("DELETE FROM cart_items WHERE product_id = $1 AND user_id = $2")
            .bind(product_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|err| CartError::StoreWrite(err.to_string()))?;

        Ok(())
    }

    async fn delete_all_rows(&self, user_id: Uuid) -> CartResult<()> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|err| CartError::StoreWrite(err.to_string()))?;

        Ok(())
    }
}
