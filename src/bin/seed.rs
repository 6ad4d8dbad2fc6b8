use bakery_cart::{config::EngineConfig, store::postgres::PgCartStore};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = EngineConfig::from_env()?;
    let database_url = config
        .database_url
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;

    let store = PgCartStore::connect(&database_url).await?;
    sqlx::migrate!("./migrations").run(store.pool()).await?;

    seed_products(store.pool()).await?;

    println!("Seed completed");
    Ok(())
}

async fn seed_products(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    // Regular items are priced per unit; encomenda items per hundred units.
    let products: Vec<(&str, Option<&str>, i64, &str, Option<i64>)> = vec![
        ("Pão Francês", Some("Crusty breakfast roll"), 120, "regular", None),
        ("Bolo de Cenoura", Some("Carrot cake with chocolate glaze"), 2_500, "regular", None),
        ("Sonho de Creme", Some("Cream-filled doughnut"), 450, "regular", None),
        ("Coxinha (cento)", Some("Party-sized batch of coxinhas"), 3_800, "encomenda", Some(50)),
        ("Salgadinhos Mistos (cento)", Some("Mixed savoury snacks"), 4_200, "encomenda", Some(100)),
    ];

    for (name, description, price_cents, category, order_quantity) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_cents, category, order_quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(price_cents)
        .bind(category)
        .bind(order_quantity)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
