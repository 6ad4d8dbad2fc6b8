use bakery_cart::{config::EngineConfig, store::postgres::PgCartStore};

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

    println!("Migrations applied");
    Ok(())
}
