//! carRental - booking core service
//!
//! Connects to PostgreSQL, makes sure the schema is in place and wires the
//! cached stores, the booking engine and the handlers together.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use car_rental::cache::MemoryCache;
use car_rental::{db, AppState, Config};

/// Initialize tracing/logging
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "car_rental=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.is_production());

    tracing::info!(environment = %config.environment, "Starting carRental");
    tracing::info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    db::verify_connection(&pool).await?;

    if config.apply_schema {
        db::apply_schema(&pool).await?;
    }

    if !db::check_schema(&pool).await? {
        tracing::error!("Database schema is not complete. Set APPLY_SCHEMA=true or run migrations.");
        return Err(anyhow::anyhow!("Database schema incomplete"));
    }

    tracing::info!("Database connected successfully");

    let cache = Arc::new(MemoryCache::new(config.cache_max_entries));
    let state = AppState::postgres(pool.clone(), cache, config.cache_ttl());

    let cars = state.cars.list().await?;
    let customers = state.customers.list().await?;
    let stats = state.cache_stats();
    tracing::info!(
        cars = cars.len(),
        customers = customers.len(),
        cached = stats.size,
        capacity = stats.capacity,
        "Booking core ready"
    );

    pool.close().await;
    tracing::info!("Database connections closed. Goodbye!");

    Ok(())
}
