//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use car_rental::cache::{CacheTtl, MemoryCache};
use car_rental::store::MemoryDatabase;
use car_rental::{db, AppState};

/// Connect to the test database and make sure the schema exists.
///
/// Tests never truncate: every row they create has a fresh id and, where a
/// uniqueness rule applies, a unique model name.
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    db::apply_schema(&pool).await.expect("Failed to apply schema");
    assert!(db::check_schema(&pool).await.unwrap());

    pool
}

/// Application state over fresh in-memory tables
pub fn memory_state() -> AppState {
    AppState::in_memory(
        &MemoryDatabase::new(),
        Arc::new(MemoryCache::default()),
        CacheTtl::default(),
    )
}

/// Midnight UTC on the given day of March 2025
pub fn day(n: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, n, 0, 0, 0).unwrap()
}

/// A model name no other test run will use
pub fn unique_model(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}
