//! Database module
//!
//! Database connection and schema utilities.

use sqlx::{Executor, PgPool};

/// Tables the stores read and write
pub const REQUIRED_TABLES: &[&str] = &["cars", "customers", "rentals", "services"];

/// Initial schema; every statement is idempotent
const INIT_SCHEMA: &str = include_str!("../migrations/0001_init.sql");

/// Simple connectivity check
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Create any missing tables and indexes
pub async fn apply_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    pool.execute(INIT_SCHEMA).await?;
    tracing::info!("Database schema applied");
    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    for table in REQUIRED_TABLES {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(*table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    Ok(true)
}
