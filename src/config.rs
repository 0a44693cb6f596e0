//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::{CacheTtl, ALL_ACTIVE_TTL, DEFAULT_CAPACITY, DEFAULT_TTL, MAX_TTL};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Environment (development, production)
    pub environment: String,

    /// TTL for cached reads, in seconds
    pub cache_ttl_seconds: u64,

    /// TTL for cached "all active" listings, in seconds
    pub cache_all_active_ttl_seconds: u64,

    /// Upper bound on cached entries
    pub cache_max_entries: usize,

    /// Create missing tables at startup
    pub apply_schema: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections =
            parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let cache_ttl_seconds = parse_ttl(&lookup, "CACHE_TTL_SECONDS", DEFAULT_TTL)?;

        let cache_all_active_ttl_seconds =
            parse_ttl(&lookup, "CACHE_ALL_ACTIVE_TTL_SECONDS", ALL_ACTIVE_TTL)?;

        let cache_max_entries =
            parse_or(&lookup, "CACHE_MAX_ENTRIES", DEFAULT_CAPACITY)?;
        if cache_max_entries == 0 {
            return Err(ConfigError::InvalidValue("CACHE_MAX_ENTRIES"));
        }

        let apply_schema = parse_or(&lookup, "APPLY_SCHEMA", false)?;

        Ok(Self {
            database_url,
            database_max_connections,
            environment,
            cache_ttl_seconds,
            cache_all_active_ttl_seconds,
            cache_max_entries,
            apply_schema,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Cache lifetimes derived from the configured seconds
    pub fn cache_ttl(&self) -> CacheTtl {
        CacheTtl {
            default: Duration::from_secs(self.cache_ttl_seconds),
            all_active: Duration::from_secs(self.cache_all_active_ttl_seconds),
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name)),
        None => Ok(default),
    }
}

/// TTL in seconds, at most [`MAX_TTL`]
fn parse_ttl<F>(lookup: &F, name: &'static str, default: Duration) -> Result<u64, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    let seconds = parse_or(lookup, name, default.as_secs())?;
    if seconds > MAX_TTL.as_secs() {
        return Err(ConfigError::InvalidValue(name));
    }
    Ok(seconds)
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
