//! CLI command implementations.

pub mod migrate;
pub mod seed;

use bazaar_storefront::config::{ConfigError, StorefrontConfig};
use bazaar_storefront::db;
use sqlx::PgPool;

/// Load configuration and connect to the storefront database.
pub async fn connect() -> Result<PgPool, ConnectError> {
    let config = StorefrontConfig::from_env()?;

    tracing::info!("Connecting to storefront database...");
    Ok(db::create_pool(&config.database_url).await?)
}

/// Errors that can occur while connecting.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
