//! Seed the catalog with demo shopkeepers and products.
//!
//! Reads a YAML fixture (see `bazaar_storefront::seed` for the format) and
//! loads it idempotently: existing phones keep their shopkeeper, products are
//! upserted by id.

use std::path::Path;

use tracing::info;

use bazaar_storefront::db::CatalogRepository;
use bazaar_storefront::seed::{SeedData, SeedError, seed};

use super::{ConnectError, connect};

/// Fixture loaded when `--file` is not given.
pub const DEFAULT_FIXTURE: &str = "crates/cli/fixtures/seed.yaml";

/// Errors that can occur while seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedCommandError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Seed(#[from] SeedError),
}

/// Load a fixture file into the storefront database.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if database
/// operations fail.
pub async fn run(path: &Path) -> Result<(), SeedCommandError> {
    info!(path = %path.display(), "Loading seed fixture");

    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedCommandError::Read {
            path: path.display().to_string(),
            source,
        })?;
    let data = SeedData::from_yaml(&source)?;

    let pool = connect().await?;
    let repository = CatalogRepository::new(pool);

    let report = seed(&repository, data).await?;
    info!(
        shopkeepers = report.shopkeepers,
        products = report.products,
        "Seed complete"
    );
    Ok(())
}
