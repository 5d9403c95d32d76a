//! Demo catalog fixtures.
//!
//! A fixture is a YAML list of shopkeepers, each with the products they sell.
//! Loading is idempotent: shopkeepers are created only when their phone is
//! unknown, and products are upserted by id so re-seeding restores the
//! fixture values.
//!
//! ```yaml
//! shopkeepers:
//!   - name: Ahmed Khan
//!     phone: 0300-1234567
//!     shopName: Al-Faisal Fabrics
//!     shopNumber: Shop 123, First Floor
//!     products:
//!       - id: prod1
//!         title: Men's Premium Cotton Kurta
//!         price: 1500
//!         category: clothing
//!         stock: 25
//! ```

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;

use bazaar_core::{Phone, Price, ProductId};

use crate::db::{CatalogStore, RepositoryError};
use crate::models::catalog::{NewShopkeeper, Product};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// The fixture is not valid YAML or has the wrong shape.
    #[error("invalid seed file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A record in the fixture breaks a catalog rule.
    #[error("invalid seed record: {0}")]
    Invalid(String),

    /// Storage failure.
    #[error("seed storage error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A whole seed fixture.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedData {
    pub shopkeepers: Vec<SeedShopkeeper>,
}

/// A shopkeeper and their products.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedShopkeeper {
    pub name: String,
    pub phone: Phone,
    pub shop_name: String,
    #[serde(default)]
    pub shop_number: Option<String>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

/// A product with a fixed id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedProduct {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    pub category: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock: u32,
}

/// What a seed run touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub shopkeepers: usize,
    pub products: usize,
}

impl SeedData {
    /// Parse a YAML fixture.
    ///
    /// # Errors
    ///
    /// Returns `SeedError::Parse` for malformed YAML, bad phone numbers or
    /// missing fields.
    pub fn from_yaml(source: &str) -> Result<Self, SeedError> {
        Ok(serde_yaml::from_str(source)?)
    }
}

/// Load a fixture into the catalog.
///
/// # Errors
///
/// Returns `SeedError::Invalid` for a non-positive price, or
/// `SeedError::Repository` if the store fails. Records written before the
/// failure stay written.
pub async fn seed(store: &dyn CatalogStore, data: SeedData) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    for entry in data.shopkeepers {
        let shopkeeper = store
            .create_shopkeeper_if_absent(NewShopkeeper {
                name: entry.name,
                phone: entry.phone,
                shop_name: entry.shop_name,
                shop_number: entry.shop_number,
            })
            .await?;
        report.shopkeepers += 1;
        tracing::info!(shopkeeper_id = %shopkeeper.id, shop = %shopkeeper.shop_name, "Seeded shopkeeper");

        for product in entry.products {
            if !product.price.is_positive() {
                return Err(SeedError::Invalid(format!(
                    "product {} must have a positive price",
                    product.id
                )));
            }

            let now = Utc::now();
            store
                .upsert_product(Product {
                    id: product.id,
                    title: product.title,
                    description: product.description,
                    price: product.price,
                    category: product.category,
                    image_url: product.image_url,
                    stock: product.stock,
                    shopkeeper_id: shopkeeper.id.clone(),
                    created_at: now,
                    updated_at: now,
                })
                .await?;
            report.products += 1;
        }
    }

    Ok(report)
}
