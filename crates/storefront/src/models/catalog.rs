//! Catalog models: shopkeepers and their products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{Phone, Price, ProductId, ShopkeeperId};

/// A seller registered on the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shopkeeper {
    pub id: ShopkeeperId,
    pub name: String,
    pub phone: Phone,
    pub shop_name: String,
    pub shop_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The part of a shopkeeper shown next to each product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopSummary {
    pub id: ShopkeeperId,
    pub shop_name: String,
}

impl From<&Shopkeeper> for ShopSummary {
    fn from(shopkeeper: &Shopkeeper) -> Self {
        Self {
            id: shopkeeper.id.clone(),
            shop_name: shopkeeper.shop_name.clone(),
        }
    }
}

/// A catalog entry. Stock is advisory and never decremented by orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: Option<String>,
    pub price: Price,
    pub category: String,
    pub image_url: Option<String>,
    pub stock: u32,
    pub shopkeeper_id: ShopkeeperId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product together with the shop that sells it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductWithShop {
    #[serde(flatten)]
    pub product: Product,
    pub shopkeeper: ShopSummary,
}

/// Validated input for a new product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub title: String,
    pub description: Option<String>,
    pub price: Price,
    pub category: String,
    pub image_url: Option<String>,
    pub stock: u32,
    pub shopkeeper_id: ShopkeeperId,
}

/// Validated partial update for a product. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub stock: Option<u32>,
}

impl ProductUpdate {
    /// Apply the update to a product in place.
    pub fn apply_to(self, product: &mut Product) {
        if let Some(title) = self.title {
            product.title = title;
        }
        if let Some(description) = self.description {
            product.description = Some(description);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(image_url) = self.image_url {
            product.image_url = Some(image_url);
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
    }
}

/// Validated input for a new shopkeeper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShopkeeper {
    pub name: String,
    pub phone: Phone,
    pub shop_name: String,
    pub shop_number: Option<String>,
}

// =============================================================================
// Request bodies
// =============================================================================

/// `POST /products` body. Fields are optional so the service can report
/// exactly what is missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub stock: Option<i64>,
    pub shopkeeper_id: Option<String>,
}

/// `PUT /products/{id}` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub stock: Option<i64>,
}

/// `POST /shopkeepers` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateShopkeeperRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub shop_name: Option<String>,
    pub shop_number: Option<String>,
}
