//! Product and shopkeeper management.
//!
//! Shopkeepers are identified by phone number. Registering an existing phone
//! returns the stored shopkeeper unchanged, which doubles as login.

use std::sync::Arc;

use tracing::instrument;

use bazaar_core::{Phone, Price, ProductId, ShopkeeperId};

use super::{ServiceError, optional_text, required_text};
use crate::db::{CatalogStore, RepositoryError};
use crate::models::catalog::{
    CreateProductRequest, CreateShopkeeperRequest, NewProduct, NewShopkeeper, Product,
    ProductUpdate, ProductWithShop, Shopkeeper, UpdateProductRequest,
};

/// Catalog service.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    /// Create a new catalog service.
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Check that the catalog store is reachable.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Persistence` if it is not.
    pub async fn ping(&self) -> Result<(), ServiceError> {
        Ok(self.store.ping().await?)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// All products, newest first, optionally limited to one shopkeeper.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Persistence` if the store fails.
    pub async fn list_products(
        &self,
        shopkeeper_id: Option<ShopkeeperId>,
    ) -> Result<Vec<ProductWithShop>, ServiceError> {
        Ok(self.store.list_products(shopkeeper_id).await?)
    }

    /// A single product with its shop.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for an unknown id.
    pub async fn get_product(&self, id: &ProductId) -> Result<ProductWithShop, ServiceError> {
        self.store
            .get_product(id)
            .await?
            .ok_or(ServiceError::NotFound("Product"))
    }

    /// Add a product to a shopkeeper's catalog.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for missing or invalid fields and
    /// `ServiceError::NotFound` if the shopkeeper does not exist.
    #[instrument(skip(self, request))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<Product, ServiceError> {
        let title = required_text(request.title.as_deref(), "title")?;
        let category = required_text(request.category.as_deref(), "category")?;
        let shopkeeper_id =
            ShopkeeperId::new(required_text(request.shopkeeper_id.as_deref(), "shopkeeperId")?);
        let price = positive_price(
            request
                .price
                .ok_or_else(|| ServiceError::validation("price is required"))?,
        )?;
        let stock = stock(request.stock.unwrap_or(0))?;

        if self.store.get_shopkeeper(&shopkeeper_id).await?.is_none() {
            return Err(ServiceError::NotFound("Shopkeeper"));
        }

        let product = self
            .store
            .create_product(NewProduct {
                title,
                description: optional_text(request.description),
                price,
                category,
                image_url: optional_text(request.image_url),
                stock,
                shopkeeper_id,
            })
            .await
            .map_err(|e| match e {
                // Shopkeeper removed between the check and the insert
                RepositoryError::Conflict(_) => ServiceError::NotFound("Shopkeeper"),
                other => other.into(),
            })?;

        tracing::info!(product_id = %product.id, shopkeeper_id = %product.shopkeeper_id, "Product created");
        Ok(product)
    }

    /// Apply a partial update to a product.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for invalid fields and
    /// `ServiceError::NotFound` for an unknown id.
    #[instrument(skip(self, request), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        request: UpdateProductRequest,
    ) -> Result<Product, ServiceError> {
        let update = ProductUpdate {
            title: request
                .title
                .as_deref()
                .map(|t| required_text(Some(t), "title"))
                .transpose()?,
            description: optional_text(request.description),
            price: request.price.map(positive_price).transpose()?,
            category: request
                .category
                .as_deref()
                .map(|c| required_text(Some(c), "category"))
                .transpose()?,
            image_url: optional_text(request.image_url),
            stock: request.stock.map(stock).transpose()?,
        };

        self.store
            .update_product(id, update)
            .await?
            .ok_or(ServiceError::NotFound("Product"))
    }

    /// Remove a product. Order items that reference it are kept.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for an unknown id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), ServiceError> {
        if self.store.delete_product(id).await? {
            tracing::info!("Product deleted");
            Ok(())
        } else {
            Err(ServiceError::NotFound("Product"))
        }
    }

    // =========================================================================
    // Shopkeepers
    // =========================================================================

    /// Register a shopkeeper, or return the existing one with the same phone.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for missing fields or a malformed phone.
    #[instrument(skip(self, request))]
    pub async fn register_shopkeeper(
        &self,
        request: CreateShopkeeperRequest,
    ) -> Result<Shopkeeper, ServiceError> {
        let name = required_text(request.name.as_deref(), "name")?;
        let phone = parse_phone(request.phone.as_deref())?;
        let shop_name = required_text(request.shop_name.as_deref(), "shopName")?;

        let shopkeeper = self
            .store
            .create_shopkeeper_if_absent(NewShopkeeper {
                name,
                phone,
                shop_name,
                shop_number: optional_text(request.shop_number),
            })
            .await?;

        tracing::info!(shopkeeper_id = %shopkeeper.id, "Shopkeeper registered");
        Ok(shopkeeper)
    }

    /// Look a shopkeeper up by phone number.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the phone is missing or malformed
    /// and `ServiceError::NotFound` if nobody registered it.
    pub async fn find_shopkeeper_by_phone(
        &self,
        phone: Option<&str>,
    ) -> Result<Shopkeeper, ServiceError> {
        let phone = parse_phone(phone)?;

        self.store
            .find_shopkeeper_by_phone(&phone)
            .await?
            .ok_or(ServiceError::NotFound("Shopkeeper"))
    }

    /// A shopkeeper by id.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for an unknown id.
    pub async fn get_shopkeeper(&self, id: &ShopkeeperId) -> Result<Shopkeeper, ServiceError> {
        self.store
            .get_shopkeeper(id)
            .await?
            .ok_or(ServiceError::NotFound("Shopkeeper"))
    }
}

fn parse_phone(value: Option<&str>) -> Result<Phone, ServiceError> {
    let raw = required_text(value, "phone")?;
    Phone::parse(&raw).map_err(|e| ServiceError::validation(e.to_string()))
}

fn positive_price(price: Price) -> Result<Price, ServiceError> {
    if price.is_positive() {
        Ok(price)
    } else {
        Err(ServiceError::validation("price must be greater than zero"))
    }
}

fn stock(value: i64) -> Result<u32, ServiceError> {
    u32::try_from(value).map_err(|_| ServiceError::validation("stock must be a non-negative number"))
}
