//! Database operations for the storefront `PostgreSQL`.
//!
//! # Schema: `bazaar`
//!
//! ## Tables
//!
//! - `shopkeeper` - Sellers, keyed by phone number
//! - `product` - Catalog entries owned by a shopkeeper
//! - `"order"` - Buyer orders (cash on delivery)
//! - `order_item` - Line snapshots; no foreign key to `product`
//! - `order_ownership_transfer` - Audit trail of owner changes on status updates
//!
//! Sessions live in the `tower_sessions` schema managed by
//! `tower-sessions-sqlx-store`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! ```
//!
//! # Stores
//!
//! Handlers never touch SQL directly. They go through the [`OrderStore`] and
//! [`CatalogStore`] traits, implemented for `PostgreSQL` by
//! [`OrderRepository`]/[`CatalogRepository`] and in memory by [`MemoryStore`].

pub mod catalog;
pub mod memory;
pub mod orders;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use bazaar_core::{OrderId, OrderStatus, Phone, ProductId, ShopkeeperId, TransitionPolicy};

use crate::models::catalog::{
    NewProduct, NewShopkeeper, Product, ProductUpdate, ProductWithShop, Shopkeeper,
};
use crate::models::order::{NewOrder, Order, OrderWithProducts, OwnershipTransfer};

pub use catalog::CatalogRepository;
pub use memory::MemoryStore;
pub use orders::OrderRepository;

/// Embedded storefront migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., value out of range for a column).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The stored status does not permit the requested one.
    #[error("order status is {current}")]
    StatusConflict { current: OrderStatus },
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply all pending storefront migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history is inconsistent.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

/// Persistence for orders and their items.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert an order and all of its items atomically.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, RepositoryError>;

    /// Fetch an order with product snapshots for its items.
    async fn get_order(&self, id: &OrderId) -> Result<Option<OrderWithProducts>, RepositoryError>;

    /// Orders currently owned by a shopkeeper, newest first.
    async fn list_for_shopkeeper(
        &self,
        shopkeeper_id: &ShopkeeperId,
    ) -> Result<Vec<OrderWithProducts>, RepositoryError>;

    /// Overwrite an order's status and owner.
    ///
    /// `policy` is checked against the status as stored at write time, under
    /// the same lock as the write. A change of owner is recorded as an
    /// [`OwnershipTransfer`] in the same transaction. Returns
    /// `RepositoryError::NotFound` for an unknown order and
    /// `RepositoryError::StatusConflict` when the policy refuses.
    async fn set_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
        shopkeeper_id: &ShopkeeperId,
        policy: TransitionPolicy,
    ) -> Result<OrderWithProducts, RepositoryError>;

    /// Ownership changes recorded for an order, oldest first.
    async fn ownership_transfers(
        &self,
        id: &OrderId,
    ) -> Result<Vec<OwnershipTransfer>, RepositoryError>;
}

/// Persistence for products and shopkeepers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Products newest first, optionally restricted to one shopkeeper.
    async fn list_products(
        &self,
        shopkeeper_id: Option<ShopkeeperId>,
    ) -> Result<Vec<ProductWithShop>, RepositoryError>;

    /// A single product with its shop.
    async fn get_product(&self, id: &ProductId) -> Result<Option<ProductWithShop>, RepositoryError>;

    /// Every product whose id is in `ids` (missing ids are skipped).
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;

    /// Insert a product under a freshly generated id.
    async fn create_product(&self, product: NewProduct) -> Result<Product, RepositoryError>;

    /// Insert or replace a product under a fixed id (seeding).
    async fn upsert_product(&self, product: Product) -> Result<Product, RepositoryError>;

    /// Apply a partial update. `None` when the product does not exist.
    async fn update_product(
        &self,
        id: &ProductId,
        update: ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Delete a product. Returns `false` when it did not exist.
    async fn delete_product(&self, id: &ProductId) -> Result<bool, RepositoryError>;

    /// Number of products a shopkeeper lists.
    async fn count_products(&self, shopkeeper_id: &ShopkeeperId) -> Result<u64, RepositoryError>;

    /// Create a shopkeeper unless one with the same phone exists, in which
    /// case the existing record is returned untouched.
    async fn create_shopkeeper_if_absent(
        &self,
        shopkeeper: NewShopkeeper,
    ) -> Result<Shopkeeper, RepositoryError>;

    /// Look up a shopkeeper by phone number.
    async fn find_shopkeeper_by_phone(
        &self,
        phone: &Phone,
    ) -> Result<Option<Shopkeeper>, RepositoryError>;

    /// Look up a shopkeeper by id.
    async fn get_shopkeeper(&self, id: &ShopkeeperId) -> Result<Option<Shopkeeper>, RepositoryError>;
}

/// Convert a stored count to `u32`, flagging negative or oversized values.
pub(crate) fn to_u32(value: i64, column: &str) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("{column} out of range: {value}")))
}
