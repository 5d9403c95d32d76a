//! Catalog repository: products and shopkeepers.
//!
//! Queries are checked at runtime (`query_as` + `FromRow`) so the crate builds
//! without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bazaar_core::{Phone, Price, ProductId, ShopkeeperId};

use super::{CatalogStore, RepositoryError, to_u32};
use crate::models::catalog::{
    NewProduct, NewShopkeeper, Product, ProductUpdate, ProductWithShop, ShopSummary, Shopkeeper,
};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for shopkeeper queries.
#[derive(Debug, sqlx::FromRow)]
struct ShopkeeperRow {
    id: ShopkeeperId,
    name: String,
    phone: String,
    shop_name: String,
    shop_number: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ShopkeeperRow> for Shopkeeper {
    type Error = RepositoryError;

    fn try_from(row: ShopkeeperRow) -> Result<Self, Self::Error> {
        let phone = Phone::parse(&row.phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            phone,
            shop_name: row.shop_name,
            shop_number: row.shop_number,
            created_at: row.created_at,
        })
    }
}

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    title: String,
    description: Option<String>,
    price: Price,
    category: String,
    image_url: Option<String>,
    stock: i64,
    shopkeeper_id: ShopkeeperId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            price: row.price,
            category: row.category,
            image_url: row.image_url,
            stock: to_u32(row.stock, "stock")?,
            shopkeeper_id: row.shopkeeper_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Internal row type for products joined with their shop.
#[derive(Debug, sqlx::FromRow)]
struct ProductWithShopRow {
    #[sqlx(flatten)]
    product: ProductRow,
    shop_name: String,
}

impl TryFrom<ProductWithShopRow> for ProductWithShop {
    type Error = RepositoryError;

    fn try_from(row: ProductWithShopRow) -> Result<Self, Self::Error> {
        let product = Product::try_from(row.product)?;
        let shopkeeper = ShopSummary {
            id: product.shopkeeper_id.clone(),
            shop_name: row.shop_name,
        };
        Ok(Self {
            product,
            shopkeeper,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL` catalog repository.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for CatalogRepository {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_products(
        &self,
        shopkeeper_id: Option<ShopkeeperId>,
    ) -> Result<Vec<ProductWithShop>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductWithShopRow>(
            r"
            SELECT p.id, p.title, p.description, p.price, p.category, p.image_url,
                   p.stock, p.shopkeeper_id, p.created_at, p.updated_at, s.shop_name
            FROM bazaar.product p
            JOIN bazaar.shopkeeper s ON s.id = p.shopkeeper_id
            WHERE $1::text IS NULL OR p.shopkeeper_id = $1
            ORDER BY p.created_at DESC, p.id
            ",
        )
        .bind(shopkeeper_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ProductWithShop::try_from).collect()
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<ProductWithShop>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductWithShopRow>(
            r"
            SELECT p.id, p.title, p.description, p.price, p.category, p.image_url,
                   p.stock, p.shopkeeper_id, p.created_at, p.updated_at, s.shop_name
            FROM bazaar.product p
            JOIN bazaar.shopkeeper s ON s.id = p.shopkeeper_id
            WHERE p.id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProductWithShop::try_from).transpose()
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = ids.iter().map(|id| id.as_str().to_owned()).collect();
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, description, price, category, image_url,
                   stock, shopkeeper_id, created_at, updated_at
            FROM bazaar.product
            WHERE id = ANY($1)
            ",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO bazaar.product
                (id, title, description, price, category, image_url, stock, shopkeeper_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, title, description, price, category, image_url,
                      stock, shopkeeper_id, created_at, updated_at
            ",
        )
        .bind(ProductId::generate())
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.category)
        .bind(&product.image_url)
        .bind(i64::from(product.stock))
        .bind(&product.shopkeeper_id)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn upsert_product(&self, product: Product) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO bazaar.product
                (id, title, description, price, category, image_url, stock, shopkeeper_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                category = EXCLUDED.category,
                image_url = EXCLUDED.image_url,
                stock = EXCLUDED.stock,
                shopkeeper_id = EXCLUDED.shopkeeper_id,
                updated_at = now()
            RETURNING id, title, description, price, category, image_url,
                      stock, shopkeeper_id, created_at, updated_at
            ",
        )
        .bind(&product.id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.category)
        .bind(&product.image_url)
        .bind(i64::from(product.stock))
        .bind(&product.shopkeeper_id)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn update_product(
        &self,
        id: &ProductId,
        update: ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE bazaar.product SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                category = COALESCE($5, category),
                image_url = COALESCE($6, image_url),
                stock = COALESCE($7, stock),
                updated_at = now()
            WHERE id = $1
            RETURNING id, title, description, price, category, image_url,
                      stock, shopkeeper_id, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(update.title)
        .bind(update.description)
        .bind(update.price)
        .bind(update.category)
        .bind(update.image_url)
        .bind(update.stock.map(i64::from))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    async fn delete_product(&self, id: &ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM bazaar.product WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_products(&self, shopkeeper_id: &ShopkeeperId) -> Result<u64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM bazaar.product WHERE shopkeeper_id = $1")
                .bind(shopkeeper_id)
                .fetch_one(&self.pool)
                .await?;

        u64::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative count: {count}")))
    }

    async fn create_shopkeeper_if_absent(
        &self,
        shopkeeper: NewShopkeeper,
    ) -> Result<Shopkeeper, RepositoryError> {
        let inserted = sqlx::query_as::<_, ShopkeeperRow>(
            r"
            INSERT INTO bazaar.shopkeeper (id, name, phone, shop_name, shop_number)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (phone) DO NOTHING
            RETURNING id, name, phone, shop_name, shop_number, created_at
            ",
        )
        .bind(ShopkeeperId::generate())
        .bind(&shopkeeper.name)
        .bind(&shopkeeper.phone)
        .bind(&shopkeeper.shop_name)
        .bind(&shopkeeper.shop_number)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return row.try_into();
        }

        // Phone already registered
        self.find_shopkeeper_by_phone(&shopkeeper.phone)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_shopkeeper_by_phone(
        &self,
        phone: &Phone,
    ) -> Result<Option<Shopkeeper>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopkeeperRow>(
            r"
            SELECT id, name, phone, shop_name, shop_number, created_at
            FROM bazaar.shopkeeper
            WHERE phone = $1
            ",
        )
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Shopkeeper::try_from).transpose()
    }

    async fn get_shopkeeper(&self, id: &ShopkeeperId) -> Result<Option<Shopkeeper>, RepositoryError> {
        let row = sqlx::query_as::<_, ShopkeeperRow>(
            r"
            SELECT id, name, phone, shop_name, shop_number, created_at
            FROM bazaar.shopkeeper
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Shopkeeper::try_from).transpose()
    }
}
