//! Order repository.
//!
//! Orders and their items are written in one transaction. Reads attach the
//! current product snapshot to every item; items whose product has been
//! deleted keep `product: None`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bazaar_core::{
    OrderId, OrderItemId, OrderStatus, PaymentMethod, Price, ProductId, ShopkeeperId,
    TransitionPolicy,
};

use super::{CatalogRepository, CatalogStore, OrderStore, RepositoryError, to_u32};
use crate::models::catalog::Product;
use crate::models::order::{NewOrder, Order, OrderItem, OrderWithProducts, OwnershipTransfer};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    buyer_name: String,
    buyer_phone: String,
    buyer_address: String,
    total_amount: Price,
    payment_method: PaymentMethod,
    status: OrderStatus,
    shopkeeper_id: Option<ShopkeeperId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, order_items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            buyer_name: self.buyer_name,
            buyer_phone: self.buyer_phone,
            buyer_address: self.buyer_address,
            total_amount: self.total_amount,
            payment_method: self.payment_method,
            status: self.status,
            shopkeeper_id: self.shopkeeper_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            order_items,
        }
    }
}

/// Internal row type for order item queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i64,
    price: Price,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            quantity: to_u32(row.quantity, "quantity")?,
            price: row.price,
        })
    }
}

/// Internal row type for ownership transfer queries.
#[derive(Debug, sqlx::FromRow)]
struct OwnershipTransferRow {
    order_id: OrderId,
    from_shopkeeper_id: Option<ShopkeeperId>,
    to_shopkeeper_id: ShopkeeperId,
    status: OrderStatus,
    transferred_at: DateTime<Utc>,
}

impl From<OwnershipTransferRow> for OwnershipTransfer {
    fn from(row: OwnershipTransferRow) -> Self {
        Self {
            order_id: row.order_id,
            from_shopkeeper_id: row.from_shopkeeper_id,
            to_shopkeeper_id: row.to_shopkeeper_id,
            status: row.status,
            transferred_at: row.transferred_at,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL` order repository.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: PgPool,
    catalog: CatalogRepository,
}

impl OrderRepository {
    /// Create a new order repository.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let catalog = CatalogRepository::new(pool.clone());
        Self { pool, catalog }
    }

    /// Load items for the given orders and attach product snapshots.
    async fn attach_items(
        &self,
        rows: Vec<OrderRow>,
    ) -> Result<Vec<OrderWithProducts>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<String> = rows.iter().map(|r| r.id.as_str().to_owned()).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, quantity, price
            FROM bazaar.order_item
            WHERE order_id = ANY($1)
            ORDER BY order_id, position
            ",
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in item_rows {
            let item = OrderItem::try_from(row)?;
            items_by_order
                .entry(item.order_id.clone())
                .or_default()
                .push(item);
        }

        let mut product_ids: Vec<ProductId> = items_by_order
            .values()
            .flatten()
            .map(|item| item.product_id.clone())
            .collect();
        product_ids.sort();
        product_ids.dedup();

        let products: HashMap<ProductId, Product> = self
            .catalog
            .get_products(&product_ids)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
                    .with_products(|id| products.get(id).cloned())
            })
            .collect())
    }
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let order_id = OrderId::generate();
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO bazaar."order"
                (id, buyer_name, buyer_phone, buyer_address, total_amount,
                 payment_method, status, shopkeeper_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, buyer_name, buyer_phone, buyer_address, total_amount,
                      payment_method, status, shopkeeper_id, created_at, updated_at
            "#,
        )
        .bind(&order_id)
        .bind(&order.buyer_name)
        .bind(&order.buyer_phone)
        .bind(&order.buyer_address)
        .bind(order.total_amount)
        .bind(order.payment_method)
        .bind(order.status)
        .bind(&order.shopkeeper_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(order.items.len());
        for (position, line) in order.items.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| RepositoryError::Conflict("too many order items".to_string()))?;

            let item = sqlx::query_as::<_, OrderItemRow>(
                r"
                INSERT INTO bazaar.order_item (id, order_id, position, product_id, quantity, price)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, order_id, product_id, quantity, price
                ",
            )
            .bind(OrderItemId::generate())
            .bind(&order_id)
            .bind(position)
            .bind(&line.product_id)
            .bind(i64::from(line.quantity))
            .bind(line.price)
            .fetch_one(&mut *tx)
            .await?;

            items.push(OrderItem::try_from(item)?);
        }

        tx.commit().await?;

        Ok(row.into_order(items))
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<OrderWithProducts>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, buyer_name, buyer_phone, buyer_address, total_amount,
                   payment_method, status, shopkeeper_id, created_at, updated_at
            FROM bazaar."order"
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(self.attach_items(vec![row]).await?.pop())
    }

    async fn list_for_shopkeeper(
        &self,
        shopkeeper_id: &ShopkeeperId,
    ) -> Result<Vec<OrderWithProducts>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, buyer_name, buyer_phone, buyer_address, total_amount,
                   payment_method, status, shopkeeper_id, created_at, updated_at
            FROM bazaar."order"
            WHERE shopkeeper_id = $1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(shopkeeper_id)
        .fetch_all(&self.pool)
        .await?;

        self.attach_items(rows).await
    }

    async fn set_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
        shopkeeper_id: &ShopkeeperId,
        policy: TransitionPolicy,
    ) -> Result<OrderWithProducts, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(OrderStatus, Option<ShopkeeperId>)> = sqlx::query_as(
            r#"SELECT status, shopkeeper_id FROM bazaar."order" WHERE id = $1 FOR UPDATE"#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((current_status, previous_owner)) = current else {
            return Err(RepositoryError::NotFound);
        };

        // Dropping the transaction rolls back and releases the row lock
        if !policy.permits(current_status, status) {
            return Err(RepositoryError::StatusConflict {
                current: current_status,
            });
        }

        sqlx::query(
            r#"
            UPDATE bazaar."order"
            SET status = $2, shopkeeper_id = $3, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(shopkeeper_id)
        .execute(&mut *tx)
        .await?;

        if previous_owner.as_ref() != Some(shopkeeper_id) {
            sqlx::query(
                r"
                INSERT INTO bazaar.order_ownership_transfer
                    (order_id, from_shopkeeper_id, to_shopkeeper_id, status)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(id)
            .bind(&previous_owner)
            .bind(shopkeeper_id)
            .bind(status)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_order(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn ownership_transfers(
        &self,
        id: &OrderId,
    ) -> Result<Vec<OwnershipTransfer>, RepositoryError> {
        let rows = sqlx::query_as::<_, OwnershipTransferRow>(
            r"
            SELECT order_id, from_shopkeeper_id, to_shopkeeper_id, status, transferred_at
            FROM bazaar.order_ownership_transfer
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(OwnershipTransfer::from).collect())
    }
}
