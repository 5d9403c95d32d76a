//! In-memory implementation of the storefront stores.
//!
//! Backs the integration tests and local demos. Mirrors the `PostgreSQL`
//! behaviour the services rely on: newest-first listings, phone uniqueness,
//! no foreign key from order items to products, and an audit row per change
//! of order owner. Writes can be made to fail to exercise persistence errors.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use bazaar_core::{
    OrderId, OrderItemId, OrderStatus, Phone, ProductId, ShopkeeperId, TransitionPolicy,
};

use super::{CatalogStore, OrderStore, RepositoryError};
use crate::models::catalog::{
    NewProduct, NewShopkeeper, Product, ProductUpdate, ProductWithShop, ShopSummary, Shopkeeper,
};
use crate::models::order::{NewOrder, Order, OrderItem, OrderWithProducts, OwnershipTransfer};

/// Records in insertion order. Listings walk them in reverse.
#[derive(Debug, Default)]
struct MemoryData {
    shopkeepers: Vec<Shopkeeper>,
    products: Vec<Product>,
    orders: Vec<Order>,
    transfers: Vec<OwnershipTransfer>,
}

impl MemoryData {
    fn with_shop(&self, product: &Product) -> Option<ProductWithShop> {
        let shopkeeper = self
            .shopkeepers
            .iter()
            .find(|s| s.id == product.shopkeeper_id)?;

        Some(ProductWithShop {
            product: product.clone(),
            shopkeeper: ShopSummary::from(shopkeeper),
        })
    }

    fn product(&self, id: &ProductId) -> Option<Product> {
        self.products.iter().find(|p| &p.id == id).cloned()
    }

    fn with_products(&self, order: &Order) -> OrderWithProducts {
        order.clone().with_products(|id| self.product(id))
    }
}

/// Store holding every record in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<MemoryData>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a database error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.data.lock().await.orders.len()
    }

    fn check_writable(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        self.check_writable()?;

        let id = OrderId::generate();
        let now = Utc::now();
        let order_items = order
            .items
            .into_iter()
            .map(|line| OrderItem {
                id: OrderItemId::generate(),
                order_id: id.clone(),
                product_id: line.product_id,
                quantity: line.quantity,
                price: line.price,
            })
            .collect();

        let order = Order {
            id,
            buyer_name: order.buyer_name,
            buyer_phone: order.buyer_phone,
            buyer_address: order.buyer_address,
            total_amount: order.total_amount,
            payment_method: order.payment_method,
            status: order.status,
            shopkeeper_id: order.shopkeeper_id,
            created_at: now,
            updated_at: now,
            order_items,
        };

        self.data.lock().await.orders.push(order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<OrderWithProducts>, RepositoryError> {
        let data = self.data.lock().await;
        Ok(data
            .orders
            .iter()
            .find(|o| &o.id == id)
            .map(|o| data.with_products(o)))
    }

    async fn list_for_shopkeeper(
        &self,
        shopkeeper_id: &ShopkeeperId,
    ) -> Result<Vec<OrderWithProducts>, RepositoryError> {
        let data = self.data.lock().await;
        Ok(data
            .orders
            .iter()
            .rev()
            .filter(|o| o.shopkeeper_id.as_ref() == Some(shopkeeper_id))
            .map(|o| data.with_products(o))
            .collect())
    }

    async fn set_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
        shopkeeper_id: &ShopkeeperId,
        policy: TransitionPolicy,
    ) -> Result<OrderWithProducts, RepositoryError> {
        self.check_writable()?;

        let mut data = self.data.lock().await;
        let order = data
            .orders
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or(RepositoryError::NotFound)?;

        if !policy.permits(order.status, status) {
            return Err(RepositoryError::StatusConflict {
                current: order.status,
            });
        }

        let now = Utc::now();
        let previous_owner = order.shopkeeper_id.replace(shopkeeper_id.clone());
        order.status = status;
        order.updated_at = now;
        let updated = order.clone();

        if previous_owner.as_ref() != Some(shopkeeper_id) {
            data.transfers.push(OwnershipTransfer {
                order_id: id.clone(),
                from_shopkeeper_id: previous_owner,
                to_shopkeeper_id: shopkeeper_id.clone(),
                status,
                transferred_at: now,
            });
        }

        Ok(data.with_products(&updated))
    }

    async fn ownership_transfers(
        &self,
        id: &OrderId,
    ) -> Result<Vec<OwnershipTransfer>, RepositoryError> {
        let data = self.data.lock().await;
        Ok(data
            .transfers
            .iter()
            .filter(|t| &t.order_id == id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn list_products(
        &self,
        shopkeeper_id: Option<ShopkeeperId>,
    ) -> Result<Vec<ProductWithShop>, RepositoryError> {
        let data = self.data.lock().await;
        Ok(data
            .products
            .iter()
            .rev()
            .filter(|p| shopkeeper_id.as_ref().is_none_or(|id| &p.shopkeeper_id == id))
            .filter_map(|p| data.with_shop(p))
            .collect())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<ProductWithShop>, RepositoryError> {
        let data = self.data.lock().await;
        Ok(data
            .products
            .iter()
            .find(|p| &p.id == id)
            .and_then(|p| data.with_shop(p)))
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let data = self.data.lock().await;
        Ok(data
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        self.check_writable()?;

        let mut data = self.data.lock().await;
        if !data.shopkeepers.iter().any(|s| s.id == product.shopkeeper_id) {
            return Err(RepositoryError::Conflict(format!(
                "unknown shopkeeper {}",
                product.shopkeeper_id
            )));
        }

        let now = Utc::now();
        let product = Product {
            id: ProductId::generate(),
            title: product.title,
            description: product.description,
            price: product.price,
            category: product.category,
            image_url: product.image_url,
            stock: product.stock,
            shopkeeper_id: product.shopkeeper_id,
            created_at: now,
            updated_at: now,
        };
        data.products.push(product.clone());
        Ok(product)
    }

    async fn upsert_product(&self, product: Product) -> Result<Product, RepositoryError> {
        self.check_writable()?;

        let mut data = self.data.lock().await;
        if let Some(existing) = data.products.iter_mut().find(|p| p.id == product.id) {
            *existing = Product {
                created_at: existing.created_at,
                updated_at: Utc::now(),
                ..product
            };
            return Ok(existing.clone());
        }

        data.products.push(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: &ProductId,
        update: ProductUpdate,
    ) -> Result<Option<Product>, RepositoryError> {
        self.check_writable()?;

        let mut data = self.data.lock().await;
        let Some(product) = data.products.iter_mut().find(|p| &p.id == id) else {
            return Ok(None);
        };

        update.apply_to(product);
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: &ProductId) -> Result<bool, RepositoryError> {
        self.check_writable()?;

        let mut data = self.data.lock().await;
        let before = data.products.len();
        data.products.retain(|p| &p.id != id);
        Ok(data.products.len() < before)
    }

    async fn count_products(&self, shopkeeper_id: &ShopkeeperId) -> Result<u64, RepositoryError> {
        let data = self.data.lock().await;
        let count = data
            .products
            .iter()
            .filter(|p| &p.shopkeeper_id == shopkeeper_id)
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn create_shopkeeper_if_absent(
        &self,
        shopkeeper: NewShopkeeper,
    ) -> Result<Shopkeeper, RepositoryError> {
        self.check_writable()?;

        let mut data = self.data.lock().await;
        if let Some(existing) = data.shopkeepers.iter().find(|s| s.phone == shopkeeper.phone) {
            return Ok(existing.clone());
        }

        let created = Shopkeeper {
            id: ShopkeeperId::generate(),
            name: shopkeeper.name,
            phone: shopkeeper.phone,
            shop_name: shopkeeper.shop_name,
            shop_number: shopkeeper.shop_number,
            created_at: Utc::now(),
        };
        data.shopkeepers.push(created.clone());
        Ok(created)
    }

    async fn find_shopkeeper_by_phone(
        &self,
        phone: &Phone,
    ) -> Result<Option<Shopkeeper>, RepositoryError> {
        let data = self.data.lock().await;
        Ok(data.shopkeepers.iter().find(|s| &s.phone == phone).cloned())
    }

    async fn get_shopkeeper(&self, id: &ShopkeeperId) -> Result<Option<Shopkeeper>, RepositoryError> {
        let data = self.data.lock().await;
        Ok(data.shopkeepers.iter().find(|s| &s.id == id).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{OrderLine, PaymentMethod, Price};

    use super::*;

    async fn seeded() -> (MemoryStore, Shopkeeper) {
        let store = MemoryStore::new();
        let shopkeeper = store
            .create_shopkeeper_if_absent(NewShopkeeper {
                name: "Ahmed Khan".to_string(),
                phone: Phone::parse("0300-1234567").unwrap(),
                shop_name: "Al-Faisal Fabrics".to_string(),
                shop_number: Some("Shop 123, First Floor".to_string()),
            })
            .await
            .unwrap();
        (store, shopkeeper)
    }

    fn new_order(product: &str) -> NewOrder {
        NewOrder {
            buyer_name: "Ayesha".to_string(),
            buyer_phone: "0333-1111111".to_string(),
            buyer_address: "House 1".to_string(),
            total_amount: Price::from_units(100),
            payment_method: PaymentMethod::CashOnDelivery,
            status: OrderStatus::Pending,
            shopkeeper_id: None,
            items: vec![OrderLine {
                product_id: ProductId::new(product),
                quantity: 1,
                price: Price::from_units(100),
            }],
        }
    }

    #[tokio::test]
    async fn test_shopkeeper_phone_is_unique() {
        let (store, first) = seeded().await;

        let again = store
            .create_shopkeeper_if_absent(NewShopkeeper {
                name: "Someone Else".to_string(),
                phone: Phone::parse("0300-1234567").unwrap(),
                shop_name: "Other".to_string(),
                shop_number: None,
            })
            .await
            .unwrap();

        assert_eq!(again, first);
    }

    #[tokio::test]
    async fn test_products_listed_newest_first() {
        let (store, shopkeeper) = seeded().await;
        for title in ["first", "second"] {
            store
                .create_product(NewProduct {
                    title: title.to_string(),
                    description: None,
                    price: Price::from_units(10),
                    category: "misc".to_string(),
                    image_url: None,
                    stock: 0,
                    shopkeeper_id: shopkeeper.id.clone(),
                })
                .await
                .unwrap();
        }

        let listed = store.list_products(None).await.unwrap();
        assert_eq!(listed[0].product.title, "second");
        assert_eq!(listed[1].product.title, "first");
        assert_eq!(listed[0].shopkeeper.shop_name, "Al-Faisal Fabrics");
    }

    #[tokio::test]
    async fn test_set_status_records_owner_changes_only() {
        let store = MemoryStore::new();
        let order = store.insert_order(new_order("p1")).await.unwrap();
        let a = ShopkeeperId::new("a");
        let b = ShopkeeperId::new("b");

        let strict = TransitionPolicy::Strict;

        store.set_status(&order.id, OrderStatus::Confirmed, &a, strict).await.unwrap();
        store.set_status(&order.id, OrderStatus::Confirmed, &a, strict).await.unwrap();
        store.set_status(&order.id, OrderStatus::Delivered, &b, strict).await.unwrap();

        let transfers = store.ownership_transfers(&order.id).await.unwrap();
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[0].from_shopkeeper_id, None);
        assert_eq!(transfers[1].from_shopkeeper_id, Some(a));
        assert_eq!(transfers[1].to_shopkeeper_id, b);
    }

    #[tokio::test]
    async fn test_set_status_unknown_order() {
        let store = MemoryStore::new();
        let result = store
            .set_status(
                &OrderId::new("nope"),
                OrderStatus::Confirmed,
                &ShopkeeperId::new("a"),
                TransitionPolicy::Strict,
            )
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_set_status_checks_policy_against_stored_status() {
        let store = MemoryStore::new();
        let order = store.insert_order(new_order("p1")).await.unwrap();
        let a = ShopkeeperId::new("a");
        let b = ShopkeeperId::new("b");

        store
            .set_status(&order.id, OrderStatus::Rejected, &b, TransitionPolicy::Strict)
            .await
            .unwrap();

        let result = store
            .set_status(&order.id, OrderStatus::Confirmed, &a, TransitionPolicy::Strict)
            .await;
        assert!(matches!(
            result,
            Err(RepositoryError::StatusConflict {
                current: OrderStatus::Rejected
            })
        ));

        // Refused writes change nothing
        let stored = store.get_order(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Rejected);
        assert_eq!(stored.shopkeeper_id, Some(b));
        assert_eq!(store.ownership_transfers(&order.id).await.unwrap().len(), 1);

        store
            .set_status(&order.id, OrderStatus::Confirmed, &a, TransitionPolicy::Legacy)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failing_writes_leave_store_untouched() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);

        let result = store.insert_order(new_order("p1")).await;
        assert!(matches!(result, Err(RepositoryError::Database(_))));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_deleted_product_leaves_order_items() {
        let (store, shopkeeper) = seeded().await;
        let product = store
            .create_product(NewProduct {
                title: "Shawl".to_string(),
                description: None,
                price: Price::from_units(800),
                category: "accessories".to_string(),
                image_url: None,
                stock: 3,
                shopkeeper_id: shopkeeper.id.clone(),
            })
            .await
            .unwrap();

        let order = store
            .insert_order(new_order(product.id.as_str()))
            .await
            .unwrap();
        assert!(store.delete_product(&product.id).await.unwrap());

        let loaded = store.get_order(&order.id).await.unwrap().unwrap();
        assert_eq!(loaded.order_items.len(), 1);
        assert_eq!(loaded.order_items[0].item.product_id, product.id);
        assert!(loaded.order_items[0].product.is_none());
    }
}
