//! Order models.
//!
//! Buyer fields and items are fixed once an order is created. Only `status`,
//! `shopkeeper_id` and `updated_at` change afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{
    OrderId, OrderItemId, OrderLine, OrderStatus, PaymentMethod, Price, ProductId, ShopkeeperId,
};

use super::catalog::Product;

/// A persisted order line. `product_id` is a plain reference; the product may
/// have been deleted since.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price at the time of ordering.
    pub price: Price,
}

/// An order item with the current state of its product, if it still exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemWithProduct {
    #[serde(flatten)]
    pub item: OrderItem,
    pub product: Option<Product>,
}

/// A buyer order. Generic over the item representation so the same shape
/// serves plain orders and dashboard listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order<I = OrderItem> {
    pub id: OrderId,
    pub buyer_name: String,
    pub buyer_phone: String,
    pub buyer_address: String,
    /// Total as submitted by the client.
    pub total_amount: Price,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub shopkeeper_id: Option<ShopkeeperId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub order_items: Vec<I>,
}

/// An order whose items carry product snapshots.
pub type OrderWithProducts = Order<OrderItemWithProduct>;

impl Order {
    /// Attach product snapshots to each item using `lookup`.
    #[must_use]
    pub fn with_products<F>(self, mut lookup: F) -> OrderWithProducts
    where
        F: FnMut(&ProductId) -> Option<Product>,
    {
        let Self {
            id,
            buyer_name,
            buyer_phone,
            buyer_address,
            total_amount,
            payment_method,
            status,
            shopkeeper_id,
            created_at,
            updated_at,
            order_items,
        } = self;

        let order_items = order_items
            .into_iter()
            .map(|item| {
                let product = lookup(&item.product_id);
                OrderItemWithProduct { item, product }
            })
            .collect();

        Order {
            id,
            buyer_name,
            buyer_phone,
            buyer_address,
            total_amount,
            payment_method,
            status,
            shopkeeper_id,
            created_at,
            updated_at,
            order_items,
        }
    }
}

/// A validated order ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub buyer_name: String,
    pub buyer_phone: String,
    pub buyer_address: String,
    pub total_amount: Price,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub shopkeeper_id: Option<ShopkeeperId>,
    pub items: Vec<OrderLine>,
}

/// A recorded change of an order's owner during a status update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipTransfer {
    pub order_id: OrderId,
    pub from_shopkeeper_id: Option<ShopkeeperId>,
    pub to_shopkeeper_id: ShopkeeperId,
    pub status: OrderStatus,
    pub transferred_at: DateTime<Utc>,
}

// =============================================================================
// Request bodies
// =============================================================================

/// `POST /orders` body.
///
/// Everything is optional at the parsing stage; the order service decides
/// what is missing or invalid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitOrderRequest {
    pub buyer_name: Option<String>,
    pub buyer_phone: Option<String>,
    pub buyer_address: Option<String>,
    pub total_amount: Option<Price>,
    pub payment_method: Option<String>,
    pub status: Option<String>,
    pub order_items: Vec<OrderItemRequest>,
}

/// One line of a `POST /orders` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderItemRequest {
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<Price>,
}

impl From<&OrderLine> for OrderItemRequest {
    fn from(line: &OrderLine) -> Self {
        Self {
            product_id: Some(line.product_id.to_string()),
            quantity: Some(i64::from(line.quantity)),
            price: Some(line.price),
        }
    }
}

/// `PATCH /orders/{id}/status` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
    pub shopkeeper_id: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order() -> Order {
        let now = Utc::now();
        let id = OrderId::new("o1");
        Order {
            id: id.clone(),
            buyer_name: "Ayesha".to_string(),
            buyer_phone: "0333-1111111".to_string(),
            buyer_address: "House 1, Lahore".to_string(),
            total_amount: Price::from_units(3000),
            payment_method: PaymentMethod::CashOnDelivery,
            status: OrderStatus::Pending,
            shopkeeper_id: None,
            created_at: now,
            updated_at: now,
            order_items: vec![OrderItem {
                id: OrderItemId::new("i1"),
                order_id: id,
                product_id: ProductId::new("gone"),
                quantity: 2,
                price: Price::from_units(1500),
            }],
        }
    }

    #[test]
    fn test_with_products_keeps_items_of_deleted_products() {
        let with_products = order().with_products(|_| None);

        assert_eq!(with_products.order_items.len(), 1);
        assert_eq!(with_products.order_items[0].item.product_id, ProductId::new("gone"));
        assert!(with_products.order_items[0].product.is_none());
    }

    #[test]
    fn test_order_json_shape() {
        let json = serde_json::to_value(order()).unwrap();

        assert_eq!(json["buyerName"], "Ayesha");
        assert_eq!(json["paymentMethod"], "cod");
        assert_eq!(json["status"], "pending");
        assert!(json["shopkeeperId"].is_null());
        assert_eq!(json["orderItems"][0]["productId"], "gone");
        assert_eq!(json["orderItems"][0]["quantity"], 2);
    }

    #[test]
    fn test_submit_request_tolerates_missing_fields() {
        let req: SubmitOrderRequest = serde_json::from_str(r#"{"buyerName":"A"}"#).unwrap();
        assert_eq!(req.buyer_name.as_deref(), Some("A"));
        assert!(req.buyer_phone.is_none());
        assert!(req.order_items.is_empty());
    }
}
