//! Cart and checkout route handlers.
//!
//! The cart lives in the buyer's session. Adding a product snapshots its
//! title, price, owner and image from the catalog; later catalog changes do
//! not touch carts. Checkout turns the cart into an order and clears it only
//! when the order was stored. Once the order exists the buyer always gets it
//! back, even if the session could not be updated.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::{Cart, CartItem, Price, ProductId, View};

use super::view::{load_view, save_view};
use crate::error::{ApiJson, AppError, Result};
use crate::models::order::{Order, OrderItemRequest, SubmitOrderRequest};
use crate::models::session_keys;
use crate::state::AppState;

/// Cart as returned to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total_amount: Price,
    pub total_items: u64,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().to_vec(),
            total_amount: cart.total_amount(),
            total_items: cart.total_items(),
        }
    }
}

/// Cart badge count.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u64,
}

/// Add to cart body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
}

/// Update quantity body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Remove from cart body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartRequest {
    pub product_id: ProductId,
}

/// Checkout body: buyer details only; the items come from the cart.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutRequest {
    pub buyer_name: Option<String>,
    pub buyer_phone: Option<String>,
    pub buyer_address: Option<String>,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart from the session, empty when none was stored.
pub(crate) async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Store the cart in the session.
pub(crate) async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// Current cart.
///
/// GET /cart
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Add a product, or bump its quantity by one if it is already in the cart.
///
/// POST /cart/add
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    ApiJson(request): ApiJson<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let product = state.catalog().get_product(&request.product_id).await?.product;

    let mut cart = load_cart(&session).await?;
    cart.add_item(CartItem {
        product_id: product.id,
        title: product.title,
        price: product.price,
        quantity: 1,
        shopkeeper_id: product.shopkeeper_id,
        image_url: product.image_url,
    });
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Set a line's quantity. Negative values become zero; the line is kept.
///
/// POST /cart/update
#[instrument(skip(session))]
pub async fn update(
    session: Session,
    ApiJson(request): ApiJson<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.update_quantity(&request.product_id, request.quantity);
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Remove a line.
///
/// POST /cart/remove
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    ApiJson(request): ApiJson<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.remove_item(&request.product_id);
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Empty the cart.
///
/// POST /cart/clear
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    let cart = Cart::new();
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Number of units in the cart.
///
/// GET /cart/count
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<Json<CartCount>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartCount {
        count: cart.total_items(),
    }))
}

/// Turn the cart into a cash-on-delivery order.
///
/// POST /checkout
#[instrument(skip(state, session, request))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let cart = load_cart(&session).await?;

    let order_request = SubmitOrderRequest {
        buyer_name: request.buyer_name,
        buyer_phone: request.buyer_phone,
        buyer_address: request.buyer_address,
        total_amount: Some(cart.total_amount()),
        payment_method: None,
        status: None,
        order_items: cart.order_lines().iter().map(OrderItemRequest::from).collect(),
    };

    let order = state.orders().submit(order_request).await.map_err(|e| {
        tracing::warn!(error = %e, "Checkout failed, cart kept");
        AppError::from(e)
    })?;

    Ok(complete_checkout(&session, order).await)
}

/// Empty the cart and return home, then answer with the order.
async fn complete_checkout(session: &Session, order: Order) -> (StatusCode, Json<Order>) {
    if let Err(e) = reset_session(session).await {
        tracing::error!(order_id = %order.id, error = %e, "Order placed but session not updated");
    } else {
        tracing::info!(order_id = %order.id, "Checkout complete");
    }

    (StatusCode::CREATED, Json(order))
}

async fn reset_session(session: &Session) -> Result<()> {
    save_cart(session, &Cart::new()).await?;

    let mut view = load_view(session).await?;
    view.set_view(View::Home);
    save_view(session, &view).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Utc;
    use tower_sessions::session::{Id, Record};
    use tower_sessions::{SessionStore, session_store};

    use bazaar_core::{OrderId, OrderStatus, PaymentMethod, ViewState};

    use super::*;

    /// Session store that cannot be reached.
    #[derive(Debug, Clone)]
    struct UnreachableStore;

    #[async_trait]
    impl SessionStore for UnreachableStore {
        async fn save(&self, _record: &Record) -> session_store::Result<()> {
            Err(session_store::Error::Backend("unreachable".to_string()))
        }

        async fn load(&self, _id: &Id) -> session_store::Result<Option<Record>> {
            Err(session_store::Error::Backend("unreachable".to_string()))
        }

        async fn delete(&self, _id: &Id) -> session_store::Result<()> {
            Err(session_store::Error::Backend("unreachable".to_string()))
        }
    }

    fn placed_order() -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new("o1"),
            buyer_name: "Ali".to_string(),
            buyer_phone: "0300-0000000".to_string(),
            buyer_address: "X St".to_string(),
            total_amount: Price::from_units(3000),
            payment_method: PaymentMethod::CashOnDelivery,
            status: OrderStatus::Pending,
            shopkeeper_id: None,
            created_at: now,
            updated_at: now,
            order_items: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_session_failure_after_order_still_returns_order() {
        let session = Session::new(Some(Id::default()), Arc::new(UnreachableStore), None);
        assert!(reset_session(&session).await.is_err());

        let (status, Json(order)) = complete_checkout(&session, placed_order()).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order.id, OrderId::new("o1"));
    }

    #[tokio::test]
    async fn test_completed_checkout_resets_session() {
        let store = Arc::new(tower_sessions::MemoryStore::default());
        let session = Session::new(None, store, None);
        let mut view = ViewState::default();
        view.set_view(View::Checkout);
        save_view(&session, &view).await.unwrap();

        let mut cart = Cart::new();
        cart.add_item(CartItem {
            product_id: ProductId::new("prod1"),
            title: "Kurta".to_string(),
            price: Price::from_units(1500),
            quantity: 2,
            shopkeeper_id: bazaar_core::ShopkeeperId::new("sk1"),
            image_url: None,
        });
        save_cart(&session, &cart).await.unwrap();

        let (status, _) = complete_checkout(&session, placed_order()).await;

        assert_eq!(status, StatusCode::CREATED);
        assert!(load_cart(&session).await.unwrap().is_empty());
        assert_eq!(load_view(&session).await.unwrap().current_view, View::Home);
    }
}
