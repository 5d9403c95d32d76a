//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! # Orders
//! POST  /orders                       - Place an order (201)
//! GET   /orders/{id}                  - Order with items
//! PATCH /orders/{id}/status           - Change status as a shopkeeper
//! GET   /orders/{id}/transfers        - Owner changes of an order
//!
//! # Seller dashboard
//! GET   /shopkeeper/{id}              - Orders owned by the shopkeeper
//! GET   /shopkeeper/{id}/products     - The shopkeeper's products
//! GET   /shopkeeper/{id}/stats        - Dashboard counters
//! POST  /shopkeepers                  - Register (idempotent per phone)
//! POST  /shopkeepers/by-phone?phone=  - Look up by phone
//!
//! # Catalog
//! GET    /products[?shopkeeperId=]    - Product listing
//! POST   /products                    - Add a product (201)
//! GET    /products/{id}               - Product detail
//! PUT    /products/{id}               - Update a product
//! DELETE /products/{id}               - Delete a product
//!
//! # Cart (session)
//! GET  /cart                          - Cart with totals
//! POST /cart/add                      - Add a product
//! POST /cart/update                   - Set a quantity
//! POST /cart/remove                   - Remove a line
//! POST /cart/clear                    - Empty the cart
//! GET  /cart/count                    - Units in the cart
//! POST /checkout                      - Place the cart as an order
//!
//! # Navigation (session)
//! GET  /view                          - Current screen
//! POST /view                          - Switch screen
//! POST /view/product/{id}             - Open a product
//!
//! # Chat
//! GET  /chat/{productId}/messages     - History
//! POST /chat/{productId}/messages     - Post a message
//! GET  /chat/{productId}/stream       - Live messages (SSE)
//! ```

pub mod cart;
pub mod chat;
pub mod orders;
pub mod products;
pub mod shopkeepers;
pub mod view;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", patch(orders::update_status))
        .route("/{id}/transfers", get(orders::transfers))
}

/// Create the seller dashboard routes router.
pub fn shopkeeper_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(shopkeepers::orders))
        .route("/{id}/products", get(shopkeepers::products))
        .route("/{id}/stats", get(shopkeepers::stats))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the navigation routes router.
pub fn view_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(view::show).post(view::set))
        .route("/product/{id}", post(view::product_detail))
}

/// Create the chat routes router.
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{product_id}/messages",
            get(chat::history).post(chat::post),
        )
        .route("/{product_id}/stream", get(chat::stream))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/orders", order_routes())
        .nest("/shopkeeper", shopkeeper_routes())
        .route("/shopkeepers", post(shopkeepers::register))
        .route("/shopkeepers/by-phone", post(shopkeepers::by_phone))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", post(cart::checkout))
        .nest("/view", view_routes())
        .nest("/chat", chat_routes())
}
