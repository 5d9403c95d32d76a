//! Integration tests for the session cart and checkout.
//!
//! Run with: `cargo test -p bazaar-integration-tests --test cart`

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use bazaar_integration_tests::TestApp;

async fn add(app: &TestApp, product_id: &str) {
    let response = app.post("/cart/add", &json!({ "productId": product_id })).await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
}

fn buyer() -> serde_json::Value {
    json!({
        "buyerName": "Ali",
        "buyerPhone": "0300-0000000",
        "buyerAddress": "X St"
    })
}

#[tokio::test]
async fn test_cart_totals_across_lines() {
    let app = TestApp::seeded().await;

    add(&app, "prod1").await;
    add(&app, "prod1").await;
    add(&app, "prod5").await;

    let cart = app.get("/cart").await;
    assert_eq!(cart.status, StatusCode::OK);
    assert_eq!(cart.body["totalAmount"].as_f64(), Some(3800.0));
    assert_eq!(cart.body["totalItems"], 3);

    let items = cart.body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["productId"], "prod1");
    assert_eq!(items[0]["quantity"], 2);

    let count = app.get("/cart/count").await;
    assert_eq!(count.body["count"], 3);
}

#[tokio::test]
async fn test_cart_is_per_session() {
    let app = TestApp::seeded().await;
    add(&app, "prod1").await;

    app.new_session();
    let cart = app.get("/cart").await;

    assert_eq!(cart.body["totalItems"], 0);
    assert!(cart.body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_add_unknown_product_is_not_found() {
    let app = TestApp::seeded().await;

    let response = app.post("/cart/add", &json!({ "productId": "nope" })).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_quantity_clamps_and_keeps_line() {
    let app = TestApp::seeded().await;
    add(&app, "prod1").await;

    let response = app
        .post("/cart/update", &json!({ "productId": "prod1", "quantity": 4 }))
        .await;
    assert_eq!(response.body["totalItems"], 4);
    assert_eq!(response.body["totalAmount"].as_f64(), Some(6000.0));

    let response = app
        .post("/cart/update", &json!({ "productId": "prod1", "quantity": -3 }))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["totalItems"], 0);
    assert_eq!(response.body["items"].as_array().unwrap().len(), 1);
    assert_eq!(response.body["items"][0]["quantity"], 0);
}

#[tokio::test]
async fn test_remove_and_clear() {
    let app = TestApp::seeded().await;
    add(&app, "prod1").await;
    add(&app, "prod5").await;

    let response = app.post("/cart/remove", &json!({ "productId": "prod1" })).await;
    assert_eq!(response.body["items"].as_array().unwrap().len(), 1);
    assert_eq!(response.body["totalAmount"].as_f64(), Some(800.0));

    let response = app.post("/cart/clear", &json!({})).await;
    assert_eq!(response.body["totalItems"], 0);
}

#[tokio::test]
async fn test_checkout_places_order_and_empties_cart() {
    let app = TestApp::seeded().await;
    add(&app, "prod1").await;
    add(&app, "prod1").await;
    add(&app, "prod5").await;
    app.post("/view", &json!({ "view": "checkout" })).await;

    let response = app.post("/checkout", &buyer()).await;

    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    assert_eq!(response.body["totalAmount"].as_f64(), Some(3800.0));
    assert_eq!(response.body["status"], "pending");
    assert_eq!(response.body["orderItems"].as_array().unwrap().len(), 2);
    // Two sellers, so nobody owns it yet
    assert!(response.body["shopkeeperId"].is_null());

    let cart = app.get("/cart").await;
    assert_eq!(cart.body["totalItems"], 0);

    let view = app.get("/view").await;
    assert_eq!(view.body["currentView"], "home");
}

#[tokio::test]
async fn test_checkout_skips_zero_quantity_lines() {
    let app = TestApp::seeded().await;
    add(&app, "prod1").await;
    add(&app, "prod5").await;
    app.post("/cart/update", &json!({ "productId": "prod5", "quantity": 0 }))
        .await;

    let response = app.post("/checkout", &buyer()).await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["orderItems"].as_array().unwrap().len(), 1);
    assert_eq!(response.body["totalAmount"].as_f64(), Some(1500.0));
}

#[tokio::test]
async fn test_failed_checkout_keeps_cart() {
    let app = TestApp::seeded().await;
    add(&app, "prod1").await;

    let response = app
        .post("/checkout", &json!({ "buyerName": "Ali", "buyerPhone": "0300-0000000" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.get("/cart").await.body["totalItems"], 1);

    app.store.set_fail_writes(true);
    let response = app.post("/checkout", &buyer()).await;
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.get("/cart").await.body["totalItems"], 1);
    assert_eq!(app.store.order_count().await, 0);
}

#[tokio::test]
async fn test_checkout_with_empty_cart_is_rejected() {
    let app = TestApp::seeded().await;

    let response = app.post("/checkout", &buyer()).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.order_count().await, 0);
}

#[tokio::test]
async fn test_cart_with_out_of_range_total_still_renders() {
    let app = TestApp::seeded().await;
    let ahmed = app.shopkeeper_id("0300-1234567").await;
    let created = app
        .post(
            "/products",
            &json!({
                "title": "Gold Thread Sherwani",
                "price": "50000000000000000000000000000",
                "category": "clothing",
                "shopkeeperId": ahmed
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    let id = created.body["id"].as_str().unwrap().to_string();

    add(&app, &id).await;
    let updated = app
        .post("/cart/update", &json!({ "productId": id, "quantity": 2 }))
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{:?}", updated.body);

    let cart = app.get("/cart").await;
    assert_eq!(cart.status, StatusCode::OK);
    assert!(cart.body["totalAmount"].as_f64().unwrap() > 5e28);
    assert_eq!(cart.body["totalItems"], 2);

    let checkout = app.post("/checkout", &buyer()).await;
    assert_eq!(checkout.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.order_count().await, 0);
    assert_eq!(app.get("/cart/count").await.body["count"], 2);
}
