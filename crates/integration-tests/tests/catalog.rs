//! Integration tests for products and shopkeepers.
//!
//! Run with: `cargo test -p bazaar-integration-tests --test catalog`

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;

use bazaar_integration_tests::TestApp;

#[tokio::test]
async fn test_seeded_listing_includes_shop_names() {
    let app = TestApp::seeded().await;

    let response = app.get("/products").await;

    assert_eq!(response.status, StatusCode::OK);
    let products = response.body.as_array().unwrap();
    assert_eq!(products.len(), 9);
    assert!(products.iter().all(|p| p["shopkeeper"]["shopName"].is_string()));
}

#[tokio::test]
async fn test_listing_filtered_by_shopkeeper() {
    let app = TestApp::seeded().await;
    let fatima = app.shopkeeper_id("0321-9876543").await;

    let response = app.get(&format!("/products?shopkeeperId={fatima}")).await;
    let products = response.body.as_array().unwrap();
    assert_eq!(products.len(), 3);
    assert!(products.iter().all(|p| p["shopkeeperId"] == fatima.as_str()));

    let dashboard = app.get(&format!("/shopkeeper/{fatima}/products")).await;
    assert_eq!(dashboard.body.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_product_lifecycle() {
    let app = TestApp::seeded().await;
    let ahmed = app.shopkeeper_id("0300-1234567").await;

    let created = app
        .post(
            "/products",
            &json!({
                "title": "Block Print Dupatta",
                "price": 950,
                "category": "clothing",
                "shopkeeperId": ahmed
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    assert_eq!(created.body["stock"], 0);
    let id = created.body["id"].as_str().unwrap().to_string();

    let updated = app
        .put(&format!("/products/{id}"), &json!({ "price": 1100, "stock": 7 }))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["price"].as_f64(), Some(1100.0));
    assert_eq!(updated.body["stock"], 7);
    assert_eq!(updated.body["title"], "Block Print Dupatta");

    let shown = app.get(&format!("/products/{id}")).await;
    assert_eq!(shown.body["shopkeeper"]["shopName"], "Al-Faisal Fabrics");

    let deleted = app.delete(&format!("/products/{id}")).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Product deleted successfully");

    assert_eq!(app.get(&format!("/products/{id}")).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.delete(&format!("/products/{id}")).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_product_validation() {
    let app = TestApp::seeded().await;
    let ahmed = app.shopkeeper_id("0300-1234567").await;

    let free = app
        .post(
            "/products",
            &json!({ "title": "Free", "price": 0, "category": "misc", "shopkeeperId": ahmed }),
        )
        .await;
    assert_eq!(free.status, StatusCode::BAD_REQUEST);

    let untitled = app
        .post(
            "/products",
            &json!({ "price": 100, "category": "misc", "shopkeeperId": ahmed }),
        )
        .await;
    assert_eq!(untitled.status, StatusCode::BAD_REQUEST);

    let orphan = app
        .post(
            "/products",
            &json!({ "title": "Orphan", "price": 100, "category": "misc", "shopkeeperId": "ghost" }),
        )
        .await;
    assert_eq!(orphan.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_register_shopkeeper_is_idempotent_per_phone() {
    let app = TestApp::new();
    let body = json!({
        "name": "Bilal",
        "phone": "0312-7654321",
        "shopName": "Bilal Crockery",
        "shopNumber": "Shop 9"
    });

    let first = app.post("/shopkeepers", &body).await;
    let second = app.post("/shopkeepers", &body).await;

    assert_eq!(first.status, StatusCode::CREATED);
    assert_eq!(second.status, StatusCode::CREATED);
    assert_eq!(first.body["id"], second.body["id"]);
    assert_eq!(first.body["phone"], "0312-7654321");

    let found = app.post("/shopkeepers/by-phone?phone=0312-7654321", &json!({})).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["shopName"], "Bilal Crockery");
}

#[tokio::test]
async fn test_shopkeeper_lookup_errors() {
    let app = TestApp::new();

    let missing = app.post("/shopkeepers/by-phone", &json!({})).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let unknown = app.post("/shopkeepers/by-phone?phone=0300-9999999", &json!({})).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let bad_phone = app
        .post(
            "/shopkeepers",
            &json!({ "name": "X", "phone": "call me", "shopName": "Y" }),
        )
        .await;
    assert_eq!(bad_phone.status, StatusCode::BAD_REQUEST);
}
