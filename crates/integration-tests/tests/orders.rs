//! Integration tests for placing orders and moving them through statuses.
//!
//! Run with: `cargo test -p bazaar-integration-tests --test orders`

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use bazaar_integration_tests::TestApp;

fn ali_order() -> Value {
    json!({
        "buyerName": "Ali",
        "buyerPhone": "0300-0000000",
        "buyerAddress": "X St",
        "totalAmount": 3000,
        "orderItems": [{ "productId": "p1", "quantity": 2, "price": 1500 }]
    })
}

#[tokio::test]
async fn test_submit_order_defaults_to_pending_cod() {
    let app = TestApp::new();

    let response = app.post("/orders", &ali_order()).await;

    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    assert_eq!(response.body["totalAmount"].as_f64(), Some(3000.0));
    assert_eq!(response.body["status"], "pending");
    assert_eq!(response.body["paymentMethod"], "cod");
    assert_eq!(response.body["buyerName"], "Ali");
    assert_eq!(response.body["orderItems"].as_array().unwrap().len(), 1);
    assert!(response.body["shopkeeperId"].is_null());
}

#[tokio::test]
async fn test_invalid_status_leaves_order_pending() {
    let app = TestApp::new();
    let order = app.post("/orders", &ali_order()).await;
    let id = order.body["id"].as_str().unwrap();

    let response = app
        .patch(
            &format!("/orders/{id}/status"),
            &json!({ "status": "shipped", "shopkeeperId": "s1" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].as_str().unwrap().contains("shipped"));

    let after = app.get(&format!("/orders/{id}")).await;
    assert_eq!(after.status, StatusCode::OK);
    assert_eq!(after.body["status"], "pending");
}

#[tokio::test]
async fn test_empty_order_is_rejected_and_not_stored() {
    let app = TestApp::new();

    let mut body = ali_order();
    body["orderItems"] = json!([]);
    let response = app.post("/orders", &body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.order_count().await, 0);
}

#[tokio::test]
async fn test_missing_buyer_fields_are_rejected() {
    let app = TestApp::new();

    for field in ["buyerName", "buyerPhone", "buyerAddress", "totalAmount"] {
        let mut body = ali_order();
        body.as_object_mut().unwrap().remove(field);
        let response = app.post("/orders", &body).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "missing {field}");
    }

    assert_eq!(app.store.order_count().await, 0);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();

    let response = app
        .request(
            axum::http::Method::POST,
            "/orders",
            Some(&Value::String("not an order".to_string())),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_storage_failure_is_internal_error_without_details() {
    let app = TestApp::new();
    app.store.set_fail_writes(true);

    let response = app.post("/orders", &ali_order()).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["error"], "Internal server error");
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let app = TestApp::new();

    let response = app.get("/orders/does-not-exist").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .patch(
            "/orders/does-not-exist/status",
            &json!({ "status": "confirmed", "shopkeeperId": "s1" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_single_seller_order_is_assigned_to_that_seller() {
    let app = TestApp::seeded().await;
    let ahmed = app.shopkeeper_id("0300-1234567").await;

    let response = app
        .post(
            "/orders",
            &json!({
                "buyerName": "Sana",
                "buyerPhone": "0333-2222222",
                "buyerAddress": "Block 5, Karachi",
                "totalAmount": 3000,
                "orderItems": [{ "productId": "prod1", "quantity": 2, "price": 1500 }]
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["shopkeeperId"], ahmed.as_str());

    let listed = app.get(&format!("/shopkeeper/{ahmed}")).await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);
    assert_eq!(listed.body[0]["orderItems"][0]["product"]["id"], "prod1");
}

#[tokio::test]
async fn test_status_update_takes_ownership_and_records_transfer() {
    let app = TestApp::seeded().await;
    let fatima = app.shopkeeper_id("0321-9876543").await;

    let order = app.post("/orders", &ali_order()).await;
    let id = order.body["id"].as_str().unwrap();

    let response = app
        .patch(
            &format!("/orders/{id}/status"),
            &json!({ "status": "confirmed", "shopkeeperId": fatima }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["status"], "confirmed");
    assert_eq!(response.body["shopkeeperId"], fatima.as_str());

    let transfers = app.get(&format!("/orders/{id}/transfers")).await;
    assert_eq!(transfers.status, StatusCode::OK);
    let transfers = transfers.body.as_array().unwrap();
    assert_eq!(transfers.len(), 1);
    assert!(transfers[0]["fromShopkeeperId"].is_null());
    assert_eq!(transfers[0]["toShopkeeperId"], fatima.as_str());

    let dashboard = app.get(&format!("/shopkeeper/{fatima}")).await;
    assert_eq!(dashboard.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_illegal_transition_is_conflict() {
    let app = TestApp::new();
    let order = app.post("/orders", &ali_order()).await;
    let id = order.body["id"].as_str().unwrap();

    let response = app
        .patch(
            &format!("/orders/{id}/status"),
            &json!({ "status": "delivered", "shopkeeperId": "s1" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    let after = app.get(&format!("/orders/{id}")).await;
    assert_eq!(after.body["status"], "pending");
}

#[tokio::test]
async fn test_legacy_policy_allows_any_transition() {
    let app = TestApp::with_config(|config| {
        config.transition_policy = bazaar_core::TransitionPolicy::Legacy;
    });
    let order = app.post("/orders", &ali_order()).await;
    let id = order.body["id"].as_str().unwrap();

    let response = app
        .patch(
            &format!("/orders/{id}/status"),
            &json!({ "status": "delivered", "shopkeeperId": "s1" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "delivered");
}

#[tokio::test]
async fn test_status_update_requires_shopkeeper() {
    let app = TestApp::new();
    let order = app.post("/orders", &ali_order()).await;
    let id = order.body["id"].as_str().unwrap();

    let response = app
        .patch(&format!("/orders/{id}/status"), &json!({ "status": "confirmed" }))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_total_verification_rejects_mismatch() {
    let app = TestApp::with_config(|config| config.verify_order_totals = true);

    let mut body = ali_order();
    body["totalAmount"] = json!(2500);
    let response = app.post("/orders", &body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.order_count().await, 0);
}

#[tokio::test]
async fn test_mismatched_total_is_stored_as_submitted_by_default() {
    let app = TestApp::new();

    let mut body = ali_order();
    body["totalAmount"] = json!(2500);
    let response = app.post("/orders", &body).await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["totalAmount"].as_f64(), Some(2500.0));
}

#[tokio::test]
async fn test_seller_stats_count_revenue_from_delivered_orders() {
    let app = TestApp::seeded().await;
    let ahmed = app.shopkeeper_id("0300-1234567").await;

    for _ in 0..2 {
        app.post(
            "/orders",
            &json!({
                "buyerName": "Sana",
                "buyerPhone": "0333-2222222",
                "buyerAddress": "Block 5, Karachi",
                "totalAmount": 1500,
                "orderItems": [{ "productId": "prod1", "quantity": 1, "price": 1500 }]
            }),
        )
        .await;
    }
    let orders = app.get(&format!("/shopkeeper/{ahmed}")).await;
    let first = orders.body[0]["id"].as_str().unwrap().to_string();

    for status in ["confirmed", "delivered"] {
        let response = app
            .patch(
                &format!("/orders/{first}/status"),
                &json!({ "status": status, "shopkeeperId": ahmed }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let stats = app.get(&format!("/shopkeeper/{ahmed}/stats")).await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["totalOrders"], 2);
    assert_eq!(stats.body["pendingOrders"], 1);
    assert_eq!(stats.body["deliveredOrders"], 1);
    assert_eq!(stats.body["totalRevenue"].as_f64(), Some(1500.0));
    assert_eq!(stats.body["totalProducts"], 3);
}

#[tokio::test]
async fn test_line_total_out_of_range_is_rejected() {
    let app = TestApp::new();

    let mut body = ali_order();
    body["orderItems"] = json!([
        { "productId": "p1", "quantity": 1, "price": 1500 },
        { "productId": "p2", "quantity": 2, "price": "50000000000000000000000000000" }
    ]);
    let response = app.post("/orders", &body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST, "{:?}", response.body);
    assert_eq!(response.body["error"], "orderItems[1] total out of range");
    assert_eq!(app.store.order_count().await, 0);
}

#[tokio::test]
async fn test_status_update_moves_order_between_sellers() {
    let app = TestApp::seeded().await;
    let ahmed = app.shopkeeper_id("0300-1234567").await;
    let fatima = app.shopkeeper_id("0321-9876543").await;

    let order = app
        .post(
            "/orders",
            &json!({
                "buyerName": "Sana",
                "buyerPhone": "0333-2222222",
                "buyerAddress": "Block 5, Karachi",
                "totalAmount": 1500,
                "orderItems": [{ "productId": "prod1", "quantity": 1, "price": 1500 }]
            }),
        )
        .await;
    assert_eq!(order.body["shopkeeperId"], ahmed.as_str());
    let id = order.body["id"].as_str().unwrap();

    let response = app
        .patch(
            &format!("/orders/{id}/status"),
            &json!({ "status": "confirmed", "shopkeeperId": fatima }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["shopkeeperId"], fatima.as_str());

    let transfers = app.get(&format!("/orders/{id}/transfers")).await;
    let transfers = transfers.body.as_array().unwrap();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0]["fromShopkeeperId"], ahmed.as_str());
    assert_eq!(transfers[0]["toShopkeeperId"], fatima.as_str());

    let ahmed_orders = app.get(&format!("/shopkeeper/{ahmed}")).await;
    assert!(ahmed_orders.body.as_array().unwrap().is_empty());

    let fatima_orders = app.get(&format!("/shopkeeper/{fatima}")).await;
    assert_eq!(fatima_orders.body.as_array().unwrap().len(), 1);
    assert_eq!(fatima_orders.body[0]["id"], id);
}

#[tokio::test]
async fn test_order_items_keep_submitted_order_and_values() {
    let app = TestApp::seeded().await;
    let lines = [("prod3", 1, 3400.0), ("prod1", 4, 1450.0), ("prod4", 2, 1999.5)];

    let items: Vec<Value> = lines
        .iter()
        .map(|(id, quantity, price)| json!({ "productId": id, "quantity": quantity, "price": price }))
        .collect();
    let created = app
        .post(
            "/orders",
            &json!({
                "buyerName": "Sana",
                "buyerPhone": "0333-2222222",
                "buyerAddress": "Block 5, Karachi",
                "totalAmount": 13199,
                "orderItems": items
            }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{:?}", created.body);
    let id = created.body["id"].as_str().unwrap();

    let fetched = app.get(&format!("/orders/{id}")).await;
    assert_eq!(fetched.status, StatusCode::OK);

    for body in [&created.body, &fetched.body] {
        let stored = body["orderItems"].as_array().unwrap();
        assert_eq!(stored.len(), lines.len());
        for (index, (item, (product_id, quantity, price))) in stored.iter().zip(lines).enumerate() {
            assert_eq!(item["productId"], product_id, "productId of item {index}");
            assert_eq!(item["quantity"], quantity, "quantity of item {index}");
            assert_eq!(item["price"].as_f64(), Some(price), "price of item {index}");
            assert_eq!(item["orderId"], id, "orderId of item {index}");
        }
    }

    assert_eq!(fetched.body["orderItems"][1]["product"]["id"], "prod1");
}
