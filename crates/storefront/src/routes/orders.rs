//! Order route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use bazaar_core::OrderId;

use crate::error::{ApiJson, Result, add_breadcrumb};
use crate::models::order::{
    Order, OrderWithProducts, OwnershipTransfer, SubmitOrderRequest, UpdateStatusRequest,
};
use crate::state::AppState;

/// Place an order.
///
/// POST /orders
#[instrument(skip(state, request))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SubmitOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = state.orders().submit(request).await?;
    add_breadcrumb("order", "Order placed", Some(&[("order_id", order.id.as_str())]));
    Ok((StatusCode::CREATED, Json(order)))
}

/// Fetch an order with its items.
///
/// GET /orders/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderWithProducts>> {
    Ok(Json(state.orders().get(&id).await?))
}

/// Change an order's status on behalf of a shopkeeper.
///
/// PATCH /orders/{id}/status
#[instrument(skip(state, request))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> Result<Json<OrderWithProducts>> {
    Ok(Json(state.orders().update_status(&id, request).await?))
}

/// Owner changes recorded for an order.
///
/// GET /orders/{id}/transfers
#[instrument(skip(state))]
pub async fn transfers(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Vec<OwnershipTransfer>>> {
    Ok(Json(state.orders().ownership_transfers(&id).await?))
}
