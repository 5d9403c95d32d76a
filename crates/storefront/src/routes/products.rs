//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bazaar_core::{ProductId, ShopkeeperId};

use crate::error::{ApiJson, Result};
use crate::models::catalog::{
    CreateProductRequest, Product, ProductWithShop, UpdateProductRequest,
};
use crate::services::optional_text;
use crate::state::AppState;

/// Listing filter.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub shopkeeper_id: Option<String>,
}

/// Body returned after a deletion.
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub message: &'static str,
}

/// List products, newest first.
///
/// GET /products?shopkeeperId=...
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<ProductWithShop>>> {
    let shopkeeper_id = optional_text(filter.shopkeeper_id).map(ShopkeeperId::new);
    Ok(Json(state.catalog().list_products(shopkeeper_id).await?))
}

/// Product detail.
///
/// GET /products/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductWithShop>> {
    Ok(Json(state.catalog().get_product(&id).await?))
}

/// Add a product.
///
/// POST /products
#[instrument(skip(state, request))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = state.catalog().create_product(request).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product.
///
/// PUT /products/{id}
#[instrument(skip(state, request))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    ApiJson(request): ApiJson<UpdateProductRequest>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog().update_product(&id, request).await?))
}

/// Delete a product.
///
/// DELETE /products/{id}
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Deleted>> {
    state.catalog().delete_product(&id).await?;
    state.chat().close(&id).await;
    Ok(Json(Deleted {
        message: "Product deleted successfully",
    }))
}
