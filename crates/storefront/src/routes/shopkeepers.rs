//! Shopkeeper and seller dashboard route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use bazaar_core::{SellerStats, ShopkeeperId};

use crate::error::{ApiJson, Result};
use crate::models::catalog::{CreateShopkeeperRequest, ProductWithShop, Shopkeeper};
use crate::models::order::OrderWithProducts;
use crate::state::AppState;

/// Phone lookup query.
#[derive(Debug, Default, Deserialize)]
pub struct PhoneQuery {
    pub phone: Option<String>,
}

/// Register a shopkeeper (or return the one already using the phone).
///
/// POST /shopkeepers
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateShopkeeperRequest>,
) -> Result<(StatusCode, Json<Shopkeeper>)> {
    let shopkeeper = state.catalog().register_shopkeeper(request).await?;
    Ok((StatusCode::CREATED, Json(shopkeeper)))
}

/// Find a shopkeeper by phone number (seller login).
///
/// POST /shopkeepers/by-phone?phone=...
#[instrument(skip(state, query))]
pub async fn by_phone(
    State(state): State<AppState>,
    Query(query): Query<PhoneQuery>,
) -> Result<Json<Shopkeeper>> {
    Ok(Json(
        state
            .catalog()
            .find_shopkeeper_by_phone(query.phone.as_deref())
            .await?,
    ))
}

/// Orders owned by a shopkeeper, newest first.
///
/// GET /shopkeeper/{id}
#[instrument(skip(state))]
pub async fn orders(
    State(state): State<AppState>,
    Path(id): Path<ShopkeeperId>,
) -> Result<Json<Vec<OrderWithProducts>>> {
    Ok(Json(state.orders().list_for_shopkeeper(&id).await?))
}

/// A shopkeeper's products, newest first.
///
/// GET /shopkeeper/{id}/products
#[instrument(skip(state))]
pub async fn products(
    State(state): State<AppState>,
    Path(id): Path<ShopkeeperId>,
) -> Result<Json<Vec<ProductWithShop>>> {
    Ok(Json(state.catalog().list_products(Some(id)).await?))
}

/// Dashboard counters.
///
/// GET /shopkeeper/{id}/stats
#[instrument(skip(state))]
pub async fn stats(
    State(state): State<AppState>,
    Path(id): Path<ShopkeeperId>,
) -> Result<Json<SellerStats>> {
    Ok(Json(state.orders().stats(&id).await?))
}
