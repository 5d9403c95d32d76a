//! Product chat handlers.
//!
//! History and posting are plain JSON; live messages are pushed over
//! server-sent events. A subscriber that falls behind skips the messages it
//! missed. Every handler answers 404 for a product that is not in the catalog.

use std::convert::Infallible;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use tokio::sync::broadcast::error::RecvError;
use tracing::instrument;

use bazaar_core::ProductId;

use crate::error::{ApiJson, Result};
use crate::services::ChatMessage;
use crate::services::chat::PostMessageRequest;
use crate::state::AppState;

/// Retained messages for a product, oldest first.
///
/// GET /chat/{productId}/messages
#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<ChatMessage>>> {
    state.catalog().get_product(&product_id).await?;
    Ok(Json(state.chat().history(&product_id).await))
}

/// Post a message to a product's room.
///
/// POST /chat/{productId}/messages
#[instrument(skip(state, request))]
pub async fn post(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    ApiJson(request): ApiJson<PostMessageRequest>,
) -> Result<(StatusCode, Json<ChatMessage>)> {
    state.catalog().get_product(&product_id).await?;
    let message = state.chat().publish(&product_id, request).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Live messages for a product as server-sent events.
///
/// GET /chat/{productId}/stream
#[instrument(skip(state))]
pub async fn stream(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Sse<impl futures::Stream<Item = std::result::Result<Event, Infallible>>>> {
    state.catalog().get_product(&product_id).await?;
    let mut receiver = state.chat().subscribe(&product_id).await;

    let events = async_stream::stream! {
        loop {
            match receiver.recv().await {
                Ok(message) => {
                    let json = serde_json::to_string(&message).unwrap_or_else(|_| {
                        r#"{"error":"Failed to serialize message"}"#.to_string()
                    });
                    yield Ok::<_, Infallible>(Event::default().event("message").data(json));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Chat subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
