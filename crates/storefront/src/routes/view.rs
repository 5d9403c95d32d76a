//! Buyer navigation state handlers.
//!
//! Mirrors which screen the buyer is on so a client can restore it.

use axum::{Json, extract::Path};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use bazaar_core::{ProductId, View, ViewState};

use crate::error::{ApiJson, Result};
use crate::models::session_keys;

/// Switch screen body.
#[derive(Debug, Deserialize)]
pub struct SetViewRequest {
    pub view: View,
}

/// Get the view state from the session, `home` when none was stored.
pub(crate) async fn load_view(session: &Session) -> Result<ViewState> {
    Ok(session
        .get::<ViewState>(session_keys::VIEW)
        .await?
        .unwrap_or_default())
}

/// Store the view state in the session.
pub(crate) async fn save_view(session: &Session, view: &ViewState) -> Result<()> {
    session.insert(session_keys::VIEW, view).await?;
    Ok(())
}

/// Current screen and selected product.
///
/// GET /view
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<ViewState>> {
    Ok(Json(load_view(&session).await?))
}

/// Switch screens, forgetting the selected product.
///
/// POST /view
#[instrument(skip(session))]
pub async fn set(
    session: Session,
    ApiJson(request): ApiJson<SetViewRequest>,
) -> Result<Json<ViewState>> {
    let mut view = load_view(&session).await?;
    view.set_view(request.view);
    save_view(&session, &view).await?;
    Ok(Json(view))
}

/// Open a product's detail screen.
///
/// POST /view/product/{id}
#[instrument(skip(session))]
pub async fn product_detail(
    session: Session,
    Path(id): Path<ProductId>,
) -> Result<Json<ViewState>> {
    let mut view = load_view(&session).await?;
    view.go_to_product_detail(id);
    save_view(&session, &view).await?;
    Ok(Json(view))
}
