//! HTTP surface: cart command endpoints plus the pass-through cache proxy

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::debug;
use vitrine_cart::{CartCommand, CartView, apply};
use vitrine_core::CoreError;

use crate::error::ApiError;
use crate::state::AppState;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/catalog", get(get_catalog))
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items/{id}", post(add_item).delete(remove_item))
        .route("/cart/items/{id}/increase", post(increase_item))
        .route("/cart/items/{id}/decrease", post(decrease_item))
        .fallback(intercept)
        .with_state(state)
}

// ==================== Catalog & Cart ====================

/// GET /catalog
async fn get_catalog(State(state): State<AppState>) -> Result<Response, ApiError> {
    let catalog = state.catalog().await?;
    Ok(Json(catalog.products().to_vec()).into_response())
}

/// GET /cart
async fn get_cart(State(state): State<AppState>) -> Result<Json<CartView>, ApiError> {
    let cart = state.cart.read().await;
    Ok(Json(CartView::project(&cart)))
}

/// Apply one cart command, persist the snapshot, return the new view
async fn dispatch(state: &AppState, command: CartCommand) -> Result<Json<CartView>, ApiError> {
    debug!("Dispatching {:?}", command);

    let catalog = state.catalog().await?;
    let mut cart = state.cart.write().await;
    let next = apply(&catalog, cart.clone(), command)?;
    state.snapshots.save(&next).await?;
    *cart = next;
    Ok(Json(CartView::project(&cart)))
}

/// POST /cart/items/{id}
async fn add_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CartView>, ApiError> {
    dispatch(&state, CartCommand::AddItem { id }).await
}

/// POST /cart/items/{id}/increase
async fn increase_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CartView>, ApiError> {
    dispatch(&state, CartCommand::IncreaseAmount { id }).await
}

/// POST /cart/items/{id}/decrease
async fn decrease_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CartView>, ApiError> {
    dispatch(&state, CartCommand::DecreaseAmount { id }).await
}

/// DELETE /cart/items/{id}
async fn remove_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CartView>, ApiError> {
    dispatch(&state, CartCommand::RemoveItem { id }).await
}

/// DELETE /cart
async fn clear_cart(State(state): State<AppState>) -> Result<Json<CartView>, ApiError> {
    dispatch(&state, CartCommand::Clear).await
}

// ==================== Pass-through proxy ====================

/// Fallback: every other GET goes through the interception policy
async fn intercept(State(state): State<AppState>, uri: Uri) -> Result<Response, ApiError> {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    debug!("Intercepting {}", path);

    let response = state.coordinator.handle_fetch(path).await?;
    let (status, content_type, body) = response.buffer().await.map_err(CoreError::Fetch)?;

    let status = StatusCode::from_u16(status)
        .map_err(|e| ApiError::Internal(format!("invalid upstream status: {}", e)))?;

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
