use crate::handlers::common::{
    created_response, map_service_error, no_content_response, success_response, validate_input,
};
use crate::{auth::AuthenticatedUser, errors::ApiError, services::cart_service::GuestCartItem, AppState};
use axum::{
    extract::{Json, Path, State},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for cart endpoints. All routes require a bearer token;
/// the cart is always the authenticated user's own.
pub fn cart_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_cart))
        .route("/items", post(add_item))
        .route("/items/:id", put(update_item))
        .route("/items/:id", delete(remove_item))
        .route("/items/:id/save", post(save_for_later))
        .route("/saved/:id/restore", post(restore_saved_item))
        .route("/saved/:id", delete(remove_saved_item))
        .route("/merge", post(merge_guest_cart))
        .route("/clear", post(clear_cart))
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct UpdateItemRequest {
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
}

/// Guest cart lines are not validated field-by-field: merge skips bad lines
/// instead of rejecting the request.
#[derive(Debug, Deserialize, Serialize)]
pub struct MergeRequest {
    pub items: Vec<GuestCartItem>,
}

/// Get the current user's cart
async fn get_cart(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let cart = state
        .services
        .cart
        .get_cart(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cart))
}

/// Add an item to the cart
async fn add_item(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(payload): Json<AddItemRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let cart = state
        .services
        .cart
        .add_item(user.user_id, payload.product_id, payload.quantity)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(cart))
}

/// Set a cart line to an absolute quantity
async fn update_item(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let cart = state
        .services
        .cart
        .update_item(user.user_id, item_id, payload.quantity)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cart))
}

/// Remove a cart line
async fn remove_item(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(item_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let cart = state
        .services
        .cart
        .remove_item(user.user_id, item_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cart))
}

/// Move a cart line to saved-for-later
async fn save_for_later(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(item_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let cart = state
        .services
        .cart
        .save_for_later(user.user_id, item_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cart))
}

/// Move a saved item back into the cart
async fn restore_saved_item(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(saved_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let cart = state
        .services
        .cart
        .restore_saved_item(user.user_id, saved_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cart))
}

/// Remove a saved item entirely
async fn remove_saved_item(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(saved_id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let cart = state
        .services
        .cart
        .remove_saved_item(user.user_id, saved_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cart))
}

/// Merge an anonymous cart into the user's cart
async fn merge_guest_cart(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Json(payload): Json<MergeRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let cart = state
        .services
        .cart
        .merge_guest_cart(user.user_id, payload.items)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(cart))
}

/// Empty the active cart (saved items are kept)
async fn clear_cart(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    state
        .services
        .cart
        .clear_cart(user.user_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}
