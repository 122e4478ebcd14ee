use crate::handlers::common::{map_service_error, success_response};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Creates the router for shipping and tax estimation. Public, like promo
/// validation: estimates are shown before checkout.
pub fn shipping_routes() -> Router<Arc<AppState>> {
    Router::new().route("/calculate", post(calculate_shipping))
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CalculateShippingRequest {
    pub zip_code: String,
    pub subtotal: Decimal,
}

/// Calculate shipping cost and sales tax for a ZIP code and subtotal
async fn calculate_shipping(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CalculateShippingRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    if payload.subtotal <= Decimal::ZERO {
        return Err(ApiError::ValidationError(
            "subtotal must be greater than zero".to_string(),
        ));
    }

    let breakdown = state
        .services
        .shipping
        .calculate(&payload.zip_code, payload.subtotal)
        .map_err(map_service_error)?;

    Ok(success_response(breakdown))
}
