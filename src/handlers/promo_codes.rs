use crate::handlers::common::{map_service_error, success_response, validate_input};
use crate::{errors::ApiError, AppState};
use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Creates the router for promo code endpoints. Validation is public: the
/// storefront checks codes before the shopper signs in.
pub fn promo_code_routes() -> Router<Arc<AppState>> {
    Router::new().route("/validate", post(validate_promo_code))
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct ValidatePromoCodeRequest {
    #[validate(length(min = 1, message = "code must not be empty"))]
    pub code: String,
}

/// Validate a promo code
///
/// Always responds 200; invalid codes are reported through the `is_valid`
/// flag and a human-readable reason.
async fn validate_promo_code(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ValidatePromoCodeRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    validate_input(&payload)?;

    let validation = state
        .services
        .promo_codes
        .validate(&payload.code)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(validation))
}
