use crate::{
    entities::{promo_code, PromoCode, PromoCodeStatus},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

/// Read-only promo code validation.
///
/// Validation never consumes a use; `times_used` is incremented by the
/// checkout flow when an order is actually placed.
#[derive(Clone)]
pub struct PromoCodeService {
    db: Arc<DatabaseConnection>,
}

/// Result of validating a promo code. Always returned with HTTP 200; the
/// `is_valid` flag and message carry the outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoCodeValidation {
    pub code: String,
    pub discount_percentage: f64,
    pub is_valid: bool,
    pub message: String,
}

impl PromoCodeService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Validates a promo code, matching case-insensitively.
    ///
    /// An unknown code is not an error: the response simply reports it as
    /// invalid. When several rules fail at once, one reason is reported, in
    /// priority order: inactive, then expired, then usage limit.
    #[instrument(skip(self))]
    pub async fn validate(&self, raw_code: &str) -> Result<PromoCodeValidation, ServiceError> {
        let normalized = raw_code.trim().to_uppercase();

        // UPPER() on both sides keeps the match case-insensitive on SQLite
        // and Postgres alike.
        let found = PromoCode::find()
            .filter(
                Expr::expr(Func::upper(Expr::col(promo_code::Column::Code)))
                    .eq(normalized.clone()),
            )
            .one(&*self.db)
            .await?;

        let Some(code) = found else {
            return Ok(PromoCodeValidation {
                code: normalized,
                discount_percentage: 0.0,
                is_valid: false,
                message: "Invalid promo code".to_string(),
            });
        };

        // Known-but-invalid codes still report their discount; only the
        // not-found branch above zeroes it.
        let (is_valid, message) = match code.status_at(Utc::now()) {
            PromoCodeStatus::Valid => (
                true,
                format!("Promo code applied! You save {}%", code.discount_percentage),
            ),
            PromoCodeStatus::Inactive => {
                (false, "This promo code is no longer active".to_string())
            }
            PromoCodeStatus::Expired => (false, "This promo code has expired".to_string()),
            PromoCodeStatus::UsageLimitReached => (
                false,
                "This promo code has reached its usage limit".to_string(),
            ),
        };

        Ok(PromoCodeValidation {
            code: code.code,
            discount_percentage: code.discount_percentage,
            is_valid,
            message,
        })
    }
}
