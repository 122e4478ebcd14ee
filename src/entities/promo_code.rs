use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Promotional discount code with validation rules
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "promo_codes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub discount_percentage: f64,
    pub is_active: bool,
    #[sea_orm(nullable)]
    pub usage_limit: Option<i32>,
    pub times_used: i32,
    #[sea_orm(nullable)]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Outcome of checking a promo code's rules, ordered by reason priority:
/// an inactive code reports inactive even if it is also expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromoCodeStatus {
    Valid,
    Inactive,
    Expired,
    UsageLimitReached,
}

impl Model {
    /// Evaluates the code's validity rules at `now`.
    ///
    /// Valid = active AND (no expiry OR now <= expires_at) AND
    /// (no usage limit OR times_used < usage_limit). When several rules fail,
    /// the most specific single reason wins: inactive, then expired, then
    /// usage limit.
    pub fn status_at(&self, now: DateTime<Utc>) -> PromoCodeStatus {
        if !self.is_active {
            return PromoCodeStatus::Inactive;
        }

        if let Some(expires_at) = self.expires_at {
            if now > expires_at {
                return PromoCodeStatus::Expired;
            }
        }

        if let Some(limit) = self.usage_limit {
            if self.times_used >= limit {
                return PromoCodeStatus::UsageLimitReached;
            }
        }

        PromoCodeStatus::Valid
    }
}
