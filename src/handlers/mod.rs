pub mod cart;
pub mod common;
pub mod promo_codes;
pub mod shipping;

use crate::events::EventSender;
use crate::services::{CartService, PromoCodeService, ShippingTaxService};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// All service instances, shared through `AppState`.
#[derive(Clone)]
pub struct AppServices {
    pub cart: CartService,
    pub promo_codes: PromoCodeService,
    pub shipping: ShippingTaxService,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self {
            cart: CartService::new(db.clone(), event_sender),
            promo_codes: PromoCodeService::new(db),
            shipping: ShippingTaxService::new(),
        }
    }
}
