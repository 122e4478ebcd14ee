use crate::errors::ServiceError;
use crate::rates;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Stateless shipping and sales tax calculator. Rate tables live in
/// [`crate::rates`]; this service only resolves a ZIP to a state and
/// assembles the order breakdown.
#[derive(Clone, Default)]
pub struct ShippingTaxService;

/// Shipping and tax breakdown for a ZIP code and order subtotal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingTaxBreakdown {
    pub zip_code: String,
    pub state: String,
    pub tax_rate: Decimal,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_cost: Decimal,
    pub shipping_amount: Decimal,
    pub total: Decimal,
}

impl ShippingTaxService {
    pub fn new() -> Self {
        Self
    }

    /// Computes the full breakdown for an order shipped to `zip`.
    ///
    /// A ZIP that parses but maps to no known state is rejected here with
    /// `InvalidZip`; the raw prefix lookup in [`rates::state_for_zip`]
    /// reports that case as `None` so other callers can fall back.
    #[instrument(skip(self))]
    pub fn calculate(
        &self,
        zip: &str,
        subtotal: Decimal,
    ) -> Result<ShippingTaxBreakdown, ServiceError> {
        let state = rates::state_for_zip(zip)?.ok_or_else(|| {
            ServiceError::InvalidZip(format!("Unable to determine state for ZIP code {}", zip))
        })?;

        let tax_rate = rates::tax_rate_for_state(state);
        // Full precision throughout; display rounding is the client's call.
        let tax_amount = (subtotal * tax_rate).normalize();
        let shipping_cost = rates::shipping_cost(subtotal);
        // The applied amount mirrors the tier cost today; they diverge once
        // promotions can discount shipping.
        let shipping_amount = shipping_cost;
        let total = (subtotal + tax_amount + shipping_amount).normalize();

        Ok(ShippingTaxBreakdown {
            zip_code: zip.to_string(),
            state: state.to_string(),
            tax_rate,
            subtotal,
            tax_amount,
            shipping_cost,
            shipping_amount,
            total,
        })
    }
}
