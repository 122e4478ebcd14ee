//! Tax and shipping rate tables.
//!
//! Process-wide immutable lookup data: simplified average sales-tax rates per
//! state and the mapping from ZIP code prefixes (leading 3 digits) to states.
//! Everything in here is pure; the validated composition lives in
//! [`crate::services::shipping_service`].

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::errors::ServiceError;

/// Simplified average sales-tax rate per state.
const STATE_TAX_RATES: &[(&str, Decimal)] = &[
    ("AL", dec!(0.0400)),
    ("AK", dec!(0.0000)),
    ("AZ", dec!(0.0560)),
    ("AR", dec!(0.0650)),
    ("CA", dec!(0.0725)),
    ("CO", dec!(0.0290)),
    ("CT", dec!(0.0635)),
    ("DE", dec!(0.0000)),
    ("FL", dec!(0.0600)),
    ("GA", dec!(0.0400)),
    ("HI", dec!(0.0400)),
    ("ID", dec!(0.0600)),
    ("IL", dec!(0.0625)),
    ("IN", dec!(0.0700)),
    ("IA", dec!(0.0600)),
    ("KS", dec!(0.0650)),
    ("KY", dec!(0.0600)),
    ("LA", dec!(0.0445)),
    ("ME", dec!(0.0550)),
    ("MD", dec!(0.0600)),
    ("MA", dec!(0.0625)),
    ("MI", dec!(0.0600)),
    ("MN", dec!(0.0688)),
    ("MS", dec!(0.0700)),
    ("MO", dec!(0.0423)),
    ("MT", dec!(0.0000)),
    ("NE", dec!(0.0550)),
    ("NV", dec!(0.0685)),
    ("NH", dec!(0.0000)),
    ("NJ", dec!(0.0663)),
    ("NM", dec!(0.0513)),
    ("NY", dec!(0.0400)),
    ("NC", dec!(0.0475)),
    ("ND", dec!(0.0500)),
    ("OH", dec!(0.0575)),
    ("OK", dec!(0.0450)),
    ("OR", dec!(0.0000)),
    ("PA", dec!(0.0600)),
    ("RI", dec!(0.0700)),
    ("SC", dec!(0.0600)),
    ("SD", dec!(0.0450)),
    ("TN", dec!(0.0700)),
    ("TX", dec!(0.0625)),
    ("UT", dec!(0.0610)),
    ("VT", dec!(0.0600)),
    ("VA", dec!(0.0530)),
    ("WA", dec!(0.0650)),
    ("WV", dec!(0.0600)),
    ("WI", dec!(0.0500)),
    ("WY", dec!(0.0400)),
    ("DC", dec!(0.0600)),
];

/// Inclusive ZIP prefix ranges (leading 3 digits) per state. States may hold
/// multiple disjoint ranges (e.g. Texas, Georgia).
const ZIP_PREFIX_TO_STATE: &[(u32, u32, &str)] = &[
    (350, 369, "AL"),
    (995, 999, "AK"),
    (850, 865, "AZ"),
    (716, 729, "AR"),
    (900, 961, "CA"),
    (800, 816, "CO"),
    (60, 69, "CT"),
    (197, 199, "DE"),
    (320, 349, "FL"),
    (300, 319, "GA"),
    (398, 399, "GA"),
    (967, 968, "HI"),
    (832, 838, "ID"),
    (600, 629, "IL"),
    (460, 479, "IN"),
    (500, 528, "IA"),
    (660, 679, "KS"),
    (400, 427, "KY"),
    (700, 714, "LA"),
    (39, 49, "ME"),
    (206, 219, "MD"),
    (10, 27, "MA"),
    (480, 499, "MI"),
    (550, 567, "MN"),
    (386, 397, "MS"),
    (630, 658, "MO"),
    (590, 599, "MT"),
    (680, 693, "NE"),
    (889, 898, "NV"),
    (30, 38, "NH"),
    (70, 89, "NJ"),
    (870, 884, "NM"),
    (100, 149, "NY"),
    (270, 289, "NC"),
    (580, 588, "ND"),
    (430, 459, "OH"),
    (730, 749, "OK"),
    (970, 979, "OR"),
    (150, 196, "PA"),
    (28, 29, "RI"),
    (290, 299, "SC"),
    (570, 577, "SD"),
    (370, 385, "TN"),
    (750, 799, "TX"),
    (885, 885, "TX"),
    (840, 847, "UT"),
    (50, 59, "VT"),
    (220, 246, "VA"),
    (980, 994, "WA"),
    (247, 268, "WV"),
    (530, 549, "WI"),
    (820, 831, "WY"),
    (200, 205, "DC"),
];

/// Free shipping threshold and tier prices.
const FREE_SHIPPING_THRESHOLD: Decimal = dec!(50.00);
const REDUCED_SHIPPING_THRESHOLD: Decimal = dec!(25.00);
const REDUCED_SHIPPING_COST: Decimal = dec!(5.99);
const STANDARD_SHIPPING_COST: Decimal = dec!(9.99);

/// Resolves the state for a ZIP code.
///
/// Non-digit characters are stripped (so "02134-1234" works). Fewer than 5
/// remaining digits is an [`ServiceError::InvalidZip`]. A prefix outside
/// every known range yields `Ok(None)` — unknown is an assignable value at
/// this tier, not an error.
pub fn state_for_zip(zip: &str) -> Result<Option<&'static str>, ServiceError> {
    let digits: String = zip.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() < 5 {
        return Err(ServiceError::InvalidZip(
            "ZIP code must be at least 5 digits".to_string(),
        ));
    }

    // Leading 3 digits always parse; the filter above guarantees ASCII digits.
    let prefix: u32 = digits[..3].parse().map_err(|_| {
        ServiceError::InvalidZip("ZIP code must be at least 5 digits".to_string())
    })?;

    Ok(ZIP_PREFIX_TO_STATE
        .iter()
        .find(|(min, max, _)| (*min..=*max).contains(&prefix))
        .map(|(_, _, state)| *state))
}

/// Looks up the tax rate for a state code, case-insensitively.
/// Unknown or unmapped states fall back to a zero rate.
pub fn tax_rate_for_state(state: &str) -> Decimal {
    let state = state.to_ascii_uppercase();
    STATE_TAX_RATES
        .iter()
        .find(|(code, _)| *code == state)
        .map(|(_, rate)| *rate)
        .unwrap_or(Decimal::ZERO)
}

/// Tiered shipping cost: free at $50+, $5.99 from $25, $9.99 below.
/// Tier boundaries are inclusive on the lower bound.
pub fn shipping_cost(subtotal: Decimal) -> Decimal {
    if subtotal >= FREE_SHIPPING_THRESHOLD {
        Decimal::ZERO
    } else if subtotal >= REDUCED_SHIPPING_THRESHOLD {
        REDUCED_SHIPPING_COST
    } else {
        STANDARD_SHIPPING_COST
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_state_for_known_zips() {
        assert_eq!(state_for_zip("02134").unwrap(), Some("MA"));
        assert_eq!(state_for_zip("90210").unwrap(), Some("CA"));
        assert_eq!(state_for_zip("10001").unwrap(), Some("NY"));
        assert_eq!(state_for_zip("20001").unwrap(), Some("DC"));
    }

    #[test]
    fn strips_non_digit_characters() {
        assert_eq!(state_for_zip("02134-1234").unwrap(), Some("MA"));
        assert_eq!(state_for_zip(" 90210 ").unwrap(), Some("CA"));
    }

    #[test]
    fn short_zip_is_rejected() {
        assert!(matches!(
            state_for_zip("1234"),
            Err(ServiceError::InvalidZip(_))
        ));
        assert!(matches!(state_for_zip(""), Err(ServiceError::InvalidZip(_))));
        // Dashes don't count toward the digit minimum
        assert!(matches!(
            state_for_zip("12-34"),
            Err(ServiceError::InvalidZip(_))
        ));
    }

    #[test]
    fn unmapped_prefix_is_unknown_not_error() {
        assert_eq!(state_for_zip("00000").unwrap(), None);
    }

    #[test]
    fn texas_has_two_disjoint_ranges() {
        assert_eq!(state_for_zip("75001").unwrap(), Some("TX"));
        assert_eq!(state_for_zip("88501").unwrap(), Some("TX"));
        // The gap between the ranges belongs to other states
        assert_eq!(state_for_zip("87501").unwrap(), Some("NM"));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        assert_eq!(state_for_zip("01000").unwrap(), Some("MA"));
        assert_eq!(state_for_zip("02700").unwrap(), Some("MA"));
        assert_eq!(state_for_zip("02800").unwrap(), Some("RI"));
    }

    #[test]
    fn tax_rate_lookup_is_case_insensitive() {
        assert_eq!(tax_rate_for_state("CA"), dec!(0.0725));
        assert_eq!(tax_rate_for_state("ca"), dec!(0.0725));
        assert_eq!(tax_rate_for_state("Ma"), dec!(0.0625));
    }

    #[test]
    fn unknown_state_defaults_to_zero_rate() {
        assert_eq!(tax_rate_for_state("ZZ"), Decimal::ZERO);
        assert_eq!(tax_rate_for_state(""), Decimal::ZERO);
    }

    #[test]
    fn no_sales_tax_states_are_zero() {
        for state in ["AK", "DE", "MT", "NH", "OR"] {
            assert_eq!(tax_rate_for_state(state), Decimal::ZERO);
        }
    }

    #[test]
    fn shipping_tier_boundaries() {
        assert_eq!(shipping_cost(dec!(24.99)), dec!(9.99));
        assert_eq!(shipping_cost(dec!(25.00)), dec!(5.99));
        assert_eq!(shipping_cost(dec!(49.99)), dec!(5.99));
        assert_eq!(shipping_cost(dec!(50.00)), Decimal::ZERO);
        assert_eq!(shipping_cost(dec!(120.00)), Decimal::ZERO);
    }
}
