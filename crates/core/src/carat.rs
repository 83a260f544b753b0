//! Carat normalization.
//!
//! Gold of different purities is aggregated by converting every scale weight
//! to the weight it would have at 750/1000 purity.

use rust_decimal::Decimal;
use tala_shared::types::Grams;

use crate::ledger::LedgerError;

/// Purity every reference weight is expressed in.
pub const REFERENCE_CARAT: i32 = 750;

/// Highest valid purity (pure gold).
pub const MAX_CARAT: i32 = 1000;

/// Converts a scale weight at `carat` purity to its 750-reference weight.
///
/// Returns zero when the carat is unset or zero; such items are not gold and
/// callers decide whether that is acceptable.
#[must_use]
pub fn to_reference_weight(weight: Grams, carat: Option<i32>) -> Grams {
    match carat {
        Some(c) if c != 0 => weight * Decimal::from(c) / Decimal::from(REFERENCE_CARAT),
        _ => Decimal::ZERO,
    }
}

/// Converts a 750-reference weight back to a scale weight at `carat` purity.
#[must_use]
pub fn from_reference_weight(reference: Grams, carat: Option<i32>) -> Grams {
    match carat {
        Some(c) if c != 0 => reference * Decimal::from(REFERENCE_CARAT) / Decimal::from(c),
        _ => Decimal::ZERO,
    }
}

/// Checks that a carat lies in `1..=1000`.
///
/// # Errors
///
/// Returns `LedgerError::InvalidCarat` otherwise.
pub fn validate_carat(carat: i32) -> Result<i32, LedgerError> {
    if (1..=MAX_CARAT).contains(&carat) {
        Ok(carat)
    } else {
        Err(LedgerError::InvalidCarat(carat))
    }
}
