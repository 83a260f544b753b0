//! Rial amounts and gram weights with decimal precision.
//!
//! CRITICAL: Never use floating-point for money or gold weight calculations.
//! Both are plain `rust_decimal::Decimal` values; the aliases document intent
//! at signatures and the helpers fix one rounding policy for the whole system.

use rust_decimal::{Decimal, RoundingStrategy};

/// An amount of Iranian rials.
pub type Rials = Decimal;

/// A weight in grams (scale weight or 750-reference weight).
pub type Grams = Decimal;

/// Decimal places kept on rial balances exposed to callers.
pub const RIAL_DECIMAL_PLACES: u32 = 2;

/// Decimal places used when presenting gram weights.
pub const GRAM_DECIMAL_PLACES: u32 = 3;

/// Rounds a rial balance to two decimal places, half away from zero.
///
/// Every rial calculator (current and as-of-date) goes through this helper so
/// both variants always agree on the last digit.
#[must_use]
pub fn round_rials(amount: Rials) -> Rials {
    amount.round_dp_with_strategy(RIAL_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a weight to milligram precision for presentation.
#[must_use]
pub fn round_grams(weight: Grams) -> Grams {
    weight.round_dp_with_strategy(GRAM_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(10.005), dec!(10.01))]
    #[case(dec!(-10.005), dec!(-10.01))]
    #[case(dec!(10.004), dec!(10.00))]
    #[case(dec!(6000000), dec!(6000000))]
    #[case(dec!(0), dec!(0))]
    fn test_round_rials(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_rials(input), expected);
    }

    #[test]
    fn test_round_rials_is_idempotent() {
        let once = round_rials(dec!(1234.5678));
        assert_eq!(round_rials(once), once);
    }

    #[rstest]
    #[case(dec!(12.00049), dec!(12.000))]
    #[case(dec!(12.0005), dec!(12.001))]
    #[case(dec!(-0.0005), dec!(-0.001))]
    fn test_round_grams(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_grams(input), expected);
    }
}
