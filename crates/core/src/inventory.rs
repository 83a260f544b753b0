//! Per-carat physical stock summaries and reconciliation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tala_shared::types::{Grams, Rials, round_rials};

use crate::trade::TransactionType;

/// Zero-stock tolerance in grams.
pub const DEFAULT_STOCK_TOLERANCE: Grams = Decimal::from_parts(1, 0, 0, false, 3);

/// Stock held in one carat bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaratBucket {
    /// Purity.
    pub carat: i32,
    /// Scale weight.
    pub total_weight_grams: Grams,
    /// Value.
    pub total_value_rials: Rials,
    /// Last time the bucket changed, when read from storage.
    pub last_updated: Option<DateTime<Utc>>,
}

/// One line of the carat stock summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaratSummaryLine {
    /// Purity.
    pub carat: i32,
    /// Scale weight.
    pub total_weight_grams: Grams,
    /// Value.
    pub total_value_rials: Rials,
    /// Value per gram.
    pub avg_buy_price: Rials,
}

/// Builds the summary, omitting buckets at or below `tolerance` grams.
///
/// Lines are ordered by carat.
#[must_use]
pub fn summarize_buckets(buckets: &[CaratBucket], tolerance: Grams) -> Vec<CaratSummaryLine> {
    let mut lines: Vec<CaratSummaryLine> = buckets
        .iter()
        .filter(|bucket| {
            bucket.total_weight_grams > tolerance && bucket.total_weight_grams > Decimal::ZERO
        })
        .map(|bucket| CaratSummaryLine {
            carat: bucket.carat,
            total_weight_grams: bucket.total_weight_grams,
            total_value_rials: bucket.total_value_rials,
            avg_buy_price: round_rials(bucket.total_value_rials / bucket.total_weight_grams),
        })
        .collect();
    lines.sort_by_key(|line| line.carat);
    lines
}

/// Sum of completed item weights and values for one `(carat, type)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaratItemTotal {
    /// Purity.
    pub carat: i32,
    /// Buy or sell.
    pub transaction_type: TransactionType,
    /// Σ scale weight.
    pub weight_grams: Grams,
    /// Σ base value.
    pub value_rials: Rials,
}

/// Recomputes buckets as `Σ buys − Σ sells` per carat.
#[must_use]
pub fn derive_buckets(totals: &[CaratItemTotal]) -> Vec<CaratBucket> {
    let mut by_carat: BTreeMap<i32, (Grams, Rials)> = BTreeMap::new();
    for total in totals {
        let sign = total.transaction_type.stock_sign();
        let entry = by_carat
            .entry(total.carat)
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        entry.0 += sign * total.weight_grams;
        entry.1 += sign * total.value_rials;
    }
    by_carat
        .into_iter()
        .map(|(carat, (weight, value))| CaratBucket {
            carat,
            total_weight_grams: weight,
            total_value_rials: value,
            last_updated: None,
        })
        .collect()
}

/// A carat whose stored bucket disagrees with the transaction-derived totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaratMismatch {
    /// Purity.
    pub carat: i32,
    /// Weight in the stored bucket.
    pub bucket_weight_grams: Grams,
    /// Weight derived from items.
    pub derived_weight_grams: Grams,
    /// Value in the stored bucket.
    pub bucket_value_rials: Rials,
    /// Value derived from items.
    pub derived_value_rials: Rials,
}

/// Compares stored buckets with derived ones.
///
/// A carat missing on one side counts as zero there. Weight differences up to
/// `tolerance` and value differences under one rial are ignored.
#[must_use]
pub fn find_mismatches(
    stored: &[CaratBucket],
    derived: &[CaratBucket],
    tolerance: Grams,
) -> Vec<CaratMismatch> {
    let mut pairs: BTreeMap<i32, (Option<&CaratBucket>, Option<&CaratBucket>)> = BTreeMap::new();
    for bucket in stored {
        pairs.entry(bucket.carat).or_default().0 = Some(bucket);
    }
    for bucket in derived {
        pairs.entry(bucket.carat).or_default().1 = Some(bucket);
    }

    pairs
        .into_iter()
        .filter_map(|(carat, (stored, derived))| {
            let weight_of = |b: Option<&CaratBucket>| b.map_or(Decimal::ZERO, |b| b.total_weight_grams);
            let value_of = |b: Option<&CaratBucket>| b.map_or(Decimal::ZERO, |b| b.total_value_rials);
            let mismatch = CaratMismatch {
                carat,
                bucket_weight_grams: weight_of(stored),
                derived_weight_grams: weight_of(derived),
                bucket_value_rials: value_of(stored),
                derived_value_rials: value_of(derived),
            };
            let weight_off =
                (mismatch.bucket_weight_grams - mismatch.derived_weight_grams).abs() > tolerance;
            let value_off =
                (mismatch.bucket_value_rials - mismatch.derived_value_rials).abs() >= Decimal::ONE;
            (weight_off || value_off).then_some(mismatch)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn bucket(carat: i32, weight: Decimal, value: Decimal) -> CaratBucket {
        CaratBucket {
            carat,
            total_weight_grams: weight,
            total_value_rials: value,
            last_updated: None,
        }
    }

    #[test]
    fn test_default_tolerance() {
        assert_eq!(DEFAULT_STOCK_TOLERANCE, dec!(0.001));
    }

    #[test]
    fn test_summary_average_price() {
        let lines = summarize_buckets(&[bucket(750, dec!(70), dec!(3500000))], DEFAULT_STOCK_TOLERANCE);
        assert_eq!(
            lines,
            vec![CaratSummaryLine {
                carat: 750,
                total_weight_grams: dec!(70),
                total_value_rials: dec!(3500000),
                avg_buy_price: dec!(50000),
            }]
        );
    }

    #[test]
    fn test_summary_omits_empty_and_negative() {
        let lines = summarize_buckets(
            &[
                bucket(900, dec!(0.001), dec!(10)),
                bucket(750, dec!(-2), dec!(-100)),
                bucket(585, dec!(0.002), dec!(100)),
                bucket(1000, dec!(0), dec!(0)),
            ],
            DEFAULT_STOCK_TOLERANCE,
        );
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].carat, 585);
    }

    #[test]
    fn test_derive_buckets() {
        let derived = derive_buckets(&[
            CaratItemTotal {
                carat: 750,
                transaction_type: TransactionType::Buy,
                weight_grams: dec!(100),
                value_rials: dec!(5000000),
            },
            CaratItemTotal {
                carat: 750,
                transaction_type: TransactionType::Sell,
                weight_grams: dec!(30),
                value_rials: dec!(1500000),
            },
            CaratItemTotal {
                carat: 900,
                transaction_type: TransactionType::Sell,
                weight_grams: dec!(1),
                value_rials: dec!(60000),
            },
        ]);
        assert_eq!(
            derived,
            vec![
                bucket(750, dec!(70), dec!(3500000)),
                bucket(900, dec!(-1), dec!(-60000)),
            ]
        );
    }

    #[test]
    fn test_find_mismatches() {
        let stored = vec![bucket(750, dec!(70), dec!(3500000)), bucket(900, dec!(5), dec!(100))];
        let derived = vec![bucket(750, dec!(70.0005), dec!(3500000.5)), bucket(585, dec!(2), dec!(10))];

        let mismatches = find_mismatches(&stored, &derived, DEFAULT_STOCK_TOLERANCE);
        let carats: Vec<i32> = mismatches.iter().map(|m| m.carat).collect();
        assert_eq!(carats, vec![585, 900]);
        assert_eq!(mismatches[1].derived_weight_grams, dec!(0));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// **Property: summary lines are all above the tolerance**
        #[test]
        fn prop_summary_above_tolerance(weights in prop::collection::vec(-5_000i64..5_000i64, 0..20)) {
            let buckets: Vec<CaratBucket> = weights
                .iter()
                .enumerate()
                .map(|(i, w)| bucket(i32::try_from(i).unwrap() + 1, Decimal::new(*w, 3), dec!(1000)))
                .collect();
            let lines = summarize_buckets(&buckets, DEFAULT_STOCK_TOLERANCE);
            let expected = weights.iter().filter(|w| **w > 1).count();
            prop_assert_eq!(lines.len(), expected);
            prop_assert!(lines.iter().all(|l| l.total_weight_grams > DEFAULT_STOCK_TOLERANCE));
        }
    }
}
