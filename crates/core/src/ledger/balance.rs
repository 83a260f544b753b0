//! Running balance calculations for append-only ledgers.
//!
//! Both ledgers store, on every row, the change it carries and the balance of
//! its key after that change. The types here compute and check that chain.

use std::ops::{Add, Neg, Sub};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tala_shared::types::{Grams, Rials};

/// Physical stock of one product: units, scale grams and book value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    /// Unit count.
    pub quantity: i32,
    /// Scale weight in grams.
    pub weight_grams: Grams,
    /// Book value in rials.
    pub value_rials: Rials,
}

impl StockLevel {
    /// Creates a stock level.
    #[must_use]
    pub const fn new(quantity: i32, weight_grams: Grams, value_rials: Rials) -> Self {
        Self {
            quantity,
            weight_grams,
            value_rials,
        }
    }

    /// Zero stock, the balance of a product with no history.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0, Decimal::ZERO, Decimal::ZERO)
    }
}

impl Add for StockLevel {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            quantity: self.quantity + rhs.quantity,
            weight_grams: self.weight_grams + rhs.weight_grams,
            value_rials: self.value_rials + rhs.value_rials,
        }
    }
}

impl Sub for StockLevel {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl Neg for StockLevel {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            quantity: -self.quantity,
            weight_grams: -self.weight_grams,
            value_rials: -self.value_rials,
        }
    }
}

/// Running balance information for a ledger row.
///
/// - entry_version: per-key append counter, unique per key
/// - previous_balance: balance of the preceding row
/// - current_balance: balance after this row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningBalance<B> {
    /// Per-key append counter (monotonically increasing).
    pub entry_version: i64,
    /// Balance before this row.
    pub previous_balance: B,
    /// Balance after this row.
    pub current_balance: B,
}

impl<B> RunningBalance<B>
where
    B: Copy + Default + Add<Output = B>,
{
    /// Creates a running balance for a row appended as version `last_version + 1`
    /// whose chronological predecessor has balance `preceding`.
    ///
    /// For a back-dated row the predecessor is not the latest row, so the
    /// version and the balance come from different rows.
    #[must_use]
    pub fn append(last_version: i64, preceding: B, change: B) -> Self {
        Self {
            entry_version: last_version + 1,
            previous_balance: preceding,
            current_balance: preceding + change,
        }
    }
}

/// One ledger row reduced to what the running-balance invariant needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLink<B> {
    /// Row id.
    pub entry_id: i32,
    /// Change carried by the row.
    pub change: B,
    /// Balance recorded on the row.
    pub balance_after: B,
}

/// A row whose recorded balance differs from its predecessor plus its change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainViolation<B> {
    /// Row id.
    pub entry_id: i32,
    /// Predecessor balance plus this row's change.
    pub expected: B,
    /// Balance stored on the row.
    pub recorded: B,
}

/// Checks `row[i].balance == row[i-1].balance + row[i].change` over rows
/// already ordered by `(date, id)`; the first row is checked against zero.
///
/// Each row is compared with its predecessor's recorded balance, so one
/// corrupt row is reported once rather than poisoning every later row.
#[must_use]
pub fn find_chain_violations<B>(links: &[ChainLink<B>]) -> Vec<ChainViolation<B>>
where
    B: Copy + Default + PartialEq + Add<Output = B>,
{
    let mut previous = B::default();
    let mut violations = Vec::new();

    for link in links {
        let expected = previous + link.change;
        if expected != link.balance_after {
            violations.push(ChainViolation {
                entry_id: link.entry_id,
                expected,
                recorded: link.balance_after,
            });
        }
        previous = link.balance_after;
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    // ========================================================================
    // Running Balance Consistency
    // ========================================================================

    fn change_strategy() -> impl Strategy<Value = Decimal> {
        (-100_000i64..100_000i64).prop_map(|n| Decimal::new(n, 3))
    }

    fn changes_strategy(max_len: usize) -> impl Strategy<Value = Vec<Decimal>> {
        prop::collection::vec(change_strategy(), 1..=max_len)
    }

    fn build_chain(changes: &[Decimal]) -> Vec<RunningBalance<Decimal>> {
        let mut chain: Vec<RunningBalance<Decimal>> = Vec::with_capacity(changes.len());
        for change in changes {
            let (version, balance) = chain
                .last()
                .map_or((0, Decimal::ZERO), |rb| (rb.entry_version, rb.current_balance));
            chain.push(RunningBalance::append(version, balance, *change));
        }
        chain
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// **Property 1: Each balance is the previous balance plus the change**
        #[test]
        fn prop_previous_plus_change(changes in changes_strategy(20)) {
            let chain = build_chain(&changes);
            let mut previous = Decimal::ZERO;
            for (rb, change) in chain.iter().zip(&changes) {
                prop_assert_eq!(rb.previous_balance, previous);
                prop_assert_eq!(rb.current_balance, previous + change);
                previous = rb.current_balance;
            }
        }

        /// **Property 2: Final balance equals the sum of all changes**
        #[test]
        fn prop_final_balance_equals_sum(changes in changes_strategy(20)) {
            let chain = build_chain(&changes);
            let expected: Decimal = changes.iter().copied().sum();
            prop_assert_eq!(chain[chain.len() - 1].current_balance, expected);
        }

        /// **Property 3: Versions form the sequence 1..=N**
        #[test]
        fn prop_versions_contiguous(changes in changes_strategy(20)) {
            let versions: Vec<i64> = build_chain(&changes).iter().map(|rb| rb.entry_version).collect();
            let expected: Vec<i64> = (1..=i64::try_from(changes.len()).unwrap()).collect();
            prop_assert_eq!(versions, expected);
        }

        /// **Property 4: A chain built by in-order appends never has violations**
        #[test]
        fn prop_built_chain_verifies(changes in changes_strategy(20)) {
            let links: Vec<ChainLink<Decimal>> = build_chain(&changes)
                .iter()
                .zip(&changes)
                .enumerate()
                .map(|(i, (rb, change))| ChainLink {
                    entry_id: i32::try_from(i).unwrap() + 1,
                    change: *change,
                    balance_after: rb.current_balance,
                })
                .collect();
            prop_assert!(find_chain_violations(&links).is_empty());
        }
    }

    // ========================================================================
    // Unit tests for specific examples
    // ========================================================================

    #[test]
    fn test_running_balance_chain() {
        let rb1 = RunningBalance::append(0, Decimal::ZERO, dec!(12));
        assert_eq!(rb1.entry_version, 1);
        assert_eq!(rb1.current_balance, dec!(12));

        let rb2 = RunningBalance::append(rb1.entry_version, rb1.current_balance, dec!(-5));
        assert_eq!(rb2.entry_version, 2);
        assert_eq!(rb2.previous_balance, dec!(12));
        assert_eq!(rb2.current_balance, dec!(7));
    }

    #[test]
    fn test_append_back_dated() {
        // Latest row is version 5 but the row being inserted sits after a
        // row whose balance is 40.
        let rb = RunningBalance::append(5, dec!(40), dec!(2.5));
        assert_eq!(rb.entry_version, 6);
        assert_eq!(rb.previous_balance, dec!(40));
        assert_eq!(rb.current_balance, dec!(42.5));
    }

    #[test]
    fn test_stock_level_arithmetic() {
        let a = StockLevel::new(2, dec!(10.5), dec!(1000));
        let b = StockLevel::new(1, dec!(0.5), dec!(50));
        assert_eq!(a + b, StockLevel::new(3, dec!(11), dec!(1050)));
        assert_eq!(a - b, StockLevel::new(1, dec!(10), dec!(950)));
        assert_eq!(-b, StockLevel::new(-1, dec!(-0.5), dec!(-50)));
        assert_eq!(StockLevel::default(), StockLevel::zero());
    }

    #[test]
    fn test_stock_level_running_balance() {
        let rb1 = RunningBalance::append(0, StockLevel::zero(), StockLevel::new(0, dec!(100), dec!(5000000)));
        let rb2 = RunningBalance::append(
            rb1.entry_version,
            rb1.current_balance,
            StockLevel::new(0, dec!(-30), dec!(-1500000)),
        );
        assert_eq!(rb2.current_balance, StockLevel::new(0, dec!(70), dec!(3500000)));
    }

    #[test]
    fn test_find_chain_violations() {
        let links = vec![
            ChainLink { entry_id: 1, change: dec!(10), balance_after: dec!(10) },
            ChainLink { entry_id: 2, change: dec!(5), balance_after: dec!(16) },
            ChainLink { entry_id: 3, change: dec!(-6), balance_after: dec!(10) },
        ];
        let violations = find_chain_violations(&links);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].entry_id, 2);
        assert_eq!(violations[0].expected, dec!(15));
        assert_eq!(violations[0].recorded, dec!(16));
    }

    #[test]
    fn test_find_chain_violations_first_row() {
        let links = vec![ChainLink { entry_id: 7, change: dec!(3), balance_after: dec!(4) }];
        let violations = find_chain_violations(&links);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].expected, dec!(3));
    }
}
