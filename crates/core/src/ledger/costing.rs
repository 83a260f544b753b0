//! Weighted-average costing of stock movements without a stated value.
//!
//! Weighed stock is costed per gram. Stock without weight (coins, jewelry
//! tracked by count) falls back to cost per unit.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tala_shared::types::{Grams, Rials, round_rials};

use super::balance::StockLevel;

/// Value side of one inventory movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementValue {
    /// Rials per gram (or per unit for count-only stock) used for the movement.
    pub price_per_unit: Rials,
    /// Value added to stock.
    pub value_in: Rials,
    /// Value removed from stock.
    pub value_out: Rials,
}

impl MovementValue {
    /// Net change of the running stock value.
    #[must_use]
    pub fn net(&self) -> Rials {
        self.value_in - self.value_out
    }
}

/// Current weighted-average cost per gram, zero when there is no stock.
#[must_use]
pub fn average_cost_per_gram(level: &StockLevel) -> Rials {
    if level.weight_grams > Decimal::ZERO {
        level.value_rials / level.weight_grams
    } else {
        Decimal::ZERO
    }
}

/// Current weighted-average cost per unit, zero when there is no stock.
#[must_use]
pub fn average_cost_per_unit(level: &StockLevel) -> Rials {
    if level.quantity > 0 {
        level.value_rials / Decimal::from(level.quantity)
    } else {
        Decimal::ZERO
    }
}

/// Values an inflow at its stated total.
#[must_use]
pub fn value_inflow(change_weight: Grams, change_quantity: i32, total_value: Rials) -> MovementValue {
    let price_per_unit = if change_weight > Decimal::ZERO {
        round_rials(total_value / change_weight)
    } else if change_quantity > 0 {
        round_rials(total_value / Decimal::from(change_quantity))
    } else {
        Decimal::ZERO
    };
    MovementValue {
        price_per_unit,
        value_in: total_value,
        value_out: Decimal::ZERO,
    }
}

/// Values a movement at the current weighted-average cost.
///
/// The direction follows the sign of the change: weight when the movement
/// carries weight, quantity otherwise.
#[must_use]
pub fn value_at_average(level: &StockLevel, change_weight: Grams, change_quantity: i32) -> MovementValue {
    let (average, amount, inflow) = if change_weight == Decimal::ZERO {
        (
            average_cost_per_unit(level),
            Decimal::from(change_quantity.unsigned_abs()),
            change_quantity > 0,
        )
    } else {
        (
            average_cost_per_gram(level),
            change_weight.abs(),
            change_weight > Decimal::ZERO,
        )
    };

    let value = round_rials(amount * average);
    MovementValue {
        price_per_unit: round_rials(average),
        value_in: if inflow { value } else { Decimal::ZERO },
        value_out: if inflow { Decimal::ZERO } else { value },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_average_cost_per_gram() {
        let level = StockLevel::new(0, dec!(100), dec!(5000000));
        assert_eq!(average_cost_per_gram(&level), dec!(50000));
    }

    #[test]
    fn test_average_cost_without_stock_is_zero() {
        assert_eq!(average_cost_per_gram(&StockLevel::zero()), dec!(0));
        assert_eq!(average_cost_per_unit(&StockLevel::zero()), dec!(0));
        let negative = StockLevel::new(-1, dec!(-2), dec!(-100));
        assert_eq!(average_cost_per_gram(&negative), dec!(0));
        assert_eq!(average_cost_per_unit(&negative), dec!(0));
    }

    #[test]
    fn test_outflow_at_average() {
        let level = StockLevel::new(0, dec!(100), dec!(5000000));
        let value = value_at_average(&level, dec!(-30), 0);
        assert_eq!(value.price_per_unit, dec!(50000));
        assert_eq!(value.value_out, dec!(1500000));
        assert_eq!(value.net(), dec!(-1500000));
    }

    #[test]
    fn test_count_only_outflow_uses_unit_cost() {
        let level = StockLevel::new(4, dec!(0), dec!(1600000));
        let value = value_at_average(&level, dec!(0), -3);
        assert_eq!(value.price_per_unit, dec!(400000));
        assert_eq!(value.value_out, dec!(1200000));
    }

    #[test]
    fn test_inflow_at_stated_value() {
        let value = value_inflow(dec!(10), 0, dec!(520000));
        assert_eq!(value.price_per_unit, dec!(52000));
        assert_eq!(value.value_in, dec!(520000));
        assert_eq!(value.net(), dec!(520000));

        let coins = value_inflow(dec!(0), 2, dec!(800000));
        assert_eq!(coins.price_per_unit, dec!(400000));
    }

    #[test]
    fn test_inflow_at_average() {
        let level = StockLevel::new(0, dec!(3), dec!(100));
        let value = value_at_average(&level, dec!(1.5), 0);
        assert_eq!(value.value_in, dec!(50));
        assert_eq!(value.value_out, dec!(0));
        assert_eq!(value.price_per_unit, dec!(33.33));
    }
}
