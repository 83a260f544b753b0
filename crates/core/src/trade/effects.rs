//! Ledger effects of trades and settlements.
//!
//! A completed transaction fans out into three kinds of writes per item:
//! an inventory movement, a contact weight entry (weight-bearing items with a
//! counterparty only) and a carat bucket delta. The plan is computed here and
//! executed by the persistence layer inside one database transaction.

use serde::{Deserialize, Serialize};
use tala_shared::types::{CategoryId, ContactId, Grams, ProductId, Rials};

use super::types::{PreparedItem, PreparedSettlementItem, SettlementDirection, TransactionType};
use crate::ledger::{MovementType, WeightEventType};

/// How an inventory movement is valued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementValuation {
    /// Inflow at a stated total value.
    Stated(Rials),
    /// Valued at the product's weighted-average cost when written.
    AverageCost,
}

/// One inventory movement to append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryDelta {
    /// Product whose stock moves.
    pub product_id: ProductId,
    /// Row kind.
    pub movement_type: MovementType,
    /// Signed unit change.
    pub change_quantity: i32,
    /// Signed scale-weight change.
    pub change_weight_grams: Grams,
    /// Purity of the moved gold.
    pub carat: Option<i32>,
    /// Valuation rule.
    pub valuation: MovementValuation,
}

/// One contact weight entry to append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactWeightDelta {
    /// Contact whose gold account moves.
    pub contact_id: ContactId,
    /// Product category the gold is tracked under.
    pub category_id: CategoryId,
    /// Row kind.
    pub event_type: WeightEventType,
    /// Signed 750-reference change.
    pub change_weight_grams: Grams,
}

/// One additive carat bucket change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaratDelta {
    /// Bucket key.
    pub carat: i32,
    /// Signed scale-weight change.
    pub weight_delta: Grams,
    /// Signed value change.
    pub value_delta: Rials,
}

impl CaratDelta {
    /// The delta that undoes this one.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            carat: self.carat,
            weight_delta: -self.weight_delta,
            value_delta: -self.value_delta,
        }
    }
}

/// Every write one item or settlement line produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEffect {
    /// Zero-based position in the input.
    pub line: usize,
    /// Inventory movement.
    pub inventory: InventoryDelta,
    /// Contact weight entry, if any.
    pub contact_weight: Option<ContactWeightDelta>,
    /// Carat bucket delta when the value is known up front.
    ///
    /// Settlement lines carry `None` here; their bucket value is the average
    /// cost computed while the inventory movement is written.
    pub carat: Option<CaratDelta>,
}

/// Plans the writes of a completed transaction.
///
/// Buys add stock at the item's base value, sells remove stock at average
/// cost. Carat buckets move by the item's scale weight and base value so the
/// bucket totals agree with sums over completed items.
#[must_use]
pub fn plan_transaction_effects(
    transaction_type: TransactionType,
    counterparty: Option<ContactId>,
    items: &[PreparedItem],
) -> Vec<LineEffect> {
    let sign = transaction_type.stock_sign();
    let (movement_type, event_type) = match transaction_type {
        TransactionType::Buy => (MovementType::Buy, WeightEventType::Buy),
        TransactionType::Sell => (MovementType::Sell, WeightEventType::Sell),
    };

    items
        .iter()
        .map(|item| {
            let quantity = item.quantity();
            let change_quantity = match transaction_type {
                TransactionType::Buy => quantity,
                TransactionType::Sell => -quantity,
            };
            let valuation = match transaction_type {
                TransactionType::Buy => MovementValuation::Stated(item.total_value_rials),
                TransactionType::Sell => MovementValuation::AverageCost,
            };

            let contact_weight = counterparty
                .filter(|_| item.base_category.is_weight_bearing())
                .map(|contact_id| ContactWeightDelta {
                    contact_id,
                    category_id: item.category_id,
                    event_type,
                    change_weight_grams: sign * item.reference_weight,
                });

            let carat = match (item.input.carat, item.input.weight_grams) {
                (Some(carat), Some(weight)) => Some(CaratDelta {
                    carat,
                    weight_delta: sign * weight,
                    value_delta: sign * item.total_value_rials,
                }),
                _ => None,
            };

            LineEffect {
                line: item.line,
                inventory: InventoryDelta {
                    product_id: item.input.product_id,
                    movement_type,
                    change_quantity,
                    change_weight_grams: sign * item.weight(),
                    carat: item.input.carat,
                    valuation,
                },
                contact_weight,
                carat,
            }
        })
        .collect()
}

/// Plans the writes of a physical settlement.
#[must_use]
pub fn plan_settlement_effects(
    direction: SettlementDirection,
    contact_id: ContactId,
    items: &[PreparedSettlementItem],
) -> Vec<LineEffect> {
    let sign = direction.stock_sign();
    let (movement_type, event_type) = match direction {
        SettlementDirection::Inflow => {
            (MovementType::SettlementInflow, WeightEventType::SettlementInflow)
        }
        SettlementDirection::Outflow => {
            (MovementType::SettlementOutflow, WeightEventType::SettlementOutflow)
        }
    };

    items
        .iter()
        .map(|item| LineEffect {
            line: item.line,
            inventory: InventoryDelta {
                product_id: item.input.product_id,
                movement_type,
                change_quantity: 0,
                change_weight_grams: sign * item.input.weight_scale,
                carat: Some(item.input.carat),
                valuation: MovementValuation::AverageCost,
            },
            contact_weight: Some(ContactWeightDelta {
                contact_id,
                category_id: item.category_id,
                event_type,
                change_weight_grams: sign * item.weight_750,
            }),
            carat: None,
        })
        .collect()
}

/// Net carat bucket deltas of a plan, one per carat, in ascending carat order.
///
/// Applying the merged deltas is equivalent to applying each one in turn.
#[must_use]
pub fn merge_carat_deltas(deltas: impl IntoIterator<Item = CaratDelta>) -> Vec<CaratDelta> {
    let mut merged: std::collections::BTreeMap<i32, CaratDelta> = std::collections::BTreeMap::new();
    for delta in deltas {
        merged
            .entry(delta.carat)
            .and_modify(|acc| {
                acc.weight_delta += delta.weight_delta;
                acc.value_delta += delta.value_delta;
            })
            .or_insert(delta);
    }
    merged.into_values().collect()
}
