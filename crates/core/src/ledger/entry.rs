//! Ledger row kinds.

use serde::{Deserialize, Serialize};

/// Why an inventory ledger row was appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Stock bought from a contact.
    Buy,
    /// Stock sold to a contact.
    Sell,
    /// Gold received from a contact in a physical settlement.
    SettlementInflow,
    /// Gold handed to a contact in a physical settlement.
    SettlementOutflow,
    /// Manual correction (count, scrap, loss).
    Adjustment,
}

impl MovementType {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::SettlementInflow => "settlement_inflow",
            Self::SettlementOutflow => "settlement_outflow",
            Self::Adjustment => "adjustment",
        }
    }
}

/// Why a contact weight ledger row was appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightEventType {
    /// Gold bought from the contact (debit).
    Buy,
    /// Gold sold to the contact (credit).
    Sell,
    /// Gold received from the contact in a settlement (debit).
    SettlementInflow,
    /// Gold handed to the contact in a settlement (credit).
    SettlementOutflow,
}

impl WeightEventType {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::SettlementInflow => "settlement_inflow",
            Self::SettlementOutflow => "settlement_outflow",
        }
    }

    /// True for events on the debit side of the contact's weight account.
    #[must_use]
    pub const fn is_debit(self) -> bool {
        matches!(self, Self::Buy | Self::SettlementInflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_type_as_str_matches_serde() {
        for movement in [
            MovementType::Buy,
            MovementType::Sell,
            MovementType::SettlementInflow,
            MovementType::SettlementOutflow,
            MovementType::Adjustment,
        ] {
            let json = serde_json::to_string(&movement).unwrap();
            assert_eq!(json, format!("\"{}\"", movement.as_str()));
        }
    }

    #[test]
    fn test_weight_event_debit_side() {
        assert!(WeightEventType::Buy.is_debit());
        assert!(WeightEventType::SettlementInflow.is_debit());
        assert!(!WeightEventType::Sell.is_debit());
        assert!(!WeightEventType::SettlementOutflow.is_debit());
    }
}
