//! Domain types for trades, settlements and payments.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tala_shared::types::{CategoryId, ContactId, Grams, ProductId, Rials, TransactionId};

/// Direction of a trade from the business's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// The business buys from the contact; stock increases.
    Buy,
    /// The business sells to the contact; stock decreases.
    Sell,
}

impl TransactionType {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }

    /// `+1` for buys, `-1` for sells.
    #[must_use]
    pub fn stock_sign(self) -> Decimal {
        match self {
            Self::Buy => Decimal::ONE,
            Self::Sell => Decimal::NEGATIVE_ONE,
        }
    }
}

/// Delivery lifecycle of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Bought goods not yet received.
    PendingReceipt,
    /// Sold goods not yet delivered.
    PendingDelivery,
    /// Goods exchanged; the only status that moves balances.
    Completed,
    /// Abandoned.
    Cancelled,
}

impl DeliveryStatus {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingReceipt => "pending_receipt",
            Self::PendingDelivery => "pending_delivery",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// True when the transaction contributes to balances.
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// True for the two pending statuses.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::PendingReceipt | Self::PendingDelivery)
    }
}

/// Base category a product category belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseCategory {
    /// Melted (abshode) gold, traded by weight and assay.
    Melted,
    /// Manufactured gold goods traded by weight.
    Manufactured,
    /// Minted coins, traded by count.
    Coin,
    /// Gold bars, traded by weight.
    GoldBullion,
    /// Finished jewelry, traded by count with a weight memo.
    Jewelry,
}

impl BaseCategory {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Melted => "melted",
            Self::Manufactured => "manufactured",
            Self::Coin => "coin",
            Self::GoldBullion => "gold_bullion",
            Self::Jewelry => "jewelry",
        }
    }

    /// Countable categories are valued by unit count.
    #[must_use]
    pub const fn is_countable(self) -> bool {
        matches!(self, Self::Coin | Self::Jewelry)
    }

    /// Weight-bearing categories feed the contact weight ledger.
    #[must_use]
    pub const fn is_weight_bearing(self) -> bool {
        !self.is_countable()
    }
}

impl fmt::Display for BaseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category-specific fields of a transaction item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum ItemDetails {
    /// Melted gold.
    Melted {
        /// Assay office that tested the piece.
        assay_office: Option<String>,
        /// Assay slip number.
        assay_number: Option<String>,
    },
    /// Manufactured goods.
    Manufactured {
        /// Workshop the goods came from.
        workshop: Option<String>,
        /// Stone weight excluded from the gold weight.
        stone_weight_grams: Option<Grams>,
    },
    /// Coins.
    Coin {
        /// Coin type, e.g. `emami`, `half`, `quarter`.
        coin_type: Option<String>,
        /// Minting year.
        mint_year: Option<i32>,
        /// Sealed in the bank's vacuum pack.
        vacuum_sealed: bool,
    },
    /// Gold bars.
    GoldBullion {
        /// Refiner's serial number.
        serial_number: Option<String>,
        /// Refinery name.
        refinery: Option<String>,
    },
    /// Jewelry.
    Jewelry {
        /// Short description of the piece.
        description: Option<String>,
        /// Scale weight kept as a memo next to the unit count.
        memo_weight_grams: Option<Grams>,
    },
}

impl ItemDetails {
    /// Base category these details describe.
    #[must_use]
    pub const fn base_category(&self) -> BaseCategory {
        match self {
            Self::Melted { .. } => BaseCategory::Melted,
            Self::Manufactured { .. } => BaseCategory::Manufactured,
            Self::Coin { .. } => BaseCategory::Coin,
            Self::GoldBullion { .. } => BaseCategory::GoldBullion,
            Self::Jewelry { .. } => BaseCategory::Jewelry,
        }
    }

    /// Empty details for a base category.
    #[must_use]
    pub const fn empty(category: BaseCategory) -> Self {
        match category {
            BaseCategory::Melted => Self::Melted {
                assay_office: None,
                assay_number: None,
            },
            BaseCategory::Manufactured => Self::Manufactured {
                workshop: None,
                stone_weight_grams: None,
            },
            BaseCategory::Coin => Self::Coin {
                coin_type: None,
                mint_year: None,
                vacuum_sealed: false,
            },
            BaseCategory::GoldBullion => Self::GoldBullion {
                serial_number: None,
                refinery: None,
            },
            BaseCategory::Jewelry => Self::Jewelry {
                description: None,
                memo_weight_grams: None,
            },
        }
    }

    /// Serializes to the JSON stored on the item row.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Parses the JSON stored on the item row.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a known variant.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Jewelry weight memo, if any.
    #[must_use]
    pub fn memo_weight(&self) -> Option<Grams> {
        match self {
            Self::Jewelry {
                memo_weight_grams, ..
            } => *memo_weight_grams,
            _ => None,
        }
    }
}

/// Charges added on top of an item's base value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCharges {
    /// Making charge (ojrat).
    pub wage_rials: Rials,
    /// Seller's profit.
    pub profit_rials: Rials,
    /// Commission or fee.
    pub fee_rials: Rials,
    /// General tax.
    pub general_tax_rials: Rials,
    /// Value added tax.
    pub vat_rials: Rials,
}

impl ItemCharges {
    /// Wage + profit + fee.
    #[must_use]
    pub fn profit_wage_commission(&self) -> Rials {
        self.wage_rials + self.profit_rials + self.fee_rials
    }

    /// All charges.
    #[must_use]
    pub fn total(&self) -> Rials {
        self.profit_wage_commission() + self.general_tax_rials + self.vat_rials
    }
}

/// Input for one transaction item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionItemInput {
    /// Product traded.
    pub product_id: ProductId,
    /// Unit count (required for countable categories).
    pub quantity: Option<i32>,
    /// Scale weight (required for weight-bearing categories).
    pub weight_grams: Option<Grams>,
    /// Purity in thousandths (required for weight-bearing categories).
    pub carat: Option<i32>,
    /// Price per gram (weight-bearing) or per unit (countable).
    pub unit_price_rials: Rials,
    /// Charges on top of the base value.
    #[serde(default)]
    pub charges: ItemCharges,
    /// Category-specific fields.
    pub details: ItemDetails,
}

/// Input for creating or replacing a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTransactionInput {
    /// Buy or sell.
    pub transaction_type: TransactionType,
    /// Business date of the trade.
    pub transaction_date: NaiveDate,
    /// Counterparty, if known.
    pub counterparty_contact_id: Option<ContactId>,
    /// Delivery status.
    pub delivery_status: DeliveryStatus,
    /// Market gold price (mazaneh) at the time of the trade.
    pub mazaneh_price: Option<Rials>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Line items.
    pub items: Vec<TransactionItemInput>,
}

/// What validation needs to know about a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductProfile {
    /// Product id.
    pub product_id: ProductId,
    /// Product name.
    pub name: String,
    /// Product category id.
    pub category_id: CategoryId,
    /// Base category of the product's category.
    pub base_category: BaseCategory,
}

/// A validated item with its derived amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedItem {
    /// Zero-based position in the input.
    pub line: usize,
    /// Original input.
    pub input: TransactionItemInput,
    /// Product category id.
    pub category_id: CategoryId,
    /// Base category.
    pub base_category: BaseCategory,
    /// 750-reference weight (zero for items without weight or carat).
    pub reference_weight: Grams,
    /// Base value before charges.
    pub total_value_rials: Rials,
    /// Base value plus every charge.
    pub line_total_rials: Rials,
}

impl PreparedItem {
    /// Unit count, zero when absent.
    #[must_use]
    pub fn quantity(&self) -> i32 {
        self.input.quantity.unwrap_or(0)
    }

    /// Scale weight, zero when absent.
    #[must_use]
    pub fn weight(&self) -> Grams {
        self.input.weight_grams.unwrap_or(Decimal::ZERO)
    }
}

/// Header totals, always derived from the items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionTotals {
    /// Sum of item base values.
    pub total_items_value_rials: Rials,
    /// Sum of wage, profit and fee.
    pub total_profit_wage_commission_rials: Rials,
    /// Sum of general tax.
    pub total_general_tax_rials: Rials,
    /// Items + profit/wage/commission + general tax.
    pub total_before_vat_rials: Rials,
    /// Sum of VAT.
    pub total_vat_rials: Rials,
    /// Amount the rial balance moves by.
    pub final_payable_amount_rials: Rials,
}

impl TransactionTotals {
    /// Sums the items of a transaction.
    #[must_use]
    pub fn from_items(items: &[PreparedItem]) -> Self {
        let mut totals = Self::default();
        for item in items {
            let charges = &item.input.charges;
            totals.total_items_value_rials += item.total_value_rials;
            totals.total_profit_wage_commission_rials += charges.profit_wage_commission();
            totals.total_general_tax_rials += charges.general_tax_rials;
            totals.total_vat_rials += charges.vat_rials;
        }
        totals.total_before_vat_rials = totals.total_items_value_rials
            + totals.total_profit_wage_commission_rials
            + totals.total_general_tax_rials;
        totals.final_payable_amount_rials = totals.total_before_vat_rials + totals.total_vat_rials;
        totals
    }
}

/// Direction of a physical settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementDirection {
    /// Gold received from the contact.
    Inflow,
    /// Gold handed to the contact.
    Outflow,
}

impl SettlementDirection {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inflow => "inflow",
            Self::Outflow => "outflow",
        }
    }

    /// `+1` for inflows, `-1` for outflows.
    #[must_use]
    pub fn stock_sign(self) -> Decimal {
        match self {
            Self::Inflow => Decimal::ONE,
            Self::Outflow => Decimal::NEGATIVE_ONE,
        }
    }
}

/// Input for one settlement item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementItemInput {
    /// Product moved.
    pub product_id: ProductId,
    /// Scale weight.
    pub weight_scale: Grams,
    /// Purity in thousandths.
    pub carat: i32,
}

/// Input for recording a physical settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSettlementInput {
    /// Contact settled with.
    pub contact_id: ContactId,
    /// Inflow or outflow.
    pub direction: SettlementDirection,
    /// Business date.
    pub settlement_date: NaiveDate,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Items.
    pub items: Vec<SettlementItemInput>,
}

/// A validated settlement item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedSettlementItem {
    /// Zero-based position in the input.
    pub line: usize,
    /// Original input.
    pub input: SettlementItemInput,
    /// Product category id.
    pub category_id: CategoryId,
    /// 750-reference weight.
    pub weight_750: Grams,
}

/// Direction of a payment from the business's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentDirection {
    /// Money received by the business.
    Inflow,
    /// Money paid out by the business.
    Outflow,
}

impl PaymentDirection {
    /// Returns the stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inflow => "inflow",
            Self::Outflow => "outflow",
        }
    }
}

/// Input for recording a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePaymentInput {
    /// Business date.
    pub payment_date: NaiveDate,
    /// Amount, always positive.
    pub amount_rials: Rials,
    /// Inflow or outflow.
    pub direction: PaymentDirection,
    /// Contact paying the money.
    pub paying_contact_id: Option<ContactId>,
    /// Contact receiving the money.
    pub receiving_contact_id: Option<ContactId>,
    /// Transaction the payment settles, if any.
    pub related_transaction_id: Option<TransactionId>,
    /// Free-form notes.
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_base_category_classes() {
        assert!(BaseCategory::Coin.is_countable());
        assert!(BaseCategory::Jewelry.is_countable());
        assert!(BaseCategory::Melted.is_weight_bearing());
        assert!(BaseCategory::Manufactured.is_weight_bearing());
        assert!(BaseCategory::GoldBullion.is_weight_bearing());
    }

    #[test]
    fn test_item_details_json_is_tagged() {
        let details = ItemDetails::Coin {
            coin_type: Some("emami".into()),
            mint_year: Some(1402),
            vacuum_sealed: true,
        };
        let json = details.to_json().unwrap();
        assert_eq!(json["category"], "coin");
        assert_eq!(json["coin_type"], "emami");
        assert_eq!(ItemDetails::from_json(json).unwrap(), details);
    }

    #[test]
    fn test_item_details_rejects_unknown_category() {
        let json = serde_json::json!({ "category": "silver" });
        assert!(ItemDetails::from_json(json).is_err());
    }

    #[test]
    fn test_empty_details_match_category() {
        for category in [
            BaseCategory::Melted,
            BaseCategory::Manufactured,
            BaseCategory::Coin,
            BaseCategory::GoldBullion,
            BaseCategory::Jewelry,
        ] {
            assert_eq!(ItemDetails::empty(category).base_category(), category);
        }
    }

    #[test]
    fn test_charges() {
        let charges = ItemCharges {
            wage_rials: dec!(100),
            profit_rials: dec!(50),
            fee_rials: dec!(10),
            general_tax_rials: dec!(5),
            vat_rials: dec!(15),
        };
        assert_eq!(charges.profit_wage_commission(), dec!(160));
        assert_eq!(charges.total(), dec!(180));
    }

    #[test]
    fn test_status_predicates() {
        assert!(DeliveryStatus::Completed.is_completed());
        assert!(DeliveryStatus::PendingReceipt.is_pending());
        assert!(DeliveryStatus::PendingDelivery.is_pending());
        assert!(!DeliveryStatus::Cancelled.is_pending());
        assert!(!DeliveryStatus::Cancelled.is_completed());
    }
}
