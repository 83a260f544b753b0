//! Statement rows and their sources.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tala_shared::types::{Grams, Rials, round_rials};

use crate::trade::{BaseCategory, SettlementDirection, TransactionType};

/// Which table a statement row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementSource {
    /// A transaction item.
    TransactionItem,
    /// A payment.
    Payment,
    /// A physical settlement item.
    Settlement,
}

/// One row of a contact statement.
///
/// Rials, 750-reference weight and unit counts each have their own
/// debit/credit pair; a row fills at most two of the three.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementEntry {
    /// Business date of the underlying event.
    pub entry_date: NaiveDate,
    /// Source table.
    pub source: StatementSource,
    /// Id of the source row (item, payment or settlement item).
    pub source_id: i32,
    /// Id of the parent document (transaction, payment or settlement).
    pub document_id: i32,
    /// Human-readable description.
    pub description: String,
    /// Rial debit.
    pub debit_rials: Rials,
    /// Rial credit.
    pub credit_rials: Rials,
    /// 750-reference weight debit.
    pub debit_weight_750: Grams,
    /// 750-reference weight credit.
    pub credit_weight_750: Grams,
    /// Unit count debit.
    pub debit_count: i32,
    /// Unit count credit.
    pub credit_count: i32,
    /// Scale weight of jewelry, shown beside the count for cross-checks.
    pub weight_memo_grams: Option<Grams>,
}

impl StatementEntry {
    pub(crate) fn blank(
        entry_date: NaiveDate,
        source: StatementSource,
        source_id: i32,
        document_id: i32,
        description: String,
    ) -> Self {
        Self {
            entry_date,
            source,
            source_id,
            document_id,
            description,
            debit_rials: Decimal::ZERO,
            credit_rials: Decimal::ZERO,
            debit_weight_750: Decimal::ZERO,
            credit_weight_750: Decimal::ZERO,
            debit_count: 0,
            credit_count: 0,
            weight_memo_grams: None,
        }
    }
}

/// A completed transaction item joined with its header and product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStatementRow {
    /// Item id.
    pub item_id: i32,
    /// Transaction id.
    pub transaction_id: i32,
    /// Transaction date.
    pub transaction_date: NaiveDate,
    /// Buy or sell.
    pub transaction_type: TransactionType,
    /// Product name.
    pub product_name: String,
    /// Base category of the product.
    pub base_category: BaseCategory,
    /// Unit count.
    pub quantity: Option<i32>,
    /// Scale weight.
    pub weight_grams: Option<Grams>,
    /// Purity.
    pub carat: Option<i32>,
    /// Base value plus every charge.
    pub line_total_rials: Rials,
    /// Jewelry weight memo from the item details.
    pub memo_weight_grams: Option<Grams>,
}

/// A payment seen from one contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatementRow {
    /// Payment id.
    pub payment_id: i32,
    /// Payment date.
    pub payment_date: NaiveDate,
    /// Amount.
    pub amount_rials: Rials,
    /// True when the contact is the receiver, false when it is the payer.
    pub contact_is_receiver: bool,
    /// Notes.
    pub notes: Option<String>,
}

/// A settlement item seen from its contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementStatementRow {
    /// Settlement item id.
    pub item_id: i32,
    /// Settlement id.
    pub settlement_id: i32,
    /// Settlement date.
    pub settlement_date: NaiveDate,
    /// Inflow or outflow.
    pub direction: SettlementDirection,
    /// Product name.
    pub product_name: String,
    /// 750-reference weight.
    pub weight_750: Grams,
}

/// Running rial, weight and count balances of a statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementBalance {
    /// Rial balance; positive = contact owes the business.
    pub rials: Rials,
    /// 750-reference weight balance; positive = net gold received from the contact.
    pub weight_750: Grams,
    /// Unit count balance; positive = net units received from the contact.
    pub count: i64,
}

impl StatementBalance {
    /// The same balance with rials rounded to two decimals.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self {
            rials: round_rials(self.rials),
            ..self
        }
    }
}

/// A statement row with the balances after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    /// The row.
    pub entry: StatementEntry,
    /// Balances after the row.
    pub balance: StatementBalance,
}

/// A contact statement over an optional date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    /// First date included, if bounded.
    pub start_date: Option<NaiveDate>,
    /// Last date included, if bounded.
    pub end_date: Option<NaiveDate>,
    /// Balances before the first row.
    pub opening: StatementBalance,
    /// Rows with running balances.
    pub lines: Vec<StatementLine>,
    /// Balances after the last row.
    pub closing: StatementBalance,
}
