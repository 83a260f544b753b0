//! Debit/credit classification of statement sources.
//!
//! | Source | Debit | Credit |
//! |---|---|---|
//! | weight-bearing item | 750 weight on buy, rials on sell | 750 weight on sell, rials on buy |
//! | countable item | count on buy, rials on sell | count on sell, rials on buy |
//! | payment | contact receives | contact pays |
//! | settlement item | 750 weight on inflow | 750 weight on outflow |

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::types::{
    ItemStatementRow, PaymentStatementRow, SettlementStatementRow, Statement, StatementBalance,
    StatementEntry, StatementLine, StatementSource,
};
use crate::carat::to_reference_weight;
use crate::trade::{BaseCategory, SettlementDirection, TransactionType};

/// Classifies a completed transaction item.
#[must_use]
pub fn classify_item(row: &ItemStatementRow) -> StatementEntry {
    let verb = match row.transaction_type {
        TransactionType::Buy => "Buy",
        TransactionType::Sell => "Sell",
    };
    let mut entry = StatementEntry::blank(
        row.transaction_date,
        StatementSource::TransactionItem,
        row.item_id,
        row.transaction_id,
        format!("{verb} {}", row.product_name),
    );

    match row.transaction_type {
        TransactionType::Sell => entry.debit_rials = row.line_total_rials,
        TransactionType::Buy => entry.credit_rials = row.line_total_rials,
    }

    if row.base_category.is_countable() {
        let count = row.quantity.unwrap_or(0);
        match row.transaction_type {
            TransactionType::Buy => entry.debit_count = count,
            TransactionType::Sell => entry.credit_count = count,
        }
        if row.base_category == BaseCategory::Jewelry {
            entry.weight_memo_grams = row.memo_weight_grams.or(row.weight_grams);
        }
    } else {
        let weight_750 = row
            .weight_grams
            .map_or(Decimal::ZERO, |weight| to_reference_weight(weight, row.carat));
        match row.transaction_type {
            TransactionType::Buy => entry.debit_weight_750 = weight_750,
            TransactionType::Sell => entry.credit_weight_750 = weight_750,
        }
    }

    entry
}

/// Classifies a payment.
#[must_use]
pub fn classify_payment(row: &PaymentStatementRow) -> StatementEntry {
    let description = match (&row.notes, row.contact_is_receiver) {
        (Some(notes), _) => notes.clone(),
        (None, true) => "Payment to contact".to_string(),
        (None, false) => "Payment from contact".to_string(),
    };
    let mut entry = StatementEntry::blank(
        row.payment_date,
        StatementSource::Payment,
        row.payment_id,
        row.payment_id,
        description,
    );
    if row.contact_is_receiver {
        entry.debit_rials = row.amount_rials;
    } else {
        entry.credit_rials = row.amount_rials;
    }
    entry
}

/// Classifies a physical settlement item.
#[must_use]
pub fn classify_settlement_item(row: &SettlementStatementRow) -> StatementEntry {
    let (verb, inflow) = match row.direction {
        SettlementDirection::Inflow => ("Received", true),
        SettlementDirection::Outflow => ("Delivered", false),
    };
    let mut entry = StatementEntry::blank(
        row.settlement_date,
        StatementSource::Settlement,
        row.item_id,
        row.settlement_id,
        format!("{verb} {}", row.product_name),
    );
    if inflow {
        entry.debit_weight_750 = row.weight_750;
    } else {
        entry.credit_weight_750 = row.weight_750;
    }
    entry
}

/// Concatenates items, payments and settlements and sorts by date.
///
/// The sort is stable: same-day rows keep source order (items, payments,
/// settlements) and, within a source, the order they were given in.
#[must_use]
pub fn merge_entries(
    items: &[ItemStatementRow],
    payments: &[PaymentStatementRow],
    settlements: &[SettlementStatementRow],
) -> Vec<StatementEntry> {
    let mut entries: Vec<StatementEntry> = items
        .iter()
        .map(classify_item)
        .chain(payments.iter().map(classify_payment))
        .chain(settlements.iter().map(classify_settlement_item))
        .collect();
    entries.sort_by_key(|entry| entry.entry_date);
    entries
}

/// Applies one row to a balance.
#[must_use]
pub fn apply_entry(balance: StatementBalance, entry: &StatementEntry) -> StatementBalance {
    StatementBalance {
        rials: balance.rials + entry.debit_rials - entry.credit_rials,
        weight_750: balance.weight_750 + entry.debit_weight_750 - entry.credit_weight_750,
        count: balance.count + i64::from(entry.debit_count) - i64::from(entry.credit_count),
    }
}

/// Folds sorted rows into running balances starting from `opening`.
///
/// Rials are accumulated exactly and rounded only in the reported balances,
/// so the closing balance matches the contact's rial balance over the same
/// rows.
#[must_use]
pub fn fold_running(
    entries: Vec<StatementEntry>,
    opening: StatementBalance,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Statement {
    let mut exact = opening;
    let lines: Vec<StatementLine> = entries
        .into_iter()
        .map(|entry| {
            exact = apply_entry(exact, &entry);
            StatementLine {
                entry,
                balance: exact.rounded(),
            }
        })
        .collect();

    Statement {
        start_date,
        end_date,
        opening: opening.rounded(),
        lines,
        closing: exact.rounded(),
    }
}
