//! Contact rial balances.
//!
//! `balance = Σ completed sells − Σ completed buys − Σ paid by contact + Σ received by contact`
//!
//! Positive means the contact owes the business. Pending and cancelled
//! transactions never enter the formula.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tala_shared::types::{ContactId, Rials, round_rials};

/// The four sums the rial balance is made of.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RialContributions {
    /// Final payable amounts of completed sells to the contact.
    pub completed_sells: Rials,
    /// Final payable amounts of completed buys from the contact.
    pub completed_buys: Rials,
    /// Payments where the contact is the payer.
    pub paid_by_contact: Rials,
    /// Payments where the contact is the receiver.
    pub received_by_contact: Rials,
}

impl RialContributions {
    /// Net balance rounded to two decimals.
    #[must_use]
    pub fn balance(&self) -> Rials {
        round_rials(self.net())
    }

    /// Net balance before rounding.
    #[must_use]
    pub fn net(&self) -> Rials {
        self.completed_sells - self.completed_buys - self.paid_by_contact + self.received_by_contact
    }
}

/// A contact's rial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactBalance {
    /// Contact id.
    pub contact_id: ContactId,
    /// Contact display name.
    pub contact_name: String,
    /// Signed balance; positive = contact owes the business.
    pub balance: Rials,
}

/// Contacts split by the sign of their balance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtorsAndCreditors {
    /// Contacts owing the business, largest first.
    pub debtors: Vec<ContactBalance>,
    /// Contacts the business owes, largest first.
    pub creditors: Vec<ContactBalance>,
}

/// Splits balances into debtors (`> threshold`) and creditors (`< -threshold`).
///
/// Balances within `±threshold` are dropped. Each side is sorted by
/// descending magnitude, ties by contact id.
#[must_use]
pub fn partition_debtors_creditors(
    balances: impl IntoIterator<Item = ContactBalance>,
    threshold: Rials,
) -> DebtorsAndCreditors {
    let mut result = DebtorsAndCreditors::default();
    for entry in balances {
        if entry.balance > threshold {
            result.debtors.push(entry);
        } else if entry.balance < -threshold {
            result.creditors.push(entry);
        }
    }
    result.debtors.sort_by(by_magnitude_desc);
    result.creditors.sort_by(by_magnitude_desc);
    result
}

fn by_magnitude_desc(a: &ContactBalance, b: &ContactBalance) -> Ordering {
    b.balance
        .abs()
        .cmp(&a.balance.abs())
        .then_with(|| a.contact_id.cmp(&b.contact_id))
}

/// Pending transactions of a contact, kept apart from balances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSummary {
    /// Buys awaiting receipt.
    pub pending_receipt_count: u64,
    /// Sum of their final payable amounts.
    pub pending_receipt_total: Rials,
    /// Sells awaiting delivery.
    pub pending_delivery_count: u64,
    /// Sum of their final payable amounts.
    pub pending_delivery_total: Rials,
}

impl PendingSummary {
    /// True when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending_receipt_count == 0 && self.pending_delivery_count == 0
    }

    /// Total pending amount regardless of direction.
    #[must_use]
    pub fn total(&self) -> Rials {
        self.pending_receipt_total + self.pending_delivery_total
    }
}
