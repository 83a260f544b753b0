//! Shared pieces of every write unit of work: row locks and the optimistic
//! retry loop.
//!
//! Lock order is document header, then contacts, then products, each set in
//! ascending id order.

use std::collections::BTreeSet;
use std::future::Future;

use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use tala_core::ledger::LedgerError;
use tala_shared::types::{ContactId, ProductId, SettlementId, TransactionId};
use tracing::warn;

use crate::entities::{contacts, physical_settlements, products, transactions};
use crate::error::RepositoryError;

/// Runs `attempt` until it stops failing with a concurrent modification.
///
/// After `max_attempts` conflicting runs the error becomes
/// [`LedgerError::ConsistencyConflict`]. Every other outcome is returned as is.
pub(crate) async fn with_retry<T, F, Fut>(
    max_attempts: u32,
    operation: &'static str,
    mut attempt: F,
) -> Result<T, RepositoryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RepositoryError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempts = 1;
    loop {
        match attempt().await {
            Err(RepositoryError::Ledger(LedgerError::ConcurrentModification)) => {
                if attempts >= max_attempts {
                    warn!(operation, attempts, "retry budget exhausted");
                    return Err(LedgerError::ConsistencyConflict { attempts }.into());
                }
                warn!(operation, attempt = attempts, "concurrent ledger append, retrying");
                attempts += 1;
            }
            other => return other,
        }
    }
}

/// Locks product rows in ascending id order.
pub(crate) async fn lock_products<C: ConnectionTrait>(
    conn: &C,
    ids: impl IntoIterator<Item = ProductId>,
) -> Result<Vec<products::Model>, DbErr> {
    let ids: BTreeSet<i32> = ids.into_iter().map(ProductId::into_inner).collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    products::Entity::find()
        .filter(products::Column::Id.is_in(ids))
        .order_by_asc(products::Column::Id)
        .lock_exclusive()
        .all(conn)
        .await
}

/// Locks contact rows in ascending id order.
pub(crate) async fn lock_contacts<C: ConnectionTrait>(
    conn: &C,
    ids: impl IntoIterator<Item = ContactId>,
) -> Result<Vec<contacts::Model>, DbErr> {
    let ids: BTreeSet<i32> = ids.into_iter().map(ContactId::into_inner).collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    contacts::Entity::find()
        .filter(contacts::Column::Id.is_in(ids))
        .order_by_asc(contacts::Column::Id)
        .lock_exclusive()
        .all(conn)
        .await
}

/// Locks a transaction header before its items are read.
pub(crate) async fn lock_transaction<C: ConnectionTrait>(
    conn: &C,
    transaction_id: TransactionId,
) -> Result<Option<transactions::Model>, DbErr> {
    transactions::Entity::find_by_id(transaction_id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await
}

/// Locks a settlement header before its items are read.
pub(crate) async fn lock_settlement<C: ConnectionTrait>(
    conn: &C,
    settlement_id: SettlementId,
) -> Result<Option<physical_settlements::Model>, DbErr> {
    physical_settlements::Entity::find_by_id(settlement_id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await
}

/// Locks one contact row, failing when it does not exist.
pub(crate) async fn lock_contact<C: ConnectionTrait>(
    conn: &C,
    contact_id: ContactId,
) -> Result<contacts::Model, RepositoryError> {
    lock_contacts(conn, [contact_id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| LedgerError::ContactNotFound(contact_id).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry(3, "test", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(RepositoryError::from(LedgerError::ConcurrentModification))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.ok(), Some(42));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_budget_exhausted() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_retry(3, "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(RepositoryError::from(LedgerError::ConcurrentModification))
        })
        .await;

        assert!(matches!(
            result,
            Err(RepositoryError::Ledger(LedgerError::ConsistencyConflict { attempts: 3 }))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_retry(3, "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(RepositoryError::from(LedgerError::EmptyTransaction))
        })
        .await;

        assert!(matches!(
            result,
            Err(RepositoryError::Ledger(LedgerError::EmptyTransaction))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
