//! Payment repository.
//!
//! Payments move rial balances only; they never touch a weight ledger.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use tala_core::ledger::LedgerError;
use tala_core::trade::{CreatePaymentInput, validate_payment};
use tala_shared::types::{ContactId, PaymentId, TransactionId};
use tracing::{info, instrument};

use super::unit_of_work::lock_contacts;
use crate::entities::{payments, transactions};
use crate::error::RepositoryError;

/// Payment repository.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    db: DatabaseConnection,
}

impl PaymentRepository {
    /// Creates a new payment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a payment between the business and one or two contacts.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive amount, a missing or
    /// duplicated contact, `ContactNotFound`/`TransactionNotFound` for
    /// unknown references, or a database error.
    #[instrument(skip(self, input), fields(amount = %input.amount_rials))]
    pub async fn record_payment(
        &self,
        input: CreatePaymentInput,
    ) -> Result<payments::Model, RepositoryError> {
        validate_payment(&input)?;

        let txn = self.db.begin().await?;
        let named: Vec<ContactId> = [input.paying_contact_id, input.receiving_contact_id]
            .into_iter()
            .flatten()
            .collect();
        let found = lock_contacts(&txn, named.iter().copied()).await?;
        if let Some(missing) = named
            .iter()
            .find(|id| !found.iter().any(|contact| contact.id == id.into_inner()))
        {
            return Err(LedgerError::ContactNotFound(*missing).into());
        }
        if let Some(transaction_id) = input.related_transaction_id {
            transactions::Entity::find_by_id(transaction_id.into_inner())
                .one(&txn)
                .await?
                .ok_or(LedgerError::TransactionNotFound(transaction_id))?;
        }

        let payment = payments::ActiveModel {
            payment_date: Set(input.payment_date),
            amount_rials: Set(input.amount_rials),
            direction: Set(input.direction.into()),
            paying_contact_id: Set(input.paying_contact_id.map(ContactId::into_inner)),
            receiving_contact_id: Set(input.receiving_contact_id.map(ContactId::into_inner)),
            related_transaction_id: Set(input.related_transaction_id.map(TransactionId::into_inner)),
            notes: Set(input.notes),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        info!(payment_id = payment.id, "payment recorded");
        Ok(payment)
    }

    /// Deletes a payment.
    ///
    /// # Errors
    ///
    /// Returns `PaymentNotFound` for an unknown id or a database error.
    #[instrument(skip(self))]
    pub async fn delete_payment(&self, payment_id: PaymentId) -> Result<(), RepositoryError> {
        let result = payments::Entity::delete_by_id(payment_id.into_inner())
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(LedgerError::PaymentNotFound(payment_id).into());
        }
        info!(%payment_id, "payment deleted");
        Ok(())
    }

    /// Payments where the contact pays or receives, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn payments_for_contact(
        &self,
        contact_id: ContactId,
    ) -> Result<Vec<payments::Model>, RepositoryError> {
        let id = contact_id.into_inner();
        Ok(payments::Entity::find()
            .filter(
                payments::Column::PayingContactId
                    .eq(id)
                    .or(payments::Column::ReceivingContactId.eq(id)),
            )
            .order_by_asc(payments::Column::PaymentDate)
            .order_by_asc(payments::Column::Id)
            .all(&self.db)
            .await?)
    }
}
