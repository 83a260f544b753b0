//! Contact repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tala_core::ledger::LedgerError;
use tala_shared::types::ContactId;
use tracing::{info, instrument};

use super::unit_of_work::lock_contact;
use crate::entities::sea_orm_active_enums::ContactType;
use crate::entities::{contact_weight_ledger, contacts, payments, physical_settlements, transactions};
use crate::error::RepositoryError;

/// Input for creating a contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateContactInput {
    /// Display name.
    pub name: String,
    /// Role of the contact.
    pub contact_type: ContactType,
    /// Phone number.
    pub phone: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Contact repository.
#[derive(Debug, Clone)]
pub struct ContactRepository {
    db: DatabaseConnection,
}

impl ContactRepository {
    /// Creates a new contact repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a contact.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_contact(
        &self,
        input: CreateContactInput,
    ) -> Result<contacts::Model, RepositoryError> {
        let contact = contacts::ActiveModel {
            name: Set(input.name),
            contact_type: Set(input.contact_type),
            phone: Set(input.phone),
            notes: Set(input.notes),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(contact_id = contact.id, "contact created");
        Ok(contact)
    }

    /// Finds a contact by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_id(
        &self,
        contact_id: ContactId,
    ) -> Result<Option<contacts::Model>, RepositoryError> {
        Ok(contacts::Entity::find_by_id(contact_id.into_inner())
            .one(&self.db)
            .await?)
    }

    /// Every contact ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_contacts(&self) -> Result<Vec<contacts::Model>, RepositoryError> {
        Ok(contacts::Entity::find()
            .order_by_asc(contacts::Column::Name)
            .order_by_asc(contacts::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Deletes a contact that nothing references.
    ///
    /// # Errors
    ///
    /// Returns `ContactNotFound` for an unknown id and `Conflict` when
    /// transactions, payments, settlements or weight ledger rows still
    /// reference the contact.
    #[instrument(skip(self))]
    pub async fn delete_contact(&self, contact_id: ContactId) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;
        lock_contact(&txn, contact_id).await?;
        let id = contact_id.into_inner();

        let trades = transactions::Entity::find()
            .filter(transactions::Column::CounterpartyContactId.eq(id))
            .count(&txn)
            .await?;
        if trades > 0 {
            return Err(in_use(contact_id, format!("{trades} transaction(s) reference it")));
        }

        let payment_count = payments::Entity::find()
            .filter(
                payments::Column::PayingContactId
                    .eq(id)
                    .or(payments::Column::ReceivingContactId.eq(id)),
            )
            .count(&txn)
            .await?;
        if payment_count > 0 {
            return Err(in_use(contact_id, format!("{payment_count} payment(s) reference it")));
        }

        let settlements = physical_settlements::Entity::find()
            .filter(physical_settlements::Column::ContactId.eq(id))
            .count(&txn)
            .await?;
        if settlements > 0 {
            return Err(in_use(contact_id, format!("{settlements} settlement(s) reference it")));
        }

        let entries = contact_weight_ledger::Entity::find()
            .filter(contact_weight_ledger::Column::ContactId.eq(id))
            .count(&txn)
            .await?;
        if entries > 0 {
            return Err(in_use(contact_id, format!("{entries} weight ledger row(s) reference it")));
        }

        contacts::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(%contact_id, "contact deleted");
        Ok(())
    }
}

fn in_use(contact_id: ContactId, reason: String) -> RepositoryError {
    LedgerError::Conflict {
        entity: format!("contact {contact_id}"),
        reason,
    }
    .into()
}
