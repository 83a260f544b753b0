//! Physical settlement repository.
//!
//! A settlement hands gold to or takes gold from a contact without money
//! changing hands. Each item moves the contact's weight account, the
//! product's stock (valued at average cost) and the carat bucket, all in one
//! unit of work.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tala_core::ledger::LedgerError;
use tala_core::trade::{
    CaratDelta, CreateSettlementInput, merge_carat_deltas, plan_settlement_effects,
    prepare_settlement_items,
};
use tala_shared::config::LedgerConfig;
use tala_shared::types::{ContactId, ProductId, SettlementId};
use tracing::{info, instrument};

use super::carat_inventory::apply_delta_in;
use super::contact_weight_ledger::{RecordWeightEntryInput, append_entry, delete_entries_where};
use super::inventory_ledger::{
    RecordMovementInput, append_movement, delete_movements_where, row_change,
};
use super::product::load_profiles;
use super::unit_of_work::{lock_contact, lock_products, lock_settlement, with_retry};
use crate::entities::{
    contact_weight_ledger, inventory_ledger, physical_settlement_items, physical_settlements,
};
use crate::error::RepositoryError;

/// A settlement header with its items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementWithItems {
    /// Header row.
    pub settlement: physical_settlements::Model,
    /// Item rows in insertion order.
    pub items: Vec<physical_settlement_items::Model>,
}

/// Physical settlement repository.
#[derive(Debug, Clone)]
pub struct SettlementRepository {
    db: DatabaseConnection,
    max_write_attempts: u32,
}

impl SettlementRepository {
    /// Creates a new settlement repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_config(db, &LedgerConfig::default())
    }

    /// Creates a repository using the given ledger settings.
    #[must_use]
    pub const fn with_config(db: DatabaseConnection, config: &LedgerConfig) -> Self {
        Self {
            db,
            max_write_attempts: config.max_write_attempts,
        }
    }

    /// Records a settlement and all of its ledger effects atomically.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty or non weight-bearing items,
    /// `ContactNotFound`/`ProductNotFound` for unknown references, or
    /// `ConsistencyConflict` when concurrent appends exhaust the retry budget.
    #[instrument(skip(self, input), fields(contact_id = %input.contact_id, direction = input.direction.as_str()))]
    pub async fn record_settlement(
        &self,
        input: CreateSettlementInput,
    ) -> Result<SettlementWithItems, RepositoryError> {
        let input = &input;
        let recorded = with_retry(self.max_write_attempts, "record_settlement", move || async move {
            let txn = self.db.begin().await?;
            lock_contact(&txn, input.contact_id).await?;
            let profiles = load_profiles(&txn, input.items.iter().map(|item| item.product_id)).await?;
            let prepared = prepare_settlement_items(input, &profiles)?;
            lock_products(&txn, prepared.iter().map(|item| item.input.product_id)).await?;

            let settlement = physical_settlements::ActiveModel {
                contact_id: Set(input.contact_id.into_inner()),
                direction: Set(input.direction.into()),
                settlement_date: Set(input.settlement_date),
                notes: Set(input.notes.clone()),
                created_at: Set(Utc::now().into()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            let settlement_id = SettlementId::new(settlement.id);

            let mut items = Vec::with_capacity(prepared.len());
            for item in &prepared {
                items.push(
                    physical_settlement_items::ActiveModel {
                        settlement_id: Set(settlement.id),
                        product_id: Set(item.input.product_id.into_inner()),
                        weight_scale: Set(item.input.weight_scale),
                        carat: Set(item.input.carat),
                        weight_750: Set(item.weight_750),
                        ..Default::default()
                    }
                    .insert(&txn)
                    .await?,
                );
            }

            let mut carat_deltas = Vec::with_capacity(prepared.len());
            for effect in plan_settlement_effects(input.direction, input.contact_id, &prepared) {
                let movement = RecordMovementInput {
                    settlement_id: Some(settlement_id),
                    notes: input.notes.clone(),
                    ..RecordMovementInput::from_delta(&effect.inventory, input.settlement_date)
                };
                let row = append_movement(&txn, &movement).await?;
                if let Some(carat) = row.carat {
                    carat_deltas.push(CaratDelta {
                        carat,
                        weight_delta: row.change_weight_grams,
                        value_delta: row_change(&row).value_rials,
                    });
                }

                if let Some(weight) = effect.contact_weight {
                    let entry = RecordWeightEntryInput {
                        related_settlement_id: Some(settlement_id),
                        notes: input.notes.clone(),
                        ..RecordWeightEntryInput::from_delta(&weight, input.settlement_date)
                    };
                    append_entry(&txn, &entry).await?;
                }
            }
            for delta in merge_carat_deltas(carat_deltas) {
                apply_delta_in(&txn, &delta).await?;
            }

            txn.commit().await?;
            Ok::<_, RepositoryError>(SettlementWithItems { settlement, items })
        })
        .await?;

        info!(
            settlement_id = recorded.settlement.id,
            items = recorded.items.len(),
            "settlement recorded"
        );
        Ok(recorded)
    }

    /// Deletes a settlement and reverses every ledger effect it produced.
    ///
    /// # Errors
    ///
    /// Returns `SettlementNotFound` for an unknown id or a database error.
    #[instrument(skip(self))]
    pub async fn delete_settlement(&self, settlement_id: SettlementId) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;
        let settlement = lock_settlement(&txn, settlement_id)
            .await?
            .ok_or(LedgerError::SettlementNotFound(settlement_id))?;
        let existing = SettlementWithItems {
            items: load_items(&txn, settlement.id).await?,
            settlement,
        };
        lock_contact(&txn, ContactId::new(existing.settlement.contact_id)).await?;
        lock_products(
            &txn,
            existing.items.iter().map(|item| ProductId::new(item.product_id)),
        )
        .await?;

        let movements = delete_movements_where(
            &txn,
            inventory_ledger::Column::SettlementId.eq(settlement_id.into_inner()),
        )
        .await?;
        let reversals = merge_carat_deltas(movements.iter().filter_map(|row| {
            row.carat.map(|carat| CaratDelta {
                carat,
                weight_delta: -row.change_weight_grams,
                value_delta: -row_change(row).value_rials,
            })
        }));
        for delta in reversals {
            apply_delta_in(&txn, &delta).await?;
        }
        delete_entries_where(
            &txn,
            contact_weight_ledger::Column::RelatedSettlementId.eq(settlement_id.into_inner()),
        )
        .await?;

        physical_settlement_items::Entity::delete_many()
            .filter(physical_settlement_items::Column::SettlementId.eq(settlement_id.into_inner()))
            .exec(&txn)
            .await?;
        physical_settlements::Entity::delete_by_id(settlement_id.into_inner())
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(%settlement_id, movements = movements.len(), "settlement deleted");
        Ok(())
    }

    /// Finds a settlement with its items.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_settlement(
        &self,
        settlement_id: SettlementId,
    ) -> Result<Option<SettlementWithItems>, RepositoryError> {
        Ok(find_with_items(&self.db, settlement_id).await?)
    }

    /// Settlements of a contact, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_contact(
        &self,
        contact_id: ContactId,
    ) -> Result<Vec<physical_settlements::Model>, RepositoryError> {
        Ok(physical_settlements::Entity::find()
            .filter(physical_settlements::Column::ContactId.eq(contact_id.into_inner()))
            .order_by_asc(physical_settlements::Column::SettlementDate)
            .order_by_asc(physical_settlements::Column::Id)
            .all(&self.db)
            .await?)
    }
}

async fn find_with_items<C: ConnectionTrait>(
    conn: &C,
    settlement_id: SettlementId,
) -> Result<Option<SettlementWithItems>, sea_orm::DbErr> {
    let Some(settlement) = physical_settlements::Entity::find_by_id(settlement_id.into_inner())
        .one(conn)
        .await?
    else {
        return Ok(None);
    };
    let items = load_items(conn, settlement.id).await?;
    Ok(Some(SettlementWithItems { settlement, items }))
}

async fn load_items<C: ConnectionTrait>(
    conn: &C,
    settlement_id: i32,
) -> Result<Vec<physical_settlement_items::Model>, sea_orm::DbErr> {
    physical_settlement_items::Entity::find()
        .filter(physical_settlement_items::Column::SettlementId.eq(settlement_id))
        .order_by_asc(physical_settlement_items::Column::Id)
        .all(conn)
        .await
}
