//! Transaction repository: the single producer of ledger-affecting trades.
//!
//! A transaction header, its items and, when the transaction is completed,
//! every inventory movement, contact weight entry and carat bucket delta it
//! implies are written in one unit of work. Updates and deletes first take
//! back the previous completed contribution, so moving a transaction in or
//! out of `completed` is always reflected in the balances.

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, Value,
};
use tala_core::ledger::LedgerError;
use tala_core::trade::{
    CaratDelta, CreateTransactionInput, PreparedItem, TransactionTotals, merge_carat_deltas,
    plan_transaction_effects, prepare_items,
};
use tala_shared::config::LedgerConfig;
use tala_shared::types::{
    ContactId, PageRequest, PageResponse, ProductId, TransactionId, TransactionItemId,
};
use tracing::{debug, info, instrument};

use super::carat_inventory::apply_delta_in;
use super::contact_weight_ledger::{RecordWeightEntryInput, append_entry, delete_entries_where};
use super::inventory_ledger::{RecordMovementInput, append_movement, delete_movements_where};
use super::product::load_profiles;
use super::unit_of_work::{lock_contacts, lock_products, lock_transaction, with_retry};
use crate::entities::sea_orm_active_enums::{DeliveryStatus, TransactionType};
use crate::entities::{
    contact_weight_ledger, contacts, inventory_ledger, payments, transaction_items, transactions,
};
use crate::error::RepositoryError;

/// Filter options for listing transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Filter by counterparty.
    pub contact_id: Option<ContactId>,
    /// Filter by transaction type.
    pub transaction_type: Option<TransactionType>,
    /// Filter by delivery status.
    pub delivery_status: Option<DeliveryStatus>,
    /// Filter by date range start.
    pub date_from: Option<NaiveDate>,
    /// Filter by date range end.
    pub date_to: Option<NaiveDate>,
}

/// Transaction with its items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionWithItems {
    /// Transaction header.
    pub transaction: transactions::Model,
    /// Items in insertion order.
    pub items: Vec<transaction_items::Model>,
}

/// Transaction repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
    max_write_attempts: u32,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
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

    /// Creates a transaction with its items and, if completed, its ledger
    /// effects.
    ///
    /// Header totals are computed from the items.
    ///
    /// # Errors
    ///
    /// Returns a validation error before anything is written, `ContactNotFound`
    /// or `ProductNotFound` for unknown references, `ConsistencyConflict` when
    /// concurrent appends exhaust the retry budget, or a database error. Any
    /// failure rolls back the whole unit.
    #[instrument(skip(self, input), fields(transaction_type = input.transaction_type.as_str(), items = input.items.len()))]
    pub async fn create_transaction(
        &self,
        input: CreateTransactionInput,
    ) -> Result<TransactionWithItems, RepositoryError> {
        let input = &input;
        let created = with_retry(self.max_write_attempts, "create_transaction", move || async move {
            let txn = self.db.begin().await?;
            let prepared = prepare(&txn, input).await?;
            lock_parties(&txn, input.counterparty_contact_id, None, &prepared, &[]).await?;

            let totals = TransactionTotals::from_items(&prepared);
            let mut header = transactions::ActiveModel {
                created_at: Set(Utc::now().into()),
                ..Default::default()
            };
            fill_header(&mut header, input, &totals);
            let transaction = header.insert(&txn).await?;

            let items = insert_items(&txn, transaction.id, &prepared).await?;
            if transaction.delivery_status == DeliveryStatus::Completed {
                post_effects(&txn, &transaction, &prepared, &items).await?;
            }

            txn.commit().await?;
            Ok::<_, RepositoryError>(TransactionWithItems { transaction, items })
        })
        .await?;

        info!(
            transaction_id = created.transaction.id,
            status = ?created.transaction.delivery_status,
            "transaction created"
        );
        Ok(created)
    }

    /// Replaces a transaction's header and items.
    ///
    /// The previous completed contribution is reversed before the new one is
    /// applied; later ledger rows are re-based both ways.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` for an unknown id, plus every error
    /// [`Self::create_transaction`] can return.
    #[instrument(skip(self, input), fields(items = input.items.len()))]
    pub async fn update_transaction(
        &self,
        transaction_id: TransactionId,
        input: CreateTransactionInput,
    ) -> Result<TransactionWithItems, RepositoryError> {
        let input = &input;
        let updated = with_retry(self.max_write_attempts, "update_transaction", move || async move {
            let txn = self.db.begin().await?;
            let (existing, old_items) = lock_with_items(&txn, transaction_id)
                .await?
                .ok_or(LedgerError::TransactionNotFound(transaction_id))?;
            let prepared = prepare(&txn, input).await?;
            lock_parties(
                &txn,
                input.counterparty_contact_id,
                existing.counterparty_contact_id.map(ContactId::new),
                &prepared,
                &old_items,
            )
            .await?;

            take_back(&txn, &existing, &old_items).await?;
            transaction_items::Entity::delete_many()
                .filter(transaction_items::Column::TransactionId.eq(existing.id))
                .exec(&txn)
                .await?;

            let totals = TransactionTotals::from_items(&prepared);
            let mut header: transactions::ActiveModel = existing.into();
            fill_header(&mut header, input, &totals);
            let transaction = header.update(&txn).await?;

            let items = insert_items(&txn, transaction.id, &prepared).await?;
            if transaction.delivery_status == DeliveryStatus::Completed {
                post_effects(&txn, &transaction, &prepared, &items).await?;
            }

            txn.commit().await?;
            Ok::<_, RepositoryError>(TransactionWithItems { transaction, items })
        })
        .await?;

        info!(
            %transaction_id,
            status = ?updated.transaction.delivery_status,
            "transaction updated"
        );
        Ok(updated)
    }

    /// Deletes a transaction, its items and every ledger row it produced.
    ///
    /// Payments that referenced the transaction are kept and detached.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` for an unknown id or a database error.
    #[instrument(skip(self))]
    pub async fn delete_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;
        let (existing, items) = lock_with_items(&txn, transaction_id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(transaction_id))?;
        lock_parties(
            &txn,
            None,
            existing.counterparty_contact_id.map(ContactId::new),
            &[],
            &items,
        )
        .await?;

        take_back(&txn, &existing, &items).await?;

        payments::Entity::update_many()
            .col_expr(payments::Column::RelatedTransactionId, Expr::value(Value::Int(None)))
            .filter(payments::Column::RelatedTransactionId.eq(existing.id))
            .exec(&txn)
            .await?;
        transaction_items::Entity::delete_many()
            .filter(transaction_items::Column::TransactionId.eq(existing.id))
            .exec(&txn)
            .await?;
        transactions::Entity::delete_by_id(existing.id)
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(%transaction_id, items = items.len(), "transaction deleted");
        Ok(())
    }

    /// Gets a transaction with its items.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` for an unknown id or a database error.
    pub async fn get_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<TransactionWithItems, RepositoryError> {
        let (transaction, items) = find_with_items(&self.db, transaction_id)
            .await?
            .ok_or(LedgerError::TransactionNotFound(transaction_id))?;
        Ok(TransactionWithItems { transaction, items })
    }

    /// Lists transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_transactions(
        &self,
        filter: TransactionFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<transactions::Model>, RepositoryError> {
        let mut query = transactions::Entity::find();

        if let Some(contact_id) = filter.contact_id {
            query = query.filter(transactions::Column::CounterpartyContactId.eq(contact_id.into_inner()));
        }
        if let Some(transaction_type) = filter.transaction_type {
            query = query.filter(transactions::Column::TransactionType.eq(transaction_type));
        }
        if let Some(status) = filter.delivery_status {
            query = query.filter(transactions::Column::DeliveryStatus.eq(status));
        }
        if let Some(date_from) = filter.date_from {
            query = query.filter(transactions::Column::TransactionDate.gte(date_from));
        }
        if let Some(date_to) = filter.date_to {
            query = query.filter(transactions::Column::TransactionDate.lte(date_to));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(transactions::Column::TransactionDate)
            .order_by_desc(transactions::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(rows, page, total))
    }
}

// ============================================================================
// Unit-of-work steps
// ============================================================================

/// Loads product profiles and validates the items against them.
async fn prepare<C: ConnectionTrait>(
    conn: &C,
    input: &CreateTransactionInput,
) -> Result<Vec<PreparedItem>, RepositoryError> {
    let profiles = load_profiles(conn, input.items.iter().map(|item| item.product_id)).await?;
    Ok(prepare_items(&input.items, &profiles)?)
}

/// Locks every contact, then every product, the unit will touch.
///
/// `counterparty` must exist; `previous` is the counterparty being replaced.
async fn lock_parties<C: ConnectionTrait>(
    conn: &C,
    counterparty: Option<ContactId>,
    previous: Option<ContactId>,
    prepared: &[PreparedItem],
    old_items: &[transaction_items::Model],
) -> Result<(), RepositoryError> {
    let locked: Vec<contacts::Model> =
        lock_contacts(conn, counterparty.into_iter().chain(previous)).await?;
    if let Some(contact_id) = counterparty
        && !locked.iter().any(|contact| contact.id == contact_id.into_inner())
    {
        return Err(LedgerError::ContactNotFound(contact_id).into());
    }

    lock_products(
        conn,
        prepared
            .iter()
            .map(|item| item.input.product_id)
            .chain(old_items.iter().map(|item| ProductId::new(item.product_id))),
    )
    .await?;
    Ok(())
}

fn fill_header(
    header: &mut transactions::ActiveModel,
    input: &CreateTransactionInput,
    totals: &TransactionTotals,
) {
    header.transaction_type = Set(input.transaction_type.into());
    header.transaction_date = Set(input.transaction_date);
    header.counterparty_contact_id = Set(input.counterparty_contact_id.map(ContactId::into_inner));
    header.delivery_status = Set(input.delivery_status.into());
    header.total_items_value_rials = Set(totals.total_items_value_rials);
    header.total_profit_wage_commission_rials = Set(totals.total_profit_wage_commission_rials);
    header.total_general_tax_rials = Set(totals.total_general_tax_rials);
    header.total_before_vat_rials = Set(totals.total_before_vat_rials);
    header.total_vat_rials = Set(totals.total_vat_rials);
    header.final_payable_amount_rials = Set(totals.final_payable_amount_rials);
    header.mazaneh_price = Set(input.mazaneh_price);
    header.notes = Set(input.notes.clone());
    header.updated_at = Set(Utc::now().into());
}

async fn insert_items<C: ConnectionTrait>(
    conn: &C,
    transaction_id: i32,
    prepared: &[PreparedItem],
) -> Result<Vec<transaction_items::Model>, RepositoryError> {
    let mut items = Vec::with_capacity(prepared.len());
    for item in prepared {
        let details = item
            .input
            .details
            .to_json()
            .map_err(|err| LedgerError::Internal(format!("item details: {err}")))?;
        let charges = &item.input.charges;
        let row = transaction_items::ActiveModel {
            transaction_id: Set(transaction_id),
            product_id: Set(item.input.product_id.into_inner()),
            quantity: Set(item.input.quantity),
            weight_grams: Set(item.input.weight_grams),
            carat: Set(item.input.carat),
            unit_price_rials: Set(item.input.unit_price_rials),
            total_value_rials: Set(item.total_value_rials),
            wage_rials: Set(charges.wage_rials),
            profit_rials: Set(charges.profit_rials),
            fee_rials: Set(charges.fee_rials),
            general_tax_rials: Set(charges.general_tax_rials),
            vat_rials: Set(charges.vat_rials),
            line_total_rials: Set(item.line_total_rials),
            details: Set(details),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        items.push(row);
    }
    Ok(items)
}

/// Writes the ledger effects of a completed transaction.
async fn post_effects<C: ConnectionTrait>(
    conn: &C,
    transaction: &transactions::Model,
    prepared: &[PreparedItem],
    items: &[transaction_items::Model],
) -> Result<(), RepositoryError> {
    let transaction_id = TransactionId::new(transaction.id);
    let date = transaction.transaction_date;
    let effects = plan_transaction_effects(
        transaction.transaction_type.into(),
        transaction.counterparty_contact_id.map(ContactId::new),
        prepared,
    );

    for (effect, item) in effects.iter().zip(items) {
        let movement = RecordMovementInput {
            transaction_id: Some(transaction_id),
            transaction_item_id: Some(TransactionItemId::new(item.id)),
            ..RecordMovementInput::from_delta(&effect.inventory, date)
        };
        append_movement(conn, &movement).await?;

        if let Some(weight) = &effect.contact_weight {
            let entry = RecordWeightEntryInput {
                related_transaction_id: Some(transaction_id),
                ..RecordWeightEntryInput::from_delta(weight, date)
            };
            append_entry(conn, &entry).await?;
        }
    }

    for delta in merge_carat_deltas(effects.iter().filter_map(|effect| effect.carat)) {
        apply_delta_in(conn, &delta).await?;
    }
    debug!(transaction_id = transaction.id, lines = effects.len(), "ledger effects posted");
    Ok(())
}

/// Removes the ledger rows of a transaction and, if it was completed, takes
/// its carat deltas back out of the buckets.
async fn take_back<C: ConnectionTrait>(
    conn: &C,
    transaction: &transactions::Model,
    items: &[transaction_items::Model],
) -> Result<(), RepositoryError> {
    let movements = delete_movements_where(
        conn,
        inventory_ledger::Column::TransactionId.eq(transaction.id),
    )
    .await?;
    let entries = delete_entries_where(
        conn,
        contact_weight_ledger::Column::RelatedTransactionId.eq(transaction.id),
    )
    .await?;

    if transaction.delivery_status == DeliveryStatus::Completed {
        for delta in stored_carat_reversals(transaction.transaction_type, items) {
            apply_delta_in(conn, &delta).await?;
        }
    }
    debug!(
        transaction_id = transaction.id,
        movements = movements.len(),
        entries = entries.len(),
        "previous ledger effects removed"
    );
    Ok(())
}

/// Negated carat deltas of stored items.
fn stored_carat_reversals(
    transaction_type: TransactionType,
    items: &[transaction_items::Model],
) -> Vec<CaratDelta> {
    let sign = tala_core::trade::TransactionType::from(transaction_type).stock_sign();
    merge_carat_deltas(items.iter().filter_map(|item| {
        let carat = item.carat?;
        let weight = item.weight_grams?;
        Some(
            CaratDelta {
                carat,
                weight_delta: sign * weight,
                value_delta: sign * item.total_value_rials,
            }
            .reversed(),
        )
    }))
}

type StoredTransaction = (transactions::Model, Vec<transaction_items::Model>);

async fn find_with_items<C: ConnectionTrait>(
    conn: &C,
    transaction_id: TransactionId,
) -> Result<Option<StoredTransaction>, sea_orm::DbErr> {
    let Some(transaction) = transactions::Entity::find_by_id(transaction_id.into_inner())
        .one(conn)
        .await?
    else {
        return Ok(None);
    };
    let items = load_items(conn, transaction.id).await?;
    Ok(Some((transaction, items)))
}

/// Like [`find_with_items`], but holds the header lock so a concurrent update
/// or delete of the same transaction waits until this unit commits.
async fn lock_with_items<C: ConnectionTrait>(
    conn: &C,
    transaction_id: TransactionId,
) -> Result<Option<StoredTransaction>, sea_orm::DbErr> {
    let Some(transaction) = lock_transaction(conn, transaction_id).await? else {
        return Ok(None);
    };
    let items = load_items(conn, transaction.id).await?;
    Ok(Some((transaction, items)))
}

async fn load_items<C: ConnectionTrait>(
    conn: &C,
    transaction_id: i32,
) -> Result<Vec<transaction_items::Model>, sea_orm::DbErr> {
    transaction_items::Entity::find()
        .filter(transaction_items::Column::TransactionId.eq(transaction_id))
        .order_by_asc(transaction_items::Column::Id)
        .all(conn)
        .await
}
