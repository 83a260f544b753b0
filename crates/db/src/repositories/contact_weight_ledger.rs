//! Contact weight ledger repository.
//!
//! Gold owed between the business and each contact, per product category, in
//! 750-reference grams. Same chain rules as the inventory ledger, keyed by
//! `(contact_id, product_category_id)`.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tala_core::ledger::{
    ChainLink, ChainViolation, LedgerError, RunningBalance, WeightEventType,
    find_chain_violations,
};
use tala_core::trade::{BaseCategory, ContactWeightDelta};
use tala_shared::config::LedgerConfig;
use tala_shared::types::{CategoryId, ContactId, Grams, SettlementId, TransactionId};
use tracing::{debug, info, instrument, warn};

use super::unit_of_work::{lock_contact, lock_contacts, with_retry};
use crate::entities::{contact_weight_ledger, product_categories};
use crate::error::{RepositoryError, version_conflict};

/// One contact weight entry to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordWeightEntryInput {
    /// Contact whose gold account moves.
    pub contact_id: ContactId,
    /// Category the gold is tracked under.
    pub category_id: CategoryId,
    /// Business date.
    pub event_date: NaiveDate,
    /// Row kind.
    pub event_type: WeightEventType,
    /// Signed 750-reference change.
    pub change_weight_grams: Grams,
    /// Owning transaction.
    pub related_transaction_id: Option<TransactionId>,
    /// Owning settlement.
    pub related_settlement_id: Option<SettlementId>,
    /// Free-form notes.
    pub notes: Option<String>,
}

impl RecordWeightEntryInput {
    /// Builds the input for a planned delta.
    #[must_use]
    pub const fn from_delta(delta: &ContactWeightDelta, event_date: NaiveDate) -> Self {
        Self {
            contact_id: delta.contact_id,
            category_id: delta.category_id,
            event_date,
            event_type: delta.event_type,
            change_weight_grams: delta.change_weight_grams,
            related_transaction_id: None,
            related_settlement_id: None,
            notes: None,
        }
    }
}

/// Latest balance of one contact in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryWeightBalance {
    /// Category.
    pub category_id: CategoryId,
    /// Category display name.
    pub category_name: String,
    /// Category kind.
    pub base_category: BaseCategory,
    /// 750-reference grams; positive means net gold received from the contact.
    pub balance_grams: Grams,
}

/// Contact weight ledger repository.
#[derive(Debug, Clone)]
pub struct ContactWeightLedgerRepository {
    db: DatabaseConnection,
    max_write_attempts: u32,
}

impl ContactWeightLedgerRepository {
    /// Creates a new contact weight ledger repository.
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

    /// Balance after the latest entry, zero when there is none.
    ///
    /// A store failure is logged and yields zero.
    pub async fn get_last_balance(&self, contact_id: ContactId, category_id: CategoryId) -> Grams {
        match balance_as_of(&self.db, contact_id, category_id, None).await {
            Ok(balance) => balance,
            Err(err) => {
                warn!(%contact_id, %category_id, error = %err, "weight balance unavailable, using zero");
                Decimal::ZERO
            }
        }
    }

    /// Sum of changes dated strictly before `date`; zero when `date` is `None`.
    ///
    /// A store failure is logged and yields zero.
    pub async fn get_balance_before_date(
        &self,
        contact_id: ContactId,
        category_id: CategoryId,
        date: Option<NaiveDate>,
    ) -> Grams {
        let Some(date) = date else {
            return Decimal::ZERO;
        };
        match sum_before(&self.db, contact_id, Some(category_id), date).await {
            Ok(sum) => sum,
            Err(err) => {
                warn!(%contact_id, %category_id, error = %err, "opening weight unavailable, using zero");
                Decimal::ZERO
            }
        }
    }

    /// Appends one entry in its own unit of work.
    ///
    /// # Errors
    ///
    /// Returns an error if the contact or category does not exist, or the
    /// write keeps conflicting with concurrent appends.
    #[instrument(skip(self, input), fields(contact_id = %input.contact_id))]
    pub async fn record_entry(
        &self,
        input: RecordWeightEntryInput,
    ) -> Result<contact_weight_ledger::Model, RepositoryError> {
        let input = &input;
        with_retry(self.max_write_attempts, "record_weight_entry", move || async move {
            let txn = self.db.begin().await?;
            lock_contact(&txn, input.contact_id).await?;
            product_categories::Entity::find_by_id(input.category_id.into_inner())
                .one(&txn)
                .await?
                .ok_or(LedgerError::CategoryNotFound(input.category_id))?;
            let row = append_entry(&txn, input).await?;
            txn.commit().await?;
            Ok::<_, RepositoryError>(row)
        })
        .await
    }

    /// Deletes every entry of a transaction and re-bases later rows.
    ///
    /// The affected contacts are locked first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    #[instrument(skip(self))]
    pub async fn delete_by_transaction_id(
        &self,
        transaction_id: TransactionId,
    ) -> Result<usize, RepositoryError> {
        let owned =
            contact_weight_ledger::Column::RelatedTransactionId.eq(transaction_id.into_inner());
        let txn = self.db.begin().await?;
        let contact_ids: Vec<i32> = contact_weight_ledger::Entity::find()
            .select_only()
            .column(contact_weight_ledger::Column::ContactId)
            .filter(owned.clone())
            .into_tuple()
            .all(&txn)
            .await?;
        lock_contacts(&txn, contact_ids.into_iter().map(ContactId::new)).await?;

        let deleted = delete_entries_where(&txn, owned).await?;
        txn.commit().await?;
        info!(%transaction_id, count = deleted.len(), "transaction weight entries deleted");
        Ok(deleted.len())
    }

    /// Entries of one key in chain order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn entries(
        &self,
        contact_id: ContactId,
        category_id: CategoryId,
    ) -> Result<Vec<contact_weight_ledger::Model>, RepositoryError> {
        Ok(contact_weight_ledger::Entity::find()
            .filter(key_condition(contact_id, category_id))
            .order_by_asc(contact_weight_ledger::Column::EventDate)
            .order_by_asc(contact_weight_ledger::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Latest balance of a contact in every category it has entries in.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn balances_for_contact(
        &self,
        contact_id: ContactId,
    ) -> Result<Vec<CategoryWeightBalance>, RepositoryError> {
        let rows = contact_weight_ledger::Entity::find()
            .filter(contact_weight_ledger::Column::ContactId.eq(contact_id.into_inner()))
            .order_by_asc(contact_weight_ledger::Column::EventDate)
            .order_by_asc(contact_weight_ledger::Column::Id)
            .all(&self.db)
            .await?;

        let latest: BTreeMap<i32, Grams> = rows
            .into_iter()
            .map(|row| (row.product_category_id, row.balance_after_grams))
            .collect();
        if latest.is_empty() {
            return Ok(Vec::new());
        }

        let categories = product_categories::Entity::find()
            .filter(product_categories::Column::Id.is_in(latest.keys().copied()))
            .order_by_asc(product_categories::Column::Id)
            .all(&self.db)
            .await?;

        Ok(categories
            .into_iter()
            .map(|category| CategoryWeightBalance {
                category_id: CategoryId::new(category.id),
                balance_grams: latest.get(&category.id).copied().unwrap_or_default(),
                category_name: category.name,
                base_category: category.base_category.into(),
            })
            .collect())
    }

    /// Rows whose stored balance differs from predecessor balance plus change.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn verify_chain(
        &self,
        contact_id: ContactId,
        category_id: CategoryId,
    ) -> Result<Vec<ChainViolation<Grams>>, RepositoryError> {
        let links: Vec<ChainLink<Grams>> = self
            .entries(contact_id, category_id)
            .await?
            .iter()
            .map(|row| ChainLink {
                entry_id: row.id,
                change: row.change_weight_grams,
                balance_after: row.balance_after_grams,
            })
            .collect();
        Ok(find_chain_violations(&links))
    }
}

fn key_condition(contact_id: ContactId, category_id: CategoryId) -> Condition {
    Condition::all()
        .add(contact_weight_ledger::Column::ContactId.eq(contact_id.into_inner()))
        .add(contact_weight_ledger::Column::ProductCategoryId.eq(category_id.into_inner()))
}

/// Balance after the last entry dated on or before `date`, or after the
/// latest entry when `date` is `None`.
pub(crate) async fn balance_as_of<C: ConnectionTrait>(
    conn: &C,
    contact_id: ContactId,
    category_id: CategoryId,
    date: Option<NaiveDate>,
) -> Result<Grams, DbErr> {
    let mut query = contact_weight_ledger::Entity::find().filter(key_condition(contact_id, category_id));
    if let Some(date) = date {
        query = query.filter(contact_weight_ledger::Column::EventDate.lte(date));
    }
    Ok(query
        .order_by_desc(contact_weight_ledger::Column::EventDate)
        .order_by_desc(contact_weight_ledger::Column::Id)
        .one(conn)
        .await?
        .map_or(Decimal::ZERO, |row| row.balance_after_grams))
}

/// Sum of changes before `date`, in one category or across all of them.
pub(crate) async fn sum_before<C: ConnectionTrait>(
    conn: &C,
    contact_id: ContactId,
    category_id: Option<CategoryId>,
    date: NaiveDate,
) -> Result<Grams, DbErr> {
    let mut query = contact_weight_ledger::Entity::find()
        .select_only()
        .column_as(contact_weight_ledger::Column::ChangeWeightGrams.sum(), "total")
        .filter(contact_weight_ledger::Column::ContactId.eq(contact_id.into_inner()))
        .filter(contact_weight_ledger::Column::EventDate.lt(date));
    if let Some(category_id) = category_id {
        query = query
            .filter(contact_weight_ledger::Column::ProductCategoryId.eq(category_id.into_inner()));
    }
    let total: Option<Option<Decimal>> = query.into_tuple().one(conn).await?;
    Ok(total.flatten().unwrap_or_default())
}

async fn last_version<C: ConnectionTrait>(
    conn: &C,
    contact_id: ContactId,
    category_id: CategoryId,
) -> Result<i64, DbErr> {
    Ok(contact_weight_ledger::Entity::find()
        .filter(key_condition(contact_id, category_id))
        .order_by_desc(contact_weight_ledger::Column::EntryVersion)
        .one(conn)
        .await?
        .map_or(0, |row| row.entry_version))
}

/// Appends one entry on `conn`. The caller holds the contact lock.
pub(crate) async fn append_entry<C: ConnectionTrait>(
    conn: &C,
    input: &RecordWeightEntryInput,
) -> Result<contact_weight_ledger::Model, RepositoryError> {
    let version = last_version(conn, input.contact_id, input.category_id).await?;
    let preceding =
        balance_as_of(conn, input.contact_id, input.category_id, Some(input.event_date)).await?;
    let running = RunningBalance::append(version, preceding, input.change_weight_grams);

    let row = contact_weight_ledger::ActiveModel {
        contact_id: Set(input.contact_id.into_inner()),
        product_category_id: Set(input.category_id.into_inner()),
        event_date: Set(input.event_date),
        event_type: Set(input.event_type.into()),
        entry_version: Set(running.entry_version),
        change_weight_grams: Set(input.change_weight_grams),
        balance_after_grams: Set(running.current_balance),
        related_transaction_id: Set(input.related_transaction_id.map(TransactionId::into_inner)),
        related_settlement_id: Set(input.related_settlement_id.map(SettlementId::into_inner)),
        notes: Set(input.notes.clone()),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(version_conflict)?;

    let shifted = shift_later(
        conn,
        input.contact_id,
        input.category_id,
        row.event_date,
        row.id,
        input.change_weight_grams,
    )
    .await?;
    debug!(
        entry_id = row.id,
        entry_version = row.entry_version,
        shifted,
        "contact weight entry appended"
    );
    Ok(row)
}

/// Deletes the matching rows on `conn`, re-basing later rows of each key.
pub(crate) async fn delete_entries_where<C: ConnectionTrait>(
    conn: &C,
    condition: impl sea_orm::sea_query::IntoCondition,
) -> Result<Vec<contact_weight_ledger::Model>, DbErr> {
    let rows = contact_weight_ledger::Entity::find()
        .filter(condition)
        .order_by_asc(contact_weight_ledger::Column::Id)
        .all(conn)
        .await?;

    for row in &rows {
        shift_later(
            conn,
            ContactId::new(row.contact_id),
            CategoryId::new(row.product_category_id),
            row.event_date,
            row.id,
            -row.change_weight_grams,
        )
        .await?;
    }

    if !rows.is_empty() {
        contact_weight_ledger::Entity::delete_many()
            .filter(contact_weight_ledger::Column::Id.is_in(rows.iter().map(|row| row.id)))
            .exec(conn)
            .await?;
        debug!(count = rows.len(), "contact weight entries deleted");
    }
    Ok(rows)
}

async fn shift_later<C: ConnectionTrait>(
    conn: &C,
    contact_id: ContactId,
    category_id: CategoryId,
    date: NaiveDate,
    id: i32,
    delta: Grams,
) -> Result<u64, DbErr> {
    if delta.is_zero() {
        return Ok(0);
    }

    let result = contact_weight_ledger::Entity::update_many()
        .col_expr(
            contact_weight_ledger::Column::BalanceAfterGrams,
            Expr::col(contact_weight_ledger::Column::BalanceAfterGrams).add(delta),
        )
        .filter(key_condition(contact_id, category_id))
        .filter(
            Condition::any()
                .add(contact_weight_ledger::Column::EventDate.gt(date))
                .add(
                    Condition::all()
                        .add(contact_weight_ledger::Column::EventDate.eq(date))
                        .add(contact_weight_ledger::Column::Id.gt(id)),
                ),
        )
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}
