//! Inventory ledger repository.
//!
//! One append-only chain per product, ordered by `(movement_date, id)`.
//! Back-dated appends and deletions shift the balances of every later row of
//! the same product by one additive `UPDATE`, so each row's balance always
//! equals its predecessor's balance plus its own change.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tala_core::carat::validate_carat;
use tala_core::ledger::{
    ChainLink, ChainViolation, LedgerError, MovementType, RunningBalance, StockLevel, find_chain_violations,
    value_at_average, value_inflow,
};
use tala_core::trade::{CaratDelta, InventoryDelta, MovementValuation};
use tala_shared::config::LedgerConfig;
use tala_shared::types::{Grams, ProductId, Rials, SettlementId, TransactionId, TransactionItemId};
use tracing::{debug, info, instrument, warn};

use super::carat_inventory::apply_delta_in;
use super::unit_of_work::{lock_products, with_retry};
use crate::entities::inventory_ledger;
use crate::error::{RepositoryError, version_conflict};

/// One inventory movement to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMovementInput {
    /// Product whose stock moves.
    pub product_id: ProductId,
    /// Business date of the movement.
    pub movement_date: NaiveDate,
    /// Row kind.
    pub movement_type: MovementType,
    /// Signed unit change.
    pub change_quantity: i32,
    /// Signed scale-weight change.
    pub change_weight_grams: Grams,
    /// Purity of the moved gold.
    pub carat: Option<i32>,
    /// Valuation rule.
    pub valuation: MovementValuation,
    /// Owning transaction.
    pub transaction_id: Option<TransactionId>,
    /// Owning transaction item.
    pub transaction_item_id: Option<TransactionItemId>,
    /// Owning settlement.
    pub settlement_id: Option<SettlementId>,
    /// Free-form notes.
    pub notes: Option<String>,
}

impl RecordMovementInput {
    /// Builds the input for a planned delta.
    #[must_use]
    pub fn from_delta(delta: &InventoryDelta, movement_date: NaiveDate) -> Self {
        Self {
            product_id: delta.product_id,
            movement_date,
            movement_type: delta.movement_type,
            change_quantity: delta.change_quantity,
            change_weight_grams: delta.change_weight_grams,
            carat: delta.carat,
            valuation: delta.valuation,
            transaction_id: None,
            transaction_item_id: None,
            settlement_id: None,
            notes: None,
        }
    }
}

/// A manual stock correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryAdjustmentInput {
    /// Product to correct.
    pub product_id: ProductId,
    /// Business date of the correction.
    pub movement_date: NaiveDate,
    /// Signed unit change.
    pub change_quantity: i32,
    /// Signed scale-weight change.
    pub change_weight_grams: Grams,
    /// Purity; the matching carat bucket moves too when set.
    pub carat: Option<i32>,
    /// Stated value of an inflow. Outflows and unpriced inflows use average cost.
    pub total_value_rials: Option<Rials>,
    /// Reason for the correction.
    pub notes: Option<String>,
}

/// Inventory ledger repository.
#[derive(Debug, Clone)]
pub struct InventoryLedgerRepository {
    db: DatabaseConnection,
    max_write_attempts: u32,
}

impl InventoryLedgerRepository {
    /// Creates a new inventory ledger repository.
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

    /// Current stock of a product: the balance of its latest row.
    ///
    /// A product without history has zero stock. A store failure is logged
    /// and also yields zero.
    pub async fn get_current_balance(&self, product_id: ProductId) -> StockLevel {
        match level_as_of(&self.db, product_id, None).await {
            Ok(level) => level,
            Err(err) => {
                warn!(%product_id, error = %err, "inventory balance unavailable, using zero");
                StockLevel::zero()
            }
        }
    }

    /// Appends one movement in its own unit of work.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist, the carat is invalid,
    /// or the write keeps conflicting with concurrent appends.
    #[instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn record_movement(
        &self,
        input: RecordMovementInput,
    ) -> Result<inventory_ledger::Model, RepositoryError> {
        let input = &input;
        with_retry(self.max_write_attempts, "record_movement", move || async move {
            let txn = self.db.begin().await?;
            ensure_product_locked(&txn, input.product_id).await?;
            if let Some(carat) = input.carat {
                validate_carat(carat)?;
            }
            let row = append_movement(&txn, input).await?;
            txn.commit().await?;
            Ok::<_, RepositoryError>(row)
        })
        .await
    }

    /// Records a manual stock correction and moves the carat bucket with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist, the carat is invalid,
    /// or the write keeps conflicting with concurrent appends.
    #[instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn record_adjustment(
        &self,
        input: InventoryAdjustmentInput,
    ) -> Result<inventory_ledger::Model, RepositoryError> {
        let inflow = input.change_weight_grams > Decimal::ZERO
            || (input.change_weight_grams.is_zero() && input.change_quantity > 0);
        let valuation = match input.total_value_rials {
            Some(total) if inflow => MovementValuation::Stated(total),
            _ => MovementValuation::AverageCost,
        };
        let movement = RecordMovementInput {
            product_id: input.product_id,
            movement_date: input.movement_date,
            movement_type: MovementType::Adjustment,
            change_quantity: input.change_quantity,
            change_weight_grams: input.change_weight_grams,
            carat: input.carat,
            valuation,
            transaction_id: None,
            transaction_item_id: None,
            settlement_id: None,
            notes: input.notes.clone(),
        };

        let movement = &movement;
        let row = with_retry(self.max_write_attempts, "record_adjustment", move || async move {
            let txn = self.db.begin().await?;
            ensure_product_locked(&txn, movement.product_id).await?;
            if let Some(carat) = movement.carat {
                validate_carat(carat)?;
            }
            let row = append_movement(&txn, movement).await?;
            if let Some(carat) = movement.carat {
                apply_delta_in(
                    &txn,
                    &CaratDelta {
                        carat,
                        weight_delta: movement.change_weight_grams,
                        value_delta: row_change(&row).value_rials,
                    },
                )
                .await?;
            }
            txn.commit().await?;
            Ok::<_, RepositoryError>(row)
        })
        .await?;

        info!(entry_id = row.id, "inventory adjustment recorded");
        Ok(row)
    }

    /// Deletes every movement of a transaction and re-bases later rows.
    ///
    /// The affected products are locked first, so no append to the same
    /// chain can read a balance that still includes the deleted rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    #[instrument(skip(self))]
    pub async fn delete_movements_for_transaction(
        &self,
        transaction_id: TransactionId,
    ) -> Result<usize, RepositoryError> {
        let owned = inventory_ledger::Column::TransactionId.eq(transaction_id.into_inner());
        let txn = self.db.begin().await?;
        let product_ids: Vec<i32> = inventory_ledger::Entity::find()
            .select_only()
            .column(inventory_ledger::Column::ProductId)
            .filter(owned.clone())
            .into_tuple()
            .all(&txn)
            .await?;
        lock_products(&txn, product_ids.into_iter().map(ProductId::new)).await?;

        let deleted = delete_movements_where(&txn, owned).await?;
        txn.commit().await?;
        info!(%transaction_id, count = deleted.len(), "transaction movements deleted");
        Ok(deleted.len())
    }

    /// Every movement of a product in chain order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn movements(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<inventory_ledger::Model>, RepositoryError> {
        Ok(chain_query(product_id).all(&self.db).await?)
    }

    /// Rows whose stored balance differs from predecessor balance plus change.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn verify_chain(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ChainViolation<StockLevel>>, RepositoryError> {
        let links: Vec<ChainLink<StockLevel>> = self
            .movements(product_id)
            .await?
            .iter()
            .map(|row| ChainLink {
                entry_id: row.id,
                change: row_change(row),
                balance_after: row_level(row),
            })
            .collect();
        Ok(find_chain_violations(&links))
    }
}

fn chain_query(product_id: ProductId) -> sea_orm::Select<inventory_ledger::Entity> {
    inventory_ledger::Entity::find()
        .filter(inventory_ledger::Column::ProductId.eq(product_id.into_inner()))
        .order_by_asc(inventory_ledger::Column::MovementDate)
        .order_by_asc(inventory_ledger::Column::Id)
}

async fn ensure_product_locked<C: ConnectionTrait>(
    conn: &C,
    product_id: ProductId,
) -> Result<(), RepositoryError> {
    if lock_products(conn, [product_id]).await?.is_empty() {
        return Err(LedgerError::ProductNotFound(product_id).into());
    }
    Ok(())
}

/// Balance after a row.
pub(crate) fn row_level(row: &inventory_ledger::Model) -> StockLevel {
    StockLevel::new(
        row.balance_quantity_after_movement,
        row.balance_weight_grams_after_movement,
        row.balance_total_value_after_movement.unwrap_or_default(),
    )
}

/// Change carried by a row.
pub(crate) fn row_change(row: &inventory_ledger::Model) -> StockLevel {
    StockLevel::new(
        row.change_quantity,
        row.change_weight_grams,
        row.total_value_in.unwrap_or_default() - row.total_value_out.unwrap_or_default(),
    )
}

/// Stock of a product after the last row dated on or before `date`, or after
/// its latest row when `date` is `None`.
pub(crate) async fn level_as_of<C: ConnectionTrait>(
    conn: &C,
    product_id: ProductId,
    date: Option<NaiveDate>,
) -> Result<StockLevel, DbErr> {
    let mut query = inventory_ledger::Entity::find()
        .filter(inventory_ledger::Column::ProductId.eq(product_id.into_inner()));
    if let Some(date) = date {
        query = query.filter(inventory_ledger::Column::MovementDate.lte(date));
    }
    let latest = query
        .order_by_desc(inventory_ledger::Column::MovementDate)
        .order_by_desc(inventory_ledger::Column::Id)
        .one(conn)
        .await?;
    Ok(latest.as_ref().map_or_else(StockLevel::zero, row_level))
}

async fn last_version<C: ConnectionTrait>(conn: &C, product_id: ProductId) -> Result<i64, DbErr> {
    Ok(inventory_ledger::Entity::find()
        .filter(inventory_ledger::Column::ProductId.eq(product_id.into_inner()))
        .order_by_desc(inventory_ledger::Column::EntryVersion)
        .one(conn)
        .await?
        .map_or(0, |row| row.entry_version))
}

/// Appends one movement on `conn`. The caller holds the product lock.
pub(crate) async fn append_movement<C: ConnectionTrait>(
    conn: &C,
    input: &RecordMovementInput,
) -> Result<inventory_ledger::Model, RepositoryError> {
    let version = last_version(conn, input.product_id).await?;
    let preceding = level_as_of(conn, input.product_id, Some(input.movement_date)).await?;

    let value = match input.valuation {
        MovementValuation::Stated(total) => {
            value_inflow(input.change_weight_grams, input.change_quantity, total)
        }
        MovementValuation::AverageCost => {
            value_at_average(&preceding, input.change_weight_grams, input.change_quantity)
        }
    };
    let change = StockLevel::new(input.change_quantity, input.change_weight_grams, value.net());
    let running = RunningBalance::append(version, preceding, change);

    let row = inventory_ledger::ActiveModel {
        product_id: Set(input.product_id.into_inner()),
        transaction_id: Set(input.transaction_id.map(TransactionId::into_inner)),
        transaction_item_id: Set(input.transaction_item_id.map(TransactionItemId::into_inner)),
        settlement_id: Set(input.settlement_id.map(SettlementId::into_inner)),
        movement_date: Set(input.movement_date),
        movement_type: Set(input.movement_type.into()),
        entry_version: Set(running.entry_version),
        change_quantity: Set(change.quantity),
        change_weight_grams: Set(change.weight_grams),
        balance_quantity_after_movement: Set(running.current_balance.quantity),
        balance_weight_grams_after_movement: Set(running.current_balance.weight_grams),
        carat: Set(input.carat),
        price_per_unit_at_movement: Set(Some(value.price_per_unit)),
        total_value_in: Set(Some(value.value_in)),
        total_value_out: Set(Some(value.value_out)),
        balance_total_value_after_movement: Set(Some(running.current_balance.value_rials)),
        notes: Set(input.notes.clone()),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(version_conflict)?;

    let shifted = shift_later(conn, input.product_id, row.movement_date, row.id, change).await?;
    debug!(
        entry_id = row.id,
        entry_version = row.entry_version,
        shifted,
        "inventory movement appended"
    );
    Ok(row)
}

/// Deletes the matching rows on `conn`, re-basing later rows of each product.
///
/// Returns the deleted rows.
pub(crate) async fn delete_movements_where<C: ConnectionTrait>(
    conn: &C,
    condition: impl sea_orm::sea_query::IntoCondition,
) -> Result<Vec<inventory_ledger::Model>, DbErr> {
    let rows = inventory_ledger::Entity::find()
        .filter(condition)
        .order_by_asc(inventory_ledger::Column::Id)
        .all(conn)
        .await?;

    for row in &rows {
        shift_later(
            conn,
            ProductId::new(row.product_id),
            row.movement_date,
            row.id,
            -row_change(row),
        )
        .await?;
    }

    if !rows.is_empty() {
        inventory_ledger::Entity::delete_many()
            .filter(inventory_ledger::Column::Id.is_in(rows.iter().map(|row| row.id)))
            .exec(conn)
            .await?;
        debug!(count = rows.len(), "inventory movements deleted");
    }
    Ok(rows)
}

/// Adds `delta` to the balances of every row after `(date, id)`.
async fn shift_later<C: ConnectionTrait>(
    conn: &C,
    product_id: ProductId,
    date: NaiveDate,
    id: i32,
    delta: StockLevel,
) -> Result<u64, DbErr> {
    if delta == StockLevel::zero() {
        return Ok(0);
    }

    let result = inventory_ledger::Entity::update_many()
        .col_expr(
            inventory_ledger::Column::BalanceQuantityAfterMovement,
            Expr::col(inventory_ledger::Column::BalanceQuantityAfterMovement).add(delta.quantity),
        )
        .col_expr(
            inventory_ledger::Column::BalanceWeightGramsAfterMovement,
            Expr::col(inventory_ledger::Column::BalanceWeightGramsAfterMovement)
                .add(delta.weight_grams),
        )
        .col_expr(
            inventory_ledger::Column::BalanceTotalValueAfterMovement,
            Expr::col(inventory_ledger::Column::BalanceTotalValueAfterMovement)
                .add(delta.value_rials),
        )
        .filter(inventory_ledger::Column::ProductId.eq(product_id.into_inner()))
        .filter(
            Condition::any()
                .add(inventory_ledger::Column::MovementDate.gt(date))
                .add(
                    Condition::all()
                        .add(inventory_ledger::Column::MovementDate.eq(date))
                        .add(inventory_ledger::Column::Id.gt(id)),
                ),
        )
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}
