//! Carat inventory repository.
//!
//! Buckets change only through one additive upsert statement, so concurrent
//! writers touching the same carat never overwrite each other.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Alias, Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tala_core::carat::validate_carat;
use tala_core::inventory::{
    CaratBucket, CaratItemTotal, CaratMismatch, CaratSummaryLine, DEFAULT_STOCK_TOLERANCE,
    derive_buckets, find_mismatches, summarize_buckets,
};
use tala_core::trade::CaratDelta;
use tala_shared::types::{Grams, Rials};
use tracing::{debug, instrument, warn};

use crate::entities::sea_orm_active_enums::{DeliveryStatus, TransactionType};
use crate::entities::{carat_inventory, transaction_items, transactions};
use crate::error::RepositoryError;

/// Carat inventory repository.
#[derive(Debug, Clone)]
pub struct CaratInventoryRepository {
    db: DatabaseConnection,
    stock_tolerance: Grams,
}

impl CaratInventoryRepository {
    /// Creates a new carat inventory repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            stock_tolerance: DEFAULT_STOCK_TOLERANCE,
        }
    }

    /// Overrides the zero-stock tolerance used by summaries.
    #[must_use]
    pub const fn with_tolerance(mut self, stock_tolerance: Grams) -> Self {
        self.stock_tolerance = stock_tolerance;
        self
    }

    /// Adds a delta to a carat bucket, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the carat is out of range or the upsert fails.
    #[instrument(skip(self))]
    pub async fn apply_delta(
        &self,
        carat: i32,
        weight_delta: Grams,
        value_delta: Rials,
    ) -> Result<(), RepositoryError> {
        apply_delta_in(
            &self.db,
            &CaratDelta {
                carat,
                weight_delta,
                value_delta,
            },
        )
        .await
    }

    /// Returns every stored bucket ordered by carat.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn buckets(&self) -> Result<Vec<CaratBucket>, RepositoryError> {
        let rows = carat_inventory::Entity::find()
            .order_by_asc(carat_inventory::Column::Carat)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| CaratBucket {
                carat: row.carat,
                total_weight_grams: row.total_weight_grams,
                total_value_rials: row.total_value_rials,
                last_updated: Some(row.last_updated.with_timezone(&Utc)),
            })
            .collect())
    }

    /// Stock summary read from the buckets.
    ///
    /// Dashboard read path: a store failure is logged and yields an empty
    /// summary.
    pub async fn summarize(&self) -> Vec<CaratSummaryLine> {
        match self.buckets().await {
            Ok(buckets) => summarize_buckets(&buckets, self.stock_tolerance),
            Err(err) => {
                warn!(error = %err, "carat summary unavailable");
                Vec::new()
            }
        }
    }

    /// Stock summary recomputed from completed transaction items.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn summarize_from_transactions(
        &self,
    ) -> Result<Vec<CaratSummaryLine>, RepositoryError> {
        let derived = derive_buckets(&self.completed_item_totals().await?);
        Ok(summarize_buckets(&derived, self.stock_tolerance))
    }

    /// Carats whose buckets disagree with the completed transaction items.
    ///
    /// Settlements and manual adjustments move buckets without items, so
    /// their carats are reported here too.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    #[instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<Vec<CaratMismatch>, RepositoryError> {
        let stored = self.buckets().await?;
        let derived = derive_buckets(&self.completed_item_totals().await?);
        let mismatches = find_mismatches(&stored, &derived, self.stock_tolerance);
        if !mismatches.is_empty() {
            warn!(count = mismatches.len(), "carat buckets out of line with transactions");
        }
        Ok(mismatches)
    }

    async fn completed_item_totals(&self) -> Result<Vec<CaratItemTotal>, DbErr> {
        let rows: Vec<(i32, TransactionType, Option<Decimal>, Option<Decimal>)> =
            transaction_items::Entity::find()
                .select_only()
                .column(transaction_items::Column::Carat)
                .column(transactions::Column::TransactionType)
                .column_as(transaction_items::Column::WeightGrams.sum(), "weight_grams")
                .column_as(transaction_items::Column::TotalValueRials.sum(), "value_rials")
                .inner_join(transactions::Entity)
                .filter(transactions::Column::DeliveryStatus.eq(DeliveryStatus::Completed))
                .filter(transaction_items::Column::Carat.is_not_null())
                .filter(transaction_items::Column::WeightGrams.is_not_null())
                .group_by(transaction_items::Column::Carat)
                .group_by(transactions::Column::TransactionType)
                .into_tuple()
                .all(&self.db)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(carat, transaction_type, weight, value)| CaratItemTotal {
                carat,
                transaction_type: transaction_type.into(),
                weight_grams: weight.unwrap_or_default(),
                value_rials: value.unwrap_or_default(),
            })
            .collect())
    }
}

/// Applies one delta on `conn` as a single `INSERT .. ON CONFLICT DO UPDATE`.
pub(crate) async fn apply_delta_in<C: ConnectionTrait>(
    conn: &C,
    delta: &CaratDelta,
) -> Result<(), RepositoryError> {
    validate_carat(delta.carat)?;
    if delta.weight_delta.is_zero() && delta.value_delta.is_zero() {
        return Ok(());
    }

    let bucket = carat_inventory::ActiveModel {
        carat: Set(delta.carat),
        total_weight_grams: Set(delta.weight_delta),
        total_value_rials: Set(delta.value_delta),
        last_updated: Set(Utc::now().into()),
    };

    carat_inventory::Entity::insert(bucket)
        .on_conflict(
            OnConflict::column(carat_inventory::Column::Carat)
                .value(
                    carat_inventory::Column::TotalWeightGrams,
                    additive(carat_inventory::Column::TotalWeightGrams),
                )
                .value(
                    carat_inventory::Column::TotalValueRials,
                    additive(carat_inventory::Column::TotalValueRials),
                )
                .update_column(carat_inventory::Column::LastUpdated)
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    debug!(
        carat = delta.carat,
        weight_delta = %delta.weight_delta,
        value_delta = %delta.value_delta,
        "carat bucket updated"
    );
    Ok(())
}

/// `inventory.col + excluded.col`
fn additive(column: carat_inventory::Column) -> sea_orm::sea_query::SimpleExpr {
    Expr::col((carat_inventory::Entity, column)).add(Expr::col((Alias::new("excluded"), column)))
}
