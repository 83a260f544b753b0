//! Unified contact statement repository.
//!
//! Loads completed transaction items, payments and physical settlement items
//! of one contact and hands them to the classification in `tala_core::statement`.

use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult,
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use tala_core::statement::{
    ItemStatementRow, PaymentStatementRow, SettlementStatementRow, Statement, StatementBalance,
    StatementEntry, fold_running, merge_entries,
};
use tala_core::trade::ItemDetails;
use tala_shared::types::{ContactId, Grams, Rials};
use tracing::instrument;

use super::contact_weight_ledger::sum_before;
use super::rial_balance::contributions;
use crate::entities::sea_orm_active_enums::{
    BaseCategory, DeliveryStatus, SettlementDirection, TransactionType,
};
use crate::entities::{
    payments, physical_settlement_items, physical_settlements, product_categories, products,
    transaction_items, transactions,
};
use crate::error::RepositoryError;

#[derive(Debug, FromQueryResult)]
struct ItemRow {
    item_id: i32,
    transaction_id: i32,
    transaction_date: NaiveDate,
    transaction_type: TransactionType,
    product_name: String,
    base_category: BaseCategory,
    quantity: Option<i32>,
    weight_grams: Option<Grams>,
    carat: Option<i32>,
    line_total_rials: Rials,
    details: serde_json::Value,
}

impl From<ItemRow> for ItemStatementRow {
    fn from(row: ItemRow) -> Self {
        let memo_weight_grams = ItemDetails::from_json(row.details)
            .ok()
            .and_then(|details| details.memo_weight());
        Self {
            item_id: row.item_id,
            transaction_id: row.transaction_id,
            transaction_date: row.transaction_date,
            transaction_type: row.transaction_type.into(),
            product_name: row.product_name,
            base_category: row.base_category.into(),
            quantity: row.quantity,
            weight_grams: row.weight_grams,
            carat: row.carat,
            line_total_rials: row.line_total_rials,
            memo_weight_grams,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct SettlementRow {
    item_id: i32,
    settlement_id: i32,
    settlement_date: NaiveDate,
    direction: SettlementDirection,
    product_name: String,
    weight_750: Grams,
}

/// Contact statement repository.
#[derive(Debug, Clone)]
pub struct StatementRepository {
    db: DatabaseConnection,
}

impl StatementRepository {
    /// Creates a new statement repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Merged, date-ordered rows of one contact within the inclusive bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    #[instrument(skip(self))]
    pub async fn build_statement(
        &self,
        contact_id: ContactId,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<StatementEntry>, RepositoryError> {
        let items = item_rows(&self.db, contact_id, start_date, end_date).await?;
        let payments = payment_rows(&self.db, contact_id, start_date, end_date).await?;
        let settlements = settlement_rows(&self.db, contact_id, start_date, end_date).await?;
        Ok(merge_entries(&items, &payments, &settlements))
    }

    /// Statement with opening balances and running rial, weight and count
    /// balances.
    ///
    /// Without a start date the opening balance is zero.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    #[instrument(skip(self))]
    pub async fn statement(
        &self,
        contact_id: ContactId,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Statement, RepositoryError> {
        let opening = match start_date {
            Some(start) => self.opening_balance(contact_id, start).await?,
            None => StatementBalance::default(),
        };
        let entries = self.build_statement(contact_id, start_date, end_date).await?;
        Ok(fold_running(entries, opening, start_date, end_date))
    }

    async fn opening_balance(
        &self,
        contact_id: ContactId,
        start: NaiveDate,
    ) -> Result<StatementBalance, DbErr> {
        Ok(StatementBalance {
            rials: contributions(&self.db, contact_id, Some(start)).await?.net(),
            weight_750: sum_before(&self.db, contact_id, None, start).await?,
            count: count_before(&self.db, contact_id, start).await?,
        })
    }
}

/// Net unit count of countable items traded before `start`: buys minus sells.
async fn count_before<C: ConnectionTrait>(
    conn: &C,
    contact_id: ContactId,
    start: NaiveDate,
) -> Result<i64, DbErr> {
    let rows: Vec<(TransactionType, Option<i64>)> = transaction_items::Entity::find()
        .select_only()
        .column(transactions::Column::TransactionType)
        .column_as(transaction_items::Column::Quantity.sum(), "units")
        .inner_join(transactions::Entity)
        .inner_join(products::Entity)
        .join(JoinType::InnerJoin, products::Relation::ProductCategories.def())
        .filter(transactions::Column::CounterpartyContactId.eq(contact_id.into_inner()))
        .filter(transactions::Column::DeliveryStatus.eq(DeliveryStatus::Completed))
        .filter(transactions::Column::TransactionDate.lt(start))
        .filter(
            product_categories::Column::BaseCategory
                .is_in([BaseCategory::Coin, BaseCategory::Jewelry]),
        )
        .group_by(transactions::Column::TransactionType)
        .into_tuple()
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(transaction_type, units)| match transaction_type {
            TransactionType::Buy => units.unwrap_or_default(),
            TransactionType::Sell => -units.unwrap_or_default(),
        })
        .sum())
}

async fn item_rows<C: ConnectionTrait>(
    conn: &C,
    contact_id: ContactId,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<Vec<ItemStatementRow>, DbErr> {
    let mut query = transaction_items::Entity::find()
        .select_only()
        .column_as(transaction_items::Column::Id, "item_id")
        .column(transaction_items::Column::TransactionId)
        .column(transactions::Column::TransactionDate)
        .column(transactions::Column::TransactionType)
        .column_as(products::Column::Name, "product_name")
        .column(product_categories::Column::BaseCategory)
        .column(transaction_items::Column::Quantity)
        .column(transaction_items::Column::WeightGrams)
        .column(transaction_items::Column::Carat)
        .column(transaction_items::Column::LineTotalRials)
        .column(transaction_items::Column::Details)
        .inner_join(transactions::Entity)
        .inner_join(products::Entity)
        .join(JoinType::InnerJoin, products::Relation::ProductCategories.def())
        .filter(transactions::Column::CounterpartyContactId.eq(contact_id.into_inner()))
        .filter(transactions::Column::DeliveryStatus.eq(DeliveryStatus::Completed));
    if let Some(start) = start_date {
        query = query.filter(transactions::Column::TransactionDate.gte(start));
    }
    if let Some(end) = end_date {
        query = query.filter(transactions::Column::TransactionDate.lte(end));
    }

    let rows = query
        .order_by_asc(transactions::Column::TransactionDate)
        .order_by_asc(transaction_items::Column::Id)
        .into_model::<ItemRow>()
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(ItemStatementRow::from).collect())
}

async fn payment_rows<C: ConnectionTrait>(
    conn: &C,
    contact_id: ContactId,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<Vec<PaymentStatementRow>, DbErr> {
    let contact = contact_id.into_inner();
    let mut query = payments::Entity::find().filter(
        payments::Column::PayingContactId
            .eq(contact)
            .or(payments::Column::ReceivingContactId.eq(contact)),
    );
    if let Some(start) = start_date {
        query = query.filter(payments::Column::PaymentDate.gte(start));
    }
    if let Some(end) = end_date {
        query = query.filter(payments::Column::PaymentDate.lte(end));
    }

    let rows = query
        .order_by_asc(payments::Column::PaymentDate)
        .order_by_asc(payments::Column::Id)
        .all(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| PaymentStatementRow {
            payment_id: row.id,
            payment_date: row.payment_date,
            amount_rials: row.amount_rials,
            contact_is_receiver: row.receiving_contact_id == Some(contact),
            notes: row.notes,
        })
        .collect())
}

async fn settlement_rows<C: ConnectionTrait>(
    conn: &C,
    contact_id: ContactId,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<Vec<SettlementStatementRow>, DbErr> {
    let mut query = physical_settlement_items::Entity::find()
        .select_only()
        .column_as(physical_settlement_items::Column::Id, "item_id")
        .column(physical_settlement_items::Column::SettlementId)
        .column(physical_settlements::Column::SettlementDate)
        .column(physical_settlements::Column::Direction)
        .column_as(products::Column::Name, "product_name")
        .column(physical_settlement_items::Column::Weight750)
        .inner_join(physical_settlements::Entity)
        .inner_join(products::Entity)
        .filter(physical_settlements::Column::ContactId.eq(contact_id.into_inner()));
    if let Some(start) = start_date {
        query = query.filter(physical_settlements::Column::SettlementDate.gte(start));
    }
    if let Some(end) = end_date {
        query = query.filter(physical_settlements::Column::SettlementDate.lte(end));
    }

    let rows = query
        .order_by_asc(physical_settlements::Column::SettlementDate)
        .order_by_asc(physical_settlement_items::Column::Id)
        .into_model::<SettlementRow>()
        .all(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| SettlementStatementRow {
            item_id: row.item_id,
            settlement_id: row.settlement_id,
            settlement_date: row.settlement_date,
            direction: row.direction.into(),
            product_name: row.product_name,
            weight_750: row.weight_750,
        })
        .collect())
}
