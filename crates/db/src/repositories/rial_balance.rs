//! Contact rial balance repository.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use tala_core::rial::{
    ContactBalance, DebtorsAndCreditors, PendingSummary, RialContributions,
    partition_debtors_creditors,
};
use tala_shared::config::LedgerConfig;
use tala_shared::types::{ContactId, Rials};
use tracing::warn;

use crate::entities::sea_orm_active_enums::{DeliveryStatus, TransactionType};
use crate::entities::{contacts, payments, transactions};
use crate::error::RepositoryError;

/// Contact rial balance repository.
#[derive(Debug, Clone)]
pub struct RialBalanceRepository {
    db: DatabaseConnection,
    debtor_threshold: Rials,
}

impl RialBalanceRepository {
    /// Creates a new rial balance repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_config(db, &LedgerConfig::default())
    }

    /// Creates a repository using the given ledger settings.
    #[must_use]
    pub const fn with_config(db: DatabaseConnection, config: &LedgerConfig) -> Self {
        Self {
            db,
            debtor_threshold: config.debtor_threshold_rials,
        }
    }

    /// Current balance; positive means the contact owes the business.
    ///
    /// A store failure is logged and yields zero.
    pub async fn calculate_balance(&self, contact_id: ContactId) -> Rials {
        match contributions(&self.db, contact_id, None).await {
            Ok(parts) => parts.balance(),
            Err(err) => {
                warn!(%contact_id, error = %err, "rial balance unavailable, using zero");
                Decimal::ZERO
            }
        }
    }

    /// Balance from activity dated strictly before `date`; zero when `date`
    /// is `None`.
    ///
    /// A store failure is logged and yields zero.
    pub async fn calculate_balance_before_date(
        &self,
        contact_id: ContactId,
        date: Option<NaiveDate>,
    ) -> Rials {
        let Some(date) = date else {
            return Decimal::ZERO;
        };
        match contributions(&self.db, contact_id, Some(date)).await {
            Ok(parts) => parts.balance(),
            Err(err) => {
                warn!(%contact_id, error = %err, "opening rial balance unavailable, using zero");
                Decimal::ZERO
            }
        }
    }

    /// The four sums behind a balance.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub async fn contributions(
        &self,
        contact_id: ContactId,
        before: Option<NaiveDate>,
    ) -> Result<RialContributions, RepositoryError> {
        Ok(contributions(&self.db, contact_id, before).await?)
    }

    /// Contacts owing the business and contacts the business owes.
    ///
    /// `threshold` defaults to the configured debtor threshold. A store
    /// failure is logged and yields empty lists.
    pub async fn get_debtors_and_creditors(&self, threshold: Option<Rials>) -> DebtorsAndCreditors {
        let threshold = threshold.unwrap_or(self.debtor_threshold);
        match self.all_balances().await {
            Ok(balances) => partition_debtors_creditors(balances, threshold),
            Err(err) => {
                warn!(error = %err, "debtor list unavailable");
                DebtorsAndCreditors::default()
            }
        }
    }

    /// Pending trades with a contact, which never enter its balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn pending_summary(
        &self,
        contact_id: ContactId,
    ) -> Result<PendingSummary, RepositoryError> {
        let rows: Vec<(DeliveryStatus, i64, Option<Decimal>)> = transactions::Entity::find()
            .select_only()
            .column(transactions::Column::DeliveryStatus)
            .column_as(transactions::Column::Id.count(), "pending_count")
            .column_as(transactions::Column::FinalPayableAmountRials.sum(), "pending_total")
            .filter(transactions::Column::CounterpartyContactId.eq(contact_id.into_inner()))
            .filter(transactions::Column::DeliveryStatus.is_in([
                DeliveryStatus::PendingReceipt,
                DeliveryStatus::PendingDelivery,
            ]))
            .group_by(transactions::Column::DeliveryStatus)
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut summary = PendingSummary::default();
        for (status, count, total) in rows {
            let count = u64::try_from(count).unwrap_or_default();
            let total = total.unwrap_or_default();
            match status {
                DeliveryStatus::PendingReceipt => {
                    summary.pending_receipt_count = count;
                    summary.pending_receipt_total = total;
                }
                DeliveryStatus::PendingDelivery => {
                    summary.pending_delivery_count = count;
                    summary.pending_delivery_total = total;
                }
                DeliveryStatus::Completed | DeliveryStatus::Cancelled => {}
            }
        }
        Ok(summary)
    }

    async fn all_balances(&self) -> Result<Vec<ContactBalance>, DbErr> {
        let mut parts: HashMap<i32, RialContributions> = HashMap::new();

        let trades: Vec<(Option<i32>, TransactionType, Option<Decimal>)> =
            transactions::Entity::find()
                .select_only()
                .column(transactions::Column::CounterpartyContactId)
                .column(transactions::Column::TransactionType)
                .column_as(transactions::Column::FinalPayableAmountRials.sum(), "total")
                .filter(transactions::Column::DeliveryStatus.eq(DeliveryStatus::Completed))
                .filter(transactions::Column::CounterpartyContactId.is_not_null())
                .group_by(transactions::Column::CounterpartyContactId)
                .group_by(transactions::Column::TransactionType)
                .into_tuple()
                .all(&self.db)
                .await?;
        for (contact, transaction_type, total) in trades {
            let Some(contact) = contact else { continue };
            let entry = parts.entry(contact).or_default();
            match transaction_type {
                TransactionType::Sell => entry.completed_sells += total.unwrap_or_default(),
                TransactionType::Buy => entry.completed_buys += total.unwrap_or_default(),
            }
        }

        for (contact, total) in payment_totals(&self.db, payments::Column::PayingContactId).await? {
            parts.entry(contact).or_default().paid_by_contact += total;
        }
        for (contact, total) in
            payment_totals(&self.db, payments::Column::ReceivingContactId).await?
        {
            parts.entry(contact).or_default().received_by_contact += total;
        }

        let names: Vec<(i32, String)> = contacts::Entity::find()
            .select_only()
            .column(contacts::Column::Id)
            .column(contacts::Column::Name)
            .order_by_asc(contacts::Column::Id)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(names
            .into_iter()
            .map(|(id, name)| ContactBalance {
                contact_id: ContactId::new(id),
                contact_name: name,
                balance: parts.get(&id).map_or(Decimal::ZERO, RialContributions::balance),
            })
            .collect())
    }
}

/// Payment sums per contact on one side of the payment.
async fn payment_totals<C: ConnectionTrait>(
    conn: &C,
    side: payments::Column,
) -> Result<Vec<(i32, Rials)>, DbErr> {
    let rows: Vec<(Option<i32>, Option<Decimal>)> = payments::Entity::find()
        .select_only()
        .column(side)
        .column_as(payments::Column::AmountRials.sum(), "total")
        .filter(side.is_not_null())
        .group_by(side)
        .into_tuple()
        .all(conn)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(contact, total)| contact.map(|id| (id, total.unwrap_or_default())))
        .collect())
}

/// The four sums of one contact, restricted to dates before `before`.
pub(crate) async fn contributions<C: ConnectionTrait>(
    conn: &C,
    contact_id: ContactId,
    before: Option<NaiveDate>,
) -> Result<RialContributions, DbErr> {
    Ok(RialContributions {
        completed_sells: trade_total(conn, contact_id, TransactionType::Sell, before).await?,
        completed_buys: trade_total(conn, contact_id, TransactionType::Buy, before).await?,
        paid_by_contact: payment_total(conn, contact_id, payments::Column::PayingContactId, before)
            .await?,
        received_by_contact: payment_total(
            conn,
            contact_id,
            payments::Column::ReceivingContactId,
            before,
        )
        .await?,
    })
}

async fn trade_total<C: ConnectionTrait>(
    conn: &C,
    contact_id: ContactId,
    transaction_type: TransactionType,
    before: Option<NaiveDate>,
) -> Result<Rials, DbErr> {
    let mut query = transactions::Entity::find()
        .select_only()
        .column_as(transactions::Column::FinalPayableAmountRials.sum(), "total")
        .filter(transactions::Column::CounterpartyContactId.eq(contact_id.into_inner()))
        .filter(transactions::Column::TransactionType.eq(transaction_type))
        .filter(transactions::Column::DeliveryStatus.eq(DeliveryStatus::Completed));
    if let Some(date) = before {
        query = query.filter(transactions::Column::TransactionDate.lt(date));
    }
    let total: Option<Option<Decimal>> = query.into_tuple().one(conn).await?;
    Ok(total.flatten().unwrap_or_default())
}

async fn payment_total<C: ConnectionTrait>(
    conn: &C,
    contact_id: ContactId,
    side: payments::Column,
    before: Option<NaiveDate>,
) -> Result<Rials, DbErr> {
    let mut query = payments::Entity::find()
        .select_only()
        .column_as(payments::Column::AmountRials.sum(), "total")
        .filter(side.eq(contact_id.into_inner()));
    if let Some(date) = before {
        query = query.filter(payments::Column::PaymentDate.lt(date));
    }
    let total: Option<Option<Decimal>> = query.into_tuple().one(conn).await?;
    Ok(total.flatten().unwrap_or_default())
}
