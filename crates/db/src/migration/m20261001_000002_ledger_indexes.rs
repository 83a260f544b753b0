//! Ledger version and lookup indexes.
//!
//! The unique `(key, entry_version)` indexes turn a lost race between two
//! writers appending to the same ledger key into a constraint violation.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("uq_inventory_ledger_product_version")
                    .table(InventoryLedger::Table)
                    .col(InventoryLedger::ProductId)
                    .col(InventoryLedger::EntryVersion)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_ledger_product_date")
                    .table(InventoryLedger::Table)
                    .col(InventoryLedger::ProductId)
                    .col(InventoryLedger::MovementDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_ledger_transaction")
                    .table(InventoryLedger::Table)
                    .col(InventoryLedger::TransactionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_contact_weight_ledger_key_version")
                    .table(ContactWeightLedger::Table)
                    .col(ContactWeightLedger::ContactId)
                    .col(ContactWeightLedger::ProductCategoryId)
                    .col(ContactWeightLedger::EntryVersion)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_contact_weight_ledger_contact_date")
                    .table(ContactWeightLedger::Table)
                    .col(ContactWeightLedger::ContactId)
                    .col(ContactWeightLedger::EventDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_counterparty_date")
                    .table(Transactions::Table)
                    .col(Transactions::CounterpartyContactId)
                    .col(Transactions::TransactionDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transaction_items_transaction")
                    .table(TransactionItems::Table)
                    .col(TransactionItems::TransactionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table) in [
            ("idx_transaction_items_transaction", TransactionItems::Table.into_iden()),
            ("idx_transactions_counterparty_date", Transactions::Table.into_iden()),
            ("idx_contact_weight_ledger_contact_date", ContactWeightLedger::Table.into_iden()),
            ("uq_contact_weight_ledger_key_version", ContactWeightLedger::Table.into_iden()),
            ("idx_inventory_ledger_transaction", InventoryLedger::Table.into_iden()),
            ("idx_inventory_ledger_product_date", InventoryLedger::Table.into_iden()),
            ("uq_inventory_ledger_product_version", InventoryLedger::Table.into_iden()),
        ] {
            manager
                .drop_index(Index::drop().name(name).table(table).to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum InventoryLedger {
    Table,
    ProductId,
    EntryVersion,
    MovementDate,
    TransactionId,
}

#[derive(DeriveIden)]
enum ContactWeightLedger {
    Table,
    ContactId,
    ProductCategoryId,
    EntryVersion,
    EventDate,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    CounterpartyContactId,
    TransactionDate,
}

#[derive(DeriveIden)]
enum TransactionItems {
    Table,
    TransactionId,
}
