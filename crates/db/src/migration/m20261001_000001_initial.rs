//! Initial database migration.
//!
//! Creates the catalog, trade, payment, settlement and ledger tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ============================================================
        // PART 1: CATALOG
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Contacts::Table)
                    .if_not_exists()
                    .col(id_column(Contacts::Id))
                    .col(ColumnDef::new(Contacts::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Contacts::ContactType).string_len(20).not_null())
                    .col(ColumnDef::new(Contacts::Phone).string_len(50).null())
                    .col(ColumnDef::new(Contacts::Notes).text().null())
                    .col(created_at_column(Contacts::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductCategories::Table)
                    .if_not_exists()
                    .col(id_column(ProductCategories::Id))
                    .col(
                        ColumnDef::new(ProductCategories::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ProductCategories::BaseCategory)
                            .string_len(20)
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(id_column(Products::Id))
                    .col(ColumnDef::new(Products::Name).string_len(200).not_null())
                    .col(
                        ColumnDef::new(Products::ProductCategoryId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Products::DefaultCarat).integer().null())
                    .col(
                        ColumnDef::new(Products::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(created_at_column(Products::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_category")
                            .from(Products::Table, Products::ProductCategoryId)
                            .to(ProductCategories::Table, ProductCategories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 2: TRADES AND PAYMENTS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(id_column(Transactions::Id))
                    .col(
                        ColumnDef::new(Transactions::TransactionType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::TransactionDate).date().not_null())
                    .col(
                        ColumnDef::new(Transactions::CounterpartyContactId)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::DeliveryStatus)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(amount_column(Transactions::TotalItemsValueRials))
                    .col(amount_column(Transactions::TotalProfitWageCommissionRials))
                    .col(amount_column(Transactions::TotalGeneralTaxRials))
                    .col(amount_column(Transactions::TotalBeforeVatRials))
                    .col(amount_column(Transactions::TotalVatRials))
                    .col(amount_column(Transactions::FinalPayableAmountRials))
                    .col(ColumnDef::new(Transactions::MazanehPrice).decimal().null())
                    .col(ColumnDef::new(Transactions::Notes).text().null())
                    .col(created_at_column(Transactions::CreatedAt))
                    .col(created_at_column(Transactions::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_counterparty")
                            .from(Transactions::Table, Transactions::CounterpartyContactId)
                            .to(Contacts::Table, Contacts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TransactionItems::Table)
                    .if_not_exists()
                    .col(id_column(TransactionItems::Id))
                    .col(
                        ColumnDef::new(TransactionItems::TransactionId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TransactionItems::ProductId).integer().not_null())
                    .col(ColumnDef::new(TransactionItems::Quantity).integer().null())
                    .col(ColumnDef::new(TransactionItems::WeightGrams).decimal().null())
                    .col(ColumnDef::new(TransactionItems::Carat).integer().null())
                    .col(amount_column(TransactionItems::UnitPriceRials))
                    .col(amount_column(TransactionItems::TotalValueRials))
                    .col(amount_column(TransactionItems::WageRials))
                    .col(amount_column(TransactionItems::ProfitRials))
                    .col(amount_column(TransactionItems::FeeRials))
                    .col(amount_column(TransactionItems::GeneralTaxRials))
                    .col(amount_column(TransactionItems::VatRials))
                    .col(amount_column(TransactionItems::LineTotalRials))
                    .col(ColumnDef::new(TransactionItems::Details).json().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_items_transaction")
                            .from(TransactionItems::Table, TransactionItems::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_items_product")
                            .from(TransactionItems::Table, TransactionItems::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(id_column(Payments::Id))
                    .col(ColumnDef::new(Payments::PaymentDate).date().not_null())
                    .col(amount_column(Payments::AmountRials))
                    .col(ColumnDef::new(Payments::Direction).string_len(20).not_null())
                    .col(ColumnDef::new(Payments::PayingContactId).integer().null())
                    .col(ColumnDef::new(Payments::ReceivingContactId).integer().null())
                    .col(ColumnDef::new(Payments::RelatedTransactionId).integer().null())
                    .col(ColumnDef::new(Payments::Notes).text().null())
                    .col(created_at_column(Payments::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_payer")
                            .from(Payments::Table, Payments::PayingContactId)
                            .to(Contacts::Table, Contacts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_receiver")
                            .from(Payments::Table, Payments::ReceivingContactId)
                            .to(Contacts::Table, Contacts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_transaction")
                            .from(Payments::Table, Payments::RelatedTransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 3: PHYSICAL SETTLEMENTS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(PhysicalSettlements::Table)
                    .if_not_exists()
                    .col(id_column(PhysicalSettlements::Id))
                    .col(
                        ColumnDef::new(PhysicalSettlements::ContactId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PhysicalSettlements::Direction)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PhysicalSettlements::SettlementDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PhysicalSettlements::Notes).text().null())
                    .col(created_at_column(PhysicalSettlements::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_physical_settlements_contact")
                            .from(PhysicalSettlements::Table, PhysicalSettlements::ContactId)
                            .to(Contacts::Table, Contacts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PhysicalSettlementItems::Table)
                    .if_not_exists()
                    .col(id_column(PhysicalSettlementItems::Id))
                    .col(
                        ColumnDef::new(PhysicalSettlementItems::SettlementId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PhysicalSettlementItems::ProductId)
                            .integer()
                            .not_null(),
                    )
                    .col(amount_column(PhysicalSettlementItems::WeightScale))
                    .col(
                        ColumnDef::new(PhysicalSettlementItems::Carat)
                            .integer()
                            .not_null(),
                    )
                    .col(amount_column(PhysicalSettlementItems::Weight750))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_physical_settlement_items_settlement")
                            .from(
                                PhysicalSettlementItems::Table,
                                PhysicalSettlementItems::SettlementId,
                            )
                            .to(PhysicalSettlements::Table, PhysicalSettlements::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_physical_settlement_items_product")
                            .from(
                                PhysicalSettlementItems::Table,
                                PhysicalSettlementItems::ProductId,
                            )
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 4: LEDGERS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(InventoryLedger::Table)
                    .if_not_exists()
                    .col(id_column(InventoryLedger::Id))
                    .col(ColumnDef::new(InventoryLedger::ProductId).integer().not_null())
                    .col(ColumnDef::new(InventoryLedger::TransactionId).integer().null())
                    .col(
                        ColumnDef::new(InventoryLedger::TransactionItemId)
                            .integer()
                            .null(),
                    )
                    .col(ColumnDef::new(InventoryLedger::SettlementId).integer().null())
                    .col(ColumnDef::new(InventoryLedger::MovementDate).date().not_null())
                    .col(
                        ColumnDef::new(InventoryLedger::MovementType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryLedger::EntryVersion)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryLedger::ChangeQuantity)
                            .integer()
                            .not_null(),
                    )
                    .col(amount_column(InventoryLedger::ChangeWeightGrams))
                    .col(
                        ColumnDef::new(InventoryLedger::BalanceQuantityAfterMovement)
                            .integer()
                            .not_null(),
                    )
                    .col(amount_column(InventoryLedger::BalanceWeightGramsAfterMovement))
                    .col(ColumnDef::new(InventoryLedger::Carat).integer().null())
                    .col(
                        ColumnDef::new(InventoryLedger::PricePerUnitAtMovement)
                            .decimal()
                            .null(),
                    )
                    .col(ColumnDef::new(InventoryLedger::TotalValueIn).decimal().null())
                    .col(ColumnDef::new(InventoryLedger::TotalValueOut).decimal().null())
                    .col(
                        ColumnDef::new(InventoryLedger::BalanceTotalValueAfterMovement)
                            .decimal()
                            .null(),
                    )
                    .col(ColumnDef::new(InventoryLedger::Notes).text().null())
                    .col(created_at_column(InventoryLedger::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_ledger_product")
                            .from(InventoryLedger::Table, InventoryLedger::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Inventory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Inventory::Carat)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(amount_column(Inventory::TotalWeightGrams))
                    .col(amount_column(Inventory::TotalValueRials))
                    .col(created_at_column(Inventory::LastUpdated))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ContactWeightLedger::Table)
                    .if_not_exists()
                    .col(id_column(ContactWeightLedger::Id))
                    .col(
                        ColumnDef::new(ContactWeightLedger::ContactId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContactWeightLedger::ProductCategoryId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ContactWeightLedger::EventDate).date().not_null())
                    .col(
                        ColumnDef::new(ContactWeightLedger::EventType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ContactWeightLedger::EntryVersion)
                            .big_integer()
                            .not_null(),
                    )
                    .col(amount_column(ContactWeightLedger::ChangeWeightGrams))
                    .col(amount_column(ContactWeightLedger::BalanceAfterGrams))
                    .col(
                        ColumnDef::new(ContactWeightLedger::RelatedTransactionId)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ContactWeightLedger::RelatedSettlementId)
                            .integer()
                            .null(),
                    )
                    .col(ColumnDef::new(ContactWeightLedger::Notes).text().null())
                    .col(created_at_column(ContactWeightLedger::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contact_weight_ledger_contact")
                            .from(ContactWeightLedger::Table, ContactWeightLedger::ContactId)
                            .to(Contacts::Table, Contacts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_contact_weight_ledger_category")
                            .from(
                                ContactWeightLedger::Table,
                                ContactWeightLedger::ProductCategoryId,
                            )
                            .to(ProductCategories::Table, ProductCategories::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ============================================================
        // PART 5: SETTINGS
        // ============================================================
        manager
            .create_table(
                Table::create()
                    .table(Settings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Settings::Key)
                            .string_len(100)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Settings::Value).text().not_null())
                    .col(created_at_column(Settings::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Settings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ContactWeightLedger::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Inventory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(InventoryLedger::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PhysicalSettlementItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PhysicalSettlements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TransactionItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProductCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Contacts::Table).to_owned())
            .await
    }
}

fn id_column<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn amount_column<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name).decimal().not_null().to_owned()
}

fn created_at_column<T: IntoIden>(name: T) -> ColumnDef {
    ColumnDef::new(name)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(DeriveIden)]
enum Contacts {
    Table,
    Id,
    Name,
    ContactType,
    Phone,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ProductCategories {
    Table,
    Id,
    Name,
    BaseCategory,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    Name,
    ProductCategoryId,
    DefaultCarat,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    TransactionType,
    TransactionDate,
    CounterpartyContactId,
    DeliveryStatus,
    TotalItemsValueRials,
    TotalProfitWageCommissionRials,
    TotalGeneralTaxRials,
    TotalBeforeVatRials,
    TotalVatRials,
    FinalPayableAmountRials,
    MazanehPrice,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TransactionItems {
    Table,
    Id,
    TransactionId,
    ProductId,
    Quantity,
    WeightGrams,
    Carat,
    UnitPriceRials,
    TotalValueRials,
    WageRials,
    ProfitRials,
    FeeRials,
    GeneralTaxRials,
    VatRials,
    LineTotalRials,
    Details,
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    PaymentDate,
    AmountRials,
    Direction,
    PayingContactId,
    ReceivingContactId,
    RelatedTransactionId,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PhysicalSettlements {
    Table,
    Id,
    ContactId,
    Direction,
    SettlementDate,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PhysicalSettlementItems {
    Table,
    Id,
    SettlementId,
    ProductId,
    WeightScale,
    Carat,
    #[sea_orm(iden = "weight_750")]
    Weight750,
}

#[derive(DeriveIden)]
enum InventoryLedger {
    Table,
    Id,
    ProductId,
    TransactionId,
    TransactionItemId,
    SettlementId,
    MovementDate,
    MovementType,
    EntryVersion,
    ChangeQuantity,
    ChangeWeightGrams,
    BalanceQuantityAfterMovement,
    BalanceWeightGramsAfterMovement,
    Carat,
    PricePerUnitAtMovement,
    TotalValueIn,
    TotalValueOut,
    BalanceTotalValueAfterMovement,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Inventory {
    Table,
    Carat,
    TotalWeightGrams,
    TotalValueRials,
    LastUpdated,
}

#[derive(DeriveIden)]
enum ContactWeightLedger {
    Table,
    Id,
    ContactId,
    ProductCategoryId,
    EventDate,
    EventType,
    EntryVersion,
    ChangeWeightGrams,
    BalanceAfterGrams,
    RelatedTransactionId,
    RelatedSettlementId,
    Notes,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Settings {
    Table,
    Key,
    Value,
    UpdatedAt,
}
