//! Shared setup for the storage tests: an in-memory SQLite database migrated
//! with the real migrator, plus a small catalogue of contacts and products.

#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tala_core::trade::{
    BaseCategory, CreateTransactionInput, DeliveryStatus, ItemCharges, ItemDetails,
    TransactionItemInput, TransactionType,
};
use tala_db::entities::sea_orm_active_enums::ContactType;
use tala_db::migration::Migrator;
use tala_db::repositories::{
    ContactRepository, CreateCategoryInput, CreateContactInput, CreateProductInput,
    ProductRepository,
};
use tala_shared::config::DatabaseConfig;
use tala_shared::types::{CategoryId, ContactId, ProductId};

/// Reference data created for every test database.
pub struct Fixture {
    pub db: DatabaseConnection,
    pub customer: ContactId,
    pub supplier: ContactId,
    pub melted_category: CategoryId,
    pub coin_category: CategoryId,
    pub jewelry_category: CategoryId,
    pub melted: ProductId,
    pub bullion: ProductId,
    pub coin: ProductId,
    pub ring: ProductId,
}

/// Connects to a fresh in-memory database and runs every migration.
///
/// One pooled connection only: each SQLite memory connection is its own database.
///
/// SQLite keeps decimals as REAL, so a non-terminating value such as
/// `917 / 750` reads back with fewer digits than it was written with.
/// Compare those through `round_grams` / `round_rials`; terminating values
/// round-trip exactly.
pub async fn connect() -> DatabaseConnection {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
    };
    let db = tala_db::connect(&config).await.expect("connect to sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

/// Fresh database with two contacts, four categories and four products.
pub async fn setup() -> Fixture {
    let db = connect().await;
    let contacts = ContactRepository::new(db.clone());
    let products = ProductRepository::new(db.clone());

    let customer = contacts
        .create_contact(CreateContactInput {
            name: "Customer".to_string(),
            contact_type: ContactType::Customer,
            phone: None,
            notes: None,
        })
        .await
        .expect("create customer");
    let supplier = contacts
        .create_contact(CreateContactInput {
            name: "Supplier".to_string(),
            contact_type: ContactType::Supplier,
            phone: Some("021-0000".to_string()),
            notes: None,
        })
        .await
        .expect("create supplier");

    let category = |name: &str, base_category| CreateCategoryInput {
        name: name.to_string(),
        base_category,
    };
    let melted_category = products
        .create_category(category("Melted", BaseCategory::Melted))
        .await
        .expect("melted category");
    let bullion_category = products
        .create_category(category("Bullion", BaseCategory::GoldBullion))
        .await
        .expect("bullion category");
    let coin_category = products
        .create_category(category("Coins", BaseCategory::Coin))
        .await
        .expect("coin category");
    let jewelry_category = products
        .create_category(category("Jewelry", BaseCategory::Jewelry))
        .await
        .expect("jewelry category");

    let product = |name: &str, category_id: i32, default_carat| CreateProductInput {
        name: name.to_string(),
        category_id: CategoryId::new(category_id),
        default_carat,
    };
    let melted = products
        .create_product(product("Melted gold", melted_category.id, Some(750)))
        .await
        .expect("melted product");
    let bullion = products
        .create_product(product("Bullion bar", bullion_category.id, Some(995)))
        .await
        .expect("bullion product");
    let coin = products
        .create_product(product("Emami coin", coin_category.id, None))
        .await
        .expect("coin product");
    let ring = products
        .create_product(product("Ring", jewelry_category.id, None))
        .await
        .expect("ring product");

    Fixture {
        db,
        customer: ContactId::new(customer.id),
        supplier: ContactId::new(supplier.id),
        melted_category: CategoryId::new(melted_category.id),
        coin_category: CategoryId::new(coin_category.id),
        jewelry_category: CategoryId::new(jewelry_category.id),
        melted: ProductId::new(melted.id),
        bullion: ProductId::new(bullion.id),
        coin: ProductId::new(coin.id),
        ring: ProductId::new(ring.id),
    }
}

pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).expect("valid date")
}

/// A melted-gold line priced per gram.
pub fn melted_item(
    product_id: ProductId,
    weight: Decimal,
    carat: i32,
    price_per_gram: Decimal,
) -> TransactionItemInput {
    TransactionItemInput {
        product_id,
        quantity: None,
        weight_grams: Some(weight),
        carat: Some(carat),
        unit_price_rials: price_per_gram,
        charges: ItemCharges::default(),
        details: ItemDetails::empty(BaseCategory::Melted),
    }
}

/// A coin line priced per unit.
pub fn coin_item(product_id: ProductId, quantity: i32, unit_price: Decimal) -> TransactionItemInput {
    TransactionItemInput {
        product_id,
        quantity: Some(quantity),
        weight_grams: None,
        carat: None,
        unit_price_rials: unit_price,
        charges: ItemCharges::default(),
        details: ItemDetails::empty(BaseCategory::Coin),
    }
}

pub fn trade(
    transaction_type: TransactionType,
    transaction_date: NaiveDate,
    counterparty: Option<ContactId>,
    items: Vec<TransactionItemInput>,
) -> CreateTransactionInput {
    CreateTransactionInput {
        transaction_type,
        transaction_date,
        counterparty_contact_id: counterparty,
        delivery_status: DeliveryStatus::Completed,
        mazaneh_price: None,
        notes: None,
        items,
    }
}

pub fn pending(mut input: CreateTransactionInput, status: DeliveryStatus) -> CreateTransactionInput {
    input.delivery_status = status;
    input
}
