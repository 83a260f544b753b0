//! Demo data seeder for Tala development.
//!
//! Migrates the configured database, then records a small shop: contacts, a
//! catalogue, a few trades, a payment and a settlement. Everything goes
//! through the repositories, so every ledger is populated the same way the
//! application would populate it.
//!
//! Usage: cargo run --bin seeder

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tala_core::trade::{
    BaseCategory, CreatePaymentInput, CreateSettlementInput, CreateTransactionInput,
    DeliveryStatus, ItemCharges, ItemDetails, PaymentDirection, SettlementDirection,
    SettlementItemInput, TransactionItemInput, TransactionType,
};
use tala_db::entities::sea_orm_active_enums::ContactType;
use tala_db::migration::Migrator;
use tala_db::repositories::{
    ContactRepository, CreateCategoryInput, CreateContactInput, CreateProductInput,
    PaymentRepository, ProductRepository, SettingsRepository, SettlementRepository,
    TransactionRepository,
};
use tala_shared::AppConfig;
use tala_shared::types::{CategoryId, ContactId, ProductId, TransactionId};

/// Ids created by the catalogue step.
struct Catalogue {
    melted: ProductId,
    bullion: ProductId,
    coin: ProductId,
    ring: ProductId,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tala=debug".into()),
        )
        .init();

    let config = AppConfig::load()?;

    println!("Connecting to database...");
    let db = tala_db::connect(&config.database).await?;
    Migrator::up(&db, None).await?;

    let contacts = ContactRepository::new(db.clone());
    if !contacts.list_contacts().await?.is_empty() {
        println!("Database already has contacts, skipping...");
        return Ok(());
    }

    println!("Seeding settings...");
    let settings = SettingsRepository::new(db.clone());
    settings.set("shop_name", "Tala Demo Gold").await?;
    settings.set("reference_carat", "750").await?;

    println!("Seeding contacts...");
    let customer = seed_contact(&contacts, "Sara Ahmadi", ContactType::Customer).await?;
    let supplier = seed_contact(&contacts, "Bazaar Melt House", ContactType::Supplier).await?;
    let workshop = seed_contact(&contacts, "Ring Workshop", ContactType::Workshop).await?;

    println!("Seeding catalogue...");
    let catalogue = seed_catalogue(&db).await?;

    println!("Seeding trades...");
    seed_trades(&db, &config, &catalogue, customer, supplier).await?;

    println!("Seeding settlement...");
    SettlementRepository::with_config(db.clone(), &config.ledger)
        .record_settlement(CreateSettlementInput {
            contact_id: workshop,
            direction: SettlementDirection::Outflow,
            settlement_date: days_ago(2),
            notes: Some("Melted gold handed over for ring work".to_string()),
            items: vec![SettlementItemInput {
                product_id: catalogue.melted,
                weight_scale: dec!(12.5),
                carat: 750,
            }],
        })
        .await?;

    println!("Seeding complete!");
    Ok(())
}

fn days_ago(days: i64) -> NaiveDate {
    (Utc::now() - Duration::days(days)).date_naive()
}

async fn seed_contact(
    contacts: &ContactRepository,
    name: &str,
    contact_type: ContactType,
) -> anyhow::Result<ContactId> {
    let contact = contacts
        .create_contact(CreateContactInput {
            name: name.to_string(),
            contact_type,
            phone: None,
            notes: None,
        })
        .await?;
    println!("  Created contact: {name}");
    Ok(ContactId::new(contact.id))
}

async fn seed_catalogue(db: &DatabaseConnection) -> anyhow::Result<Catalogue> {
    let products = ProductRepository::new(db.clone());

    let product_in = |name: &'static str, base_category: BaseCategory, default_carat| {
        let products = products.clone();
        async move {
            let category = products
                .create_category(CreateCategoryInput {
                    name: name.to_string(),
                    base_category,
                })
                .await?;
            let product = products
                .create_product(CreateProductInput {
                    name: name.to_string(),
                    category_id: CategoryId::new(category.id),
                    default_carat,
                })
                .await?;
            println!("  Created product: {name}");
            anyhow::Ok(ProductId::new(product.id))
        }
    };

    Ok(Catalogue {
        melted: product_in("Melted gold", BaseCategory::Melted, Some(750)).await?,
        bullion: product_in("Bullion bar", BaseCategory::GoldBullion, Some(995)).await?,
        coin: product_in("Emami coin", BaseCategory::Coin, None).await?,
        ring: product_in("Ring", BaseCategory::Jewelry, Some(750)).await?,
    })
}

async fn seed_trades(
    db: &DatabaseConnection,
    config: &AppConfig,
    catalogue: &Catalogue,
    customer: ContactId,
    supplier: ContactId,
) -> anyhow::Result<()> {
    let trades = TransactionRepository::with_config(db.clone(), &config.ledger);
    let mazaneh = Some(dec!(290000000));

    let weighed = |product_id, weight: Decimal, carat, price: Decimal, category| TransactionItemInput {
        product_id,
        quantity: None,
        weight_grams: Some(weight),
        carat: Some(carat),
        unit_price_rials: price,
        charges: ItemCharges::default(),
        details: ItemDetails::empty(category),
    };

    trades
        .create_transaction(CreateTransactionInput {
            transaction_type: TransactionType::Buy,
            transaction_date: days_ago(10),
            counterparty_contact_id: Some(supplier),
            delivery_status: DeliveryStatus::Completed,
            mazaneh_price: mazaneh,
            notes: Some("Weekly melt purchase".to_string()),
            items: vec![
                weighed(catalogue.melted, dec!(50), 750, dec!(66000000), BaseCategory::Melted),
                weighed(catalogue.bullion, dec!(10), 995, dec!(88000000), BaseCategory::GoldBullion),
            ],
        })
        .await?;

    trades
        .create_transaction(CreateTransactionInput {
            transaction_type: TransactionType::Buy,
            transaction_date: days_ago(9),
            counterparty_contact_id: Some(supplier),
            delivery_status: DeliveryStatus::Completed,
            mazaneh_price: mazaneh,
            notes: None,
            items: vec![
                TransactionItemInput {
                    product_id: catalogue.coin,
                    quantity: Some(5),
                    weight_grams: None,
                    carat: None,
                    unit_price_rials: dec!(700000000),
                    charges: ItemCharges::default(),
                    details: ItemDetails::empty(BaseCategory::Coin),
                },
                TransactionItemInput {
                    product_id: catalogue.ring,
                    quantity: Some(3),
                    weight_grams: Some(dec!(12.6)),
                    carat: Some(750),
                    unit_price_rials: dec!(280000000),
                    charges: ItemCharges::default(),
                    details: ItemDetails::empty(BaseCategory::Jewelry),
                },
            ],
        })
        .await?;

    let sale = trades
        .create_transaction(CreateTransactionInput {
            transaction_type: TransactionType::Sell,
            transaction_date: days_ago(5),
            counterparty_contact_id: Some(customer),
            delivery_status: DeliveryStatus::Completed,
            mazaneh_price: mazaneh,
            notes: None,
            items: vec![
                TransactionItemInput {
                    product_id: catalogue.ring,
                    quantity: Some(1),
                    weight_grams: Some(dec!(4.2)),
                    carat: Some(750),
                    unit_price_rials: dec!(310000000),
                    charges: ItemCharges {
                        wage_rials: dec!(25000000),
                        profit_rials: dec!(20000000),
                        fee_rials: Decimal::ZERO,
                        general_tax_rials: Decimal::ZERO,
                        vat_rials: dec!(4500000),
                    },
                    details: ItemDetails::empty(BaseCategory::Jewelry),
                },
                weighed(catalogue.melted, dec!(5), 750, dec!(68000000), BaseCategory::Melted),
            ],
        })
        .await?;

    trades
        .create_transaction(CreateTransactionInput {
            transaction_type: TransactionType::Sell,
            transaction_date: days_ago(1),
            counterparty_contact_id: Some(customer),
            delivery_status: DeliveryStatus::PendingDelivery,
            mazaneh_price: mazaneh,
            notes: Some("Coin ordered, not yet collected".to_string()),
            items: vec![TransactionItemInput {
                product_id: catalogue.coin,
                quantity: Some(1),
                weight_grams: None,
                carat: None,
                unit_price_rials: dec!(720000000),
                charges: ItemCharges::default(),
                details: ItemDetails::empty(BaseCategory::Coin),
            }],
        })
        .await?;

    PaymentRepository::new(db.clone())
        .record_payment(CreatePaymentInput {
            payment_date: days_ago(4),
            amount_rials: dec!(500000000),
            direction: PaymentDirection::Inflow,
            paying_contact_id: Some(customer),
            receiving_contact_id: None,
            related_transaction_id: Some(TransactionId::new(sale.transaction.id)),
            notes: Some("Card payment".to_string()),
        })
        .await?;
    println!("  Created 4 trades and 1 payment");
    Ok(())
}
