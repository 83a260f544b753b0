//! Contacts, products, payments and settings.

mod common;

use common::{coin_item, date, setup, trade};
use rust_decimal_macros::dec;
use tala_core::ledger::LedgerError;
use tala_core::trade::{CreatePaymentInput, PaymentDirection, TransactionType};
use tala_db::entities::sea_orm_active_enums::ContactType;
use tala_db::repositories::{
    ContactRepository, CreateContactInput, CreateProductInput, PaymentRepository,
    ProductRepository, RialBalanceRepository, SettingsRepository, TransactionRepository,
};
use tala_shared::types::{CategoryId, ContactId, PaymentId, TransactionId};

fn payment(payer: Option<ContactId>, receiver: Option<ContactId>) -> CreatePaymentInput {
    CreatePaymentInput {
        payment_date: date(7, 1),
        amount_rials: dec!(2500),
        direction: PaymentDirection::Inflow,
        paying_contact_id: payer,
        receiving_contact_id: receiver,
        related_transaction_id: None,
        notes: None,
    }
}

#[tokio::test]
async fn test_contact_with_history_cannot_be_deleted() {
    let fx = setup().await;
    let contacts = ContactRepository::new(fx.db.clone());
    let trades = TransactionRepository::new(fx.db.clone());

    let walk_in = contacts
        .create_contact(CreateContactInput {
            name: "Walk-in".to_string(),
            contact_type: ContactType::Other,
            phone: None,
            notes: None,
        })
        .await
        .unwrap();
    let walk_in = ContactId::new(walk_in.id);
    contacts.delete_contact(walk_in).await.unwrap();
    assert!(contacts.find_by_id(walk_in).await.unwrap().is_none());

    trades
        .create_transaction(trade(
            TransactionType::Sell,
            date(7, 1),
            Some(fx.customer),
            vec![coin_item(fx.coin, 1, dec!(100))],
        ))
        .await
        .unwrap();
    let err = contacts.delete_contact(fx.customer).await.unwrap_err();
    assert!(matches!(err.as_ledger(), Some(LedgerError::Conflict { .. })));
    assert!(contacts.find_by_id(fx.customer).await.unwrap().is_some());

    let err = contacts.delete_contact(ContactId::new(777)).await.unwrap_err();
    assert!(matches!(err.as_ledger(), Some(LedgerError::ContactNotFound(_))));
    assert_eq!(contacts.list_contacts().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_product_in_use_cannot_be_deleted() {
    let fx = setup().await;
    let products = ProductRepository::new(fx.db.clone());
    let trades = TransactionRepository::new(fx.db.clone());

    trades
        .create_transaction(trade(
            TransactionType::Buy,
            date(7, 2),
            None,
            vec![coin_item(fx.coin, 3, dec!(100))],
        ))
        .await
        .unwrap();

    let err = products.delete_product(fx.coin).await.unwrap_err();
    assert_eq!(err.error_code(), "CONFLICT");
    products.delete_product(fx.bullion).await.unwrap();
    assert!(products.find_by_id(fx.bullion).await.unwrap().is_none());
    assert_eq!(products.list_products(true).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_product_creation_checks_category_and_carat() {
    let fx = setup().await;
    let products = ProductRepository::new(fx.db.clone());

    let err = products
        .create_product(CreateProductInput {
            name: "Orphan".to_string(),
            category_id: CategoryId::new(555),
            default_carat: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err.as_ledger(), Some(LedgerError::CategoryNotFound(_))));

    let err = products
        .create_product(CreateProductInput {
            name: "Overfine".to_string(),
            category_id: fx.melted_category,
            default_carat: Some(1200),
        })
        .await
        .unwrap_err();
    assert!(matches!(err.as_ledger(), Some(LedgerError::InvalidCarat(1200))));

    let profiles = products.profiles([fx.melted, fx.ring]).await.unwrap();
    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[&fx.ring].category_id, fx.jewelry_category);
}

#[tokio::test]
async fn test_payment_rules_and_balance() {
    let fx = setup().await;
    let payments = PaymentRepository::new(fx.db.clone());
    let rials = RialBalanceRepository::new(fx.db.clone());

    let err = payments.record_payment(payment(None, None)).await.unwrap_err();
    assert_eq!(err.error_code(), "PAYMENT_WITHOUT_CONTACT");
    let err = payments
        .record_payment(payment(Some(fx.customer), Some(fx.customer)))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "SAME_PAYER_AND_RECEIVER");
    let mut zero = payment(Some(fx.customer), None);
    zero.amount_rials = dec!(0);
    let err = payments.record_payment(zero).await.unwrap_err();
    assert_eq!(err.error_code(), "NON_POSITIVE_AMOUNT");
    let err = payments
        .record_payment(payment(Some(ContactId::new(31)), None))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "CONTACT_NOT_FOUND");
    let mut dangling = payment(Some(fx.customer), None);
    dangling.related_transaction_id = Some(TransactionId::new(404));
    let err = payments.record_payment(dangling).await.unwrap_err();
    assert_eq!(err.error_code(), "TRANSACTION_NOT_FOUND");

    let between = payments
        .record_payment(payment(Some(fx.customer), Some(fx.supplier)))
        .await
        .unwrap();
    assert_eq!(rials.calculate_balance(fx.customer).await, dec!(-2500));
    assert_eq!(rials.calculate_balance(fx.supplier).await, dec!(2500));
    assert_eq!(payments.payments_for_contact(fx.supplier).await.unwrap().len(), 1);

    payments.delete_payment(PaymentId::new(between.id)).await.unwrap();
    assert_eq!(rials.calculate_balance(fx.customer).await, dec!(0));
    let err = payments
        .delete_payment(PaymentId::new(between.id))
        .await
        .unwrap_err();
    assert!(matches!(err.as_ledger(), Some(LedgerError::PaymentNotFound(_))));
}

#[tokio::test]
async fn test_deleted_transaction_detaches_payments() {
    let fx = setup().await;
    let trades = TransactionRepository::new(fx.db.clone());
    let payments = PaymentRepository::new(fx.db.clone());

    let sale = trades
        .create_transaction(trade(
            TransactionType::Sell,
            date(7, 3),
            Some(fx.customer),
            vec![coin_item(fx.coin, 1, dec!(900))],
        ))
        .await
        .unwrap();
    let mut linked = payment(Some(fx.customer), None);
    linked.related_transaction_id = Some(TransactionId::new(sale.transaction.id));
    payments.record_payment(linked).await.unwrap();

    trades
        .delete_transaction(TransactionId::new(sale.transaction.id))
        .await
        .unwrap();

    let remaining = payments.payments_for_contact(fx.customer).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].related_transaction_id, None);
}

#[tokio::test]
async fn test_settings_are_cached_until_written() {
    let fx = setup().await;
    let settings = SettingsRepository::new(fx.db.clone());

    assert_eq!(settings.get("shop_name").await.unwrap(), None);
    assert!(settings.is_cached("shop_name"));
    assert_eq!(settings.get_or("shop_name", "Tala").await.unwrap(), "Tala");

    settings.set("shop_name", "Golden").await.unwrap();
    assert!(!settings.is_cached("shop_name"));
    assert_eq!(settings.get("shop_name").await.unwrap().as_deref(), Some("Golden"));

    settings.set("shop_name", "Golden Hall").await.unwrap();
    assert_eq!(settings.get("shop_name").await.unwrap().as_deref(), Some("Golden Hall"));

    let other = SettingsRepository::new(fx.db.clone());
    assert!(!other.is_cached("shop_name"));
    assert_eq!(other.get("shop_name").await.unwrap().as_deref(), Some("Golden Hall"));

    assert!(settings.delete("shop_name").await.unwrap());
    assert!(!settings.delete("shop_name").await.unwrap());
    assert_eq!(settings.get("shop_name").await.unwrap(), None);

    settings.clear_cache();
    assert!(!settings.is_cached("shop_name"));
}

#[tokio::test]
async fn test_cloned_settings_do_not_share_a_cache() {
    let fx = setup().await;
    let settings = SettingsRepository::new(fx.db.clone());
    settings.set("vat_rate", "0.10").await.unwrap();
    assert_eq!(settings.get("vat_rate").await.unwrap().as_deref(), Some("0.10"));
    assert!(settings.is_cached("vat_rate"));

    let cloned = settings.clone();
    assert!(!cloned.is_cached("vat_rate"));

    cloned.set("vat_rate", "0.09").await.unwrap();
    assert!(settings.is_cached("vat_rate"));
    assert_eq!(settings.get("vat_rate").await.unwrap().as_deref(), Some("0.10"));
    assert_eq!(cloned.get("vat_rate").await.unwrap().as_deref(), Some("0.09"));
}
