//! Concurrent writers on the same product and contact.
//!
//! Every trade below touches the same inventory chain, the same contact
//! weight chain and the same carat bucket. The final balances must equal the
//! sum of the individual changes no matter how the writers interleave.

mod common;

use std::sync::Arc;

use common::{date, melted_item, setup, trade};
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tala_core::ledger::StockLevel;
use tala_core::trade::TransactionType;
use tala_db::repositories::{
    CaratInventoryRepository, ContactWeightLedgerRepository, InventoryLedgerRepository,
    TransactionRepository,
};
use tokio::sync::Barrier;

const WRITERS: usize = 12;

#[tokio::test]
async fn test_concurrent_trades_keep_chains_intact() {
    let fx = setup().await;
    let barrier = Arc::new(Barrier::new(WRITERS));

    let writes = (0..WRITERS).map(|n| {
        let trades = TransactionRepository::new(fx.db.clone());
        let barrier = Arc::clone(&barrier);
        let (transaction_type, day) = if n % 3 == 0 {
            (TransactionType::Sell, 20)
        } else {
            (TransactionType::Buy, 1 + u32::try_from(n).unwrap_or(0))
        };
        let input = trade(
            transaction_type,
            date(8, day),
            Some(fx.customer),
            vec![melted_item(fx.melted, dec!(1), 750, dec!(1000))],
        );
        async move {
            barrier.wait().await;
            trades.create_transaction(input).await
        }
    });

    let results = join_all(writes).await;
    assert!(results.iter().all(Result::is_ok), "{results:?}");

    let sells = (0..WRITERS).filter(|n| n % 3 == 0).count();
    let buys = WRITERS - sells;
    let expected = Decimal::from(buys) - Decimal::from(sells);

    let inventory = InventoryLedgerRepository::new(fx.db.clone());
    let weights = ContactWeightLedgerRepository::new(fx.db.clone());
    let carats = CaratInventoryRepository::new(fx.db.clone());

    assert_eq!(inventory.movements(fx.melted).await.unwrap().len(), WRITERS);
    assert_eq!(inventory.get_current_balance(fx.melted).await.weight_grams, expected);
    assert!(inventory.verify_chain(fx.melted).await.unwrap().is_empty());

    assert_eq!(weights.get_last_balance(fx.customer, fx.melted_category).await, expected);
    assert!(weights.verify_chain(fx.customer, fx.melted_category).await.unwrap().is_empty());

    let buckets = carats.buckets().await.unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].total_weight_grams, expected);
    assert!(carats.reconcile().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_deletes_rebase_once() {
    let fx = setup().await;
    let trades = TransactionRepository::new(fx.db.clone());

    let mut created = Vec::new();
    for day in 1..=6 {
        created.push(
            trades
                .create_transaction(trade(
                    TransactionType::Buy,
                    date(9, day),
                    None,
                    vec![melted_item(fx.melted, dec!(2), 750, dec!(500))],
                ))
                .await
                .unwrap(),
        );
    }

    let deletes = created.iter().step_by(2).map(|row| {
        let trades = trades.clone();
        let id = tala_shared::types::TransactionId::new(row.transaction.id);
        async move { trades.delete_transaction(id).await }
    });
    assert!(join_all(deletes).await.iter().all(Result::is_ok));

    let inventory = InventoryLedgerRepository::new(fx.db.clone());
    assert_eq!(
        inventory.get_current_balance(fx.melted).await,
        StockLevel::new(0, dec!(6), dec!(3000))
    );
    let balances: Vec<_> = inventory
        .movements(fx.melted)
        .await
        .unwrap()
        .iter()
        .map(|row| row.balance_weight_grams_after_movement)
        .collect();
    assert_eq!(balances, vec![dec!(2), dec!(4), dec!(6)]);
}

#[tokio::test]
async fn test_update_racing_delete_of_same_transaction() {
    let fx = setup().await;
    let trades = TransactionRepository::new(fx.db.clone());

    let created = trades
        .create_transaction(trade(
            TransactionType::Buy,
            date(10, 1),
            Some(fx.customer),
            vec![melted_item(fx.melted, dec!(5), 750, dec!(1000))],
        ))
        .await
        .unwrap();
    let id = tala_shared::types::TransactionId::new(created.transaction.id);

    let replacement = trade(
        TransactionType::Buy,
        date(10, 2),
        Some(fx.customer),
        vec![melted_item(fx.melted, dec!(8), 750, dec!(1000))],
    );
    let (updated, deleted) = tokio::join!(
        trades.update_transaction(id, replacement),
        trades.delete_transaction(id)
    );
    assert!(deleted.is_ok(), "{deleted:?}");
    if let Err(err) = &updated {
        assert_eq!(err.error_code(), "TRANSACTION_NOT_FOUND");
    }

    let inventory = InventoryLedgerRepository::new(fx.db.clone());
    let weights = ContactWeightLedgerRepository::new(fx.db.clone());
    let carats = CaratInventoryRepository::new(fx.db.clone());

    assert!(inventory.movements(fx.melted).await.unwrap().is_empty());
    assert_eq!(inventory.get_current_balance(fx.melted).await, StockLevel::zero());
    assert_eq!(weights.get_last_balance(fx.customer, fx.melted_category).await, dec!(0));
    assert!(carats.reconcile().await.unwrap().is_empty());
    assert!(carats.summarize().await.is_empty());
}
