//! Validation of trade inputs before any ledger write.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tala_shared::types::{ProductId, Rials};

use super::types::{
    CreatePaymentInput, CreateSettlementInput, PreparedItem, PreparedSettlementItem, ProductProfile,
    TransactionItemInput,
};
use crate::carat::{to_reference_weight, validate_carat};
use crate::ledger::LedgerError;

/// Validates transaction items against their products and derives amounts.
///
/// Rules:
/// - at least one item
/// - every product exists and its base category matches the item details
/// - weight-bearing items carry a non-negative weight and a carat in `1..=1000`
/// - countable items carry a positive quantity
/// - prices and charges are non-negative
///
/// # Errors
///
/// Returns the first rule violated, identified by item position.
pub fn prepare_items(
    items: &[TransactionItemInput],
    products: &HashMap<ProductId, ProductProfile>,
) -> Result<Vec<PreparedItem>, LedgerError> {
    if items.is_empty() {
        return Err(LedgerError::EmptyTransaction);
    }

    items
        .iter()
        .enumerate()
        .map(|(line, item)| prepare_item(line, item, products))
        .collect()
}

fn prepare_item(
    line: usize,
    item: &TransactionItemInput,
    products: &HashMap<ProductId, ProductProfile>,
) -> Result<PreparedItem, LedgerError> {
    let profile = products
        .get(&item.product_id)
        .ok_or(LedgerError::ProductNotFound(item.product_id))?;

    let found = item.details.base_category();
    if found != profile.base_category {
        return Err(LedgerError::CategoryMismatch {
            line,
            expected: profile.base_category,
            found,
        });
    }

    if let Some(weight) = item.weight_grams {
        if weight < Decimal::ZERO {
            return Err(LedgerError::NegativeWeight { line });
        }
    }
    if let Some(carat) = item.carat {
        validate_carat(carat)?;
    }

    check_non_negative(line, "unit price", item.unit_price_rials)?;
    check_non_negative(line, "wage", item.charges.wage_rials)?;
    check_non_negative(line, "profit", item.charges.profit_rials)?;
    check_non_negative(line, "fee", item.charges.fee_rials)?;
    check_non_negative(line, "general tax", item.charges.general_tax_rials)?;
    check_non_negative(line, "VAT", item.charges.vat_rials)?;

    let total_value_rials = if profile.base_category.is_countable() {
        let quantity = item.quantity.ok_or(LedgerError::MissingQuantity { line })?;
        if quantity <= 0 {
            return Err(LedgerError::InvalidQuantity { line });
        }
        item.unit_price_rials * Decimal::from(quantity)
    } else {
        let weight = item.weight_grams.ok_or(LedgerError::MissingWeight { line })?;
        if item.carat.is_none() {
            return Err(LedgerError::MissingCarat { line });
        }
        if let Some(quantity) = item.quantity {
            if quantity < 0 {
                return Err(LedgerError::InvalidQuantity { line });
            }
        }
        item.unit_price_rials * weight
    };

    let reference_weight = item
        .weight_grams
        .map_or(Decimal::ZERO, |weight| to_reference_weight(weight, item.carat));

    Ok(PreparedItem {
        line,
        input: item.clone(),
        category_id: profile.category_id,
        base_category: profile.base_category,
        reference_weight,
        total_value_rials,
        line_total_rials: total_value_rials + item.charges.total(),
    })
}

fn check_non_negative(line: usize, field: &'static str, amount: Rials) -> Result<(), LedgerError> {
    if amount < Decimal::ZERO {
        Err(LedgerError::NegativeAmount { line, field })
    } else {
        Ok(())
    }
}

/// Validates settlement items; settlements only move weight-bearing gold.
///
/// # Errors
///
/// Returns the first rule violated, identified by item position.
pub fn prepare_settlement_items(
    input: &CreateSettlementInput,
    products: &HashMap<ProductId, ProductProfile>,
) -> Result<Vec<PreparedSettlementItem>, LedgerError> {
    if input.items.is_empty() {
        return Err(LedgerError::EmptySettlement);
    }

    input
        .items
        .iter()
        .enumerate()
        .map(|(line, item)| {
            let profile = products
                .get(&item.product_id)
                .ok_or(LedgerError::ProductNotFound(item.product_id))?;
            if !profile.base_category.is_weight_bearing() {
                return Err(LedgerError::NotWeightBearing {
                    line,
                    category: profile.base_category,
                });
            }
            if item.weight_scale < Decimal::ZERO {
                return Err(LedgerError::NegativeWeight { line });
            }
            let carat = validate_carat(item.carat)?;

            Ok(PreparedSettlementItem {
                line,
                input: item.clone(),
                category_id: profile.category_id,
                weight_750: to_reference_weight(item.weight_scale, Some(carat)),
            })
        })
        .collect()
}

/// Validates a payment.
///
/// # Errors
///
/// Returns an error if the amount is not positive, no contact is named, or
/// payer and receiver are the same contact.
pub fn validate_payment(input: &CreatePaymentInput) -> Result<(), LedgerError> {
    if input.amount_rials <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount);
    }
    match (input.paying_contact_id, input.receiving_contact_id) {
        (None, None) => Err(LedgerError::PaymentWithoutContact),
        (Some(payer), Some(receiver)) if payer == receiver => Err(LedgerError::SamePayerAndReceiver),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trade::types::{
        BaseCategory, ItemCharges, ItemDetails, PaymentDirection, SettlementDirection,
        SettlementItemInput,
    };
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tala_shared::types::{CategoryId, ContactId};

    const MELTED: ProductId = ProductId::new(1);
    const COIN: ProductId = ProductId::new(2);

    fn products() -> HashMap<ProductId, ProductProfile> {
        HashMap::from([
            (
                MELTED,
                ProductProfile {
                    product_id: MELTED,
                    name: "Melted gold".into(),
                    category_id: CategoryId::new(10),
                    base_category: BaseCategory::Melted,
                },
            ),
            (
                COIN,
                ProductProfile {
                    product_id: COIN,
                    name: "Emami coin".into(),
                    category_id: CategoryId::new(20),
                    base_category: BaseCategory::Coin,
                },
            ),
        ])
    }

    fn melted_item(weight: Decimal, carat: i32) -> TransactionItemInput {
        TransactionItemInput {
            product_id: MELTED,
            quantity: None,
            weight_grams: Some(weight),
            carat: Some(carat),
            unit_price_rials: dec!(50000),
            charges: ItemCharges::default(),
            details: ItemDetails::empty(BaseCategory::Melted),
        }
    }

    fn coin_item(quantity: Option<i32>) -> TransactionItemInput {
        TransactionItemInput {
            product_id: COIN,
            quantity,
            weight_grams: None,
            carat: None,
            unit_price_rials: dec!(400000),
            charges: ItemCharges::default(),
            details: ItemDetails::empty(BaseCategory::Coin),
        }
    }

    #[test]
    fn test_prepare_weight_item() {
        let mut item = melted_item(dec!(10), 900);
        item.charges.wage_rials = dec!(1000);
        item.charges.vat_rials = dec!(90);

        let prepared = prepare_items(&[item], &products()).unwrap();
        assert_eq!(prepared[0].reference_weight, dec!(12));
        assert_eq!(prepared[0].total_value_rials, dec!(500000));
        assert_eq!(prepared[0].line_total_rials, dec!(501090));
        assert_eq!(prepared[0].category_id, CategoryId::new(10));
    }

    #[test]
    fn test_prepare_countable_item() {
        let prepared = prepare_items(&[coin_item(Some(3))], &products()).unwrap();
        assert_eq!(prepared[0].total_value_rials, dec!(1200000));
        assert_eq!(prepared[0].reference_weight, dec!(0));
    }

    #[test]
    fn test_empty_transaction_rejected() {
        assert!(matches!(
            prepare_items(&[], &products()),
            Err(LedgerError::EmptyTransaction)
        ));
    }

    #[test]
    fn test_unknown_product_rejected() {
        let mut item = melted_item(dec!(1), 750);
        item.product_id = ProductId::new(99);
        assert!(matches!(
            prepare_items(&[item], &products()),
            Err(LedgerError::ProductNotFound(id)) if id == ProductId::new(99)
        ));
    }

    #[test]
    fn test_category_mismatch_rejected() {
        let mut item = melted_item(dec!(1), 750);
        item.details = ItemDetails::empty(BaseCategory::Coin);
        assert!(matches!(
            prepare_items(&[item], &products()),
            Err(LedgerError::CategoryMismatch {
                line: 0,
                expected: BaseCategory::Melted,
                found: BaseCategory::Coin
            })
        ));
    }

    #[test]
    fn test_weight_rules() {
        let mut missing_weight = melted_item(dec!(1), 750);
        missing_weight.weight_grams = None;
        assert!(matches!(
            prepare_items(&[missing_weight], &products()),
            Err(LedgerError::MissingWeight { line: 0 })
        ));

        let mut missing_carat = melted_item(dec!(1), 750);
        missing_carat.carat = None;
        assert!(matches!(
            prepare_items(&[missing_carat], &products()),
            Err(LedgerError::MissingCarat { line: 0 })
        ));

        assert!(matches!(
            prepare_items(&[melted_item(dec!(-1), 750)], &products()),
            Err(LedgerError::NegativeWeight { line: 0 })
        ));

        assert!(matches!(
            prepare_items(&[melted_item(dec!(1), 1001)], &products()),
            Err(LedgerError::InvalidCarat(1001))
        ));
    }

    #[test]
    fn test_quantity_rules() {
        assert!(matches!(
            prepare_items(&[melted_item(dec!(1), 750), coin_item(None)], &products()),
            Err(LedgerError::MissingQuantity { line: 1 })
        ));
        assert!(matches!(
            prepare_items(&[coin_item(Some(0))], &products()),
            Err(LedgerError::InvalidQuantity { line: 0 })
        ));
    }

    #[test]
    fn test_negative_charge_rejected() {
        let mut item = melted_item(dec!(1), 750);
        item.charges.fee_rials = dec!(-1);
        assert!(matches!(
            prepare_items(&[item], &products()),
            Err(LedgerError::NegativeAmount { line: 0, field: "fee" })
        ));
    }

    #[test]
    fn test_settlement_items() {
        let input = CreateSettlementInput {
            contact_id: ContactId::new(1),
            direction: SettlementDirection::Inflow,
            settlement_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            notes: None,
            items: vec![SettlementItemInput {
                product_id: MELTED,
                weight_scale: dec!(15),
                carat: 900,
            }],
        };
        let prepared = prepare_settlement_items(&input, &products()).unwrap();
        assert_eq!(prepared[0].weight_750, dec!(18));

        let coins = CreateSettlementInput {
            items: vec![SettlementItemInput {
                product_id: COIN,
                weight_scale: dec!(8),
                carat: 900,
            }],
            ..input.clone()
        };
        assert!(matches!(
            prepare_settlement_items(&coins, &products()),
            Err(LedgerError::NotWeightBearing { line: 0, .. })
        ));

        let empty = CreateSettlementInput {
            items: vec![],
            ..input
        };
        assert!(matches!(
            prepare_settlement_items(&empty, &products()),
            Err(LedgerError::EmptySettlement)
        ));
    }

    fn payment(amount: Decimal, payer: Option<i32>, receiver: Option<i32>) -> CreatePaymentInput {
        CreatePaymentInput {
            payment_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            amount_rials: amount,
            direction: PaymentDirection::Inflow,
            paying_contact_id: payer.map(ContactId::new),
            receiving_contact_id: receiver.map(ContactId::new),
            related_transaction_id: None,
            notes: None,
        }
    }

    #[test]
    fn test_payment_rules() {
        assert!(validate_payment(&payment(dec!(100), Some(1), None)).is_ok());
        assert!(validate_payment(&payment(dec!(100), Some(1), Some(2))).is_ok());
        assert!(matches!(
            validate_payment(&payment(dec!(0), Some(1), None)),
            Err(LedgerError::NonPositiveAmount)
        ));
        assert!(matches!(
            validate_payment(&payment(dec!(10), None, None)),
            Err(LedgerError::PaymentWithoutContact)
        ));
        assert!(matches!(
            validate_payment(&payment(dec!(10), Some(3), Some(3))),
            Err(LedgerError::SamePayerAndReceiver)
        ));
    }
}
