//! Ledger error types for validation, lookup, concurrency and storage errors.

use tala_shared::AppError;
use tala_shared::types::{CategoryId, ContactId, PaymentId, ProductId, SettlementId, TransactionId};
use thiserror::Error;

use crate::trade::BaseCategory;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Transaction must have at least one item.
    #[error("Transaction must have at least one item")]
    EmptyTransaction,

    /// Settlement must have at least one item.
    #[error("Settlement must have at least one item")]
    EmptySettlement,

    /// Carat outside `1..=1000`.
    #[error("Invalid carat {0}, expected a value between 1 and 1000")]
    InvalidCarat(i32),

    /// Weight-bearing item without a carat.
    #[error("Item {line}: carat is required for weight-bearing categories")]
    MissingCarat {
        /// Zero-based item index.
        line: usize,
    },

    /// Weight-bearing item without a weight.
    #[error("Item {line}: weight is required for weight-bearing categories")]
    MissingWeight {
        /// Zero-based item index.
        line: usize,
    },

    /// Countable item without a quantity.
    #[error("Item {line}: quantity is required for countable categories")]
    MissingQuantity {
        /// Zero-based item index.
        line: usize,
    },

    /// Weight cannot be negative.
    #[error("Item {line}: weight cannot be negative")]
    NegativeWeight {
        /// Zero-based item index.
        line: usize,
    },

    /// Quantity must be positive.
    #[error("Item {line}: quantity must be positive")]
    InvalidQuantity {
        /// Zero-based item index.
        line: usize,
    },

    /// Price or charge cannot be negative.
    #[error("Item {line}: {field} cannot be negative")]
    NegativeAmount {
        /// Zero-based item index.
        line: usize,
        /// Offending field.
        field: &'static str,
    },

    /// Item details do not match the product's base category.
    #[error("Item {line}: product category is {expected} but details describe {found}")]
    CategoryMismatch {
        /// Zero-based item index.
        line: usize,
        /// Base category of the product.
        expected: BaseCategory,
        /// Base category of the supplied details.
        found: BaseCategory,
    },

    /// Settlements only move weight-bearing gold.
    #[error("Item {line}: settlements require a weight-bearing product, got {category}")]
    NotWeightBearing {
        /// Zero-based item index.
        line: usize,
        /// Base category of the product.
        category: BaseCategory,
    },

    /// Payment amount must be positive.
    #[error("Payment amount must be positive")]
    NonPositiveAmount,

    /// Payment names neither a payer nor a receiver.
    #[error("Payment must name a paying or receiving contact")]
    PaymentWithoutContact,

    /// Payer and receiver are the same contact.
    #[error("Payment payer and receiver must differ")]
    SamePayerAndReceiver,

    // ========== Lookup Errors ==========
    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Product category not found.
    #[error("Product category not found: {0}")]
    CategoryNotFound(CategoryId),

    /// Contact not found.
    #[error("Contact not found: {0}")]
    ContactNotFound(ContactId),

    /// Transaction not found.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Physical settlement not found.
    #[error("Settlement not found: {0}")]
    SettlementNotFound(SettlementId),

    /// Payment not found.
    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    // ========== Conflict Errors ==========
    /// Entity is still referenced and cannot be deleted.
    #[error("Cannot delete {entity}: {reason}")]
    Conflict {
        /// Entity description, e.g. `contact 4`.
        entity: String,
        /// What still references it.
        reason: String,
    },

    // ========== Concurrency Errors ==========
    /// Another writer appended to the same ledger key first.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    /// Retries were exhausted while racing other writers.
    #[error("Ledger write kept conflicting with concurrent writers after {attempts} attempts")]
    ConsistencyConflict {
        /// Number of attempts made.
        attempts: u32,
    },

    // ========== Database Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the error code for machine-readable output.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyTransaction => "EMPTY_TRANSACTION",
            Self::EmptySettlement => "EMPTY_SETTLEMENT",
            Self::InvalidCarat(_) => "INVALID_CARAT",
            Self::MissingCarat { .. } => "MISSING_CARAT",
            Self::MissingWeight { .. } => "MISSING_WEIGHT",
            Self::MissingQuantity { .. } => "MISSING_QUANTITY",
            Self::NegativeWeight { .. } => "NEGATIVE_WEIGHT",
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::CategoryMismatch { .. } => "CATEGORY_MISMATCH",
            Self::NotWeightBearing { .. } => "NOT_WEIGHT_BEARING",
            Self::NonPositiveAmount => "NON_POSITIVE_AMOUNT",
            Self::PaymentWithoutContact => "PAYMENT_WITHOUT_CONTACT",
            Self::SamePayerAndReceiver => "SAME_PAYER_AND_RECEIVER",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::CategoryNotFound(_) => "CATEGORY_NOT_FOUND",
            Self::ContactNotFound(_) => "CONTACT_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::SettlementNotFound(_) => "SETTLEMENT_NOT_FOUND",
            Self::PaymentNotFound(_) => "PAYMENT_NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::ConsistencyConflict { .. } => "CONSISTENCY_CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::EmptyTransaction
            | Self::EmptySettlement
            | Self::InvalidCarat(_)
            | Self::MissingCarat { .. }
            | Self::MissingWeight { .. }
            | Self::MissingQuantity { .. }
            | Self::NegativeWeight { .. }
            | Self::InvalidQuantity { .. }
            | Self::NegativeAmount { .. }
            | Self::CategoryMismatch { .. }
            | Self::NotWeightBearing { .. }
            | Self::NonPositiveAmount
            | Self::PaymentWithoutContact
            | Self::SamePayerAndReceiver => 400,

            // 404 Not Found
            Self::ProductNotFound(_)
            | Self::CategoryNotFound(_)
            | Self::ContactNotFound(_)
            | Self::TransactionNotFound(_)
            | Self::SettlementNotFound(_)
            | Self::PaymentNotFound(_) => 404,

            // 409 Conflict - delete guards and concurrency errors
            Self::Conflict { .. } | Self::ConcurrentModification | Self::ConsistencyConflict { .. } => {
                409
            }

            // 500 Internal Server Error
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrentModification | Self::ConsistencyConflict { .. }
        )
    }

    /// Returns true for input errors raised before any ledger write.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.http_status_code() == 400
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err.http_status_code() {
            400 => Self::Validation(message),
            404 => Self::NotFound(message),
            409 if err.is_retryable() => Self::Concurrency(message),
            409 => Self::Conflict(message),
            _ => match err {
                LedgerError::Database(_) => Self::Database(message),
                _ => Self::Internal(message),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::EmptyTransaction.error_code(), "EMPTY_TRANSACTION");
        assert_eq!(LedgerError::InvalidCarat(1200).error_code(), "INVALID_CARAT");
        assert_eq!(
            LedgerError::ConsistencyConflict { attempts: 3 }.error_code(),
            "CONSISTENCY_CONFLICT"
        );
        assert_eq!(
            LedgerError::ContactNotFound(ContactId::new(1)).error_code(),
            "CONTACT_NOT_FOUND"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::EmptyTransaction.http_status_code(), 400);
        assert_eq!(LedgerError::MissingWeight { line: 0 }.http_status_code(), 400);
        assert_eq!(
            LedgerError::ProductNotFound(ProductId::new(9)).http_status_code(),
            404
        );
        assert_eq!(
            LedgerError::Conflict {
                entity: "contact 1".into(),
                reason: "has transactions".into(),
            }
            .http_status_code(),
            409
        );
        assert_eq!(LedgerError::ConcurrentModification.http_status_code(), 409);
        assert_eq!(LedgerError::Database("boom".into()).http_status_code(), 500);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(LedgerError::ConcurrentModification.is_retryable());
        assert!(LedgerError::ConsistencyConflict { attempts: 3 }.is_retryable());
        assert!(!LedgerError::EmptyTransaction.is_retryable());
        assert!(
            !LedgerError::Conflict {
                entity: "product 2".into(),
                reason: "has ledger rows".into(),
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::CategoryMismatch {
            line: 1,
            expected: BaseCategory::Coin,
            found: BaseCategory::Melted,
        };
        assert_eq!(
            err.to_string(),
            "Item 1: product category is coin but details describe melted"
        );

        let err = LedgerError::Conflict {
            entity: "contact 4".into(),
            reason: "2 transactions reference it".into(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot delete contact 4: 2 transactions reference it"
        );
    }

    #[test]
    fn test_into_app_error() {
        assert!(matches!(
            AppError::from(LedgerError::EmptyTransaction),
            AppError::Validation(_)
        ));
        assert!(matches!(
            AppError::from(LedgerError::TransactionNotFound(TransactionId::new(3))),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(LedgerError::ConsistencyConflict { attempts: 3 }),
            AppError::Concurrency(_)
        ));
        assert!(matches!(
            AppError::from(LedgerError::Conflict {
                entity: "contact 1".into(),
                reason: "x".into()
            }),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(LedgerError::Database("down".into())),
            AppError::Database(_)
        ));
    }
}
