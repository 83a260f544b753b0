//! Repository error type.

use sea_orm::{DbErr, SqlErr};
use tala_core::ledger::LedgerError;
use tala_shared::AppError;

/// Error returned by every repository operation.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Domain rule violation, missing record or write conflict.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl RepositoryError {
    /// Returns the stable error code.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ledger(err) => err.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true if re-running the whole unit of work may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Ledger(err) => err.is_retryable(),
            Self::Database(_) => false,
        }
    }

    /// Returns the domain error, if this is one.
    #[must_use]
    pub const fn as_ledger(&self) -> Option<&LedgerError> {
        match self {
            Self::Ledger(err) => Some(err),
            Self::Database(_) => None,
        }
    }
}

/// Maps a unique-index violation on a versioned ledger insert to
/// [`LedgerError::ConcurrentModification`].
pub(crate) fn version_conflict(err: DbErr) -> RepositoryError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        RepositoryError::Ledger(LedgerError::ConcurrentModification)
    } else {
        RepositoryError::Database(err)
    }
}

impl From<RepositoryError> for LedgerError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Ledger(err) => err,
            RepositoryError::Database(err) => Self::Database(err.to_string()),
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        LedgerError::from(err).into()
    }
}
