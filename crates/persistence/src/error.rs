//! Error type for transactional lifecycle operations.

use domain::DomainError;
use thiserror::Error;

/// Outcome of a lifecycle transaction that did not commit.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A domain rule rejected the operation; nothing was written.
    #[error(transparent)]
    Rejected(#[from] DomainError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// True if `err` is a PostgreSQL unique violation (23505).
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}
