//! Domain error taxonomy.
//!
//! Every lifecycle check returns one of these kinds. The HTTP layer maps them
//! onto status codes; nothing here knows about transport.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Caller-correctable input or state problem.
    #[error("{0}")]
    Validation(String),

    /// Referenced entity does not exist or is outside the requested scope.
    #[error("{0}")]
    NotFound(String),

    /// Actor lacks the required role, membership or ownership.
    #[error("{0}")]
    Permission(String),

    /// Lost a concurrent mutation (double redemption, last seat taken).
    #[error("{0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        DomainError::NotFound(message.into())
    }

    pub fn permission(message: impl Into<String>) -> Self {
        DomainError::Permission(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        DomainError::Conflict(message.into())
    }

    /// Conflicts are reported to callers as validation failures.
    pub fn is_validation_class(&self) -> bool {
        matches!(self, DomainError::Validation(_) | DomainError::Conflict(_))
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
