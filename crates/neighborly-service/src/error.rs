use thiserror::Error;

use neighborly_core::validation::FieldError;
use neighborly_db::error::DbError;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Casbin error: {0}")]
    CasbinError(#[from] casbin::Error),

    #[error(transparent)]
    DatabaseError(#[from] DbError),

    #[error(transparent)]
    CoreError(#[from] neighborly_core::error::CoreError),

    #[error(transparent)]
    ValidationError(#[from] FieldError),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Invalid or expired login code")]
    InvalidLoginCode,

    /// The caller is known but may not perform the operation.
    #[error("{0}")]
    AuthorizationError(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Login code delivery failed: {0}")]
    DeliveryError(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),
}

impl ServiceError {
    pub(crate) fn forbidden(message: impl Into<String>) -> Self {
        Self::AuthorizationError(message.into())
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub(crate) fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
