use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response};
use serde::Serialize;
use thiserror::Error;

use neighborly_db::error::DbError;
use neighborly_service::error::ServiceError;

/// Application-level errors (HTTP layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] ServiceError),

    #[error(transparent)]
    DatabaseError(#[from] DbError),

    #[error(transparent)]
    CoreError(#[from] neighborly_core::error::CoreError),

    /// Malformed request: unparseable body, bad path parameter.
    #[error("{0}")]
    BadRequest(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

const fn db_status(err: &DbError) -> StatusCode {
    match err {
        DbError::Conflict(_) => StatusCode::CONFLICT,
        err if err.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ServiceError(err) => match err {
                ServiceError::NotAuthenticated | ServiceError::InvalidLoginCode => {
                    StatusCode::UNAUTHORIZED
                }
                ServiceError::AuthorizationError(_) => StatusCode::FORBIDDEN,
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::ValidationError(_) => StatusCode::BAD_REQUEST,
                ServiceError::Conflict(_) => StatusCode::CONFLICT,
                ServiceError::DatabaseError(db) => db_status(db),
                ServiceError::DeliveryError(_) => StatusCode::BAD_GATEWAY,
                ServiceError::CasbinError(_)
                | ServiceError::CoreError(_)
                | ServiceError::InvariantViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::DatabaseError(db) => db_status(db),
            Self::CoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message shown to the client. Server-side failures are not described.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self.status_code() {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            StatusCode::SERVICE_UNAVAILABLE => "Database unavailable".to_string(),
            StatusCode::BAD_GATEWAY => "Login code could not be delivered".to_string(),
            StatusCode::CONFLICT if matches!(self.db_error(), Some(DbError::Conflict(_))) => {
                "The record conflicts with existing data".to_string()
            }
            _ => self.to_string(),
        }
    }

    const fn db_error(&self) -> Option<&DbError> {
        match self {
            Self::DatabaseError(db) | Self::ServiceError(ServiceError::DatabaseError(db)) => {
                Some(db)
            }
            _ => None,
        }
    }
}

#[salvo::async_trait]
impl salvo::Writer for AppError {
    async fn write(self, req: &mut Request, _depot: &mut Depot, res: &mut Response) {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, path = %req.uri().path(), "Request failed");
        } else {
            tracing::debug!(error = %self, %status, "Request rejected");
        }

        res.status_code(status);
        res.render(Json(ErrorResponse {
            error: self.public_message(),
        }));
    }
}
