use mongodb::error::{ErrorKind, WriteFailure};
use service_core::error::AppError;
use thiserror::Error;

const DUPLICATE_KEY: i32 = 11000;

/// Failure of a single resolved operation.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("{0}")]
    AuthenticationRequired(String),

    #[error("{0}")]
    AuthorizationDenied(String),

    #[error("{0}")]
    ValidationFailed(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResolveError {
    pub fn validation(message: impl Into<String>) -> Self {
        ResolveError::ValidationFailed(message.into())
    }

    pub fn shipment_not_found() -> Self {
        ResolveError::NotFound("Shipment not found".to_string())
    }

    /// Label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::AuthenticationRequired(_) => "authentication_required",
            ResolveError::AuthorizationDenied(_) => "authorization_denied",
            ResolveError::ValidationFailed(_) => "validation_failed",
            ResolveError::NotFound(_) => "not_found",
            ResolveError::Conflict(_) => "conflict",
            ResolveError::StoreUnavailable(_) => "store_unavailable",
            ResolveError::Internal(_) => "internal",
        }
    }
}

impl From<mongodb::error::Error> for ResolveError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            ResolveError::Conflict("Record violates a uniqueness constraint".to_string())
        } else {
            ResolveError::StoreUnavailable(err.to_string())
        }
    }
}

impl From<mongodb::bson::ser::Error> for ResolveError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        ResolveError::Internal(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ResolveError {
    fn from(err: validator::ValidationErrors) -> Self {
        ResolveError::ValidationFailed(err.to_string())
    }
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::AuthenticationRequired(e) => AppError::Unauthorized(anyhow::anyhow!(e)),
            ResolveError::AuthorizationDenied(e) => AppError::Forbidden(anyhow::anyhow!(e)),
            ResolveError::ValidationFailed(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ResolveError::NotFound(e) => AppError::NotFound(anyhow::anyhow!(e)),
            ResolveError::Conflict(e) => AppError::Conflict(anyhow::anyhow!(e)),
            ResolveError::StoreUnavailable(e) => AppError::DatabaseError(anyhow::anyhow!(e)),
            ResolveError::Internal(e) => AppError::InternalError(anyhow::anyhow!(e)),
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        ErrorKind::BulkWrite(failure) => failure
            .write_errors
            .as_ref()
            .is_some_and(|errors| errors.iter().any(|e| e.code == DUPLICATE_KEY)),
        _ => false,
    }
}
