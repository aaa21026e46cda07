use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

pub const STORE_UNAVAILABLE_MESSAGE: &str = "Record store unavailable";

/// One entry of the `errors` array every failed request carries.
#[derive(Debug, Serialize)]
pub struct ErrorEntry {
    pub message: String,
    pub code: &'static str,
}

/// Uniform failure envelope: `{"data": null, "errors": [...]}`.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub data: Option<()>,
    pub errors: Vec<ErrorEntry>,
}

impl AppError {
    /// Stable machine-readable code carried in the envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "VALIDATION_FAILED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Unauthorized(_) => "AUTHENTICATION_REQUIRED",
            AppError::Forbidden(_) => "AUTHORIZATION_DENIED",
            AppError::Conflict(_) => "CONFLICT",
            AppError::DatabaseError(_) => "STORE_UNAVAILABLE",
            AppError::InternalError(_) | AppError::ConfigError(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::DatabaseError(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InternalError(_) | AppError::ConfigError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Human-readable message. Internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::BadRequest(err)
            | AppError::NotFound(err)
            | AppError::Unauthorized(err)
            | AppError::Forbidden(err)
            | AppError::Conflict(err) => err.to_string(),
            AppError::DatabaseError(_) => STORE_UNAVAILABLE_MESSAGE.to_string(),
            AppError::InternalError(_) | AppError::ConfigError(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "Request failed");
        } else {
            tracing::debug!(error = %self, code = self.code(), "Request rejected");
        }

        let envelope = ErrorEnvelope {
            data: None,
            errors: vec![ErrorEntry {
                message: self.public_message(),
                code: self.code(),
            }],
        };

        (status, Json(envelope)).into_response()
    }
}
