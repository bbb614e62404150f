//! Error types for the dashboard API
//!
//! Every failure carries its kind as a variant; handlers branch on the
//! variant and never on message text.

use hyper::StatusCode;

use crate::resource::validation::ValidationErrors;

/// Main error type for API operations
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Invalid request body: {0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to API clients.
    ///
    /// Storage and internal failures are replaced by `fallback` so driver
    /// details stay in the logs.
    pub fn public_message(&self, fallback: &str) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) | Self::Config(_) => fallback.to_string(),
            other => other.to_string(),
        }
    }

    /// Whether this error is worth logging as a server-side failure
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        // Syntax problems are a malformed body; data problems (wrong type,
        // unknown enum variant, missing field) are field validation failures.
        match err.classify() {
            Category::Data => Self::Validation(ValidationErrors::from_message(err.to_string())),
            _ => Self::BadRequest(err.to_string()),
        }
    }
}

impl From<hyper::Error> for ApiError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<mongodb::error::Error> for ApiError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<bson::ser::Error> for ApiError {
    fn from(err: bson::ser::Error) -> Self {
        Self::Internal(format!("BSON encode error: {}", err))
    }
}

impl From<bson::de::Error> for ApiError {
    fn from(err: bson::de::Error) -> Self {
        Self::Database(format!("BSON decode error: {}", err))
    }
}

impl From<bson::document::ValueAccessError> for ApiError {
    fn from(err: bson::document::ValueAccessError) -> Self {
        Self::Database(format!("Malformed stored document: {}", err))
    }
}

/// Result type alias for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
