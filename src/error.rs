/// Error Handling Module
///
/// Unified error handling for the API:
/// 1. Domain-specific error types (validation, auth, store)
/// 2. A single `AppError` used for control flow in handlers and middleware
/// 3. HTTP response mapping with structured logging per error id

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

// ============================================================================
// 1. DOMAIN-SPECIFIC ERROR TYPES
// ============================================================================

/// Request payload did not match the expected shape
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("{0} is too short (minimum {1} characters)")]
    TooShort(&'static str, usize),
    #[error("{0} is too long (maximum {1} characters)")]
    TooLong(&'static str, usize),
    #[error("{0} has invalid format")]
    InvalidFormat(&'static str),
    #[error("name must contain a space")]
    NameWithoutSpace,
    #[error("{0} contains suspicious content")]
    SuspiciousContent(&'static str),
    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

/// Credential store failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error("store connection error: {0}")]
    Connection(String),
}

/// Why a token could not be read as a user-bound token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedTokenReason {
    #[error("refresh token carries no payload")]
    NoPayload,
    #[error("refresh token subject is not a user id")]
    SubjectNotString,
}

/// Authentication and session errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("a user with this username already exists")]
    UsernameTaken,
    #[error("no refresh token provided")]
    MissingRefreshToken,
    #[error("user not found")]
    UserNotFound,
    #[error("user or password incorrect")]
    InvalidCredentials,
    #[error("no token provided")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("{0}")]
    MalformedToken(MalformedTokenReason),
}

// ============================================================================
// 2. UNIFIED APPLICATION ERROR TYPE
// ============================================================================

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::UniqueViolation(
                db.constraint().unwrap_or("unknown").to_string(),
            ),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Connection(err.to_string())
            }
            _ => StoreError::Query(err.to_string()),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Store(err.into())
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error body returned for every failed request
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable kind, e.g. `INVALID_REFRESH_TOKEN`
    pub error_type: String,
    /// Human-readable message
    pub message: String,
    /// Id under which the failure was logged
    pub error_id: String,
}

impl AppError {
    /// Status, error type and client-facing message.
    ///
    /// Store and internal failures never leak their details to the client;
    /// the raw error only goes to the log.
    fn classify(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string()),
            AppError::Auth(e) => {
                let (status, error_type) = match e {
                    AuthError::UsernameTaken | AuthError::MissingRefreshToken => {
                        (StatusCode::CONFLICT, "CONFLICT")
                    }
                    AuthError::UserNotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                    AuthError::InvalidCredentials => (StatusCode::BAD_REQUEST, "BAD_CREDENTIALS"),
                    AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
                    AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "TOKEN_INVALID"),
                    AuthError::InvalidRefreshToken => {
                        (StatusCode::UNAUTHORIZED, "INVALID_REFRESH_TOKEN")
                    }
                    AuthError::MalformedToken(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "MALFORMED_TOKEN")
                    }
                };
                (status, error_type, e.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Store(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }

    /// Build the response body under the given error id
    pub fn to_error_response(&self, error_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, error_type, message) = self.classify();
        (
            status,
            ErrorResponse {
                error_type: error_type.to_string(),
                message,
                error_id: error_id.to_string(),
            },
        )
    }

    fn log(&self, error_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Validation error");
            }
            AppError::Auth(AuthError::InvalidCredentials) => {
                tracing::warn!(error_id = error_id, "Invalid credentials attempt");
            }
            AppError::Auth(AuthError::MalformedToken(reason)) => {
                tracing::error!(error_id = error_id, reason = ?reason, "Malformed token");
            }
            AppError::Auth(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Authentication error");
            }
            AppError::NotFound(msg) => {
                tracing::debug!(error_id = error_id, error = %msg, "Not found");
            }
            AppError::Store(e) => {
                tracing::error!(error_id = error_id, error = %e, "Credential store error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error_id = error_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log(&error_id);

        let (status, body) = self.to_error_response(&error_id);
        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        self.classify().0
    }
}
