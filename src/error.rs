//! Error types for the catalog server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Error codes reported to clients in the `code`/`error` fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    DbFailure = 2,
    Timeout = 3,
    BadValue = 10,
    MissingField = 11,
    NotFound = 20,
    Conflict = 30,
    DuplicateIdentity = 31,
    NoTokenProvided = 40,
    InvalidToken = 41,
    InvalidCredentials = 42,
    AccessDenied = 43,
}

/// Authentication and authorization failures.
///
/// The variants stay distinct for logging; the response mapping collapses
/// the token verification failures into a single client-facing message.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("no token provided")]
    NoTokenProvided,

    #[error("token signature does not match")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    #[error("invalid identity or password")]
    InvalidCredentials,

    #[error("access denied")]
    AccessDenied,
}

/// Registration input and uniqueness failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Identity is already registered")]
    DuplicateIdentity,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Registration failed: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl AppError {
    /// Status, code and client-safe message for this error
    fn parts(&self) -> (StatusCode, ErrorCode, String) {
        match self {
            AppError::Auth(auth) => match auth {
                AuthError::NoTokenProvided => (
                    StatusCode::UNAUTHORIZED,
                    ErrorCode::NoTokenProvided,
                    "No token provided".to_string(),
                ),
                AuthError::InvalidSignature | AuthError::Expired | AuthError::Malformed => (
                    StatusCode::UNAUTHORIZED,
                    ErrorCode::InvalidToken,
                    "Invalid or expired token".to_string(),
                ),
                AuthError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    ErrorCode::InvalidCredentials,
                    "Invalid identity or password".to_string(),
                ),
                AuthError::AccessDenied => (
                    StatusCode::FORBIDDEN,
                    ErrorCode::AccessDenied,
                    "Access denied".to_string(),
                ),
            },
            AppError::Registration(reg) => match reg {
                RegistrationError::MissingField(_) => {
                    (StatusCode::BAD_REQUEST, ErrorCode::MissingField, reg.to_string())
                }
                RegistrationError::DuplicateIdentity => {
                    (StatusCode::CONFLICT, ErrorCode::DuplicateIdentity, reg.to_string())
                }
            },
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NotFound, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ErrorCode::Conflict, msg.clone()),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::DbFailure,
                "Database error".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::Failure,
                "Internal server error".to_string(),
            ),
            AppError::Timeout(_) => (
                StatusCode::GATEWAY_TIMEOUT,
                ErrorCode::Timeout,
                "The operation timed out".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Auth(reason) => tracing::warn!(%reason, "Request rejected"),
            AppError::Database(e) => tracing::error!("Database error: {:?}", e),
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            AppError::Timeout(what) => tracing::error!("Timed out: {}", what),
            _ => {}
        }

        let (status, code, message) = self.parts();

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
