//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Pharmacy API                       │
//! │                                                                         │
//! │  Client                      Rust Backend                               │
//! │  ──────                      ────────────                               │
//! │                                                                         │
//! │  POST /sales/confirm                                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Handler → Service                                               │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Database Error? ─── DbError ──► CoreError::Storage ──┐          │  │
//! │  │         │                                             │          │  │
//! │  │         ▼                                             ▼          │  │
//! │  │  Business Error? ─── CoreError::InsufficientStock ─► ApiError ──►│  │
//! │  │         │                                        (status, code)  │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──────────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  ◄──── 409 { "code": "INSUFFICIENT_STOCK", "message": "..." } ──────── │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage failures never leak their text: the detail goes to the log and
//! the client gets a generic `INTERNAL` message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use pharma_core::CoreError;
use pharma_db::DbError;

/// API error returned from handlers.
///
/// ## Serialization
/// This is what the client receives when a request fails:
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Medicine not found: 3f0c..."
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Role or tenancy mismatch (403)
    Unauthorized,

    /// Resource not found (404)
    NotFound,

    /// Not enough stock (409)
    InsufficientStock,

    /// Barcode used by another variant (409)
    BarcodeTaken,

    /// Medicine still has variants (409)
    MedicineHasVariants,

    /// Phone number registered to another user (409)
    PhoneNumberTaken,

    /// Referential conflict (409)
    Conflict,

    /// Wrong role in a user payload (400)
    InvalidRole,

    /// Input validation failed (400)
    InvalidInput,

    /// Nothing to confirm (422)
    EmptyCart,

    /// Login rejected (401)
    InvalidCredentials,

    /// Missing, malformed or expired bearer token (401)
    InvalidToken,

    /// Reset code missing, expired or wrong (400)
    InvalidResetToken,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InsufficientStock
            | ErrorCode::BarcodeTaken
            | ErrorCode::MedicineHasVariants
            | ErrorCode::PhoneNumberTaken
            | ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::InvalidRole | ErrorCode::InvalidInput | ErrorCode::InvalidResetToken => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::EmptyCart => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::InvalidCredentials | ErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates an invalid token error.
    pub fn invalid_token() -> Self {
        ApiError::new(ErrorCode::InvalidToken, CoreError::InvalidToken.to_string())
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::Unauthorized(_) => ErrorCode::Unauthorized,
            CoreError::NotFound { .. }
            | CoreError::PharmacyNotFound(_)
            | CoreError::MedicineNotFound(_)
            | CoreError::VariantNotFound(_)
            | CoreError::CartItemNotFound(_)
            | CoreError::SaleNotFound(_)
            | CoreError::OrderNotFound(_)
            | CoreError::UserNotFound(_) => ErrorCode::NotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::BarcodeTaken(_) => ErrorCode::BarcodeTaken,
            CoreError::MedicineHasVariants { .. } => ErrorCode::MedicineHasVariants,
            CoreError::PhoneNumberTaken(_) => ErrorCode::PhoneNumberTaken,
            CoreError::Conflict(_) => ErrorCode::Conflict,
            CoreError::InvalidRole { .. } => ErrorCode::InvalidRole,
            CoreError::InvalidInput(_) => ErrorCode::InvalidInput,
            CoreError::EmptyCart => ErrorCode::EmptyCart,
            CoreError::InvalidCredentials => ErrorCode::InvalidCredentials,
            CoreError::InvalidToken => ErrorCode::InvalidToken,
            CoreError::InvalidResetToken => ErrorCode::InvalidResetToken,
            CoreError::Storage(detail) => {
                // Log the actual error but return a generic message
                tracing::error!(error = %detail, "Storage failure");
                return ApiError::internal("Internal server error");
            }
        };

        ApiError::new(code, err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ApiError::from(CoreError::from(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for handlers and services.
pub type ApiResult<T> = Result<T, ApiError>;
