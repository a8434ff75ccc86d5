//! # Error Types
//!
//! Domain error taxonomy shared by every layer of the backend.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pharma-core errors (this file)                                        │
//! │  ├── CoreError        - Business-rule and authorization failures       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  pharma-db errors (separate crate)                                     │
//! │  └── DbError          - Database failures, folded into CoreError       │
//! │                                                                         │
//! │  HTTP errors (apps/api)                                                │
//! │  └── ApiError         - What clients see: { code, message }            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ← DbError;  CoreError → ApiError    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business errors are returned typed; storage failures collapse into
//! [`CoreError::Storage`] and are reported to clients as internal errors.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Role or tenancy mismatch.
    ///
    /// ## When This Occurs
    /// - The caller's role is not in the capability table for the operation
    /// - A non-admin touches a row owned by another pharmacy
    /// - A cart row's pharmacy no longer matches the caller at confirm time
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Generic missing entity (used when a more specific variant doesn't apply).
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Pharmacy not found: {0}")]
    PharmacyNotFound(String),

    #[error("Medicine not found: {0}")]
    MedicineNotFound(String),

    #[error("Medicine variant not found: {0}")]
    VariantNotFound(String),

    #[error("Cart item not found: {0}")]
    CartItemNotFound(String),

    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Requested quantity exceeds live stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (qty: 5)          Confirm Sale
    ///      │                              │
    ///      ▼                              ▼
    /// stock=3 → rejected         guarded UPDATE hits 0 rows
    ///      │                              │
    ///      └──────────► InsufficientStock ◄┘
    /// ```
    #[error("Insufficient stock for variant {variant_id}: available {available}, requested {requested}")]
    InsufficientStock {
        variant_id: String,
        available: i64,
        requested: i64,
    },

    /// Barcode already used by some variant (in any pharmacy).
    #[error("Barcode already in use: {0}")]
    BarcodeTaken(String),

    /// Medicine still has variants and cannot be deleted.
    #[error("Medicine {medicine_id} still has {count} variant(s)")]
    MedicineHasVariants { medicine_id: String, count: i64 },

    /// Confirmation attempted on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Role in a user-creation payload doesn't match the operation.
    #[error("Invalid role: expected {expected}, got {actual}")]
    InvalidRole { expected: String, actual: String },

    #[error("Phone number already in use: {0}")]
    PhoneNumberTaken(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid or expired reset code")]
    InvalidResetToken,

    /// Referential conflict (e.g. deleting a pharmacy that still owns rows).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Payload validation failure.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// Opaque storage or transaction failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CoreError {
    /// Shorthand for [`CoreError::Unauthorized`].
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        CoreError::Unauthorized(reason.into())
    }

    /// Shorthand for [`CoreError::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// True for errors caused by the caller rather than the system.
    pub fn is_business(&self) -> bool {
        !matches!(self, CoreError::Storage(_))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any write, so a failing payload never touches storage.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed phone number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Date must lie in the future.
    #[error("{field} must be in the future")]
    NotInFuture { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            variant_id: "v-1".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for variant v-1: available 3, requested 5"
        );

        let err = CoreError::MedicineHasVariants {
            medicine_id: "m-1".to_string(),
            count: 2,
        };
        assert_eq!(err.to_string(), "Medicine m-1 still has 2 variant(s)");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "barcode".to_string(),
        };
        assert_eq!(err.to_string(), "barcode is required");

        let err = ValidationError::NotInFuture {
            field: "expiry_date".to_string(),
        };
        assert_eq!(err.to_string(), "expiry_date must be in the future");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::InvalidInput(_)));
        assert!(core_err.is_business());
    }

    #[test]
    fn test_storage_is_not_business() {
        assert!(!CoreError::Storage("disk I/O error".to_string()).is_business());
    }
}
