//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CoreError ← business meaning (BarcodeTaken, Conflict, Storage…)       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (apps/api) ← { code, message } + HTTP status                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use pharma_core::{CoreError, ValidationError};
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting a duplicate barcode
    /// - Registering a phone number twice
    /// - Any UNIQUE index violation
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Referencing a non-existent pharmacy
    /// - Deleting a pharmacy that still owns medicines, users or sales
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A guarded write would push a value past its cap (e.g. a merged cart
    /// line above the per-line quantity limit). Nothing was written.
    #[error("{field} would exceed {max}")]
    LimitExceeded { field: String, max: i64 },

    /// Stored data could not be decoded (e.g. malformed receipt JSON).
    #[error("Corrupt data: {0}")]
    Corrupt(String),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite reports "UNIQUE constraint failed: <table>.<column>"
                // and "FOREIGN KEY constraint failed"
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Corrupt(err.to_string())
    }
}

/// Folds storage failures into the domain taxonomy.
///
/// ## Mapping
/// ```text
/// NotFound{entity,id}                   → CoreError::NotFound
/// UniqueViolation on *.barcode          → CoreError::BarcodeTaken
/// UniqueViolation on users.phone_number → CoreError::PhoneNumberTaken
/// ForeignKeyViolation                   → CoreError::Conflict
/// everything else                       → CoreError::Storage
/// ```
impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            DbError::UniqueViolation { field, value } if field.ends_with(".barcode") => {
                CoreError::BarcodeTaken(value)
            }
            DbError::UniqueViolation { field, value } if field.ends_with(".phone_number") => {
                CoreError::PhoneNumberTaken(value)
            }
            DbError::LimitExceeded { field, max } => {
                CoreError::InvalidInput(ValidationError::OutOfRange { field, min: 1, max })
            }
            DbError::ForeignKeyViolation { .. } => {
                CoreError::Conflict("record is still referenced by other data".to_string())
            }
            other => CoreError::Storage(other.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_mapping() {
        let err: CoreError = DbError::duplicate("medicine_variants.barcode", "123").into();
        assert!(matches!(err, CoreError::BarcodeTaken(v) if v == "123"));

        let err: CoreError = DbError::duplicate("users.phone_number", "+251911000000").into();
        assert!(matches!(err, CoreError::PhoneNumberTaken(_)));

        let err: CoreError = DbError::ForeignKeyViolation {
            message: "FOREIGN KEY constraint failed".to_string(),
        }
        .into();
        assert!(matches!(err, CoreError::Conflict(_)));

        let err: CoreError = DbError::LimitExceeded {
            field: "quantity".to_string(),
            max: 999,
        }
        .into();
        assert!(matches!(
            err,
            CoreError::InvalidInput(ValidationError::OutOfRange { max: 999, .. })
        ));

        let err: CoreError = DbError::not_found("Sale", "s-1").into();
        assert!(matches!(err, CoreError::NotFound { .. }));

        let err: CoreError = DbError::PoolExhausted.into();
        assert!(matches!(err, CoreError::Storage(_)));
        assert!(!err.is_business());
    }
}
