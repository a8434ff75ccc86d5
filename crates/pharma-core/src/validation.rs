//! # Validation Module
//!
//! Field rules applied to every payload before it reaches storage.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (axum Json)                                   │
//! │  └── Shape and type validation (deserialization)                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Service                                                      │
//! │  └── THIS MODULE: lengths, formats, ranges, future dates               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0, price > 0, quantity > 0)                       │
//! │  ├── UNIQUE (barcode, phone_number, (user, variant))                   │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pharma_core::validation::{validate_barcode, validate_quantity};
//!
//! validate_barcode("5000158100091").unwrap();
//! validate_quantity(5).unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::types::Page;
use crate::{DEFAULT_PAGE_SIZE, MAX_ITEM_QUANTITY, MAX_PAGE_SIZE, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Checks a trimmed string against a character-count window.
fn validate_length(field: &str, value: &str, min: usize, max: usize) -> ValidationResult<()> {
    let len = value.trim().chars().count();

    if len == 0 {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if len < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }
    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Medicine and pharmacy names: 2–100 characters.
///
/// ```rust
/// use pharma_core::validation::validate_name;
///
/// assert!(validate_name("Paracetamol").is_ok());
/// assert!(validate_name("P").is_err());
/// ```
pub fn validate_name(name: &str) -> ValidationResult<()> {
    validate_length("name", name, 2, 100)
}

pub fn validate_full_name(name: &str) -> ValidationResult<()> {
    validate_length("full_name", name, 2, 100)
}

pub fn validate_address(address: &str) -> ValidationResult<()> {
    validate_length("address", address, 1, 255)
}

/// Optional free text, at most 500 characters.
pub fn validate_description(description: Option<&str>) -> ValidationResult<()> {
    match description {
        Some(d) if d.chars().count() > 500 => Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: 500,
        }),
        _ => Ok(()),
    }
}

/// Optional image link; when present it must be an absolute http(s) URL.
pub fn validate_image_url(url: Option<&str>) -> ValidationResult<()> {
    let Some(url) = url else {
        return Ok(());
    };
    let url = url.trim();

    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));

    match rest {
        Some(host) if !host.is_empty() && !host.contains(char::is_whitespace) => {
            if url.len() > 2048 {
                return Err(ValidationError::TooLong {
                    field: "image_url".to_string(),
                    max: 2048,
                });
            }
            Ok(())
        }
        _ => Err(ValidationError::InvalidFormat {
            field: "image_url".to_string(),
            reason: "must be an http(s) URL".to_string(),
        }),
    }
}

pub fn validate_brand(brand: &str) -> ValidationResult<()> {
    validate_length("brand", brand, 1, 100)
}

pub fn validate_unit(unit: &str) -> ValidationResult<()> {
    validate_length("unit", unit, 1, 100)
}

/// Validates a barcode.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - ASCII letters and digits only
///
/// ```rust
/// use pharma_core::validation::validate_barcode;
///
/// assert!(validate_barcode("ABC123").is_ok());
/// assert!(validate_barcode("ABC-123").is_err());
/// ```
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    validate_length("barcode", barcode, 1, 50)?;

    if !barcode.trim().chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters and digits".to_string(),
        });
    }

    Ok(())
}

/// Search text for the sale-side catalog search.
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();
    validate_length("q", query, 1, 100)?;
    Ok(query.to_string())
}

/// Phone numbers in E.164-ish form: `+` followed by 10 to 15 digits.
///
/// ```rust
/// use pharma_core::validation::validate_phone_number;
///
/// assert!(validate_phone_number("+251911234567").is_ok());
/// assert!(validate_phone_number("0911234567").is_err());
/// ```
pub fn validate_phone_number(phone: &str) -> ValidationResult<()> {
    let invalid = || ValidationError::InvalidFormat {
        field: "phone_number".to_string(),
        reason: "must be + followed by 10 to 15 digits".to_string(),
    };

    let digits = phone.strip_prefix('+').ok_or_else(invalid)?;
    if !(10..=15).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    Ok(())
}

pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    if password.chars().count() < 8 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        });
    }
    if password.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }
    Ok(())
}

/// Password reset codes are exactly six digits.
pub fn validate_reset_code(code: &str) -> ValidationResult<()> {
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must be 6 digits".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// The same cap holds for the merged line: the cart upsert refuses to
/// grow a row past it.
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  POST /cart { medicine_variant_id, quantity: 5 }                       │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0?  → MustBePositive                                  │
/// │       ├── qty > 999? → OutOfRange                                      │
/// │       └── OK → cart::admit (tenancy + stock)                           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Unit prices are strictly positive (no free medicines) and capped at
/// [`MAX_PRICE_CENTS`].
///
/// ```rust
/// use pharma_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price_per_unit".to_string(),
        });
    }

    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "price_per_unit".to_string(),
            min: 1,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Expiry must be strictly after `now`.
pub fn validate_expiry(expiry: DateTime<Utc>, now: DateTime<Utc>) -> ValidationResult<()> {
    if expiry <= now {
        return Err(ValidationError::NotInFuture {
            field: "expiry_date".to_string(),
        });
    }

    Ok(())
}

/// Resolves optional limit/offset query values into a [`Page`].
pub fn validate_page(limit: Option<i64>, offset: Option<i64>) -> ValidationResult<Page> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = offset.unwrap_or(0);

    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: MAX_PAGE_SIZE,
        });
    }
    if offset < 0 {
        return Err(ValidationError::OutOfRange {
            field: "offset".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(Page { limit, offset })
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
///
/// ```rust
/// use pharma_core::validation::validate_uuid;
///
/// assert!(validate_uuid("medicine_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("medicine_id", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
