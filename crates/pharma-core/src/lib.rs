//! # pharma-core: Pure Domain Logic for the Pharmacy Backend
//!
//! Everything that decides *whether* something may happen and *what* it
//! amounts to lives here, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Pharmacy Backend Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │   bearer token ──► Caller ──► service ──► JSON response        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pharma-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌──────────────┐   │   │
//! │  │   │  access  │  │   cart   │  │   sale   │  │  validation  │   │   │
//! │  │   │  Role    │  │  admit   │  │  plan    │  │  money       │   │   │
//! │  │   │  Scope   │  │          │  │  Engine  │  │  types       │   │   │
//! │  │   └──────────┘  └──────────┘  └────┬─────┘  └──────────────┘   │   │
//! │  │                                    │ SaleStore port             │   │
//! │  └────────────────────────────────────┼────────────────────────────┘   │
//! │                                       │                                 │
//! │  ┌────────────────────────────────────▼────────────────────────────┐   │
//! │  │                    pharma-db (SQLite)                           │   │
//! │  │        repositories, migrations, sale unit of work              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`access`] - Roles, callers, the capability table and tenancy scopes
//! - [`cart`] - Cart admission rule
//! - [`sale`] - Sale planning and the storage-agnostic [`sale::SaleEngine`]
//! - [`types`] - Persisted records and read-side projections
//! - [`money`] - Integer money
//! - [`error`] - Domain error taxonomy
//! - [`validation`] - Field rules
//!
//! ## Example Usage
//!
//! ```rust
//! use pharma_core::access::{authorize, Caller, Operation, Role};
//!
//! let pharmacist = Caller::new("u-1", Role::Pharmacist, Some("p-1".to_string()));
//! let scope = authorize(&pharmacist, Operation::ManageCart).unwrap();
//! assert_eq!(scope.pharmacy_filter(), Some("p-1"));
//!
//! // Pharmacists cannot delete medicines
//! assert!(authorize(&pharmacist, Operation::DeleteMedicine).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod cart;
pub mod error;
pub mod money;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use access::{authorize, Caller, Operation, Role, Scope};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single variant in one cart line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest accepted unit price, in cents (10,000,000.00).
///
/// Keeps `price × MAX_ITEM_QUANTITY` and cart totals far inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;

/// Default page size for list endpoints (sales, orders).
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Upper bound for a single page.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Maximum rows returned by the sale-side catalog search.
pub const SEARCH_RESULT_LIMIT: i64 = 50;
