//! # pharma-db: Database Layer for the Pharmacy Backend
//!
//! SQLite storage through sqlx: connection pool, embedded migrations, one
//! repository per aggregate, and the transactional implementation of the
//! sale engine's `SaleStore` port.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Pharmacy Backend Data Flow                        │
//! │                                                                         │
//! │  apps/api service (e.g. cart_service::add_item)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     pharma-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ pharmacy, user │    │  (embedded)  │  │   │
//! │  │   │               │◄───│ medicine,      │    │ 001_initial  │  │   │
//! │  │   │ SqlitePool    │    │ variant, cart, │    │ 002_codes    │  │   │
//! │  │   │ WAL, FKs on   │    │ sale, order    │    │ 003_orders   │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (DATABASE_PATH) or :memory: in tests                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - `DbError` and its mapping into `CoreError`
//! - [`password`] - Argon2 credential hashing
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pharma_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./pharmacy.db")).await?;
//! let cart = db.carts().view(&user_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod password;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::{
    AuthCodeRepository, CartRepository, MedicineRepository, OneTimeCode, OrderRepository,
    PharmacyRepository, SaleRepository, UserRepository, VariantRepository,
};
