//! # Repository Module
//!
//! One repository per aggregate. Each holds a pool clone and exposes plain
//! async methods; SQL never leaks past this module.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Service (apps/api)                                                    │
//! │       │  db.variants().search(pharmacy, "para", now, 50)               │
//! │       ▼                                                                 │
//! │  VariantRepository ── SQL ──► SQLite                                   │
//! │                                                                         │
//! │  Sale confirmation is the exception: SaleEngine (pharma-core) drives   │
//! │  SaleRepository through the SaleStore port, and commit_sale runs every │
//! │  statement on one transaction.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`PharmacyRepository`] - Tenancy roots
//! - [`UserRepository`] - Accounts and credentials
//! - [`AuthCodeRepository`] - Password reset codes
//! - [`MedicineRepository`] / [`VariantRepository`] - Catalog and sale search
//! - [`CartRepository`] - Atomic cart upsert and enriched cart view
//! - [`SaleRepository`] - Sale reads and the sale unit of work
//! - [`OrderRepository`] - Hospital order queries

pub mod auth;
pub mod cart;
pub mod medicine;
pub mod order;
pub mod pharmacy;
pub mod sale;
pub mod user;
pub mod variant;

pub use auth::{AuthCodeRepository, OneTimeCode};
pub use cart::CartRepository;
pub use medicine::MedicineRepository;
pub use order::OrderRepository;
pub use pharmacy::PharmacyRepository;
pub use sale::SaleRepository;
pub use user::UserRepository;
pub use variant::VariantRepository;

/// Generates a new entity ID.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// =============================================================================
// Test Fixtures
// =============================================================================
