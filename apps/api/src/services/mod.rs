//! # Service Layer
//!
//! One service per area. Each call follows the same shape:
//!
//! ```text
//! authorize(caller, op) ──► validate input ──► load + scope.ensure ──► repository
//!        │                        │                    │
//!        └── Unauthorized         └── InvalidInput     └── *NotFound / Unauthorized
//! ```
//!
//! Services return `CoreResult`; the HTTP layer maps errors to status codes.
//! [`auth_service`] is the exception: it also signs tokens, so it returns
//! `ApiResult` directly.

pub mod auth_service;
pub mod cart_service;
pub mod catalog_service;
pub mod order_service;
pub mod pharmacy_service;
pub mod sale_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use cart_service::CartService;
pub use catalog_service::CatalogService;
pub use order_service::OrderService;
pub use pharmacy_service::PharmacyService;
pub use sale_service::SaleService;
pub use user_service::UserService;
