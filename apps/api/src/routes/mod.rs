//! # HTTP Routes
//!
//! Thin axum handlers: extract, call the service, wrap the result.
//!
//! ```text
//! /health                                   GET            (public)
//! /auth/login, /auth/refresh                POST           (public)
//! /auth/forgot-password, /reset-password    POST           (public)
//! /auth/profile                             GET PUT
//! /users/owners                             POST
//! /users/pharmacists                        GET POST
//! /pharmacies[/{id}]                        GET POST PUT DELETE
//! /medicines[/{id}], /medicines/search      GET POST PUT DELETE
//! /medicines/{id}/variants[/{variant_id}]   GET POST PUT DELETE
//! /cart[/{id}]                              GET POST DELETE
//! /sales/confirm, /sales[/{id}[/receipt]]   POST GET
//! /orders[/{id}]                            GET
//! ```
//!
//! Every non-public handler takes an [`AuthCaller`](crate::auth::AuthCaller)
//! first, so an unauthenticated request is refused before any body parsing.

use serde::Deserialize;

use pharma_core::validation::validate_page;
use pharma_core::{CoreError, Page};

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod pharmacies;
pub mod sales;
pub mod users;

/// `?limit=&offset=` on list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> Result<Page, CoreError> {
        Ok(validate_page(self.limit, self.offset)?)
    }
}
