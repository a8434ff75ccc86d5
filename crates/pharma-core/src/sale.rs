//! # Sale Engine
//!
//! Converts a user's cart into one atomic multi-item sale: stock decrement,
//! sale lines and an immutable receipt, all or nothing.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sale Confirmation                                │
//! │                                                                         │
//! │  ┌───────────┐  load + re-fetch   ┌───────────┐  commit_sale  ┌─────────┐
//! │  │ Open Cart │ ─────────────────► │ Validated │ ────────────► │Committed│
//! │  └───────────┘                    └───────────┘               └─────────┘
//! │       │                                 │                               │
//! │       │ EmptyCart / VariantNotFound     │ InsufficientStock (guarded    │
//! │       │ Unauthorized / InsufficientStock│ UPDATE hit 0 rows) / Storage  │
//! │       ▼                                 ▼                               │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │ Aborted: no sale, no stock change,      │                           │
//! │  │ no receipt, cart untouched              │                           │
//! │  └─────────────────────────────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ports
//! The engine never sees a database. It talks to a [`SaleStore`], whose
//! `commit_sale` is a single unit of work. The stock check performed by
//! [`plan`] is a fast-fail; the guarded conditional update inside the unit of
//! work is what actually prevents overselling under concurrency.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::access::{authorize, Caller, Operation};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CartItem, LiveVariant, Receipt, ReceiptContent, ReceiptLine, Sale, SaleItem};

// =============================================================================
// Draft & Result
// =============================================================================

/// Units a sale takes out of one cart row.
///
/// Only `quantity` is consumed; units merged into the row after it was
/// read stay in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumedLine {
    pub cart_id: String,
    pub quantity: i64,
}

/// Everything the unit of work must persist for one confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleDraft {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub receipt: Receipt,
    /// Cart rows drawn down inside the same transaction.
    pub consumed: Vec<ConsumedLine>,
}

/// What a successful confirmation returns to the caller.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConfirmedSale {
    pub sale_id: String,
    pub receipt: Receipt,
}

// =============================================================================
// Storage Port
// =============================================================================

/// Storage operations the engine depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SaleStore: Send + Sync {
    /// All cart rows of a user, oldest first.
    async fn cart_lines(&self, user_id: &str) -> CoreResult<Vec<CartItem>>;

    /// Current variant state joined with its medicine. `None` if deleted.
    async fn live_variant(&self, variant_id: &str) -> CoreResult<Option<LiveVariant>>;

    /// Persists the draft atomically.
    ///
    /// Must apply `stock = stock - q WHERE stock >= q` per item and fail with
    /// [`CoreError::InsufficientStock`] (rolling back) when a guard misses.
    /// Each consumed cart row loses exactly its planned quantity.
    async fn commit_sale(&self, draft: &SaleDraft) -> CoreResult<()>;
}

// =============================================================================
// Planning (pure)
// =============================================================================

/// Builds the sale from cart rows paired with their live variants.
///
/// ## Checks, per line
/// - `line.pharmacy_id == live.pharmacy_id == pharmacy_id` else Unauthorized
/// - `live.stock >= line.quantity` else InsufficientStock
///
/// Prices come from `live`, never from the cart. The total is the exact
/// integer sum of line subtotals; a subtotal or total that does not fit in
/// `i64` cents is rejected as invalid input.
pub fn plan(
    user_id: &str,
    pharmacy_id: &str,
    lines: &[(CartItem, LiveVariant)],
    now: DateTime<Utc>,
) -> CoreResult<SaleDraft> {
    if lines.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let sale_id = Uuid::new_v4().to_string();
    let mut total = Money::zero();
    let mut items = Vec::with_capacity(lines.len());
    let mut receipt_lines = Vec::with_capacity(lines.len());
    let mut consumed = Vec::with_capacity(lines.len());

    for (line, live) in lines {
        if line.pharmacy_id != pharmacy_id || live.pharmacy_id != pharmacy_id {
            return Err(CoreError::unauthorized(format!(
                "cart line {} is not in the caller's pharmacy",
                line.id
            )));
        }

        if live.stock < line.quantity {
            return Err(CoreError::InsufficientStock {
                variant_id: live.variant_id.clone(),
                available: live.stock,
                requested: line.quantity,
            });
        }

        let subtotal = live
            .price()
            .checked_multiply_quantity(line.quantity)
            .ok_or_else(|| amount_overflow("subtotal"))?;
        total = total
            .checked_add(subtotal)
            .ok_or_else(|| amount_overflow("total_price"))?;

        items.push(SaleItem {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.clone(),
            medicine_variant_id: live.variant_id.clone(),
            quantity: line.quantity,
            price_per_unit_cents: live.price_per_unit_cents,
        });

        receipt_lines.push(ReceiptLine {
            brand: live.brand.clone(),
            medicine_name: live.medicine_name.clone(),
            price_per_unit_cents: live.price_per_unit_cents,
            quantity: line.quantity,
            subtotal_cents: subtotal.cents(),
        });

        consumed.push(ConsumedLine {
            cart_id: line.id.clone(),
            quantity: line.quantity,
        });
    }

    let sale = Sale {
        id: sale_id.clone(),
        user_id: user_id.to_string(),
        pharmacy_id: pharmacy_id.to_string(),
        total_price_cents: total.cents(),
        sale_date: now,
    };

    let receipt = Receipt {
        id: Uuid::new_v4().to_string(),
        sale_id,
        content: ReceiptContent {
            pharmacy_id: pharmacy_id.to_string(),
            sale_date: now,
            total_price_cents: total.cents(),
            items: receipt_lines,
        },
        created_at: now,
    };

    Ok(SaleDraft {
        sale,
        items,
        receipt,
        consumed,
    })
}

fn amount_overflow(field: &str) -> CoreError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
    .into()
}

// =============================================================================
// Engine
// =============================================================================

/// Storage-agnostic confirmation workflow.
#[derive(Clone)]
pub struct SaleEngine {
    store: Arc<dyn SaleStore>,
}

impl SaleEngine {
    pub fn new(store: Arc<dyn SaleStore>) -> Self {
        SaleEngine { store }
    }

    /// Confirms the caller's cart as one sale.
    pub async fn confirm(&self, caller: &Caller) -> CoreResult<ConfirmedSale> {
        let scope = authorize(caller, Operation::ConfirmSale)?;
        let pharmacy_id = scope.home_pharmacy()?;

        let cart = self.store.cart_lines(&caller.user_id).await?;
        if cart.is_empty() {
            tracing::debug!(user_id = %caller.user_id, "Confirm on empty cart");
            return Err(CoreError::EmptyCart);
        }

        let mut lines = Vec::with_capacity(cart.len());
        for line in cart {
            let live = self
                .store
                .live_variant(&line.medicine_variant_id)
                .await?
                .ok_or_else(|| CoreError::VariantNotFound(line.medicine_variant_id.clone()))?;
            lines.push((line, live));
        }

        let draft = plan(&caller.user_id, pharmacy_id, &lines, Utc::now())?;

        if let Err(e) = self.store.commit_sale(&draft).await {
            tracing::warn!(
                user_id = %caller.user_id,
                pharmacy_id = %pharmacy_id,
                error = %e,
                "Sale aborted"
            );
            return Err(e);
        }

        tracing::info!(
            sale_id = %draft.sale.id,
            pharmacy_id = %pharmacy_id,
            items = draft.items.len(),
            total = %draft.sale.total(),
            "Sale confirmed"
        );

        Ok(ConfirmedSale {
            sale_id: draft.sale.id,
            receipt: draft.receipt,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
