//! # Domain Types
//!
//! Persisted records and the read-side projections built from them.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Tenancy         Catalog                Sale capture                   │
//! │  ─────────       ──────────────         ─────────────────────          │
//! │  Pharmacy ◄───── Medicine ◄──────────── CartItem (user, variant)       │
//! │     ▲            │                        │                            │
//! │     │            ▼                        ▼ SaleEngine                 │
//! │  User            MedicineVariant ◄──── SaleItem ──► Sale ──► Receipt   │
//! │                  (barcode, stock)                   (1:1 snapshot)     │
//! │                                                                         │
//! │  Fulfillment (read-only): Hospital, Patient, Order, OrderItem          │
//! │                                                                         │
//! │  Projections (never written back):                                     │
//! │    CartLineView, CatalogHit, OrderSummary, OrderLineView, LiveVariant  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Monetary fields are integer cents and carry a `_cents` suffix; accessor
//! methods hand out [`Money`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::access::Role;
use crate::money::Money;

// =============================================================================
// Tenancy
// =============================================================================

/// A pharmacy: the tenancy boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Pharmacy {
    pub id: String,
    pub name: String,
    pub address: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// An account able to log in.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub phone_number: String,
    /// Argon2 PHC string. Never leaves the server.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    /// Absent for admins.
    pub pharmacy_id: Option<String>,
    pub profile_picture: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Catalog
// =============================================================================

/// A medicine owned by one pharmacy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Medicine {
    pub id: String,
    pub pharmacy_id: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A sellable packaging/brand of a medicine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MedicineVariant {
    pub id: String,
    pub medicine_id: String,
    pub brand: String,
    /// Globally unique across pharmacies.
    pub barcode: String,
    /// Unit label, e.g. "tablet", "bottle".
    pub unit: String,
    pub price_per_unit_cents: i64,
    #[ts(as = "String")]
    pub expiry_date: DateTime<Utc>,
    /// Never negative.
    pub stock: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl MedicineVariant {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_per_unit_cents)
    }

    /// Expired variants never show up in sale search.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date <= now
    }
}

/// A medicine together with its variants.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MedicineDetails {
    #[serde(flatten)]
    pub medicine: Medicine,
    pub variants: Vec<MedicineVariant>,
}

/// A sale-search result row (variant joined with its medicine).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CatalogHit {
    pub variant_id: String,
    pub medicine_id: String,
    pub medicine_name: String,
    pub brand: String,
    pub barcode: String,
    pub unit: String,
    pub price_per_unit_cents: i64,
    pub stock: i64,
    #[ts(as = "String")]
    pub expiry_date: DateTime<Utc>,
}

/// Live state of a variant as seen by the cart and the sale engine.
///
/// Always re-read from storage; never cached across requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LiveVariant {
    pub variant_id: String,
    pub medicine_id: String,
    pub medicine_name: String,
    /// Pharmacy owning the parent medicine.
    pub pharmacy_id: String,
    pub brand: String,
    pub price_per_unit_cents: i64,
    pub stock: i64,
}

impl LiveVariant {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_per_unit_cents)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// One staged (user, variant) line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CartItem {
    pub id: String,
    pub user_id: String,
    pub pharmacy_id: String,
    pub medicine_variant_id: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Cart line enriched for display.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CartLineView {
    pub id: String,
    pub pharmacy_id: String,
    pub medicine_variant_id: String,
    pub medicine_name: String,
    pub brand: String,
    pub unit: String,
    pub image_url: Option<String>,
    /// Current catalog price; the sale captures its own copy at confirmation.
    pub price_per_unit_cents: i64,
    pub quantity: i64,
    pub subtotal_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// A confirmed sale. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub user_id: String,
    pub pharmacy_id: String,
    pub total_price_cents: i64,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

/// A line of a sale. Uses the snapshot pattern: the price is frozen at
/// confirmation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub medicine_variant_id: String,
    pub quantity: i64,
    pub price_per_unit_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.price_per_unit_cents).multiply_quantity(self.quantity)
    }
}

/// A sale with its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDetails {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// Immutable audit copy of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Receipt {
    pub id: String,
    pub sale_id: String,
    pub content: ReceiptContent,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Snapshot stored as JSON alongside the receipt row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptContent {
    pub pharmacy_id: String,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    pub total_price_cents: i64,
    pub items: Vec<ReceiptLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptLine {
    pub brand: String,
    pub medicine_name: String,
    pub price_per_unit_cents: i64,
    pub quantity: i64,
    pub subtotal_cents: i64,
}

// =============================================================================
// Hospital Orders (read-only)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Hospital {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Patient {
    pub id: String,
    pub full_name: String,
    pub phone_number: String,
    pub emergency_phone_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub hospital_id: String,
    pub patient_id: String,
    pub pharmacy_id: String,
    #[ts(as = "String")]
    pub order_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub medicine_variant_id: String,
    pub quantity: i64,
    pub price_per_unit_cents: i64,
}

/// Order list row with hospital and patient names joined in.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderSummary {
    pub id: String,
    pub pharmacy_id: String,
    pub hospital_name: String,
    pub patient_name: String,
    #[ts(as = "String")]
    pub order_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLineView {
    pub medicine_name: String,
    pub unit: String,
    pub quantity: i64,
    pub price_per_unit_cents: i64,
}

/// Full fulfillment view of one order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetails {
    pub id: String,
    pub pharmacy_id: String,
    pub hospital_name: String,
    #[ts(as = "String")]
    pub order_date: DateTime<Utc>,
    pub patient: Patient,
    pub items: Vec<OrderLineView>,
    pub total_price_cents: i64,
}

impl OrderDetails {
    /// Sum of `quantity × price` over the lines.
    pub fn total_of(items: &[OrderLineView]) -> Money {
        items
            .iter()
            .map(|i| Money::from_cents(i.price_per_unit_cents).multiply_quantity(i.quantity))
            .sum()
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Limit/offset window for list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Page {
            limit: crate::DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
