//! # Cart Admission
//!
//! Pure rules deciding whether a line may enter (or stay in) a cart.
//! Persistence is an atomic upsert in pharma-db; nothing here touches storage.
//!
//! ```text
//! add_to_cart(variant, qty)
//!      │
//!      ├── validate_quantity(qty)            1..=999
//!      ├── scope.ensure(live.pharmacy_id)    tenancy
//!      └── qty <= live.stock                 stock
//!              │
//!              ▼
//!      INSERT … ON CONFLICT(user_id, medicine_variant_id)
//!        DO UPDATE SET quantity = carts.quantity + excluded.quantity
//! ```
//!
//! Admission is advisory: stock is re-checked by the guarded update at
//! confirmation, which is the only enforcement point.

use crate::access::Scope;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CartLineView, LiveVariant};
use crate::validation::validate_quantity;

/// Decides whether `quantity` of `live` may be added by a caller in `scope`.
pub fn admit(scope: &Scope, live: &LiveVariant, quantity: i64) -> CoreResult<()> {
    validate_quantity(quantity)?;

    if !scope.admits(&live.pharmacy_id) {
        return Err(CoreError::unauthorized(
            "variant belongs to another pharmacy",
        ));
    }

    if quantity > live.stock {
        return Err(CoreError::InsufficientStock {
            variant_id: live.variant_id.clone(),
            available: live.stock,
            requested: quantity,
        });
    }

    Ok(())
}

/// Fails if any line of a loaded cart lies outside `scope`.
pub fn ensure_lines_in_scope(scope: &Scope, lines: &[CartLineView]) -> CoreResult<()> {
    lines.iter().try_for_each(|line| scope.ensure(&line.pharmacy_id))
}

/// Sum of line subtotals at current catalog prices.
pub fn cart_total(lines: &[CartLineView]) -> Money {
    lines
        .iter()
        .map(|l| Money::from_cents(l.subtotal_cents))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn live(pharmacy: &str, stock: i64) -> LiveVariant {
        LiveVariant {
            variant_id: "v-1".to_string(),
            medicine_id: "m-1".to_string(),
            medicine_name: "Paracetamol".to_string(),
            pharmacy_id: pharmacy.to_string(),
            brand: "Panadol".to_string(),
            price_per_unit_cents: 1000,
            stock,
        }
    }

    fn line(pharmacy: &str, subtotal: i64) -> CartLineView {
        CartLineView {
            id: "c-1".to_string(),
            pharmacy_id: pharmacy.to_string(),
            medicine_variant_id: "v-1".to_string(),
            medicine_name: "Paracetamol".to_string(),
            brand: "Panadol".to_string(),
            unit: "tablet".to_string(),
            image_url: None,
            price_per_unit_cents: 1000,
            quantity: subtotal / 1000,
            subtotal_cents: subtotal,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_admit_within_stock() {
        let scope = Scope::Pharmacy("p1".to_string());
        assert!(admit(&scope, &live("p1", 5), 3).is_ok());
        assert!(admit(&scope, &live("p1", 5), 5).is_ok());
    }

    #[test]
    fn test_admit_rejects_other_pharmacy() {
        let scope = Scope::Pharmacy("p2".to_string());
        assert!(matches!(
            admit(&scope, &live("p1", 5), 1),
            Err(CoreError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_admit_rejects_over_stock() {
        let scope = Scope::Pharmacy("p1".to_string());
        match admit(&scope, &live("p1", 2), 3) {
            Err(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }
    }

    #[test]
    fn test_admit_rejects_bad_quantity() {
        let scope = Scope::Pharmacy("p1".to_string());
        assert!(matches!(
            admit(&scope, &live("p1", 5), 0),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_lines_scope_and_total() {
        let scope = Scope::Pharmacy("p1".to_string());
        let lines = vec![line("p1", 3000), line("p1", 1000)];
        assert!(ensure_lines_in_scope(&scope, &lines).is_ok());
        assert_eq!(cart_total(&lines).cents(), 4000);

        let mixed = vec![line("p1", 1000), line("p2", 1000)];
        assert!(ensure_lines_in_scope(&scope, &mixed).is_err());
    }
}
