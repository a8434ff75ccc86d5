//! # Cart Service
//!
//! Per-user staging area for a sale. A line is admitted against the live
//! variant (tenancy + stock), then merged into the cart with one atomic
//! upsert. Lines leave the cart either by removal or by being consumed
//! inside the sale transaction.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use pharma_core::cart::{admit, cart_total, ensure_lines_in_scope};
use pharma_core::validation::{validate_quantity, validate_uuid};
use pharma_core::{
    authorize, Caller, CartItem, CartLineView, CoreError, CoreResult, Operation,
};
use pharma_db::{Database, DbError};

/// Payload for adding a variant to the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddToCart {
    pub medicine_variant_id: String,
    pub quantity: i64,
}

/// The caller's cart with its running total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total_price_cents: i64,
}

#[derive(Debug, Clone)]
pub struct CartService {
    db: Database,
}

impl CartService {
    pub fn new(db: Database) -> Self {
        CartService { db }
    }

    /// Adds `quantity` of a variant. Adding the same variant again
    /// accumulates into the existing line.
    pub async fn add(&self, caller: &Caller, input: AddToCart) -> CoreResult<CartItem> {
        let scope = authorize(caller, Operation::ManageCart)?;
        let pharmacy_id = scope.home_pharmacy()?;

        validate_uuid("medicine_variant_id", &input.medicine_variant_id)?;
        validate_quantity(input.quantity)?;

        let live = self
            .db
            .variants()
            .live(&input.medicine_variant_id)
            .await?
            .ok_or_else(|| CoreError::VariantNotFound(input.medicine_variant_id.clone()))?;

        admit(&scope, &live, input.quantity)?;

        let item = self
            .db
            .carts()
            .add(
                &caller.user_id,
                pharmacy_id,
                &input.medicine_variant_id,
                input.quantity,
            )
            .await?;

        info!(
            user_id = %caller.user_id,
            variant_id = %item.medicine_variant_id,
            quantity = item.quantity,
            "Cart line staged"
        );
        Ok(item)
    }

    pub async fn view(&self, caller: &Caller) -> CoreResult<CartView> {
        let scope = authorize(caller, Operation::ManageCart)?;

        let items = self.db.carts().view(&caller.user_id).await?;
        ensure_lines_in_scope(&scope, &items)?;

        let total = cart_total(&items);
        Ok(CartView {
            items,
            total_price_cents: total.cents(),
        })
    }

    /// Removes one of the caller's own lines.
    pub async fn remove(&self, caller: &Caller, id: &str) -> CoreResult<()> {
        let scope = authorize(caller, Operation::ManageCart)?;
        let pharmacy_id = scope.home_pharmacy()?;

        if self
            .db
            .carts()
            .find_own(&caller.user_id, pharmacy_id, id)
            .await?
            .is_none()
        {
            debug!(user_id = %caller.user_id, id = %id, "Cart line not in caller's cart");
            return Err(CoreError::CartItemNotFound(id.to_string()));
        }

        self.db
            .carts()
            .remove(&caller.user_id, id)
            .await
            .map_err(|e| match e {
                DbError::NotFound { .. } => CoreError::CartItemNotFound(id.to_string()),
                other => other.into(),
            })
    }
}
