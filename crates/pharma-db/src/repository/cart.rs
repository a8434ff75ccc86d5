//! # Cart Repository
//!
//! Staged (user, variant) lines. The pair is unique, so adding the same
//! variant again merges into one row in a single atomic statement:
//!
//! ```text
//! INSERT INTO carts (...) VALUES (...)
//! ON CONFLICT(user_id, medicine_variant_id)
//!     DO UPDATE SET quantity = carts.quantity + excluded.quantity
//!     WHERE carts.quantity + excluded.quantity <= MAX_ITEM_QUANTITY
//! ```
//!
//! Rows are removed by the owner or consumed by the sale unit of work.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use pharma_core::{CartItem, CartLineView, MAX_ITEM_QUANTITY};

pub(crate) const CART_ITEM_COLUMNS: &str =
    "id, user_id, pharmacy_id, medicine_variant_id, quantity, created_at";

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Adds `quantity` of a variant, merging with an existing line.
    ///
    /// Returns the resulting row (with the accumulated quantity). A merge
    /// that would push the line past [`MAX_ITEM_QUANTITY`] changes nothing
    /// and fails with [`DbError::LimitExceeded`].
    pub async fn add(
        &self,
        user_id: &str,
        pharmacy_id: &str,
        variant_id: &str,
        quantity: i64,
    ) -> DbResult<CartItem> {
        debug!(user_id = %user_id, variant_id = %variant_id, quantity, "Adding to cart");

        let sql = format!(
            "INSERT INTO carts (id, user_id, pharmacy_id, medicine_variant_id, quantity, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
             ON CONFLICT(user_id, medicine_variant_id) \
                 DO UPDATE SET quantity = carts.quantity + excluded.quantity \
                 WHERE carts.quantity + excluded.quantity <= ?7 \
             RETURNING {CART_ITEM_COLUMNS}"
        );

        let item = sqlx::query_as::<_, CartItem>(&sql)
            .bind(new_id())
            .bind(user_id)
            .bind(pharmacy_id)
            .bind(variant_id)
            .bind(quantity)
            .bind(Utc::now())
            .bind(MAX_ITEM_QUANTITY)
            .fetch_optional(&self.pool)
            .await?;

        item.ok_or_else(|| DbError::LimitExceeded {
            field: "quantity".to_string(),
            max: MAX_ITEM_QUANTITY,
        })
    }

    /// Raw lines of a user, oldest first.
    pub async fn lines(&self, user_id: &str) -> DbResult<Vec<CartItem>> {
        let sql = format!(
            "SELECT {CART_ITEM_COLUMNS} FROM carts WHERE user_id = ?1 ORDER BY created_at, id"
        );
        let items = sqlx::query_as::<_, CartItem>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Lines enriched with medicine name, brand, unit, image and live price.
    pub async fn view(&self, user_id: &str) -> DbResult<Vec<CartLineView>> {
        let lines = sqlx::query_as::<_, CartLineView>(
            "SELECT c.id, c.pharmacy_id, c.medicine_variant_id, m.name AS medicine_name, \
                    v.brand, v.unit, m.image_url, v.price_per_unit_cents, c.quantity, \
                    v.price_per_unit_cents * c.quantity AS subtotal_cents, c.created_at \
             FROM carts c \
             JOIN medicine_variants v ON v.id = c.medicine_variant_id \
             JOIN medicines m ON m.id = v.medicine_id \
             WHERE c.user_id = ?1 \
             ORDER BY c.created_at, c.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Finds a line by id among the user's own lines in one pharmacy.
    pub async fn find_own(
        &self,
        user_id: &str,
        pharmacy_id: &str,
        id: &str,
    ) -> DbResult<Option<CartItem>> {
        let sql = format!(
            "SELECT {CART_ITEM_COLUMNS} FROM carts \
             WHERE id = ?1 AND user_id = ?2 AND pharmacy_id = ?3"
        );
        let item = sqlx::query_as::<_, CartItem>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(pharmacy_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(item)
    }

    /// Deletes a line; constrained by owner so a stray id can't reach
    /// another user's cart.
    pub async fn remove(&self, user_id: &str, id: &str) -> DbResult<()> {
        debug!(user_id = %user_id, id = %id, "Removing cart line");

        let result = sqlx::query("DELETE FROM carts WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CartItem", id));
        }

        Ok(())
    }
}
