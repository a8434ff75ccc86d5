//! # Sale Repository
//!
//! Sale reads, and the storage side of sale confirmation.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  commit_sale(draft)                                                     │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   ├── INSERT sales                     (takes the write lock first)    │
//! │   ├── for each item:                                                   │
//! │   │     UPDATE medicine_variants SET stock = stock - q                 │
//! │   │       WHERE id = ? AND stock >= q                                  │
//! │   │     0 rows? → InsufficientStock, drop tx (ROLLBACK)                │
//! │   │     INSERT sale_items                                              │
//! │   ├── INSERT receipts (JSON snapshot)                                  │
//! │   ├── per consumed cart row (user-constrained):                       │
//! │   │     DELETE ... WHERE quantity = q     (row holds exactly q)        │
//! │   │     else UPDATE SET quantity = quantity - q WHERE quantity > q     │
//! │   │     neither? → Conflict, ROLLBACK (row shrank or vanished)         │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every statement runs on the transaction's connection. Reaching for the
//! pool while holding the transaction would deadlock a one-connection pool
//! and would escape atomicity on a larger one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::cart::CART_ITEM_COLUMNS;
use crate::repository::variant::LIVE_VARIANT_SQL;
use pharma_core::sale::{ConsumedLine, SaleDraft, SaleStore};
use pharma_core::{
    CartItem, CoreError, CoreResult, LiveVariant, Page, Receipt, ReceiptContent, Sale, SaleItem,
};

/// Receipt row as stored; `content` is JSON text.
#[derive(Debug, sqlx::FromRow)]
struct ReceiptRow {
    id: String,
    sale_id: String,
    content: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReceiptRow> for Receipt {
    type Error = DbError;

    fn try_from(row: ReceiptRow) -> Result<Self, Self::Error> {
        let content: ReceiptContent = serde_json::from_str(&row.content)?;
        Ok(Receipt {
            id: row.id,
            sale_id: row.sale_id,
            content,
            created_at: row.created_at,
        })
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            "SELECT id, user_id, pharmacy_id, total_price_cents, sale_date FROM sales WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Newest first. `None` means every pharmacy.
    pub async fn list(&self, pharmacy_filter: Option<&str>, page: Page) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            "SELECT id, user_id, pharmacy_id, total_price_cents, sale_date FROM sales \
             WHERE (?1 IS NULL OR pharmacy_id = ?1) \
             ORDER BY sale_date DESC, id \
             LIMIT ?2 OFFSET ?3",
        )
        .bind(pharmacy_filter)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    pub async fn items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT id, sale_id, medicine_variant_id, quantity, price_per_unit_cents \
             FROM sale_items WHERE sale_id = ?1 ORDER BY rowid",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn receipt_for_sale(&self, sale_id: &str) -> DbResult<Option<Receipt>> {
        let row = sqlx::query_as::<_, ReceiptRow>(
            "SELECT id, sale_id, content, created_at FROM receipts WHERE sale_id = ?1",
        )
        .bind(sale_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Receipt::try_from).transpose()
    }

    /// Persists a planned sale atomically (see module docs).
    pub async fn commit(&self, draft: &SaleDraft) -> CoreResult<()> {
        let sale = &draft.sale;
        debug!(sale_id = %sale.id, items = draft.items.len(), "Committing sale");

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        sqlx::query(
            "INSERT INTO sales (id, user_id, pharmacy_id, total_price_cents, sale_date) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&sale.id)
        .bind(&sale.user_id)
        .bind(&sale.pharmacy_id)
        .bind(sale.total_price_cents)
        .bind(sale.sale_date)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        for item in &draft.items {
            decrement_stock(&mut tx, &item.medicine_variant_id, item.quantity).await?;

            sqlx::query(
                "INSERT INTO sale_items (id, sale_id, medicine_variant_id, quantity, \
                                         price_per_unit_cents) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.medicine_variant_id)
            .bind(item.quantity)
            .bind(item.price_per_unit_cents)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;
        }

        let content = serde_json::to_string(&draft.receipt.content).map_err(DbError::from)?;
        sqlx::query("INSERT INTO receipts (id, sale_id, content, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&draft.receipt.id)
            .bind(&draft.receipt.sale_id)
            .bind(content)
            .bind(draft.receipt.created_at)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

        for line in &draft.consumed {
            consume_cart_line(&mut tx, &sale.user_id, line).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(sale_id = %sale.id, total_cents = sale.total_price_cents, "Sale committed");
        Ok(())
    }
}

/// Guarded conditional decrement. On a miss, reports the stock seen inside
/// the same transaction.
async fn decrement_stock(
    tx: &mut Transaction<'_, Sqlite>,
    variant_id: &str,
    quantity: i64,
) -> CoreResult<()> {
    let result = sqlx::query(
        "UPDATE medicine_variants SET stock = stock - ?2 WHERE id = ?1 AND stock >= ?2",
    )
    .bind(variant_id)
    .bind(quantity)
    .execute(&mut **tx)
    .await
    .map_err(DbError::from)?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    let available: Option<i64> =
        sqlx::query_scalar("SELECT stock FROM medicine_variants WHERE id = ?1")
            .bind(variant_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(DbError::from)?;

    match available {
        Some(available) => {
            debug!(variant_id = %variant_id, available, requested = quantity, "Stock guard missed");
            Err(CoreError::InsufficientStock {
                variant_id: variant_id.to_string(),
                available,
                requested: quantity,
            })
        }
        None => Err(CoreError::VariantNotFound(variant_id.to_string())),
    }
}

/// Takes exactly the planned units out of a cart row. Units merged in after
/// the cart was read are left behind.
async fn consume_cart_line(
    tx: &mut Transaction<'_, Sqlite>,
    user_id: &str,
    line: &ConsumedLine,
) -> CoreResult<()> {
    let deleted = sqlx::query("DELETE FROM carts WHERE id = ?1 AND user_id = ?2 AND quantity = ?3")
        .bind(&line.cart_id)
        .bind(user_id)
        .bind(line.quantity)
        .execute(&mut **tx)
        .await
        .map_err(DbError::from)?;

    if deleted.rows_affected() == 1 {
        return Ok(());
    }

    let reduced = sqlx::query(
        "UPDATE carts SET quantity = quantity - ?3 \
         WHERE id = ?1 AND user_id = ?2 AND quantity > ?3",
    )
    .bind(&line.cart_id)
    .bind(user_id)
    .bind(line.quantity)
    .execute(&mut **tx)
    .await
    .map_err(DbError::from)?;

    if reduced.rows_affected() == 1 {
        debug!(cart_id = %line.cart_id, taken = line.quantity, "Cart line partially consumed");
        return Ok(());
    }

    debug!(cart_id = %line.cart_id, "Cart line changed under the sale");
    Err(CoreError::Conflict(format!(
        "cart line {} changed during confirmation",
        line.cart_id
    )))
}

#[async_trait]
impl SaleStore for SaleRepository {
    async fn cart_lines(&self, user_id: &str) -> CoreResult<Vec<CartItem>> {
        let sql = format!(
            "SELECT {CART_ITEM_COLUMNS} FROM carts WHERE user_id = ?1 ORDER BY created_at, id"
        );
        let lines = sqlx::query_as::<_, CartItem>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        Ok(lines)
    }

    async fn live_variant(&self, variant_id: &str) -> CoreResult<Option<LiveVariant>> {
        let live = sqlx::query_as::<_, LiveVariant>(LIVE_VARIANT_SQL)
            .bind(variant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;

        Ok(live)
    }

    async fn commit_sale(&self, draft: &SaleDraft) -> CoreResult<()> {
        self.commit(draft).await
    }
}

// =============================================================================
// Tests
// =============================================================================
