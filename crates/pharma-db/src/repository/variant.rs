//! # Variant Repository
//!
//! Sellable units: barcode, price, expiry and stock.
//!
//! ## Who Writes Stock
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  update()            absolute value (restock by owner/admin)           │
//! │  SaleRepository      stock = stock - q WHERE stock >= q  (sales only)  │
//! │  CHECK (stock >= 0)  last line of defense                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Sale Search
//! Name/brand substring or exact barcode, within one pharmacy, excluding
//! expired and out-of-stock variants. `now` is always bound from Rust so
//! that stored and compared timestamps share one text encoding.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use pharma_core::{CatalogHit, LiveVariant, MedicineVariant};

const VARIANT_COLUMNS: &str = "id, medicine_id, brand, barcode, unit, price_per_unit_cents, \
                               expiry_date, stock, created_at, updated_at";

/// Live variant projection, shared with the sale unit of work.
pub(crate) const LIVE_VARIANT_SQL: &str = "\
    SELECT v.id AS variant_id, v.medicine_id, m.name AS medicine_name, m.pharmacy_id, \
           v.brand, v.price_per_unit_cents, v.stock \
    FROM medicine_variants v \
    JOIN medicines m ON m.id = v.medicine_id \
    WHERE v.id = ?1";

/// Repository for variant database operations.
#[derive(Debug, Clone)]
pub struct VariantRepository {
    pool: SqlitePool,
}

impl VariantRepository {
    pub fn new(pool: SqlitePool) -> Self {
        VariantRepository { pool }
    }

    /// Inserts a variant. A barcode clash surfaces as
    /// `UniqueViolation { field: "medicine_variants.barcode", value: <barcode> }`.
    pub async fn insert(&self, variant: &MedicineVariant) -> DbResult<()> {
        debug!(id = %variant.id, barcode = %variant.barcode, "Inserting variant");

        sqlx::query(
            "INSERT INTO medicine_variants (id, medicine_id, brand, barcode, unit, \
                                            price_per_unit_cents, expiry_date, stock, \
                                            created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&variant.id)
        .bind(&variant.medicine_id)
        .bind(&variant.brand)
        .bind(&variant.barcode)
        .bind(&variant.unit)
        .bind(variant.price_per_unit_cents)
        .bind(variant.expiry_date)
        .bind(variant.stock)
        .bind(variant.created_at)
        .bind(variant.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| with_barcode(e, &variant.barcode))?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<MedicineVariant>> {
        let sql = format!("SELECT {VARIANT_COLUMNS} FROM medicine_variants WHERE id = ?1");
        let variant = sqlx::query_as::<_, MedicineVariant>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(variant)
    }

    pub async fn list_for_medicine(&self, medicine_id: &str) -> DbResult<Vec<MedicineVariant>> {
        let sql = format!(
            "SELECT {VARIANT_COLUMNS} FROM medicine_variants WHERE medicine_id = ?1 \
             ORDER BY brand, id"
        );
        let variants = sqlx::query_as::<_, MedicineVariant>(&sql)
            .bind(medicine_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(variants)
    }

    /// Returns the id of the variant holding `barcode`, if any.
    pub async fn find_id_by_barcode(&self, barcode: &str) -> DbResult<Option<String>> {
        let id: Option<String> =
            sqlx::query_scalar("SELECT id FROM medicine_variants WHERE barcode = ?1")
                .bind(barcode)
                .fetch_optional(&self.pool)
                .await?;

        Ok(id)
    }

    /// Rewrites every mutable field, including an absolute stock value.
    pub async fn update(&self, variant: &MedicineVariant) -> DbResult<()> {
        debug!(id = %variant.id, stock = variant.stock, "Updating variant");

        let result = sqlx::query(
            "UPDATE medicine_variants SET brand = ?2, barcode = ?3, unit = ?4, \
                    price_per_unit_cents = ?5, expiry_date = ?6, stock = ?7, updated_at = ?8 \
             WHERE id = ?1",
        )
        .bind(&variant.id)
        .bind(&variant.brand)
        .bind(&variant.barcode)
        .bind(&variant.unit)
        .bind(variant.price_per_unit_cents)
        .bind(variant.expiry_date)
        .bind(variant.stock)
        .bind(variant.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| with_barcode(e, &variant.barcode))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("MedicineVariant", &variant.id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting variant");

        let result = sqlx::query("DELETE FROM medicine_variants WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("MedicineVariant", id));
        }

        Ok(())
    }

    /// Current state of a variant joined with its medicine.
    pub async fn live(&self, id: &str) -> DbResult<Option<LiveVariant>> {
        let live = sqlx::query_as::<_, LiveVariant>(LIVE_VARIANT_SQL)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(live)
    }

    /// Sale-side search within one pharmacy.
    pub async fn search(
        &self,
        pharmacy_id: &str,
        query: &str,
        now: DateTime<Utc>,
        limit: i64,
    ) -> DbResult<Vec<CatalogHit>> {
        debug!(pharmacy_id = %pharmacy_id, query = %query, "Searching catalog");

        let pattern = format!("%{}%", escape_like(query));

        let hits = sqlx::query_as::<_, CatalogHit>(
            "SELECT v.id AS variant_id, m.id AS medicine_id, m.name AS medicine_name, \
                    v.brand, v.barcode, v.unit, v.price_per_unit_cents, v.stock, v.expiry_date \
             FROM medicine_variants v \
             JOIN medicines m ON m.id = v.medicine_id \
             WHERE m.pharmacy_id = ?1 \
               AND v.expiry_date > ?2 \
               AND v.stock > 0 \
               AND (m.name LIKE ?3 ESCAPE '\\' OR v.brand LIKE ?3 ESCAPE '\\' OR v.barcode = ?4) \
             ORDER BY m.name, v.brand \
             LIMIT ?5",
        )
        .bind(pharmacy_id)
        .bind(now)
        .bind(pattern)
        .bind(query)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(hits)
    }
}

/// Fills in the offending barcode on a unique violation.
fn with_barcode(err: sqlx::Error, barcode: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { field, .. } => DbError::duplicate(field, barcode),
        other => other,
    }
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use chrono::Duration;
    use pharma_core::CoreError;

    #[tokio::test]
    async fn test_barcode_is_globally_unique() {
        let db = fixtures::db().await;
        let p1 = fixtures::pharmacy(&db, "One").await;
        let p2 = fixtures::pharmacy(&db, "Two").await;
        let m1 = fixtures::medicine(&db, &p1.id, "Paracetamol").await;
        let m2 = fixtures::medicine(&db, &p2.id, "Paracetamol").await;
        fixtures::variant(&db, &m1.id, "5000158100091", 1000, 5).await;

        let mut clash = fixtures_variant_like(&m2.id, "5000158100091");
        clash.brand = "Other".to_string();
        let err: CoreError = db.variants().insert(&clash).await.unwrap_err().into();
        assert!(matches!(err, CoreError::BarcodeTaken(b) if b == "5000158100091"));

        assert!(db.variants().find_id_by_barcode("5000158100091").await.unwrap().is_some());
        assert!(db.variants().find_id_by_barcode("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_live_joins_medicine() {
        let db = fixtures::db().await;
        let p = fixtures::pharmacy(&db, "One").await;
        let m = fixtures::medicine(&db, &p.id, "Paracetamol").await;
        let v = fixtures::variant(&db, &m.id, "111", 1000, 5).await;

        let live = db.variants().live(&v.id).await.unwrap().unwrap();
        assert_eq!(live.pharmacy_id, p.id);
        assert_eq!(live.medicine_name, "Paracetamol");
        assert_eq!(live.stock, 5);
        assert!(db.variants().live("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_filters() {
        let db = fixtures::db().await;
        let p1 = fixtures::pharmacy(&db, "One").await;
        let p2 = fixtures::pharmacy(&db, "Two").await;
        let m = fixtures::medicine(&db, &p1.id, "Paracetamol").await;
        let other = fixtures::medicine(&db, &p2.id, "Paracetamol Forte").await;

        let sellable = fixtures::variant(&db, &m.id, "111", 1000, 5).await;
        fixtures::variant(&db, &m.id, "222", 1000, 0).await; // out of stock
        fixtures::variant(&db, &other.id, "333", 1000, 5).await; // other pharmacy

        let mut expired = db.variants().get_by_id(&sellable.id).await.unwrap().unwrap();
        expired.id = crate::repository::new_id();
        expired.barcode = "444".to_string();
        db.variants().insert(&expired).await.unwrap();
        expired.expiry_date = Utc::now() - Duration::days(1);
        db.variants().update(&expired).await.unwrap();

        let now = Utc::now();
        let by_name = db.variants().search(&p1.id, "acet", now, 50).await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].variant_id, sellable.id);

        let by_brand = db.variants().search(&p1.id, "pana", now, 50).await.unwrap();
        assert_eq!(by_brand.len(), 1);

        let by_barcode = db.variants().search(&p1.id, "111", now, 50).await.unwrap();
        assert_eq!(by_barcode.len(), 1);

        // partial barcode does not match
        assert!(db.variants().search(&p1.id, "11", now, 50).await.unwrap().is_empty());
        // wildcards are literal
        assert!(db.variants().search(&p1.id, "%", now, 50).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_sets_absolute_stock() {
        let db = fixtures::db().await;
        let p = fixtures::pharmacy(&db, "One").await;
        let m = fixtures::medicine(&db, &p.id, "Paracetamol").await;
        let mut v = fixtures::variant(&db, &m.id, "111", 1000, 5).await;

        v.stock = 40;
        v.price_per_unit_cents = 1200;
        db.variants().update(&v).await.unwrap();

        let reloaded = db.variants().get_by_id(&v.id).await.unwrap().unwrap();
        assert_eq!(reloaded.stock, 40);
        assert_eq!(reloaded.price_per_unit_cents, 1200);

        db.variants().delete(&v.id).await.unwrap();
        assert!(db.variants().list_for_medicine(&m.id).await.unwrap().is_empty());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("para"), "para");
    }

    fn fixtures_variant_like(medicine_id: &str, barcode: &str) -> MedicineVariant {
        let now = Utc::now();
        MedicineVariant {
            id: crate::repository::new_id(),
            medicine_id: medicine_id.to_string(),
            brand: "Brand".to_string(),
            barcode: barcode.to_string(),
            unit: "tablet".to_string(),
            price_per_unit_cents: 100,
            expiry_date: now + Duration::days(30),
            stock: 1,
            created_at: now,
            updated_at: now,
        }
    }
}
