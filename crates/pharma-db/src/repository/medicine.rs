//! # Medicine Repository
//!
//! Medicines are the pharmacy-owned half of the catalog; sellable units live
//! in `medicine_variants`. There are no cascading deletes: callers check
//! [`MedicineRepository::count_variants`] first, and the foreign key backs
//! that check up.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use pharma_core::Medicine;

const MEDICINE_COLUMNS: &str =
    "id, pharmacy_id, name, description, image_url, created_at, updated_at";

/// Repository for medicine database operations.
#[derive(Debug, Clone)]
pub struct MedicineRepository {
    pool: SqlitePool,
}

impl MedicineRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MedicineRepository { pool }
    }

    pub async fn insert(&self, medicine: &Medicine) -> DbResult<()> {
        debug!(id = %medicine.id, pharmacy_id = %medicine.pharmacy_id, "Inserting medicine");

        sqlx::query(
            "INSERT INTO medicines (id, pharmacy_id, name, description, image_url, \
                                    created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&medicine.id)
        .bind(&medicine.pharmacy_id)
        .bind(&medicine.name)
        .bind(&medicine.description)
        .bind(&medicine.image_url)
        .bind(medicine.created_at)
        .bind(medicine.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Medicine>> {
        let sql = format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = ?1");
        let medicine = sqlx::query_as::<_, Medicine>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(medicine)
    }

    /// Lists medicines by name. `None` means every pharmacy.
    pub async fn list(&self, pharmacy_filter: Option<&str>) -> DbResult<Vec<Medicine>> {
        let sql = format!(
            "SELECT {MEDICINE_COLUMNS} FROM medicines \
             WHERE (?1 IS NULL OR pharmacy_id = ?1) \
             ORDER BY name, id"
        );
        let medicines = sqlx::query_as::<_, Medicine>(&sql)
            .bind(pharmacy_filter)
            .fetch_all(&self.pool)
            .await?;

        Ok(medicines)
    }

    /// Rewrites the mutable fields. The owning pharmacy never changes.
    pub async fn update(
        &self,
        id: &str,
        name: &str,
        description: Option<&str>,
        image_url: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id = %id, "Updating medicine");

        let result = sqlx::query(
            "UPDATE medicines SET name = ?2, description = ?3, image_url = ?4, updated_at = ?5 \
             WHERE id = ?1",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(image_url)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Medicine", id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting medicine");

        let result = sqlx::query("DELETE FROM medicines WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Medicine", id));
        }

        Ok(())
    }

    pub async fn count_variants(&self, id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM medicine_variants WHERE medicine_id = ?1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
