//! # Pharmacy Repository
//!
//! Tenancy roots. Deleting a pharmacy that still owns users, medicines or
//! sales trips a foreign key and surfaces as `DbError::ForeignKeyViolation`.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use pharma_core::Pharmacy;

/// Repository for pharmacy database operations.
#[derive(Debug, Clone)]
pub struct PharmacyRepository {
    pool: SqlitePool,
}

impl PharmacyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PharmacyRepository { pool }
    }

    pub async fn insert(&self, pharmacy: &Pharmacy) -> DbResult<()> {
        debug!(id = %pharmacy.id, name = %pharmacy.name, "Inserting pharmacy");

        sqlx::query(
            "INSERT INTO pharmacies (id, name, address, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&pharmacy.id)
        .bind(&pharmacy.name)
        .bind(&pharmacy.address)
        .bind(pharmacy.created_at)
        .bind(pharmacy.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Pharmacy>> {
        let pharmacy = sqlx::query_as::<_, Pharmacy>(
            "SELECT id, name, address, created_at, updated_at FROM pharmacies WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pharmacy)
    }

    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM pharmacies WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    /// Lists pharmacies by name. `Some(id)` restricts to that pharmacy.
    pub async fn list(&self, pharmacy_filter: Option<&str>) -> DbResult<Vec<Pharmacy>> {
        let pharmacies = sqlx::query_as::<_, Pharmacy>(
            "SELECT id, name, address, created_at, updated_at FROM pharmacies \
             WHERE (?1 IS NULL OR id = ?1) \
             ORDER BY name",
        )
        .bind(pharmacy_filter)
        .fetch_all(&self.pool)
        .await?;

        Ok(pharmacies)
    }

    pub async fn update(
        &self,
        id: &str,
        name: &str,
        address: &str,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id = %id, "Updating pharmacy");

        let result = sqlx::query(
            "UPDATE pharmacies SET name = ?2, address = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(name)
        .bind(address)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Pharmacy", id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting pharmacy");

        let result = sqlx::query("DELETE FROM pharmacies WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Pharmacy", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;

    #[tokio::test]
    async fn test_crud() {
        let db = fixtures::db().await;
        let p1 = fixtures::pharmacy(&db, "Zeta Pharmacy").await;
        let p2 = fixtures::pharmacy(&db, "Alpha Pharmacy").await;

        let all = db.pharmacies().list(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, p2.id);

        let own = db.pharmacies().list(Some(&p1.id)).await.unwrap();
        assert_eq!(own, vec![p1.clone()]);

        db.pharmacies()
            .update(&p1.id, "Zeta Renamed", "Piassa", Utc::now())
            .await
            .unwrap();
        let updated = db.pharmacies().get_by_id(&p1.id).await.unwrap().unwrap();
        assert_eq!(updated.name, "Zeta Renamed");
        assert_eq!(updated.address, "Piassa");

        db.pharmacies().delete(&p2.id).await.unwrap();
        assert!(!db.pharmacies().exists(&p2.id).await.unwrap());
        assert!(matches!(
            db.pharmacies().delete(&p2.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_with_dependents_is_fk_violation() {
        let db = fixtures::db().await;
        let p = fixtures::pharmacy(&db, "Busy Pharmacy").await;
        fixtures::medicine(&db, &p.id, "Paracetamol").await;

        assert!(matches!(
            db.pharmacies().delete(&p.id).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
    }
}
