//! # Order Repository
//!
//! Hospital prescription orders. This service only reads them; the insert
//! helpers exist for the seed binary and tests.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use pharma_core::{
    Hospital, Order, OrderDetails, OrderItem, OrderLineView, OrderSummary, Page, Patient,
};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Newest first, with hospital and patient names. `None` means every
    /// pharmacy.
    pub async fn list(
        &self,
        pharmacy_filter: Option<&str>,
        page: Page,
    ) -> DbResult<Vec<OrderSummary>> {
        let orders = sqlx::query_as::<_, OrderSummary>(
            "SELECT o.id, o.pharmacy_id, h.name AS hospital_name, p.full_name AS patient_name, \
                    o.order_date \
             FROM orders o \
             JOIN hospitals h ON h.id = o.hospital_id \
             JOIN patients p ON p.id = o.patient_id \
             WHERE (?1 IS NULL OR o.pharmacy_id = ?1) \
             ORDER BY o.order_date DESC, o.id \
             LIMIT ?2 OFFSET ?3",
        )
        .bind(pharmacy_filter)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            "SELECT id, hospital_id, patient_id, pharmacy_id, order_date FROM orders WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Full fulfillment view: patient, lines, computed total.
    pub async fn details(&self, id: &str) -> DbResult<Option<OrderDetails>> {
        let Some(order) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let hospital_name: String = sqlx::query_scalar("SELECT name FROM hospitals WHERE id = ?1")
            .bind(&order.hospital_id)
            .fetch_one(&self.pool)
            .await?;

        let patient = sqlx::query_as::<_, Patient>(
            "SELECT id, full_name, phone_number, emergency_phone_number FROM patients WHERE id = ?1",
        )
        .bind(&order.patient_id)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, OrderLineView>(
            "SELECT m.name AS medicine_name, v.unit, oi.quantity, oi.price_per_unit_cents \
             FROM order_items oi \
             JOIN medicine_variants v ON v.id = oi.medicine_variant_id \
             JOIN medicines m ON m.id = v.medicine_id \
             WHERE oi.order_id = ?1 \
             ORDER BY oi.rowid",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let total = OrderDetails::total_of(&items);

        Ok(Some(OrderDetails {
            id: order.id,
            pharmacy_id: order.pharmacy_id,
            hospital_name,
            order_date: order.order_date,
            patient,
            items,
            total_price_cents: total.cents(),
        }))
    }

    pub async fn insert_hospital(&self, hospital: &Hospital) -> DbResult<()> {
        sqlx::query("INSERT INTO hospitals (id, name) VALUES (?1, ?2)")
            .bind(&hospital.id)
            .bind(&hospital.name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO patients (id, full_name, phone_number, emergency_phone_number) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&patient.id)
        .bind(&patient.full_name)
        .bind(&patient.phone_number)
        .bind(&patient.emergency_phone_number)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts an order with its lines in one transaction.
    pub async fn insert_order(&self, order: &Order, items: &[OrderItem]) -> DbResult<()> {
        debug!(id = %order.id, pharmacy_id = %order.pharmacy_id, "Inserting order");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (id, hospital_id, patient_id, pharmacy_id, order_date) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&order.id)
        .bind(&order.hospital_id)
        .bind(&order.patient_id)
        .bind(&order.pharmacy_id)
        .bind(order.order_date)
        .execute(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                "INSERT INTO order_items (id, order_id, medicine_variant_id, quantity, \
                                          price_per_unit_cents) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.medicine_variant_id)
            .bind(item.quantity)
            .bind(item.price_per_unit_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{fixtures, new_id};
    use chrono::{Duration, Utc};

    async fn seed_order(
        db: &crate::Database,
        pharmacy_id: &str,
        variant_id: &str,
        age_days: i64,
    ) -> Order {
        let hospital = Hospital {
            id: new_id(),
            name: "Black Lion Hospital".to_string(),
        };
        let patient = Patient {
            id: new_id(),
            full_name: "Almaz Tesfaye".to_string(),
            phone_number: "+251911111111".to_string(),
            emergency_phone_number: None,
        };
        db.orders().insert_hospital(&hospital).await.unwrap();
        db.orders().insert_patient(&patient).await.unwrap();

        let order = Order {
            id: new_id(),
            hospital_id: hospital.id,
            patient_id: patient.id,
            pharmacy_id: pharmacy_id.to_string(),
            order_date: Utc::now() - Duration::days(age_days),
        };
        let items = vec![OrderItem {
            id: new_id(),
            order_id: order.id.clone(),
            medicine_variant_id: variant_id.to_string(),
            quantity: 2,
            price_per_unit_cents: 150,
        }];
        db.orders().insert_order(&order, &items).await.unwrap();
        order
    }

    #[tokio::test]
    async fn test_list_scoped_newest_first() {
        let db = fixtures::db().await;
        let p1 = fixtures::pharmacy(&db, "P1").await;
        let p2 = fixtures::pharmacy(&db, "P2").await;
        let m = fixtures::medicine(&db, &p1.id, "Amoxicillin").await;
        let v = fixtures::variant(&db, &m.id, "111", 150, 10).await;

        let older = seed_order(&db, &p1.id, &v.id, 3).await;
        let newer = seed_order(&db, &p1.id, &v.id, 1).await;
        seed_order(&db, &p2.id, &v.id, 2).await;

        let all = db.orders().list(None, Page::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let own = db.orders().list(Some(&p1.id), Page::default()).await.unwrap();
        let ids: Vec<_> = own.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec![newer.id.as_str(), older.id.as_str()]);
        assert_eq!(own[0].hospital_name, "Black Lion Hospital");
        assert_eq!(own[0].patient_name, "Almaz Tesfaye");
    }

    #[tokio::test]
    async fn test_details_computes_total() {
        let db = fixtures::db().await;
        let p = fixtures::pharmacy(&db, "P1").await;
        let m = fixtures::medicine(&db, &p.id, "Amoxicillin").await;
        let v = fixtures::variant(&db, &m.id, "111", 150, 10).await;
        let order = seed_order(&db, &p.id, &v.id, 0).await;

        let details = db.orders().details(&order.id).await.unwrap().unwrap();
        assert_eq!(details.patient.full_name, "Almaz Tesfaye");
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.items[0].medicine_name, "Amoxicillin");
        assert_eq!(details.items[0].unit, "tablet");
        assert_eq!(details.total_price_cents, 300);

        assert!(db.orders().details("missing").await.unwrap().is_none());
    }
}
