//! Shared fixtures for service and router tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};

use pharma_core::{Caller, Medicine, MedicineVariant, Pharmacy, Role, User};
use pharma_db::password::hash_password;
use pharma_db::repository::new_id;
use pharma_db::{Database, DbConfig};

use crate::config::ApiConfig;
use crate::notify::LogNotificationSink;
use crate::AppState;

pub const PASSWORD: &str = "password123";

static NEXT_PHONE: AtomicU64 = AtomicU64::new(0);

pub fn next_phone() -> String {
    format!("+25192{:08}", NEXT_PHONE.fetch_add(1, Ordering::Relaxed))
}

pub async fn db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

pub fn config() -> ApiConfig {
    ApiConfig::from_lookup(|key| match key {
        "JWT_SECRET" => Some("test-secret".to_string()),
        _ => None,
    })
    .unwrap()
}

pub async fn state() -> Arc<AppState> {
    Arc::new(AppState::new(db().await, config(), Arc::new(LogNotificationSink)))
}

pub async fn pharmacy(db: &Database, name: &str) -> Pharmacy {
    let now = Utc::now();
    let pharmacy = Pharmacy {
        id: new_id(),
        name: name.to_string(),
        address: "Bole Road".to_string(),
        created_at: now,
        updated_at: now,
    };
    db.pharmacies().insert(&pharmacy).await.unwrap();
    pharmacy
}

/// Inserts a user with [`PASSWORD`] and returns it with its caller.
pub async fn user(db: &Database, role: Role, pharmacy_id: Option<&str>) -> (User, Caller) {
    let now = Utc::now();
    let user = User {
        id: new_id(),
        phone_number: next_phone(),
        password_hash: hash_password(PASSWORD).unwrap(),
        full_name: "Test User".to_string(),
        role,
        pharmacy_id: pharmacy_id.map(str::to_string),
        profile_picture: None,
        created_at: now,
        updated_at: now,
    };
    db.users().insert(&user).await.unwrap();
    let caller = Caller::new(user.id.clone(), role, user.pharmacy_id.clone());
    (user, caller)
}

pub fn admin() -> Caller {
    Caller::new(new_id(), Role::Admin, None)
}

pub async fn medicine(db: &Database, pharmacy_id: &str, name: &str) -> Medicine {
    let now = Utc::now();
    let medicine = Medicine {
        id: new_id(),
        pharmacy_id: pharmacy_id.to_string(),
        name: name.to_string(),
        description: None,
        image_url: None,
        created_at: now,
        updated_at: now,
    };
    db.medicines().insert(&medicine).await.unwrap();
    medicine
}

pub async fn variant(
    db: &Database,
    medicine_id: &str,
    barcode: &str,
    price_cents: i64,
    stock: i64,
) -> MedicineVariant {
    let now = Utc::now();
    let variant = MedicineVariant {
        id: new_id(),
        medicine_id: medicine_id.to_string(),
        brand: "Panadol".to_string(),
        barcode: barcode.to_string(),
        unit: "tablet".to_string(),
        price_per_unit_cents: price_cents,
        expiry_date: now + Duration::days(365),
        stock,
        created_at: now,
        updated_at: now,
    };
    db.variants().insert(&variant).await.unwrap();
    variant
}
