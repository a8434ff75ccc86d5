//! # Catalog Service
//!
//! Medicines and their sellable variants, per pharmacy.
//!
//! ## Ownership Chain
//! ```text
//! Pharmacy ──1:N──► Medicine ──1:N──► MedicineVariant (barcode, price, stock)
//!                      │
//!                      └── tenancy is checked on the medicine; a variant is
//!                          reachable only through its own medicine id
//! ```
//!
//! Barcodes are unique across every pharmacy. The pre-check gives a clean
//! `BarcodeTaken`; the unique index catches the race and maps to the same
//! error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use pharma_core::validation::{
    validate_barcode, validate_brand, validate_description, validate_expiry, validate_image_url,
    validate_name, validate_price_cents, validate_search_query, validate_stock, validate_unit,
    validate_uuid,
};
use pharma_core::{
    authorize, Caller, CatalogHit, CoreError, CoreResult, Medicine, MedicineDetails,
    MedicineVariant, Operation, Scope, ValidationError, SEARCH_RESULT_LIMIT,
};
use pharma_db::repository::new_id;
use pharma_db::{Database, DbError};

// =============================================================================
// Inputs
// =============================================================================

/// Payload for creating a medicine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedicine {
    /// Owners may omit it (defaults to their pharmacy); admins must set it.
    #[serde(default)]
    pub pharmacy_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Payload for updating a medicine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicineUpdate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Payload for creating or replacing a variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantInput {
    pub brand: String,
    pub barcode: String,
    pub unit: String,
    pub price_per_unit_cents: i64,
    pub expiry_date: DateTime<Utc>,
    pub stock: i64,
}

impl VariantInput {
    fn validate(&self, now: DateTime<Utc>) -> Result<(), ValidationError> {
        validate_brand(&self.brand)?;
        validate_barcode(&self.barcode)?;
        validate_unit(&self.unit)?;
        validate_price_cents(self.price_per_unit_cents)?;
        validate_stock(self.stock)?;
        validate_expiry(self.expiry_date, now)?;
        Ok(())
    }
}

// =============================================================================
// Service
// =============================================================================

#[derive(Debug, Clone)]
pub struct CatalogService {
    db: Database,
}

impl CatalogService {
    pub fn new(db: Database) -> Self {
        CatalogService { db }
    }

    /// Loads a medicine and checks it belongs to the scope.
    async fn load_medicine(&self, scope: &Scope, id: &str) -> CoreResult<Medicine> {
        let medicine = self
            .db
            .medicines()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::MedicineNotFound(id.to_string()))?;
        scope.ensure(&medicine.pharmacy_id)?;
        Ok(medicine)
    }

    /// Loads a variant reached through `medicine_id`.
    async fn load_variant(
        &self,
        scope: &Scope,
        medicine_id: &str,
        variant_id: &str,
    ) -> CoreResult<MedicineVariant> {
        self.load_medicine(scope, medicine_id).await?;

        match self.db.variants().get_by_id(variant_id).await? {
            Some(variant) if variant.medicine_id == medicine_id => Ok(variant),
            _ => Err(CoreError::VariantNotFound(variant_id.to_string())),
        }
    }

    /// Fails with `BarcodeTaken` if a variant other than `own_id` holds it.
    async fn ensure_barcode_free(&self, barcode: &str, own_id: Option<&str>) -> CoreResult<()> {
        match self.db.variants().find_id_by_barcode(barcode).await? {
            Some(holder) if Some(holder.as_str()) != own_id => {
                Err(CoreError::BarcodeTaken(barcode.to_string()))
            }
            _ => Ok(()),
        }
    }

    // -------------------------------------------------------------------------
    // Medicines
    // -------------------------------------------------------------------------

    pub async fn create_medicine(&self, caller: &Caller, input: NewMedicine) -> CoreResult<Medicine> {
        let scope = authorize(caller, Operation::CreateMedicine)?;

        validate_name(&input.name)?;
        validate_description(input.description.as_deref())?;
        validate_image_url(input.image_url.as_deref())?;

        let pharmacy_id = match (&scope, input.pharmacy_id) {
            (Scope::Pharmacy(home), None) => home.clone(),
            (_, Some(id)) => {
                validate_uuid("pharmacy_id", &id)?;
                scope.ensure(&id)?;
                id
            }
            (Scope::AllPharmacies, None) => {
                return Err(ValidationError::Required {
                    field: "pharmacy_id".to_string(),
                }
                .into())
            }
        };

        if !self.db.pharmacies().exists(&pharmacy_id).await? {
            return Err(CoreError::PharmacyNotFound(pharmacy_id));
        }

        let now = Utc::now();
        let medicine = Medicine {
            id: new_id(),
            pharmacy_id,
            name: input.name.trim().to_string(),
            description: input.description,
            image_url: input.image_url,
            created_at: now,
            updated_at: now,
        };
        self.db.medicines().insert(&medicine).await?;

        info!(
            id = %medicine.id,
            pharmacy_id = %medicine.pharmacy_id,
            name = %medicine.name,
            "Medicine created"
        );
        Ok(medicine)
    }

    pub async fn list_medicines(&self, caller: &Caller) -> CoreResult<Vec<Medicine>> {
        let scope = authorize(caller, Operation::ViewCatalog)?;
        Ok(self.db.medicines().list(scope.pharmacy_filter()).await?)
    }

    /// Medicine with all of its variants.
    pub async fn get_medicine(&self, caller: &Caller, id: &str) -> CoreResult<MedicineDetails> {
        let scope = authorize(caller, Operation::ViewCatalog)?;
        let medicine = self.load_medicine(&scope, id).await?;
        let variants = self.db.variants().list_for_medicine(id).await?;
        Ok(MedicineDetails { medicine, variants })
    }

    pub async fn update_medicine(
        &self,
        caller: &Caller,
        id: &str,
        input: MedicineUpdate,
    ) -> CoreResult<Medicine> {
        let scope = authorize(caller, Operation::UpdateMedicine)?;

        validate_name(&input.name)?;
        validate_description(input.description.as_deref())?;
        validate_image_url(input.image_url.as_deref())?;

        let mut medicine = self.load_medicine(&scope, id).await?;
        medicine.name = input.name.trim().to_string();
        medicine.description = input.description;
        medicine.image_url = input.image_url;
        medicine.updated_at = Utc::now();

        self.db
            .medicines()
            .update(
                id,
                &medicine.name,
                medicine.description.as_deref(),
                medicine.image_url.as_deref(),
                medicine.updated_at,
            )
            .await?;

        info!(id = %id, "Medicine updated");
        Ok(medicine)
    }

    /// Refused while any variant still references the medicine.
    pub async fn delete_medicine(&self, caller: &Caller, id: &str) -> CoreResult<()> {
        let scope = authorize(caller, Operation::DeleteMedicine)?;
        self.load_medicine(&scope, id).await?;

        let count = self.db.medicines().count_variants(id).await?;
        if count > 0 {
            return Err(CoreError::MedicineHasVariants {
                medicine_id: id.to_string(),
                count,
            });
        }

        self.db.medicines().delete(id).await?;
        info!(id = %id, "Medicine deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Variants
    // -------------------------------------------------------------------------

    pub async fn create_variant(
        &self,
        caller: &Caller,
        medicine_id: &str,
        input: VariantInput,
    ) -> CoreResult<MedicineVariant> {
        let scope = authorize(caller, Operation::CreateVariant)?;
        let now = Utc::now();
        input.validate(now)?;

        self.load_medicine(&scope, medicine_id).await?;
        self.ensure_barcode_free(&input.barcode, None).await?;

        let variant = MedicineVariant {
            id: new_id(),
            medicine_id: medicine_id.to_string(),
            brand: input.brand.trim().to_string(),
            barcode: input.barcode,
            unit: input.unit.trim().to_string(),
            price_per_unit_cents: input.price_per_unit_cents,
            expiry_date: input.expiry_date,
            stock: input.stock,
            created_at: now,
            updated_at: now,
        };
        self.db.variants().insert(&variant).await?;

        info!(
            id = %variant.id,
            medicine_id = %medicine_id,
            barcode = %variant.barcode,
            stock = variant.stock,
            "Variant created"
        );
        Ok(variant)
    }

    pub async fn list_variants(
        &self,
        caller: &Caller,
        medicine_id: &str,
    ) -> CoreResult<Vec<MedicineVariant>> {
        let scope = authorize(caller, Operation::ViewCatalog)?;
        self.load_medicine(&scope, medicine_id).await?;
        Ok(self.db.variants().list_for_medicine(medicine_id).await?)
    }

    pub async fn get_variant(
        &self,
        caller: &Caller,
        medicine_id: &str,
        variant_id: &str,
    ) -> CoreResult<MedicineVariant> {
        let scope = authorize(caller, Operation::ViewCatalog)?;
        self.load_variant(&scope, medicine_id, variant_id).await
    }

    /// Replaces every mutable field; `stock` is an absolute value.
    pub async fn update_variant(
        &self,
        caller: &Caller,
        medicine_id: &str,
        variant_id: &str,
        input: VariantInput,
    ) -> CoreResult<MedicineVariant> {
        let scope = authorize(caller, Operation::UpdateVariant)?;
        let now = Utc::now();
        input.validate(now)?;

        let mut variant = self.load_variant(&scope, medicine_id, variant_id).await?;
        if variant.barcode != input.barcode {
            self.ensure_barcode_free(&input.barcode, Some(variant_id))
                .await?;
        }

        variant.brand = input.brand.trim().to_string();
        variant.barcode = input.barcode;
        variant.unit = input.unit.trim().to_string();
        variant.price_per_unit_cents = input.price_per_unit_cents;
        variant.expiry_date = input.expiry_date;
        variant.stock = input.stock;
        variant.updated_at = now;

        self.db.variants().update(&variant).await.map_err(|e| match e {
            DbError::NotFound { .. } => CoreError::VariantNotFound(variant_id.to_string()),
            other => other.into(),
        })?;

        info!(id = %variant_id, stock = variant.stock, "Variant updated");
        Ok(variant)
    }

    /// Fails with `Conflict` while sales or carts still reference the variant.
    pub async fn delete_variant(
        &self,
        caller: &Caller,
        medicine_id: &str,
        variant_id: &str,
    ) -> CoreResult<()> {
        let scope = authorize(caller, Operation::DeleteVariant)?;
        self.load_variant(&scope, medicine_id, variant_id).await?;

        self.db.variants().delete(variant_id).await?;
        info!(id = %variant_id, medicine_id = %medicine_id, "Variant deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Search
    // -------------------------------------------------------------------------

    /// Sellable variants of the caller's pharmacy matching name, brand or
    /// exact barcode. Expired and out-of-stock variants are left out.
    pub async fn search(&self, caller: &Caller, query: &str) -> CoreResult<Vec<CatalogHit>> {
        let scope = authorize(caller, Operation::SearchCatalog)?;
        let pharmacy_id = scope.home_pharmacy()?;
        let query = validate_search_query(query)?;

        Ok(self
            .db
            .variants()
            .search(pharmacy_id, &query, Utc::now(), SEARCH_RESULT_LIMIT)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use chrono::Duration;
    use pharma_core::Role;

    fn variant_input(barcode: &str) -> VariantInput {
        VariantInput {
            brand: "Panadol".to_string(),
            barcode: barcode.to_string(),
            unit: "tablet".to_string(),
            price_per_unit_cents: 1000,
            expiry_date: Utc::now() + Duration::days(90),
            stock: 5,
        }
    }

    fn new_medicine(name: &str) -> NewMedicine {
        NewMedicine {
            pharmacy_id: None,
            name: name.to_string(),
            description: Some("Analgesic".to_string()),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_owner_creates_medicine_in_home_pharmacy() {
        let db = testing::db().await;
        let p = testing::pharmacy(&db, "P1").await;
        let (_, owner) = testing::user(&db, Role::Owner, Some(&p.id)).await;
        let service = CatalogService::new(db.clone());

        let medicine = service
            .create_medicine(&owner, new_medicine("Paracetamol"))
            .await
            .unwrap();
        assert_eq!(medicine.pharmacy_id, p.id);

        let listed = service.list_medicines(&owner).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_owner_cannot_target_other_pharmacy() {
        let db = testing::db().await;
        let p1 = testing::pharmacy(&db, "P1").await;
        let p2 = testing::pharmacy(&db, "P2").await;
        let (_, owner) = testing::user(&db, Role::Owner, Some(&p1.id)).await;
        let service = CatalogService::new(db);

        let mut input = new_medicine("Paracetamol");
        input.pharmacy_id = Some(p2.id.clone());
        let err = service.create_medicine(&owner, input).await.unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_admin_must_name_existing_pharmacy() {
        let db = testing::db().await;
        let service = CatalogService::new(db);
        let admin = testing::admin();

        let err = service
            .create_medicine(&admin, new_medicine("Paracetamol"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));

        let mut input = new_medicine("Paracetamol");
        input.pharmacy_id = Some(new_id());
        let err = service.create_medicine(&admin, input).await.unwrap_err();
        assert!(matches!(err, CoreError::PharmacyNotFound(_)));
    }

    #[tokio::test]
    async fn test_pharmacist_cannot_mutate_catalog() {
        let db = testing::db().await;
        let p = testing::pharmacy(&db, "P1").await;
        let (_, pharmacist) = testing::user(&db, Role::Pharmacist, Some(&p.id)).await;
        let m = testing::medicine(&db, &p.id, "Paracetamol").await;
        let service = CatalogService::new(db);

        assert!(matches!(
            service.create_medicine(&pharmacist, new_medicine("Ibuprofen")).await,
            Err(CoreError::Unauthorized(_))
        ));
        assert!(matches!(
            service
                .create_variant(&pharmacist, &m.id, variant_input("111"))
                .await,
            Err(CoreError::Unauthorized(_))
        ));
        // Reads are fine
        assert_eq!(service.list_medicines(&pharmacist).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_medicine_blocked_by_variants() {
        let db = testing::db().await;
        let p = testing::pharmacy(&db, "P1").await;
        let (_, owner) = testing::user(&db, Role::Owner, Some(&p.id)).await;
        let admin = testing::admin();
        let service = CatalogService::new(db);

        let m = service
            .create_medicine(&owner, new_medicine("Paracetamol"))
            .await
            .unwrap();
        let v = service
            .create_variant(&owner, &m.id, variant_input("111"))
            .await
            .unwrap();

        let err = service.delete_medicine(&admin, &m.id).await.unwrap_err();
        assert!(matches!(err, CoreError::MedicineHasVariants { count: 1, .. }));

        service.delete_variant(&admin, &m.id, &v.id).await.unwrap();
        service.delete_medicine(&admin, &m.id).await.unwrap();

        assert!(matches!(
            service.get_medicine(&admin, &m.id).await,
            Err(CoreError::MedicineNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_barcode_unique_across_pharmacies() {
        let db = testing::db().await;
        let p1 = testing::pharmacy(&db, "P1").await;
        let p2 = testing::pharmacy(&db, "P2").await;
        let (_, owner1) = testing::user(&db, Role::Owner, Some(&p1.id)).await;
        let (_, owner2) = testing::user(&db, Role::Owner, Some(&p2.id)).await;
        let m1 = testing::medicine(&db, &p1.id, "Paracetamol").await;
        let m2 = testing::medicine(&db, &p2.id, "Paracetamol").await;
        let service = CatalogService::new(db);

        service
            .create_variant(&owner1, &m1.id, variant_input("5000158100091"))
            .await
            .unwrap();

        let err = service
            .create_variant(&owner2, &m2.id, variant_input("5000158100091"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::BarcodeTaken(ref b) if b == "5000158100091"));
    }

    #[tokio::test]
    async fn test_update_variant_checks_barcode_only_when_changed() {
        let db = testing::db().await;
        let p = testing::pharmacy(&db, "P1").await;
        let (_, owner) = testing::user(&db, Role::Owner, Some(&p.id)).await;
        let m = testing::medicine(&db, &p.id, "Paracetamol").await;
        let service = CatalogService::new(db);

        let a = service
            .create_variant(&owner, &m.id, variant_input("AAA1"))
            .await
            .unwrap();
        service
            .create_variant(&owner, &m.id, variant_input("BBB2"))
            .await
            .unwrap();

        // Same barcode, new stock
        let mut same = variant_input("AAA1");
        same.stock = 42;
        let updated = service.update_variant(&owner, &m.id, &a.id, same).await.unwrap();
        assert_eq!(updated.stock, 42);

        // Taking a sibling's barcode
        let err = service
            .update_variant(&owner, &m.id, &a.id, variant_input("BBB2"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::BarcodeTaken(_)));
    }

    #[tokio::test]
    async fn test_variant_must_belong_to_path_medicine() {
        let db = testing::db().await;
        let p = testing::pharmacy(&db, "P1").await;
        let (_, owner) = testing::user(&db, Role::Owner, Some(&p.id)).await;
        let m1 = testing::medicine(&db, &p.id, "Paracetamol").await;
        let m2 = testing::medicine(&db, &p.id, "Ibuprofen").await;
        let v = testing::variant(&db, &m1.id, "111", 1000, 5).await;
        let service = CatalogService::new(db);

        assert!(service.get_variant(&owner, &m1.id, &v.id).await.is_ok());
        assert!(matches!(
            service.get_variant(&owner, &m2.id, &v.id).await,
            Err(CoreError::VariantNotFound(_))
        ));
        assert!(matches!(
            service
                .update_variant(&owner, &m2.id, &v.id, variant_input("111"))
                .await,
            Err(CoreError::VariantNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_variant_rejects_past_expiry_before_writing() {
        let db = testing::db().await;
        let p = testing::pharmacy(&db, "P1").await;
        let (_, owner) = testing::user(&db, Role::Owner, Some(&p.id)).await;
        let m = testing::medicine(&db, &p.id, "Paracetamol").await;
        let service = CatalogService::new(db.clone());

        let mut input = variant_input("111");
        input.expiry_date = Utc::now() - Duration::days(1);
        let err = service.create_variant(&owner, &m.id, input).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidInput(ValidationError::NotInFuture { .. })
        ));
        assert!(db.variants().list_for_medicine(&m.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_variant_price_is_capped() {
        let db = testing::db().await;
        let p = testing::pharmacy(&db, "P1").await;
        let (_, owner) = testing::user(&db, Role::Owner, Some(&p.id)).await;
        let m = testing::medicine(&db, &p.id, "Paracetamol").await;
        let service = CatalogService::new(db.clone());

        let mut input = variant_input("111");
        input.price_per_unit_cents = 4_000_000_000_000_000_000;
        let err = service.create_variant(&owner, &m.id, input).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidInput(ValidationError::OutOfRange { .. })
        ));
        assert!(db.variants().list_for_medicine(&m.id).await.unwrap().is_empty());

        let mut input = variant_input("111");
        input.price_per_unit_cents = pharma_core::MAX_PRICE_CENTS;
        service.create_variant(&owner, &m.id, input).await.unwrap();
    }

    #[tokio::test]
    async fn test_cross_tenant_reads_are_rejected() {
        let db = testing::db().await;
        let p1 = testing::pharmacy(&db, "P1").await;
        let p2 = testing::pharmacy(&db, "P2").await;
        let (_, pharmacist) = testing::user(&db, Role::Pharmacist, Some(&p2.id)).await;
        let m = testing::medicine(&db, &p1.id, "Paracetamol").await;
        let service = CatalogService::new(db);

        assert!(matches!(
            service.get_medicine(&pharmacist, &m.id).await,
            Err(CoreError::Unauthorized(_))
        ));
        assert!(service.list_medicines(&pharmacist).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_filters_expired_and_empty_stock() {
        let db = testing::db().await;
        let p = testing::pharmacy(&db, "P1").await;
        let (_, pharmacist) = testing::user(&db, Role::Pharmacist, Some(&p.id)).await;
        let m = testing::medicine(&db, &p.id, "Paracetamol").await;
        let live = testing::variant(&db, &m.id, "111", 1000, 5).await;
        testing::variant(&db, &m.id, "222", 1000, 0).await;

        // in stock, but already past its expiry date
        let mut expired = testing::variant(&db, &m.id, "333", 1000, 5).await;
        expired.expiry_date = Utc::now() - Duration::days(1);
        db.variants().update(&expired).await.unwrap();

        let service = CatalogService::new(db);

        let hits = service.search(&pharmacist, "para").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].variant_id, live.id);

        let by_barcode = service.search(&pharmacist, "111").await.unwrap();
        assert_eq!(by_barcode.len(), 1);
        assert!(service.search(&pharmacist, "333").await.unwrap().is_empty());

        assert!(matches!(
            service.search(&pharmacist, "   ").await,
            Err(CoreError::InvalidInput(_))
        ));
        assert!(matches!(
            service.search(&testing::admin(), "para").await,
            Err(CoreError::Unauthorized(_))
        ));
    }
}
