//! # Pharmacy Service
//!
//! Tenant administration. Admins create and delete pharmacies; owners may
//! rename or move their own. Everyone can read their own pharmacy, admins
//! read all of them.
//!
//! Deletion is refused with `Conflict` while users, medicines or sales still
//! reference the pharmacy (foreign keys, no cascades).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use pharma_core::validation::{validate_address, validate_name};
use pharma_core::{authorize, Caller, CoreError, CoreResult, Operation, Pharmacy};
use pharma_db::repository::new_id;
use pharma_db::{Database, DbError};

/// Payload for creating or updating a pharmacy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PharmacyInput {
    pub name: String,
    pub address: String,
}

impl PharmacyInput {
    fn validate(&self) -> CoreResult<()> {
        validate_name(&self.name)?;
        validate_address(&self.address)?;
        Ok(())
    }
}

fn not_found(id: &str) -> impl FnOnce(DbError) -> CoreError + '_ {
    move |e| match e {
        DbError::NotFound { .. } => CoreError::PharmacyNotFound(id.to_string()),
        other => other.into(),
    }
}

#[derive(Debug, Clone)]
pub struct PharmacyService {
    db: Database,
}

impl PharmacyService {
    pub fn new(db: Database) -> Self {
        PharmacyService { db }
    }

    pub async fn create(&self, caller: &Caller, input: PharmacyInput) -> CoreResult<Pharmacy> {
        authorize(caller, Operation::CreatePharmacy)?;
        input.validate()?;

        let now = Utc::now();
        let pharmacy = Pharmacy {
            id: new_id(),
            name: input.name.trim().to_string(),
            address: input.address.trim().to_string(),
            created_at: now,
            updated_at: now,
        };
        self.db.pharmacies().insert(&pharmacy).await?;

        info!(id = %pharmacy.id, name = %pharmacy.name, "Pharmacy created");
        Ok(pharmacy)
    }

    pub async fn list(&self, caller: &Caller) -> CoreResult<Vec<Pharmacy>> {
        let scope = authorize(caller, Operation::ViewPharmacies)?;
        Ok(self.db.pharmacies().list(scope.pharmacy_filter()).await?)
    }

    pub async fn get(&self, caller: &Caller, id: &str) -> CoreResult<Pharmacy> {
        let scope = authorize(caller, Operation::ViewPharmacies)?;
        scope.ensure(id)?;

        self.db
            .pharmacies()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::PharmacyNotFound(id.to_string()))
    }

    pub async fn update(
        &self,
        caller: &Caller,
        id: &str,
        input: PharmacyInput,
    ) -> CoreResult<Pharmacy> {
        let scope = authorize(caller, Operation::UpdatePharmacy)?;
        scope.ensure(id)?;
        input.validate()?;

        let mut pharmacy = self
            .db
            .pharmacies()
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::PharmacyNotFound(id.to_string()))?;

        pharmacy.name = input.name.trim().to_string();
        pharmacy.address = input.address.trim().to_string();
        pharmacy.updated_at = Utc::now();

        self.db
            .pharmacies()
            .update(id, &pharmacy.name, &pharmacy.address, pharmacy.updated_at)
            .await
            .map_err(not_found(id))?;

        info!(id = %id, "Pharmacy updated");
        Ok(pharmacy)
    }

    pub async fn delete(&self, caller: &Caller, id: &str) -> CoreResult<()> {
        authorize(caller, Operation::DeletePharmacy)?;

        self.db.pharmacies().delete(id).await.map_err(not_found(id))?;

        info!(id = %id, "Pharmacy deleted");
        Ok(())
    }
}
