//! # User Service
//!
//! Staff administration: admins onboard owners, owners (and admins) onboard
//! pharmacists. There is no self sign-up; the very first admin comes from
//! [`UserService::ensure_admin`] at startup.
//!
//! ```text
//!             create_owner                 create_pharmacist
//! Admin ────────────────────► Owner ──────────────────────────► Pharmacist
//!   │                           (own pharmacy only)
//!   └──────────────────────────────────────────────────────────► Pharmacist
//!                      (any pharmacy, pharmacy_id required)
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pharma_core::validation::{
    validate_full_name, validate_password, validate_phone_number, validate_uuid,
};
use pharma_core::{
    authorize, Caller, CoreError, CoreResult, Operation, Role, Scope, User, ValidationError,
};
use pharma_db::password::hash_password;
use pharma_db::repository::new_id;
use pharma_db::Database;

/// Payload for onboarding an owner or a pharmacist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStaff {
    pub phone_number: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    /// Required for admins; owners may omit it.
    #[serde(default)]
    pub pharmacy_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserService {
    db: Database,
}

impl UserService {
    pub fn new(db: Database) -> Self {
        UserService { db }
    }

    pub async fn create_owner(&self, caller: &Caller, input: NewStaff) -> CoreResult<User> {
        let scope = authorize(caller, Operation::CreateOwner)?;
        self.create_staff(&scope, Role::Owner, input).await
    }

    pub async fn create_pharmacist(&self, caller: &Caller, input: NewStaff) -> CoreResult<User> {
        let scope = authorize(caller, Operation::CreatePharmacist)?;
        self.create_staff(&scope, Role::Pharmacist, input).await
    }

    /// Pharmacists visible to the caller. Admins may narrow to one pharmacy.
    pub async fn list_pharmacists(
        &self,
        caller: &Caller,
        pharmacy_id: Option<&str>,
    ) -> CoreResult<Vec<User>> {
        let scope = authorize(caller, Operation::ListPharmacists)?;

        let filter = match pharmacy_id {
            Some(id) => {
                scope.ensure(id)?;
                Some(id)
            }
            None => scope.pharmacy_filter(),
        };

        Ok(self.db.users().list_by_role(Role::Pharmacist, filter).await?)
    }

    async fn create_staff(&self, scope: &Scope, expected: Role, input: NewStaff) -> CoreResult<User> {
        if input.role != expected {
            return Err(CoreError::InvalidRole {
                expected: expected.to_string(),
                actual: input.role.to_string(),
            });
        }

        validate_phone_number(&input.phone_number)?;
        validate_password(&input.password)?;
        validate_full_name(&input.full_name)?;

        let pharmacy_id = match (scope, input.pharmacy_id) {
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
        if self.db.users().phone_exists(&input.phone_number).await? {
            return Err(CoreError::PhoneNumberTaken(input.phone_number));
        }

        let now = Utc::now();
        let user = User {
            id: new_id(),
            phone_number: input.phone_number,
            password_hash: hash_password(&input.password)?,
            full_name: input.full_name.trim().to_string(),
            role: expected,
            pharmacy_id: Some(pharmacy_id),
            profile_picture: None,
            created_at: now,
            updated_at: now,
        };
        // A concurrent insert of the same phone still lands on PhoneNumberTaken
        self.db.users().insert(&user).await?;

        info!(id = %user.id, role = %user.role, pharmacy_id = ?user.pharmacy_id, "User created");
        Ok(user)
    }

    /// Creates an admin unless one already exists. Returns whether one was
    /// created.
    pub async fn ensure_admin(&self, phone_number: &str, password: &str) -> CoreResult<bool> {
        if self.db.users().count_by_role(Role::Admin).await? > 0 {
            return Ok(false);
        }

        validate_phone_number(phone_number)?;
        validate_password(password)?;

        if self.db.users().phone_exists(phone_number).await? {
            warn!(phone = %phone_number, "Bootstrap admin phone already belongs to a user");
            return Err(CoreError::PhoneNumberTaken(phone_number.to_string()));
        }

        let now = Utc::now();
        let admin = User {
            id: new_id(),
            phone_number: phone_number.to_string(),
            password_hash: hash_password(password)?,
            full_name: "Administrator".to_string(),
            role: Role::Admin,
            pharmacy_id: None,
            profile_picture: None,
            created_at: now,
            updated_at: now,
        };
        self.db.users().insert(&admin).await?;

        info!(id = %admin.id, "Bootstrap admin created");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn staff(role: Role, pharmacy_id: Option<&str>) -> NewStaff {
        NewStaff {
            phone_number: testing::next_phone(),
            password: "password123".to_string(),
            full_name: "Meron Bekele".to_string(),
            role,
            pharmacy_id: pharmacy_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_admin_creates_owner() {
        let db = testing::db().await;
        let p = testing::pharmacy(&db, "P1").await;
        let service = UserService::new(db);

        let owner = service
            .create_owner(&testing::admin(), staff(Role::Owner, Some(&p.id)))
            .await
            .unwrap();
        assert_eq!(owner.role, Role::Owner);
        assert_eq!(owner.pharmacy_id.as_deref(), Some(p.id.as_str()));
        assert!(owner.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_role_must_match_operation() {
        let db = testing::db().await;
        let p = testing::pharmacy(&db, "P1").await;
        let service = UserService::new(db);

        let err = service
            .create_owner(&testing::admin(), staff(Role::Pharmacist, Some(&p.id)))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidRole { .. }));
    }

    #[tokio::test]
    async fn test_owner_onboards_pharmacist_in_own_pharmacy_only() {
        let db = testing::db().await;
        let p1 = testing::pharmacy(&db, "P1").await;
        let p2 = testing::pharmacy(&db, "P2").await;
        let (_, owner) = testing::user(&db, Role::Owner, Some(&p1.id)).await;
        let service = UserService::new(db);

        let pharmacist = service
            .create_pharmacist(&owner, staff(Role::Pharmacist, None))
            .await
            .unwrap();
        assert_eq!(pharmacist.pharmacy_id.as_deref(), Some(p1.id.as_str()));

        assert!(matches!(
            service
                .create_pharmacist(&owner, staff(Role::Pharmacist, Some(&p2.id)))
                .await,
            Err(CoreError::Unauthorized(_))
        ));
        assert!(matches!(
            service
                .create_owner(&owner, staff(Role::Owner, Some(&p1.id)))
                .await,
            Err(CoreError::Unauthorized(_))
        ));

        let listed = service.list_pharmacists(&owner, None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(matches!(
            service.list_pharmacists(&owner, Some(&p2.id)).await,
            Err(CoreError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_phone_rejected() {
        let db = testing::db().await;
        let p = testing::pharmacy(&db, "P1").await;
        let service = UserService::new(db);
        let admin = testing::admin();

        let first = staff(Role::Owner, Some(&p.id));
        let mut second = staff(Role::Owner, Some(&p.id));
        second.phone_number = first.phone_number.clone();

        service.create_owner(&admin, first).await.unwrap();
        assert!(matches!(
            service.create_owner(&admin, second).await,
            Err(CoreError::PhoneNumberTaken(_))
        ));
    }

    #[tokio::test]
    async fn test_field_validation() {
        let db = testing::db().await;
        let p = testing::pharmacy(&db, "P1").await;
        let service = UserService::new(db);
        let admin = testing::admin();

        let mut bad_phone = staff(Role::Owner, Some(&p.id));
        bad_phone.phone_number = "0911000000".to_string();
        assert!(matches!(
            service.create_owner(&admin, bad_phone).await,
            Err(CoreError::InvalidInput(_))
        ));

        let mut short_password = staff(Role::Owner, Some(&p.id));
        short_password.password = "short".to_string();
        assert!(matches!(
            service.create_owner(&admin, short_password).await,
            Err(CoreError::InvalidInput(_))
        ));

        assert!(matches!(
            service
                .create_owner(&admin, staff(Role::Owner, Some(&new_id())))
                .await,
            Err(CoreError::PharmacyNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ensure_admin_runs_once() {
        let db = testing::db().await;
        let service = UserService::new(db);

        assert!(service.ensure_admin("+251900000009", "password123").await.unwrap());
        assert!(!service.ensure_admin("+251900000010", "password123").await.unwrap());
    }
}
