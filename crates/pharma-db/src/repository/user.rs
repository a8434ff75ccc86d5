//! # User Repository
//!
//! Accounts for all three roles. Phone numbers are globally unique; a
//! duplicate insert surfaces as `UniqueViolation { field: "users.phone_number" }`.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use pharma_core::{Role, User};

const USER_COLUMNS: &str = "id, phone_number, password_hash, full_name, role, pharmacy_id, \
                            profile_picture, created_at, updated_at";

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, role = %user.role, "Inserting user");

        sqlx::query(
            "INSERT INTO users (id, phone_number, password_hash, full_name, role, pharmacy_id, \
                                profile_picture, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&user.id)
        .bind(&user.phone_number)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role)
        .bind(&user.pharmacy_id)
        .bind(&user.profile_picture)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &user.phone_number),
            other => other,
        })?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn get_by_phone(&self, phone_number: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE phone_number = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(phone_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn phone_exists(&self, phone_number: &str) -> DbResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE phone_number = ?1")
            .bind(phone_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    /// Users of one role, optionally restricted to a pharmacy, by name.
    pub async fn list_by_role(
        &self,
        role: Role,
        pharmacy_filter: Option<&str>,
    ) -> DbResult<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE role = ?1 AND (?2 IS NULL OR pharmacy_id = ?2) \
             ORDER BY full_name"
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(role)
            .bind(pharmacy_filter)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    pub async fn count_by_role(&self, role: Role) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = ?1")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn update_profile(
        &self,
        id: &str,
        full_name: &str,
        profile_picture: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id = %id, "Updating profile");

        let result = sqlx::query(
            "UPDATE users SET full_name = ?2, profile_picture = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(id)
        .bind(full_name)
        .bind(profile_picture)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    pub async fn update_password(
        &self,
        phone_number: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(phone = %phone_number, "Updating password");

        let result = sqlx::query(
            "UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE phone_number = ?1",
        )
        .bind(phone_number)
        .bind(password_hash)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", phone_number));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;
    use pharma_core::CoreError;

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = fixtures::db().await;
        let p = fixtures::pharmacy(&db, "Main").await;
        let owner = fixtures::user(&db, Role::Owner, Some(&p.id)).await;

        let by_phone = db.users().get_by_phone(&owner.phone_number).await.unwrap().unwrap();
        assert_eq!(by_phone.id, owner.id);
        assert_eq!(by_phone.role, Role::Owner);
        assert_eq!(by_phone.pharmacy_id.as_deref(), Some(p.id.as_str()));
        assert!(db.users().phone_exists(&owner.phone_number).await.unwrap());
        assert!(db.users().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_phone_maps_to_phone_taken() {
        let db = fixtures::db().await;
        let admin = fixtures::user(&db, Role::Admin, None).await;

        let mut twin = admin.clone();
        twin.id = crate::repository::new_id();
        let err = db.users().insert(&twin).await.unwrap_err();
        let core: CoreError = err.into();
        assert!(matches!(core, CoreError::PhoneNumberTaken(p) if p == admin.phone_number));
    }

    #[tokio::test]
    async fn test_list_pharmacists_by_pharmacy() {
        let db = fixtures::db().await;
        let p1 = fixtures::pharmacy(&db, "One").await;
        let p2 = fixtures::pharmacy(&db, "Two").await;
        fixtures::user(&db, Role::Pharmacist, Some(&p1.id)).await;
        fixtures::user(&db, Role::Pharmacist, Some(&p2.id)).await;
        fixtures::user(&db, Role::Owner, Some(&p1.id)).await;

        let users = db.users();
        assert_eq!(users.list_by_role(Role::Pharmacist, None).await.unwrap().len(), 2);
        assert_eq!(
            users.list_by_role(Role::Pharmacist, Some(&p1.id)).await.unwrap().len(),
            1
        );
        assert_eq!(users.count_by_role(Role::Owner).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_profile_and_password_updates() {
        let db = fixtures::db().await;
        let admin = fixtures::user(&db, Role::Admin, None).await;

        db.users()
            .update_profile(&admin.id, "Renamed", Some("https://img/x.png"), Utc::now())
            .await
            .unwrap();
        db.users()
            .update_password(&admin.phone_number, "new-hash", Utc::now())
            .await
            .unwrap();

        let reloaded = db.users().get_by_id(&admin.id).await.unwrap().unwrap();
        assert_eq!(reloaded.full_name, "Renamed");
        assert_eq!(reloaded.profile_picture.as_deref(), Some("https://img/x.png"));
        assert_eq!(reloaded.password_hash, "new-hash");

        assert!(matches!(
            db.users().update_password("+000", "h", Utc::now()).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
