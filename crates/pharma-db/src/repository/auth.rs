//! # Password Reset Codes
//!
//! One live code per phone number. Requesting a new code overwrites the old
//! one; a successful reset deletes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// A stored one-time code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OneTimeCode {
    pub phone_number: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl OneTimeCode {
    /// True if `code` matches and the code has not expired at `now`.
    pub fn accepts(&self, code: &str, now: DateTime<Utc>) -> bool {
        self.code == code && self.expires_at > now
    }
}

/// Repository for one-time code operations.
#[derive(Debug, Clone)]
pub struct AuthCodeRepository {
    pool: SqlitePool,
}

impl AuthCodeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AuthCodeRepository { pool }
    }

    /// Stores `code` for `phone_number`, replacing any previous code.
    pub async fn upsert(
        &self,
        phone_number: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(phone = %phone_number, "Storing reset code");

        sqlx::query(
            "INSERT INTO one_time_codes (phone_number, code, expires_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(phone_number) DO UPDATE SET code = excluded.code, \
                                                     expires_at = excluded.expires_at",
        )
        .bind(phone_number)
        .bind(code)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, phone_number: &str) -> DbResult<Option<OneTimeCode>> {
        let code = sqlx::query_as::<_, OneTimeCode>(
            "SELECT phone_number, code, expires_at FROM one_time_codes WHERE phone_number = ?1",
        )
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(code)
    }

    pub async fn delete(&self, phone_number: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM one_time_codes WHERE phone_number = ?1")
            .bind(phone_number)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
