//! # Authentication Service
//!
//! Login, token refresh, profile, and SMS password reset.
//!
//! ## Password Reset Flow
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │  POST /auth/forgot-password {phone}                                  │
//! │       │                                                              │
//! │       ├── unknown phone ──► 200 (nothing sent, nothing revealed)    │
//! │       │                                                              │
//! │       └── known ──► code = 6 random digits                          │
//! │                     upsert one_time_codes(phone, code, now + ttl)   │
//! │                     NotificationSink::send(phone, "…code…")         │
//! │                                                                      │
//! │  POST /auth/reset-password {phone, code, new_password}               │
//! │       │                                                              │
//! │       ├── no code / expired / mismatch ──► INVALID_RESET_TOKEN      │
//! │       │                                                              │
//! │       └── ok ──► re-hash password, delete code                      │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use pharma_core::validation::{
    validate_full_name, validate_image_url, validate_password, validate_phone_number,
    validate_reset_code,
};
use pharma_core::{Caller, CoreError, User};
use pharma_db::password::{hash_password, verify_password};
use pharma_db::Database;

use crate::auth::{JwtManager, TokenPair};
use crate::error::{ApiError, ApiResult};
use crate::notify::{reset_code_message, NotificationSink};

// =============================================================================
// Inputs & Outputs
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub phone_number: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub phone_number: String,
    pub code: String,
    pub new_password: String,
}

// =============================================================================
// Service
// =============================================================================

#[derive(Clone)]
pub struct AuthService {
    db: Database,
    jwt: JwtManager,
    notifier: Arc<dyn NotificationSink>,
    reset_code_lifetime: Duration,
}

impl AuthService {
    pub fn new(
        db: Database,
        jwt: JwtManager,
        notifier: Arc<dyn NotificationSink>,
        reset_code_lifetime_secs: i64,
    ) -> Self {
        AuthService {
            db,
            jwt,
            notifier,
            reset_code_lifetime: Duration::seconds(reset_code_lifetime_secs),
        }
    }

    /// Unknown phone and wrong password are indistinguishable to the client.
    pub async fn login(&self, request: LoginRequest) -> ApiResult<LoginResponse> {
        let user = self.db.users().get_by_phone(&request.phone_number).await?;

        let user = match user {
            Some(u) if verify_password(&request.password, &u.password_hash) => u,
            _ => {
                warn!(phone = %request.phone_number, "Login rejected");
                return Err(CoreError::InvalidCredentials.into());
            }
        };

        let tokens = self.jwt.issue(&user)?;
        info!(user_id = %user.id, role = %user.role, "User logged in");

        Ok(LoginResponse { tokens, user })
    }

    /// New access token for a valid refresh token. Role and pharmacy are
    /// re-read so changes apply without a new login.
    pub async fn refresh(&self, request: RefreshRequest) -> ApiResult<AccessToken> {
        let claims = self.jwt.validate_refresh_token(&request.refresh_token)?;

        let user = self
            .db
            .users()
            .get_by_id(&claims.sub)
            .await?
            .ok_or_else(ApiError::invalid_token)?;

        let caller = Caller::new(user.id, user.role, user.pharmacy_id);
        Ok(AccessToken {
            access_token: self.jwt.generate_access_token(&caller)?,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.access_lifetime_secs(),
        })
    }

    pub async fn profile(&self, caller: &Caller) -> ApiResult<User> {
        let user = self
            .db
            .users()
            .get_by_id(&caller.user_id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(caller.user_id.clone()))?;
        Ok(user)
    }

    pub async fn update_profile(&self, caller: &Caller, update: ProfileUpdate) -> ApiResult<User> {
        validate_full_name(&update.full_name).map_err(CoreError::from)?;
        validate_image_url(update.profile_picture.as_deref()).map_err(CoreError::from)?;

        self.db
            .users()
            .update_profile(
                &caller.user_id,
                update.full_name.trim(),
                update.profile_picture.as_deref(),
                Utc::now(),
            )
            .await?;

        self.profile(caller).await
    }

    /// Sends a reset code if the phone belongs to a user. Succeeds either way.
    pub async fn request_password_reset(&self, request: ForgotPasswordRequest) -> ApiResult<()> {
        let phone = request.phone_number.trim();
        validate_phone_number(phone).map_err(CoreError::from)?;

        if !self.db.users().phone_exists(phone).await? {
            debug!(phone = %phone, "Reset requested for unknown phone");
            return Ok(());
        }

        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        let expires_at = Utc::now() + self.reset_code_lifetime;
        self.db.auth_codes().upsert(phone, &code, expires_at).await?;

        self.notifier
            .send(phone, &reset_code_message(&code))
            .await?;

        info!(phone = %phone, "Password reset code sent");
        Ok(())
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> ApiResult<()> {
        let phone = request.phone_number.trim();
        validate_phone_number(phone).map_err(CoreError::from)?;
        validate_reset_code(&request.code).map_err(|_| CoreError::InvalidResetToken)?;
        validate_password(&request.new_password).map_err(CoreError::from)?;

        let stored = self.db.auth_codes().get(phone).await?;
        match stored {
            Some(otc) if otc.accepts(&request.code, Utc::now()) => {}
            _ => {
                warn!(phone = %phone, "Reset code rejected");
                return Err(CoreError::InvalidResetToken.into());
            }
        }

        let hash = hash_password(&request.new_password)?;
        self.db
            .users()
            .update_password(phone, &hash, Utc::now())
            .await?;
        self.db.auth_codes().delete(phone).await?;

        info!(phone = %phone, "Password reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::notify::MockNotificationSink;
    use crate::testing;
    use pharma_core::Role;
    use std::sync::Mutex;

    fn service(db: Database, notifier: Arc<dyn NotificationSink>) -> AuthService {
        AuthService::new(
            db,
            JwtManager::new("test-secret".to_string(), 3600, 86400),
            notifier,
            600,
        )
    }

    fn silent() -> Arc<dyn NotificationSink> {
        let mut mock = MockNotificationSink::new();
        mock.expect_send().never();
        Arc::new(mock)
    }

    /// Sink that records every message body.
    fn capturing(outbox: Arc<Mutex<Vec<String>>>) -> Arc<dyn NotificationSink> {
        let mut mock = MockNotificationSink::new();
        mock.expect_send().times(1).returning(move |_, body| {
            outbox.lock().unwrap().push(body.to_string());
            Ok(())
        });
        Arc::new(mock)
    }

    fn code_from(body: &str) -> String {
        body.chars().filter(|c| c.is_ascii_digit()).collect()
    }

    #[tokio::test]
    async fn test_login_and_refresh() {
        let db = testing::db().await;
        let p = testing::pharmacy(&db, "P1").await;
        let (user, _) = testing::user(&db, Role::Owner, Some(&p.id)).await;
        let auth = service(db, silent());

        let response = auth
            .login(LoginRequest {
                phone_number: user.phone_number.clone(),
                password: testing::PASSWORD.to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.user.id, user.id);

        let refreshed = auth
            .refresh(RefreshRequest {
                refresh_token: response.tokens.refresh_token.clone(),
            })
            .await
            .unwrap();
        assert!(!refreshed.access_token.is_empty());

        // An access token is not a refresh token
        let err = auth
            .refresh(RefreshRequest {
                refresh_token: response.tokens.access_token,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidToken);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_phone() {
        let db = testing::db().await;
        let p = testing::pharmacy(&db, "P1").await;
        let (user, _) = testing::user(&db, Role::Pharmacist, Some(&p.id)).await;
        let auth = service(db, silent());

        let err = auth
            .login(LoginRequest {
                phone_number: user.phone_number,
                password: "not-the-password".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);

        let err = auth
            .login(LoginRequest {
                phone_number: "+251999999999".to_string(),
                password: testing::PASSWORD.to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_password_reset_via_sink() {
        let db = testing::db().await;
        let p = testing::pharmacy(&db, "P1").await;
        let (user, _) = testing::user(&db, Role::Pharmacist, Some(&p.id)).await;
        let outbox = Arc::new(Mutex::new(Vec::new()));
        let auth = service(db.clone(), capturing(outbox.clone()));

        auth.request_password_reset(ForgotPasswordRequest {
            phone_number: user.phone_number.clone(),
        })
        .await
        .unwrap();

        let code = code_from(&outbox.lock().unwrap()[0]);
        assert_eq!(code.len(), 6);

        let wrong = if code == "000000" { "111111" } else { "000000" };
        let err = auth
            .reset_password(ResetPasswordRequest {
                phone_number: user.phone_number.clone(),
                code: wrong.to_string(),
                new_password: "brand-new-pass".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidResetToken);

        auth.reset_password(ResetPasswordRequest {
            phone_number: user.phone_number.clone(),
            code: code.clone(),
            new_password: "brand-new-pass".to_string(),
        })
        .await
        .unwrap();

        // Code is single-use
        assert!(db.auth_codes().get(&user.phone_number).await.unwrap().is_none());

        let response = auth
            .login(LoginRequest {
                phone_number: user.phone_number,
                password: "brand-new-pass".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.user.id, user.id);
    }

    #[tokio::test]
    async fn test_reset_for_unknown_phone_sends_nothing() {
        let db = testing::db().await;
        let auth = service(db, silent());

        auth.request_password_reset(ForgotPasswordRequest {
            phone_number: "+251977777777".to_string(),
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_expired_code_rejected() {
        let db = testing::db().await;
        let p = testing::pharmacy(&db, "P1").await;
        let (user, _) = testing::user(&db, Role::Owner, Some(&p.id)).await;
        db.auth_codes()
            .upsert(&user.phone_number, "123456", Utc::now() - Duration::minutes(1))
            .await
            .unwrap();
        let auth = service(db, silent());

        let err = auth
            .reset_password(ResetPasswordRequest {
                phone_number: user.phone_number,
                code: "123456".to_string(),
                new_password: "brand-new-pass".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidResetToken);
    }

    #[tokio::test]
    async fn test_update_profile() {
        let db = testing::db().await;
        let p = testing::pharmacy(&db, "P1").await;
        let (_, caller) = testing::user(&db, Role::Pharmacist, Some(&p.id)).await;
        let auth = service(db, silent());

        let user = auth
            .update_profile(
                &caller,
                ProfileUpdate {
                    full_name: "Selam Girma".to_string(),
                    profile_picture: Some("https://cdn.example.com/selam.png".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(user.full_name, "Selam Girma");
        assert_eq!(auth.profile(&caller).await.unwrap().full_name, "Selam Girma");

        let err = auth
            .update_profile(
                &caller,
                ProfileUpdate {
                    full_name: "S".to_string(),
                    profile_picture: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }
}
