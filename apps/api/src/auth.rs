//! JWT authentication module.
//!
//! Handles token generation, validation and refresh, and turns a bearer
//! header into the [`Caller`] every service call is authorized against.
//!
//! ```text
//! Authorization: Bearer <jwt>
//!        │
//!        ▼
//! extract_bearer_token ──► validate_access_token ──► Claims
//!                                                     │
//!                          AuthCaller(Caller {user_id: sub, role, pharmacy_id})
//! ```
//! Anything missing, malformed, expired or of the wrong token type is
//! rejected with `INVALID_TOKEN` (401).

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pharma_core::{Caller, CoreError, Role, User};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

const ACCESS: &str = "access";
const REFRESH: &str = "refresh";

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user_id)
    pub sub: String,

    pub role: Role,

    /// Home pharmacy; absent for admins
    pub pharmacy_id: Option<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    /// Token type ("access" or "refresh")
    pub token_type: String,
}

impl Claims {
    pub fn caller(&self) -> Caller {
        Caller::new(self.sub.clone(), self.role, self.pharmacy_id.clone())
    }
}

/// Issued on login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// JWT token manager.
#[derive(Clone)]
pub struct JwtManager {
    secret: String,
    access_lifetime_secs: i64,
    refresh_lifetime_secs: i64,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("access_lifetime_secs", &self.access_lifetime_secs)
            .field("refresh_lifetime_secs", &self.refresh_lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: String, access_lifetime_secs: i64, refresh_lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            access_lifetime_secs,
            refresh_lifetime_secs,
        }
    }

    pub fn access_lifetime_secs(&self) -> i64 {
        self.access_lifetime_secs
    }

    fn sign(&self, user: &Caller, token_type: &str, lifetime_secs: i64) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(lifetime_secs);

        let claims = Claims {
            sub: user.user_id.clone(),
            role: user.role,
            pharmacy_id: user.pharmacy_id.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type: token_type.to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::internal(format!("Failed to generate {} token: {}", token_type, e)))
    }

    /// Generate an access token.
    pub fn generate_access_token(&self, user: &Caller) -> ApiResult<String> {
        self.sign(user, ACCESS, self.access_lifetime_secs)
    }

    /// Generate a refresh token.
    pub fn generate_refresh_token(&self, user: &Caller) -> ApiResult<String> {
        self.sign(user, REFRESH, self.refresh_lifetime_secs)
    }

    /// Access + refresh token for a freshly authenticated user.
    pub fn issue(&self, user: &User) -> ApiResult<TokenPair> {
        let caller = Caller::new(user.id.clone(), user.role, user.pharmacy_id.clone());
        Ok(TokenPair {
            access_token: self.generate_access_token(&caller)?,
            refresh_token: self.generate_refresh_token(&caller)?,
            token_type: "Bearer".to_string(),
            expires_in: self.access_lifetime_secs,
        })
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> ApiResult<Claims> {
        let validation = Validation::default();

        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            ApiError::from(CoreError::InvalidToken)
        })?;

        Ok(token_data.claims)
    }

    /// Validate that a token is an access token.
    pub fn validate_access_token(&self, token: &str) -> ApiResult<Claims> {
        let claims = self.validate_token(token)?;

        if claims.token_type != ACCESS {
            return Err(ApiError::invalid_token());
        }

        Ok(claims)
    }

    /// Validate that a token is a refresh token.
    pub fn validate_refresh_token(&self, token: &str) -> ApiResult<Claims> {
        let claims = self.validate_token(token)?;

        if claims.token_type != REFRESH {
            return Err(ApiError::invalid_token());
        }

        Ok(claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// =============================================================================
// Extractor
// =============================================================================

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct AuthCaller(pub Caller);

impl FromRequestParts<Arc<AppState>> for AuthCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer_token)
            .ok_or_else(ApiError::invalid_token)?;

        let claims = state.jwt.validate_access_token(token)?;
        Ok(AuthCaller(claims.caller()))
    }
}
