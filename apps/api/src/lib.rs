//! # Pharmacy API
//!
//! REST server for the multi-tenant pharmacy backend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Pharmacy API Services                          │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  AuthService   │  │ CatalogService │  │  CartService / SaleService ││
//! │  │                │  │                │  │                            ││
//! │  │ • Login        │  │ • Medicines    │  │ • Add / View / Remove      ││
//! │  │ • Refresh      │  │ • Variants     │  │ • Confirm (atomic)         ││
//! │  │ • Reset (SMS)  │  │ • Search       │  │ • History / Receipts       ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────┐            │
//! │  │PharmacyService │  │  UserService   │  │  OrderService  │            │
//! │  │ • CRUD (admin) │  │ • Owners       │  │ • List         │            │
//! │  │                │  │ • Pharmacists  │  │ • Details      │            │
//! │  └────────────────┘  └────────────────┘  └────────────────┘            │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                              │  │
//! │  │  ┌──────────────┐  ┌──────────────────┐  ┌─────────────────────┐ │  │
//! │  │  │  SQLite      │  │ NotificationSink │  │    JWT Auth         │ │  │
//! │  │  │  (pharma-db) │  │ Twilio / log     │  │ Bearer → Caller     │ │  │
//! │  │  └──────────────┘  └──────────────────┘  └─────────────────────┘ │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `HTTP_PORT` - listen port (default: 8080)
//! - `DATABASE_PATH` - SQLite file (default: ./pharmacy.db)
//! - `DB_MAX_CONNECTIONS` - pool size (default: 5)
//! - `JWT_SECRET` - Secret for JWT signing
//! - `JWT_ACCESS_LIFETIME_SECS` - Access token lifetime (default: 259200)
//! - `JWT_REFRESH_LIFETIME_SECS` - Refresh token lifetime (default: 604800)
//! - `RESET_CODE_LIFETIME_SECS` - Reset code lifetime (default: 600)
//! - `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, `TWILIO_PHONE_NUMBER` - SMS gateway
//! - `BOOTSTRAP_ADMIN_PHONE`, `BOOTSTRAP_ADMIN_PASSWORD` - bootstrap administrator

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use pharma_db::Database;

pub mod auth;
pub mod config;
pub mod error;
pub mod notify;
pub mod routes;
pub mod services;

#[cfg(test)]
mod testing;

// Re-exports
pub use auth::JwtManager;
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};

use notify::NotificationSink;
use services::{
    AuthService, CartService, CatalogService, OrderService, PharmacyService, SaleService,
    UserService,
};

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub jwt: JwtManager,
    pub config: ApiConfig,
    pub catalog: CatalogService,
    pub carts: CartService,
    pub sales: SaleService,
    pub orders: OrderService,
    pub pharmacies: PharmacyService,
    pub users: UserService,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig, notifier: Arc<dyn NotificationSink>) -> Self {
        let jwt = JwtManager::new(
            config.jwt_secret.clone(),
            config.jwt_access_lifetime_secs,
            config.jwt_refresh_lifetime_secs,
        );

        AppState {
            catalog: CatalogService::new(db.clone()),
            carts: CartService::new(db.clone()),
            sales: SaleService::new(db.clone()),
            orders: OrderService::new(db.clone()),
            pharmacies: PharmacyService::new(db.clone()),
            users: UserService::new(db.clone()),
            auth: AuthService::new(
                db.clone(),
                jwt.clone(),
                notifier,
                config.reset_code_lifetime_secs,
            ),
            db,
            jwt,
            config,
        }
    }
}

/// Build the full HTTP router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes::auth::router())
        .merge(routes::users::router())
        .merge(routes::pharmacies::router())
        .merge(routes::catalog::router())
        .merge(routes::cart::router())
        .merge(routes::sales::router())
        .merge(routes::orders::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let database = state.db.health_check().await;
    Json(json!({
        "status": if database { "ok" } else { "degraded" },
        "database": database,
    }))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use pharma_core::Role;
    use tower::ServiceExt;

    use crate::testing;

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(testing::state().await);

        let (status, body) = send(app, get_request("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], true);
    }

    #[tokio::test]
    async fn test_missing_token_is_rejected() {
        let app = build_router(testing::state().await);

        let (status, body) = send(app, get_request("/medicines", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_login_then_sell() {
        let state = testing::state().await;
        let pharmacy = testing::pharmacy(&state.db, "Central").await;
        let (user, _) = testing::user(&state.db, Role::Pharmacist, Some(&pharmacy.id)).await;
        let medicine = testing::medicine(&state.db, &pharmacy.id, "Paracetamol").await;
        let variant = testing::variant(&state.db, &medicine.id, "111", 500, 5).await;
        let app = build_router(state);

        let (status, body) = send(
            app.clone(),
            json_request(
                Method::POST,
                "/auth/login",
                None,
                json!({ "phone_number": user.phone_number, "password": testing::PASSWORD }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["access_token"].as_str().unwrap().to_string();

        let (status, _) = send(
            app.clone(),
            json_request(
                Method::POST,
                "/cart",
                Some(&token),
                json!({ "medicine_variant_id": variant.id, "quantity": 2 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(
            app.clone(),
            json_request(Method::POST, "/sales/confirm", Some(&token), Value::Null),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["receipt"]["content"]["total_price_cents"], 1000);

        let (status, body) = send(app, get_request("/cart", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_pharmacist_cannot_create_pharmacy() {
        let state = testing::state().await;
        let pharmacy = testing::pharmacy(&state.db, "Central").await;
        let (user, _) = testing::user(&state.db, Role::Pharmacist, Some(&pharmacy.id)).await;
        let token = state.jwt.issue(&user).unwrap().access_token;
        let app = build_router(state);

        let (status, body) = send(
            app,
            json_request(
                Method::POST,
                "/pharmacies",
                Some(&token),
                json!({ "name": "Rogue", "address": "Nowhere" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
}
