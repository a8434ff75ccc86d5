//! Staff onboarding routes.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use pharma_core::User;

use crate::auth::AuthCaller;
use crate::error::ApiResult;
use crate::services::user_service::NewStaff;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/owners", post(create_owner))
        .route(
            "/users/pharmacists",
            get(list_pharmacists).post(create_pharmacist),
        )
}

#[derive(Debug, Deserialize)]
struct PharmacistFilter {
    pharmacy_id: Option<String>,
}

async fn create_owner(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Json(input): Json<NewStaff>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.users.create_owner(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn create_pharmacist(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Json(input): Json<NewStaff>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.users.create_pharmacist(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn list_pharmacists(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Query(filter): Query<PharmacistFilter>,
) -> ApiResult<Json<Vec<User>>> {
    let users = state
        .users
        .list_pharmacists(&caller, filter.pharmacy_id.as_deref())
        .await?;
    Ok(Json(users))
}
