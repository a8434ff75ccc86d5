//! Pharmacy administration routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use pharma_core::Pharmacy;

use crate::auth::AuthCaller;
use crate::error::ApiResult;
use crate::services::pharmacy_service::PharmacyInput;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pharmacies", get(list).post(create))
        .route(
            "/pharmacies/{id}",
            get(get_one).put(update).delete(delete),
        )
}

async fn create(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Json(input): Json<PharmacyInput>,
) -> ApiResult<(StatusCode, Json<Pharmacy>)> {
    let pharmacy = state.pharmacies.create(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(pharmacy)))
}

async fn list(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
) -> ApiResult<Json<Vec<Pharmacy>>> {
    Ok(Json(state.pharmacies.list(&caller).await?))
}

async fn get_one(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Path(id): Path<String>,
) -> ApiResult<Json<Pharmacy>> {
    Ok(Json(state.pharmacies.get(&caller, &id).await?))
}

async fn update(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Path(id): Path<String>,
    Json(input): Json<PharmacyInput>,
) -> ApiResult<Json<Pharmacy>> {
    Ok(Json(state.pharmacies.update(&caller, &id, input).await?))
}

async fn delete(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.pharmacies.delete(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
