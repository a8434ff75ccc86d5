//! Catalog routes: medicines, their variants, and sale-side search.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use pharma_core::{CatalogHit, Medicine, MedicineDetails, MedicineVariant};

use crate::auth::AuthCaller;
use crate::error::ApiResult;
use crate::services::catalog_service::{MedicineUpdate, NewMedicine, VariantInput};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/medicines", get(list_medicines).post(create_medicine))
        .route("/medicines/search", get(search))
        .route(
            "/medicines/{id}",
            get(get_medicine).put(update_medicine).delete(delete_medicine),
        )
        .route(
            "/medicines/{id}/variants",
            get(list_variants).post(create_variant),
        )
        .route(
            "/medicines/{id}/variants/{variant_id}",
            get(get_variant).put(update_variant).delete(delete_variant),
        )
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

// =============================================================================
// Medicines
// =============================================================================

async fn create_medicine(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Json(input): Json<NewMedicine>,
) -> ApiResult<(StatusCode, Json<Medicine>)> {
    let medicine = state.catalog.create_medicine(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(medicine)))
}

async fn list_medicines(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
) -> ApiResult<Json<Vec<Medicine>>> {
    Ok(Json(state.catalog.list_medicines(&caller).await?))
}

async fn get_medicine(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Path(id): Path<String>,
) -> ApiResult<Json<MedicineDetails>> {
    Ok(Json(state.catalog.get_medicine(&caller, &id).await?))
}

async fn update_medicine(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Path(id): Path<String>,
    Json(input): Json<MedicineUpdate>,
) -> ApiResult<Json<Medicine>> {
    Ok(Json(state.catalog.update_medicine(&caller, &id, input).await?))
}

async fn delete_medicine(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.catalog.delete_medicine(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn search(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<CatalogHit>>> {
    Ok(Json(state.catalog.search(&caller, &params.q).await?))
}

// =============================================================================
// Variants
// =============================================================================

async fn create_variant(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Path(medicine_id): Path<String>,
    Json(input): Json<VariantInput>,
) -> ApiResult<(StatusCode, Json<MedicineVariant>)> {
    let variant = state
        .catalog
        .create_variant(&caller, &medicine_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(variant)))
}

async fn list_variants(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Path(medicine_id): Path<String>,
) -> ApiResult<Json<Vec<MedicineVariant>>> {
    Ok(Json(state.catalog.list_variants(&caller, &medicine_id).await?))
}

async fn get_variant(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Path((medicine_id, variant_id)): Path<(String, String)>,
) -> ApiResult<Json<MedicineVariant>> {
    Ok(Json(
        state
            .catalog
            .get_variant(&caller, &medicine_id, &variant_id)
            .await?,
    ))
}

async fn update_variant(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Path((medicine_id, variant_id)): Path<(String, String)>,
    Json(input): Json<VariantInput>,
) -> ApiResult<Json<MedicineVariant>> {
    Ok(Json(
        state
            .catalog
            .update_variant(&caller, &medicine_id, &variant_id, input)
            .await?,
    ))
}

async fn delete_variant(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Path((medicine_id, variant_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state
        .catalog
        .delete_variant(&caller, &medicine_id, &variant_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
