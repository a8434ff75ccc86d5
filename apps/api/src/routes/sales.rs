//! Sale routes: confirmation and history.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use pharma_core::sale::ConfirmedSale;
use pharma_core::{Receipt, Sale, SaleDetails};

use crate::auth::AuthCaller;
use crate::error::ApiResult;
use crate::routes::PageParams;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sales/confirm", post(confirm))
        .route("/sales", get(list))
        .route("/sales/{id}", get(get_one))
        .route("/sales/{id}/receipt", get(receipt))
}

async fn confirm(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
) -> ApiResult<(StatusCode, Json<ConfirmedSale>)> {
    let confirmed = state.sales.confirm(&caller).await?;
    Ok((StatusCode::CREATED, Json(confirmed)))
}

async fn list(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Vec<Sale>>> {
    let page = params.page()?;
    Ok(Json(state.sales.list(&caller, page).await?))
}

async fn get_one(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleDetails>> {
    Ok(Json(state.sales.get(&caller, &id).await?))
}

async fn receipt(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Path(id): Path<String>,
) -> ApiResult<Json<Receipt>> {
    Ok(Json(state.sales.receipt(&caller, &id).await?))
}
