//! Order routes (read-only).

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use pharma_core::{OrderDetails, OrderSummary};

use crate::auth::AuthCaller;
use crate::error::ApiResult;
use crate::routes::PageParams;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", get(list))
        .route("/orders/{id}", get(details))
}

async fn list(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Vec<OrderSummary>>> {
    let page = params.page()?;
    Ok(Json(state.orders.list(&caller, page).await?))
}

async fn details(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderDetails>> {
    Ok(Json(state.orders.details(&caller, &id).await?))
}
