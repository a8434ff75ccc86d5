//! Cart routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};

use pharma_core::CartItem;

use crate::auth::AuthCaller;
use crate::error::ApiResult;
use crate::services::cart_service::{AddToCart, CartView};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cart", get(view).post(add))
        .route("/cart/{id}", delete(remove))
}

async fn add(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Json(input): Json<AddToCart>,
) -> ApiResult<(StatusCode, Json<CartItem>)> {
    let item = state.carts.add(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn view(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
) -> ApiResult<Json<CartView>> {
    Ok(Json(state.carts.view(&caller).await?))
}

async fn remove(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.carts.remove(&caller, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
