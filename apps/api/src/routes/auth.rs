//! Authentication and profile routes.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

use pharma_core::User;

use crate::auth::AuthCaller;
use crate::error::ApiResult;
use crate::services::auth_service::{
    AccessToken, ForgotPasswordRequest, LoginRequest, LoginResponse, ProfileUpdate,
    RefreshRequest, ResetPasswordRequest,
};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/profile", get(profile).put(update_profile))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    Ok(Json(state.auth.login(request).await?))
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<Json<AccessToken>> {
    Ok(Json(state.auth.refresh(request).await?))
}

async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ForgotPasswordRequest>,
) -> ApiResult<StatusCode> {
    state.auth.request_password_reset(request).await?;
    Ok(StatusCode::OK)
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResetPasswordRequest>,
) -> ApiResult<StatusCode> {
    state.auth.reset_password(request).await?;
    Ok(StatusCode::OK)
}

async fn profile(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
) -> ApiResult<Json<User>> {
    Ok(Json(state.auth.profile(&caller).await?))
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    AuthCaller(caller): AuthCaller,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.auth.update_profile(&caller, update).await?))
}
