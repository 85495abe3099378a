use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::{CurrentUser, SessionToken};

/// Routes reachable without a session.
pub fn public_router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Routes behind the session gate.
pub fn router() -> Router {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterRequest>,
) -> Result<axum::response::Response, ApiError> {
    let user = services.register(body.into_draft(), Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(dto::user_to_json(user))).into_response())
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> Result<axum::response::Response, ApiError> {
    let session = services
        .login(&body.username, &body.password, Utc::now())
        .await?;
    Ok((StatusCode::OK, Json(dto::session_to_json(session))).into_response())
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(token): Extension<SessionToken>,
) -> Result<axum::response::Response, ApiError> {
    services.logout(token.0).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(current): Extension<CurrentUser>,
) -> Result<axum::response::Response, ApiError> {
    let user = services.current_user(current.user_id()).await?;
    Ok((StatusCode::OK, Json(dto::user_to_json(user))).into_response())
}
