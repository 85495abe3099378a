use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use uuid::Uuid;

use stockroom_store::{RecordStore, SessionStore};

use crate::context::{CurrentUser, SessionToken};

#[derive(Clone)]
pub struct AuthState {
    pub store: Arc<dyn RecordStore>,
    pub sessions: Arc<dyn SessionStore>,
}

/// Gate for protected routes: a request either carries a live session
/// token and proceeds with [`CurrentUser`] attached, or is rejected with
/// a bare 401. No partial authentication states exist.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_bearer(req.headers())?;
    let token: Uuid = token.parse().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let session = state
        .sessions
        .find_session(token, Utc::now())
        .await
        .map_err(|err| {
            tracing::error!("session lookup failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let user = state
        .store
        .user(session.user_id)
        .await
        .map_err(|err| {
            tracing::error!("user lookup failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let current = CurrentUser::new(user.id, user.username);
    tracing::debug!(user = current.username(), "request authenticated");
    req.extensions_mut().insert(current);
    req.extensions_mut().insert(SessionToken(token));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, StatusCode> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(token)
}
