//! HTTP API application wiring (Axum router + service wiring).
//!
//! If you're new to Rust, this folder is structured like:
//! - `services.rs`: store wiring + the operations behind the handlers
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router against env-selected backends (public
/// entrypoint used by `main.rs`).
pub async fn build_app() -> anyhow::Result<Router> {
    let services = services::build_services().await?;
    Ok(build_app_with(services))
}

/// Build the full HTTP router over explicit services (tests wire the
/// in-memory backend through here).
pub fn build_app_with(services: services::AppServices) -> Router {
    let auth_state = middleware::AuthState {
        store: services.store.clone(),
        sessions: services.sessions.clone(),
    };
    let services = Arc::new(services);

    // Protected routes: require a live session.
    let protected = routes::router()
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/auth", routes::auth::public_router())
        .layer(Extension(services))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
