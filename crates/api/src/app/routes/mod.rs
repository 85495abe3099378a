use axum::Router;

pub mod auth;
pub mod news;
pub mod products;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/news", news::router())
}
