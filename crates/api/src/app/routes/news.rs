use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, post},
    Json, Router,
};
use chrono::Utc;

use stockroom_core::NewsId;

use crate::app::dto;
use crate::app::errors::{json_error, ApiError};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_news).get(list_news))
        .route("/expired", delete(sweep_expired))
        .route("/:id", delete(delete_news))
}

pub async fn create_news(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateNewsRequest>,
) -> Result<axum::response::Response, ApiError> {
    let item = services.create_news(body.into_draft(), Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(dto::news_to_json(item))).into_response())
}

pub async fn list_news(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<axum::response::Response, ApiError> {
    let items = services
        .list_news(Utc::now())
        .await?
        .into_iter()
        .map(dto::news_to_json)
        .collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response())
}

pub async fn sweep_expired(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<axum::response::Response, ApiError> {
    let removed = services.sweep_expired_news(Utc::now()).await?;
    Ok((StatusCode::OK, Json(serde_json::json!({ "removed": removed }))).into_response())
}

pub async fn delete_news(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<axum::response::Response, ApiError> {
    let id: NewsId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return Ok(json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid news id",
            ))
        }
    };
    if services.delete_news(id).await? {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Err(ApiError::NotFound("news item"))
    }
}
