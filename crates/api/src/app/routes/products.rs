use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use stockroom_core::ProductId;

use crate::app::dto;
use crate::app::errors::{json_error, ApiError};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/search", get(search_products))
        .route("/low-stock", get(low_stock_products))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateProductRequest>,
) -> Result<axum::response::Response, ApiError> {
    let product = services
        .create_product(body.into_draft(), Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(dto::product_to_json(product))).into_response())
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<axum::response::Response, ApiError> {
    let items = services
        .list_products()
        .await?
        .into_iter()
        .map(dto::product_to_json)
        .collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response())
}

pub async fn search_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::SearchQuery>,
) -> Result<axum::response::Response, ApiError> {
    let items = services
        .search_products(&query.q, query.limit)
        .await?
        .into_iter()
        .map(dto::product_to_json)
        .collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response())
}

pub async fn low_stock_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<axum::response::Response, ApiError> {
    let items = services
        .low_stock_products()
        .await?
        .into_iter()
        .map(dto::product_to_json)
        .collect::<Vec<_>>();
    Ok((StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response())
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<axum::response::Response, ApiError> {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return Ok(json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid product id",
            ))
        }
    };
    let product = services.product(id).await?;
    Ok((StatusCode::OK, Json(dto::product_to_json(product))).into_response())
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateProductRequest>,
) -> Result<axum::response::Response, ApiError> {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return Ok(json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid product id",
            ))
        }
    };
    let product = services
        .update_product(id, body.into_draft(), Utc::now())
        .await?;
    Ok((StatusCode::OK, Json(dto::product_to_json(product))).into_response())
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<axum::response::Response, ApiError> {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return Ok(json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid product id",
            ))
        }
    };
    if services.delete_product(id).await? {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Err(ApiError::NotFound("product"))
    }
}
