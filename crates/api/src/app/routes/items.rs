use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use stocktrail_core::ItemId;
use stocktrail_infra::{service::DEFAULT_LOW_STOCK_THRESHOLD, AppServices};

use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/low_stock", get(low_stock))
        .route(
            "/:id",
            get(get_item)
                .put(update_item)
                .patch(update_item)
                .delete(delete_item),
        )
}

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<String>,
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateItemRequest>,
) -> axum::response::Response {
    match services
        .items
        .create(body.into(), &principal.principal())
        .await
    {
        Ok(view) => (StatusCode::CREATED, Json(dto::item_to_json(&view))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Reads are open to any authenticated principal, not just the owner.
pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.items.list().await {
        Ok(views) => (
            StatusCode::OK,
            Json(views.iter().map(dto::item_to_json).collect::<Vec<_>>()),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn low_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<LowStockQuery>,
) -> axum::response::Response {
    let threshold = match query.threshold {
        Some(raw) => match raw.parse::<i64>() {
            Ok(v) => v,
            Err(_) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    "Threshold must be an integer",
                )
            }
        },
        None => DEFAULT_LOW_STOCK_THRESHOLD,
    };

    match services.items.list_low_stock(threshold).await {
        Ok(views) => (
            StatusCode::OK,
            Json(views.iter().map(dto::item_to_json).collect::<Vec<_>>()),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id"),
    };
    match services.items.get(id).await {
        Ok(view) => (StatusCode::OK, Json(dto::item_to_json(&view))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateItemRequest>,
) -> axum::response::Response {
    let id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id"),
    };
    match services
        .items
        .update(id, body.into(), &principal.principal())
        .await
    {
        Ok(view) => (StatusCode::OK, Json(dto::item_to_json(&view))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id"),
    };
    match services.items.delete(id, &principal.principal()).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
