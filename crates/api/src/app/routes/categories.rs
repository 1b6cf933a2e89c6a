use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stocktrail_core::CategoryId;
use stocktrail_infra::AppServices;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:id",
            get(get_category)
                .put(update_category)
                .patch(update_category)
                .delete(delete_category),
        )
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateCategoryRequest>,
) -> axum::response::Response {
    match services.categories.create(body.into()).await {
        Ok(category) => {
            (StatusCode::CREATED, Json(dto::category_to_json(&category))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.categories.list().await {
        Ok(categories) => (
            StatusCode::OK,
            Json(categories.iter().map(dto::category_to_json).collect::<Vec<_>>()),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CategoryId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid category id")
        }
    };
    match services.categories.get(id).await {
        Ok(category) => (StatusCode::OK, Json(dto::category_to_json(&category))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateCategoryRequest>,
) -> axum::response::Response {
    let id: CategoryId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid category id")
        }
    };
    match services.categories.update(id, body.into()).await {
        Ok(category) => (StatusCode::OK, Json(dto::category_to_json(&category))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// Items referencing the category keep existing with no category.
pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CategoryId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid category id")
        }
    };
    match services.categories.delete(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
