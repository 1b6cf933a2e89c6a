//! Audit-trail endpoints: strictly read-only.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use stocktrail_audit::{ChangeAction, LogFilter, TimestampOrder};
use stocktrail_core::{ChangeLogId, ItemId, UserId};
use stocktrail_infra::AppServices;

use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_logs))
        .route("/:id", get(get_log))
}

/// GET /logs?item=X&user=Y&action=Z&item_id=W&ordering=-timestamp
///
/// `item_id`, when supplied, overrides the generic `item` filter; `user`
/// and `action` still apply on top.
#[derive(Debug, Deserialize)]
pub struct LogListQuery {
    pub item: Option<String>,
    pub user: Option<String>,
    pub action: Option<String>,
    pub item_id: Option<String>,
    pub ordering: Option<String>,
}

pub async fn list_logs(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<LogListQuery>,
) -> axum::response::Response {
    let item = match query.item_id.or(query.item) {
        Some(raw) => match raw.parse::<ItemId>() {
            Ok(v) => Some(v),
            Err(_) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id")
            }
        },
        None => None,
    };

    let user = match query.user {
        Some(raw) => match raw.parse::<UserId>() {
            Ok(v) => Some(v),
            Err(_) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid user id")
            }
        },
        None => None,
    };

    let action = match query.action {
        Some(raw) => match raw.parse::<ChangeAction>() {
            Ok(v) => Some(v),
            Err(e) => {
                return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string())
            }
        },
        None => None,
    };

    let order = match query.ordering.as_deref() {
        Some("-timestamp") => TimestampOrder::Desc,
        _ => TimestampOrder::Asc,
    };

    let filter = LogFilter { item, user, action };
    match services.logs.list(filter, order).await {
        Ok(views) => (
            StatusCode::OK,
            Json(views.iter().map(dto::log_to_json).collect::<Vec<_>>()),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_log(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ChangeLogId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid log id"),
    };
    match services.logs.get(id).await {
        Ok(view) => (StatusCode::OK, Json(dto::log_to_json(&view))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
