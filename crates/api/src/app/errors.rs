use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stocktrail_core::DomainError;
use stocktrail_infra::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Domain(e) => match e {
            DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
            DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
            DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
            DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
            DomainError::Unauthorized => json_error(
                StatusCode::FORBIDDEN,
                "forbidden",
                "only the managing user may modify this item",
            ),
        },
        ServiceError::Store(msg) => {
            tracing::error!("storage failure: {msg}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
