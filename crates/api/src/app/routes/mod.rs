use axum::{routing::get, Router};

pub mod categories;
pub mod items;
pub mod logs;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints.
///
/// `POST /users` (account creation) and `/health` are wired separately in
/// `app::build_app` because they stay open.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .merge(users::router())
        .nest("/categories", categories::router())
        .nest("/items", items::router())
        .nest("/logs", logs::router())
}
