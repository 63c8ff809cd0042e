use crate::{AppState, handlers::dashboard};
use axum::{Router, routing::get};

/// Pages Router Module
///
/// Everything outside `/api`. Anything under `/dashboard`, routed here or not,
/// requires a session; the gate redirects anonymous visitors to `/login`.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check. Does not touch the datastore.
        .route("/health", get(|| async { "ok" }))
        .route("/login", get(dashboard::login_page))
        .route("/dashboard", get(dashboard::dashboard_overview))
        .route("/dashboard/{section}", get(dashboard::dashboard_section))
}
