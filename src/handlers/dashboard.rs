use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde_json::Value;

use super::message_body;
use crate::{
    auth::AuthUser,
    data::{DataAccess, Fetched},
    error::ApiError,
    models::DashboardOverview,
};

/// dashboard_overview
///
/// [Dashboard Route] Who is signed in and how many records each section holds.
/// Reached only with a valid session; the gate redirects everyone else to `/login`.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Overview", body = DashboardOverview),
        (status = 303, description = "Not signed in, redirected to /login")
    )
)]
pub async fn dashboard_overview(
    State(data): State<DataAccess>,
    user: AuthUser,
) -> Fetched<DashboardOverview> {
    data.overview(&user.user_id).await
}

/// dashboard_section
///
/// [Dashboard Route] Full listing behind one management screen.
#[utoipa::path(
    get,
    path = "/dashboard/{section}",
    params(("section" = String, Path, description = "events, blogs, gallery or forms")),
    responses(
        (status = 200, description = "Records of the section"),
        (status = 404, description = "Unknown section")
    )
)]
pub async fn dashboard_section(
    State(data): State<DataAccess>,
    Path(section): Path<String>,
) -> Result<Response, ApiError> {
    let response = match section.as_str() {
        "events" => data.events().await.into_response(),
        "blogs" => data.blogs().await.into_response(),
        "gallery" => data.gallery().await.into_response(),
        "forms" => data.forms().await.into_response(),
        _ => return Err(ApiError::NotFound("Section")),
    };
    Ok(response)
}

/// login_page
///
/// Landing target of dashboard redirects. The sign-in form itself lives in the
/// frontend; this only tells API clients where to send credentials.
pub async fn login_page() -> Json<Value> {
    message_body("Sign in with POST /api/auth/login")
}
