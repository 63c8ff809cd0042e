use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use serde_json::Value;

use super::{Created, message_body, mutation_body};
use crate::{
    auth::AuthUser,
    data::{DataAccess, Fetched},
    error::{ApiError, parse_id},
    models::{FormListing, FormListingRequest},
};

/// list_forms
///
/// [Public Route] Sign-up forms currently listed on the site.
#[utoipa::path(
    get,
    path = "/api/forms",
    responses((status = 200, description = "All form listings", body = [FormListing]))
)]
pub async fn list_forms(State(data): State<DataAccess>) -> Fetched<Vec<FormListing>> {
    data.forms().await
}

#[utoipa::path(
    get,
    path = "/api/forms/{id}",
    params(("id" = i64, Path, description = "Form ID")),
    responses(
        (status = 200, description = "Found", body = FormListing),
        (status = 404, description = "Form not found")
    )
)]
pub async fn get_form(
    State(data): State<DataAccess>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    Ok(data.form(id).await.found_or(ApiError::NotFound("Form")))
}

/// create_form
///
/// [Gated Route] `status` defaults to "open" when omitted.
#[utoipa::path(
    post,
    path = "/api/forms",
    request_body = FormListingRequest,
    responses(
        (status = 201, description = "Created"),
        (status = 400, description = "Missing fields or failed write"),
        (status = 503, description = "Database not configured")
    )
)]
pub async fn create_form(
    State(data): State<DataAccess>,
    user: AuthUser,
    payload: Result<Json<FormListingRequest>, JsonRejection>,
) -> Result<Created, ApiError> {
    data.writable()?;
    let Json(payload) = payload?;

    let form = data.create_form(payload.validate()?).await?;
    tracing::info!(form_id = form.id, by = %user.user_id, "form listing created");

    Ok((
        StatusCode::CREATED,
        mutation_body("Form created successfully", "form", form),
    ))
}

#[utoipa::path(
    put,
    path = "/api/forms/{id}",
    params(("id" = i64, Path, description = "Form ID")),
    request_body = FormListingRequest,
    responses(
        (status = 200, description = "Updated"),
        (status = 404, description = "Form not found")
    )
)]
pub async fn update_form(
    State(data): State<DataAccess>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<FormListingRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    data.writable()?;
    let Json(payload) = payload?;

    let form = data.update_form(id, payload.into_changes()).await?;
    tracing::info!(form_id = id, by = %user.user_id, "form listing updated");

    Ok(mutation_body("Form updated successfully", "form", form))
}

#[utoipa::path(
    delete,
    path = "/api/forms/{id}",
    params(("id" = i64, Path, description = "Form ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Form not found")
    )
)]
pub async fn delete_form(
    State(data): State<DataAccess>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    data.delete_form(id).await?;
    tracing::info!(form_id = id, by = %user.user_id, "form listing deleted");

    Ok(message_body("Form deleted successfully"))
}
