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
    models::{Event, EventRequest},
};

/// list_events
///
/// [Public Route] Every event, newest first by date. Never fails: without a
/// reachable store the list is empty and `x-data-status: unavailable` is set.
#[utoipa::path(
    get,
    path = "/api/events",
    responses((status = 200, description = "All events", body = [Event]))
)]
pub async fn list_events(State(data): State<DataAccess>) -> Fetched<Vec<Event>> {
    data.events().await
}

/// upcoming_events
///
/// [Public Route] The next three events from today, soonest first. Feeds the home page.
#[utoipa::path(
    get,
    path = "/api/events/upcoming",
    responses((status = 200, description = "Upcoming events", body = [Event]))
)]
pub async fn upcoming_events(State(data): State<DataAccess>) -> Fetched<Vec<Event>> {
    data.upcoming_events().await
}

#[utoipa::path(
    get,
    path = "/api/events/{id}",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Found", body = Event),
        (status = 400, description = "Invalid ID"),
        (status = 404, description = "Event not found")
    )
)]
pub async fn get_event(
    State(data): State<DataAccess>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    Ok(data.event(id).await.found_or(ApiError::NotFound("Event")))
}

/// create_event
///
/// [Gated Route] `title`, `description` and `date` are required.
#[utoipa::path(
    post,
    path = "/api/events",
    request_body = EventRequest,
    responses(
        (status = 201, description = "Created"),
        (status = 400, description = "Missing fields or failed write"),
        (status = 401, description = "Missing or invalid token"),
        (status = 503, description = "Database not configured")
    )
)]
pub async fn create_event(
    State(data): State<DataAccess>,
    user: AuthUser,
    payload: Result<Json<EventRequest>, JsonRejection>,
) -> Result<Created, ApiError> {
    data.writable()?;
    let Json(payload) = payload?;

    let event = data.create_event(payload.validate()?).await?;
    tracing::info!(event_id = event.id, by = %user.user_id, "event created");

    Ok((
        StatusCode::CREATED,
        mutation_body("Event created successfully", "event", event),
    ))
}

/// update_event
///
/// [Gated Route] Partial update; omitted fields keep their current value.
#[utoipa::path(
    put,
    path = "/api/events/{id}",
    params(("id" = i64, Path, description = "Event ID")),
    request_body = EventRequest,
    responses(
        (status = 200, description = "Updated"),
        (status = 404, description = "Event not found")
    )
)]
pub async fn update_event(
    State(data): State<DataAccess>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<EventRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    data.writable()?;
    let Json(payload) = payload?;

    let event = data.update_event(id, payload.into_changes()?).await?;
    tracing::info!(event_id = id, by = %user.user_id, "event updated");

    Ok(mutation_body("Event updated successfully", "event", event))
}

#[utoipa::path(
    delete,
    path = "/api/events/{id}",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Event not found")
    )
)]
pub async fn delete_event(
    State(data): State<DataAccess>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    data.delete_event(id).await?;
    tracing::info!(event_id = id, by = %user.user_id, "event deleted");

    Ok(message_body("Event deleted successfully"))
}
