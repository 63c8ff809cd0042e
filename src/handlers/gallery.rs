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
    models::{GalleryImage, GalleryImageRequest},
};

/// list_gallery
///
/// [Public Route] Every image, most recently uploaded first.
#[utoipa::path(
    get,
    path = "/api/gallery",
    responses((status = 200, description = "All gallery images", body = [GalleryImage]))
)]
pub async fn list_gallery(State(data): State<DataAccess>) -> Fetched<Vec<GalleryImage>> {
    data.gallery().await
}

/// gallery_for_event
///
/// [Public Route] The album of one event. An unknown event name is an empty album,
/// not a 404.
#[utoipa::path(
    get,
    path = "/api/gallery/events/{event_name}",
    params(("event_name" = String, Path, description = "Event name the images are filed under")),
    responses((status = 200, description = "Images of the event", body = [GalleryImage]))
)]
pub async fn gallery_for_event(
    State(data): State<DataAccess>,
    Path(event_name): Path<String>,
) -> Fetched<Vec<GalleryImage>> {
    data.gallery_for_event(&event_name).await
}

#[utoipa::path(
    get,
    path = "/api/gallery/{id}",
    params(("id" = i64, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Found", body = GalleryImage),
        (status = 404, description = "Image not found")
    )
)]
pub async fn get_gallery_image(
    State(data): State<DataAccess>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    Ok(data.gallery_image(id).await.found_or(ApiError::NotFound("Image")))
}

#[utoipa::path(
    post,
    path = "/api/gallery",
    request_body = GalleryImageRequest,
    responses(
        (status = 201, description = "Added"),
        (status = 400, description = "Missing fields or failed write"),
        (status = 503, description = "Database not configured")
    )
)]
pub async fn add_gallery_image(
    State(data): State<DataAccess>,
    user: AuthUser,
    payload: Result<Json<GalleryImageRequest>, JsonRejection>,
) -> Result<Created, ApiError> {
    data.writable()?;
    let Json(payload) = payload?;

    let image = data.add_gallery_image(payload.validate()?).await?;
    tracing::info!(image_id = image.id, event_name = %image.event_name, by = %user.user_id, "gallery image added");

    Ok((
        StatusCode::CREATED,
        mutation_body("Image added successfully", "image", image),
    ))
}

#[utoipa::path(
    put,
    path = "/api/gallery/{id}",
    params(("id" = i64, Path, description = "Image ID")),
    request_body = GalleryImageRequest,
    responses(
        (status = 200, description = "Updated"),
        (status = 404, description = "Image not found")
    )
)]
pub async fn update_gallery_image(
    State(data): State<DataAccess>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<GalleryImageRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    data.writable()?;
    let Json(payload) = payload?;

    let image = data.update_gallery_image(id, payload.into_changes()).await?;
    tracing::info!(image_id = id, by = %user.user_id, "gallery image updated");

    Ok(mutation_body("Image updated successfully", "image", image))
}

#[utoipa::path(
    delete,
    path = "/api/gallery/{id}",
    params(("id" = i64, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Image not found")
    )
)]
pub async fn delete_gallery_image(
    State(data): State<DataAccess>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    data.delete_gallery_image(id).await?;
    tracing::info!(image_id = id, by = %user.user_id, "gallery image deleted");

    Ok(message_body("Image deleted successfully"))
}
