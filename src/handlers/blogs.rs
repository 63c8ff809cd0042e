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
    models::{Blog, BlogRequest},
};

/// list_blogs
///
/// [Public Route] All posts, newest first.
#[utoipa::path(
    get,
    path = "/api/blogs",
    responses((status = 200, description = "All blog posts", body = [Blog]))
)]
pub async fn list_blogs(State(data): State<DataAccess>) -> Fetched<Vec<Blog>> {
    data.blogs().await
}

#[utoipa::path(
    get,
    path = "/api/blogs/{id}",
    params(("id" = i64, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Found", body = Blog),
        (status = 400, description = "Invalid ID"),
        (status = 404, description = "Blog not found")
    )
)]
pub async fn get_blog(
    State(data): State<DataAccess>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    Ok(data.blog(id).await.found_or(ApiError::NotFound("Blog")))
}

#[utoipa::path(
    post,
    path = "/api/blogs",
    request_body = BlogRequest,
    responses(
        (status = 201, description = "Created"),
        (status = 400, description = "Missing fields or failed write"),
        (status = 503, description = "Database not configured")
    )
)]
pub async fn create_blog(
    State(data): State<DataAccess>,
    user: AuthUser,
    payload: Result<Json<BlogRequest>, JsonRejection>,
) -> Result<Created, ApiError> {
    data.writable()?;
    let Json(payload) = payload?;

    let blog = data.create_blog(payload.validate()?).await?;
    tracing::info!(blog_id = blog.id, by = %user.user_id, "blog created");

    Ok((
        StatusCode::CREATED,
        mutation_body("Blog created successfully", "blog", blog),
    ))
}

#[utoipa::path(
    put,
    path = "/api/blogs/{id}",
    params(("id" = i64, Path, description = "Blog ID")),
    request_body = BlogRequest,
    responses(
        (status = 200, description = "Updated"),
        (status = 404, description = "Blog not found")
    )
)]
pub async fn update_blog(
    State(data): State<DataAccess>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<BlogRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    data.writable()?;
    let Json(payload) = payload?;

    let blog = data.update_blog(id, payload.into_changes()).await?;
    tracing::info!(blog_id = id, by = %user.user_id, "blog updated");

    Ok(mutation_body("Blog updated successfully", "blog", blog))
}

#[utoipa::path(
    delete,
    path = "/api/blogs/{id}",
    params(("id" = i64, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Blog not found")
    )
)]
pub async fn delete_blog(
    State(data): State<DataAccess>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    data.delete_blog(id).await?;
    tracing::info!(blog_id = id, by = %user.user_id, "blog deleted");

    Ok(message_body("Blog deleted successfully"))
}
