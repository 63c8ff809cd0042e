use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use serde_json::Value;

use super::{Created, message_body, mutation_body};
use crate::{
    auth::{SESSION_COOKIE, TOKEN_LIFETIME, hash_password, issue_token, verify_password},
    config::{AppConfig, Env},
    data::DataAccess,
    error::ApiError,
    models::{CredentialsRequest, LoginResponse},
};

/// login
///
/// [Auth Route] Exchanges a user ID and password for a one-hour session token. The
/// token is returned in the body for API clients and set as an HttpOnly cookie for
/// the dashboard. Unknown users and wrong passwords get the same 401.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid credentials"),
        (status = 503, description = "Database not configured")
    )
)]
pub async fn login(
    State(data): State<DataAccess>,
    State(config): State<AppConfig>,
    jar: CookieJar,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let Json(payload) = payload?;
    let (user_id, password) = payload.validate()?;

    let user = data
        .find_user(&user_id)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    // Argon2 verification blocks; keep it off the async workers.
    let stored_hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| {
            tracing::error!("password verification task failed: {e}");
            ApiError::Internal
        })?;
    if !valid {
        tracing::info!(%user_id, "login rejected");
        return Err(ApiError::InvalidCredentials);
    }

    let token = issue_token(&config.jwt_secret, &user.user_id).map_err(|e| {
        tracing::error!("{e}");
        ApiError::Internal
    })?;

    let cookie = session_cookie(
        token.clone(),
        time::Duration::seconds(TOKEN_LIFETIME.as_secs() as i64),
        &config,
    );

    tracing::info!(%user_id, "login succeeded");
    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            message: "Login successful".to_string(),
            access_token: token,
            user,
        }),
    ))
}

/// register
///
/// [Auth Route] Creates an administrator account.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Registered"),
        (status = 400, description = "Missing fields"),
        (status = 409, description = "User ID already exists"),
        (status = 503, description = "Database not configured")
    )
)]
pub async fn register(
    State(data): State<DataAccess>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Created, ApiError> {
    let Json(payload) = payload?;
    let (user_id, password) = payload.validate()?;
    data.writable()?;

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            tracing::error!("password hashing task failed: {e}");
            ApiError::Internal
        })?
        .map_err(|e| {
            tracing::error!("password hashing failed: {e}");
            ApiError::Internal
        })?;

    let user = data.register_user(&user_id, &password_hash).await?;
    tracing::info!(%user_id, "user registered");

    Ok((
        StatusCode::CREATED,
        mutation_body("Registration successful", "user", user),
    ))
}

/// logout
///
/// [Auth Route] Clears the session cookie. Tokens are stateless, so a copied token
/// stays valid until it expires.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Signed out"))
)]
pub async fn logout(
    State(config): State<AppConfig>,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    // Sent whether or not the request carried the cookie.
    let expired = session_cookie(String::new(), time::Duration::ZERO, &config);
    (jar.add(expired), message_body("Logged out"))
}

fn session_cookie(value: String, max_age: time::Duration, config: &AppConfig) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.env == Env::Production)
        .max_age(max_age)
        .build()
}
