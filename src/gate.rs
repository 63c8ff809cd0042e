//! Access gate.
//!
//! Every request passes through [`access_gate`] before routing. The gate classifies
//! the request by path and method, demands a valid session token where the class
//! requires one, and decorates API responses with cross-origin and cache headers.
//! It keeps no state between requests.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    auth::{AuthUser, bearer_token, cookie_token, verify_token},
    config::AppConfig,
    error::ApiError,
};

/// Where unauthenticated dashboard visitors are sent.
pub const LOGIN_PATH: &str = "/login";

pub const API_PREFIX: &str = "/api";
pub const AUTH_PREFIX: &str = "/api/auth";
pub const DASHBOARD_PREFIX: &str = "/dashboard";

/// API prefixes whose mutating methods need a token. Reads stay public.
pub const GATED_API_PREFIXES: [&str; 4] = ["/api/forms", "/api/blogs", "/api/events", "/api/gallery"];

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization";
const API_CACHE_CONTROL: &str = "no-store, max-age=0, must-revalidate";

/// Access
///
/// What a request must present to get past the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Login, registration and logout. Always forwarded.
    AuthEndpoint,
    /// Admin dashboard. Needs a valid token or gets redirected to the login page.
    Dashboard,
    /// Mutation of a managed resource. Needs a valid token or gets a JSON 401.
    GatedApi,
    /// Everything else, including every read of the API.
    Public,
}

/// Classifies a request. Rules apply in order; the first match wins.
pub fn classify(path: &str, method: &Method) -> Access {
    if is_under(path, AUTH_PREFIX) {
        Access::AuthEndpoint
    } else if is_under(path, DASHBOARD_PREFIX) {
        Access::Dashboard
    } else if is_mutating(method)
        && GATED_API_PREFIXES
            .iter()
            .any(|prefix| is_under(path, prefix))
    {
        Access::GatedApi
    } else {
        Access::Public
    }
}

/// Segment-aware prefix match: `/api/blogs` covers `/api/blogs/7` but not
/// `/api/blogsearch`.
pub fn is_under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

fn is_mutating(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::DELETE)
}

/// access_gate
///
/// Middleware applied to the whole router, unmatched paths included.
///
/// * `OPTIONS` under `/api` short-circuits with 204 and the cross-origin headers.
/// * Dashboard requests without a valid token are redirected to [`LOGIN_PATH`].
/// * Gated API requests without a token get 401 "Authorization header is missing";
///   with a bad or expired one, 401 "Invalid or expired token".
///
/// A verified identity is stored in the request extensions as [`AuthUser`].
pub async fn access_gate(
    State(config): State<AppConfig>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let origin = response_origin(&config, request.headers());

    if request.method() == Method::OPTIONS && is_under(&path, API_PREFIX) {
        let mut response = StatusCode::NO_CONTENT.into_response();
        apply_cors(response.headers_mut(), &origin);
        return response;
    }

    let access = classify(&path, request.method());
    let mut response = match access {
        Access::Dashboard => {
            // Browsers carry the cookie; scripted clients may send a bearer header.
            let token = cookie_token(request.headers()).or_else(|| bearer_token(request.headers()));
            match authenticate(&config, token) {
                Ok(user) => {
                    request.extensions_mut().insert(user);
                    next.run(request).await
                }
                Err(e) => {
                    tracing::info!(%path, reason = %e, "dashboard access denied, redirecting to login");
                    Redirect::to(LOGIN_PATH).into_response()
                }
            }
        }
        Access::GatedApi => {
            let token = bearer_token(request.headers()).or_else(|| cookie_token(request.headers()));
            match authenticate(&config, token) {
                Ok(user) => {
                    request.extensions_mut().insert(user);
                    next.run(request).await
                }
                Err(e) => {
                    tracing::info!(%path, method = %request.method(), reason = %e, "api mutation rejected");
                    e.into_response()
                }
            }
        }
        Access::AuthEndpoint | Access::Public => next.run(request).await,
    };

    if is_under(&path, API_PREFIX) {
        let headers = response.headers_mut();
        apply_cors(headers, &origin);
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(API_CACHE_CONTROL),
        );
    }

    response
}

// Any verification failure, whatever its cause, is reported as an invalid token.
fn authenticate(config: &AppConfig, token: Option<String>) -> Result<AuthUser, ApiError> {
    let token = token.ok_or(ApiError::MissingToken)?;
    verify_token(&config.jwt_secret, &token)
        .map(AuthUser::from)
        .map_err(|e| {
            tracing::debug!("{e}");
            ApiError::InvalidToken
        })
}

/// The request's `Origin` if it is on the allow-list, else the default origin.
pub fn response_origin(config: &AppConfig, headers: &HeaderMap) -> String {
    headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(|origin| origin.trim_end_matches('/'))
        .filter(|origin| config.allowed_origins.iter().any(|allowed| allowed == origin))
        .unwrap_or_else(|| config.default_origin())
        .to_string()
}

fn apply_cors(headers: &mut HeaderMap, origin: &str) {
    if let Ok(origin) = HeaderValue::from_str(origin) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    }
    let fixed: [(HeaderName, &'static str); 4] = [
        (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOWED_HEADERS),
        (header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"),
        (header::VARY, "Origin"),
    ];
    for (name, value) in fixed {
        headers.insert(name, HeaderValue::from_static(value));
    }
}
