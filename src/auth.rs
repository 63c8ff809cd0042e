use std::time::{Duration, SystemTime, UNIX_EPOCH};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::CookieJar;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{config::AppConfig, error::ApiError};

/// Name of the cookie holding the session token.
pub const SESSION_COOKIE: &str = "token";

/// Lifetime of a freshly issued session token.
pub const TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// Claims
///
/// Payload of a session token. Tokens are stateless: nothing about them is stored
/// server-side, so expiry is the only way a token stops working.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject (sub): the login identifier of the user, e.g. `"admin"`.
    pub sub: String,
    /// Issued At (iat), seconds since the Unix epoch.
    pub iat: usize,
    /// Expiration Time (exp), seconds since the Unix epoch.
    pub exp: usize,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    /// Bad signature, expired, or not a JWT at all. Callers don't distinguish.
    #[error("token rejected: {0}")]
    Rejected(#[source] jsonwebtoken::errors::Error),
}

/// Mints a signed token for `subject`, valid for [`TOKEN_LIFETIME`].
pub fn issue_token(secret: &str, subject: &str) -> Result<String, TokenError> {
    let now = unix_now();
    let claims = Claims {
        sub: subject.to_string(),
        iat: now,
        exp: now + TOKEN_LIFETIME.as_secs() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(TokenError::Signing)
}

/// Checks signature and expiry of `token`, returning its claims.
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(TokenError::Rejected)
}

fn unix_now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as usize)
        .unwrap_or_default()
}

// --- Credential Carriers ---

/// Token from an `Authorization: Bearer <token>` header. The scheme is matched
/// case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("Bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Token from the session cookie.
pub fn cookie_token(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|token| !token.is_empty())
}

// --- AuthUser Extractor ---

/// AuthUser
///
/// Identity of a request that passed the access gate. The gate stores it in the
/// request extensions; handlers take it as an argument to learn who is acting.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self { user_id: claims.sub }
    }
}

/// Reuses the identity resolved by the gate. When a handler is mounted outside the
/// gate, the token is verified here instead (bearer header first, then cookie).
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let config = AppConfig::from_ref(state);
        let token = bearer_token(&parts.headers)
            .or_else(|| cookie_token(&parts.headers))
            .ok_or(ApiError::MissingToken)?;

        verify_token(&config.jwt_secret, &token)
            .map(AuthUser::from)
            .map_err(|e| {
                tracing::debug!("token rejected by extractor: {e}");
                ApiError::InvalidToken
            })
    }
}

// --- Passwords (Argon2id) ---

/// Hashes a password into a PHC string for storage.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!("stored password hash is malformed: {e}");
            false
        }
    }
}
