use std::env;

/// Fallback signing secret for local runs. Never accepted in production.
const LOCAL_JWT_SECRET: &str = "heritage-portal-local-signing-secret";

/// Origin used when `ALLOWED_ORIGINS` is unset.
const LOCAL_ORIGIN: &str = "http://localhost:3000";

/// AppConfig
///
/// Immutable configuration loaded once at startup and shared with handlers and the
/// access gate through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects the log format and secret policy.
    pub env: Env,
    // Postgres connection string. `None` puts every read in fail-soft mode and
    // every write behind a 503.
    pub database_url: Option<String>,
    // Shared HMAC secret for issuing and verifying session tokens.
    pub jwt_secret: String,
    // Origins allowed to call the API cross-origin. The first entry is the default
    // origin reflected when the caller is not on the list.
    pub allowed_origins: Vec<String>,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Optional webhook notified with the public paths to purge after a write.
    pub revalidate_url: Option<String>,
    // Bearer token sent to the purge webhook.
    pub revalidate_token: Option<String>,
}

/// Env
///
/// Runtime context, switching between developer conveniences and hardened settings.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking configuration for tests. No datastore is configured.
    fn default() -> Self {
        Self {
            env: Env::Local,
            database_url: None,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            allowed_origins: vec![LOCAL_ORIGIN.to_string()],
            bind_addr: "0.0.0.0:3000".to_string(),
            revalidate_url: None,
            revalidate_token: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in production when `JWT_SECRET` is missing, so the server never starts
    /// signing tokens with a well-known key.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => {
                env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production.")
            }
            Env::Local => env::var("JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
        };

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|raw| parse_origins(&raw))
            .filter(|origins| !origins.is_empty())
            .unwrap_or_else(|| vec![LOCAL_ORIGIN.to_string()]);

        Self {
            env,
            database_url: non_empty_var("DATABASE_URL"),
            jwt_secret,
            allowed_origins,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            revalidate_url: non_empty_var("REVALIDATE_URL"),
            revalidate_token: non_empty_var("REVALIDATE_TOKEN"),
        }
    }

    /// The origin advertised to callers that are not on the allow-list.
    pub fn default_origin(&self) -> &str {
        self.allowed_origins
            .first()
            .map(String::as_str)
            .unwrap_or(LOCAL_ORIGIN)
    }
}

/// Splits a comma-separated origin list, dropping blanks and trailing slashes.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

// An empty variable counts as unset; deployments often export `DATABASE_URL=`.
fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
