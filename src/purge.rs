use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use reqwest::StatusCode;
use serde_json::json;

/// How long a purge request may take before it is abandoned.
pub const PURGE_TIMEOUT: Duration = Duration::from_secs(5);

/// CachePurger
///
/// Invalidates cached renders of public pages after a write. Purging is
/// fire-and-forget: implementations must return immediately, never report failure
/// to the caller and never retry.
pub trait CachePurger: Send + Sync {
    fn purge(&self, paths: &[String]);
}

/// PurgeState
///
/// Shared handle to the configured purger.
pub type PurgeState = Arc<dyn CachePurger>;

/// WebhookPurger
///
/// POSTs `{"paths": [...]}` to the site's revalidation endpoint on a spawned task.
#[derive(Clone)]
pub struct WebhookPurger {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl WebhookPurger {
    pub fn new(url: &str, token: Option<&str>) -> Self {
        Self::with_timeout(url, token, PURGE_TIMEOUT)
    }

    /// Requests to the webhook are abandoned after `timeout`.
    pub fn with_timeout(url: &str, token: Option<&str>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::error!("failed to build purge client, using defaults: {e}");
                reqwest::Client::new()
            });

        Self {
            client,
            url: url.to_string(),
            token: token.map(str::to_string),
        }
    }

    /// Delivers one purge request and reports the webhook's status.
    pub async fn send(&self, paths: &[String]) -> Result<StatusCode, reqwest::Error> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&json!({ "paths": paths }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        Ok(request.send().await?.status())
    }
}

impl CachePurger for WebhookPurger {
    fn purge(&self, paths: &[String]) {
        let purger = self.clone();
        let paths = paths.to_vec();
        tokio::spawn(async move {
            match purger.send(&paths).await {
                Ok(status) if status.is_success() => {
                    tracing::debug!(?paths, "cache purge accepted");
                }
                Ok(status) => {
                    tracing::warn!(?paths, %status, "cache purge rejected");
                }
                Err(e) => {
                    tracing::warn!(?paths, "cache purge request failed: {e}");
                }
            }
        });
    }
}

/// LogPurger
///
/// Used when no revalidation webhook is configured.
#[derive(Clone, Default)]
pub struct LogPurger;

impl CachePurger for LogPurger {
    fn purge(&self, paths: &[String]) {
        tracing::info!(?paths, "cache purge requested (no webhook configured)");
    }
}

/// RecordingPurger
///
/// Keeps every purged path in memory so tests can assert on invalidation.
#[derive(Default)]
pub struct RecordingPurger {
    purged: Mutex<Vec<String>>,
}

impl RecordingPurger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn purged(&self) -> Vec<String> {
        self.purged
            .lock()
            .map(|paths| paths.clone())
            .unwrap_or_default()
    }
}

impl CachePurger for RecordingPurger {
    fn purge(&self, paths: &[String]) {
        if let Ok(mut purged) = self.purged.lock() {
            purged.extend(paths.iter().cloned());
        }
    }
}
