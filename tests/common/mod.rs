#![allow(dead_code)]

use heritage_portal::{
    AppConfig, AppState, MemoryRepository, RecordingPurger, create_router,
    auth::{hash_password, issue_token},
    purge::PurgeState,
    repository::{Repository, RepositoryState},
};
use std::sync::Arc;
use tokio::net::TcpListener;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "lotus-lantern-42";

pub struct TestApp {
    pub address: String,
    pub config: AppConfig,
    /// `None` when the app was spawned without a datastore.
    pub repo: Option<Arc<MemoryRepository>>,
    pub purger: Arc<RecordingPurger>,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// A fresh session token for the seeded administrator.
    pub fn admin_token(&self) -> String {
        issue_token(&self.config.jwt_secret, ADMIN_USER).expect("Failed to sign test token")
    }
}

/// Serves the app on a random port, backed by an in-memory store with one
/// administrator account.
pub async fn spawn_app() -> TestApp {
    let repo = Arc::new(MemoryRepository::new());
    let hash = hash_password(ADMIN_PASSWORD).expect("Failed to hash test password");
    repo.create_user(ADMIN_USER, &hash)
        .await
        .expect("Failed to seed admin user");

    serve(Some(repo)).await
}

/// Serves the app with no datastore configured at all.
pub async fn spawn_app_without_store() -> TestApp {
    serve(None).await
}

async fn serve(repo: Option<Arc<MemoryRepository>>) -> TestApp {
    let config = AppConfig::default();
    let purger = Arc::new(RecordingPurger::new());

    let store = repo.clone().map(|repo| repo as RepositoryState);
    let state = AppState::new(config.clone(), store, purger.clone() as PurgeState);
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    // Redirects are part of what the tests assert on, so never follow them.
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to build HTTP client");

    TestApp {
        address,
        config,
        repo,
        purger,
        client,
    }
}
