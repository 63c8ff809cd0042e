use heritage_portal::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    purge::{LogPurger, PurgeState, WebhookPurger},
    repository::{PostgresRepository, RepositoryState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, installs logging, prepares the datastore handle and serves.
#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "heritage_portal=debug,tower_http=info,axum=info".into());

    // Pretty output for local debugging, JSON for log aggregation in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    let store = init_store(&config).await;

    let purger: PurgeState = match &config.revalidate_url {
        Some(url) => {
            tracing::info!(%url, "cache purges go to the revalidation webhook");
            Arc::new(WebhookPurger::new(url, config.revalidate_token.as_deref()))
        }
        None => Arc::new(LogPurger),
    };

    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(config, store, purger));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {bind_addr}");
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server stopped: {e}");
    }
}

/// Builds the shared pool once. Nothing here is fatal: without a usable
/// `DATABASE_URL` the site still serves, with empty reads and 503 writes.
async fn init_store(config: &AppConfig) -> Option<RepositoryState> {
    let Some(url) = &config.database_url else {
        tracing::warn!("DATABASE_URL not configured; running without a datastore");
        return None;
    };

    let repo = match PostgresRepository::connect_lazy(url) {
        Ok(repo) => repo,
        Err(e) => {
            tracing::error!("DATABASE_URL is unusable, running without a datastore: {e}");
            return None;
        }
    };

    if let Err(e) = repo.migrate().await {
        tracing::error!("schema migration failed, continuing with the existing schema: {e}");
    }

    Some(Arc::new(repo) as RepositoryState)
}
