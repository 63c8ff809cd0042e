use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod purge;
pub mod repository;

pub mod routes;
use routes::{api, pages};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use data::{DataAccess, Fetched};
pub use error::ApiError;
pub use purge::{LogPurger, PurgeState, RecordingPurger, WebhookPurger};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login, handlers::auth::register, handlers::auth::logout,
        handlers::events::list_events, handlers::events::upcoming_events,
        handlers::events::get_event, handlers::events::create_event,
        handlers::events::update_event, handlers::events::delete_event,
        handlers::blogs::list_blogs, handlers::blogs::get_blog, handlers::blogs::create_blog,
        handlers::blogs::update_blog, handlers::blogs::delete_blog,
        handlers::gallery::list_gallery, handlers::gallery::gallery_for_event,
        handlers::gallery::get_gallery_image, handlers::gallery::add_gallery_image,
        handlers::gallery::update_gallery_image, handlers::gallery::delete_gallery_image,
        handlers::forms::list_forms, handlers::forms::get_form, handlers::forms::create_form,
        handlers::forms::update_form, handlers::forms::delete_form,
        handlers::dashboard::dashboard_overview, handlers::dashboard::dashboard_section,
    ),
    components(
        schemas(
            models::Event, models::Blog, models::GalleryImage, models::FormListing, models::User,
            models::EventRequest, models::BlogRequest, models::GalleryImageRequest,
            models::FormListingRequest, models::CredentialsRequest, models::LoginResponse,
            models::DashboardOverview,
        )
    ),
    tags(
        (name = "heritage-portal", description = "Events, blog, gallery and forms of the organization's website")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single state container shared by every request.
#[derive(Clone)]
pub struct AppState {
    /// Fail-soft facade over the datastore (and the cache purger behind it).
    pub data: DataAccess,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig, store: Option<RepositoryState>, purger: PurgeState) -> Self {
        Self {
            data: DataAccess::new(store, purger),
            config,
        }
    }
}

impl FromRef<AppState> for DataAccess {
    fn from_ref(app_state: &AppState) -> DataAccess {
        app_state.data.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles routes, the access gate and the observability layers.
pub fn create_router(state: AppState) -> Router {
    let x_request_id = HeaderName::from_static("x-request-id");

    // The gate wraps the fallback too, so unrouted dashboard paths still redirect.
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api::api_routes())
        .merge(pages::page_routes())
        .fallback(|| async { ApiError::NotFound("Route") })
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::access_gate,
        ))
        .with_state(state);

    // Tracing sits outside the gate so redirects and 401s are logged with the request ID.
    base_router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(
                x_request_id.clone(),
                MakeRequestUuid,
            ))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// trace_span_logger
///
/// Opens the `http_request` span, tagged with the request ID assigned by
/// `SetRequestIdLayer`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
