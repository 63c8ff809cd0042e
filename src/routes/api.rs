use crate::{
    AppState,
    handlers::{auth, blogs, events, forms, gallery},
};
use axum::{
    Router,
    routing::{get, post},
};

/// API Router Module
///
/// Reads are public. POST/PUT/DELETE on the resource paths are stopped by the access
/// gate unless they carry a valid token, so the handlers here never see an
/// anonymous mutation.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // --- Authentication (always open) ---
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/logout", post(auth::logout))
        // --- Events ---
        .route(
            "/api/events",
            get(events::list_events).post(events::create_event),
        )
        // Static segment, matched ahead of `{id}`.
        .route("/api/events/upcoming", get(events::upcoming_events))
        .route(
            "/api/events/{id}",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        // --- Blogs ---
        .route("/api/blogs", get(blogs::list_blogs).post(blogs::create_blog))
        .route(
            "/api/blogs/{id}",
            get(blogs::get_blog)
                .put(blogs::update_blog)
                .delete(blogs::delete_blog),
        )
        // --- Gallery ---
        .route(
            "/api/gallery",
            get(gallery::list_gallery).post(gallery::add_gallery_image),
        )
        .route(
            "/api/gallery/events/{event_name}",
            get(gallery::gallery_for_event),
        )
        .route(
            "/api/gallery/{id}",
            get(gallery::get_gallery_image)
                .put(gallery::update_gallery_image)
                .delete(gallery::delete_gallery_image),
        )
        // --- Forms ---
        .route("/api/forms", get(forms::list_forms).post(forms::create_form))
        .route(
            "/api/forms/{id}",
            get(forms::get_form)
                .put(forms::update_form)
                .delete(forms::delete_form),
        )
}
