//! Resilient data access.
//!
//! Reads never fail: an unconfigured or failing store degrades to an empty list or
//! an absent record, wrapped in [`Fetched::Degraded`] so callers can still tell the
//! difference. Writes fail loudly but translated: 503 before touching an
//! unconfigured store, 400 with a generic message when the store rejects the
//! operation, 404 when the id matches nothing. Successful writes purge the public
//! pages that render the affected resource.

use std::future::Future;

use axum::{
    Json,
    http::HeaderValue,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Serialize;

use crate::{
    error::ApiError,
    models::{
        Blog, BlogChanges, DashboardOverview, Event, EventChanges, FormListing,
        FormListingChanges, GalleryImage, GalleryImageChanges, NewBlog, NewEvent,
        NewFormListing, NewGalleryImage, User,
    },
    purge::PurgeState,
    repository::{RepoError, RepoResult, RepositoryState},
};

/// Response header set on reads served from a fallback.
pub const DATA_STATUS_HEADER: &str = "x-data-status";

/// How many events the home page shows as "upcoming".
pub const UPCOMING_EVENTS_LIMIT: i64 = 3;

/// Fetched
///
/// Outcome of a fail-soft read. `Degraded` holds the fallback value and is produced
/// if and only if the store was unconfigured or the query failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Live(T),
    Degraded(T),
}

impl<T> Fetched<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Live(value) | Self::Degraded(value) => value,
        }
    }
}

impl<T: Serialize> Fetched<Option<T>> {
    /// Responds with the record, or with `missing` when none came back. A degraded
    /// lookup keeps `x-data-status: unavailable` on either outcome, so an
    /// unreachable store is never mistaken for a deleted record.
    pub fn found_or(self, missing: ApiError) -> Response {
        match self {
            Self::Live(Some(value)) => Fetched::Live(value).into_response(),
            Self::Degraded(Some(value)) => Fetched::Degraded(value).into_response(),
            Self::Live(None) => missing.into_response(),
            Self::Degraded(None) => {
                let mut response = missing.into_response();
                mark_degraded(&mut response);
                response
            }
        }
    }
}

/// Always 200 with the value as JSON; degraded values also carry
/// `x-data-status: unavailable`.
impl<T: Serialize> IntoResponse for Fetched<T> {
    fn into_response(self) -> Response {
        let degraded = self.is_degraded();
        let mut response = Json(self.into_inner()).into_response();
        if degraded {
            mark_degraded(&mut response);
        }
        response
    }
}

fn mark_degraded(response: &mut Response) {
    response
        .headers_mut()
        .insert(DATA_STATUS_HEADER, HeaderValue::from_static("unavailable"));
}

/// DataAccess
///
/// The only path from handlers to the repository. `store` is `None` when no
/// `DATABASE_URL` is configured.
#[derive(Clone)]
pub struct DataAccess {
    store: Option<RepositoryState>,
    purger: PurgeState,
}

impl DataAccess {
    pub fn new(store: Option<RepositoryState>, purger: PurgeState) -> Self {
        Self { store, purger }
    }

    // --- Events ---

    pub async fn events(&self) -> Fetched<Vec<Event>> {
        self.read("events", Vec::new(), |repo| async move {
            repo.list_events().await
        })
        .await
    }

    /// The next few events from the start of today (UTC), soonest first.
    pub async fn upcoming_events(&self) -> Fetched<Vec<Event>> {
        let from = start_of_today();
        self.read("upcoming events", Vec::new(), |repo| async move {
            repo.upcoming_events(from, UPCOMING_EVENTS_LIMIT).await
        })
        .await
    }

    pub async fn event(&self, id: i64) -> Fetched<Option<Event>> {
        self.read("event", None, |repo| async move { repo.get_event(id).await })
            .await
    }

    pub async fn create_event(&self, new: NewEvent) -> Result<Event, ApiError> {
        let event = self
            .write("create event", |repo| async move { repo.create_event(new).await })
            .await?;
        self.purge(event_paths(event.id));
        Ok(event)
    }

    pub async fn update_event(&self, id: i64, changes: EventChanges) -> Result<Event, ApiError> {
        let event = self
            .write("update event", |repo| async move {
                repo.update_event(id, changes).await
            })
            .await?
            .ok_or(ApiError::NotFound("Event"))?;
        self.purge(event_paths(id));
        Ok(event)
    }

    pub async fn delete_event(&self, id: i64) -> Result<(), ApiError> {
        let deleted = self
            .write("delete event", |repo| async move { repo.delete_event(id).await })
            .await?;
        if !deleted {
            return Err(ApiError::NotFound("Event"));
        }
        self.purge(event_paths(id));
        Ok(())
    }

    // --- Blogs ---

    pub async fn blogs(&self) -> Fetched<Vec<Blog>> {
        self.read("blogs", Vec::new(), |repo| async move {
            repo.list_blogs().await
        })
        .await
    }

    pub async fn blog(&self, id: i64) -> Fetched<Option<Blog>> {
        self.read("blog", None, |repo| async move { repo.get_blog(id).await })
            .await
    }

    pub async fn create_blog(&self, new: NewBlog) -> Result<Blog, ApiError> {
        let blog = self
            .write("create blog", |repo| async move { repo.create_blog(new).await })
            .await?;
        self.purge(blog_paths(blog.id));
        Ok(blog)
    }

    pub async fn update_blog(&self, id: i64, changes: BlogChanges) -> Result<Blog, ApiError> {
        let blog = self
            .write("update blog", |repo| async move {
                repo.update_blog(id, changes).await
            })
            .await?
            .ok_or(ApiError::NotFound("Blog"))?;
        self.purge(blog_paths(id));
        Ok(blog)
    }

    pub async fn delete_blog(&self, id: i64) -> Result<(), ApiError> {
        let deleted = self
            .write("delete blog", |repo| async move { repo.delete_blog(id).await })
            .await?;
        if !deleted {
            return Err(ApiError::NotFound("Blog"));
        }
        self.purge(blog_paths(id));
        Ok(())
    }

    // --- Gallery ---

    pub async fn gallery(&self) -> Fetched<Vec<GalleryImage>> {
        self.read("gallery", Vec::new(), |repo| async move {
            repo.list_gallery().await
        })
        .await
    }

    pub async fn gallery_for_event(&self, event_name: &str) -> Fetched<Vec<GalleryImage>> {
        let event_name = event_name.to_string();
        self.read("gallery for event", Vec::new(), |repo| async move {
            repo.gallery_for_event(&event_name).await
        })
        .await
    }

    pub async fn gallery_image(&self, id: i64) -> Fetched<Option<GalleryImage>> {
        self.read("gallery image", None, |repo| async move {
            repo.get_gallery_image(id).await
        })
        .await
    }

    pub async fn add_gallery_image(&self, new: NewGalleryImage) -> Result<GalleryImage, ApiError> {
        let image = self
            .write("add image", |repo| async move {
                repo.create_gallery_image(new).await
            })
            .await?;
        self.purge(gallery_paths(&[image.event_name.as_str()]));
        Ok(image)
    }

    /// Purges the album the image left as well as the one it joined.
    pub async fn update_gallery_image(
        &self,
        id: i64,
        changes: GalleryImageChanges,
    ) -> Result<GalleryImage, ApiError> {
        let (previous, image) = self
            .write("update image", |repo| async move {
                let previous = repo.get_gallery_image(id).await?;
                let image = repo.update_gallery_image(id, changes).await?;
                Ok::<_, RepoError>((previous, image))
            })
            .await?;
        let image = image.ok_or(ApiError::NotFound("Image"))?;

        let mut albums = vec![image.event_name.as_str()];
        if let Some(previous) = &previous {
            albums.push(previous.event_name.as_str());
        }
        self.purge(gallery_paths(&albums));
        Ok(image)
    }

    pub async fn delete_gallery_image(&self, id: i64) -> Result<(), ApiError> {
        let previous = self
            .write("delete image", |repo| async move {
                let previous = repo.get_gallery_image(id).await?;
                if previous.is_some() {
                    repo.delete_gallery_image(id).await?;
                }
                Ok::<_, RepoError>(previous)
            })
            .await?
            .ok_or(ApiError::NotFound("Image"))?;
        self.purge(gallery_paths(&[previous.event_name.as_str()]));
        Ok(())
    }

    // --- Forms ---

    pub async fn forms(&self) -> Fetched<Vec<FormListing>> {
        self.read("forms", Vec::new(), |repo| async move {
            repo.list_forms().await
        })
        .await
    }

    pub async fn form(&self, id: i64) -> Fetched<Option<FormListing>> {
        self.read("form", None, |repo| async move { repo.get_form(id).await })
            .await
    }

    pub async fn create_form(&self, new: NewFormListing) -> Result<FormListing, ApiError> {
        let form = self
            .write("create form", |repo| async move { repo.create_form(new).await })
            .await?;
        self.purge(form_paths());
        Ok(form)
    }

    pub async fn update_form(
        &self,
        id: i64,
        changes: FormListingChanges,
    ) -> Result<FormListing, ApiError> {
        let form = self
            .write("update form", |repo| async move {
                repo.update_form(id, changes).await
            })
            .await?
            .ok_or(ApiError::NotFound("Form"))?;
        self.purge(form_paths());
        Ok(form)
    }

    pub async fn delete_form(&self, id: i64) -> Result<(), ApiError> {
        let deleted = self
            .write("delete form", |repo| async move { repo.delete_form(id).await })
            .await?;
        if !deleted {
            return Err(ApiError::NotFound("Form"));
        }
        self.purge(form_paths());
        Ok(())
    }

    // --- Dashboard ---

    pub async fn overview(&self, user_id: &str) -> Fetched<DashboardOverview> {
        let (events, blogs, gallery, forms) =
            tokio::join!(self.events(), self.blogs(), self.gallery(), self.forms());
        let degraded = events.is_degraded()
            || blogs.is_degraded()
            || gallery.is_degraded()
            || forms.is_degraded();

        let overview = DashboardOverview {
            user_id: user_id.to_string(),
            events: events.into_inner().len(),
            blogs: blogs.into_inner().len(),
            gallery: gallery.into_inner().len(),
            forms: forms.into_inner().len(),
        };
        if degraded {
            Fetched::Degraded(overview)
        } else {
            Fetched::Live(overview)
        }
    }

    // --- Accounts ---
    //
    // Login and registration are not fail-soft: without a store nobody can sign in,
    // and a failing store is an internal error rather than a bad request.

    pub async fn find_user(&self, user_id: &str) -> Result<Option<User>, ApiError> {
        let repo = self.writable()?;
        repo.find_user(user_id).await.map_err(|e| {
            log_failure("find user", &e);
            ApiError::Internal
        })
    }

    /// Creates an account, rejecting identifiers that are already taken.
    pub async fn register_user(&self, user_id: &str, password_hash: &str) -> Result<User, ApiError> {
        let duplicate = || ApiError::Conflict("User ID already exists".to_string());

        if self.find_user(user_id).await?.is_some() {
            return Err(duplicate());
        }

        let repo = self.writable()?;
        match repo.create_user(user_id, password_hash).await {
            Ok(user) => Ok(user),
            // Lost a race with a concurrent registration of the same identifier.
            Err(RepoError::Constraint(_)) => Err(duplicate()),
            Err(e) => {
                log_failure("register user", &e);
                Err(ApiError::Internal)
            }
        }
    }

    // --- Plumbing ---

    /// The store, or the 503 every write returns without one.
    pub fn writable(&self) -> Result<RepositoryState, ApiError> {
        self.store.clone().ok_or(ApiError::NotConfigured)
    }

    async fn read<T, F, Fut>(&self, what: &'static str, fallback: T, query: F) -> Fetched<T>
    where
        F: FnOnce(RepositoryState) -> Fut,
        Fut: Future<Output = RepoResult<T>>,
    {
        let Some(repo) = self.store.clone() else {
            tracing::warn!(
                what,
                timestamp = %Utc::now().to_rfc3339(),
                "datastore not configured, serving fallback"
            );
            return Fetched::Degraded(fallback);
        };

        match query(repo).await {
            Ok(value) => Fetched::Live(value),
            Err(e) => {
                tracing::error!(
                    what,
                    timestamp = %Utc::now().to_rfc3339(),
                    message = %e,
                    "read failed, serving fallback"
                );
                Fetched::Degraded(fallback)
            }
        }
    }

    // `action` doubles as the client-facing message: "Failed to <action>".
    async fn write<T, F, Fut>(&self, action: &'static str, query: F) -> Result<T, ApiError>
    where
        F: FnOnce(RepositoryState) -> Fut,
        Fut: Future<Output = RepoResult<T>>,
    {
        let repo = self.writable()?;
        query(repo).await.map_err(|e| {
            log_failure(action, &e);
            ApiError::OperationFailed(action.to_string())
        })
    }

    fn purge(&self, paths: Vec<String>) {
        self.purger.purge(&paths);
    }
}

fn log_failure(action: &str, error: &RepoError) {
    tracing::error!(
        action,
        timestamp = %Utc::now().to_rfc3339(),
        message = %error,
        "datastore operation failed"
    );
}

fn start_of_today() -> DateTime<Utc> {
    let now = Utc::now();
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}

// --- Purge Targets ---

fn event_paths(id: i64) -> Vec<String> {
    vec!["/".to_string(), "/events".to_string(), format!("/events/{id}")]
}

fn blog_paths(id: i64) -> Vec<String> {
    vec!["/blogs".to_string(), format!("/blogs/{id}")]
}

fn gallery_paths(albums: &[&str]) -> Vec<String> {
    let mut paths = vec!["/".to_string(), "/gallery".to_string()];
    for album in albums {
        let path = album_path(album);
        if !paths.contains(&path) {
            paths.push(path);
        }
    }
    paths
}

// The album name becomes a single percent-encoded segment; `Url` does the encoding.
fn album_path(album: &str) -> String {
    let Ok(mut url) = Url::parse("http://site.invalid/gallery") else {
        return "/gallery".to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.push(album);
    }
    url.path().to_string()
}

fn form_paths() -> Vec<String> {
    vec!["/forms".to_string()]
}
