use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, postgres::PgPoolOptions};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{
    Blog, BlogChanges, Event, EventChanges, FormListing, FormListingChanges, GalleryImage,
    GalleryImageChanges, NewBlog, NewEvent, NewFormListing, NewGalleryImage, User,
};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("datastore unavailable: {0}")]
    Unavailable(String),
    #[error("constraint violated: {0}")]
    Constraint(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository Trait
///
/// Persistence contract for every managed resource. Implementations report failures
/// as `RepoError`; turning those into fallbacks or HTTP errors is the job of
/// `DataAccess`, never of the repository.
///
/// `update_*` returns `None` and `delete_*` returns `false` when the id matches no row.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Events ---
    // Newest first by event date.
    async fn list_events(&self) -> RepoResult<Vec<Event>>;
    // Soonest first, starting at `from`.
    async fn upcoming_events(&self, from: DateTime<Utc>, limit: i64) -> RepoResult<Vec<Event>>;
    async fn get_event(&self, id: i64) -> RepoResult<Option<Event>>;
    async fn create_event(&self, new: NewEvent) -> RepoResult<Event>;
    async fn update_event(&self, id: i64, changes: EventChanges) -> RepoResult<Option<Event>>;
    async fn delete_event(&self, id: i64) -> RepoResult<bool>;

    // --- Blogs ---
    // Newest first by creation time.
    async fn list_blogs(&self) -> RepoResult<Vec<Blog>>;
    async fn get_blog(&self, id: i64) -> RepoResult<Option<Blog>>;
    async fn create_blog(&self, new: NewBlog) -> RepoResult<Blog>;
    async fn update_blog(&self, id: i64, changes: BlogChanges) -> RepoResult<Option<Blog>>;
    async fn delete_blog(&self, id: i64) -> RepoResult<bool>;

    // --- Gallery ---
    // Newest first by upload time.
    async fn list_gallery(&self) -> RepoResult<Vec<GalleryImage>>;
    async fn gallery_for_event(&self, event_name: &str) -> RepoResult<Vec<GalleryImage>>;
    async fn get_gallery_image(&self, id: i64) -> RepoResult<Option<GalleryImage>>;
    async fn create_gallery_image(&self, new: NewGalleryImage) -> RepoResult<GalleryImage>;
    async fn update_gallery_image(
        &self,
        id: i64,
        changes: GalleryImageChanges,
    ) -> RepoResult<Option<GalleryImage>>;
    async fn delete_gallery_image(&self, id: i64) -> RepoResult<bool>;

    // --- Forms ---
    async fn list_forms(&self) -> RepoResult<Vec<FormListing>>;
    async fn get_form(&self, id: i64) -> RepoResult<Option<FormListing>>;
    async fn create_form(&self, new: NewFormListing) -> RepoResult<FormListing>;
    async fn update_form(
        &self,
        id: i64,
        changes: FormListingChanges,
    ) -> RepoResult<Option<FormListing>>;
    async fn delete_form(&self, id: i64) -> RepoResult<bool>;

    // --- Users ---
    async fn find_user(&self, user_id: &str) -> RepoResult<Option<User>>;
    // A taken `user_id` is reported as `RepoError::Constraint`.
    async fn create_user(&self, user_id: &str, password_hash: &str) -> RepoResult<User>;
}

/// RepositoryState
///
/// Shared handle to the persistence layer.
pub type RepositoryState = Arc<dyn Repository>;

// --- Postgres ---

const EVENT_COLUMNS: &str = "id, title, description, date, category, image_url, created_at";
const BLOG_COLUMNS: &str = "id, title, author, content, image_url, created_at, updated_at";
const GALLERY_COLUMNS: &str = "id, event_name, image_url, uploaded_at";
const FORM_COLUMNS: &str = "id, title, google_form_link, status, created_at";
const USER_COLUMNS: &str = "id, user_id, password_hash, created_at";

/// PostgresRepository
///
/// `Repository` backed by a lazily connecting `PgPool`. The pool is built once at
/// startup and cloned cheaply into every request.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds the pool without opening a connection; the first query connects.
    /// Fails only when the URL itself cannot be parsed.
    pub fn connect_lazy(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(database_url)?;
        Ok(Self::new(pool))
    }

    /// Applies the schema in `migrations/`.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn list_events(&self) -> RepoResult<Vec<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY date DESC, id DESC");
        Ok(sqlx::query_as::<_, Event>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn upcoming_events(&self, from: DateTime<Utc>, limit: i64) -> RepoResult<Vec<Event>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE date >= $1 ORDER BY date ASC, id ASC LIMIT $2"
        );
        Ok(sqlx::query_as::<_, Event>(&sql)
            .bind(from)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_event(&self, id: i64) -> RepoResult<Option<Event>> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        Ok(sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_event(&self, new: NewEvent) -> RepoResult<Event> {
        let sql = format!(
            "INSERT INTO events (title, description, date, category, image_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {EVENT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Event>(&sql)
            .bind(new.title)
            .bind(new.description)
            .bind(new.date)
            .bind(new.category)
            .bind(new.image_url)
            .fetch_one(&self.pool)
            .await?)
    }

    /// Partial update: NULL parameters keep the stored value (COALESCE).
    async fn update_event(&self, id: i64, changes: EventChanges) -> RepoResult<Option<Event>> {
        let sql = format!(
            "UPDATE events SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                date = COALESCE($4, date), \
                category = COALESCE($5, category), \
                image_url = COALESCE($6, image_url) \
             WHERE id = $1 RETURNING {EVENT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Event>(&sql)
            .bind(id)
            .bind(changes.title)
            .bind(changes.description)
            .bind(changes.date)
            .bind(changes.category)
            .bind(changes.image_url)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_event(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_blogs(&self) -> RepoResult<Vec<Blog>> {
        let sql = format!("SELECT {BLOG_COLUMNS} FROM blogs ORDER BY created_at DESC, id DESC");
        Ok(sqlx::query_as::<_, Blog>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_blog(&self, id: i64) -> RepoResult<Option<Blog>> {
        let sql = format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE id = $1");
        Ok(sqlx::query_as::<_, Blog>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_blog(&self, new: NewBlog) -> RepoResult<Blog> {
        let sql = format!(
            "INSERT INTO blogs (title, author, content, image_url) \
             VALUES ($1, $2, $3, $4) RETURNING {BLOG_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Blog>(&sql)
            .bind(new.title)
            .bind(new.author)
            .bind(new.content)
            .bind(new.image_url)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_blog(&self, id: i64, changes: BlogChanges) -> RepoResult<Option<Blog>> {
        let sql = format!(
            "UPDATE blogs SET \
                title = COALESCE($2, title), \
                author = COALESCE($3, author), \
                content = COALESCE($4, content), \
                image_url = COALESCE($5, image_url), \
                updated_at = NOW() \
             WHERE id = $1 RETURNING {BLOG_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Blog>(&sql)
            .bind(id)
            .bind(changes.title)
            .bind(changes.author)
            .bind(changes.content)
            .bind(changes.image_url)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_blog(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_gallery(&self) -> RepoResult<Vec<GalleryImage>> {
        let sql = format!(
            "SELECT {GALLERY_COLUMNS} FROM gallery_images ORDER BY uploaded_at DESC, id DESC"
        );
        Ok(sqlx::query_as::<_, GalleryImage>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn gallery_for_event(&self, event_name: &str) -> RepoResult<Vec<GalleryImage>> {
        let sql = format!(
            "SELECT {GALLERY_COLUMNS} FROM gallery_images WHERE event_name = $1 \
             ORDER BY uploaded_at DESC, id DESC"
        );
        Ok(sqlx::query_as::<_, GalleryImage>(&sql)
            .bind(event_name)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_gallery_image(&self, id: i64) -> RepoResult<Option<GalleryImage>> {
        let sql = format!("SELECT {GALLERY_COLUMNS} FROM gallery_images WHERE id = $1");
        Ok(sqlx::query_as::<_, GalleryImage>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_gallery_image(&self, new: NewGalleryImage) -> RepoResult<GalleryImage> {
        let sql = format!(
            "INSERT INTO gallery_images (event_name, image_url) VALUES ($1, $2) \
             RETURNING {GALLERY_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, GalleryImage>(&sql)
            .bind(new.event_name)
            .bind(new.image_url)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_gallery_image(
        &self,
        id: i64,
        changes: GalleryImageChanges,
    ) -> RepoResult<Option<GalleryImage>> {
        let sql = format!(
            "UPDATE gallery_images SET \
                event_name = COALESCE($2, event_name), \
                image_url = COALESCE($3, image_url) \
             WHERE id = $1 RETURNING {GALLERY_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, GalleryImage>(&sql)
            .bind(id)
            .bind(changes.event_name)
            .bind(changes.image_url)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_gallery_image(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM gallery_images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_forms(&self) -> RepoResult<Vec<FormListing>> {
        let sql = format!("SELECT {FORM_COLUMNS} FROM forms ORDER BY created_at DESC, id DESC");
        Ok(sqlx::query_as::<_, FormListing>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_form(&self, id: i64) -> RepoResult<Option<FormListing>> {
        let sql = format!("SELECT {FORM_COLUMNS} FROM forms WHERE id = $1");
        Ok(sqlx::query_as::<_, FormListing>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_form(&self, new: NewFormListing) -> RepoResult<FormListing> {
        let sql = format!(
            "INSERT INTO forms (title, google_form_link, status) VALUES ($1, $2, $3) \
             RETURNING {FORM_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, FormListing>(&sql)
            .bind(new.title)
            .bind(new.google_form_link)
            .bind(new.status)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_form(
        &self,
        id: i64,
        changes: FormListingChanges,
    ) -> RepoResult<Option<FormListing>> {
        let sql = format!(
            "UPDATE forms SET \
                title = COALESCE($2, title), \
                google_form_link = COALESCE($3, google_form_link), \
                status = COALESCE($4, status) \
             WHERE id = $1 RETURNING {FORM_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, FormListing>(&sql)
            .bind(id)
            .bind(changes.title)
            .bind(changes.google_form_link)
            .bind(changes.status)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_form(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM forms WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_user(&self, user_id: &str) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_user(&self, user_id: &str, password_hash: &str) -> RepoResult<User> {
        let sql = format!(
            "INSERT INTO users (user_id, password_hash) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    RepoError::Constraint(db.message().to_string())
                }
                other => RepoError::Database(other),
            })
    }
}

// --- In-Memory ---

#[derive(Default)]
struct Tables {
    next_id: i64,
    events: Vec<Event>,
    blogs: Vec<Blog>,
    gallery: Vec<GalleryImage>,
    forms: Vec<FormListing>,
    users: Vec<User>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// MemoryRepository
///
/// `Repository` held in process memory, for the test suite. The server never falls
/// back to it; without Postgres it runs store-less. `set_unavailable(true)` makes
/// every call fail the way an unreachable database would.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> RepoResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

// Newest first; ids break ties so rows created in the same instant still order.
fn newest_first<T>(rows: &[T], key: impl Fn(&T) -> (DateTime<Utc>, i64)) -> Vec<T>
where
    T: Clone,
{
    let mut rows = rows.to_vec();
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn list_events(&self) -> RepoResult<Vec<Event>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.events, |e| (e.date, e.id)))
    }

    async fn upcoming_events(&self, from: DateTime<Utc>, limit: i64) -> RepoResult<Vec<Event>> {
        self.check()?;
        let tables = self.tables.read().await;
        let mut events: Vec<Event> = tables
            .events
            .iter()
            .filter(|e| e.date >= from)
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.date, e.id));
        events.truncate(usize::try_from(limit).unwrap_or_default());
        Ok(events)
    }

    async fn get_event(&self, id: i64) -> RepoResult<Option<Event>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.events.iter().find(|e| e.id == id).cloned())
    }

    async fn create_event(&self, new: NewEvent) -> RepoResult<Event> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let event = Event {
            id: tables.next_id(),
            title: new.title,
            description: new.description,
            date: new.date,
            category: new.category,
            image_url: new.image_url,
            created_at: Utc::now(),
        };
        tables.events.push(event.clone());
        Ok(event)
    }

    async fn update_event(&self, id: i64, changes: EventChanges) -> RepoResult<Option<Event>> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let Some(event) = tables.events.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            event.title = title;
        }
        if let Some(description) = changes.description {
            event.description = description;
        }
        if let Some(date) = changes.date {
            event.date = date;
        }
        if changes.category.is_some() {
            event.category = changes.category;
        }
        if changes.image_url.is_some() {
            event.image_url = changes.image_url;
        }
        Ok(Some(event.clone()))
    }

    async fn delete_event(&self, id: i64) -> RepoResult<bool> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let before = tables.events.len();
        tables.events.retain(|e| e.id != id);
        Ok(tables.events.len() < before)
    }

    async fn list_blogs(&self) -> RepoResult<Vec<Blog>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.blogs, |b| (b.created_at, b.id)))
    }

    async fn get_blog(&self, id: i64) -> RepoResult<Option<Blog>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.blogs.iter().find(|b| b.id == id).cloned())
    }

    async fn create_blog(&self, new: NewBlog) -> RepoResult<Blog> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let blog = Blog {
            id: tables.next_id(),
            title: new.title,
            author: new.author,
            content: new.content,
            image_url: new.image_url,
            created_at: now,
            updated_at: now,
        };
        tables.blogs.push(blog.clone());
        Ok(blog)
    }

    async fn update_blog(&self, id: i64, changes: BlogChanges) -> RepoResult<Option<Blog>> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let Some(blog) = tables.blogs.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            blog.title = title;
        }
        if let Some(author) = changes.author {
            blog.author = author;
        }
        if let Some(content) = changes.content {
            blog.content = content;
        }
        if changes.image_url.is_some() {
            blog.image_url = changes.image_url;
        }
        blog.updated_at = Utc::now();
        Ok(Some(blog.clone()))
    }

    async fn delete_blog(&self, id: i64) -> RepoResult<bool> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let before = tables.blogs.len();
        tables.blogs.retain(|b| b.id != id);
        Ok(tables.blogs.len() < before)
    }

    async fn list_gallery(&self) -> RepoResult<Vec<GalleryImage>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.gallery, |g| (g.uploaded_at, g.id)))
    }

    async fn gallery_for_event(&self, event_name: &str) -> RepoResult<Vec<GalleryImage>> {
        self.check()?;
        let tables = self.tables.read().await;
        let matching: Vec<GalleryImage> = tables
            .gallery
            .iter()
            .filter(|g| g.event_name == event_name)
            .cloned()
            .collect();
        Ok(newest_first(&matching, |g| (g.uploaded_at, g.id)))
    }

    async fn get_gallery_image(&self, id: i64) -> RepoResult<Option<GalleryImage>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.gallery.iter().find(|g| g.id == id).cloned())
    }

    async fn create_gallery_image(&self, new: NewGalleryImage) -> RepoResult<GalleryImage> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let image = GalleryImage {
            id: tables.next_id(),
            event_name: new.event_name,
            image_url: new.image_url,
            uploaded_at: Utc::now(),
        };
        tables.gallery.push(image.clone());
        Ok(image)
    }

    async fn update_gallery_image(
        &self,
        id: i64,
        changes: GalleryImageChanges,
    ) -> RepoResult<Option<GalleryImage>> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let Some(image) = tables.gallery.iter_mut().find(|g| g.id == id) else {
            return Ok(None);
        };
        if let Some(event_name) = changes.event_name {
            image.event_name = event_name;
        }
        if let Some(image_url) = changes.image_url {
            image.image_url = image_url;
        }
        Ok(Some(image.clone()))
    }

    async fn delete_gallery_image(&self, id: i64) -> RepoResult<bool> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let before = tables.gallery.len();
        tables.gallery.retain(|g| g.id != id);
        Ok(tables.gallery.len() < before)
    }

    async fn list_forms(&self) -> RepoResult<Vec<FormListing>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(newest_first(&tables.forms, |f| (f.created_at, f.id)))
    }

    async fn get_form(&self, id: i64) -> RepoResult<Option<FormListing>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.forms.iter().find(|f| f.id == id).cloned())
    }

    async fn create_form(&self, new: NewFormListing) -> RepoResult<FormListing> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let form = FormListing {
            id: tables.next_id(),
            title: new.title,
            google_form_link: new.google_form_link,
            status: new.status,
            created_at: Utc::now(),
        };
        tables.forms.push(form.clone());
        Ok(form)
    }

    async fn update_form(
        &self,
        id: i64,
        changes: FormListingChanges,
    ) -> RepoResult<Option<FormListing>> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let Some(form) = tables.forms.iter_mut().find(|f| f.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            form.title = title;
        }
        if let Some(link) = changes.google_form_link {
            form.google_form_link = link;
        }
        if let Some(status) = changes.status {
            form.status = status;
        }
        Ok(Some(form.clone()))
    }

    async fn delete_form(&self, id: i64) -> RepoResult<bool> {
        self.check()?;
        let mut tables = self.tables.write().await;
        let before = tables.forms.len();
        tables.forms.retain(|f| f.id != id);
        Ok(tables.forms.len() < before)
    }

    async fn find_user(&self, user_id: &str) -> RepoResult<Option<User>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn create_user(&self, user_id: &str, password_hash: &str) -> RepoResult<User> {
        self.check()?;
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.user_id == user_id) {
            return Err(RepoError::Constraint(format!(
                "user_id {user_id} already exists"
            )));
        }
        let user = User {
            id: tables.next_id(),
            user_id: user_id.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }
}
