use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::ApiError;

// --- Stored Records ---

/// User
///
/// An administrator account. `user_id` is the login identifier; the hash never
/// leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub user_id: String,
    #[serde(skip)]
    pub password_hash: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Event
///
/// A scheduled programme listed on the public events page.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[ts(type = "string")]
    pub date: DateTime<Utc>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Blog
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Blog {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub content: String,
    pub image_url: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// GalleryImage
///
/// A photo grouped under the name of the event it was taken at.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GalleryImage {
    pub id: i64,
    pub event_name: String,
    pub image_url: String,
    #[ts(type = "string")]
    pub uploaded_at: DateTime<Utc>,
}

/// FormListing
///
/// A link to an externally hosted sign-up form.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FormListing {
    pub id: i64,
    pub title: String,
    pub google_form_link: String,
    pub status: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Status given to a form listing created without one.
pub const DEFAULT_FORM_STATUS: &str = "open";

// --- Validated Inputs ---
//
// Request payloads deserialize with every field optional and are converted into
// these types before the datastore is touched.

#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBlog {
    pub title: String,
    pub author: String,
    pub content: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewGalleryImage {
    pub event_name: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GalleryImageChanges {
    pub event_name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewFormListing {
    pub title: String,
    pub google_form_link: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormListingChanges {
    pub title: Option<String>,
    pub google_form_link: Option<String>,
    pub status: Option<String>,
}

// --- Request Payloads (Input Schemas) ---

/// CredentialsRequest
///
/// Body of both `POST /api/auth/login` and `POST /api/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CredentialsRequest {
    pub user_id: Option<String>,
    pub password: Option<String>,
}

impl CredentialsRequest {
    /// Returns `(user_id, password)` or the 400 shared by login and register.
    pub fn validate(self) -> Result<(String, String), ApiError> {
        match (present(self.user_id), self.password.filter(|p| !p.is_empty())) {
            (Some(user_id), Some(password)) => Ok((user_id, password)),
            _ => Err(ApiError::Validation(
                "User ID and password are required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    /// RFC 3339 timestamp, `YYYY-MM-DDTHH:MM` or `YYYY-MM-DD` (midnight UTC).
    #[schema(example = "2025-11-01")]
    pub date: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
}

impl EventRequest {
    pub fn validate(self) -> Result<NewEvent, ApiError> {
        let (Some(title), Some(description), Some(date)) = (
            present(self.title),
            present(self.description),
            present(self.date),
        ) else {
            return Err(ApiError::Validation(
                "Title, description, and date are required".to_string(),
            ));
        };

        Ok(NewEvent {
            title,
            description,
            date: parse_event_date(&date)?,
            category: present(self.category),
            image_url: present(self.image_url),
        })
    }

    /// Partial update: absent or blank fields keep their stored value.
    pub fn into_changes(self) -> Result<EventChanges, ApiError> {
        let date = present(self.date)
            .map(|raw| parse_event_date(&raw))
            .transpose()?;

        Ok(EventChanges {
            title: present(self.title),
            description: present(self.description),
            date,
            category: present(self.category),
            image_url: present(self.image_url),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BlogRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
}

impl BlogRequest {
    pub fn validate(self) -> Result<NewBlog, ApiError> {
        let (Some(title), Some(author), Some(content)) = (
            present(self.title),
            present(self.author),
            present(self.content),
        ) else {
            return Err(ApiError::Validation(
                "Title, author, and content are required".to_string(),
            ));
        };

        Ok(NewBlog {
            title,
            author,
            content,
            image_url: present(self.image_url),
        })
    }

    pub fn into_changes(self) -> BlogChanges {
        BlogChanges {
            title: present(self.title),
            author: present(self.author),
            content: present(self.content),
            image_url: present(self.image_url),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GalleryImageRequest {
    pub event_name: Option<String>,
    pub image_url: Option<String>,
}

impl GalleryImageRequest {
    pub fn validate(self) -> Result<NewGalleryImage, ApiError> {
        match (present(self.event_name), present(self.image_url)) {
            (Some(event_name), Some(image_url)) => Ok(NewGalleryImage {
                event_name,
                image_url,
            }),
            _ => Err(ApiError::Validation(
                "Event name and image URL are required".to_string(),
            )),
        }
    }

    pub fn into_changes(self) -> GalleryImageChanges {
        GalleryImageChanges {
            event_name: present(self.event_name),
            image_url: present(self.image_url),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FormListingRequest {
    pub title: Option<String>,
    pub google_form_link: Option<String>,
    pub status: Option<String>,
}

impl FormListingRequest {
    pub fn validate(self) -> Result<NewFormListing, ApiError> {
        match (present(self.title), present(self.google_form_link)) {
            (Some(title), Some(google_form_link)) => Ok(NewFormListing {
                title,
                google_form_link,
                status: present(self.status).unwrap_or_else(|| DEFAULT_FORM_STATUS.to_string()),
            }),
            _ => Err(ApiError::Validation(
                "Title and Google Form link are required".to_string(),
            )),
        }
    }

    pub fn into_changes(self) -> FormListingChanges {
        FormListingChanges {
            title: present(self.title),
            google_form_link: present(self.google_form_link),
            status: present(self.status),
        }
    }
}

// --- Response Schemas ---

/// LoginResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginResponse {
    pub message: String,
    pub access_token: String,
    pub user: User,
}

/// DashboardOverview
///
/// Landing payload of the admin dashboard: who is signed in and how much content
/// each section holds.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardOverview {
    pub user_id: String,
    pub events: usize,
    pub blogs: usize,
    pub gallery: usize,
    pub forms: usize,
}

// --- Helpers ---

// Blank strings count as missing, the same as an absent key.
fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accepts the date formats the dashboard and API clients send.
pub fn parse_event_date(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Ok(parsed.and_utc());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(parsed.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| ApiError::Validation("Invalid date".to_string()))
}
