/// Router Module Index
///
/// Routes are grouped by surface, not by protection level: the access gate decides
/// per request which of them need a session, so a single path can serve a public
/// GET and a gated PUT side by side.

/// JSON API under `/api`: resource reads and writes plus the auth endpoints.
pub mod api;

/// Non-API surface: health check, login landing and the admin dashboard.
pub mod pages;
