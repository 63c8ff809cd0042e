//! HTTP handlers, one module per resource.
//!
//! Handlers stay thin: validate the request shape, call `DataAccess`, shape the JSON.
//! Authorization has already happened in the access gate by the time any of them
//! runs; mutating handlers take `AuthUser` only to record who acted.

pub mod auth;
pub mod blogs;
pub mod dashboard;
pub mod events;
pub mod forms;
pub mod gallery;

use axum::{Json, http::StatusCode};
use serde_json::{Value, json};

/// Success body of a mutation: `{"message": ..., "<key>": <record>}`.
pub(crate) fn mutation_body(message: &str, key: &str, record: impl serde::Serialize) -> Json<Value> {
    let mut body = json!({ "message": message });
    body[key] = serde_json::to_value(record).unwrap_or(Value::Null);
    Json(body)
}

pub(crate) fn message_body(message: &str) -> Json<Value> {
    Json(json!({ "message": message }))
}

pub(crate) type Created = (StatusCode, Json<Value>);
