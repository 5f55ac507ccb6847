//! HTTP endpoint handlers.
//!
//! Handlers validate the payload, open a connection for the request and
//! delegate to the repositories in `crate::db`.

pub mod auth;
pub mod consultations;
pub mod health;
pub mod patients;
pub mod professionals;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;

/// `201 Created` with a `Location` header pointing at the new resource.
pub(crate) fn created<T: Serialize>(location: String, body: T) -> Response {
    let mut response = (StatusCode::CREATED, Json(body)).into_response();
    if let Ok(value) = HeaderValue::from_str(&location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    response
}

pub(crate) fn not_found(entity: &str, id: impl std::fmt::Display) -> ApiError {
    ApiError::NotFound(format!("{entity} {id} not found"))
}
