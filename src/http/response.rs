//! JSON response writers and the router's default fallbacks.
//!
//! # Responsibilities
//! - Serialize values into `application/json; charset=utf-8` responses
//! - Provide the `{"error": "..."}` body shape
//! - Provide default 404 / 405 handlers
//!
//! # Design Decisions
//! - A value that fails to serialize becomes a logged 500, never a panic

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use serde::Serialize;
use serde_json::{json, Value};

use crate::http::endpoint::{handler_fn, Handler};

pub const APPLICATION_JSON: &str = "application/json; charset=utf-8";

/// Body returned when no route matches.
pub const NOT_FOUND_MESSAGE: &str = "endpoint not found";

/// Body returned when the route exists but not for this method.
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "method not allowed";

/// `{"error": message}`.
pub fn error_body(message: &str) -> Value {
    json!({ "error": message })
}

/// Write `value` as a JSON response with `status`.
pub fn json_response<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(bytes) => with_json_body(status, Body::from(bytes)),
        Err(err) => {
            tracing::error!(error = %err, "Failed to encode response body");
            let fallback = br#"{"error":"internal server error"}"#;
            with_json_body(StatusCode::INTERNAL_SERVER_ERROR, Body::from(&fallback[..]))
        }
    }
}

pub fn error_response(status: StatusCode, message: &str) -> Response {
    json_response(status, &error_body(message))
}

/// Empty 204 response.
pub fn no_content() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
}

fn with_json_body(status: StatusCode, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(APPLICATION_JSON),
    );
    response
}

pub fn default_not_found() -> Handler {
    handler_fn(|_req| async { error_response(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE) })
}

pub fn default_method_not_allowed() -> Handler {
    handler_fn(|_req| async {
        error_response(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_MESSAGE)
    })
}
