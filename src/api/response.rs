//! JSON response helpers shared by every route.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::errors::ThingsError;

/// Content type sent with every response, including errors and redirects.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Serializes `body` with the given status.
pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to serialize response body");
            message(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error marshalling the result, err={}", e),
            )
        }
    }
}

/// A `{"message": "..."}` envelope.
pub fn message(status: StatusCode, text: impl Into<String>) -> Response {
    let body = json!({ "message": text.into() }).to_string();
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))],
        body,
    )
        .into_response()
}

/// Successful JSON body carrying the configured cache header.
pub fn cached_json<T: Serialize>(body: &T, cache_control: &HeaderValue) -> Response {
    let mut response = json(StatusCode::OK, body);
    if response.status() == StatusCode::OK {
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, cache_control.clone());
    }
    response
}

/// Permanent redirect without a body.
pub fn moved_permanently(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(location) => (
            StatusCode::MOVED_PERMANENTLY,
            [
                (header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE)),
                (header::LOCATION, location),
            ],
        )
            .into_response(),
        Err(e) => message(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("invalid redirect location: {}", e),
        ),
    }
}

/// Status a failed request is answered with.
pub fn status_for(err: &ThingsError) -> StatusCode {
    match err {
        ThingsError::Validation { .. } => StatusCode::BAD_REQUEST,
        ThingsError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Error envelope with the status matching `err`.
pub fn error(err: &ThingsError, text: impl Into<String>) -> Response {
    message(status_for(err), text)
}
