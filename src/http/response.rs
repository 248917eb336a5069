//! Error responses shared by the server and the resource endpoints.

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::http::request::RequestIdExt;

/// `{"error": message}` with the given status.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response<Body> {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Fallback for requests no endpoint matched.
pub async fn not_found_fallback(request: Request<Body>) -> Response<Body> {
    tracing::debug!(
        request_id = %request.request_id(),
        method = %request.method(),
        path = %request.uri().path(),
        "No endpoint matched"
    );
    json_error(
        StatusCode::NOT_FOUND,
        format!(
            "no endpoint for {} {}",
            request.method(),
            request.uri().path()
        ),
    )
}
