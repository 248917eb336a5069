//! Fixed response delay.
//!
//! Simulates a slow backend: every request waits `api.delay_ms` before the
//! endpoint runs. Only installed when the delay is non-zero.

use std::time::Duration;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

pub async fn delay_middleware(
    State(delay): State<Duration>,
    request: Request<Body>,
    next: Next,
) -> Response {
    tokio::time::sleep(delay).await;
    next.run(request).await
}
