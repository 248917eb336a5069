//! Response producers.
//!
//! # Responsibilities
//! - Hold everything needed to answer a request for one endpoint
//! - Write content type, configured headers, status, then the body
//! - Read file-backed bodies fresh on every request
//!
//! # Design Decisions
//! - Closed set of producers chosen once at build time, no per-request
//!   branching on the raw definition
//! - Producers are immutable and shared via `Arc`; no state survives a request
//! - A backing file that vanished after startup answers 404 for that request

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, Request, Response, StatusCode};

use crate::routing::resource::ResourceHandler;

/// Status, content type and headers written before any body.
#[derive(Debug, Clone)]
pub struct ResponseTemplate {
    content_type: HeaderValue,
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseTemplate {
    pub fn new(content_type: HeaderValue, headers: HeaderMap, status: StatusCode) -> Self {
        Self {
            content_type,
            headers,
            status,
        }
    }

    pub fn content_type(&self) -> &HeaderValue {
        &self.content_type
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Same template with a different status.
    pub fn with_status(&self, status: StatusCode) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// Content type first, then the configured headers, then the status.
    pub fn respond(&self, body: Body) -> Response<Body> {
        let mut response = Response::new(body);
        let headers = response.headers_mut();
        headers.insert(CONTENT_TYPE, self.content_type.clone());
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
        *response.status_mut() = self.status;
        response
    }
}

/// How an endpoint answers.
#[derive(Debug, Clone)]
pub enum ResponseProducer {
    /// Configured headers and status with an empty body.
    StaticBody(ResponseTemplate),
    /// Body is the current content of `file`.
    FileBody {
        file: PathBuf,
        template: ResponseTemplate,
    },
    /// One CRUD action over a resource data file.
    Resource(ResourceHandler),
}

impl ResponseProducer {
    pub fn template(&self) -> &ResponseTemplate {
        match self {
            ResponseProducer::StaticBody(template) => template,
            ResponseProducer::FileBody { template, .. } => template,
            ResponseProducer::Resource(resource) => resource.template(),
        }
    }

    /// Backing file, if any.
    pub fn file(&self) -> Option<&Path> {
        match self {
            ResponseProducer::StaticBody(_) => None,
            ResponseProducer::FileBody { file, .. } => Some(file),
            ResponseProducer::Resource(resource) => Some(resource.data_file()),
        }
    }

    pub async fn produce(&self, request: Request<Body>) -> Response<Body> {
        match self {
            ResponseProducer::StaticBody(template) => template.respond(Body::empty()),
            ResponseProducer::FileBody { file, template } => match tokio::fs::read(file).await {
                Ok(bytes) => template.respond(Body::from(bytes)),
                Err(e) => {
                    tracing::warn!(
                        file = %file.display(),
                        error = %e,
                        "Backing file unavailable"
                    );
                    not_found()
                }
            },
            ResponseProducer::Resource(resource) => resource.handle(request).await,
        }
    }
}

/// Bare 404 used when a backing file cannot be read.
pub(crate) fn not_found() -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
}

/// Cheaply clonable handle handed to the router.
#[derive(Debug, Clone)]
pub struct EndpointHandler {
    producer: Arc<ResponseProducer>,
}

impl EndpointHandler {
    pub fn new(producer: ResponseProducer) -> Self {
        Self {
            producer: Arc::new(producer),
        }
    }

    pub fn producer(&self) -> &ResponseProducer {
        &self.producer
    }

    pub async fn call(&self, request: Request<Body>) -> Response<Body> {
        self.producer.produce(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderName;
    use http_body_util::BodyExt;

    fn template() -> ResponseTemplate {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-mock"),
            HeaderValue::from_static("yes"),
        );
        ResponseTemplate::new(
            HeaderValue::from_static("text/plain"),
            headers,
            StatusCode::ACCEPTED,
        )
    }

    async fn body_bytes(response: Response<Body>) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    #[tokio::test]
    async fn test_static_body() {
        let producer = ResponseProducer::StaticBody(template());
        let response = producer.produce(Request::new(Body::empty())).await;

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert_eq!(response.headers()["x-mock"], "yes");
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_file_body_reflects_current_content() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("body.txt");
        std::fs::write(&file, "first").unwrap();

        let handler = EndpointHandler::new(ResponseProducer::FileBody {
            file: file.clone(),
            template: template(),
        });

        let response = handler.call(Request::new(Body::empty())).await;
        assert_eq!(body_bytes(response).await, b"first");

        std::fs::write(&file, "second").unwrap();
        let response = handler.call(Request::new(Body::empty())).await;
        assert_eq!(body_bytes(response).await, b"second");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let handler = EndpointHandler::new(ResponseProducer::FileBody {
            file: dir.path().join("gone.json"),
            template: template(),
        });

        let response = handler.call(Request::new(Body::empty())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // Subsequent requests are independent.
        let response = handler.call(Request::new(Body::empty())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
