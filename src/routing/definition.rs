//! Endpoint definition validation and normalization.
//!
//! # Responsibilities
//! - Apply defaults to optional fields (method, content type, status)
//! - Give every path exactly one leading "/"
//! - Check that a referenced body file exists under the resource root
//! - Drop `Content-type` from the configured headers
//! - Pick the response producer for the endpoint
//!
//! # Design Decisions
//! - Only the stat happens here; file content is read per request
//! - Path syntax beyond the leading slash is the router's business

use std::fmt;
use std::fs;
use std::path::Path;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use thiserror::Error;

use crate::config::schema::EndpointDefinition;
use crate::routing::handler::{EndpointHandler, ResponseProducer, ResponseTemplate};

pub const DEFAULT_METHOD: &str = "GET";
pub const DEFAULT_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const DEFAULT_STATUS: u16 = 200;

/// Header key that is never copied from a definition; `content_type` owns it.
pub const SHADOWED_CONTENT_TYPE_KEY: &str = "Content-type";

/// Where a definition came from in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionSource {
    Url { index: usize, path: String },
    Resource { index: usize, name: String },
    Config,
}

impl fmt::Display for DefinitionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefinitionSource::Url { index, path } => write!(f, "url[{}] '{}'", index, path),
            DefinitionSource::Resource { index, name } => {
                write!(f, "resource[{}] '{}'", index, name)
            }
            DefinitionSource::Config => write!(f, "config"),
        }
    }
}

/// A definition that could not be turned into an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{origin}: {message}")]
pub struct ValidationError {
    pub origin: DefinitionSource,
    pub message: String,
}

impl ValidationError {
    pub fn new(origin: DefinitionSource, message: impl Into<String>) -> Self {
        Self {
            origin,
            message: message.into(),
        }
    }
}

/// A normalized, registrable endpoint. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct Endpoint {
    path: String,
    method: Method,
    handler: EndpointHandler,
    origin: DefinitionSource,
}

impl Endpoint {
    pub fn new(
        path: String,
        method: Method,
        producer: ResponseProducer,
        origin: DefinitionSource,
    ) -> Self {
        Self {
            path,
            method,
            handler: EndpointHandler::new(producer),
            origin,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn handler(&self) -> &EndpointHandler {
        &self.handler
    }

    pub fn origin(&self) -> &DefinitionSource {
        &self.origin
    }

    pub fn producer(&self) -> &ResponseProducer {
        self.handler.producer()
    }

    pub(crate) fn into_registration(self) -> (Method, String, EndpointHandler) {
        (self.method, self.path, self.handler)
    }
}

impl EndpointDefinition {
    /// Fill empty optional fields and fix up the path, in place.
    pub fn apply_defaults(&mut self) {
        if self.method.is_empty() {
            self.method = DEFAULT_METHOD.to_string();
        } else {
            self.method = self.method.to_ascii_uppercase();
        }

        if self.content_type.is_empty() {
            self.content_type = DEFAULT_CONTENT_TYPE.to_string();
        }

        if self.status == 0 {
            self.status = DEFAULT_STATUS;
        }

        self.path = with_leading_slash(&self.path);
    }
}

/// Prepend "/" unless the path already starts with one.
pub fn with_leading_slash(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Normalize the `index`-th URL definition into an endpoint.
pub fn normalize(
    index: usize,
    definition: &EndpointDefinition,
    resource_root: &Path,
) -> Result<Endpoint, ValidationError> {
    let mut def = definition.clone();
    def.apply_defaults();

    let origin = DefinitionSource::Url {
        index,
        path: def.path.clone(),
    };
    let invalid = |message: String| ValidationError::new(origin.clone(), message);

    let method = Method::from_bytes(def.method.as_bytes())
        .map_err(|_| invalid(format!("Invalid method '{}'", def.method)))?;

    let status = StatusCode::from_u16(def.status)
        .map_err(|_| invalid(format!("Invalid status code {}", def.status)))?;

    let content_type = HeaderValue::from_str(&def.content_type)
        .map_err(|_| invalid(format!("Invalid content type '{}'", def.content_type)))?;

    let headers = header_map(&def.headers).map_err(invalid)?;
    let template = ResponseTemplate::new(content_type, headers, status);

    let producer = if def.file.is_empty() {
        ResponseProducer::StaticBody(template)
    } else {
        let file = resource_root.join(&def.file);
        if !is_readable_file(&file) {
            return Err(invalid(format!(
                "Invalid file '{}' in URL '{}'",
                def.file, def.path
            )));
        }
        ResponseProducer::FileBody { file, template }
    };

    Ok(Endpoint::new(def.path, method, producer, origin))
}

/// Convert configured headers, dropping the shadowed content type key.
pub(crate) fn header_map<'a, I>(headers: I) -> Result<HeaderMap, String>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut map = HeaderMap::new();
    for (key, value) in headers {
        if key == SHADOWED_CONTENT_TYPE_KEY {
            continue;
        }
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|_| format!("Invalid header name '{}'", key))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| format!("Invalid value for header '{}'", key))?;
        map.insert(name, value);
    }
    Ok(map)
}

pub(crate) fn is_readable_file(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.is_file() && fs::File::open(path).is_ok(),
        Err(_) => false,
    }
}
