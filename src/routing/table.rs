//! Route table construction.
//!
//! # Responsibilities
//! - Validate every URL and resource definition, never stopping early
//! - Order endpoints deterministically before registration
//! - Reject duplicate method+path pairs instead of letting one shadow another
//! - Hand each endpoint to a `Register` implementation exactly once
//!
//! # Design Decisions
//! - Errors are values collected alongside the endpoints; the caller decides
//!   whether any of them stop startup
//! - Ordering is a stable sort on (path, method), byte-wise; ties keep
//!   source order (URLs in declaration order, then resources)
//! - No configuration means no table: that is the only fatal condition

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use axum::http::Method;
use thiserror::Error;

use crate::config::schema::ApiConfig;
use crate::routing::definition::{normalize, DefinitionSource, Endpoint, ValidationError};
use crate::routing::handler::EndpointHandler;
use crate::routing::resource::{expand, ENDPOINTS_PER_RESOURCE};

pub const NO_DEFINITIONS_MESSAGE: &str = "at least one endpoint or resource must be provided";

/// A registration the router refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot register {method} {path}: {reason}")]
pub struct RegisterError {
    pub method: Method,
    pub path: String,
    pub reason: String,
}

/// The only way endpoints reach an HTTP framework.
pub trait Register {
    fn register(
        &mut self,
        method: &Method,
        path: &str,
        handler: EndpointHandler,
    ) -> Result<(), RegisterError>;
}

impl<F> Register for F
where
    F: FnMut(&Method, &str, EndpointHandler),
{
    fn register(
        &mut self,
        method: &Method,
        path: &str,
        handler: EndpointHandler,
    ) -> Result<(), RegisterError> {
        self(method, path, handler);
        Ok(())
    }
}

/// Result of one build pass.
#[derive(Debug, Default)]
pub struct RouteTable {
    endpoints: Vec<Endpoint>,
    errors: Vec<ValidationError>,
    fatal: bool,
}

impl RouteTable {
    /// Endpoints in registration order.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// True when the configuration defined nothing at all.
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    pub fn into_parts(self) -> (Vec<Endpoint>, Vec<ValidationError>) {
        (self.endpoints, self.errors)
    }

    /// Numbered, human readable error summary. Empty when there are no errors.
    pub fn report(&self) -> String {
        let mut out = String::new();
        if self.errors.is_empty() {
            return out;
        }
        let _ = writeln!(out, "{} Error(s) in config:", self.errors.len());
        for (i, err) in self.errors.iter().enumerate() {
            let _ = writeln!(out, " {}: {}", i + 1, err);
        }
        out
    }

    /// Register every endpoint in order, collecting refusals.
    pub fn register_into<R: Register + ?Sized>(self, registrar: &mut R) -> Vec<RegisterError> {
        let mut failures = Vec::new();
        for endpoint in self.endpoints {
            let (method, path, handler) = endpoint.into_registration();
            if let Err(e) = registrar.register(&method, &path, handler) {
                tracing::warn!(error = %e, "Endpoint not registered");
                failures.push(e);
            }
        }
        failures
    }
}

/// Builds a [`RouteTable`] from an explicit API configuration.
pub struct RouteTableBuilder<'a> {
    api: &'a ApiConfig,
    resource_root: PathBuf,
}

impl<'a> RouteTableBuilder<'a> {
    pub fn new(api: &'a ApiConfig, resource_root: impl Into<PathBuf>) -> Self {
        Self {
            api,
            resource_root: resource_root.into(),
        }
    }

    /// Expected endpoint count, used to pre-size the working list.
    pub fn capacity_hint(&self) -> usize {
        self.api.urls.len() + self.api.resources.len() * ENDPOINTS_PER_RESOURCE
    }

    pub fn build(&self) -> RouteTable {
        if self.api.urls.is_empty() && self.api.resources.is_empty() {
            return RouteTable {
                endpoints: Vec::new(),
                errors: vec![ValidationError::new(
                    DefinitionSource::Config,
                    NO_DEFINITIONS_MESSAGE,
                )],
                fatal: true,
            };
        }

        let mut endpoints = Vec::with_capacity(self.capacity_hint());
        let mut errors = Vec::new();

        for (index, url) in self.api.urls.iter().enumerate() {
            match normalize(index, url, &self.resource_root) {
                Ok(endpoint) => endpoints.push(endpoint),
                Err(e) => errors.push(e),
            }
        }

        for (index, resource) in self.api.resources.iter().enumerate() {
            match expand(index, resource, &self.resource_root) {
                Ok(expanded) => endpoints.extend(expanded),
                Err(e) => errors.push(e),
            }
        }

        sort_endpoints(&mut endpoints);
        let endpoints = drop_duplicates(endpoints, &mut errors);

        tracing::debug!(
            endpoints = endpoints.len(),
            errors = errors.len(),
            root = %self.resource_root.display(),
            "Route table built"
        );

        RouteTable {
            endpoints,
            errors,
            fatal: false,
        }
    }
}

/// Build a table from `api`, resolving files against `resource_root`.
pub fn build(api: &ApiConfig, resource_root: &Path) -> RouteTable {
    RouteTableBuilder::new(api, resource_root).build()
}

/// Stable sort on (path, method).
pub fn sort_endpoints(endpoints: &mut [Endpoint]) {
    endpoints.sort_by(|a, b| {
        a.path()
            .cmp(b.path())
            .then_with(|| a.method().as_str().cmp(b.method().as_str()))
    });
}

/// Keep the first endpoint of each (path, method) run of a sorted list.
fn drop_duplicates(endpoints: Vec<Endpoint>, errors: &mut Vec<ValidationError>) -> Vec<Endpoint> {
    let mut kept: Vec<Endpoint> = Vec::with_capacity(endpoints.len());
    for endpoint in endpoints {
        if let Some(previous) = kept.last() {
            if previous.path() == endpoint.path() && previous.method() == endpoint.method() {
                errors.push(ValidationError::new(
                    endpoint.origin().clone(),
                    format!(
                        "Duplicate endpoint {} {} (already defined by {})",
                        endpoint.method(),
                        endpoint.path(),
                        previous.origin()
                    ),
                ));
                continue;
            }
        }
        kept.push(endpoint);
    }
    kept
}
