//! Registration of endpoints with axum.
//!
//! # Responsibilities
//! - Translate path templates into axum syntax (`{id}`, `{*rest}`),
//!   accepting the legacy `:id` / `*rest` segment forms too
//! - Refuse templates axum would panic on, as `RegisterError`s
//! - Map HTTP methods onto axum method filters
//! - Nest the finished routes under the configured prefix
//!
//! # Design Decisions
//! - Two templates with the same shape but different parameter names would
//!   conflict inside the router; the second one is refused
//! - Every new template is first inserted into a shadow `matchit` router,
//!   the matcher axum uses, so conflicts surface as errors, not panics
//! - Method uniqueness is checked on the translated template: `/a/:id` and
//!   `/a/{id}` are the same route
//! - Same path with different methods merges into one method router

use std::collections::{BTreeMap, BTreeSet};

use axum::body::Body;
use axum::http::{Method, Request};
use axum::routing::{on, MethodFilter};
use axum::Router;

use crate::routing::handler::EndpointHandler;
use crate::routing::table::{Register, RegisterError};

/// A route as it ended up in the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredRoute {
    pub method: Method,
    pub path: String,
}

/// [`Register`] implementation backed by an `axum::Router`.
pub struct AxumRegistrar {
    router: Router,
    matcher: matchit::Router<()>,
    /// shape → template that claimed it
    shapes: BTreeMap<String, String>,
    /// (template, method) → path as written by the definition that claimed it
    claimed: BTreeMap<(String, String), String>,
    routes: Vec<RegisteredRoute>,
}

impl Default for AxumRegistrar {
    fn default() -> Self {
        Self {
            router: Router::new(),
            matcher: matchit::Router::new(),
            shapes: BTreeMap::new(),
            claimed: BTreeMap::new(),
            routes: Vec::new(),
        }
    }
}

impl AxumRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes registered so far, in registration order.
    pub fn routes(&self) -> &[RegisteredRoute] {
        &self.routes
    }

    /// Finish registration, nesting everything under `prefix` if non-empty.
    pub fn finish(self, prefix: &str) -> (Router, Vec<RegisteredRoute>) {
        let routes = self
            .routes
            .into_iter()
            .map(|route| RegisteredRoute {
                method: route.method,
                path: format!("{}{}", prefix, route.path),
            })
            .collect();

        let router = if prefix.is_empty() {
            self.router
        } else {
            Router::new().nest(prefix, self.router)
        };

        (router, routes)
    }
}

impl Register for AxumRegistrar {
    fn register(
        &mut self,
        method: &Method,
        path: &str,
        handler: EndpointHandler,
    ) -> Result<(), RegisterError> {
        let refuse = |reason: String| RegisterError {
            method: method.clone(),
            path: path.to_string(),
            reason,
        };

        let template = to_axum_path(path).map_err(refuse)?;
        let filter = MethodFilter::try_from(method.clone())
            .map_err(|_| refuse(format!("method {} is not supported by the router", method)))?;

        let key = (template.clone(), method.as_str().to_string());
        if let Some(first) = self.claimed.get(&key) {
            return Err(refuse(format!(
                "same route as {} {} registered earlier",
                method, first
            )));
        }

        let shape = template_shape(&template);
        match self.shapes.get(&shape) {
            Some(existing) if existing != &template => {
                return Err(refuse(format!(
                    "conflicts with '{}' (same shape, different parameter names)",
                    existing
                )));
            }
            Some(_) => {}
            None => {
                self.matcher
                    .insert(template.clone(), ())
                    .map_err(|e| refuse(e.to_string()))?;
                self.shapes.insert(shape, template.clone());
            }
        }

        let method_router = on(filter, move |request: Request<Body>| {
            let handler = handler.clone();
            async move { handler.call(request).await }
        });

        self.router = std::mem::take(&mut self.router).route(&template, method_router);
        self.claimed.insert(key, path.to_string());
        self.routes.push(RegisteredRoute {
            method: method.clone(),
            path: template,
        });
        Ok(())
    }
}

/// Rewrite a path template into axum syntax, checking each segment.
pub fn to_axum_path(path: &str) -> Result<String, String> {
    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len() - 1;
    let mut names = BTreeSet::new();
    let mut out = Vec::with_capacity(segments.len());

    for (i, segment) in segments.iter().enumerate() {
        let param = if let Some(name) = segment.strip_prefix(':') {
            Some((name, false))
        } else if let Some(name) = segment.strip_prefix('*') {
            Some((name, true))
        } else if let Some(inner) = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
        {
            match inner.strip_prefix('*') {
                Some(name) => Some((name, true)),
                None => Some((inner, false)),
            }
        } else if segment.contains(['{', '}', ':', '*']) {
            return Err(format!("segment '{}' is not a valid path segment", segment));
        } else {
            None
        };

        match param {
            None => out.push(segment.to_string()),
            Some((name, catch_all)) => {
                let name = if name.is_empty() && catch_all { "rest" } else { name };
                if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
                    return Err(format!("invalid parameter name in segment '{}'", segment));
                }
                if !names.insert(name.to_string()) {
                    return Err(format!("parameter '{}' appears twice", name));
                }
                if catch_all {
                    if i != last {
                        return Err(format!(
                            "catch-all '{}' must be the last segment",
                            segment
                        ));
                    }
                    out.push(format!("{{*{}}}", name));
                } else {
                    out.push(format!("{{{}}}", name));
                }
            }
        }
    }

    Ok(out.join("/"))
}

/// Template with parameter names erased: `/a/{id}` → `/a/{}`.
fn template_shape(template: &str) -> String {
    template
        .split('/')
        .map(|segment| {
            if segment.starts_with("{*") {
                "{*}"
            } else if segment.starts_with('{') {
                "{}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
