//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve the resource root
//! - Build the route table and report every definition error
//! - Apply the startup policy: no definitions is always fatal, invalid
//!   definitions are fatal only in strict mode
//! - Register endpoints and compose the live router (static dir, fallback)
//!
//! # Design Decisions
//! - The same compile step serves startup and hot reload
//! - Listeners start last (traffic only when ready)

use std::path::{Path, PathBuf};

use axum::Router;
use thiserror::Error;
use tower_http::services::ServeDir;

use crate::config::{ApiConfig, ConfigError, StaticConfig};
use crate::http::response::not_found_fallback;
use crate::routing::table::NO_DEFINITIONS_MESSAGE;
use crate::routing::{AxumRegistrar, RegisteredRoute, RouteTableBuilder};

/// Default resource directory, relative to the working directory.
pub const DEFAULT_RESOURCE_DIR: &str = "data";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("at least one endpoint or resource must be provided")]
    NoDefinitions,

    #[error("{0} endpoint definition error(s) and strict mode is enabled")]
    Strict(usize),

    #[error("TLS setup failed: {0}")]
    Tls(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A router ready to be swapped in, with what it serves.
pub struct CompiledRoutes {
    pub router: Router,
    pub routes: Vec<RegisteredRoute>,
    /// Definitions that were skipped (validation or registration).
    pub skipped: usize,
}

/// Command line override, then `api.resource_dir`, then `./data`.
pub fn resolve_resource_root(cli_override: Option<&Path>, api: &ApiConfig) -> PathBuf {
    cli_override
        .map(Path::to_path_buf)
        .or_else(|| api.resource_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RESOURCE_DIR))
}

/// Build, report and register the endpoints of `api`.
pub fn compile_routes(api: &ApiConfig, resource_root: &Path) -> Result<CompiledRoutes, StartupError> {
    let table = RouteTableBuilder::new(api, resource_root).build();

    if table.is_fatal() {
        tracing::error!("{}", NO_DEFINITIONS_MESSAGE);
        return Err(StartupError::NoDefinitions);
    }

    let invalid = table.errors().len();
    if invalid > 0 {
        tracing::warn!(count = invalid, "Error(s) in config");
        for (i, err) in table.errors().iter().enumerate() {
            tracing::warn!(
                index = i + 1,
                origin = %err.origin,
                "{}",
                err.message
            );
        }
        if api.strict {
            return Err(StartupError::Strict(invalid));
        }
    }

    let mut registrar = AxumRegistrar::new();
    let refused = table.register_into(&mut registrar);
    if api.strict && !refused.is_empty() {
        return Err(StartupError::Strict(invalid + refused.len()));
    }

    let (router, routes) = registrar.finish(&api.prefix);
    let router = compose(router, api.static_dir.as_ref(), &routes);

    for route in &routes {
        tracing::info!(method = %route.method, path = %route.path, "Route registered");
    }

    Ok(CompiledRoutes {
        router,
        routes,
        skipped: invalid + refused.len(),
    })
}

/// Attach the static directory (when it does not collide with an endpoint)
/// and the JSON 404 fallback.
fn compose(router: Router, static_dir: Option<&StaticConfig>, routes: &[RegisteredRoute]) -> Router {
    let Some(static_dir) = static_dir else {
        return router.fallback(not_found_fallback);
    };

    let url = static_dir.url.trim_end_matches('/');
    let serve_dir = ServeDir::new(&static_dir.path);

    if url.is_empty() {
        tracing::info!(path = %static_dir.path.display(), "Serving static files at /");
        return router.fallback_service(serve_dir);
    }

    let collides = routes
        .iter()
        .any(|r| r.path == url || r.path.starts_with(&format!("{}/", url)));
    if collides {
        tracing::warn!(
            url = %url,
            "Static directory overlaps a configured endpoint, not mounted"
        );
        return router.fallback(not_found_fallback);
    }

    tracing::info!(url = %url, path = %static_dir.path.display(), "Serving static files");
    router
        .nest_service(url, serve_dir)
        .fallback(not_found_fallback)
}
