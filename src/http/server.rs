//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Compile the configured endpoints into the live router
//! - Wire up middleware (request ID, tracing, timeout, metrics, delay)
//! - Bind server to listener (plain or TLS)
//! - Swap in a rebuilt router when the configuration changes
//! - Graceful shutdown

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{body::Body, http::Request, middleware, Router};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tower::{service_fn, ServiceExt};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{ApiConfig, FakeApiConfig, TlsConfig};
use crate::http::middleware::{delay_middleware, metrics_middleware};
use crate::http::request::{request_id_layer, RequestIdExt};
use crate::lifecycle::shutdown;
use crate::lifecycle::startup::{compile_routes, StartupError};
use crate::observability::metrics;
use crate::routing::RegisteredRoute;

/// The router currently serving requests, replaceable at runtime.
#[derive(Clone)]
pub struct LiveRouter {
    current: Arc<ArcSwap<Router>>,
    resource_root: PathBuf,
}

impl LiveRouter {
    fn new(router: Router, resource_root: PathBuf) -> Self {
        Self {
            current: Arc::new(ArcSwap::from_pointee(router)),
            resource_root,
        }
    }

    /// Rebuild from `api` and swap it in. On failure the current router stays.
    pub fn reload(&self, api: &ApiConfig) -> Result<Vec<RegisteredRoute>, StartupError> {
        let compiled = compile_routes(api, &self.resource_root)?;
        self.current.store(Arc::new(compiled.router));
        metrics::record_routes(compiled.routes.len());
        tracing::info!(
            routes = compiled.routes.len(),
            skipped = compiled.skipped,
            "Routes reloaded"
        );
        Ok(compiled.routes)
    }

    async fn dispatch(&self, request: Request<Body>) -> Result<axum::response::Response, Infallible> {
        let router = self.current.load_full();
        Router::clone(&router).oneshot(request).await
    }
}

/// HTTP server for the fake API.
pub struct FakeApiServer {
    config: FakeApiConfig,
    live: LiveRouter,
    routes: Vec<RegisteredRoute>,
}

impl FakeApiServer {
    /// Build the route table from `config.api` and prepare the server.
    ///
    /// Fails when the configuration defines nothing, or when any definition
    /// is invalid and `api.strict` is set.
    pub fn new(
        config: FakeApiConfig,
        resource_root: impl Into<PathBuf>,
    ) -> Result<Self, StartupError> {
        let resource_root = resource_root.into();
        let compiled = compile_routes(&config.api, &resource_root)?;
        metrics::record_routes(compiled.routes.len());

        Ok(Self {
            config,
            live: LiveRouter::new(compiled.router, resource_root),
            routes: compiled.routes,
        })
    }

    /// Routes registered at startup.
    pub fn routes(&self) -> &[RegisteredRoute] {
        &self.routes
    }

    pub fn config(&self) -> &FakeApiConfig {
        &self.config
    }

    pub fn live_router(&self) -> &LiveRouter {
        &self.live
    }

    /// The full application: live endpoints behind all middleware layers.
    #[allow(deprecated)]
    pub fn app(&self) -> Router {
        let live = self.live.clone();
        let dispatch = service_fn(move |request: Request<Body>| {
            let live = live.clone();
            async move { live.dispatch(request).await }
        });

        let mut app = Router::new().fallback_service(dispatch);

        if self.config.api.delay_ms > 0 {
            app = app.layer(middleware::from_fn_with_state(
                Duration::from_millis(self.config.api.delay_ms),
                delay_middleware,
            ));
        }

        app.layer(middleware::from_fn(metrics_middleware))
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.timeouts.request_secs,
            )))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request.request_id(),
                    )
                }),
            )
            .layer(request_id_layer())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<FakeApiConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.routes.len(),
            "HTTP server starting"
        );

        let reload_task = self.spawn_reload(config_updates, shutdown.resubscribe());
        let app = self.app();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        reload_task.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server over TLS on `addr`.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: &TlsConfig,
        config_updates: mpsc::UnboundedReceiver<FakeApiConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), StartupError> {
        let rustls = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
            .await
            .map_err(StartupError::Tls)?;

        tracing::info!(
            address = %addr,
            routes = self.routes.len(),
            "HTTPS server starting"
        );

        let handle = axum_server::Handle::new();
        let grace = Duration::from_secs(self.config.timeouts.request_secs);
        let shutdown_handle = handle.clone();
        let reload_task = self.spawn_reload(config_updates, shutdown.resubscribe());
        tokio::spawn(async move {
            shutdown::wait(shutdown).await;
            shutdown_handle.graceful_shutdown(Some(grace));
        });

        axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(self.app().into_make_service())
            .await?;

        reload_task.abort();
        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    fn spawn_reload(
        &self,
        mut config_updates: mpsc::UnboundedReceiver<FakeApiConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let live = self.live.clone();
        let running = self.config.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    update = config_updates.recv() => match update {
                        Some(config) => {
                            let ignored = restart_required(&running, &config);
                            if !ignored.is_empty() {
                                tracing::warn!(
                                    sections = ?ignored,
                                    "Changed settings take effect only after a restart"
                                );
                            }
                            if let Err(e) = live.reload(&config.api) {
                                tracing::error!(
                                    error = %e,
                                    "Reload rejected, keeping current routes"
                                );
                            }
                        }
                        None => break,
                    },
                    _ = shutdown.recv() => break,
                }
            }
        })
    }
}

/// Settings a reload cannot apply: everything outside the endpoint set.
fn restart_required(running: &FakeApiConfig, next: &FakeApiConfig) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if running.listener != next.listener {
        changed.push("listener");
    }
    if running.timeouts != next.timeouts {
        changed.push("timeouts");
    }
    if running.observability != next.observability {
        changed.push("observability");
    }
    if running.api.delay_ms != next.api.delay_ms {
        changed.push("api.delay_ms");
    }
    changed
}
