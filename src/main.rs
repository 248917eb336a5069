//! fake-api
//!
//! Serves a fake REST API described by one or more configuration files.
//!
//! ```text
//!   config files ──▶ loader ──▶ route table ──▶ axum router ──▶ listener
//!        ▲                                          ▲
//!        └──── watcher (--watch) ───── reload ──────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use fake_api::config::{load_config, watcher::ConfigWatcher};
use fake_api::lifecycle::{resolve_resource_root, signals, Shutdown};
use fake_api::observability::{logging, metrics};
use fake_api::routing::RouteTableBuilder;
use fake_api::FakeApiServer;

#[derive(Parser)]
#[command(name = "fake-api")]
#[command(about = "Serve a fake REST API from configuration files", long_about = None)]
struct Cli {
    /// Directory relative config files are resolved against
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,

    /// Config file (TOML, YAML or JSON); repeat to merge several in order
    #[arg(long = "config-file", default_value = "config.toml")]
    config_files: Vec<PathBuf>,

    /// Directory that endpoint and resource files are read from
    #[arg(long)]
    resource_dir: Option<PathBuf>,

    /// Verbose logging and dump the resolved configuration
    #[arg(long)]
    debug: bool,

    /// Reload routes when a config file changes
    #[arg(long)]
    watch: bool,

    /// Validate the configuration, print every error and exit
    #[arg(long)]
    check: bool,
}

impl Cli {
    /// Config paths joined onto `--config-dir`, duplicates removed.
    fn config_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = Vec::with_capacity(self.config_files.len());
        for file in &self.config_files {
            let path = self.config_dir.join(file);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        paths
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let paths = cli.config_paths();

    let config = load_config(&paths)?;
    logging::init_logging(&config.observability, cli.debug);

    tracing::info!(files = ?paths, "fake-api v{} starting", env!("CARGO_PKG_VERSION"));

    if cli.debug {
        tracing::debug!("Resolved configuration:\n{}", serde_json::to_string_pretty(&config)?);
    }

    let resource_root = resolve_resource_root(cli.resource_dir.as_deref(), &config.api);

    if cli.check {
        let table = RouteTableBuilder::new(&config.api, &resource_root).build();
        println!("{} endpoint(s)", table.endpoints().len());
        if table.has_errors() || table.is_fatal() {
            eprintln!("{}", table.report());
            std::process::exit(1);
        }
        return Ok(());
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        prefix = %config.api.prefix,
        resource_root = %resource_root.display(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let tls = config.listener.tls.clone();
    let bind_address = config.listener.bind_address.clone();
    let server = FakeApiServer::new(config, resource_root)?;

    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_signal_handler(shutdown.clone());

    // The watcher must outlive the server.
    let (_watcher, updates) = if cli.watch {
        let (watcher, updates) = ConfigWatcher::new(paths);
        (Some(watcher.run()?), updates)
    } else {
        let (_tx, updates) = mpsc::unbounded_channel();
        (None, updates)
    };

    match tls {
        Some(tls) => {
            let addr = bind_address.parse()?;
            server
                .run_tls(addr, &tls, updates, shutdown.subscribe())
                .await?;
        }
        None => {
            let listener = TcpListener::bind(&bind_address).await?;
            server.run(listener, updates, shutdown.subscribe()).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
