//! Configuration file watcher for hot reload.

use std::path::PathBuf;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::FakeApiConfig;

/// A watcher that monitors the configuration files for changes.
pub struct ConfigWatcher {
    paths: Vec<PathBuf>,
    update_tx: mpsc::UnboundedSender<FakeApiConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(paths: Vec<PathBuf>) -> (Self, mpsc::UnboundedReceiver<FakeApiConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (Self { paths, update_tx }, update_rx)
    }

    /// Start watching the files in a background thread.
    ///
    /// Any change reloads the whole file set, so merged values stay
    /// consistent. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let paths = self.paths.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading...");
                        match load_config(&paths) {
                            Ok(new_config) => {
                                let _ = tx.send(new_config);
                            }
                            Err(e) => {
                                tracing::error!(
                                    "Failed to reload config: {}. Keeping current configuration.",
                                    e
                                );
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        for path in &self.paths {
            watcher.watch(path, RecursiveMode::NonRecursive)?;
        }

        tracing::info!(paths = ?self.paths, "Config watcher started");
        Ok(watcher)
    }
}
