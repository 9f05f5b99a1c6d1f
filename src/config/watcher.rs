//! Configuration file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::config::active::{ActiveConfig, SharedConfig};
use crate::config::loader::{load, ConfigError};

/// A watcher that monitors the configuration file for changes and swaps the
/// active configuration in place.
pub struct ConfigWatcher {
    path: PathBuf,
    shared: SharedConfig,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher that updates `shared`.
    pub fn new(path: &Path, shared: SharedConfig) -> Self {
        Self {
            path: path.to_path_buf(),
            shared,
        }
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for reloads to continue.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();
        let shared = self.shared.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Config file change detected, reloading...");
                        if let Err(e) = reload(&path, &shared, |k| std::env::var(k).ok()) {
                            tracing::error!(
                                error = %e,
                                "Failed to reload config. Keeping current configuration."
                            );
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Reload `path`, re-apply environment overrides and swap the result into
/// `shared`. On error the current configuration is left untouched.
pub fn reload<F>(path: &Path, shared: &SharedConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = load(Some(path), env)?;
    let active = ActiveConfig::compile(config)?;
    shared.store(Arc::new(active));
    tracing::info!(path = ?path, "Configuration reloaded");
    Ok(())
}
