//! Static content hot reload.
//!
//! Only the `static_content` section is republished; listener and
//! observability changes need a restart.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::StaticContentConfig;

/// Watches the configuration file and emits changed static content sections.
pub struct ConfigWatcher {
    path: PathBuf,
    last: Mutex<Option<StaticContentConfig>>,
    update_tx: mpsc::UnboundedSender<StaticContentConfig>,
}

impl ConfigWatcher {
    /// Create a watcher seeded with the section currently in use.
    ///
    /// Returns the watcher and a receiver for changed sections.
    pub fn new(
        path: &Path,
        current: StaticContentConfig,
    ) -> (Self, mpsc::UnboundedReceiver<StaticContentConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                last: Mutex::new(Some(current)),
                update_tx,
            },
            update_rx,
        )
    }

    /// Reload the file and send its static content section if it changed.
    ///
    /// Returns whether an update was sent. Load errors keep the current section.
    pub fn reload(&self) -> bool {
        let config = match load_config(&self.path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Config reload failed, keeping current static content");
                return false;
            }
        };

        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        if last.as_ref() == Some(&config.static_content) {
            tracing::debug!("Static content unchanged");
            return false;
        }

        *last = Some(config.static_content.clone());
        self.update_tx.send(config.static_content).is_ok()
    }

    /// Start watching the file on notify's background thread.
    ///
    /// The returned handle must be kept alive for notifications to continue.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let path = self.path.clone();

        let mut handle = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    tracing::info!("Config file change detected");
                    self.reload();
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        handle.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), "Config watcher started");
        Ok(handle)
    }
}
