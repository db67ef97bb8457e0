//! Static content resolver.
//!
//! # Responsibilities
//! - Decide whether a request path maps to a file on disk
//! - Populate the response for files that exist
//! - Stream file bytes on demand, releasing the handle on every exit path

use arc_swap::ArcSwap;
use futures_util::future::BoxFuture;
use std::io;
use std::path::{Path, PathBuf};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

use crate::config::StaticContentConfig;
use crate::content::negotiation::resolve_content_type;
use crate::content::path::PathMapper;
use crate::host::body::{copy_cancellable, BodySink, WriteBody};
use crate::host::context::{Context, ContextError, Status};
use crate::observability::metrics;

/// Serves requests that map to files, ahead of handler routing.
pub struct StaticContentResolver {
    config: ArcSwap<StaticContentConfig>,
    overlay: Mutex<Overlay>,
}

/// Changes made on top of the file configuration, reapplied on every reload.
#[derive(Debug, Default)]
struct Overlay {
    app_root: Option<PathBuf>,
    public_folders: Vec<String>,
    public_file_mappings: BTreeMap<String, String>,
}

impl Overlay {
    /// Record what `updated` adds or changes relative to `base`.
    fn record(&mut self, base: &StaticContentConfig, updated: &StaticContentConfig) {
        if updated.app_root != base.app_root {
            self.app_root = Some(updated.app_root.clone());
        }
        for folder in &updated.public_folders {
            let known = base.public_folders.iter().any(|f| f.eq_ignore_ascii_case(folder))
                || self.public_folders.iter().any(|f| f.eq_ignore_ascii_case(folder));
            if !known {
                self.public_folders.push(folder.clone());
            }
        }
        for (path, file) in &updated.public_file_mappings {
            if base.public_file_mappings.get(path) != Some(file) {
                self.public_file_mappings.insert(path.clone(), file.clone());
            }
        }
    }

    fn apply(&self, config: &mut StaticContentConfig) {
        if let Some(root) = &self.app_root {
            config.app_root = root.clone();
        }
        for folder in &self.public_folders {
            config.add_public_folder(folder.clone());
        }
        for (path, file) in &self.public_file_mappings {
            config.add_file_mapping(path.clone(), file.clone());
        }
    }
}

impl StaticContentResolver {
    pub fn new(config: StaticContentConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            overlay: Mutex::new(Overlay::default()),
        }
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<StaticContentConfig> {
        self.config.load_full()
    }

    /// Replace the file-sourced configuration.
    ///
    /// Changes previously made through [`Self::update`] are reapplied on top.
    pub fn reload(&self, mut config: StaticContentConfig) {
        let overlay = self.overlay.lock().unwrap_or_else(PoisonError::into_inner);
        overlay.apply(&mut config);
        self.publish(config);
    }

    /// Edit a copy of the current configuration and publish it if `edit` succeeds.
    ///
    /// What the edit adds is kept across later reloads. Reloads wait while
    /// an edit runs, so none is lost between snapshot and publish.
    pub fn update<E>(
        &self,
        edit: impl FnOnce(&mut StaticContentConfig) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut overlay = self.overlay.lock().unwrap_or_else(PoisonError::into_inner);
        let base = self.config.load_full();
        let mut config = (*base).clone();

        edit(&mut config)?;

        overlay.record(&base, &config);
        self.publish(config);
        Ok(())
    }

    fn publish(&self, config: StaticContentConfig) {
        tracing::info!(
            public_folders = config.public_folders.len(),
            file_mappings = config.public_file_mappings.len(),
            "Static content configuration published"
        );
        self.config.store(Arc::new(config));
    }

    /// Candidate file for `path`, before checking the file system.
    pub fn candidate(&self, path: &str) -> Option<PathBuf> {
        let config = self.config.load();
        let mapper = PathMapper::new(&config.app_root);

        if let Some(target) = config.public_file_mappings.get(path) {
            return mapper.map_path(target);
        }

        if config
            .public_folders
            .iter()
            .any(|folder| is_under_folder(path, folder))
        {
            return mapper.map_path(path);
        }

        None
    }

    /// Serve the request from disk if it maps to an existing file.
    ///
    /// Returns `Ok(false)` without touching the response when it does not.
    pub async fn try_serve(&self, context: &mut Context) -> Result<bool, ContextError> {
        let Some(file) = self.candidate(context.request.path()) else {
            return Ok(false);
        };

        let is_file = tokio::fs::metadata(&file)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            tracing::debug!(file = %file.display(), "Static candidate does not exist");
            return Ok(false);
        }

        let content_type = resolve_content_type(Some(&file), context.request.accept());
        context.response.set_status(Status::OK);
        context.response.set_content_type(&content_type)?;
        tracing::debug!(file = %file.display(), content_type = %content_type, "Serving static file");
        context.response.set_body(FileBody::new(file))?;

        Ok(true)
    }
}

/// `path` starts with `folder` (ASCII case-insensitive) followed by '/'.
fn is_under_folder(path: &str, folder: &str) -> bool {
    let (path, folder) = (path.as_bytes(), folder.as_bytes());
    path.len() > folder.len()
        && path[..folder.len()].eq_ignore_ascii_case(folder)
        && path[folder.len()] == b'/'
}

/// Body writer streaming a file from disk.
///
/// The file is opened when the host invokes the writer, so a file removed
/// after the dispatch surfaces here as an I/O error.
#[derive(Debug, Clone)]
pub struct FileBody {
    path: PathBuf,
}

impl FileBody {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WriteBody for FileBody {
    fn write_to<'a>(
        self: Box<Self>,
        dest: BodySink<'a>,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, io::Result<()>> {
        Box::pin(async move {
            let mut file = tokio::fs::File::open(&self.path).await?;
            let result = copy_cancellable(&mut file, dest, &cancel).await;
            drop(file);

            match result {
                Ok(bytes) => {
                    metrics::record_static_bytes(bytes);
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!(file = %self.path.display(), error = %e, "Static file write aborted");
                    Err(e)
                }
            }
        })
    }
}
