//! Virtual path to file system mapping.

use std::path::{Path, PathBuf};

/// Maps virtual paths (`/x`, `~/x`, `x`) to files under an application root.
#[derive(Debug, Clone)]
pub struct PathMapper {
    root: PathBuf,
}

impl PathMapper {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a virtual path under the root.
    ///
    /// Returns `None` for paths that would escape the root (`..` segments or
    /// backslashes).
    pub fn map_path(&self, virtual_path: &str) -> Option<PathBuf> {
        let relative = virtual_path.strip_prefix('~').unwrap_or(virtual_path);

        let mut mapped = self.root.clone();
        for segment in relative.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return None,
                s if s.contains('\\') => return None,
                s => mapped.push(s),
            }
        }
        Some(mapped)
    }
}
