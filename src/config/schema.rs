//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration for the application host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HostConfig {
    /// Listener configuration for the demo host.
    pub listener: ListenerConfig,

    /// Static content served ahead of handler routing.
    pub static_content: StaticContentConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Static content configuration.
///
/// Startup tasks may extend this before the first dispatch.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct StaticContentConfig {
    /// Directory that virtual paths are mapped under.
    pub app_root: PathBuf,

    /// Folder prefixes served directly from disk (e.g., "/public").
    pub public_folders: Vec<String>,

    /// Literal request paths mapped to a single file (e.g., "/" → "/index.html").
    pub public_file_mappings: BTreeMap<String, String>,
}

impl Default for StaticContentConfig {
    fn default() -> Self {
        Self {
            app_root: PathBuf::from("."),
            public_folders: Vec::new(),
            public_file_mappings: BTreeMap::new(),
        }
    }
}

impl StaticContentConfig {
    /// Add a public folder prefix, ignoring duplicates.
    pub fn add_public_folder(&mut self, folder: impl Into<String>) {
        let folder = folder.into();
        if !self.public_folders.iter().any(|f| f.eq_ignore_ascii_case(&folder)) {
            self.public_folders.push(folder);
        }
    }

    /// Map a literal request path to a file.
    pub fn add_file_mapping(&mut self, path: impl Into<String>, file: impl Into<String>) {
        self.public_file_mappings.insert(path.into(), file.into());
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: HostConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8080");
        assert!(config.static_content.public_folders.is_empty());
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_parse_static_content() {
        let config: HostConfig = toml::from_str(
            r#"
            [static_content]
            app_root = "/srv/app"
            public_folders = ["/public", "/Scripts"]

            [static_content.public_file_mappings]
            "/" = "/index.html"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.static_content.app_root, PathBuf::from("/srv/app"));
        assert_eq!(config.static_content.public_folders, vec!["/public", "/Scripts"]);
        assert_eq!(
            config.static_content.public_file_mappings.get("/").map(String::as_str),
            Some("/index.html")
        );
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn test_add_public_folder_ignores_duplicates() {
        let mut config = StaticContentConfig::default();
        config.add_public_folder("/public");
        config.add_public_folder("/PUBLIC");
        config.add_public_folder("/assets");
        assert_eq!(config.public_folders, vec!["/public", "/assets"]);
    }
}
