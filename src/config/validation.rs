//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate static content prefixes and mappings
//! - Validate socket addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HostConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{HostConfig, StaticContentConfig};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("public folder '{0}' must start with '/'")]
    FolderNotAbsolute(String),

    #[error("public folder '{0}' must not end with '/'")]
    FolderTrailingSlash(String),

    #[error("file mapping path '{0}' must start with '/'")]
    MappingNotAbsolute(String),

    #[error("file mapping for '{0}' has an empty target")]
    EmptyMappingTarget(String),

    #[error("{field} '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },
}

/// Validate a full host configuration.
pub fn validate_config(config: &HostConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = static_content_errors(&config.static_content);

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate only the static content section.
///
/// Also used on configuration produced by startup tasks.
pub fn validate_static_content(config: &StaticContentConfig) -> Result<(), Vec<ValidationError>> {
    let errors = static_content_errors(config);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn static_content_errors(config: &StaticContentConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for folder in &config.public_folders {
        if !folder.starts_with('/') {
            errors.push(ValidationError::FolderNotAbsolute(folder.clone()));
        } else if folder.len() > 1 && folder.ends_with('/') {
            errors.push(ValidationError::FolderTrailingSlash(folder.clone()));
        }
    }

    for (path, target) in &config.public_file_mappings {
        if !path.starts_with('/') {
            errors.push(ValidationError::MappingNotAbsolute(path.clone()));
        }
        if target.trim().is_empty() {
            errors.push(ValidationError::EmptyMappingTarget(path.clone()));
        }
    }

    errors
}
