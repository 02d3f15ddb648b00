//! # Design
//!
//! - Provide structured, constant-message errors for settings loading.
//! - Capture the offending field and value so failures are reproducible.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for settings operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors produced while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("settings file io failure")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Settings file path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The settings file was not valid JSON for the settings model.
    #[error("settings file could not be parsed")]
    Json {
        /// Settings file path.
        path: PathBuf,
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// A setting carried an unsupported value.
    #[error("invalid setting")]
    InvalidField {
        /// Setting name.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str, value: &str) -> Self {
        Self::InvalidField {
            field,
            reason,
            value: Some(value.to_string()),
        }
    }
}
