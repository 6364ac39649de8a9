//! Core error types for habit-core.
//!
//! Malformed store lines are not represented here: they are recovered
//! locally by the store (see [`crate::record::ParseError`]) and never abort an
//! operation.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Core error type for habit-core.
#[derive(Error, Debug)]
pub enum HabitError {
    /// The store file could not be opened, read, locked or written.
    #[error("Failed to access habit store at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No record carries the requested id. The store was left untouched.
    #[error("No habit with id {0}")]
    NotFound(u64),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Home or data directory could not be determined or created
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

impl HabitError {
    /// Wrap an IO error with the path it concerns.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        HabitError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True for [`HabitError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, HabitError::NotFound(_))
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {}: {message}", .path.display())]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {}: {message}", .path.display())]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not name a configuration value
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Result type alias for HabitError
pub type Result<T, E = HabitError> = std::result::Result<T, E>;
