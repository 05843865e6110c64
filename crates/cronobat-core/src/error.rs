//! Core error types for cronobat-core.
//!
//! Nothing in the session or monitor loop is fatal: these errors surface from
//! configuration loading, user input validation and the external collaborators
//! (activity source, overlay host). The runtime logs and swallows the latter.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for cronobat-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Foreground activity query errors
    #[error("Activity source error: {0}")]
    Activity(#[from] ActivityError),

    /// Overlay host errors
    #[error("Overlay error: {0}")]
    Overlay(#[from] OverlayError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Home or config directory could not be determined
    #[error("Cannot determine configuration directory")]
    NoConfigDir,

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Value outside its permitted range
    #[error("Value {value} for '{field}' is out of range (max {max})")]
    OutOfRange { field: String, value: u64, max: u64 },

    /// Setting cannot change while the session is running
    #[error("Cannot change '{field}' while the session is running")]
    SessionRunning { field: String },

    /// Clock text is not `MM:SS` or `HH:MM:SS`
    #[error("Invalid clock value '{0}': expected MM:SS or HH:MM:SS")]
    InvalidClock(String),
}

/// Errors reported by an [`ActivitySource`](crate::monitor::ActivitySource).
#[derive(Error, Debug)]
pub enum ActivityError {
    /// The host refused the query (usually missing usage access)
    #[error("Usage access not granted")]
    PermissionDenied,

    /// The query itself failed
    #[error("Activity query failed: {0}")]
    QueryFailed(String),

    /// The event feed could not be parsed
    #[error("Malformed activity event at line {line}: {message}")]
    Malformed { line: usize, message: String },
}

/// Errors reported by an [`OverlayHost`](crate::intervention::OverlayHost).
#[derive(Error, Debug)]
pub enum OverlayError {
    /// Creating the overlay window failed
    #[error("Failed to show overlay: {0}")]
    ShowFailed(String),

    /// Removing the overlay window failed
    #[error("Failed to dismiss overlay: {0}")]
    DismissFailed(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
