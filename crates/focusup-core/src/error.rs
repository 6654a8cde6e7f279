//! Core error types for focusup-core.
//!
//! Every fallible boundary (durable store, browser host, configuration)
//! has its own error enum; `CoreError` wraps them all.

use std::path::PathBuf;
use thiserror::Error;

use crate::host::TabId;

/// Core error type for focusup-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Durable store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Browser host errors (notifications, tabs, messaging, alarms)
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Durable store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Store is locked")]
    Locked,

    /// A stored value could not be decoded into the expected shape
    #[error("Corrupt value for key '{key}': {message}")]
    Corrupt { key: String, message: String },

    /// Store is not reachable right now
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors reported by the browser host services.
#[derive(Error, Debug)]
pub enum HostError {
    /// Nobody is listening on the other end (popup closed, page without
    /// a content script). Not a failure of the sender.
    #[error("No receiver for message")]
    NoReceiver,

    /// The tab no longer exists
    #[error("Tab {0} not found")]
    TabNotFound(TabId),

    /// The host service failed or is unavailable
    #[error("Host service unavailable: {0}")]
    Unavailable(String),
}

impl HostError {
    /// Missing recipients are expected and never logged as failures.
    pub fn is_no_receiver(&self) -> bool {
        matches!(self, HostError::NoReceiver)
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Data directory could not be determined or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseBusy
                    || inner.code == rusqlite::ErrorCode::DatabaseLocked
                {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
