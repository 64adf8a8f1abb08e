//! Error types. Alert and scoring failures are logged, never returned to ingest callers.

use std::path::PathBuf;
use thiserror::Error;

/// Malformed ingest input.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Window rule evaluation failure; logged by the ingest path, never returned.
#[derive(Error, Debug)]
pub enum RuleError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Window of {window_secs}s does not fit before the event timestamp")]
    WindowOverflow { window_secs: u64 },
}

#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Alert transport failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Alert rejected: {status} {body}")]
    Status { status: u16, body: String },

    #[error("Alert sink not configured: {0}")]
    NotConfigured(&'static str),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },

    #[error("Config read failed for {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("Config parse failed for {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Unparseable environment override {key}={value}")]
    EnvOverride { key: &'static str, value: String },
}

/// Errors visible to the caller of `record_event`.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
