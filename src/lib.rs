//! Recall - reminders with context.
//!
//! This library provides the core functionality for the `rc` CLI tool:
//! the reminder model, the store contract every backend implements, the
//! append-only local store, and the Apple Reminders and Todoist adapters.

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod models;
pub mod storage;


/// Library-level error type for Recall operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reminder not found: {0}")]
    NotFound(String),

    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("osascript error: {0}")]
    Script(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl Error {
    /// Whether this error means the requested reminder has no live record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Result type alias for Recall operations.
pub type Result<T> = std::result::Result<T, Error>;
