//! Error types and Result aliases for codeindex.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All public functions return `Result<T, Error>` or `Result<T>`.
//!
//! Per-entry traversal failures (an unreadable file, a failed stat) are not
//! represented here: the walk logs and skips them. Only failures that abort a
//! whole operation surface as an [`Error`].

use thiserror::Error;

/// Result type alias using codeindex's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for codeindex operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Indexing could not start or complete.
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// Index persistence error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Change watching error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// Generic internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors raised before or while walking a root directory.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Root path is missing or unreadable.
    #[error("cannot index '{path}': {reason}")]
    RootUnavailable { path: String, reason: String },

    /// Root path exists but is not a directory.
    #[error("'{0}' is not a directory")]
    NotADirectory(String),
}

/// Index Store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The storage directory could not be created.
    #[error("failed to create storage directory '{path}': {reason}")]
    CreateDir { path: String, reason: String },

    /// A metadata document or content blob could not be written.
    #[error("failed to write '{path}': {reason}")]
    Write { path: String, reason: String },

    /// A metadata document could not be read.
    #[error("failed to read '{path}': {reason}")]
    Read { path: String, reason: String },

    /// Some content blobs were not written; metadata was still saved.
    #[error("{failed} of {total} content blobs could not be written")]
    PartialSave { failed: usize, total: usize },

    /// Metadata (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Change watcher errors.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to subscribe to change notifications for a path.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// The watcher has been stopped and accepts no further requests.
    #[error("watcher is stopped")]
    Stopped,

    /// A re-index task panicked or was cancelled by the runtime.
    #[error("re-index task failed: {0}")]
    TaskFailed(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl StorageError {
    /// Create a write error for a path.
    pub fn write(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        Self::Write {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a read error for a path.
    pub fn read(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        Self::Read {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}
