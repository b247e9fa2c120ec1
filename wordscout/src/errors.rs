/// Error types for the indexing pipeline.
///
/// Errors fall into three groups, and callers treat them differently:
///
/// 1. **Fatal startup errors** (bad thread count, unreadable file list, a worker
///    thread that could not be spawned). These abort before any search is served.
/// 2. **Per-file errors** (missing file, permission denied, undecodable bytes).
///    The indexer logs them, skips the file and keeps going.
/// 3. **Query errors** are not represented here at all. A malformed query or a
///    file that was never indexed is an ordinary
///    [`SearchOutcome`](crate::search::SearchOutcome).
///
/// A poisoned internal mutex is not an error value either: it aborts the
/// process (see [`crate::sync::lock_or_abort`]).
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for indexing operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that can occur while configuring or running the indexer
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Number of indexer threads must be > 0")]
    InvalidThreadCount,
    #[error("Bounded buffer capacity must be > 0")]
    InvalidBufferCapacity,
    #[error("Cannot open file list {path}: {source}")]
    FileList {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to spawn {role} thread: {source}")]
    ThreadSpawn {
        role: String,
        source: std::io::Error,
    },
    #[error("{0} thread panicked")]
    ThreadPanicked(String),
    #[error("Bounded buffer is closed: the scan has already completed")]
    BufferClosed,
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("Invalid UTF-8 in file {path} at line {line_number}: {source}")]
    EncodingError {
        path: PathBuf,
        line_number: usize,
        source: std::string::FromUtf8Error,
    },
}

impl IndexError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn file_list(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileList {
            path: path.into(),
            source,
        }
    }

    pub fn thread_spawn(role: impl Into<String>, source: std::io::Error) -> Self {
        Self::ThreadSpawn {
            role: role.into(),
            source,
        }
    }

    pub fn thread_panicked(role: impl Into<String>) -> Self {
        Self::ThreadPanicked(role.into())
    }

    pub fn encoding_error(
        path: impl Into<PathBuf>,
        line_number: usize,
        source: std::string::FromUtf8Error,
    ) -> Self {
        Self::EncodingError {
            path: path.into(),
            line_number,
            source,
        }
    }

    /// Maps an I/O error raised while opening `path` to the most specific variant
    pub fn from_open(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }

    /// Whether this error must stop the process before indexing starts.
    ///
    /// Everything else is local to a single file and is skipped by the pool.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidThreadCount
                | Self::InvalidBufferCapacity
                | Self::FileList { .. }
                | Self::ThreadSpawn { .. }
                | Self::ThreadPanicked(_)
                | Self::ConfigError(_)
                | Self::YamlError(_)
        )
    }
}
