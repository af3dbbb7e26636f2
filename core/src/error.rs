//! Error types for record storage.

use std::path::PathBuf;

/// Failures of the durable record store.
///
/// The ledger recovers from every variant except during construction;
/// see `Ledger` for where each one is logged and swallowed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("I/O error: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record: {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        StoreError::Json {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
