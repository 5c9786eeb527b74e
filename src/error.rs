//! Error taxonomy for the tree engine.
//!
//! `StorageError` covers the storage-access layer; `EngineError` is the
//! operation-level taxonomy surfaced to orchestration callers. `NotFound`
//! and `InvalidOperation` are expected control-flow outcomes and travel as
//! typed results, never panics.

use thiserror::Error;

/// Errors raised by `TreeStorage` implementations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("path not found: {0}")]
    NotFound(String),

    #[error("path escapes configured root: {0}")]
    Boundary(String),

    #[error("entry already exists: {0}")]
    AlreadyExists(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("not a file: {0}")]
    NotAFile(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("store error: {0}")]
    Backend(String),

    #[error("record serialization failed: {0}")]
    Serialization(String),
}

impl From<sled::Error> for StorageError {
    fn from(e: sled::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}

impl From<bincode::Error> for StorageError {
    fn from(e: bincode::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Operation-level errors surfaced by the mutation service and materializer.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Path or sibling absent. Expected control flow, not fatal.
    #[error("not found: {0}")]
    NotFound(String),

    /// Attempted escape of the configured root. Always fatal to the request.
    #[error("boundary violation: {0}")]
    Boundary(String),

    /// Name already exists at the target.
    #[error("name conflict: {0}")]
    Conflict(String),

    /// Operation not applicable to the selection (join with < 2 text files,
    /// split without delimiter match, and so on).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Move-up on the first sibling or move-down on the last. Reported to
    /// the caller, never retried.
    #[error("already at {0} of sibling order")]
    AtBoundary(&'static str),

    /// Underlying I/O or database failure. A multi-step mutation interrupted
    /// by this leaves the directory duplicate-free but possibly gapped.
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Whether the error is an expected, non-fatal outcome.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            EngineError::NotFound(_)
                | EngineError::InvalidOperation(_)
                | EngineError::AtBoundary(_)
                | EngineError::Conflict(_)
        )
    }
}
