//! Error types for minigit_core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using minigit_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during repository operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred while reading or writing repository state.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// The command needs a repository and none exists at the work tree.
    #[error("Not a minigit repository: {path} (run 'minigit init' first)")]
    RepositoryNotInitialized { path: PathBuf },

    /// Object not found in the object store.
    #[error("Object not found: {hash}")]
    ObjectNotFound { hash: String },

    /// Commit referenced by HEAD, a parent link or the caller is missing.
    #[error("Commit not found: {hash}")]
    CommitNotFound { hash: String },

    /// Object file is corrupted or invalid.
    #[error("Corrupted object at {path}: {reason}")]
    CorruptedObject { path: PathBuf, reason: String },

    /// The staging area file could not be parsed.
    #[error("Corrupted index at {path}: {reason}")]
    CorruptedIndex { path: PathBuf, reason: String },

    /// The HEAD file does not hold a commit id.
    #[error("Corrupted HEAD at {path}: {reason}")]
    CorruptedHead { path: PathBuf, reason: String },

    /// Invalid hash format or encoding.
    #[error("Invalid hash: {reason}")]
    InvalidHash { reason: String },

    /// Invalid object type.
    #[error("Invalid object type: expected {expected}, got {got}")]
    InvalidObjectType { expected: String, got: String },

    /// A filename cannot be tracked.
    #[error("Invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A commit message cannot be recorded.
    #[error("Invalid commit message: {reason}")]
    InvalidMessage { reason: String },

    /// Repository config is missing fields or has an unknown version.
    #[error("Invalid config at {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    /// Unsupported algorithm.
    #[error("Unsupported algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    /// An abbreviated id matches more than one object.
    #[error("Ambiguous id {prefix}: matches {candidates} objects")]
    AmbiguousId { prefix: String, candidates: usize },

    /// An operation that moves HEAD was refused because changes are staged.
    #[error("{count} staged change(s) would be lost; commit them first")]
    StagedChangesPresent { count: usize },
}

impl Error {
    /// Create a RepositoryNotInitialized error.
    pub fn repository_not_initialized(path: impl Into<PathBuf>) -> Self {
        Error::RepositoryNotInitialized { path: path.into() }
    }

    /// Create an ObjectNotFound error.
    pub fn object_not_found(hash: impl Into<String>) -> Self {
        Error::ObjectNotFound { hash: hash.into() }
    }

    /// Create a CommitNotFound error.
    pub fn commit_not_found(hash: impl Into<String>) -> Self {
        Error::CommitNotFound { hash: hash.into() }
    }

    /// Create a CorruptedObject error.
    pub fn corrupted_object(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::CorruptedObject {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a CorruptedIndex error.
    pub fn corrupted_index(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::CorruptedIndex {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a CorruptedHead error.
    pub fn corrupted_head(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::CorruptedHead {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidHash error.
    pub fn invalid_hash(reason: impl Into<String>) -> Self {
        Error::InvalidHash {
            reason: reason.into(),
        }
    }

    /// Create an InvalidObjectType error.
    pub fn invalid_object_type(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Error::InvalidObjectType {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidMessage error.
    pub fn invalid_message(reason: impl Into<String>) -> Self {
        Error::InvalidMessage {
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidConfig {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedAlgorithm error.
    pub fn unsupported_algorithm(algorithm: impl Into<String>) -> Self {
        Error::UnsupportedAlgorithm {
            algorithm: algorithm.into(),
        }
    }

    /// Create an AmbiguousId error.
    pub fn ambiguous_id(prefix: impl Into<String>, candidates: usize) -> Self {
        Error::AmbiguousId {
            prefix: prefix.into(),
            candidates,
        }
    }

    /// Create a StagedChangesPresent error.
    pub fn staged_changes_present(count: usize) -> Self {
        Error::StagedChangesPresent { count }
    }

    /// True for errors that mean the repository state on disk is damaged.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::ObjectNotFound { .. }
                | Error::CommitNotFound { .. }
                | Error::CorruptedObject { .. }
                | Error::CorruptedIndex { .. }
                | Error::CorruptedHead { .. }
        )
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io { source: err.error }
    }
}
