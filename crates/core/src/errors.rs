//! Error types for the dirsync core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Sync errors
// ---------------------------------------------------------------------------

/// Errors from repository synchronization operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A caller-supplied argument was unusable (bad path, repository
    /// already present, clone target not empty, and the like).
    #[error("invalid argument: {0}")]
    ArgumentInvalid(String),

    /// Authentication against the remote failed and could not be healed
    /// by re-resolving credentials.
    #[error("authentication failed for '{endpoint}': {detail}")]
    AuthenticationFailure {
        endpoint: String,
        detail: String,
    },

    /// A `git2` library error that is not an authentication problem.
    #[error("git backend error: {0}")]
    Backend(#[from] git2::Error),

    /// The repository is missing a piece of configuration the operation
    /// needs (no remote, no fetch refspec, no tracking branch).
    #[error("missing repository configuration: {0}")]
    ConfigurationMissing(String),

    /// The operation was aborted through a [`CancelToken`].
    ///
    /// [`CancelToken`]: crate::sync_repo::CancelToken
    #[error("operation cancelled")]
    Cancelled,

    /// Generic I/O wrapper.
    #[error("sync I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Credential errors
// ---------------------------------------------------------------------------

/// Errors from credential resolution and secure storage.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The secure store rejected a read, write or delete.
    #[error("secure credential store error: {0}")]
    Store(String),

    /// The stored payload could not be serialized or deserialized.
    #[error("credential serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// No credential is stored for the requested endpoint.
    #[error("no stored credential for endpoint '{0}'")]
    NotFound(String),

    /// The interactive resolver was dismissed without producing a
    /// credential.
    #[error("credential resolution aborted: {0}")]
    ResolverAborted(String),
}

// ---------------------------------------------------------------------------
// Scanner errors
// ---------------------------------------------------------------------------

/// Errors from the filesystem change scanner.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scan root does not exist or is not a directory.
    #[error("scan root not found or not a directory: '{}'", .0.display())]
    RootNotFound(PathBuf),

    /// I/O failure while walking the tree, with the path that failed.
    #[error("scan I/O error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// TOML serialization error when saving.
    #[error("configuration serialize error: {0}")]
    SerializeError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading or writing the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Authentication classification
// ---------------------------------------------------------------------------

/// Whether a `git2` error is an authentication failure.
///
/// libgit2 reports credential problems with [`git2::ErrorCode::Auth`], but
/// some transports only surface them as a generic error whose message
/// mentions authentication, so both are checked.
pub fn is_auth_failure(err: &git2::Error) -> bool {
    err.code() == git2::ErrorCode::Auth
        || err.message().to_lowercase().contains("authentication")
}
