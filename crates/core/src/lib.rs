//! dirsync core library.
//!
//! This crate provides the foundational components for keeping a local
//! directory in sync with a remote git repository: configuration,
//! credential brokering with retry, the repository sync controller, and
//! the modification-time change scanner.

pub mod config;
pub mod credentials;
pub mod errors;
pub mod log;
pub mod scanner;
pub mod sync_repo;

// Re-exports for convenience.
pub use config::AppConfig;
pub use credentials::{AuthRetry, Credential, CredentialBroker, KeyringStore};
pub use errors::{CoreError, CredentialError, ScanError, SyncError};
pub use log::{LogSink, Severity, SyncLogEntry};
pub use scanner::{ChangeScanner, IgnoreInheritance, ScanOptions};
pub use sync_repo::{CancelToken, PullOutcome, RepoState, SyncIdentity, SyncRepo};
