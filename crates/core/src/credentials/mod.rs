//! Credential resolution, secure storage, and authentication retry.
//!
//! The resolution order is cache first, then interactive:
//! 1. Secure credential store (OS keyring), keyed by remote endpoint
//! 2. A caller supplied [`CredentialResolver`] (the CLI prompts the user)
//!
//! [`AuthRetry`] wraps remote operations so a stale cached credential is
//! evicted and re-resolved once before authentication failure is final.

pub mod broker;
pub mod keyring;
pub mod retry;
pub mod store;

pub use broker::CredentialBroker;
pub use keyring::KeyringStore;
pub use retry::AuthRetry;
pub use store::{Credential, CredentialResolver, MemoryStore, SecureCredentialStore};
