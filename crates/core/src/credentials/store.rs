//! Credential value type plus the storage and resolution traits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::errors::CredentialError;

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// A username/secret pair for authenticating against a remote endpoint.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    pub secret: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }
}

// The secret must never end up in logs through `{:?}`.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Persistent credential storage keyed by remote endpoint URL.
pub trait SecureCredentialStore {
    /// Look up the credential stored for `endpoint`.
    ///
    /// Returns [`CredentialError::NotFound`] when nothing is stored.
    fn get(&self, endpoint: &str) -> Result<Credential, CredentialError>;

    /// Store (or overwrite) the credential for `endpoint`.
    fn put(&self, endpoint: &str, credential: &Credential) -> Result<(), CredentialError>;

    /// Remove the credential for `endpoint`. Deleting an absent entry is
    /// not an error.
    fn delete(&self, endpoint: &str) -> Result<(), CredentialError>;

    /// Whether a credential is stored for `endpoint`.
    fn exists(&self, endpoint: &str) -> bool {
        self.get(endpoint).is_ok()
    }
}

/// Source of fresh credentials when the store has none.
///
/// Any `Fn(&str) -> Result<Credential, CredentialError>` closure is a
/// resolver, which keeps tests and embedding applications short.
pub trait CredentialResolver {
    fn resolve(&self, endpoint: &str) -> Result<Credential, CredentialError>;
}

impl<F> CredentialResolver for F
where
    F: Fn(&str) -> Result<Credential, CredentialError>,
{
    fn resolve(&self, endpoint: &str) -> Result<Credential, CredentialError> {
        self(endpoint)
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// In-memory [`SecureCredentialStore`] with operation counters.
///
/// Used by tests and by embedders that want caching without touching the
/// OS keyring. Clones share the same underlying map.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    entries: Mutex<HashMap<String, Credential>>,
    gets: AtomicUsize,
    puts: AtomicUsize,
    deletes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_count(&self) -> usize {
        self.inner.gets.load(Ordering::SeqCst)
    }

    pub fn put_count(&self) -> usize {
        self.inner.puts.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.inner.deletes.load(Ordering::SeqCst)
    }
}

impl SecureCredentialStore for MemoryStore {
    fn get(&self, endpoint: &str) -> Result<Credential, CredentialError> {
        self.inner.gets.fetch_add(1, Ordering::SeqCst);
        self.inner
            .entries
            .lock()
            .unwrap()
            .get(endpoint)
            .cloned()
            .ok_or_else(|| CredentialError::NotFound(endpoint.to_string()))
    }

    fn put(&self, endpoint: &str, credential: &Credential) -> Result<(), CredentialError> {
        self.inner.puts.fetch_add(1, Ordering::SeqCst);
        self.inner
            .entries
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), credential.clone());
        Ok(())
    }

    fn delete(&self, endpoint: &str) -> Result<(), CredentialError> {
        self.inner.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.entries.lock().unwrap().remove(endpoint);
        Ok(())
    }
}
