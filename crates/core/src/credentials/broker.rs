//! Cache-first credential broker.

use std::sync::Mutex;

use tracing::{debug, warn};

use crate::credentials::store::{Credential, CredentialResolver, SecureCredentialStore};
use crate::errors::CredentialError;
use crate::log::{LogSink, SyncLogEntry};

/// Resolves credentials for remote endpoints, consulting the secure
/// store before falling back to the interactive resolver.
///
/// The broker remembers the most recent resolution so the operation
/// wrapper can persist it after success or evict it after an
/// authentication failure. The remembered pair survives across
/// operations, matching how a long-lived sync session behaves.
pub struct CredentialBroker {
    store: Option<Box<dyn SecureCredentialStore + Send + Sync>>,
    resolver: Box<dyn CredentialResolver + Send + Sync>,
    last: Mutex<Option<LastResolution>>,
}

#[derive(Clone)]
struct LastResolution {
    endpoint: String,
    credential: Credential,
}

impl CredentialBroker {
    /// Broker without secure storage: every resolution goes through the
    /// resolver.
    pub fn new(resolver: Box<dyn CredentialResolver + Send + Sync>) -> Self {
        Self {
            store: None,
            resolver,
            last: Mutex::new(None),
        }
    }

    /// Broker that consults `store` before the resolver.
    pub fn with_store(
        resolver: Box<dyn CredentialResolver + Send + Sync>,
        store: Box<dyn SecureCredentialStore + Send + Sync>,
    ) -> Self {
        Self {
            store: Some(store),
            resolver,
            last: Mutex::new(None),
        }
    }

    /// Whether a secure store is attached.
    pub fn use_secure_storage(&self) -> bool {
        self.store.is_some()
    }

    /// Endpoint of the most recent resolution, if any.
    pub fn last_endpoint(&self) -> Option<String> {
        self.last
            .lock()
            .unwrap()
            .as_ref()
            .map(|l| l.endpoint.clone())
    }

    /// Resolve a credential for `endpoint`: stored value first, then the
    /// resolver. A store read failure is not fatal, it just forces the
    /// resolver path.
    pub fn resolve(&self, endpoint: &str) -> Result<Credential, CredentialError> {
        if let Some(store) = &self.store {
            match store.get(endpoint) {
                Ok(credential) => {
                    debug!(endpoint, "using stored credential");
                    self.remember(endpoint, &credential);
                    return Ok(credential);
                }
                Err(CredentialError::NotFound(_)) => {}
                Err(e) => {
                    warn!(endpoint, error = %e, "secure store read failed, falling back to resolver");
                }
            }
        }

        let credential = self.resolver.resolve(endpoint)?;
        self.remember(endpoint, &credential);
        Ok(credential)
    }

    /// Persist the most recent resolution into the secure store.
    ///
    /// Failures are reported on the sink and swallowed: a broken keyring
    /// must not fail an otherwise successful sync.
    pub fn persist_last(&self, sink: &dyn LogSink) {
        let Some(store) = &self.store else { return };
        let last = self.last.lock().unwrap().clone();
        let Some(last) = last else { return };

        if let Err(e) = store.put(&last.endpoint, &last.credential) {
            warn!(endpoint = %last.endpoint, error = %e, "failed to persist credential");
            sink.emit(SyncLogEntry::warning(
                "Credentials",
                format!("Failed to save credentials: {e}"),
            ));
        }
    }

    /// Remove the stored credential for the most recent endpoint.
    ///
    /// Used after an authentication failure so the next resolution must
    /// produce a fresh credential. Failures are reported and swallowed.
    pub fn evict_last(&self, sink: &dyn LogSink) {
        let Some(store) = &self.store else { return };
        let Some(endpoint) = self.last_endpoint() else {
            return;
        };

        if let Err(e) = store.delete(&endpoint) {
            warn!(endpoint = %endpoint, error = %e, "failed to evict credential");
            sink.emit(SyncLogEntry::warning(
                "Credentials",
                format!("Failed to clear credentials: {e}"),
            ));
        }
    }

    fn remember(&self, endpoint: &str, credential: &Credential) {
        *self.last.lock().unwrap() = Some(LastResolution {
            endpoint: endpoint.to_string(),
            credential: credential.clone(),
        });
    }
}

impl std::fmt::Debug for CredentialBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialBroker")
            .field("use_secure_storage", &self.use_secure_storage())
            .field("last_endpoint", &self.last_endpoint())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::store::MemoryStore;
    use crate::log::NullSink;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const ENDPOINT: &str = "https://example.com/team/repo.git";

    fn counting_resolver(
        counter: Arc<AtomicUsize>,
        username: &'static str,
        secret: &'static str,
    ) -> Box<dyn CredentialResolver + Send + Sync> {
        Box::new(move |_endpoint: &str| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Credential::new(username, secret))
        })
    }

    #[test]
    fn test_stored_credential_wins_over_resolver() {
        let calls = Arc::new(AtomicUsize::new(0));
        let store = MemoryStore::new();
        store
            .put(ENDPOINT, &Credential::new("alice", "cached"))
            .unwrap();

        let broker = CredentialBroker::with_store(
            counting_resolver(calls.clone(), "alice", "fresh"),
            Box::new(store),
        );

        let cred = broker.resolve(ENDPOINT).unwrap();
        assert_eq!(cred.secret, "cached");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(broker.last_endpoint().as_deref(), Some(ENDPOINT));
    }

    #[test]
    fn test_cache_miss_falls_back_to_resolver() {
        let calls = Arc::new(AtomicUsize::new(0));
        let broker = CredentialBroker::with_store(
            counting_resolver(calls.clone(), "alice", "fresh"),
            Box::new(MemoryStore::new()),
        );

        let cred = broker.resolve(ENDPOINT).unwrap();
        assert_eq!(cred.secret, "fresh");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_without_store_always_resolves() {
        let calls = Arc::new(AtomicUsize::new(0));
        let broker = CredentialBroker::new(counting_resolver(calls.clone(), "alice", "fresh"));

        broker.resolve(ENDPOINT).unwrap();
        broker.resolve(ENDPOINT).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(!broker.use_secure_storage());
    }

    #[test]
    fn test_persist_last_writes_store() {
        let store = MemoryStore::new();
        let broker = CredentialBroker::with_store(
            Box::new(|_: &str| Ok(Credential::new("alice", "fresh"))),
            Box::new(store.clone()),
        );

        broker.resolve(ENDPOINT).unwrap();
        assert!(!store.exists(ENDPOINT));

        broker.persist_last(&NullSink);
        assert_eq!(store.get(ENDPOINT).unwrap().secret, "fresh");
    }

    #[test]
    fn test_evict_last_deletes_store_entry() {
        let store = MemoryStore::new();
        store
            .put(ENDPOINT, &Credential::new("alice", "stale"))
            .unwrap();

        let broker = CredentialBroker::with_store(
            Box::new(|_: &str| Ok(Credential::new("alice", "fresh"))),
            Box::new(store.clone()),
        );

        broker.resolve(ENDPOINT).unwrap();
        broker.evict_last(&NullSink);
        assert!(!store.exists(ENDPOINT));
    }

    #[test]
    fn test_persist_and_evict_without_resolution_are_no_ops() {
        let store = MemoryStore::new();
        let broker = CredentialBroker::with_store(
            Box::new(|_: &str| Ok(Credential::new("alice", "fresh"))),
            Box::new(store.clone()),
        );

        broker.persist_last(&NullSink);
        broker.evict_last(&NullSink);
        assert_eq!(store.put_count(), 0);
        assert_eq!(store.delete_count(), 0);
    }

    #[test]
    fn test_resolver_error_propagates() {
        let broker = CredentialBroker::new(Box::new(|_: &str| {
            Err(CredentialError::ResolverAborted("dismissed".into()))
        }));

        let err = broker.resolve(ENDPOINT).unwrap_err();
        assert!(matches!(err, CredentialError::ResolverAborted(_)));
        assert!(broker.last_endpoint().is_none());
    }
}
