//! OS keyring backed credential store.
//!
//! Each remote endpoint maps to one keyring entry under the `dirsync`
//! service name. The username/secret pair is stored as a JSON payload so
//! a single entry carries both halves across keychain backends.

use keyring::Entry;

use crate::credentials::store::{Credential, SecureCredentialStore};
use crate::errors::CredentialError;

const SERVICE_NAME: &str = "dirsync";

/// [`SecureCredentialStore`] backed by the platform keyring
/// (Secret Service, macOS Keychain, Windows Credential Manager).
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }

    /// Store entries under a custom service name instead of `dirsync`.
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, endpoint: &str) -> Result<Entry, CredentialError> {
        Entry::new(&self.service, endpoint).map_err(|e| {
            CredentialError::Store(format!("failed to initialize keyring entry: {e}"))
        })
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SecureCredentialStore for KeyringStore {
    fn get(&self, endpoint: &str) -> Result<Credential, CredentialError> {
        let payload = match self.entry(endpoint)?.get_password() {
            Ok(payload) => payload,
            Err(keyring::Error::NoEntry) => {
                return Err(CredentialError::NotFound(endpoint.to_string()))
            }
            Err(e) => {
                return Err(CredentialError::Store(format!(
                    "keyring read failed: {e}"
                )))
            }
        };
        let credential: Credential = serde_json::from_str(&payload)?;
        Ok(credential)
    }

    fn put(&self, endpoint: &str, credential: &Credential) -> Result<(), CredentialError> {
        let payload = serde_json::to_string(credential)?;
        self.entry(endpoint)?
            .set_password(&payload)
            .map_err(|e| CredentialError::Store(format!("keyring write failed: {e}")))
    }

    fn delete(&self, endpoint: &str) -> Result<(), CredentialError> {
        match self.entry(endpoint)?.delete_password() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => {
                // Some backends report an absent entry with a generic
                // error rather than NoEntry.
                let lowered = e.to_string().to_ascii_lowercase();
                if lowered.contains("no entry")
                    || lowered.contains("not found")
                    || lowered.contains("missing")
                {
                    return Ok(());
                }
                Err(CredentialError::Store(format!(
                    "keyring delete failed: {e}"
                )))
            }
        }
    }
}
