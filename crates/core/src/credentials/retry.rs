//! Bounded retry wrapper for remote operations that may fail on a stale
//! cached credential.

use tracing::debug;

use crate::credentials::broker::CredentialBroker;
use crate::errors::{is_auth_failure, SyncError};
use crate::log::{LogSink, SyncLogEntry};

/// Hard upper bound on self-heal retries, regardless of configuration.
const MAX_AUTH_RETRIES: u32 = 2;

/// Runs a remote operation, evicting the cached credential and retrying
/// when the failure is authentication-classified.
///
/// The common stale-credential case heals in one extra attempt: the
/// eviction forces the next resolution through the interactive resolver,
/// and the retry carries the fresh credential. A failure that survives
/// the configured number of retries is authentication-fatal.
#[derive(Debug, Clone, Copy)]
pub struct AuthRetry {
    max_retries: u32,
}

impl Default for AuthRetry {
    fn default() -> Self {
        Self { max_retries: 1 }
    }
}

impl AuthRetry {
    /// Allow up to `max_retries` self-heal attempts, clamped to
    /// [`MAX_AUTH_RETRIES`].
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries: max_retries.min(MAX_AUTH_RETRIES),
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Run `operation`, retrying on authentication failure.
    ///
    /// On success the broker's most recent resolution is persisted to the
    /// secure store. On an authentication failure with secure storage
    /// disabled, or with no endpoint recorded, the failure is immediately
    /// fatal. Non-authentication failures propagate untouched.
    pub fn run<T, F>(
        &self,
        broker: &CredentialBroker,
        sink: &dyn LogSink,
        mut operation: F,
    ) -> Result<T, SyncError>
    where
        F: FnMut() -> Result<T, git2::Error>,
    {
        let mut retries_left = self.max_retries;

        loop {
            match operation() {
                Ok(value) => {
                    broker.persist_last(sink);
                    return Ok(value);
                }
                Err(e) if is_auth_failure(&e) => {
                    let endpoint = broker
                        .last_endpoint()
                        .unwrap_or_else(|| "unknown".to_string());

                    if !broker.use_secure_storage() {
                        sink.emit(SyncLogEntry::error("", e.message()));
                        return Err(SyncError::AuthenticationFailure {
                            endpoint,
                            detail: e.message().to_string(),
                        });
                    }

                    if broker.last_endpoint().is_none() {
                        sink.emit(SyncLogEntry::error("", "Unknown authentication error"));
                        return Err(SyncError::AuthenticationFailure {
                            endpoint,
                            detail: e.message().to_string(),
                        });
                    }

                    if retries_left == 0 {
                        sink.emit(SyncLogEntry::error(
                            "",
                            format!("Authentication failed: {}", e.message()),
                        ));
                        return Err(SyncError::AuthenticationFailure {
                            endpoint,
                            detail: e.message().to_string(),
                        });
                    }

                    debug!(endpoint = %endpoint, retries_left, "evicting credential after auth failure");
                    sink.emit(SyncLogEntry::error(
                        "",
                        "Authentication error. Clearing credentials and trying again.",
                    ));
                    broker.evict_last(sink);
                    retries_left -= 1;
                }
                Err(e) => {
                    sink.emit(SyncLogEntry::exception("", e.message()));
                    return Err(SyncError::Backend(e));
                }
            }
        }
    }
}
