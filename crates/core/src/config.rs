//! TOML-based configuration for dirsync.
//!
//! The file intentionally contains no secrets: credentials live in the
//! operating system keychain (see [`crate::credentials`]) and are only
//! referenced here through the `use_secure_storage` switch.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::credentials::AuthRetry;
use crate::errors::ConfigError;
use crate::scanner::{IgnoreInheritance, ScanOptions};
use crate::sync_repo::SyncIdentity;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Repository location and remote.
    pub repo: RepoConfig,

    /// Commit author identity.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Credential storage and retry settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Change scanner settings.
    #[serde(default)]
    pub scan: ScanConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Local repository path and its remote counterpart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Directory kept in sync (e.g. `/home/user/notes`).
    pub path: PathBuf,

    /// Remote URL pushed to and pulled from.
    pub remote_url: String,
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Name and email stamped on commits created by the tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Author name. Defaults to the login user.
    #[serde(default = "default_user_name")]
    pub name: String,

    /// Author email. Defaults to `<name>@localhost`.
    #[serde(default = "default_user_email")]
    pub email: String,
}

fn default_user_name() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "dirsync".into())
}
fn default_user_email() -> String {
    format!("{}@localhost", default_user_name())
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: default_user_name(),
            email: default_user_email(),
        }
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Credential storage and authentication retry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Cache credentials in the OS keychain (default true). When off,
    /// every authenticated operation prompts interactively.
    #[serde(default = "default_true")]
    pub use_secure_storage: bool,

    /// Extra attempts after an authentication failure (default 1,
    /// capped at 2).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_true() -> bool {
    true
}
fn default_max_retries() -> u32 {
    1
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            use_secure_storage: true,
            max_retries: default_max_retries(),
        }
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Change scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Per-directory exclusion file name (default `.gitignore`).
    #[serde(default = "default_ignore_file")]
    pub ignore_file: String,

    /// How nested ignore files combine: `cumulative` or `root_only`.
    #[serde(default)]
    pub inheritance: IgnoreInheritance,
}

fn default_ignore_file() -> String {
    ".gitignore".into()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ignore_file: default_ignore_file(),
            inheritance: IgnoreInheritance::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Save this configuration to a TOML file, creating parent
    /// directories as needed.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "saving configuration");

        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Platform config location: `<config dir>/dirsync/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("dirsync").join("config.toml"))
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repo.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "repo.path".into(),
                detail: "repository path must not be empty".into(),
            });
        }
        if self.repo.remote_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "repo.remote_url".into(),
                detail: "remote URL must not be empty".into(),
            });
        }
        if self.identity.name.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "identity.name".into(),
                detail: "author name must not be empty".into(),
            });
        }
        if !self.identity.email.contains('@') {
            return Err(ConfigError::InvalidValue {
                field: "identity.email".into(),
                detail: "author email must contain '@'".into(),
            });
        }
        if self.scan.ignore_file.is_empty() || self.scan.ignore_file.contains('/') {
            return Err(ConfigError::InvalidValue {
                field: "scan.ignore_file".into(),
                detail: "ignore file must be a bare file name".into(),
            });
        }
        if !matches!(
            self.log.level.as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(ConfigError::InvalidValue {
                field: "log.level".into(),
                detail: format!("unknown log level '{}'", self.log.level),
            });
        }

        Ok(())
    }

    /// Convenience: load and validate in one call.
    pub fn load_and_validate<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Commit identity derived from this configuration.
    pub fn sync_identity(&self) -> SyncIdentity {
        SyncIdentity::new(&self.identity.name, &self.identity.email)
    }

    /// Scanner options derived from this configuration.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            ignore_file_name: self.scan.ignore_file.clone(),
            inheritance: self.scan.inheritance,
        }
    }

    /// Retry policy derived from this configuration.
    pub fn auth_retry(&self) -> AuthRetry {
        AuthRetry::new(self.auth.max_retries)
    }
}
