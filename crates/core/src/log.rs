//! Severity-tagged log entries emitted by synchronization operations.
//!
//! Long-running operations (clone, fetch, push, pull) report progress and
//! outcomes as a stream of [`SyncLogEntry`] values pushed into a caller
//! supplied [`LogSink`]. This keeps the core library free of any opinion
//! about presentation: the CLI renders entries to the terminal, tests
//! collect them with [`MemorySink`], and callers that do not care pass
//! [`NullSink`].

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

/// Severity of a log entry, ordered from least to most severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
    Exception,
}

impl Severity {
    /// Parse a severity string, defaulting to `Info` for unknown values.
    pub fn from_str_val(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "warning" | "warn" => Self::Warning,
            "error" => Self::Error,
            "fatal" => Self::Fatal,
            "exception" => Self::Exception,
            _ => Self::Info,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Fatal => write!(f, "fatal"),
            Self::Exception => write!(f, "exception"),
        }
    }
}

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

/// A single timestamped log entry produced by a sync operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub severity: Severity,
    /// Short operation label, e.g. `"Fetch"` or `"Push"`. May be empty.
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl SyncLogEntry {
    /// Create an entry with an explicit severity, stamped with the
    /// current time.
    pub fn new(severity: Severity, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn trace(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Trace, title, message)
    }

    pub fn debug(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Debug, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, title, message)
    }

    pub fn fatal(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Fatal, title, message)
    }

    pub fn exception(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Exception, title, message)
    }
}

impl std::fmt::Display for SyncLogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.title.is_empty() {
            write!(f, "[{}] {}", self.severity, self.message)
        } else {
            write!(f, "[{}] {}: {}", self.severity, self.title, self.message)
        }
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Destination for log entries emitted by sync operations.
///
/// Any `Fn(SyncLogEntry)` closure is a sink, so callers can write
/// `&|entry| println!("{entry}")` instead of defining a type.
pub trait LogSink {
    fn emit(&self, entry: SyncLogEntry);
}

impl<F> LogSink for F
where
    F: Fn(SyncLogEntry),
{
    fn emit(&self, entry: SyncLogEntry) {
        self(entry)
    }
}

/// Sink that discards every entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn emit(&self, _entry: SyncLogEntry) {}
}

/// Sink that collects entries in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<SyncLogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries collected so far.
    pub fn entries(&self) -> Vec<SyncLogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Whether any collected entry has the given severity.
    pub fn has_severity(&self, severity: Severity) -> bool {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .any(|e| e.severity == severity)
    }

    /// Whether any collected entry's message contains `needle`.
    pub fn contains_message(&self, needle: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .any(|e| e.message.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn emit(&self, entry: SyncLogEntry) {
        self.entries.lock().unwrap().push(entry);
    }
}
