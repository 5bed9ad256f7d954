//! Shared styling utilities and the console log sink.

use console::Style;

use dirsync_core::log::{LogSink, Severity, SyncLogEntry};

/// Create a success-styled string (green with checkmark).
pub fn success(msg: &str) -> String {
    let style = Style::new().green();
    format!("{} {}", style.apply_to("✓"), msg)
}

/// Create an error-styled string (red with cross).
pub fn error(msg: &str) -> String {
    let style = Style::new().red();
    format!("{} {}", style.apply_to("✗"), msg)
}

/// Create a warning-styled string (yellow).
pub fn warn(msg: &str) -> String {
    let style = Style::new().yellow();
    format!("{} {}", style.apply_to("⚠"), msg)
}

/// Create a header-styled string (bold).
pub fn header(msg: &str) -> String {
    let style = Style::new().bold();
    style.apply_to(msg).to_string()
}

/// Create a dim-styled string.
pub fn dim(msg: &str) -> String {
    let style = Style::new().dim();
    style.apply_to(msg).to_string()
}

/// Sink that renders sync log entries to stderr, colored by severity.
/// Entries below the threshold are dropped.
pub struct ConsoleSink {
    threshold: Severity,
}

impl ConsoleSink {
    pub fn new(threshold: Severity) -> Self {
        Self { threshold }
    }
}

impl LogSink for ConsoleSink {
    fn emit(&self, entry: SyncLogEntry) {
        if entry.severity < self.threshold {
            return;
        }
        let style = match entry.severity {
            Severity::Trace | Severity::Debug => Style::new().dim(),
            Severity::Info => Style::new(),
            Severity::Warning => Style::new().yellow(),
            Severity::Error | Severity::Fatal | Severity::Exception => Style::new().red(),
        };
        eprintln!("{}", style.apply_to(entry));
    }
}
