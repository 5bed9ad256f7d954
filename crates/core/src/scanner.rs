//! Recursive change scanner.
//!
//! Walks a directory tree and returns the files modified after a cutoff
//! time, honoring gitignore-style exclusion files found along the way.
//! Each directory that carries an ignore file opens a new pattern scope
//! for its subtree; how that scope combines with the rules above it is
//! controlled by [`IgnoreInheritance`].

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use glob_match::glob_match;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::errors::ScanError;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How a subdirectory's ignore file combines with rules from above.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreInheritance {
    /// A subdirectory's scope is the top-level rules plus its own file.
    /// Rules from intermediate ancestors are dropped.
    RootOnly,
    /// A subdirectory's scope is everything inherited so far plus its own
    /// file. This matches how git itself layers ignore files.
    #[default]
    Cumulative,
}

/// Scanner configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Name of the per-directory exclusion file.
    pub ignore_file_name: String,
    pub inheritance: IgnoreInheritance,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            ignore_file_name: ".gitignore".to_string(),
            inheritance: IgnoreInheritance::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Ignore scope
// ---------------------------------------------------------------------------

/// One pattern line from an ignore file, pre-anchored to the directory
/// the file lives in so inherited rules keep their original meaning.
#[derive(Debug, Clone)]
struct IgnoreRule {
    pattern: String,
    negated: bool,
    dir_only: bool,
}

/// The set of rules active for one directory during the walk.
#[derive(Debug, Clone, Default)]
struct IgnoreScope {
    rules: Vec<IgnoreRule>,
    /// The top-level directory's own rules, kept for
    /// [`IgnoreInheritance::RootOnly`] scope rebuilding.
    root_rules: Vec<IgnoreRule>,
}

impl IgnoreScope {
    /// Scope for the scan root itself.
    fn root(text: &str) -> Self {
        let rules = Self::parse_rules("", text);
        Self {
            root_rules: rules.clone(),
            rules,
        }
    }

    /// Scope for a subdirectory carrying its own ignore file.
    fn derive(&self, base: &str, text: &str, inheritance: IgnoreInheritance) -> Self {
        let mut rules = match inheritance {
            IgnoreInheritance::Cumulative => self.rules.clone(),
            IgnoreInheritance::RootOnly => self.root_rules.clone(),
        };
        rules.extend(Self::parse_rules(base, text));
        Self {
            rules,
            root_rules: self.root_rules.clone(),
        }
    }

    fn parse_rules(base: &str, text: &str) -> Vec<IgnoreRule> {
        text.lines()
            .filter_map(|line| Self::parse_line(base, line))
            .collect()
    }

    /// Parse one ignore line. Returns `None` for blanks and comments.
    ///
    /// Gitignore anchoring rules: a pattern containing a slash (or
    /// starting with one) is anchored to the directory of the ignore
    /// file; otherwise it matches at any depth below it. A trailing
    /// slash restricts the pattern to directories.
    fn parse_line(base: &str, line: &str) -> Option<IgnoreRule> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let (negated, line) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let (dir_only, line) = match line.strip_suffix('/') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        if line.is_empty() {
            return None;
        }

        let anchored = line.starts_with('/') || line.contains('/');
        let line = line.strip_prefix('/').unwrap_or(line);

        let pattern = match (anchored, base.is_empty()) {
            (true, true) => line.to_string(),
            (true, false) => format!("{base}/{line}"),
            (false, true) => format!("**/{line}"),
            (false, false) => format!("{base}/**/{line}"),
        };

        Some(IgnoreRule {
            pattern,
            negated,
            dir_only,
        })
    }

    /// Whether `rel_path` is excluded by this scope. Later rules override
    /// earlier ones, so negations re-include previously ignored paths.
    fn is_ignored(&self, rel_path: &str, is_dir: bool) -> bool {
        let path = rel_path.replace('\\', "/");
        let mut ignored = false;
        for rule in &self.rules {
            if rule.dir_only && !is_dir {
                continue;
            }
            if glob_match(&rule.pattern, &path) {
                ignored = !rule.negated;
            }
        }
        ignored
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Walks a tree and reports files whose modification time is strictly
/// after a cutoff.
///
/// Ignored directories are pruned without descending, so a large
/// excluded subtree (a build directory, say) costs nothing. Results are
/// root-relative paths in deterministic walk order: subdirectories
/// first, sorted by name, then the files of each directory.
#[derive(Debug, Clone, Default)]
pub struct ChangeScanner {
    options: ScanOptions,
}

impl ChangeScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Scan `root` for files modified strictly after `cutoff`.
    pub fn scan(&self, root: &Path, cutoff: DateTime<Utc>) -> Result<Vec<PathBuf>, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::RootNotFound(root.to_path_buf()));
        }
        debug!(root = %root.display(), %cutoff, "scanning for modified files");

        let mut modified = Vec::new();
        self.scan_dir(root, Path::new(""), &IgnoreScope::default(), cutoff, &mut modified)?;
        debug!(count = modified.len(), "scan complete");
        Ok(modified)
    }

    fn scan_dir(
        &self,
        root: &Path,
        rel_dir: &Path,
        inherited: &IgnoreScope,
        cutoff: DateTime<Utc>,
        out: &mut Vec<PathBuf>,
    ) -> Result<(), ScanError> {
        let abs = root.join(rel_dir);

        let ignore_path = abs.join(&self.options.ignore_file_name);
        let derived;
        let scope = if ignore_path.is_file() {
            let text = fs::read_to_string(&ignore_path).map_err(|e| ScanError::Io {
                path: ignore_path.clone(),
                source: e,
            })?;
            derived = if rel_dir.as_os_str().is_empty() {
                IgnoreScope::root(&text)
            } else {
                inherited.derive(&rel_str(rel_dir), &text, self.options.inheritance)
            };
            &derived
        } else {
            inherited
        };

        let mut dirs = Vec::new();
        let mut files = Vec::new();
        let reader = fs::read_dir(&abs).map_err(|e| ScanError::Io {
            path: abs.clone(),
            source: e,
        })?;
        for entry in reader {
            let entry = entry.map_err(|e| ScanError::Io {
                path: abs.clone(),
                source: e,
            })?;
            let file_type = entry.file_type().map_err(|e| ScanError::Io {
                path: entry.path(),
                source: e,
            })?;
            if file_type.is_dir() {
                dirs.push(entry);
            } else {
                files.push(entry);
            }
        }
        dirs.sort_by_key(|e| e.file_name());
        files.sort_by_key(|e| e.file_name());

        for entry in &dirs {
            let rel = rel_dir.join(entry.file_name());
            if scope.is_ignored(&rel_str(&rel), true) {
                trace!(path = %rel.display(), "pruning ignored directory");
                continue;
            }
            self.scan_dir(root, &rel, scope, cutoff, out)?;
        }

        for entry in &files {
            let rel = rel_dir.join(entry.file_name());
            if scope.is_ignored(&rel_str(&rel), false) {
                continue;
            }
            let metadata = entry.metadata().map_err(|e| ScanError::Io {
                path: entry.path(),
                source: e,
            })?;
            let modified_at: DateTime<Utc> = metadata
                .modified()
                .map_err(|e| ScanError::Io {
                    path: entry.path(),
                    source: e,
                })?
                .into();
            if modified_at > cutoff {
                out.push(rel);
            }
        }

        Ok(())
    }
}

/// Root-relative path as a forward-slash string for pattern matching.
fn rel_str(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
