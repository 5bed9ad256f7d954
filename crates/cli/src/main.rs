//! dirsync command-line tool.
//!
//! Provides subcommands for cloning the configured remote, pushing and
//! pulling changes, inspecting status, scanning for recent edits, and
//! generating / validating configuration files.

mod prompts;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use dirsync_core::config::{AppConfig, IdentityConfig};
use dirsync_core::credentials::{CredentialBroker, KeyringStore, SecureCredentialStore};
use dirsync_core::log::Severity;
use dirsync_core::scanner::{ChangeScanner, IgnoreInheritance};
use dirsync_core::sync_repo::{PullOutcome, SyncIdentity, SyncRepo};

use render::ConsoleSink;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// dirsync command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "dirsync",
    version,
    about = "Keep a local directory in sync with a remote git repository"
)]
struct Cli {
    /// Path to the TOML configuration file. Defaults to the platform
    /// config directory.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show the full sync log stream instead of just warnings.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clone the configured remote (or an explicit URL) into place.
    Clone {
        /// Remote URL. Defaults to the configured remote.
        url: Option<String>,

        /// Target directory. Defaults to the configured repository path,
        /// or a directory named after the URL.
        path: Option<PathBuf>,
    },

    /// Commit all local changes and push them to the remote.
    Push {
        /// Push even when there is nothing to commit or the commit fails.
        #[arg(long)]
        force: bool,
    },

    /// Fetch and merge remote changes into the local directory.
    Pull,

    /// Pull remote changes, then commit and push local ones.
    Sync,

    /// Show the working tree status.
    Status {
        /// Also query the remote to report whether the branch is current.
        #[arg(long)]
        remote: bool,
    },

    /// List files modified since a point in time.
    Scan {
        /// Cutoff: an RFC 3339 timestamp or a relative spec like
        /// "90m", "24h" or "7d". Defaults to "24h".
        #[arg(short, long)]
        since: Option<String>,
    },

    /// Remove the stored credential for the configured remote.
    Forget,

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a configuration file.
    Validate,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Minimal logging for the CLI itself; the sync log stream is rendered
    // separately by the console sink.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { ref output } => cmd_init(output.clone()),
        Commands::Validate => cmd_validate(&resolve_config_path(&cli.config)?),
        Commands::Clone { ref url, ref path } => {
            cmd_clone(&cli.config, url.clone(), path.clone(), cli.verbose)
        }
        _ => {
            // All other commands need a valid configuration.
            let config = load_config(&cli.config)?;

            match cli.command {
                Commands::Push { force } => cmd_push(&config, force, cli.verbose),
                Commands::Pull => cmd_pull(&config, cli.verbose),
                Commands::Sync => cmd_sync(&config, cli.verbose),
                Commands::Status { remote } => cmd_status(&config, remote, cli.verbose),
                Commands::Scan { since } => cmd_scan(&config, since.as_deref()),
                Commands::Forget => cmd_forget(&config),
                _ => unreachable!(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn resolve_config_path(arg: &Option<PathBuf>) -> Result<PathBuf> {
    arg.clone()
        .or_else(AppConfig::default_path)
        .ok_or_else(|| anyhow::anyhow!("cannot determine a configuration file location"))
}

fn load_config(arg: &Option<PathBuf>) -> Result<AppConfig> {
    let path = resolve_config_path(arg)?;
    debug!("loading configuration from {}", path.display());
    AppConfig::load_and_validate(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

/// Load the config if the file exists; `None` when it does not. Used by
/// `clone`, which can run from explicit arguments before any config is
/// written.
fn try_load_config(arg: &Option<PathBuf>) -> Result<Option<AppConfig>> {
    let path = resolve_config_path(arg)?;
    if !path.exists() {
        debug!("no configuration at {}", path.display());
        return Ok(None);
    }
    AppConfig::load_and_validate(&path)
        .map(Some)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

fn make_broker(use_secure_storage: bool) -> CredentialBroker {
    let resolver = Box::new(prompts::PromptResolver::new());
    if use_secure_storage {
        CredentialBroker::with_store(resolver, Box::new(KeyringStore::new()))
    } else {
        CredentialBroker::new(resolver)
    }
}

fn open_repo(config: &AppConfig) -> Result<SyncRepo> {
    let broker = make_broker(config.auth.use_secure_storage);
    let repo = SyncRepo::open(&config.repo.path, config.sync_identity(), broker)
        .context("failed to open repository")?;
    Ok(repo.with_auth_retry(config.auth_retry()))
}

fn console_sink(verbose: bool) -> ConsoleSink {
    let threshold = if verbose {
        Severity::Trace
    } else {
        Severity::Warning
    };
    ConsoleSink::new(threshold)
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_clone(
    config_arg: &Option<PathBuf>,
    url: Option<String>,
    path: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let config = try_load_config(config_arg)?;

    let url = url
        .or_else(|| config.as_ref().map(|c| c.repo.remote_url.clone()))
        .ok_or_else(|| {
            anyhow::anyhow!(
                "no URL given and no configuration found; pass a URL or run 'dirsync init'"
            )
        })?;
    let target = path
        .or_else(|| config.as_ref().map(|c| c.repo.path.clone()))
        .unwrap_or_else(|| PathBuf::from(guess_target_dir(&url)));
    let identity = config
        .as_ref()
        .map(|c| c.sync_identity())
        .unwrap_or_else(|| {
            let fallback = IdentityConfig::default();
            SyncIdentity::new(fallback.name, fallback.email)
        });
    let use_secure_storage = config
        .as_ref()
        .map(|c| c.auth.use_secure_storage)
        .unwrap_or(true);

    println!("Cloning {} into {}...", url, target.display());
    let sink = console_sink(verbose);
    SyncRepo::clone(
        &url,
        &target,
        identity,
        make_broker(use_secure_storage),
        &sink,
    )
    .context("clone failed")?;

    println!(
        "{}",
        render::success(&format!("Cloned into {}", target.display()))
    );
    Ok(())
}

fn cmd_push(config: &AppConfig, force: bool, verbose: bool) -> Result<()> {
    let mut repo = open_repo(config)?;
    let sink = console_sink(verbose);

    let dirty = repo
        .is_modified()
        .context("failed to inspect working tree")?;
    repo.commit_and_push(force, &sink)
        .context("synchronization failed")?;

    if dirty {
        println!("{}", render::success("Committed and pushed local changes."));
    } else if force {
        println!("{}", render::success("Pushed current branch."));
    } else {
        println!("{}", render::dim("Nothing to commit, working tree clean."));
    }
    Ok(())
}

fn cmd_pull(config: &AppConfig, verbose: bool) -> Result<()> {
    let repo = open_repo(config)?;
    let sink = console_sink(verbose);

    match repo.pull(&sink).context("pull failed")? {
        PullOutcome::UpToDate => println!("{}", render::dim("Already up to date.")),
        PullOutcome::FastForward => {
            println!("{}", render::success("Fast-forwarded to the remote tip."))
        }
        PullOutcome::Merged => println!("{}", render::success("Merged remote changes.")),
        PullOutcome::Conflicts => {
            println!("{}", render::error("Merge conflicts detected."));
            println!("Resolve the conflicted files, then run 'dirsync push'.");
        }
    }
    Ok(())
}

fn cmd_sync(config: &AppConfig, verbose: bool) -> Result<()> {
    let mut repo = open_repo(config)?;
    let sink = console_sink(verbose);

    let outcome = repo.pull(&sink).context("pull failed")?;
    if outcome == PullOutcome::Conflicts {
        println!("{}", render::warn("Merge conflicts detected; push skipped."));
        println!("Resolve the conflicted files, then run 'dirsync push'.");
        return Ok(());
    }

    let dirty = repo
        .is_modified()
        .context("failed to inspect working tree")?;
    repo.commit_and_push(false, &sink)
        .context("synchronization failed")?;

    match (outcome, dirty) {
        (PullOutcome::UpToDate, false) => println!("{}", render::dim("Everything is in sync.")),
        (_, false) => println!("{}", render::success("Pulled remote changes.")),
        (PullOutcome::UpToDate, true) => println!("{}", render::success("Pushed local changes.")),
        (_, true) => println!("{}", render::success("Pulled and pushed changes.")),
    }
    Ok(())
}

fn cmd_status(config: &AppConfig, remote: bool, verbose: bool) -> Result<()> {
    let repo = open_repo(config)?;
    let sink = console_sink(verbose);

    println!("Repository : {}", config.repo.path.display());
    println!("Remote     : {}", config.repo.remote_url);
    println!(
        "State      : {}",
        repo.state().context("failed to read repository state")?
    );
    if remote {
        let current = repo
            .is_up_to_date(&sink)
            .context("failed to query the remote")?;
        println!("Up to date : {}", if current { "yes" } else { "no" });
    }

    println!();
    let text = repo
        .status_string(&sink)
        .context("failed to compute status")?;
    print!("{text}");
    Ok(())
}

fn cmd_scan(config: &AppConfig, since: Option<&str>) -> Result<()> {
    let cutoff = parse_since(since.unwrap_or("24h"))?;
    let scanner = ChangeScanner::with_options(config.scan_options());
    let changed = scanner
        .scan(&config.repo.path, cutoff)
        .context("scan failed")?;

    if changed.is_empty() {
        println!("No files changed since {}.", cutoff.to_rfc3339());
        return Ok(());
    }
    for path in &changed {
        println!("{}", path.display());
    }
    println!();
    println!(
        "{} file(s) changed since {}.",
        changed.len(),
        cutoff.to_rfc3339()
    );
    Ok(())
}

fn cmd_forget(config: &AppConfig) -> Result<()> {
    let store = KeyringStore::new();
    store
        .delete(&config.repo.remote_url)
        .context("failed to remove the stored credential")?;
    println!(
        "{}",
        render::success(&format!(
            "Stored credential for {} removed.",
            config.repo.remote_url
        ))
    );
    Ok(())
}

fn cmd_init(output: Option<PathBuf>) -> Result<()> {
    let default_config = r#"# dirsync configuration

[repo]
# Directory to keep in sync.
path = "/home/user/notes"
# Remote repository pushed to and pulled from.
remote_url = "https://github.com/owner/repo.git"

[identity]
name = "Your Name"
email = "you@example.com"

[auth]
# Cache credentials in the OS keychain. When false, every
# authenticated operation prompts interactively.
use_secure_storage = true
# Extra attempts after an authentication failure (capped at 2).
max_retries = 1

[scan]
# Per-directory exclusion file honored by the change scanner.
ignore_file = ".gitignore"
# How nested ignore files combine: "cumulative" or "root_only".
inheritance = "cumulative"

[log]
level = "info"
"#;

    let output = match output {
        Some(path) => path,
        None => AppConfig::default_path()
            .ok_or_else(|| anyhow::anyhow!("cannot determine a configuration file location"))?,
    };

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    std::fs::write(&output, default_config).context("failed to write config file")?;

    println!("Default configuration written to {}", output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit the config file with your directory and remote URL");
    println!(
        "  2. Validate with: dirsync validate --config {}",
        output.display()
    );
    println!("  3. Clone the remote: dirsync clone");
    println!("  4. Sync any time with: dirsync sync");

    Ok(())
}

fn cmd_validate(config_path: &PathBuf) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    let config = AppConfig::load_from_file(config_path).context("failed to parse configuration")?;
    println!("  [OK] TOML structure is valid");

    match config.validate() {
        Ok(()) => {
            println!("  [OK] All required fields are valid");
        }
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    let initialized = SyncRepo::verify(&config.repo.path);

    println!();
    println!("Configuration summary:");
    println!("  Repository path: {}", config.repo.path.display());
    println!(
        "  Repository     : {}",
        if initialized {
            "initialized"
        } else {
            "not initialized (run 'dirsync clone')"
        }
    );
    println!("  Remote URL     : {}", config.repo.remote_url);
    println!(
        "  Author         : {} <{}>",
        config.identity.name, config.identity.email
    );
    println!(
        "  Secure storage : {}",
        if config.auth.use_secure_storage {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!("  Auth retries   : {}", config.auth.max_retries);
    println!("  Ignore file    : {}", config.scan.ignore_file);
    println!(
        "  Inheritance    : {}",
        match config.scan.inheritance {
            IgnoreInheritance::Cumulative => "cumulative",
            IgnoreInheritance::RootOnly => "root_only",
        }
    );
    println!("  Log level      : {}", config.log.level);
    println!();
    println!("Configuration is valid.");

    Ok(())
}

// ---------------------------------------------------------------------------
// Utilities
// ---------------------------------------------------------------------------

/// Last path segment of a remote URL without a `.git` suffix, used as
/// the default clone directory name.
fn guess_target_dir(url: &str) -> String {
    let last = url
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or("repository");
    let name = last.trim_end_matches(".git");
    if name.is_empty() {
        "repository".to_string()
    } else {
        name.to_string()
    }
}

/// Parse a cutoff: RFC 3339 timestamps pass through, otherwise a
/// relative spec of the form `<n>m`, `<n>h` or `<n>d`.
fn parse_since(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    let (num, unit) = raw.split_at(raw.len().saturating_sub(1));
    let n: i64 = num.parse().map_err(|_| {
        anyhow::anyhow!("invalid --since '{raw}': use RFC 3339 or e.g. 90m, 24h, 7d")
    })?;
    let delta = match unit {
        "m" => Duration::minutes(n),
        "h" => Duration::hours(n),
        "d" => Duration::days(n),
        _ => anyhow::bail!("invalid --since '{raw}': use RFC 3339 or e.g. 90m, 24h, 7d"),
    };
    Ok(Utc::now() - delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_target_dir() {
        assert_eq!(
            guess_target_dir("https://github.com/acme/notes.git"),
            "notes"
        );
        assert_eq!(guess_target_dir("https://example.com/team/repo/"), "repo");
        assert_eq!(guess_target_dir("git@host:thing.git"), "thing");
    }

    #[test]
    fn test_parse_since_relative() {
        let now = Utc::now();
        let cutoff = parse_since("24h").unwrap();
        let diff = now - cutoff;
        assert!(diff >= Duration::hours(24) && diff < Duration::hours(25));

        assert!(parse_since("90m").is_ok());
        assert!(parse_since("7d").is_ok());
        assert!(parse_since("banana").is_err());
        assert!(parse_since("12w").is_err());
    }

    #[test]
    fn test_parse_since_rfc3339() {
        let cutoff = parse_since("2024-03-01T12:00:00Z").unwrap();
        assert_eq!(cutoff.to_rfc3339(), "2024-03-01T12:00:00+00:00");
    }

    #[test]
    fn test_init_template_parses_and_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dirsync.toml");

        cmd_init(Some(path.clone())).unwrap();
        let config = AppConfig::load_and_validate(&path).unwrap();
        assert_eq!(config.scan.ignore_file, ".gitignore");
        assert!(config.auth.use_secure_storage);

        // Refuses to overwrite an existing file.
        assert!(cmd_init(Some(path)).is_err());
    }
}
