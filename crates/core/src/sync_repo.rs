//! Repository synchronization controller.
//!
//! [`SyncRepo`] owns one `git2::Repository` and orchestrates the full
//! local-change cycle: stage, commit, push, fetch, pull, status and
//! up-to-date queries. Every network-touching call resolves credentials
//! through the [`CredentialBroker`] and runs under [`AuthRetry`], so a
//! stale cached credential heals itself once before failing.
//!
//! Operations are synchronous and blocking. A controller must not be
//! called concurrently: callers serialize access per repository path.
//! The underlying repository handle is released when the controller is
//! dropped.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Local;
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
    AnnotatedCommit, Cred, FetchOptions, IndexAddOption, MergeOptions, ObjectType, Oid,
    PushOptions, RemoteCallbacks, Repository, Signature, Status, StatusOptions,
};
use tracing::{debug, info, warn};

use crate::credentials::{AuthRetry, CredentialBroker};
use crate::errors::SyncError;
use crate::log::{LogSink, SyncLogEntry};

const REMOTE_NAME: &str = "origin";

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Author/committer identity for commits created by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncIdentity {
    pub name: String,
    pub email: String,
}

impl SyncIdentity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    fn signature(&self) -> Result<Signature<'static>, git2::Error> {
        Signature::now(&self.name, &self.email)
    }
}

/// Outcome of a [`SyncRepo::pull`].
///
/// `Conflicts` is a normal return, not an error: the working tree is
/// left conflict-marked for manual resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    UpToDate,
    FastForward,
    Merged,
    Conflicts,
}

impl std::fmt::Display for PullOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UpToDate => write!(f, "up_to_date"),
            Self::FastForward => write!(f, "fast_forward"),
            Self::Merged => write!(f, "merged"),
            Self::Conflicts => write!(f, "conflicts"),
        }
    }
}

/// Working-tree state, recomputed from the repository on each query.
///
/// `Conflicted` persists until external resolution returns the tree to
/// `Clean` or `Dirty` on the next read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoState {
    Clean,
    Dirty,
    Conflicted,
}

impl std::fmt::Display for RepoState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clean => write!(f, "clean"),
            Self::Dirty => write!(f, "dirty"),
            Self::Conflicted => write!(f, "conflicted"),
        }
    }
}

/// Cooperative cancellation signal for long-running network operations.
///
/// Clones share the same flag. Progress callbacks return `false` once
/// the token is set, which makes the backend abort the transfer.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// SyncRepo
// ---------------------------------------------------------------------------

/// Synchronization controller owning one repository.
pub struct SyncRepo {
    repo: Repository,
    path: PathBuf,
    identity: SyncIdentity,
    broker: CredentialBroker,
    retry: AuthRetry,
    cancel: CancelToken,
}

impl SyncRepo {
    /// Initialize a new repository at `path`.
    ///
    /// Fails with `ArgumentInvalid` when a valid repository already
    /// exists there.
    pub fn create(
        path: &Path,
        identity: SyncIdentity,
        broker: CredentialBroker,
    ) -> Result<Self, SyncError> {
        if Self::verify(path) {
            return Err(SyncError::ArgumentInvalid(format!(
                "a repository already exists at '{}'",
                path.display()
            )));
        }
        info!(path = %path.display(), "initializing repository");
        let repo = Repository::init(path)?;
        Ok(Self::assemble(repo, path, identity, broker))
    }

    /// Attach to an existing repository at `path`.
    pub fn open(
        path: &Path,
        identity: SyncIdentity,
        broker: CredentialBroker,
    ) -> Result<Self, SyncError> {
        debug!(path = %path.display(), "opening repository");
        let repo = Repository::open(path).map_err(|_| {
            SyncError::ArgumentInvalid(format!("no repository found at '{}'", path.display()))
        })?;
        Ok(Self::assemble(repo, path, identity, broker))
    }

    /// Clone `url` into `path`, streaming checkout progress to the sink.
    ///
    /// Credentials resolve through the broker, but the clone itself is
    /// not auth-retried: there is no cached state for a fresh endpoint
    /// to go stale.
    pub fn clone(
        url: &str,
        path: &Path,
        identity: SyncIdentity,
        broker: CredentialBroker,
        sink: &dyn LogSink,
    ) -> Result<Self, SyncError> {
        if path.exists() && fs::read_dir(path)?.next().is_some() {
            return Err(SyncError::ArgumentInvalid(format!(
                "clone target '{}' exists and is not empty",
                path.display()
            )));
        }
        info!(url, path = %path.display(), "cloning repository");

        let repo = {
            let broker_ref = &broker;
            let mut callbacks = RemoteCallbacks::new();
            callbacks.credentials(move |cb_url, _username_from_url, _allowed| {
                credential_callback(broker_ref, cb_url)
            });

            let mut fetch_opts = FetchOptions::new();
            fetch_opts.remote_callbacks(callbacks);

            let mut checkout = CheckoutBuilder::new();
            checkout.progress(move |file, completed, total| {
                let name = file.map(|p| p.display().to_string()).unwrap_or_default();
                sink.emit(SyncLogEntry::info(
                    "Clone",
                    format!("Checkout: {name} {completed}/{total}"),
                ));
            });

            let mut builder = RepoBuilder::new();
            builder.fetch_options(fetch_opts).with_checkout(checkout);
            builder.clone(url, path)?
        };

        info!("clone completed");
        Ok(Self::assemble(repo, path, identity, broker))
    }

    fn assemble(
        repo: Repository,
        path: &Path,
        identity: SyncIdentity,
        broker: CredentialBroker,
    ) -> Self {
        Self {
            repo,
            path: path.to_path_buf(),
            identity,
            broker,
            retry: AuthRetry::default(),
            cancel: CancelToken::new(),
        }
    }

    /// Replace the default single-retry auth policy.
    pub fn with_auth_retry(mut self, retry: AuthRetry) -> Self {
        self.retry = retry;
        self
    }

    /// Attach a cancellation token shared with the caller.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Whether `path` holds a valid repository.
    pub fn verify(path: &Path) -> bool {
        Repository::open(path).is_ok()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn identity(&self) -> &SyncIdentity {
        &self.identity
    }

    // -----------------------------------------------------------------------
    // Local operations
    // -----------------------------------------------------------------------

    /// Register a remote under `name`.
    pub fn add_remote(&self, name: &str, url: &str) -> Result<(), SyncError> {
        info!(name, url, "adding remote");
        self.repo.remote(name, url)?;
        Ok(())
    }

    /// Unstage everything, then stage the whole tree including new files
    /// and deletions.
    ///
    /// The unstage comes first so a previous partial staging never leaks
    /// into the next dirty/clean computation. Idempotent.
    pub fn stage_all(&self, sink: &dyn LogSink) -> Result<(), SyncError> {
        sink.emit(SyncLogEntry::info(
            "StageAll",
            "Adding files. (This could take a long time!)",
        ));

        let head_obj = match self.repo.head() {
            Ok(head) => Some(head.peel(ObjectType::Commit)?),
            Err(_) => None,
        };
        self.repo.reset_default(head_obj.as_ref(), ["*"].iter())?;

        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        Ok(())
    }

    /// Stage a single pathspec.
    pub fn stage(&self, pathspec: &str) -> Result<(), SyncError> {
        debug!(pathspec, "staging path");
        let mut index = self.repo.index()?;
        index.add_all([pathspec].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all([pathspec].iter(), None)?;
        index.write()?;
        Ok(())
    }

    /// Whether the working tree has any pending change relative to HEAD,
    /// excluding ignored paths.
    pub fn is_modified(&self) -> Result<bool, SyncError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut opts))?;
        Ok(!statuses.is_empty())
    }

    /// Current working-tree state.
    pub fn state(&self) -> Result<RepoState, SyncError> {
        if self.repo.index()?.has_conflicts() {
            return Ok(RepoState::Conflicted);
        }
        if self.is_modified()? {
            Ok(RepoState::Dirty)
        } else {
            Ok(RepoState::Clean)
        }
    }

    /// Short name of the current branch, even before the first commit.
    pub fn head_branch_name(&self) -> Result<String, SyncError> {
        match self.repo.head() {
            Ok(head) => Ok(head.shorthand().unwrap_or("HEAD").to_string()),
            Err(e)
                if e.code() == git2::ErrorCode::UnbornBranch
                    || e.code() == git2::ErrorCode::NotFound =>
            {
                // Unborn branch: HEAD is symbolic but points at a branch
                // with no commits yet.
                let head_ref = self.repo.find_reference("HEAD")?;
                let target = head_ref.symbolic_target().unwrap_or("refs/heads/master");
                Ok(target.strip_prefix("refs/heads/").unwrap_or(target).to_string())
            }
            Err(e) => Err(SyncError::Backend(e)),
        }
    }

    /// Git-style status report: branch header, one line per changed or
    /// ignored path, and a clean-tree note when nothing is pending.
    pub fn status_string(&self, sink: &dyn LogSink) -> Result<String, SyncError> {
        self.stage_all(sink)?;

        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(true);
        let statuses = self.repo.statuses(Some(&mut opts))?;

        let mut out = format!("On branch {}\n\n", self.head_branch_name()?);
        let mut has_changes = false;
        for entry in statuses.iter() {
            let status = entry.status();
            if !status.is_ignored() {
                has_changes = true;
            }
            let path = entry.path().unwrap_or("<non-utf8 path>");
            out.push_str(&format!("{}: {}\n", status_label(status), path));
        }
        if !has_changes {
            out.push_str("Nothing to commit, working tree clean\n");
        }
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Network operations
    // -----------------------------------------------------------------------

    /// Refresh remote refs without touching the working tree.
    pub fn fetch(&self, sink: &dyn LogSink) -> Result<(), SyncError> {
        self.check_cancelled()?;
        sink.emit(SyncLogEntry::trace("", "Fetching changes..."));

        let mut remote = self.origin()?;
        let result = self.retry.run(&self.broker, sink, || {
            let mut opts = self.fetch_options(sink);
            remote.fetch(&[] as &[&str], Some(&mut opts), None)
        });
        result.map_err(|e| self.map_cancelled(e))
    }

    /// Fetch, then compare the local branch tip with the remote tracking
    /// branch tip resolved from the remote's fetch ref-spec.
    pub fn is_up_to_date(&self, sink: &dyn LogSink) -> Result<bool, SyncError> {
        self.fetch(sink)?;

        let tracking = self.tracking_reference(sink)?;
        let remote_tip = tracking
            .peel_to_commit()
            .map_err(|_| {
                SyncError::ConfigurationMissing(
                    "remote tracking branch cannot be resolved to a commit".into(),
                )
            })?
            .id();

        sink.emit(SyncLogEntry::trace("", "Getting local branch..."));
        let local_tip = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|_| {
                SyncError::ConfigurationMissing("local branch cannot be resolved".into())
            })?
            .id();

        debug!(local = %local_tip, remote = %remote_tip, "comparing branch tips");
        Ok(local_tip == remote_tip)
    }

    /// Stage everything, commit if dirty, and push the current branch.
    ///
    /// On a clean tree the push is skipped unless `force`. A commit
    /// failure is logged and likewise only stops the push when `force`
    /// is off.
    pub fn commit_and_push(&mut self, force: bool, sink: &dyn LogSink) -> Result<(), SyncError> {
        self.check_cancelled()?;
        self.stage_all(sink)?;

        if self.is_modified()? {
            let message = format!(
                "Auto commit at {}",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            );
            match self.commit(&message) {
                Ok(oid) => debug!(sha = %oid, "created sync commit"),
                Err(e) => {
                    sink.emit(SyncLogEntry::exception("Commit", e.message()));
                    if !force {
                        return Ok(());
                    }
                }
            }
        } else {
            sink.emit(SyncLogEntry::info(
                "Commit",
                "Nothing to commit, working tree clean",
            ));
            if !force {
                return Ok(());
            }
        }

        self.push(sink)
    }

    /// Stage, fetch and merge the remote tracking branch, classifying
    /// the result.
    ///
    /// Conflicts leave the working tree conflict-marked for manual
    /// resolution and are reported as an outcome, not an error.
    pub fn pull(&self, sink: &dyn LogSink) -> Result<PullOutcome, SyncError> {
        self.check_cancelled()?;
        self.stage_all(sink)?;
        self.fetch(sink)?;

        let tracking = self.tracking_reference(sink)?;
        let annotated = self.repo.reference_to_annotated_commit(&tracking)?;
        let merge_message = format!(
            "Merge remote-tracking branch '{}'",
            tracking.shorthand().unwrap_or(REMOTE_NAME)
        );
        let (analysis, _preference) = self.repo.merge_analysis(&[&annotated])?;

        if analysis.is_up_to_date() {
            sink.emit(SyncLogEntry::info("Pull", "Already up to date."));
            return Ok(PullOutcome::UpToDate);
        }

        if analysis.is_fast_forward() || analysis.is_unborn() {
            self.fast_forward(&annotated)?;
            sink.emit(SyncLogEntry::info("Pull", "Fast forward merge."));
            return Ok(PullOutcome::FastForward);
        }

        let mut checkout = CheckoutBuilder::new();
        checkout.allow_conflicts(true).conflict_style_merge(true);
        self.repo
            .merge(&[&annotated], Some(&mut MergeOptions::new()), Some(&mut checkout))?;

        let mut index = self.repo.index()?;
        if index.has_conflicts() {
            sink.emit(SyncLogEntry::error(
                "Pull",
                "Conflicts detected, please resolve them.",
            ));
            return Ok(PullOutcome::Conflicts);
        }

        let tree = self.repo.find_tree(index.write_tree()?)?;
        let signature = self.identity.signature()?;
        let head_commit = self.repo.head()?.peel_to_commit()?;
        let fetched_commit = self.repo.find_commit(annotated.id())?;
        self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            &merge_message,
            &tree,
            &[&head_commit, &fetched_commit],
        )?;
        self.repo.cleanup_state()?;

        sink.emit(SyncLogEntry::info("Pull", "Merge completed."));
        Ok(PullOutcome::Merged)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn commit(&mut self, message: &str) -> Result<Oid, git2::Error> {
        // An interrupted merge leaves MERGE_HEAD behind; the resolution
        // commit must carry it as a second parent. Collected up front:
        // `mergehead_foreach` needs the repository mutably, which the
        // tree and parent commit handles below would otherwise block.
        let mut merge_heads = Vec::new();
        if self.repo.state() == git2::RepositoryState::Merge {
            self.repo.mergehead_foreach(|oid| {
                merge_heads.push(*oid);
                true
            })?;
        }

        let mut index = self.repo.index()?;
        let tree = self.repo.find_tree(index.write_tree()?)?;
        let signature = self.identity.signature()?;

        let mut parents: Vec<git2::Commit> = Vec::new();
        if let Ok(head) = self.repo.head() {
            parents.push(head.peel_to_commit()?);
        }
        for oid in merge_heads {
            parents.push(self.repo.find_commit(oid)?);
        }
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parent_refs)?;
        if self.repo.state() != git2::RepositoryState::Clean {
            self.repo.cleanup_state()?;
        }
        info!(sha = %oid, "created commit");
        Ok(oid)
    }

    fn push(&self, sink: &dyn LogSink) -> Result<(), SyncError> {
        let branch = self.head_branch_name()?;
        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        info!(branch = %branch, "pushing to origin");

        let mut remote = self.origin()?;
        let rejection = Arc::new(Mutex::new(None::<String>));

        let result = self.retry.run(&self.broker, sink, || {
            let mut callbacks = self.base_callbacks(sink);
            callbacks.push_transfer_progress(move |current, total, bytes| {
                sink.emit(SyncLogEntry::info(
                    "Push",
                    format!("{current}/{total} ({bytes} bytes)"),
                ));
            });
            callbacks.pack_progress(move |stage, current, total| {
                sink.emit(SyncLogEntry::info(
                    "Push/Pack",
                    format!("{stage:?}: {current}/{total}"),
                ));
            });
            let slot = rejection.clone();
            callbacks.push_update_reference(move |refname, status| {
                if let Some(msg) = status {
                    warn!(refname, msg, "push rejected by remote");
                    sink.emit(SyncLogEntry::error("Push status", msg));
                    *slot.lock().unwrap() = Some(msg.to_string());
                }
                Ok(())
            });

            let mut opts = PushOptions::new();
            opts.remote_callbacks(callbacks);
            remote.push(&[&refspec], Some(&mut opts))?;

            // The remote can accept the connection yet reject the ref.
            if let Some(msg) = rejection.lock().unwrap().take() {
                return Err(git2::Error::new(
                    git2::ErrorCode::GenericError,
                    git2::ErrorClass::Net,
                    format!("push rejected for branch '{branch}': {msg}"),
                ));
            }
            Ok(())
        });
        result.map_err(|e| self.map_cancelled(e))
    }

    /// Resolve the remote tracking reference for the current branch from
    /// the remote's first fetch ref-spec, the way `origin/HEAD` style
    /// wildcards are expanded.
    fn tracking_reference(&self, sink: &dyn LogSink) -> Result<git2::Reference<'_>, SyncError> {
        sink.emit(SyncLogEntry::trace("", "Getting remote origin..."));
        let remote = self.origin()?;

        sink.emit(SyncLogEntry::trace("", "Getting refspec..."));
        let refspecs = remote.fetch_refspecs()?;
        let refspec = refspecs.get(0).ok_or_else(|| {
            SyncError::ConfigurationMissing(format!(
                "remote '{REMOTE_NAME}' has no fetch refspec"
            ))
        })?;
        let dst = refspec.split(':').nth(1).ok_or_else(|| {
            SyncError::ConfigurationMissing(format!(
                "fetch refspec '{refspec}' has no destination"
            ))
        })?;

        sink.emit(SyncLogEntry::trace("", "Getting ref name..."));
        let ref_name = dst.replace('*', &self.head_branch_name()?);
        self.repo.find_reference(&ref_name).map_err(|_| {
            SyncError::ConfigurationMissing(format!(
                "remote tracking reference '{ref_name}' not found"
            ))
        })
    }

    fn fast_forward(&self, target: &AnnotatedCommit<'_>) -> Result<(), SyncError> {
        match self.repo.head() {
            Ok(head) => {
                let refname = head.name().unwrap_or("HEAD").to_string();
                let mut reference = self.repo.find_reference(&refname)?;
                reference.set_target(target.id(), "pull: fast-forward")?;
                self.repo.set_head(&refname)?;
            }
            Err(_) => {
                // First pull into an unborn branch: create the local
                // branch directly at the fetched tip.
                let head_ref = self.repo.find_reference("HEAD")?;
                let refname = head_ref
                    .symbolic_target()
                    .unwrap_or("refs/heads/master")
                    .to_string();
                self.repo
                    .reference(&refname, target.id(), true, "pull: initial checkout")?;
                self.repo.set_head(&refname)?;
            }
        }
        self.repo
            .checkout_head(Some(CheckoutBuilder::new().force()))?;
        Ok(())
    }

    fn origin(&self) -> Result<git2::Remote<'_>, SyncError> {
        self.repo.find_remote(REMOTE_NAME).map_err(|_| {
            SyncError::ConfigurationMissing(format!("no remote named '{REMOTE_NAME}'"))
        })
    }

    /// Shared callbacks: credential resolution plus cancellable sideband
    /// progress.
    fn base_callbacks<'a>(&'a self, sink: &'a dyn LogSink) -> RemoteCallbacks<'a> {
        let mut callbacks = RemoteCallbacks::new();
        let broker = &self.broker;
        callbacks.credentials(move |url, _username_from_url, _allowed| {
            credential_callback(broker, url)
        });

        let cancel = &self.cancel;
        callbacks.sideband_progress(move |data| {
            if cancel.is_cancelled() {
                return false;
            }
            let text = String::from_utf8_lossy(data);
            let text = text.trim();
            if !text.is_empty() {
                sink.emit(SyncLogEntry::trace("Remote", text));
            }
            true
        });
        callbacks
    }

    fn fetch_options<'a>(&'a self, sink: &'a dyn LogSink) -> FetchOptions<'a> {
        let mut callbacks = self.base_callbacks(sink);

        let cancel = &self.cancel;
        callbacks.transfer_progress(move |progress| {
            if cancel.is_cancelled() {
                return false;
            }
            sink.emit(SyncLogEntry::info(
                "Fetch",
                format!(
                    "{}/{} ({} bytes)",
                    progress.received_objects(),
                    progress.total_objects(),
                    progress.received_bytes()
                ),
            ));
            true
        });
        callbacks.update_tips(move |refname, old, new| {
            sink.emit(SyncLogEntry::info("Fetch", format!("{refname} {old} -> {new}")));
            true
        });

        let mut opts = FetchOptions::new();
        opts.remote_callbacks(callbacks);
        opts
    }

    fn check_cancelled(&self) -> Result<(), SyncError> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        Ok(())
    }

    fn map_cancelled(&self, err: SyncError) -> SyncError {
        if self.cancel.is_cancelled() {
            SyncError::Cancelled
        } else {
            err
        }
    }
}

impl std::fmt::Debug for SyncRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncRepo")
            .field("path", &self.path)
            .field("identity", &self.identity)
            .finish()
    }
}

fn credential_callback(broker: &CredentialBroker, url: &str) -> Result<Cred, git2::Error> {
    match broker.resolve(url) {
        Ok(cred) => Cred::userpass_plaintext(&cred.username, &cred.secret),
        Err(e) => Err(git2::Error::new(
            git2::ErrorCode::User,
            git2::ErrorClass::Callback,
            format!("credential resolution failed: {e}"),
        )),
    }
}

fn status_label(status: Status) -> &'static str {
    if status.is_conflicted() {
        "conflicted"
    } else if status.is_ignored() {
        "ignored"
    } else if status.is_index_new() || status.is_wt_new() {
        "new"
    } else if status.is_index_modified() || status.is_wt_modified() {
        "modified"
    } else if status.is_index_deleted() || status.is_wt_deleted() {
        "deleted"
    } else if status.is_index_renamed() || status.is_wt_renamed() {
        "renamed"
    } else if status.is_index_typechange() || status.is_wt_typechange() {
        "typechange"
    } else {
        "unchanged"
    }
}
