//! End-to-end tests for the repository sync controller.
//!
//! These tests exercise the real `SyncRepo` with:
//! - Local bare repositories acting as "origin" for pushes and pulls
//! - A second working clone simulating another machine
//! - In-memory log sinks for asserting the emitted stream
//!
//! No network I/O: remotes are plain local paths, so the credential
//! callback is never invoked and the broker can use a fixed resolver.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use dirsync_core::credentials::{Credential, CredentialBroker};
use dirsync_core::log::{MemorySink, NullSink, Severity};
use dirsync_core::sync_repo::{PullOutcome, RepoState, SyncIdentity, SyncRepo};
use dirsync_core::SyncError;

// ===========================================================================
// Helpers
// ===========================================================================

fn test_broker() -> CredentialBroker {
    CredentialBroker::new(Box::new(|_: &str| Ok(Credential::new("user", "token"))))
}

fn test_identity() -> SyncIdentity {
    SyncIdentity::new("Test User", "test@example.com")
}

/// Create a bare origin plus a working repo with one pushed seed commit.
/// Returns the bare path and the working controller.
fn seed_origin(tmp: &Path) -> (PathBuf, SyncRepo) {
    let bare_dir = tmp.join("origin.git");
    git2::Repository::init_bare(&bare_dir).expect("failed to init bare repo");

    let work_dir = tmp.join("work");
    let mut repo = SyncRepo::create(&work_dir, test_identity(), test_broker())
        .expect("failed to init work repo");
    repo.add_remote("origin", bare_dir.to_str().unwrap())
        .expect("failed to add origin remote");

    std::fs::write(work_dir.join("seed.txt"), "seed content\n").unwrap();
    repo.commit_and_push(false, &NullSink)
        .expect("failed to push seed commit");

    (bare_dir, repo)
}

fn clone_from(bare_dir: &Path, target: &Path) -> SyncRepo {
    SyncRepo::clone(
        bare_dir.to_str().unwrap(),
        target,
        SyncIdentity::new("Other User", "other@example.com"),
        test_broker(),
        &NullSink,
    )
    .expect("clone failed")
}

/// Commit a file in a working repo directly, bypassing the controller.
/// Simulates edits made by another writer.
fn commit_in(repo_path: &Path, filename: &str, content: &str, message: &str) -> git2::Oid {
    let repo = git2::Repository::open(repo_path).unwrap();
    std::fs::write(repo_path.join(filename), content).unwrap();

    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.update_all(["*"].iter(), None).unwrap();
    index.write().unwrap();

    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = git2::Signature::now("Other User", "other@example.com").unwrap();
    let parent = repo.head().unwrap().peel_to_commit().unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])
        .unwrap()
}

fn head_tip(repo_path: &Path) -> git2::Oid {
    let repo = git2::Repository::open(repo_path).unwrap();
    let tip = repo.head().unwrap().target().unwrap();
    tip
}

fn branch_tip(repo_path: &Path, branch: &str) -> git2::Oid {
    let repo = git2::Repository::open(repo_path).unwrap();
    let tip = repo
        .find_reference(&format!("refs/heads/{branch}"))
        .unwrap()
        .target()
        .unwrap();
    tip
}

fn count_commits(repo_path: &Path) -> usize {
    let repo = git2::Repository::open(repo_path).unwrap();
    let head = match repo.head() {
        Ok(h) => h,
        Err(_) => return 0,
    };
    let oid = head.target().unwrap();
    let mut revwalk = repo.revwalk().unwrap();
    revwalk.push(oid).unwrap();
    revwalk.count()
}

fn head_message(repo_path: &Path) -> String {
    let repo = git2::Repository::open(repo_path).unwrap();
    let commit = repo.head().unwrap().peel_to_commit().unwrap();
    commit.message().unwrap_or("").to_string()
}

fn head_parent_count(repo_path: &Path) -> usize {
    let repo = git2::Repository::open(repo_path).unwrap();
    let commit = repo.head().unwrap().peel_to_commit().unwrap();
    commit.parent_count()
}

// ===========================================================================
// Test 1: clean tree syncs without creating commits
// ===========================================================================

/// A clean working tree must produce no commit and no push.
#[test]
fn test_clean_tree_creates_no_commits() {
    let tmp = TempDir::new().unwrap();
    let (bare_dir, mut repo) = seed_origin(tmp.path());
    let branch = repo.head_branch_name().unwrap();

    let commits_before = count_commits(repo.path());
    let local_before = head_tip(repo.path());
    let remote_before = branch_tip(&bare_dir, &branch);

    let sink = MemorySink::new();
    repo.commit_and_push(false, &sink).expect("sync failed");

    assert_eq!(count_commits(repo.path()), commits_before);
    assert_eq!(head_tip(repo.path()), local_before, "local tip must not move");
    assert_eq!(
        branch_tip(&bare_dir, &branch),
        remote_before,
        "remote tip must not move"
    );
    assert!(sink.contains_message("Nothing to commit, working tree clean"));
}

// ===========================================================================
// Test 2: dirty tree produces exactly one commit and one push
// ===========================================================================

/// Multiple pending edits collapse into a single auto commit that lands
/// on the remote.
#[test]
fn test_dirty_tree_commits_once_and_pushes() {
    let tmp = TempDir::new().unwrap();
    let (bare_dir, mut repo) = seed_origin(tmp.path());
    let branch = repo.head_branch_name().unwrap();
    let commits_before = count_commits(repo.path());

    std::fs::write(repo.path().join("a.txt"), "alpha\n").unwrap();
    std::fs::write(repo.path().join("b.txt"), "bravo\n").unwrap();

    repo.commit_and_push(false, &NullSink).expect("sync failed");

    assert_eq!(
        count_commits(repo.path()),
        commits_before + 1,
        "both edits must collapse into one commit"
    );
    assert!(head_message(repo.path()).starts_with("Auto commit at "));
    assert_eq!(
        branch_tip(&bare_dir, &branch),
        head_tip(repo.path()),
        "remote tip must match the new local tip"
    );
    assert_eq!(repo.state().unwrap(), RepoState::Clean);
}

// ===========================================================================
// Test 3: up-to-date tracking across two clones
// ===========================================================================

/// A second clone sees the remote advance, and a pull brings it back in
/// step.
#[test]
fn test_is_up_to_date_tracks_remote_advance() {
    let tmp = TempDir::new().unwrap();
    let (bare_dir, mut work) = seed_origin(tmp.path());

    let clone_dir = tmp.path().join("clone");
    let other = clone_from(&bare_dir, &clone_dir);
    assert!(other.is_up_to_date(&NullSink).unwrap());

    // First machine pushes a new file.
    std::fs::write(work.path().join("news.txt"), "fresh\n").unwrap();
    work.commit_and_push(false, &NullSink).unwrap();

    assert!(
        !other.is_up_to_date(&NullSink).unwrap(),
        "clone must observe the remote advance"
    );

    let outcome = other.pull(&NullSink).unwrap();
    assert_eq!(outcome, PullOutcome::FastForward);
    assert!(clone_dir.join("news.txt").exists());
    assert!(other.is_up_to_date(&NullSink).unwrap());
}

// ===========================================================================
// Test 4: pull with nothing new
// ===========================================================================

#[test]
fn test_pull_when_already_current() {
    let tmp = TempDir::new().unwrap();
    let (bare_dir, _work) = seed_origin(tmp.path());

    let clone_dir = tmp.path().join("clone");
    let other = clone_from(&bare_dir, &clone_dir);

    let sink = MemorySink::new();
    let outcome = other.pull(&sink).unwrap();
    assert_eq!(outcome, PullOutcome::UpToDate);
    assert!(sink.contains_message("Already up to date."));
}

// ===========================================================================
// Test 5: divergent histories merge cleanly
// ===========================================================================

/// Divergent histories touching different files produce a two-parent
/// merge commit and a clean tree.
#[test]
fn test_pull_merges_divergent_histories() {
    let tmp = TempDir::new().unwrap();
    let (bare_dir, mut work) = seed_origin(tmp.path());

    let clone_dir = tmp.path().join("clone");
    let other = clone_from(&bare_dir, &clone_dir);

    // First machine pushes one file, the clone commits another locally.
    std::fs::write(work.path().join("from_work.txt"), "work side\n").unwrap();
    work.commit_and_push(false, &NullSink).unwrap();
    commit_in(&clone_dir, "from_clone.txt", "clone side\n", "clone edit");

    let sink = MemorySink::new();
    let outcome = other.pull(&sink).unwrap();

    assert_eq!(outcome, PullOutcome::Merged);
    assert_eq!(head_parent_count(&clone_dir), 2, "merge commit expected");
    assert!(head_message(&clone_dir).starts_with("Merge remote-tracking branch"));
    assert!(clone_dir.join("from_work.txt").exists());
    assert!(clone_dir.join("from_clone.txt").exists());
    assert_eq!(other.state().unwrap(), RepoState::Clean);
    assert!(sink.contains_message("Merge completed."));
}

// ===========================================================================
// Test 6: conflicting edits surface as an outcome, not an error
// ===========================================================================

/// Both sides edit the same line. The pull reports conflicts, leaves
/// markers in the tree, and the repository state reflects it until
/// resolved.
#[test]
fn test_pull_reports_conflicts() {
    let tmp = TempDir::new().unwrap();
    let bare_dir = tmp.path().join("origin.git");
    git2::Repository::init_bare(&bare_dir).unwrap();

    let work_dir = tmp.path().join("work");
    let mut work = SyncRepo::create(&work_dir, test_identity(), test_broker()).unwrap();
    work.add_remote("origin", bare_dir.to_str().unwrap()).unwrap();
    std::fs::write(work_dir.join("shared.txt"), "base\n").unwrap();
    work.commit_and_push(false, &NullSink).unwrap();

    let clone_dir = tmp.path().join("clone");
    let other = clone_from(&bare_dir, &clone_dir);

    std::fs::write(work_dir.join("shared.txt"), "work version\n").unwrap();
    work.commit_and_push(false, &NullSink).unwrap();
    commit_in(&clone_dir, "shared.txt", "clone version\n", "clone edit");

    let sink = MemorySink::new();
    let outcome = other.pull(&sink).expect("conflicts must not be an error");

    assert_eq!(outcome, PullOutcome::Conflicts);
    assert_eq!(other.state().unwrap(), RepoState::Conflicted);
    assert!(sink.has_severity(Severity::Error));
    assert!(sink.contains_message("Conflicts detected"));

    let marked = std::fs::read_to_string(clone_dir.join("shared.txt")).unwrap();
    assert!(
        marked.contains("<<<<<<<"),
        "conflict markers expected, got: {marked}"
    );
}

// ===========================================================================
// Test 7: push rejected when the remote moved on
// ===========================================================================

/// A non-fast-forward push fails; pulling first and force-syncing the
/// resulting merge commit recovers.
#[test]
fn test_push_rejected_until_pull() {
    let tmp = TempDir::new().unwrap();
    let (bare_dir, mut work) = seed_origin(tmp.path());
    let branch = work.head_branch_name().unwrap();

    let clone_dir = tmp.path().join("clone");
    let mut other = clone_from(&bare_dir, &clone_dir);

    // Remote advances past the clone.
    std::fs::write(work.path().join("ahead.txt"), "ahead\n").unwrap();
    work.commit_and_push(false, &NullSink).unwrap();

    // The clone's own edit can no longer fast-forward the remote.
    std::fs::write(clone_dir.join("behind.txt"), "behind\n").unwrap();
    let err = other.commit_and_push(false, &NullSink).unwrap_err();
    assert!(
        matches!(err, SyncError::Backend(_)),
        "expected backend rejection, got: {err}"
    );

    // Pull merges, then a forced sync pushes the merge commit.
    assert_eq!(other.pull(&NullSink).unwrap(), PullOutcome::Merged);
    other.commit_and_push(true, &NullSink).expect("forced push failed");
    assert_eq!(
        branch_tip(&bare_dir, &branch),
        head_tip(&clone_dir),
        "remote must now carry the merge commit"
    );
}

// ===========================================================================
// Test 8: clone preconditions and results
// ===========================================================================

#[test]
fn test_clone_refuses_non_empty_target() {
    let tmp = TempDir::new().unwrap();
    let (bare_dir, _work) = seed_origin(tmp.path());

    let target = tmp.path().join("occupied");
    std::fs::create_dir_all(&target).unwrap();
    std::fs::write(target.join("existing.txt"), "already here\n").unwrap();

    let err = SyncRepo::clone(
        bare_dir.to_str().unwrap(),
        &target,
        test_identity(),
        test_broker(),
        &NullSink,
    )
    .unwrap_err();
    assert!(matches!(err, SyncError::ArgumentInvalid(_)));
}

#[test]
fn test_clone_checks_out_seed_content() {
    let tmp = TempDir::new().unwrap();
    let (bare_dir, _work) = seed_origin(tmp.path());

    let clone_dir = tmp.path().join("clone");
    let sink = MemorySink::new();
    let other = SyncRepo::clone(
        bare_dir.to_str().unwrap(),
        &clone_dir,
        test_identity(),
        test_broker(),
        &sink,
    )
    .expect("clone failed");

    assert!(clone_dir.join("seed.txt").exists());
    assert_eq!(
        std::fs::read_to_string(clone_dir.join("seed.txt")).unwrap(),
        "seed content\n"
    );
    assert_eq!(count_commits(&clone_dir), 1);
    assert_eq!(other.state().unwrap(), RepoState::Clean);
}

// ===========================================================================
// Test 9: conflicted state clears after resolution
// ===========================================================================

/// Resolving the conflicted file and syncing returns the repository to
/// a clean state on the next read.
#[test]
fn test_conflict_resolution_returns_to_clean() {
    let tmp = TempDir::new().unwrap();
    let bare_dir = tmp.path().join("origin.git");
    git2::Repository::init_bare(&bare_dir).unwrap();

    let work_dir = tmp.path().join("work");
    let mut work = SyncRepo::create(&work_dir, test_identity(), test_broker()).unwrap();
    work.add_remote("origin", bare_dir.to_str().unwrap()).unwrap();
    std::fs::write(work_dir.join("shared.txt"), "base\n").unwrap();
    work.commit_and_push(false, &NullSink).unwrap();

    let clone_dir = tmp.path().join("clone");
    let mut other = clone_from(&bare_dir, &clone_dir);

    std::fs::write(work_dir.join("shared.txt"), "work version\n").unwrap();
    work.commit_and_push(false, &NullSink).unwrap();
    commit_in(&clone_dir, "shared.txt", "clone version\n", "clone edit");

    assert_eq!(other.pull(&NullSink).unwrap(), PullOutcome::Conflicts);
    assert_eq!(other.state().unwrap(), RepoState::Conflicted);

    // Resolve by picking one side, then sync.
    std::fs::write(clone_dir.join("shared.txt"), "resolved\n").unwrap();
    other.commit_and_push(true, &NullSink).expect("resolve sync failed");
    assert_eq!(other.state().unwrap(), RepoState::Clean);
}
