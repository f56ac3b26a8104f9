//! Version-control backend
//!
//! The engine never talks to git directly. Everything it needs goes through
//! [`GitBackend`], so the analyzer and executors can run against an
//! in-memory fake as easily as against a real repository.

mod cli;

pub use cli::GitCli;

use crate::error::Result;
use crate::types::RefInfo;

/// Outcome of a non-mutating three-way tree merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeMerge {
    /// Merge is clean; carries the resulting tree id
    Clean(String),
    /// Merge would conflict; carries the engine's diagnostic
    Conflict(String),
}

/// Primitive repository operations used by palimp
///
/// Read-only methods come first; the mutating ones at the bottom are only
/// called by the executors after analysis has certified the plan.
pub trait GitBackend: Send + Sync {
    /// Whether `refs/heads/<branch>` exists
    fn branch_exists(&self, branch: &str) -> Result<bool>;

    /// Local branch names matching a `refs/heads/` glob (e.g. `sketch/*`)
    fn list_branches(&self, pattern: &str) -> Result<Vec<String>>;

    /// Hash, commit time and subject of the commit a ref points at
    fn ref_info(&self, rev: &str) -> Result<RefInfo>;

    /// `(ahead, behind)` of `branch` relative to `base`
    fn ahead_behind(&self, base: &str, branch: &str) -> Result<(usize, usize)>;

    /// Hashes reachable from `tip` but not from `base`, oldest first
    fn list_commits(&self, base: &str, tip: &str) -> Result<Vec<String>>;

    /// Full message (subject + body) of a commit
    fn commit_message(&self, hash: &str) -> Result<String>;

    /// Unambiguous abbreviation of a commit hash
    fn short_hash(&self, hash: &str) -> String;

    /// Messages of every commit reachable from `tip`, excluding commits
    /// reachable from `exclude` when given
    fn log_messages(&self, tip: &str, exclude: Option<&str>) -> Result<Vec<String>>;

    /// Nearest common ancestor of two revisions
    fn merge_base(&self, a: &str, b: &str) -> Result<String>;

    /// First parent of a revision, `None` for a root commit
    fn parent_of(&self, rev: &str) -> Result<Option<String>>;

    /// Resolve a revision to a commit hash
    fn rev_parse(&self, rev: &str) -> Result<String>;

    /// Whether the three-way tree merge primitive is available
    ///
    /// `rev` is any commit the check may merge with itself.
    fn supports_merge_tree(&self, rev: &str) -> bool;

    /// Merge `theirs` into `ours` against `merge_base` without touching the
    /// index, working tree or any ref
    fn merge_tree(&self, merge_base: &str, ours: &str, theirs: &str) -> Result<TreeMerge>;

    /// Tree id of a revision
    fn tree_of(&self, rev: &str) -> Result<String>;

    /// Write an anonymous commit object; no ref moves
    fn commit_tree(&self, tree: &str, parent: &str, message: &str) -> Result<String>;

    /// Unified diff between two revisions
    fn diff(&self, from: &str, to: &str) -> Result<String>;

    /// Name of the checked-out branch (`HEAD` when detached)
    fn current_branch(&self) -> Result<String>;

    /// Whether a path exists under the git directory (operation markers)
    fn git_dir_contains(&self, relative: &str) -> Result<bool>;

    /// Whether the index differs from `HEAD`
    fn has_staged_changes(&self) -> Result<bool>;

    /// Whether the working tree differs from the index
    fn has_unstaged_changes(&self) -> Result<bool>;

    // =========================================================================
    // Mutating operations
    // =========================================================================

    /// Force-delete a local branch
    fn delete_branch(&self, branch: &str) -> Result<()>;

    /// Check out a branch
    fn checkout(&self, branch: &str) -> Result<()>;

    /// Rebase the checked-out branch onto `onto`
    fn rebase(&self, onto: &str) -> Result<()>;

    /// Abort an in-progress rebase
    fn rebase_abort(&self) -> Result<()>;

    /// Apply a single commit on top of `HEAD`
    fn cherry_pick(&self, hash: &str) -> Result<()>;

    /// Move `HEAD` to `rev`, keeping all changes staged
    fn reset_soft(&self, rev: &str) -> Result<()>;

    /// Commit the index with the given message
    fn commit(&self, message: &str) -> Result<()>;
}

/// Resolve the hashes in `base..tip` into [`Commit`](crate::types::Commit)s
pub fn commits_between(
    git: &dyn GitBackend,
    base: &str,
    tip: &str,
) -> Result<Vec<crate::types::Commit>> {
    git.list_commits(base, tip)?
        .into_iter()
        .map(|hash| {
            let message = git.commit_message(&hash)?;
            let short = git.short_hash(&hash);
            Ok(crate::types::Commit::from_message(hash, short, message))
        })
        .collect()
}
