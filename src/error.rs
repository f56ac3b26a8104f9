//! Error types for palimp

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the landing engine and its collaborators
#[derive(Debug, Error)]
pub enum Error {
    /// Referenced branch does not exist
    #[error("branch {0} does not exist")]
    BranchNotFound(String),

    /// None of the configured main-branch candidates exist
    #[error("no main branch found; checked: {candidates}")]
    MainBranchNotFound {
        /// Comma-separated candidate list that was searched
        candidates: String,
    },

    /// A merge, cherry-pick, revert, bisect or rebase is in progress
    #[error("repository has ongoing git operation (found {0})")]
    OperationInProgress(String),

    /// Index differs from HEAD
    #[error("repository has staged changes; commit or reset them")]
    StagedChanges,

    /// Working tree differs from the index
    #[error("repository has unstaged changes; commit or stash them")]
    UnstagedChanges,

    /// Current branch is not the detected main branch
    #[error("must be on main branch ({main}), currently on {current}")]
    NotOnMain {
        /// Detected main branch
        main: String,
        /// Branch currently checked out
        current: String,
    },

    /// Sequential merge simulation failed at a specific commit
    #[error(
        "merge conflict detected for commit {position}/{total} ({short_hash} {subject}): {detail}\n{guidance}"
    )]
    Conflict {
        /// 1-based position among the commits that were simulated
        position: usize,
        /// Number of commits that were simulated
        total: usize,
        /// Abbreviated hash of the offending commit
        short_hash: String,
        /// Subject line of the offending commit
        subject: String,
        /// Diagnostic from the tree merge
        detail: String,
        /// What the user has to do before retrying
        guidance: &'static str,
    },

    /// A cherry-pick failed part-way through a landing
    #[error(
        "cherry-pick of {short_hash} failed: {detail}\n\nTo recover:\n  git cherry-pick --abort    # Cancel the cherry-pick\n  git reset --hard HEAD~{applied}   # Undo {applied} commits that were already applied"
    )]
    CherryPickFailed {
        /// Abbreviated hash of the commit that failed to apply
        short_hash: String,
        /// Number of commits applied before the failure
        applied: usize,
        /// Output of the failed command
        detail: String,
    },

    /// Rebase failed and was aborted
    #[error("rebase failed: {0}")]
    RebaseFailed(String),

    /// A git plumbing command failed unexpectedly
    #[error("git error: {0}")]
    Git(String),

    /// Configuration file could not be read or parsed
    #[error("config error: {0}")]
    Config(String),

    /// Message-drafting service failed or returned an unusable message
    #[error("message drafting failed: {0}")]
    Draft(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Whether this error was raised before any repository state changed
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::BranchNotFound(_)
                | Self::MainBranchNotFound { .. }
                | Self::OperationInProgress(_)
                | Self::StagedChanges
                | Self::UnstagedChanges
                | Self::NotOnMain { .. }
        )
    }
}
