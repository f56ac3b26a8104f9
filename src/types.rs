//! Core types for palimp

use crate::change_id::extract_change_ids;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A candidate branch with reporting metadata
///
/// Computed fresh per invocation; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Branch {
    /// Full branch name (e.g. `sketch/fix-login`)
    pub name: String,
    /// Tip commit hash
    pub commit: String,
    /// Commit time of the tip
    pub date: DateTime<Utc>,
    /// Subject line of the tip commit
    pub subject: String,
    /// Commits on the branch that are not on main
    pub ahead: usize,
    /// Commits on main that are not on the branch
    pub behind: usize,
}

/// Metadata for a single ref as reported by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefInfo {
    /// Commit hash the ref resolves to
    pub hash: String,
    /// Commit timestamp (seconds since the epoch)
    pub timestamp: i64,
    /// Subject line of the commit
    pub subject: String,
}

/// A commit and the Change-Id tokens found in its message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Commit {
    /// Full commit hash
    pub hash: String,
    /// Abbreviated hash (unambiguous in the repository)
    pub short_hash: String,
    /// First line of the message
    pub subject: String,
    /// Full commit message (subject + body)
    pub message: String,
    /// Change-Id tokens, in message line order
    pub change_ids: Vec<String>,
}

impl Commit {
    /// Build a commit from its message, extracting subject and Change-Ids
    pub fn from_message(
        hash: impl Into<String>,
        short_hash: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let subject = message.lines().next().unwrap_or_default().to_string();
        let change_ids = extract_change_ids(&message);
        Self {
            hash: hash.into(),
            short_hash: short_hash.into(),
            subject,
            message,
            change_ids,
        }
    }

    /// Whether any of this commit's Change-Ids is in `tokens`
    pub fn is_known_to<S: std::hash::BuildHasher>(
        &self,
        tokens: &std::collections::HashSet<String, S>,
    ) -> bool {
        self.change_ids.iter().any(|id| tokens.contains(id))
    }
}

/// Land/rebase status reported for a branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchStatus {
    /// Remaining commits apply cleanly onto main
    Clean,
    /// A commit would conflict with main
    Conflict,
    /// Every commit is already on main by Change-Id
    Landed,
    /// Nothing left to apply
    Empty,
    /// Status could not be determined
    Error,
}

impl std::fmt::Display for BranchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clean => write!(f, "CLEAN"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Landed => write!(f, "LANDED"),
            Self::Empty => write!(f, "EMPTY"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Options for the land operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct LandOptions {
    /// Squash the applied commits into one
    pub squash: bool,
    /// Report the plan without mutating anything
    pub dry_run: bool,
    /// Skip the on-main check
    pub force: bool,
    /// Draft the squash message with the external service
    pub use_llm: bool,
}
