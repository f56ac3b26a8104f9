//! Per-branch status for listings

use crate::git::{GitBackend, commits_between};
use crate::guard::find_main_branch;
use crate::land::analyze::{CommitAnalysis, analyze};
use crate::types::{BranchStatus, Commit};
use tracing::debug;

/// Status of a branch plus whether it was fully verified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    /// Reported status
    pub status: BranchStatus,
    /// False when merge simulation was unavailable and the status rests on
    /// Change-Id filtering alone
    pub verified: bool,
}

impl StatusReport {
    const fn verified(status: BranchStatus) -> Self {
        Self {
            status,
            verified: true,
        }
    }
}

/// Classify whether `branch` can land cleanly on the detected main branch
///
/// Any failure to read commits or resolve main is reported as
/// [`BranchStatus::Error`] rather than propagated.
pub fn classify<S: AsRef<str>>(
    git: &dyn GitBackend,
    branch: &str,
    main_candidates: &[S],
) -> StatusReport {
    let Ok(main) = find_main_branch(git, main_candidates) else {
        return StatusReport::verified(BranchStatus::Error);
    };

    let commits = match commits_between(git, &main, branch) {
        Ok(commits) => commits,
        Err(e) => {
            debug!(branch, error = %e, "could not list commits");
            return StatusReport::verified(BranchStatus::Error);
        }
    };

    if commits.is_empty() {
        return StatusReport::verified(BranchStatus::Empty);
    }

    match analyze(git, &commits, &main, Some(branch)) {
        Ok(analysis) => status_from_analysis(&commits, &analysis),
        Err(e) => {
            debug!(branch, error = %e, "analysis failed");
            StatusReport::verified(BranchStatus::Error)
        }
    }
}

/// Map an analysis of `commits` onto the reporting vocabulary
pub fn status_from_analysis(commits: &[Commit], analysis: &CommitAnalysis) -> StatusReport {
    let status = if analysis.conflict.is_some() {
        BranchStatus::Conflict
    } else if analysis.valid_commits.is_empty() {
        // Everything gone by identity means it truly landed; otherwise the
        // same change is already on main under another identity
        if analysis.already_landed.len() == commits.len() {
            BranchStatus::Landed
        } else {
            BranchStatus::Empty
        }
    } else {
        BranchStatus::Clean
    };

    let verified = !(analysis.is_degraded()
        && matches!(status, BranchStatus::Clean | BranchStatus::Empty));
    StatusReport { status, verified }
}
