//! Update - rebase a sketch branch onto the current main
//!
//! Unlike landing, the branch survives and main does not move. A failed
//! rebase is the one mutation that is rolled back automatically: it is
//! aborted and main is checked out again.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::git::{GitBackend, commits_between};
use crate::guard::{check_branch_exists, check_on_branch, check_repo_state, find_main_branch};
use crate::land::{UPDATE_CONFLICT_GUIDANCE, analyze};
use crate::progress::ProgressCallback;
use crate::types::Commit;
use tracing::info;

/// A validated rebase of `branch` onto `main`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlan {
    /// Branch to rebase
    pub branch: String,
    /// Branch it is rebased onto (also checked out again afterwards)
    pub main: String,
    /// Commits that will be replayed
    pub commits: Vec<Commit>,
}

impl UpdatePlan {
    /// Human-readable steps, in order
    #[must_use]
    pub fn steps(&self) -> Vec<String> {
        vec![
            format!("Checkout {}", self.branch),
            format!("Rebase onto {}", self.main),
            format!("Checkout {}", self.main),
        ]
    }
}

/// Check preconditions and validate that `branch` rebases cleanly
///
/// The conflict check scans all of main's history, not just the window since
/// the merge-base.
pub fn plan_update(git: &dyn GitBackend, config: &Config, branch: &str) -> Result<UpdatePlan> {
    let main = find_main_branch(git, &config.main_branches)?;
    check_on_branch(git, &main)?;
    check_repo_state(git)?;

    let branch = config.normalize_branch(branch);
    check_branch_exists(git, &branch)?;

    let commits = commits_between(git, &main, &branch)
        .map_err(|e| Error::Git(format!("failed to get commits from {branch}: {e}")))?;

    if !commits.is_empty() {
        let analysis = analyze(git, &commits, &main, None)?;
        if let Some(conflict) = &analysis.conflict {
            return Err(conflict.to_error(UPDATE_CONFLICT_GUIDANCE));
        }
    }

    Ok(UpdatePlan {
        branch,
        main,
        commits,
    })
}

/// Rebase the branch in place and return to main (EFFECTFUL)
pub async fn execute_update(
    plan: &UpdatePlan,
    git: &dyn GitBackend,
    progress: &dyn ProgressCallback,
) -> Result<()> {
    progress
        .on_message(&format!("Rebasing {} onto {}...", plan.branch, plan.main))
        .await;

    git.checkout(&plan.branch)?;

    if let Err(e) = git.rebase(&plan.main) {
        // Best effort; the rebase error is what the caller needs to see
        if let Err(abort) = git.rebase_abort() {
            progress
                .on_warning(&format!("rebase --abort failed: {abort}"))
                .await;
        }
        if let Err(checkout) = git.checkout(&plan.main) {
            progress
                .on_warning(&format!("failed to return to {}: {checkout}", plan.main))
                .await;
        }
        return Err(Error::RebaseFailed(e.to_string()));
    }

    git.checkout(&plan.main)?;
    info!(branch = %plan.branch, main = %plan.main, "updated branch");
    Ok(())
}
