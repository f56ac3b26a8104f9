//! Landing - move a sketch branch's commits onto main without merge commits
//!
//! This module follows a three-phase architecture:
//! 1. **Gather**: check preconditions, collect commits, analyze them
//! 2. **Plan**: pure function to decide the ordered steps
//! 3. **Execute**: effectful cherry-picks, squash and branch deletion
//!
//! The read path (`classify`) shares the analysis with landing, so a branch
//! listed as CLEAN is exactly one that `land` would accept.

pub mod analyze;
mod execute;
mod plan;
pub mod squash;
mod status;

pub use analyze::{
    AnalysisMode, CommitAnalysis, Conflict, LAND_CONFLICT_GUIDANCE, UPDATE_CONFLICT_GUIDANCE, analyze,
};
pub use execute::{AcceptMessage, LandExecutionResult, MessageReview, execute_land};
pub use plan::{LandPlan, LandStep, create_land_plan};
pub use status::{StatusReport, classify, status_from_analysis};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::git::{GitBackend, commits_between};
use crate::guard::{check_branch_exists, check_on_branch, check_repo_state, find_main_branch};
use crate::types::LandOptions;
use tracing::{info, warn};

/// Gather and plan a landing of `branch` (no mutation)
///
/// Unless `options.force` is set the checked-out branch must be main. The
/// repository must be clean and the branch must exist. A conflict anywhere
/// in the sequence is returned as [`Error::Conflict`].
pub fn prepare_land(
    git: &dyn GitBackend,
    config: &Config,
    branch: &str,
    options: &LandOptions,
) -> Result<LandPlan> {
    let main = find_main_branch(git, &config.main_branches)?;
    if !options.force {
        check_on_branch(git, &main)?;
    }
    check_repo_state(git)?;

    let branch = config.normalize_branch(branch);
    check_branch_exists(git, &branch)?;

    let commits = commits_between(git, &main, &branch)
        .map_err(|e| Error::Git(format!("failed to get commits from {branch}: {e}")))?;
    if commits.is_empty() {
        return Ok(LandPlan::nothing_to_land(&branch, &main));
    }

    let analysis = analyze(git, &commits, &main, Some(&branch))?;
    if !analysis.approximations.is_empty() {
        warn!(
            commits = ?analysis.approximations,
            "simulated base approximated; later results may be inaccurate"
        );
    }

    create_land_plan(&branch, &main, commits.len(), &analysis, options)
}

/// Force-delete a branch after checking the repository is clean
///
/// Returns the normalized branch name. Nothing is deleted when `dry_run` is
/// set.
pub fn drop_branch(
    git: &dyn GitBackend,
    config: &Config,
    branch: &str,
    dry_run: bool,
) -> Result<String> {
    check_repo_state(git)?;
    let branch = config.normalize_branch(branch);
    check_branch_exists(git, &branch)?;

    if !dry_run {
        git.delete_branch(&branch)?;
        info!(branch = %branch, "dropped branch");
    }
    Ok(branch)
}
