//! Repository preconditions checked before any mutation
//!
//! These checks are independent of the write that follows them. Nothing
//! locks the repository between check and act, so two concurrent palimp
//! invocations can still race.

use crate::error::{Error, Result};
use crate::git::GitBackend;
use tracing::debug;

/// Markers under the git directory that indicate an interrupted operation
pub const IN_PROGRESS_MARKERS: &[&str] = &[
    "MERGE_HEAD",
    "CHERRY_PICK_HEAD",
    "REVERT_HEAD",
    "BISECT_LOG",
    "rebase-merge",
    "rebase-apply",
];

/// Return the first candidate branch that exists
pub fn find_main_branch<S: AsRef<str>>(git: &dyn GitBackend, candidates: &[S]) -> Result<String> {
    for candidate in candidates {
        let candidate = candidate.as_ref();
        if candidate.is_empty() {
            continue;
        }
        if git.branch_exists(candidate)? {
            debug!(main = candidate, "detected main branch");
            return Ok(candidate.to_string());
        }
    }
    Err(Error::MainBranchNotFound {
        candidates: candidates
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(", "),
    })
}

/// Fail unless the repository has no in-progress operation and no changes
pub fn check_repo_state(git: &dyn GitBackend) -> Result<()> {
    for marker in IN_PROGRESS_MARKERS {
        if git.git_dir_contains(marker)? {
            return Err(Error::OperationInProgress(marker.to_string()));
        }
    }
    if git.has_staged_changes()? {
        return Err(Error::StagedChanges);
    }
    if git.has_unstaged_changes()? {
        return Err(Error::UnstagedChanges);
    }
    Ok(())
}

/// Fail unless `main` is the checked-out branch
pub fn check_on_branch(git: &dyn GitBackend, main: &str) -> Result<()> {
    let current = git.current_branch()?;
    if current != main {
        return Err(Error::NotOnMain {
            main: main.to_string(),
            current,
        });
    }
    Ok(())
}

/// Fail unless the branch exists
pub fn check_branch_exists(git: &dyn GitBackend, branch: &str) -> Result<()> {
    if git.branch_exists(branch)? {
        Ok(())
    } else {
        Err(Error::BranchNotFound(branch.to_string()))
    }
}
