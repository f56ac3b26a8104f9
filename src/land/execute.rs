//! Landing execution - effectful operations
//!
//! Takes a [`LandPlan`] built by the pure planning functions and performs it
//! against the repository. Execution is fail-stop: a failed cherry-pick
//! leaves the commits applied before it in place and reports how to recover.

use crate::draft::{MessageDrafter, MessageSource, squash_message};
use crate::error::{Error, Result};
use crate::git::GitBackend;
use crate::land::plan::{LandPlan, LandStep};
use crate::progress::ProgressCallback;
use tracing::info;

/// Last look at a squash message before it is committed
pub trait MessageReview: Send + Sync {
    /// Return the message to commit; implementations fall back to `message`
    /// if the review is cancelled
    fn review(&self, message: String) -> String;
}

/// Commit squash messages exactly as generated
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptMessage;

impl MessageReview for AcceptMessage {
    fn review(&self, message: String) -> String {
        message
    }
}

/// Result of landing execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LandExecutionResult {
    /// Abbreviated hashes of the commits that were cherry-picked
    pub applied: Vec<String>,
    /// The squash commit's message and where it came from, when squashed
    pub squash: Option<(String, MessageSource)>,
    /// Whether the source branch was deleted
    pub branch_deleted: bool,
}

impl LandExecutionResult {
    /// Whether anything was cherry-picked
    #[must_use]
    pub fn has_applied(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Execute the landing plan (EFFECTFUL)
///
/// `drafter` is only consulted for squash steps that asked for a drafted
/// message.
pub async fn execute_land(
    plan: &LandPlan,
    git: &dyn GitBackend,
    drafter: Option<&dyn MessageDrafter>,
    review: &dyn MessageReview,
    progress: &dyn ProgressCallback,
) -> Result<LandExecutionResult> {
    let mut result = LandExecutionResult::default();

    let squash_base = if plan
        .steps
        .iter()
        .any(|s| matches!(s, LandStep::Squash { .. }))
    {
        Some(git.rev_parse("HEAD")?)
    } else {
        None
    };

    for step in &plan.steps {
        match step {
            LandStep::CherryPick {
                position,
                total,
                commit,
            } => {
                progress
                    .on_message(&format!(
                        "Cherry-picking {position}/{total}: {} {}",
                        commit.short_hash, commit.subject
                    ))
                    .await;

                git.cherry_pick(&commit.hash)
                    .map_err(|e| Error::CherryPickFailed {
                        short_hash: commit.short_hash.clone(),
                        applied: position - 1,
                        detail: e.to_string(),
                    })?;
                info!(commit = %commit.short_hash, position, total, "cherry-picked");
                result.applied.push(commit.short_hash.clone());
            }
            LandStep::Squash {
                commits, use_llm, ..
            } => {
                let base = squash_base
                    .as_deref()
                    .ok_or_else(|| Error::Internal("squash without a recorded base".to_string()))?;

                progress
                    .on_message(&format!("Squashing {} commits...", commits.len()))
                    .await;
                git.reset_soft(base)?;

                let drafter = if *use_llm { drafter } else { None };
                if *use_llm && drafter.is_none() {
                    progress
                        .on_warning("No drafting service available; using combined message")
                        .await;
                }
                let (message, source) = squash_message(git, drafter, commits).await;
                match source {
                    MessageSource::Fallback => {
                        progress
                            .on_warning("Drafted message rejected; using combined message")
                            .await;
                    }
                    MessageSource::Drafted => {
                        progress.on_message("Drafted message validated").await;
                    }
                    MessageSource::Combined => {}
                }

                let message = review.review(message);
                git.commit(&message)?;
                info!(count = commits.len(), "squashed");
                result.squash = Some((message, source));
            }
            LandStep::DeleteBranch { branch } => {
                progress
                    .on_message(&format!("Deleting branch {branch}"))
                    .await;
                git.delete_branch(branch)?;
                info!(branch = %branch, "deleted branch");
                result.branch_deleted = true;
            }
        }
    }

    Ok(result)
}
