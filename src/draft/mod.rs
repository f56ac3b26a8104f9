//! Squash-message drafting
//!
//! An external language-model service can propose a unified message for a
//! squash. Its output is never trusted: a proposal without a subject line or
//! missing any of the squashed Change-Ids is rejected, and every failure
//! falls back to the deterministic combined message.

mod anthropic;

pub use anthropic::AnthropicDrafter;

use crate::change_id::extract_change_ids;
use crate::error::{Error, Result};
use crate::git::GitBackend;
use crate::land::squash::{combined_message, union_change_ids};
use crate::types::Commit;
use async_trait::async_trait;
use tracing::{debug, warn};

/// Input handed to a drafting service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRequest {
    /// Full messages of the squashed commits, in order
    pub messages: Vec<String>,
    /// Unified diff covering all squashed commits
    pub diff: String,
}

impl DraftRequest {
    /// Prompt text sent to the service
    #[must_use]
    pub fn prompt(&self) -> String {
        build_prompt(&self.messages, &self.diff)
    }
}

/// A service that drafts a single commit message for a squash
#[async_trait]
pub trait MessageDrafter: Send + Sync {
    /// Propose a message; the result is validated by the caller
    async fn draft(&self, request: &DraftRequest) -> Result<String>;
}

/// Build the drafting prompt from the original messages and the diff
#[must_use]
pub fn build_prompt(messages: &[String], diff: &str) -> String {
    let mut prompt = String::from(
        "I have a series of commits that I want to squash into a single commit. \
         Please create a unified commit message that:\n\n\
         1. Includes all important information from all the input commit messages\n\
         2. Correctly describes the actual changes (the code wins if there's a discrepancy)\n\
         3. Includes ALL Change-ID trailers present in the input commits\n\
         4. Follows the predominant style of the commit messages\n\n",
    );

    prompt.push_str("<commit_messages>\n");
    for message in messages {
        prompt.push_str("<commit_message>\n");
        prompt.push_str(message);
        prompt.push_str("\n</commit_message>\n");
    }
    prompt.push_str("</commit_messages>\n\n");

    prompt.push_str("<diff>\n");
    prompt.push_str(diff);
    prompt.push_str("</diff>\n\n");

    prompt.push_str(
        "Please write the unified commit message. Do not include any markdown \
         formatting or code blocks in your response - just the raw commit message.",
    );
    prompt
}

/// Check a drafted message: it needs a subject line and every expected
/// Change-Id must appear verbatim
pub fn validate_drafted_message(message: &str, expected_ids: &[String]) -> Result<()> {
    let subject = message.lines().next().unwrap_or_default();
    if subject.trim().is_empty() {
        return Err(Error::Draft("missing subject line".to_string()));
    }

    let present = extract_change_ids(message);
    let missing: Vec<&str> = expected_ids
        .iter()
        .filter(|id| !present.contains(*id))
        .map(String::as_str)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Draft(format!(
            "missing Change-IDs: {}",
            missing.join(", ")
        )))
    }
}

/// Gather messages and the combined diff for `commits`
pub fn draft_request(git: &dyn GitBackend, commits: &[Commit]) -> Result<DraftRequest> {
    let (Some(first), Some(last)) = (commits.first(), commits.last()) else {
        return Ok(DraftRequest {
            messages: Vec::new(),
            diff: String::new(),
        });
    };

    let parent = git
        .parent_of(&first.hash)?
        .ok_or_else(|| Error::Draft(format!("{} has no parent", first.short_hash)))?;
    let diff = git.diff(&parent, &last.hash)?;

    Ok(DraftRequest {
        messages: commits.iter().map(|c| c.message.clone()).collect(),
        diff,
    })
}

/// Where a squash message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    /// Deterministic combined message
    Combined,
    /// Accepted proposal from the drafting service
    Drafted,
    /// Drafting was requested but failed; combined message used instead
    Fallback,
}

/// Produce the squash message for `commits`
///
/// With no drafter the combined message is used. Otherwise the drafter's
/// proposal is validated, and any failure along the way falls back to the
/// combined message. This never fails.
pub async fn squash_message(
    git: &dyn GitBackend,
    drafter: Option<&dyn MessageDrafter>,
    commits: &[Commit],
) -> (String, MessageSource) {
    let Some(drafter) = drafter else {
        return (combined_message(commits), MessageSource::Combined);
    };

    match try_draft(git, drafter, commits).await {
        Ok(message) => {
            debug!("drafted squash message accepted");
            (message, MessageSource::Drafted)
        }
        Err(e) => {
            warn!(error = %e, "falling back to combined squash message");
            (combined_message(commits), MessageSource::Fallback)
        }
    }
}

async fn try_draft(
    git: &dyn GitBackend,
    drafter: &dyn MessageDrafter,
    commits: &[Commit],
) -> Result<String> {
    let request = draft_request(git, commits)?;
    let message = drafter.draft(&request).await?;
    let message = message.trim().to_string();
    validate_drafted_message(&message, &union_change_ids(commits))?;
    Ok(message)
}
