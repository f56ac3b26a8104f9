//! Commit analysis - decide what would land without touching the repository
//!
//! Filtering happens in two passes:
//! 1. Identity - commits whose Change-Id is already on main are dropped.
//! 2. Simulation - the rest are replayed one by one with a three-way tree
//!    merge onto an accumulated base, detecting conflicts and no-op commits.
//!
//! Only anonymous objects are written (result trees and throwaway commits);
//! the index, working tree and every named ref are left alone.

use crate::change_id::tokens_in_ref;
use crate::error::{Error, Result};
use crate::git::{GitBackend, TreeMerge};
use crate::types::Commit;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Message used for the throwaway commits that carry the simulated base
const SIMULATED_COMMIT_MESSAGE: &str = "palimp: simulated base";

/// Advice attached to a conflict found while planning a landing
pub const LAND_CONFLICT_GUIDANCE: &str =
    "The cherry-pick sequence would fail. Please resolve conflicts on the branch first.";

/// Advice attached to a conflict found while planning an update
pub const UPDATE_CONFLICT_GUIDANCE: &str =
    "The rebase would fail. Please resolve conflicts manually.";

/// How thoroughly the commits were checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Identity filtering plus sequential merge simulation
    Full,
    /// Tree merge unavailable; only identity filtering ran, so conflicts and
    /// no-op commits were not detected
    IdentityOnly,
}

/// The first commit that failed to simulate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// The offending commit
    pub commit: Commit,
    /// 1-based position among the simulated commits
    pub position: usize,
    /// Number of commits that were going to be simulated
    pub total: usize,
    /// Diagnostic from the merge primitive
    pub detail: String,
}

impl Conflict {
    /// Convert into the error surfaced to callers
    #[must_use]
    pub fn to_error(&self, guidance: &'static str) -> Error {
        Error::Conflict {
            position: self.position,
            total: self.total,
            short_hash: self.commit.short_hash.clone(),
            subject: self.commit.subject.clone(),
            detail: self.detail.clone(),
            guidance,
        }
    }
}

/// Result of analysing a commit sequence against a target ref
///
/// Invariant: when `conflict` is set, every commit in `valid_commits`
/// precedes the conflicting commit in the original order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitAnalysis {
    /// Commits that would apply cleanly and change something, in order
    pub valid_commits: Vec<Commit>,
    /// First commit that would conflict, if any
    pub conflict: Option<Conflict>,
    /// Commits dropped because a Change-Id is already on the target
    pub already_landed: Vec<Commit>,
    /// Commits that would be no-ops against the accumulated base
    pub empty_commits: Vec<Commit>,
    /// Hashes after which the simulated base is only approximate
    pub approximations: Vec<String>,
    /// Whether merge simulation ran
    pub mode: AnalysisMode,
}

impl CommitAnalysis {
    fn identity_only(valid_commits: Vec<Commit>, already_landed: Vec<Commit>) -> Self {
        Self {
            valid_commits,
            conflict: None,
            already_landed,
            empty_commits: Vec::new(),
            approximations: Vec::new(),
            mode: AnalysisMode::IdentityOnly,
        }
    }

    /// The first conflicting commit, if any
    #[must_use]
    pub fn first_conflict(&self) -> Option<&Commit> {
        self.conflict.as_ref().map(|c| &c.commit)
    }

    /// Whether the commits were only filtered by identity
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.mode == AnalysisMode::IdentityOnly
    }
}

/// Simulated state of the target after the commits accepted so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimState {
    /// Revision whose tree is the accumulated result
    pub base: String,
}

impl SimState {
    /// Start from the target ref
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }
}

/// What happened when one commit was replayed onto the simulated base
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The commit applies and changes the tree
    Applied {
        /// True when the next base fell back to the commit's own hash
        approximate: bool,
    },
    /// The commit applies but leaves the tree unchanged
    Empty,
    /// The commit does not apply
    Conflict(String),
}

/// Replay one commit onto `state`, returning the next state and the outcome
///
/// The merge base is the commit's own parent, so only this commit's change
/// is merged into the accumulated base. On success the next base is a
/// throwaway commit wrapping the result tree; if that cannot be written the
/// commit's own hash stands in for it.
pub fn simulate_step(git: &dyn GitBackend, state: SimState, commit: &Commit) -> (SimState, StepOutcome) {
    let parent = match git.parent_of(&commit.hash) {
        Ok(Some(parent)) => parent,
        Ok(None) => {
            return (
                state,
                StepOutcome::Conflict("root commit has no parent to diff against".to_string()),
            );
        }
        Err(e) => return (state, StepOutcome::Conflict(e.to_string())),
    };

    let tree = match git.merge_tree(&parent, &state.base, &commit.hash) {
        Ok(TreeMerge::Clean(tree)) => tree,
        Ok(TreeMerge::Conflict(detail)) => return (state, StepOutcome::Conflict(detail)),
        Err(e) => return (state, StepOutcome::Conflict(e.to_string())),
    };

    match git.tree_of(&state.base) {
        Ok(base_tree) if base_tree == tree => return (state, StepOutcome::Empty),
        Ok(_) => {}
        // Can't compare trees; keep the commit
        Err(e) => debug!(base = %state.base, error = %e, "could not read base tree"),
    }

    match git.commit_tree(&tree, &state.base, SIMULATED_COMMIT_MESSAGE) {
        Ok(next) => (SimState::new(next), StepOutcome::Applied { approximate: false }),
        Err(e) => {
            warn!(
                commit = %commit.short_hash,
                error = %e,
                "could not write simulated commit; later results are approximate"
            );
            (
                SimState::new(commit.hash.clone()),
                StepOutcome::Applied { approximate: true },
            )
        }
    }
}

/// Analyse `commits` for landing onto `main_ref`
///
/// `source_branch` narrows the Change-Id scan of `main_ref` to the window
/// since its merge-base with that branch.
pub fn analyze(
    git: &dyn GitBackend,
    commits: &[Commit],
    main_ref: &str,
    source_branch: Option<&str>,
) -> Result<CommitAnalysis> {
    let main_tokens = tokens_in_ref(git, main_ref, source_branch)
        .map_err(|e| Error::Git(format!("failed to get change-ids from {main_ref}: {e}")))?;

    let (already_landed, candidates) = partition_landed(commits, &main_tokens);
    for commit in &already_landed {
        debug!(commit = %commit.short_hash, "already on {main_ref} by change-id");
    }

    if candidates.is_empty() {
        return Ok(CommitAnalysis {
            mode: AnalysisMode::Full,
            ..CommitAnalysis::identity_only(Vec::new(), already_landed)
        });
    }

    if !git.supports_merge_tree(main_ref) {
        warn!("git merge-tree --write-tree unavailable; skipping conflict detection");
        return Ok(CommitAnalysis::identity_only(candidates, already_landed));
    }

    let total = candidates.len();
    let mut state = SimState::new(main_ref);
    let mut analysis = CommitAnalysis {
        valid_commits: Vec::new(),
        conflict: None,
        already_landed,
        empty_commits: Vec::new(),
        approximations: Vec::new(),
        mode: AnalysisMode::Full,
    };

    for (i, commit) in candidates.into_iter().enumerate() {
        let (next, outcome) = simulate_step(git, state, &commit);
        state = next;
        match outcome {
            StepOutcome::Applied { approximate } => {
                if approximate {
                    analysis.approximations.push(commit.hash.clone());
                }
                analysis.valid_commits.push(commit);
            }
            StepOutcome::Empty => {
                debug!(commit = %commit.short_hash, "would be empty; skipping");
                analysis.empty_commits.push(commit);
            }
            StepOutcome::Conflict(detail) => {
                analysis.conflict = Some(Conflict {
                    commit,
                    position: i + 1,
                    total,
                    detail,
                });
                break;
            }
        }
    }

    Ok(analysis)
}

/// Split commits into (already landed by Change-Id, still to apply)
///
/// Commits without any Change-Id are never considered landed.
pub fn partition_landed<S: std::hash::BuildHasher>(
    commits: &[Commit],
    main_tokens: &HashSet<String, S>,
) -> (Vec<Commit>, Vec<Commit>) {
    commits
        .iter()
        .cloned()
        .partition(|commit| commit.is_known_to(main_tokens))
}
