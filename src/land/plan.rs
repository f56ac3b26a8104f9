//! Landing plans - pure functions for deciding what a landing will do
//!
//! No I/O happens here. The plan is built from an analysis that was already
//! gathered, so a dry run and a real run print and execute the same steps.

use crate::error::Result;
use crate::land::analyze::{CommitAnalysis, LAND_CONFLICT_GUIDANCE};
use crate::land::squash::combined_message;
use crate::types::{Commit, LandOptions};

/// A single step in the landing plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LandStep {
    /// Cherry-pick one commit onto the current position
    CherryPick {
        /// 1-based position in the sequence
        position: usize,
        /// Number of cherry-picks in the plan
        total: usize,
        /// The commit to apply
        commit: Commit,
    },
    /// Collapse the applied commits into one
    Squash {
        /// The applied commits, in order
        commits: Vec<Commit>,
        /// Deterministic combined message (also the drafting fallback)
        combined_message: String,
        /// Ask the drafting service for the message first
        use_llm: bool,
    },
    /// Delete the source branch
    DeleteBranch {
        /// Branch to delete
        branch: String,
    },
}

impl std::fmt::Display for LandStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CherryPick {
                position,
                total,
                commit,
            } => write!(
                f,
                "Cherry-pick {position}/{total}: {} {}",
                commit.short_hash, commit.subject
            ),
            Self::Squash {
                commits, use_llm, ..
            } => {
                let how = if *use_llm {
                    "drafted message"
                } else {
                    "combined message"
                };
                write!(f, "Squash {} commits into one with {how}", commits.len())
            }
            Self::DeleteBranch { branch } => write!(f, "Delete branch {branch}"),
        }
    }
}

/// Landing plan - the pure output of planning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandPlan {
    /// Source branch
    pub branch: String,
    /// Target main branch
    pub main: String,
    /// Number of commits on the branch that are not on main
    pub commit_count: usize,
    /// Ordered steps to perform; empty when the branch has no commits
    pub steps: Vec<LandStep>,
    /// Commits skipped because their Change-Id is already on main
    pub skipped_landed: Vec<Commit>,
    /// Commits skipped because they would be empty
    pub skipped_empty: Vec<Commit>,
    /// Analysis ran without merge simulation
    pub degraded: bool,
}

impl LandPlan {
    /// Plan for a branch with no commits beyond main
    #[must_use]
    pub fn nothing_to_land(branch: &str, main: &str) -> Self {
        Self {
            branch: branch.to_string(),
            main: main.to_string(),
            commit_count: 0,
            steps: Vec::new(),
            skipped_landed: Vec::new(),
            skipped_empty: Vec::new(),
            degraded: false,
        }
    }

    /// Whether the plan does nothing at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Commits that will be cherry-picked, in order
    #[must_use]
    pub fn commits_to_apply(&self) -> Vec<&Commit> {
        self.steps
            .iter()
            .filter_map(|s| match s {
                LandStep::CherryPick { commit, .. } => Some(commit),
                _ => None,
            })
            .collect()
    }

    /// Whether the branch is fully subsumed and only needs deleting
    #[must_use]
    pub fn is_subsumed(&self) -> bool {
        matches!(self.steps.as_slice(), [LandStep::DeleteBranch { .. }])
    }
}

/// Create a landing plan (PURE - no I/O, easily testable)
///
/// Fails with the conflict diagnostic when the analysis recorded one; in
/// that case nothing may be applied.
pub fn create_land_plan(
    branch: &str,
    main: &str,
    commit_count: usize,
    analysis: &CommitAnalysis,
    options: &LandOptions,
) -> Result<LandPlan> {
    if let Some(conflict) = &analysis.conflict {
        return Err(conflict.to_error(LAND_CONFLICT_GUIDANCE));
    }

    let valid = &analysis.valid_commits;
    let total = valid.len();
    let mut steps: Vec<LandStep> = valid
        .iter()
        .enumerate()
        .map(|(i, commit)| LandStep::CherryPick {
            position: i + 1,
            total,
            commit: commit.clone(),
        })
        .collect();

    if options.squash && total > 1 {
        steps.push(LandStep::Squash {
            commits: valid.clone(),
            combined_message: combined_message(valid),
            use_llm: options.use_llm,
        });
    }

    steps.push(LandStep::DeleteBranch {
        branch: branch.to_string(),
    });

    Ok(LandPlan {
        branch: branch.to_string(),
        main: main.to_string(),
        commit_count,
        steps,
        skipped_landed: analysis.already_landed.clone(),
        skipped_empty: analysis.empty_commits.clone(),
        degraded: analysis.is_degraded(),
    })
}
