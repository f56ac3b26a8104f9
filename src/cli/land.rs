//! Land command - cherry-pick a sketch branch onto main

use crate::cli::CliProgress;
use crate::cli::context::CommandContext;
use crate::cli::style::{CHECK, DRY_RUN, Stylize, check, spinner_style};
use anstream::{eprintln, println};
use dialoguer::{Confirm, Editor};
use indicatif::ProgressBar;
use palimp::draft::{AnthropicDrafter, MessageDrafter, MessageSource};
use palimp::error::{Error, Result};
use palimp::land::{
    AcceptMessage, LandExecutionResult, LandPlan, LandStep, MessageReview, execute_land,
    prepare_land,
};
use palimp::types::LandOptions;
use std::io::IsTerminal;
use std::time::Duration;
use tracing::warn;

/// Options for the land command
#[derive(Debug, Clone, Copy, Default)]
pub struct LandCommandOptions {
    /// Engine options
    pub land: LandOptions,
    /// Preview plan and prompt for confirmation before executing
    pub confirm: bool,
}

/// Opens squash messages in the user's editor
struct EditorReview;

impl MessageReview for EditorReview {
    fn review(&self, message: String) -> String {
        match Editor::new().edit(&message) {
            Ok(Some(edited)) if !edited.trim().is_empty() => edited,
            Ok(_) => message,
            Err(e) => {
                warn!(error = %e, "editor failed; keeping generated message");
                message
            }
        }
    }
}

/// Run the land command
pub async fn run_land(
    ctx: &CommandContext,
    branch: &str,
    options: LandCommandOptions,
) -> Result<()> {
    // =========================================================================
    // Phase 1 + 2: GATHER and PLAN
    // =========================================================================

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message(format!(
        "Analyzing {}...",
        ctx.config.normalize_branch(branch).emphasis()
    ));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let plan = prepare_land(&ctx.git, &ctx.config, branch, &options.land);
    spinner.finish_and_clear();
    let plan = plan?;

    if plan.is_empty() {
        println!("Branch {} has no commits to land.", plan.branch.accent());
        return Ok(());
    }

    print_analysis_summary(&plan);

    // =========================================================================
    // Phase 3: EXECUTE
    // =========================================================================

    if options.land.dry_run {
        for line in dry_run_lines(&plan) {
            println!("{} {line}", DRY_RUN.muted());
        }
        return Ok(());
    }

    if options.confirm {
        for line in dry_run_lines(&plan) {
            println!("  {line}");
        }
        if !Confirm::new()
            .with_prompt("Proceed with land?")
            .default(true)
            .interact()
            .map_err(|e| Error::Internal(format!("Failed to read confirmation: {e}")))?
        {
            println!("{}", "Aborted".muted());
            return Ok(());
        }
        println!();
    }

    let drafter = build_drafter(ctx, &plan);
    let review: Box<dyn MessageReview> =
        if ctx.config.edit_squash_message && std::io::stdin().is_terminal() {
            Box::new(EditorReview)
        } else {
            Box::new(AcceptMessage)
        };

    if !plan.is_subsumed() {
        println!(
            "Landing {} commits from {}...",
            plan.commits_to_apply().len().accent(),
            plan.branch.accent()
        );
    }

    let progress = CliProgress::nested();
    let result = execute_land(
        &plan,
        &ctx.git,
        drafter.as_ref().map(|d| d as &dyn MessageDrafter),
        review.as_ref(),
        &progress,
    )
    .await?;

    print_land_summary(&plan, &result);
    Ok(())
}

/// Drafting service for plans that ask for one
fn build_drafter(ctx: &CommandContext, plan: &LandPlan) -> Option<AnthropicDrafter> {
    let wants_draft = plan
        .steps
        .iter()
        .any(|s| matches!(s, LandStep::Squash { use_llm: true, .. }));
    if !wants_draft {
        return None;
    }

    match AnthropicDrafter::from_config(&ctx.config.draft) {
        Ok(drafter) => Some(drafter),
        Err(e) => {
            eprintln!("{}", format!("warning: {e}").warn());
            None
        }
    }
}

fn print_analysis_summary(plan: &LandPlan) {
    for commit in &plan.skipped_landed {
        println!(
            "{}",
            format!(
                "Skipping {} {} (already in {})",
                commit.short_hash, commit.subject, plan.main
            )
            .muted()
        );
    }
    for commit in &plan.skipped_empty {
        println!(
            "{}",
            format!("Skipping {} {} (would be empty)", commit.short_hash, commit.subject).muted()
        );
    }
    if plan.degraded {
        eprintln!(
            "{}",
            "warning: git merge-tree --write-tree unavailable; conflicts were not checked".warn()
        );
    }

    if plan.is_subsumed() {
        println!(
            "All commits from {} are already in {} or would result in empty cherry-picks.",
            plan.branch.accent(),
            plan.main
        );
    } else {
        println!(
            "Analysis successful. {} of {} commits ready to land.",
            plan.commits_to_apply().len(),
            plan.commit_count
        );
    }
}

/// Describe the plan exactly as execution would perform it
fn dry_run_lines(plan: &LandPlan) -> Vec<String> {
    if plan.is_subsumed() {
        return vec![format!("Would delete branch {}", plan.branch)];
    }

    let mut lines = vec![format!(
        "Would land {} commits from {}:",
        plan.commits_to_apply().len(),
        plan.branch
    )];

    for step in &plan.steps {
        lines.push(format!("  {step}"));
        if let LandStep::Squash {
            combined_message,
            use_llm,
            ..
        } = step
        {
            if *use_llm {
                lines.push(
                    "  (a drafted message is requested; the combined message below is the fallback)"
                        .to_string(),
                );
            }
            lines.push("  Combined commit message preview:".to_string());
            lines.extend(combined_message.lines().map(|l| format!("    {l}")));
        }
    }
    lines
}

fn print_land_summary(plan: &LandPlan, result: &LandExecutionResult) {
    println!();
    if let Some((_, source)) = &result.squash {
        let how = match source {
            MessageSource::Drafted => "drafted message",
            MessageSource::Combined => "combined message",
            MessageSource::Fallback => "combined message (drafting failed)",
        };
        println!("{} Squashed into one commit with {how}", check());
    }

    if result.has_applied() {
        println!(
            "{} {} commit(s) from {}",
            format!("{CHECK} Landed").success(),
            result.applied.len().accent(),
            plan.branch.accent()
        );
    }
    if result.branch_deleted {
        println!("{} Deleted branch {}", check(), plan.branch.accent());
    }
}
