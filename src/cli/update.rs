//! Update command - rebase a sketch branch onto main

use crate::cli::CliProgress;
use crate::cli::context::CommandContext;
use crate::cli::style::{CHECK, DRY_RUN, Stylize, spinner_style};
use anstream::println;
use indicatif::ProgressBar;
use palimp::error::Result;
use palimp::update::{execute_update, plan_update};
use std::time::Duration;

/// Run the update command
pub async fn run_update(ctx: &CommandContext, branch: &str, dry_run: bool) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message(format!(
        "Validating {}...",
        ctx.config.normalize_branch(branch).emphasis()
    ));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let plan = plan_update(&ctx.git, &ctx.config, branch);
    spinner.finish_and_clear();
    let plan = plan?;

    if !plan.commits.is_empty() {
        println!(
            "Validated that {} commits can be rebased.",
            plan.commits.len().accent()
        );
    }

    if dry_run {
        println!(
            "{} Would rebase {} onto {}",
            DRY_RUN.muted(),
            plan.branch,
            plan.main
        );
        for step in plan.steps() {
            println!("{}   {step}", DRY_RUN.muted());
        }
        return Ok(());
    }

    let progress = CliProgress::compact();
    execute_update(&plan, &ctx.git, &progress).await?;

    println!(
        "{} {}",
        format!("{CHECK} Successfully updated").success(),
        plan.branch.accent()
    );
    Ok(())
}
