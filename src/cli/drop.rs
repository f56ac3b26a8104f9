//! Drop command - discard a sketch branch

use crate::cli::context::CommandContext;
use crate::cli::style::{DRY_RUN, Stylize, check};
use anstream::println;
use palimp::error::Result;
use palimp::land::drop_branch;

/// Run the drop command
pub fn run_drop(ctx: &CommandContext, branch: &str, dry_run: bool) -> Result<()> {
    let branch = drop_branch(&ctx.git, &ctx.config, branch, dry_run)?;

    if dry_run {
        println!("{} Would delete branch {branch}", DRY_RUN.muted());
    } else {
        println!("{} Deleted branch {}", check(), branch.accent());
    }
    Ok(())
}
