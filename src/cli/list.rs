//! List command - show sketch branches with their land status

use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, spinner_style};
use anstream::println;
use indicatif::ProgressBar;
use palimp::error::Result;
use palimp::guard::{check_repo_state, find_main_branch};
use palimp::inventory::list_branches;
use palimp::land::{StatusReport, classify};
use palimp::types::Branch;
use std::time::Duration;

const HEADERS: [&str; 6] = ["BRANCH", "AHEAD", "BEHIND", "LAST COMMIT", "STATUS", "SUBJECT"];

/// Run the list command
pub fn run_list(ctx: &CommandContext) -> Result<()> {
    check_repo_state(&ctx.git)?;
    let main = find_main_branch(&ctx.git, &ctx.config.main_branches)?;

    let branches = list_branches(&ctx.git, &ctx.config.branch_prefix, &main)?;
    if branches.is_empty() {
        println!("No {} branches found.", ctx.branch_pattern());
        return Ok(());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message(format!("Checking {} branch(es)...", branches.len()));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let reports: Vec<StatusReport> = branches
        .iter()
        .map(|branch| {
            spinner.set_message(format!("Checking {}...", branch.name));
            classify(&ctx.git, &branch.name, &ctx.config.main_branches)
        })
        .collect();

    spinner.finish_and_clear();

    let rows: Vec<[String; 6]> = branches
        .iter()
        .zip(&reports)
        .map(|(branch, report)| row(ctx, branch, *report))
        .collect();

    let mut lines = render_table(&rows).into_iter();
    if let Some(header) = lines.next() {
        println!("{}", header.emphasis());
    }
    for line in lines {
        println!("{line}");
    }

    if reports.iter().any(|r| !r.verified) {
        println!();
        println!(
            "{}",
            "? git merge-tree --write-tree is unavailable; CLEAN and EMPTY were not checked for conflicts"
                .muted()
        );
    }

    Ok(())
}

fn row(ctx: &CommandContext, branch: &Branch, report: StatusReport) -> [String; 6] {
    let behind = if branch.behind > 0 {
        format!("-{}", branch.behind)
    } else {
        String::new()
    };
    let status = if report.verified {
        report.status.to_string()
    } else {
        format!("{}?", report.status)
    };

    [
        ctx.config.short_name(&branch.name).to_string(),
        format!("+{}", branch.ahead),
        behind,
        branch.date.format("%Y-%m-%d").to_string(),
        status,
        branch.subject.clone(),
    ]
}

/// Lay out rows under the header with two-space column gaps
fn render_table(rows: &[[String; 6]]) -> Vec<String> {
    let mut widths = HEADERS.map(str::len);
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: [&str; 6]| {
        let mut line = String::new();
        for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
            if i + 1 == cells.len() {
                line.push_str(cell);
            } else {
                line.push_str(&format!("{cell:<width$}  "));
            }
        }
        line.trim_end().to_string()
    };

    let mut lines = vec![format_row(HEADERS)];
    lines.extend(
        rows.iter()
            .map(|row| format_row(std::array::from_fn(|i| row[i].as_str()))),
    );
    lines
}
