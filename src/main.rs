//! palimp - land, rebase and discard sketch branches

mod cli;

use anstream::eprintln;
use anyhow::Context;
use clap::{Parser, Subcommand};
use cli::context::CommandContext;
use cli::land::LandCommandOptions;
use cli::style::Stylize;
use palimp::types::LandOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Manage sketch/* branches: land them on main without merge commits,
/// rebase them, or throw them away
#[derive(Parser)]
#[command(name = "palimp", version, about)]
struct Cli {
    /// Path to the repository
    #[arg(long, global = true, default_value = ".")]
    path: PathBuf,

    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List sketch branches with ahead/behind counts and land status
    #[command(visible_alias = "ls")]
    List,

    /// Cherry-pick a sketch branch onto main, then delete it
    #[command(visible_alias = "y")]
    Land {
        /// Branch to land (the sketch/ prefix is optional)
        branch: String,

        /// Squash the landed commits into one
        #[arg(short, long)]
        squash: bool,

        /// Show what would be done without executing
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Do not require main to be checked out
        #[arg(short, long)]
        force: bool,

        /// Draft the squash message with an LLM
        #[arg(long)]
        llm: bool,

        /// Preview the plan and ask before executing
        #[arg(long)]
        confirm: bool,
    },

    /// Force-delete a sketch branch
    #[command(visible_alias = "d")]
    Drop {
        /// Branch to delete
        branch: String,

        /// Show what would be done without executing
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Rebase a sketch branch onto main
    #[command(visible_alias = "up")]
    Update {
        /// Branch to rebase
        branch: String,

        /// Show what would be done without executing
        #[arg(short = 'n', long)]
        dry_run: bool,
    },
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    setup_logging(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format!("palimp: {e:#}").error());
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> anyhow::Result<()> {
    let ctx = CommandContext::new(&args.path, args.config.as_deref())
        .context("startup failed")?;

    match args.command {
        Commands::List => cli::list::run_list(&ctx)?,
        Commands::Land {
            branch,
            squash,
            dry_run,
            force,
            llm,
            confirm,
        } => {
            let options = LandCommandOptions {
                land: LandOptions {
                    squash,
                    dry_run,
                    force,
                    use_llm: llm,
                },
                confirm,
            };
            cli::land::run_land(&ctx, &branch, options).await?;
        }
        Commands::Drop { branch, dry_run } => cli::drop::run_drop(&ctx, &branch, dry_run)?,
        Commands::Update { branch, dry_run } => {
            cli::update::run_update(&ctx, &branch, dry_run).await?;
        }
    }

    Ok(())
}
