//! Shared command context for CLI commands
//!
//! Every command opens the repository and loads the configuration the same
//! way; the main branch is resolved per command since `list` and `land
//! --force` treat it differently.

use palimp::config::Config;
use palimp::error::Result;
use palimp::git::GitCli;
use std::path::Path;
use tracing::debug;

/// Shared context for CLI commands that act on a repository
pub struct CommandContext {
    /// Repository backend
    pub git: GitCli,
    /// Loaded configuration
    pub config: Config,
}

impl CommandContext {
    /// Open the repository at `path` and load configuration
    pub fn new(path: &Path, config_path: Option<&Path>) -> Result<Self> {
        let git = GitCli::open(path)?;
        let config = Config::load(config_path)?;
        debug!(
            path = %git.path().display(),
            prefix = %config.branch_prefix,
            "command context ready"
        );
        Ok(Self { git, config })
    }

    /// Glob-style description of the managed branches (e.g. `sketch/*`)
    pub fn branch_pattern(&self) -> String {
        format!("{}*", self.config.branch_prefix)
    }
}
