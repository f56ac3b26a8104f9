//! User configuration loaded from `config.toml`.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV: &str = "PALIMP_CONFIG";

/// Directory name under the platform config dir.
const CONFIG_DIR: &str = "palimp";

/// Filename for the config file.
const CONFIG_FILE: &str = "config.toml";

/// Tool configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Main-branch candidates, tried in order; the first that exists wins
    pub main_branches: Vec<String>,
    /// Prefix shared by all managed branches
    pub branch_prefix: String,
    /// Open squash messages in `$EDITOR` when running interactively
    pub edit_squash_message: bool,
    /// Message-drafting service settings
    pub draft: DraftConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            main_branches: ["main", "master", "trunk", "develop", "default", "stable"]
                .into_iter()
                .map(String::from)
                .collect(),
            branch_prefix: "sketch/".to_string(),
            edit_squash_message: true,
            draft: DraftConfig::default(),
        }
    }
}

/// Settings for the external message-drafting service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DraftConfig {
    /// Model identifier sent with each request
    pub model: String,
    /// API base URL
    pub base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum tokens in the drafted message
    pub max_tokens: u32,
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            timeout_secs: 30,
            max_tokens: 4096,
        }
    }
}

impl DraftConfig {
    /// Request timeout as a `Duration`
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Error::Draft(format!(
                "{} environment variable is not set",
                self.api_key_env
            ))),
        }
    }
}

impl Config {
    /// Parse a config document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::Config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.main_branches.iter().all(|b| b.trim().is_empty()) {
            return Err(Error::Config(
                "main_branches must name at least one branch".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration.
    ///
    /// An explicit `path` wins, then `$PALIMP_CONFIG`, then the platform
    /// config directory. A missing file at the default location yields the
    /// defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        match explicit {
            Some(path) => Self::load_file(&path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::load_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Ensure a branch name carries the configured prefix
    #[must_use]
    pub fn normalize_branch(&self, branch: &str) -> String {
        if branch.starts_with(&self.branch_prefix) {
            branch.to_string()
        } else {
            format!("{}{branch}", self.branch_prefix)
        }
    }

    /// Strip the configured prefix for display
    #[must_use]
    pub fn short_name<'a>(&self, branch: &'a str) -> &'a str {
        branch.strip_prefix(&self.branch_prefix).unwrap_or(branch)
    }
}

/// Default config location (`<config_dir>/palimp/config.toml`)
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}
