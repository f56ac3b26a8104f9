//! Terminal styling helpers
//!
//! Output goes through `anstream`, which strips the escapes when stdout is
//! not a terminal, so the helpers here always emit color.

use indicatif::ProgressStyle;
use owo_colors::{Style, Styled};
use std::fmt::Display;

/// Success mark
pub const CHECK: &str = "✓";

/// Step marker
pub const ARROW: &str = "→";

/// Prefix for every line printed in dry-run mode
pub const DRY_RUN: &str = "[DRY RUN]";

/// Semantic styles for anything displayable
pub trait Stylize: Display {
    /// De-emphasised secondary text
    fn muted(&self) -> Styled<&Self> {
        Style::new().dimmed().style(self)
    }

    /// Names and counts the user should notice
    fn accent(&self) -> Styled<&Self> {
        Style::new().cyan().style(self)
    }

    /// Headings
    fn emphasis(&self) -> Styled<&Self> {
        Style::new().bold().style(self)
    }

    /// Completed actions
    fn success(&self) -> Styled<&Self> {
        Style::new().green().style(self)
    }

    /// Problems that did not stop the command
    fn warn(&self) -> Styled<&Self> {
        Style::new().yellow().style(self)
    }

    /// Failures
    fn error(&self) -> Styled<&Self> {
        Style::new().red().bold().style(self)
    }
}

impl<T: Display + ?Sized> Stylize for T {}

/// Green check mark
pub fn check() -> Styled<&'static str> {
    Style::new().green().style(CHECK)
}

/// Dimmed arrow
pub fn arrow() -> Styled<&'static str> {
    Style::new().dimmed().style(ARROW)
}

/// Spinner used while analysing branches
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "])
}
