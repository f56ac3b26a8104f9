//! Command implementations for the `palimp` binary

pub mod context;
pub mod drop;
pub mod land;
pub mod list;
pub mod style;
pub mod update;

use anstream::{eprintln, println};
use async_trait::async_trait;
use palimp::progress::ProgressCallback;
use style::{Stylize, arrow};

/// Prints executor progress to the terminal
pub struct CliProgress {
    indent: &'static str,
}

impl CliProgress {
    /// Progress lines without indentation
    pub const fn compact() -> Self {
        Self { indent: "" }
    }

    /// Progress lines nested under a heading
    pub const fn nested() -> Self {
        Self { indent: "  " }
    }
}

#[async_trait]
impl ProgressCallback for CliProgress {
    async fn on_message(&self, message: &str) {
        println!("{}{} {message}", self.indent, arrow());
    }

    async fn on_warning(&self, message: &str) {
        eprintln!("{}{}", self.indent, format!("warning: {message}").warn());
    }
}
