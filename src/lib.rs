//! palimp - land, rebase and discard sketch branches
//!
//! Sketch branches (`sketch/*` by default) hold work produced by an
//! automated agent. palimp lands their commits onto main by cherry-pick
//! without merge commits, recognising work that already landed through its
//! `Change-Id:` trailer and proving the whole sequence applies before
//! anything is mutated.
//!
//! The engine talks to the repository only through [`git::GitBackend`];
//! [`git::GitCli`] drives the `git` binary.

pub mod change_id;
pub mod config;
pub mod draft;
pub mod error;
pub mod git;
pub mod guard;
pub mod inventory;
pub mod land;
pub mod progress;
pub mod types;
pub mod update;

pub use error::{Error, Result};
