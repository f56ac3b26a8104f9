//! Shared test utilities

mod fake_git;
mod temp_repo;

#[allow(unused_imports)]
pub use fake_git::{FakeGit, Files, GitCall, files};
#[allow(unused_imports)]
pub use temp_repo::TempGitRepo;

use palimp::types::Commit;

/// Message with a subject and one `Change-Id:` trailer
#[allow(dead_code)]
pub fn with_change_id(subject: &str, id: &str) -> String {
    format!("{subject}\n\nChange-Id: {id}")
}

/// Commits on `branch` not on `main`, resolved through the backend
#[allow(dead_code)]
pub fn branch_commits(git: &FakeGit, main: &str, branch: &str) -> Vec<Commit> {
    palimp::git::commits_between(git, main, branch).unwrap()
}
