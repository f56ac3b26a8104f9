//! Real git repositories in temporary directories

#![allow(dead_code)]

use palimp::git::GitCli;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// A throwaway repository driven by the `git` binary
///
/// Starts with one commit on `main`, which is checked out. The repository
/// has its own identity configured so commits never depend on the host.
pub struct TempGitRepo {
    dir: TempDir,
}

impl TempGitRepo {
    pub fn new() -> Self {
        let repo = Self {
            dir: TempDir::new().expect("create temp dir"),
        };
        repo.git(&["init", "--quiet"]);
        repo.git(&["symbolic-ref", "HEAD", "refs/heads/main"]);
        repo.git(&["config", "user.name", "Test User"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo.commit_file("README", "init\n", "Initial commit");
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Backend for the engine
    pub fn backend(&self) -> GitCli {
        GitCli::open(self.path()).expect("open repo")
    }

    /// Run git and return trimmed stdout, panicking on failure
    pub fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .arg("-C")
            .arg(self.path())
            .args(args)
            .output()
            .expect("run git");
        assert!(
            output.status.success(),
            "git {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }

    /// Whether this git has `merge-tree --write-tree --merge-base` (git 2.40+)
    pub fn supports_merge_tree(&self) -> bool {
        Command::new("git")
            .arg("-C")
            .arg(self.path())
            .args(["merge-tree", "--write-tree", "--merge-base=HEAD", "HEAD", "HEAD"])
            .output()
            .is_ok_and(|o| o.status.success())
    }

    pub fn write(&self, file: &str, content: &str) {
        fs::write(self.path().join(file), content).expect("write file");
    }

    /// Write a file and commit it on the current branch, returning the hash
    pub fn commit_file(&self, file: &str, content: &str, message: &str) -> String {
        self.write(file, content);
        self.git(&["add", "--all"]);
        self.git(&["commit", "--quiet", "-m", message]);
        self.git(&["rev-parse", "HEAD"])
    }

    /// Create `name` from the current branch and check it out
    pub fn start_branch(&self, name: &str) {
        self.git(&["checkout", "--quiet", "-b", name]);
    }

    pub fn checkout(&self, name: &str) {
        self.git(&["checkout", "--quiet", name]);
    }

    pub fn branch_exists(&self, name: &str) -> bool {
        Command::new("git")
            .arg("-C")
            .arg(self.path())
            .args(["show-ref", "--verify", "--quiet", &format!("refs/heads/{name}")])
            .status()
            .is_ok_and(|s| s.success())
    }

    pub fn current_branch(&self) -> String {
        self.git(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// Subjects from `rev` back to the root, newest first
    pub fn subjects(&self, rev: &str) -> Vec<String> {
        self.git(&["log", "--format=%s", rev])
            .lines()
            .map(String::from)
            .collect()
    }

    /// Full message of the commit at `rev`
    pub fn message(&self, rev: &str) -> String {
        self.git(&["log", "-1", "--format=%B", rev])
    }

    /// Empty config file so host configuration never leaks into a test
    pub fn empty_config(&self) -> std::path::PathBuf {
        let path = self.path().join(".git").join("palimp-test.toml");
        fs::write(&path, "").expect("write config");
        path
    }
}

impl Default for TempGitRepo {
    fn default() -> Self {
        Self::new()
    }
}
