//! `GitBackend` implemented by shelling out to the `git` binary

use super::{GitBackend, TreeMerge};
use crate::error::{Error, Result};
use crate::types::RefInfo;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::OnceLock;
use tracing::debug;

/// Identity used for the throwaway commits written during analysis
const SYNTHETIC_IDENTITY: (&str, &str) = ("palimp", "palimp@localhost");

/// Git backend that runs `git -C <path> ...` for every primitive
///
/// Every call blocks until git exits; there is no timeout beyond git's own.
#[derive(Debug)]
pub struct GitCli {
    path: PathBuf,
    program: PathBuf,
    merge_tree_supported: OnceLock<bool>,
}

impl GitCli {
    /// Open a backend rooted at `path`
    ///
    /// Fails if `path` is not inside a git work tree.
    pub fn open(path: &Path) -> Result<Self> {
        let cli = Self {
            path: path.to_path_buf(),
            program: PathBuf::from("git"),
            merge_tree_supported: OnceLock::new(),
        };
        let inside = cli.stdout(&["rev-parse", "--is-inside-work-tree"])?;
        if inside != "true" {
            return Err(Error::Git(format!(
                "{} is not inside a git work tree",
                path.display()
            )));
        }
        Ok(cli)
    }

    /// Repository path this backend operates on
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `program` instead of the `git` found on `PATH`
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-C").arg(&self.path).args(args);
        cmd
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        debug!(?args, "git");
        let output = self
            .command(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::Git(format!("failed to spawn git: {e}")))?;
        Ok(output)
    }

    /// Run and return trimmed stdout, failing on non-zero exit
    fn stdout(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;
        if !output.status.success() {
            return Err(command_error(args, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run and report only whether git exited zero
    fn succeeds(&self, args: &[&str]) -> Result<bool> {
        Ok(self.run(args)?.status.success())
    }

    /// Run a mutating command, failing with its output on non-zero exit
    fn mutate(&self, args: &[&str]) -> Result<()> {
        let output = self.run(args)?;
        if !output.status.success() {
            return Err(command_error(args, &output));
        }
        debug!(
            stdout = %String::from_utf8_lossy(&output.stdout).trim(),
            "git succeeded"
        );
        Ok(())
    }

    fn git_dir(&self) -> Result<PathBuf> {
        let dir = PathBuf::from(self.stdout(&["rev-parse", "--git-dir"])?);
        if dir.is_absolute() {
            Ok(dir)
        } else {
            Ok(self.path.join(dir))
        }
    }
}

fn merge_base_arg(merge_base: &str) -> String {
    format!("--merge-base={merge_base}")
}

fn merge_tree_args<'a>(base_arg: &'a str, ours: &'a str, theirs: &'a str) -> [&'a str; 5] {
    ["merge-tree", "--write-tree", base_arg, ours, theirs]
}

fn command_error(args: &[&str], output: &Output) -> Error {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let detail = if stderr.trim().is_empty() {
        stdout.trim().to_string()
    } else {
        stderr.trim().to_string()
    };
    Error::Git(format!(
        "git {} exited with {}: {detail}",
        args.first().copied().unwrap_or_default(),
        output.status
    ))
}

impl GitBackend for GitCli {
    fn branch_exists(&self, branch: &str) -> Result<bool> {
        self.succeeds(&[
            "show-ref",
            "--verify",
            "--quiet",
            &format!("refs/heads/{branch}"),
        ])
    }

    fn list_branches(&self, pattern: &str) -> Result<Vec<String>> {
        let out = self.stdout(&[
            "for-each-ref",
            "--format=%(refname:short)",
            &format!("refs/heads/{pattern}"),
        ])?;
        Ok(out.split_whitespace().map(String::from).collect())
    }

    fn ref_info(&self, rev: &str) -> Result<RefInfo> {
        let out = self.stdout(&["log", "-1", "--format=%H%x00%ct%x00%s", rev, "--"])?;
        let mut parts = out.splitn(3, '\0');
        let (Some(hash), Some(timestamp), Some(subject)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::Git(format!("unexpected git log output for {rev}")));
        };
        let timestamp = timestamp
            .parse()
            .map_err(|e| Error::Git(format!("failed to parse timestamp {timestamp:?}: {e}")))?;
        Ok(RefInfo {
            hash: hash.to_string(),
            timestamp,
            subject: subject.to_string(),
        })
    }

    fn ahead_behind(&self, base: &str, branch: &str) -> Result<(usize, usize)> {
        let out = self.stdout(&[
            "rev-list",
            "--left-right",
            "--count",
            &format!("{base}...{branch}"),
        ])?;
        let counts: Vec<usize> = out
            .split_whitespace()
            .map(str::parse)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::Git(format!("failed to parse ahead/behind counts: {e}")))?;
        match counts.as_slice() {
            [behind, ahead] => Ok((*ahead, *behind)),
            _ => Err(Error::Git(format!("unexpected rev-list output: {out}"))),
        }
    }

    fn list_commits(&self, base: &str, tip: &str) -> Result<Vec<String>> {
        let out = self.stdout(&["rev-list", "--reverse", &format!("{base}..{tip}")])?;
        Ok(out.split_whitespace().map(String::from).collect())
    }

    fn commit_message(&self, hash: &str) -> Result<String> {
        let output = self.run(&["log", "-1", "--format=%B", hash, "--"])?;
        if !output.status.success() {
            return Err(command_error(&["log"], &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }

    fn short_hash(&self, hash: &str) -> String {
        self.stdout(&["rev-parse", "--short", hash])
            .unwrap_or_else(|_| hash.chars().take(8).collect())
    }

    fn log_messages(&self, tip: &str, exclude: Option<&str>) -> Result<Vec<String>> {
        let excluded = exclude.map(|rev| format!("^{rev}"));
        let mut args = vec!["log", "--format=%B%x00", tip];
        if let Some(ref rev) = excluded {
            args.push(rev);
        }
        args.push("--");
        let output = self.run(&args)?;
        if !output.status.success() {
            return Err(Error::Git(format!(
                "failed to get commits from {tip}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .split('\0')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect())
    }

    fn merge_base(&self, a: &str, b: &str) -> Result<String> {
        self.stdout(&["merge-base", a, b])
    }

    fn parent_of(&self, rev: &str) -> Result<Option<String>> {
        let output = self.run(&["rev-parse", "--verify", "--quiet", &format!("{rev}^")])?;
        if output.status.success() {
            Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
        } else {
            Ok(None)
        }
    }

    fn rev_parse(&self, rev: &str) -> Result<String> {
        self.stdout(&["rev-parse", "--verify", &format!("{rev}^{{commit}}")])
    }

    fn supports_merge_tree(&self, rev: &str) -> bool {
        *self.merge_tree_supported.get_or_init(|| {
            // Same flags as `merge_tree`; git before 2.40 has --write-tree but not --merge-base.
            let base_arg = merge_base_arg(rev);
            let supported = self
                .succeeds(&merge_tree_args(&base_arg, rev, rev))
                .unwrap_or(false);
            debug!(supported, "merge-tree --write-tree --merge-base support");
            supported
        })
    }

    fn merge_tree(&self, merge_base: &str, ours: &str, theirs: &str) -> Result<TreeMerge> {
        let base_arg = merge_base_arg(merge_base);
        let output = self.run(&merge_tree_args(&base_arg, ours, theirs))?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        match output.status.code() {
            Some(0) => match stdout.lines().next().map(str::trim) {
                Some(tree) if !tree.is_empty() => Ok(TreeMerge::Clean(tree.to_string())),
                _ => Ok(TreeMerge::Conflict(
                    "unexpected empty output from merge-tree".to_string(),
                )),
            },
            Some(1) => {
                let detail: Vec<&str> = stdout
                    .lines()
                    .skip(1)
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .collect();
                Ok(TreeMerge::Conflict(if detail.is_empty() {
                    "merge-tree reported conflicts".to_string()
                } else {
                    detail.join("; ")
                }))
            }
            _ => Err(command_error(&["merge-tree"], &output)),
        }
    }

    fn tree_of(&self, rev: &str) -> Result<String> {
        self.stdout(&["rev-parse", &format!("{rev}^{{tree}}")])
    }

    fn commit_tree(&self, tree: &str, parent: &str, message: &str) -> Result<String> {
        let (name, email) = SYNTHETIC_IDENTITY;
        let args = ["commit-tree", tree, "-p", parent, "-m", message];
        debug!(?args, "git");
        let output = self
            .command(&args)
            .env("GIT_AUTHOR_NAME", name)
            .env("GIT_AUTHOR_EMAIL", email)
            .env("GIT_COMMITTER_NAME", name)
            .env("GIT_COMMITTER_EMAIL", email)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::Git(format!("failed to spawn git: {e}")))?;
        if !output.status.success() {
            return Err(command_error(&args, &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn diff(&self, from: &str, to: &str) -> Result<String> {
        let range = format!("{from}..{to}");
        let output = self.run(&["diff", &range])?;
        if !output.status.success() {
            return Err(command_error(&["diff"], &output));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn current_branch(&self) -> Result<String> {
        self.stdout(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn git_dir_contains(&self, relative: &str) -> Result<bool> {
        Ok(self.git_dir()?.join(relative).exists())
    }

    fn has_staged_changes(&self) -> Result<bool> {
        Ok(!self.succeeds(&["diff-index", "--quiet", "--cached", "HEAD", "--"])?)
    }

    fn has_unstaged_changes(&self) -> Result<bool> {
        Ok(!self.succeeds(&["diff-files", "--quiet"])?)
    }

    fn delete_branch(&self, branch: &str) -> Result<()> {
        self.mutate(&["branch", "-D", branch])
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        self.mutate(&["checkout", "--quiet", branch])
    }

    fn rebase(&self, onto: &str) -> Result<()> {
        self.mutate(&["rebase", onto])
    }

    fn rebase_abort(&self) -> Result<()> {
        self.mutate(&["rebase", "--abort"])
    }

    fn cherry_pick(&self, hash: &str) -> Result<()> {
        self.mutate(&["cherry-pick", hash])
    }

    fn reset_soft(&self, rev: &str) -> Result<()> {
        self.mutate(&["reset", "--soft", rev])
    }

    fn commit(&self, message: &str) -> Result<()> {
        let args = ["commit", "--quiet", "-F", "-"];
        debug!(?args, "git");
        let mut child = self
            .command(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Git(format!("failed to spawn git: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Internal("git commit has no stdin".to_string()))?;
        stdin.write_all(message.as_bytes())?;
        drop(stdin);

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(command_error(&args, &output));
        }
        Ok(())
    }
}
