//! In-memory git backend for testing
//!
//! These are test utilities - not all may be used in current tests.

#![allow(dead_code)]

use palimp::error::{Error, Result};
use palimp::git::{GitBackend, TreeMerge};
use palimp::types::RefInfo;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

/// File path -> contents
pub type Files = BTreeMap<String, String>;

/// Call record for a mutating operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitCall {
    CherryPick(String),
    DeleteBranch(String),
    Checkout(String),
    Rebase(String),
    RebaseAbort,
    ResetSoft(String),
    Commit(String),
}

#[derive(Debug, Clone)]
struct FakeCommit {
    parent: Option<String>,
    tree: String,
    message: String,
    timestamp: i64,
}

#[derive(Debug, Default)]
struct State {
    commits: HashMap<String, FakeCommit>,
    trees: HashMap<String, Files>,
    tree_ids: HashMap<Files, String>,
    branches: BTreeMap<String, String>,
    head: String,
    /// Tree staged by `reset_soft`, committed by `commit`
    index: Option<String>,
    markers: HashSet<String>,
    dirty_index: bool,
    dirty_worktree: bool,
    next_id: u64,
}

/// Simple in-memory repository implementing `GitBackend`
///
/// Features:
/// - Trees are file maps interned to stable ids, so identical content has
///   identical tree ids
/// - Single-parent commits, branches, a checked-out branch
/// - Per-file three-way merge for `merge_tree`, `cherry_pick` and `rebase`
/// - Call tracking for mutating operations
/// - Error injection for failure path testing
pub struct FakeGit {
    state: Mutex<State>,
    calls: Mutex<Vec<GitCall>>,
    failures: Mutex<HashMap<String, String>>,
    failing_cherry_picks: Mutex<HashSet<String>>,
    merge_tree_supported: Mutex<bool>,
}

impl Default for FakeGit {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeGit {
    /// Repository with a single commit on `main`, which is checked out
    pub fn new() -> Self {
        Self::with_main("main")
    }

    /// Repository whose first branch is `main_name`
    pub fn with_main(main_name: &str) -> Self {
        let git = Self {
            state: Mutex::new(State::default()),
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            failing_cherry_picks: Mutex::new(HashSet::new()),
            merge_tree_supported: Mutex::new(true),
        };
        {
            let mut state = git.state.lock().unwrap();
            let tree = intern(&mut state, files(&[("README", "init\n")]));
            let root = new_commit(&mut state, None, tree, "Initial commit");
            state.branches.insert(main_name.to_string(), root);
            state.head = main_name.to_string();
        }
        git
    }

    // === Repository building ===

    /// Commit `changes` on top of `branch`; `None` deletes a file
    pub fn commit_on(&self, branch: &str, message: &str, changes: &[(&str, Option<&str>)]) -> String {
        let mut state = self.state.lock().unwrap();
        let tip = state.branches[branch].clone();
        let mut tree = state.trees[&state.commits[&tip].tree].clone();
        for (path, content) in changes {
            match content {
                Some(content) => {
                    tree.insert((*path).to_string(), (*content).to_string());
                }
                None => {
                    tree.remove(*path);
                }
            }
        }
        let tree = intern(&mut state, tree);
        let hash = new_commit(&mut state, Some(tip), tree, message);
        state.branches.insert(branch.to_string(), hash.clone());
        hash
    }

    /// Commit a single file write on `branch`
    pub fn write_on(&self, branch: &str, message: &str, path: &str, content: &str) -> String {
        self.commit_on(branch, message, &[(path, Some(content))])
    }

    /// Create `name` pointing at the tip of `from`
    pub fn branch(&self, name: &str, from: &str) {
        let mut state = self.state.lock().unwrap();
        let tip = resolve(&state, from).unwrap();
        state.branches.insert(name.to_string(), tip);
    }

    /// Check out a branch without recording a call
    pub fn switch_to(&self, branch: &str) {
        self.state.lock().unwrap().head = branch.to_string();
    }

    // === Repository state ===

    /// Simulate an interrupted operation marker under the git directory
    pub fn add_marker(&self, marker: &str) {
        self.state.lock().unwrap().markers.insert(marker.to_string());
    }

    /// Simulate staged changes
    pub fn set_staged(&self, dirty: bool) {
        self.state.lock().unwrap().dirty_index = dirty;
    }

    /// Simulate unstaged changes
    pub fn set_unstaged(&self, dirty: bool) {
        self.state.lock().unwrap().dirty_worktree = dirty;
    }

    /// Pretend `git merge-tree --write-tree` is missing
    pub fn disable_merge_tree(&self) {
        *self.merge_tree_supported.lock().unwrap() = false;
    }

    // === Error injection methods ===

    /// Make the named `GitBackend` method return an error
    pub fn fail(&self, method: &str, msg: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(method.to_string(), msg.to_string());
    }

    /// Make `cherry_pick` fail for one commit
    pub fn fail_cherry_pick(&self, hash: &str) {
        self.failing_cherry_picks
            .lock()
            .unwrap()
            .insert(hash.to_string());
    }

    fn check_fail(&self, method: &str) -> Result<()> {
        match self.failures.lock().unwrap().get(method) {
            Some(msg) => Err(Error::Git(msg.clone())),
            None => Ok(()),
        }
    }

    // === Inspection ===

    /// Mutating calls in order
    pub fn calls(&self) -> Vec<GitCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: GitCall) {
        self.calls.lock().unwrap().push(call);
    }

    /// Tip hash of a branch, if it exists
    pub fn tip(&self, branch: &str) -> Option<String> {
        self.state.lock().unwrap().branches.get(branch).cloned()
    }

    /// Currently checked-out branch
    pub fn head(&self) -> String {
        self.state.lock().unwrap().head.clone()
    }

    /// Files at a revision
    pub fn files_at(&self, rev: &str) -> Files {
        let state = self.state.lock().unwrap();
        let hash = resolve(&state, rev).unwrap();
        state.trees[&state.commits[&hash].tree].clone()
    }

    /// Messages from `rev` back to the root, newest first
    pub fn messages(&self, rev: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let hash = resolve(&state, rev).unwrap();
        ancestors(&state, &hash)
            .iter()
            .map(|h| state.commits[h].message.clone())
            .collect()
    }

    /// Number of commits reachable from `rev`
    pub fn depth(&self, rev: &str) -> usize {
        let state = self.state.lock().unwrap();
        let hash = resolve(&state, rev).unwrap();
        ancestors(&state, &hash).len()
    }
}

// =============================================================================
// Object model helpers
// =============================================================================

pub fn files(entries: &[(&str, &str)]) -> Files {
    entries
        .iter()
        .map(|(p, c)| ((*p).to_string(), (*c).to_string()))
        .collect()
}

fn intern(state: &mut State, tree: Files) -> String {
    if let Some(id) = state.tree_ids.get(&tree) {
        return id.clone();
    }
    let id = format!("tree{:04}", state.tree_ids.len());
    state.tree_ids.insert(tree.clone(), id.clone());
    state.trees.insert(id.clone(), tree);
    id
}

fn new_commit(state: &mut State, parent: Option<String>, tree: String, message: &str) -> String {
    state.next_id += 1;
    let n = state.next_id;
    let hash = format!("{n:07x}{}", "e".repeat(33));
    let timestamp = 1_700_000_000 + i64::try_from(n).unwrap() * 60;
    state.commits.insert(
        hash.clone(),
        FakeCommit {
            parent,
            tree,
            message: message.to_string(),
            timestamp,
        },
    );
    hash
}

fn resolve(state: &State, rev: &str) -> Result<String> {
    if rev == "HEAD" {
        return state
            .branches
            .get(&state.head)
            .cloned()
            .ok_or_else(|| Error::Git("HEAD is unborn".to_string()));
    }
    if let Some(hash) = state.branches.get(rev) {
        return Ok(hash.clone());
    }
    if state.commits.contains_key(rev) {
        return Ok(rev.to_string());
    }
    Err(Error::Git(format!("unknown revision {rev}")))
}

/// `hash` and all of its ancestors, newest first
fn ancestors(state: &State, hash: &str) -> Vec<String> {
    let mut chain = Vec::new();
    let mut current = Some(hash.to_string());
    while let Some(h) = current {
        current = state.commits[&h].parent.clone();
        chain.push(h);
    }
    chain
}

fn tree_files<'a>(state: &'a State, hash: &str) -> &'a Files {
    &state.trees[&state.commits[hash].tree]
}

/// Per-file three-way merge of commit trees
fn merge_files(base: &Files, ours: &Files, theirs: &Files) -> std::result::Result<Files, String> {
    let paths: std::collections::BTreeSet<&String> =
        base.keys().chain(ours.keys()).chain(theirs.keys()).collect();
    let mut merged = Files::new();
    let mut conflicts = Vec::new();

    for path in paths {
        let (b, o, t) = (base.get(path), ours.get(path), theirs.get(path));
        let result = if o == t || t == b {
            o
        } else if o == b {
            t
        } else {
            conflicts.push(format!("CONFLICT (content): Merge conflict in {path}"));
            continue;
        };
        if let Some(content) = result {
            merged.insert(path.clone(), content.clone());
        }
    }

    if conflicts.is_empty() {
        Ok(merged)
    } else {
        Err(conflicts.join("; "))
    }
}

// =============================================================================
// GitBackend implementation
// =============================================================================

impl GitBackend for FakeGit {
    fn branch_exists(&self, branch: &str) -> Result<bool> {
        self.check_fail("branch_exists")?;
        Ok(self.state.lock().unwrap().branches.contains_key(branch))
    }

    fn list_branches(&self, pattern: &str) -> Result<Vec<String>> {
        self.check_fail("list_branches")?;
        let prefix = pattern.trim_end_matches('*');
        Ok(self
            .state
            .lock()
            .unwrap()
            .branches
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn ref_info(&self, rev: &str) -> Result<RefInfo> {
        self.check_fail("ref_info")?;
        let state = self.state.lock().unwrap();
        let hash = resolve(&state, rev)?;
        let commit = &state.commits[&hash];
        Ok(RefInfo {
            subject: commit.message.lines().next().unwrap_or_default().to_string(),
            timestamp: commit.timestamp,
            hash,
        })
    }

    fn ahead_behind(&self, base: &str, branch: &str) -> Result<(usize, usize)> {
        self.check_fail("ahead_behind")?;
        let state = self.state.lock().unwrap();
        let base_set: HashSet<String> = ancestors(&state, &resolve(&state, base)?).into_iter().collect();
        let branch_set: HashSet<String> =
            ancestors(&state, &resolve(&state, branch)?).into_iter().collect();
        Ok((
            branch_set.difference(&base_set).count(),
            base_set.difference(&branch_set).count(),
        ))
    }

    fn list_commits(&self, base: &str, tip: &str) -> Result<Vec<String>> {
        self.check_fail("list_commits")?;
        let state = self.state.lock().unwrap();
        let base_set: HashSet<String> = ancestors(&state, &resolve(&state, base)?).into_iter().collect();
        let mut commits: Vec<String> = ancestors(&state, &resolve(&state, tip)?)
            .into_iter()
            .filter(|h| !base_set.contains(h))
            .collect();
        commits.reverse();
        Ok(commits)
    }

    fn commit_message(&self, hash: &str) -> Result<String> {
        self.check_fail("commit_message")?;
        let state = self.state.lock().unwrap();
        let hash = resolve(&state, hash)?;
        Ok(state.commits[&hash].message.clone())
    }

    fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(7).collect()
    }

    fn log_messages(&self, tip: &str, exclude: Option<&str>) -> Result<Vec<String>> {
        self.check_fail("log_messages")?;
        let state = self.state.lock().unwrap();
        let excluded: HashSet<String> = match exclude {
            Some(rev) => ancestors(&state, &resolve(&state, rev)?).into_iter().collect(),
            None => HashSet::new(),
        };
        Ok(ancestors(&state, &resolve(&state, tip)?)
            .into_iter()
            .filter(|h| !excluded.contains(h))
            .map(|h| state.commits[&h].message.clone())
            .collect())
    }

    fn merge_base(&self, a: &str, b: &str) -> Result<String> {
        self.check_fail("merge_base")?;
        let state = self.state.lock().unwrap();
        let b_set: HashSet<String> = ancestors(&state, &resolve(&state, b)?).into_iter().collect();
        ancestors(&state, &resolve(&state, a)?)
            .into_iter()
            .find(|h| b_set.contains(h))
            .ok_or_else(|| Error::Git(format!("no merge base between {a} and {b}")))
    }

    fn parent_of(&self, rev: &str) -> Result<Option<String>> {
        self.check_fail("parent_of")?;
        let state = self.state.lock().unwrap();
        let hash = resolve(&state, rev)?;
        Ok(state.commits[&hash].parent.clone())
    }

    fn rev_parse(&self, rev: &str) -> Result<String> {
        self.check_fail("rev_parse")?;
        resolve(&self.state.lock().unwrap(), rev)
    }

    fn supports_merge_tree(&self, _rev: &str) -> bool {
        *self.merge_tree_supported.lock().unwrap()
    }

    fn merge_tree(&self, merge_base: &str, ours: &str, theirs: &str) -> Result<TreeMerge> {
        self.check_fail("merge_tree")?;
        let mut state = self.state.lock().unwrap();
        let base = tree_files(&state, &resolve(&state, merge_base)?).clone();
        let ours = tree_files(&state, &resolve(&state, ours)?).clone();
        let theirs = tree_files(&state, &resolve(&state, theirs)?).clone();
        Ok(match merge_files(&base, &ours, &theirs) {
            Ok(merged) => TreeMerge::Clean(intern(&mut state, merged)),
            Err(detail) => TreeMerge::Conflict(detail),
        })
    }

    fn tree_of(&self, rev: &str) -> Result<String> {
        self.check_fail("tree_of")?;
        let state = self.state.lock().unwrap();
        let hash = resolve(&state, rev)?;
        Ok(state.commits[&hash].tree.clone())
    }

    fn commit_tree(&self, tree: &str, parent: &str, message: &str) -> Result<String> {
        self.check_fail("commit_tree")?;
        let mut state = self.state.lock().unwrap();
        let parent = resolve(&state, parent)?;
        if !state.trees.contains_key(tree) {
            return Err(Error::Git(format!("unknown tree {tree}")));
        }
        Ok(new_commit(&mut state, Some(parent), tree.to_string(), message))
    }

    fn diff(&self, from: &str, to: &str) -> Result<String> {
        self.check_fail("diff")?;
        let state = self.state.lock().unwrap();
        let old = tree_files(&state, &resolve(&state, from)?);
        let new = tree_files(&state, &resolve(&state, to)?);
        let paths: std::collections::BTreeSet<&String> = old.keys().chain(new.keys()).collect();
        let mut out = String::new();
        for path in paths {
            let (a, b) = (old.get(path), new.get(path));
            if a == b {
                continue;
            }
            out.push_str(&format!("diff --git a/{path} b/{path}\n"));
            if let Some(a) = a {
                out.push_str(&format!("-{a}"));
            }
            if let Some(b) = b {
                out.push_str(&format!("+{b}"));
            }
        }
        Ok(out)
    }

    fn current_branch(&self) -> Result<String> {
        self.check_fail("current_branch")?;
        Ok(self.head())
    }

    fn git_dir_contains(&self, relative: &str) -> Result<bool> {
        self.check_fail("git_dir_contains")?;
        Ok(self.state.lock().unwrap().markers.contains(relative))
    }

    fn has_staged_changes(&self) -> Result<bool> {
        self.check_fail("has_staged_changes")?;
        let state = self.state.lock().unwrap();
        let head_tree = state.commits[&resolve(&state, "HEAD")?].tree.clone();
        Ok(state.dirty_index || state.index.as_ref().is_some_and(|t| *t != head_tree))
    }

    fn has_unstaged_changes(&self) -> Result<bool> {
        self.check_fail("has_unstaged_changes")?;
        Ok(self.state.lock().unwrap().dirty_worktree)
    }

    fn delete_branch(&self, branch: &str) -> Result<()> {
        self.record(GitCall::DeleteBranch(branch.to_string()));
        self.check_fail("delete_branch")?;
        let mut state = self.state.lock().unwrap();
        if state.head == branch {
            return Err(Error::Git(format!("cannot delete checked-out branch {branch}")));
        }
        state
            .branches
            .remove(branch)
            .map(|_| ())
            .ok_or_else(|| Error::Git(format!("branch {branch} not found")))
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        self.record(GitCall::Checkout(branch.to_string()));
        self.check_fail("checkout")?;
        let mut state = self.state.lock().unwrap();
        if !state.branches.contains_key(branch) {
            return Err(Error::Git(format!("pathspec {branch} did not match")));
        }
        state.head = branch.to_string();
        Ok(())
    }

    fn rebase(&self, onto: &str) -> Result<()> {
        self.record(GitCall::Rebase(onto.to_string()));
        self.check_fail("rebase")?;
        let mut state = self.state.lock().unwrap();
        let onto_tip = resolve(&state, onto)?;
        let head_tip = resolve(&state, "HEAD")?;
        let onto_set: HashSet<String> = ancestors(&state, &onto_tip).into_iter().collect();
        let mut to_replay: Vec<String> = ancestors(&state, &head_tip)
            .into_iter()
            .filter(|h| !onto_set.contains(h))
            .collect();
        to_replay.reverse();

        let mut base = onto_tip;
        for hash in to_replay {
            let commit = state.commits[&hash].clone();
            let parent = commit.parent.clone().unwrap_or_else(|| hash.clone());
            let merged = merge_files(
                tree_files(&state, &parent),
                tree_files(&state, &base),
                tree_files(&state, &hash),
            );
            match merged {
                Ok(files) => {
                    let tree = intern(&mut state, files);
                    base = new_commit(&mut state, Some(base), tree, &commit.message);
                }
                Err(detail) => {
                    state.markers.insert("rebase-merge".to_string());
                    return Err(Error::Git(format!("could not apply {hash}: {detail}")));
                }
            }
        }

        let head = state.head.clone();
        state.branches.insert(head, base);
        Ok(())
    }

    fn rebase_abort(&self) -> Result<()> {
        self.record(GitCall::RebaseAbort);
        self.check_fail("rebase_abort")?;
        let mut state = self.state.lock().unwrap();
        if !state.markers.remove("rebase-merge") {
            return Err(Error::Git("no rebase in progress".to_string()));
        }
        Ok(())
    }

    fn cherry_pick(&self, hash: &str) -> Result<()> {
        self.record(GitCall::CherryPick(hash.to_string()));
        self.check_fail("cherry_pick")?;
        if self.failing_cherry_picks.lock().unwrap().contains(hash) {
            self.add_marker("CHERRY_PICK_HEAD");
            return Err(Error::Git(format!("could not apply {hash}")));
        }

        let mut state = self.state.lock().unwrap();
        let head_tip = resolve(&state, "HEAD")?;
        let commit = state.commits[hash].clone();
        let parent = commit.parent.clone().unwrap_or_else(|| hash.to_string());
        let merged = merge_files(
            tree_files(&state, &parent),
            tree_files(&state, &head_tip),
            tree_files(&state, hash),
        );
        match merged {
            Ok(files) => {
                let tree = intern(&mut state, files);
                if tree == state.commits[&head_tip].tree {
                    return Err(Error::Git("The previous cherry-pick is now empty".to_string()));
                }
                let new = new_commit(&mut state, Some(head_tip), tree, &commit.message);
                let head = state.head.clone();
                state.branches.insert(head, new);
                Ok(())
            }
            Err(detail) => {
                state.markers.insert("CHERRY_PICK_HEAD".to_string());
                Err(Error::Git(format!("could not apply {hash}: {detail}")))
            }
        }
    }

    fn reset_soft(&self, rev: &str) -> Result<()> {
        self.record(GitCall::ResetSoft(rev.to_string()));
        self.check_fail("reset_soft")?;
        let mut state = self.state.lock().unwrap();
        let target = resolve(&state, rev)?;
        let head_tip = resolve(&state, "HEAD")?;
        if state.index.is_none() {
            let staged = state.commits[&head_tip].tree.clone();
            state.index = Some(staged);
        }
        let head = state.head.clone();
        state.branches.insert(head, target);
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.record(GitCall::Commit(message.to_string()));
        self.check_fail("commit")?;
        let mut state = self.state.lock().unwrap();
        let head_tip = resolve(&state, "HEAD")?;
        let tree = state
            .index
            .take()
            .unwrap_or_else(|| state.commits[&head_tip].tree.clone());
        let new = new_commit(&mut state, Some(head_tip), tree, message);
        let head = state.head.clone();
        state.branches.insert(head, new);
        Ok(())
    }
}
