//! Deterministic squash commit messages

use crate::types::Commit;
use std::collections::HashSet;

/// Union of all Change-Ids across `commits`, first occurrence order
pub fn union_change_ids(commits: &[Commit]) -> Vec<String> {
    let mut seen = HashSet::new();
    commits
        .iter()
        .flat_map(|c| c.change_ids.iter())
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

/// Combine the messages of `commits` into one
///
/// The first commit's subject leads, followed by a numbered list of every
/// squashed subject with its abbreviated hash, then one `Change-Id:` trailer
/// per distinct token.
pub fn combined_message(commits: &[Commit]) -> String {
    let mut parts = Vec::new();

    if let Some(first) = commits.first() {
        parts.push(first.subject.clone());
        parts.push(String::new());
    }

    parts.push(format!("Squashed {} commits:", commits.len()));
    for (i, commit) in commits.iter().enumerate() {
        parts.push(format!("{}. {} ({})", i + 1, commit.subject, commit.short_hash));
    }

    let change_ids = union_change_ids(commits);
    if !change_ids.is_empty() {
        parts.push(String::new());
        parts.extend(change_ids.into_iter().map(|id| format!("Change-Id: {id}")));
    }

    parts.join("\n")
}
