//! Change-Id trailers
//!
//! A Change-Id is a hash-independent identity for a logical change, carried
//! as a `Change-Id: <token>` line in the commit message. It survives rebase
//! and cherry-pick, which is how palimp recognises work that already landed.

use crate::error::Result;
use crate::git::GitBackend;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

static CHANGE_ID_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^change-id:(.*)$").expect("change-id regex is valid"));

/// Extract Change-Id tokens from a message (or concatenated log output)
///
/// The key is matched case-insensitively on the trimmed line; the token keeps
/// its original case. Empty tokens are ignored.
pub fn extract_change_ids(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let caps = CHANGE_ID_LINE.captures(line.trim())?;
            let token = caps.get(1)?.as_str().trim();
            (!token.is_empty()).then(|| token.to_string())
        })
        .collect()
}

/// All Change-Id tokens reachable from `rev`
///
/// With a `source_branch`, only the window of `rev` back to the merge-base
/// with that branch (inclusive of the merge-base's parent when it has one)
/// is scanned, since cherry-picks of the branch can only live there. If no
/// merge-base exists the whole history of `rev` is scanned.
pub fn tokens_in_ref(
    git: &dyn GitBackend,
    rev: &str,
    source_branch: Option<&str>,
) -> Result<HashSet<String>> {
    let exclude = match source_branch {
        Some(branch) => match git.merge_base(rev, branch) {
            Ok(base) => {
                let boundary = git.parent_of(&base)?;
                // Root merge-base has no parent to stop at; exclude it instead
                Some(boundary.unwrap_or(base))
            }
            Err(e) => {
                debug!(rev, branch, error = %e, "no merge-base; scanning full history");
                None
            }
        },
        None => None,
    };

    let messages = git.log_messages(rev, exclude.as_deref())?;

    let tokens: HashSet<String> = messages
        .iter()
        .flat_map(|m| extract_change_ids(m))
        .collect();
    debug!(rev, scanned = messages.len(), tokens = tokens.len(), "collected change-ids");
    Ok(tokens)
}
