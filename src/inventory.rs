//! Branch enumeration and reporting metadata

use crate::error::{Error, Result};
use crate::git::GitBackend;
use crate::types::Branch;
use chrono::{DateTime, Utc};

/// All branches under `prefix`, most recent tip first
pub fn list_branches(git: &dyn GitBackend, prefix: &str, main: &str) -> Result<Vec<Branch>> {
    let names = git
        .list_branches(&format!("{prefix}*"))
        .map_err(|e| Error::Git(format!("failed to list {prefix}* branches: {e}")))?;

    let mut branches = names
        .iter()
        .map(|name| {
            branch_info(git, name, main)
                .map_err(|e| Error::Git(format!("failed to get info for branch {name}: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    branches.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(branches)
}

/// Tip metadata and ahead/behind counts for one branch
pub fn branch_info(git: &dyn GitBackend, name: &str, main: &str) -> Result<Branch> {
    let tip = git.ref_info(name)?;
    let date = DateTime::<Utc>::from_timestamp(tip.timestamp, 0)
        .ok_or_else(|| Error::Git(format!("timestamp {} out of range", tip.timestamp)))?;
    let (ahead, behind) = git.ahead_behind(main, name)?;

    Ok(Branch {
        name: name.to_string(),
        commit: tip.hash,
        date,
        subject: tip.subject,
        ahead,
        behind,
    })
}
