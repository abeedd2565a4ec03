use crate::grouping::{Classification, Group, GroupMember};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Which member of a group survives and which are removed.
///
/// Computed on demand from the current group; never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct RetentionDecision {
    pub classification: Classification,
    pub similarity: f64,
    pub keep: GroupMember,
    pub delete: Vec<GroupMember>,
    pub reclaimable_bytes: u64,
}

impl RetentionDecision {
    pub fn is_exact(&self) -> bool {
        self.classification == Classification::Exact
    }

    pub fn deletes(&self, path: &Path) -> bool {
        self.delete.iter().any(|m| m.path == path)
    }
}

/// Members whose directory is the scan root sort first; the rest sort by
/// directory name. Ties keep their group order.
///
/// A bare relative file name lives in `.`, so it matches a scan root of `.`.
fn retention_key(member: &GroupMember, scan_root: &Path) -> (u8, String) {
    let dir = match member.path.parent() {
        Some(dir) if dir.as_os_str().is_empty() => Path::new("."),
        Some(dir) => dir,
        None => return (1, String::new()),
    };
    if dir == scan_root {
        (0, String::new())
    } else {
        (1, dir.to_string_lossy().into_owned())
    }
}

fn size_on_disk(path: &Path) -> u64 {
    match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => {
            debug!("No size for {}: {}", path.display(), e);
            0
        }
    }
}

/// Choose the member to keep. Returns `None` for groups with fewer than two
/// members.
pub fn plan(group: &Group, scan_root: &Path) -> Option<RetentionDecision> {
    if !group.is_actionable() {
        return None;
    }

    let mut ranked: Vec<&GroupMember> = group.members.iter().collect();
    ranked.sort_by_cached_key(|m| retention_key(m, scan_root));

    let keep = ranked[0].clone();
    let delete: Vec<GroupMember> = ranked[1..]
        .iter()
        .filter(|m| m.path != keep.path)
        .map(|m| (*m).clone())
        .collect();
    let reclaimable_bytes = delete.iter().map(|m| size_on_disk(&m.path)).sum();

    Some(RetentionDecision {
        classification: group.classification,
        similarity: group.similarity,
        keep,
        delete,
        reclaimable_bytes,
    })
}

/// Decisions for the EXACT groups only; SIMILAR groups need review.
pub fn plan_bulk(groups: &[Group], scan_root: &Path) -> Vec<RetentionDecision> {
    groups
        .iter()
        .filter(|g| g.is_exact())
        .filter_map(|g| plan(g, scan_root))
        .collect()
}

pub fn total_reclaimable(decisions: &[RetentionDecision]) -> u64 {
    decisions.iter().map(|d| d.reclaimable_bytes).sum()
}
