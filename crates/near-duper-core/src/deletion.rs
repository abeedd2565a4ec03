use crate::error::Error;
use crate::retention::RetentionDecision;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// How a decision came to be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionMode {
    /// Unattended "delete all"; only EXACT decisions qualify.
    Bulk,
    /// The user confirmed this specific group.
    Reviewed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeletionOutcome {
    Deleted { bytes: u64 },
    /// The file was already gone.
    Vanished,
    Failed { reason: String },
}

#[derive(Debug, Default)]
pub struct DeletionReport {
    pub entries: Vec<(PathBuf, DeletionOutcome)>,
    /// Decisions refused by bulk mode, identified by their kept file.
    pub skipped_groups: Vec<PathBuf>,
}

impl DeletionReport {
    fn record(&mut self, path: PathBuf, outcome: DeletionOutcome) {
        self.entries.push((path, outcome));
    }

    pub fn deleted(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, o)| matches!(o, DeletionOutcome::Deleted { .. }))
            .count()
    }

    pub fn vanished(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, o)| matches!(o, DeletionOutcome::Vanished))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, o)| matches!(o, DeletionOutcome::Failed { .. }))
            .count()
    }

    pub fn freed_bytes(&self) -> u64 {
        self.entries
            .iter()
            .map(|(_, o)| match o {
                DeletionOutcome::Deleted { bytes } => *bytes,
                _ => 0,
            })
            .sum()
    }

    fn merge(&mut self, other: DeletionReport) {
        self.entries.extend(other.entries);
        self.skipped_groups.extend(other.skipped_groups);
    }
}

fn remove_file(path: &Path) -> DeletionOutcome {
    let bytes = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("'{}' no longer exists, nothing to delete", path.display());
            return DeletionOutcome::Vanished;
        }
        Err(_) => 0,
    };

    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Deleted: {}", path.display());
            DeletionOutcome::Deleted { bytes }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => DeletionOutcome::Vanished,
        Err(e) => {
            error!("Failed to remove '{}': {}", path.display(), e);
            DeletionOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

/// Remove exactly one file from the decision's delete set.
pub fn delete_member(decision: &RetentionDecision, path: &Path) -> Result<DeletionOutcome, Error> {
    if decision.keep.path == path || !decision.deletes(path) {
        return Err(Error::NotInDeleteSet(path.to_path_buf()));
    }
    Ok(remove_file(path))
}

/// Remove every file the decision marks for deletion.
///
/// `Bulk` refuses SIMILAR decisions; those must go through `Reviewed`.
pub fn execute(decision: &RetentionDecision, mode: DeletionMode) -> Result<DeletionReport, Error> {
    if mode == DeletionMode::Bulk && !decision.is_exact() {
        return Err(Error::UnreviewedGroup {
            keep: decision.keep.path.clone(),
        });
    }

    let mut report = DeletionReport::default();
    for member in &decision.delete {
        if member.path == decision.keep.path {
            continue;
        }
        report.record(member.path.clone(), remove_file(&member.path));
    }
    Ok(report)
}

/// Execute every EXACT decision; SIMILAR ones are listed as skipped.
pub fn execute_bulk(decisions: &[RetentionDecision]) -> DeletionReport {
    let mut report = DeletionReport::default();
    for decision in decisions {
        match execute(decision, DeletionMode::Bulk) {
            Ok(group_report) => report.merge(group_report),
            Err(e) => {
                warn!("{}", e);
                report.skipped_groups.push(decision.keep.path.clone());
            }
        }
    }

    info!(
        "Bulk deletion: {} deleted, {} already gone, {} failed, {} groups skipped, {} bytes freed",
        report.deleted(),
        report.vanished(),
        report.failed(),
        report.skipped_groups.len(),
        report.freed_bytes()
    );
    report
}
