use crate::config::IgnoreSet;
use crate::engine::{BatchOutcome, CompareEngine};
use crate::error::Error;
use crate::model::{ComparisonRequest, DocumentKind};
use crate::progress::ProgressReporter;
use ahash::{AHashMap, AHashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Exact,
    Similar,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Exact => "EXACT",
            Classification::Similar => "SIMILAR",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EXACT" => Ok(Classification::Exact),
            "SIMILAR" => Ok(Classification::Similar),
            other => Err(format!("unknown classification '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupMember {
    pub path: PathBuf,
    /// Similarity to the group's first (reference) member; 1.0 for exact copies.
    pub similarity: f64,
}

impl GroupMember {
    pub fn new(path: impl Into<PathBuf>, similarity: f64) -> Self {
        Self {
            path: path.into(),
            similarity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub classification: Classification,
    pub similarity: f64,
    pub members: Vec<GroupMember>,
}

impl Group {
    pub fn exact<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            classification: Classification::Exact,
            similarity: 1.0,
            members: paths.into_iter().map(|p| GroupMember::new(p, 1.0)).collect(),
        }
    }

    pub fn similar(similarity: f64, members: Vec<GroupMember>) -> Self {
        Self {
            classification: Classification::Similar,
            similarity,
            members,
        }
    }

    /// Two or more members; anything smaller is dropped before display or deletion.
    pub fn is_actionable(&self) -> bool {
        self.members.len() >= 2
    }

    pub fn is_exact(&self) -> bool {
        self.classification == Classification::Exact
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.members.iter().any(|m| m.path == path)
    }

    /// Drop repeated paths, keeping the first occurrence.
    fn dedup_members(&mut self) {
        let mut seen: AHashSet<PathBuf> = AHashSet::new();
        self.members.retain(|m| seen.insert(m.path.clone()));
    }
}

/// Merge the scanner's exact groups with near-duplicate groups.
///
/// Exact groups come first, in input order. A near-duplicate member that is
/// already part of an exact group is removed from the near-duplicate group.
/// Paths matched by `ignore` are removed everywhere. Groups left with fewer
/// than two members are dropped.
pub fn merge_groups(exact: Vec<Group>, similar: Vec<Group>, ignore: &IgnoreSet) -> Vec<Group> {
    let mut merged = Vec::with_capacity(exact.len() + similar.len());
    let mut exact_paths: AHashSet<PathBuf> = AHashSet::new();

    for mut group in exact {
        group.dedup_members();
        group.members.retain(|m| !ignore.is_ignored(&m.path));
        if group.is_actionable() {
            exact_paths.extend(group.members.iter().map(|m| m.path.clone()));
            merged.push(group);
        } else {
            debug!("Dropping exact group with {} member(s)", group.members.len());
        }
    }

    for mut group in similar {
        group.dedup_members();
        group
            .members
            .retain(|m| !ignore.is_ignored(&m.path) && !exact_paths.contains(&m.path));
        if group.is_actionable() {
            merged.push(group);
        } else {
            debug!("Dropping similar group with {} member(s)", group.members.len());
        }
    }

    merged
}

/// Split parsed groups by classification and merge them.
pub fn classify(groups: Vec<Group>, ignore: &IgnoreSet) -> Vec<Group> {
    let (exact, similar): (Vec<Group>, Vec<Group>) =
        groups.into_iter().partition(|g| g.is_exact());
    merge_groups(exact, similar, ignore)
}

/// A file offered for near-duplicate clustering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub kind: DocumentKind,
}

impl Candidate {
    pub fn new(path: impl Into<PathBuf>, kind: DocumentKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Every same-kind pair `(i, j)` with `i < j`, as comparison requests.
pub fn pairwise_requests(candidates: &[Candidate]) -> (Vec<ComparisonRequest>, Vec<(usize, usize)>) {
    let mut requests = Vec::new();
    let mut pairs = Vec::new();
    for i in 0..candidates.len() {
        for j in (i + 1)..candidates.len() {
            if candidates[i].kind == candidates[j].kind {
                requests.push(ComparisonRequest::new(
                    candidates[i].kind,
                    candidates[i].path.clone(),
                    candidates[j].path.clone(),
                ));
                pairs.push((i, j));
            }
        }
    }
    (requests, pairs)
}

/// Greedy near-duplicate grouping over pairwise results.
///
/// Each unassigned candidate, in order, becomes a reference member with
/// similarity 1.0 and absorbs every later unassigned candidate similar to it.
/// The group's similarity is the mean of its members' similarities.
pub fn cluster_from_results(
    candidates: &[Candidate],
    pairs: &[(usize, usize)],
    outcome: &BatchOutcome,
) -> Vec<Group> {
    let scores: AHashMap<(usize, usize), f64> = pairs
        .iter()
        .zip(outcome.results.iter())
        .filter(|(_, r)| r.is_similar)
        .map(|(&pair, r)| (pair, r.score))
        .collect();

    let mut assigned = vec![false; candidates.len()];
    let mut groups = Vec::new();

    for i in 0..candidates.len() {
        if assigned[i] {
            continue;
        }
        let mut members = vec![GroupMember::new(candidates[i].path.clone(), 1.0)];
        for j in (i + 1)..candidates.len() {
            if assigned[j] {
                continue;
            }
            if let Some(&score) = scores.get(&(i, j)) {
                members.push(GroupMember::new(candidates[j].path.clone(), score));
                assigned[j] = true;
            }
        }
        if members.len() > 1 {
            assigned[i] = true;
            let mean = members.iter().map(|m| m.similarity).sum::<f64>() / members.len() as f64;
            groups.push(Group::similar(mean, members));
        }
    }

    groups
}

/// Score all same-kind pairs of `candidates` in one batch and group them.
///
/// A cancelled batch yields no groups rather than groups built from a
/// partial set of scores.
pub fn cluster_similar(
    engine: &CompareEngine,
    candidates: &[Candidate],
    reporter: &dyn ProgressReporter,
) -> Result<Vec<Group>, Error> {
    let (requests, pairs) = pairwise_requests(candidates);
    info!(
        "Clustering {} candidates with {} pairwise comparisons",
        candidates.len(),
        requests.len()
    );
    let outcome = engine.compare_batch(&requests, reporter)?;
    if outcome.cancelled {
        return Err(Error::Cancelled);
    }
    Ok(cluster_from_results(candidates, &pairs, &outcome))
}
