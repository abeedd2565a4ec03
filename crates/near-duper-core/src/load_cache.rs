use crate::error::{Error, ExtractionError};
use crate::extract::Extractor;
use crate::model::{ComparisonRequest, DocumentKind, FileRepresentation};
use crate::progress::ProgressReporter;
use ahash::AHashMap;
use rayon::prelude::*;
use rayon::ThreadPool;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, warn, Span};

pub type Extraction = Result<FileRepresentation, ExtractionError>;

/// Path → extracted representation for one batch.
///
/// Built once by [`LoadCache::build`] and read-only afterwards; the scoring
/// phase only borrows from it.
#[derive(Debug, Default)]
pub struct LoadCache {
    entries: AHashMap<PathBuf, Extraction>,
}

impl LoadCache {
    /// Every distinct path in `requests` with the kind it was first requested under.
    pub fn unique_paths(requests: &[ComparisonRequest]) -> Vec<(PathBuf, DocumentKind)> {
        let mut kinds: AHashMap<&Path, DocumentKind> = AHashMap::new();
        let mut ordered = Vec::new();

        for request in requests {
            for path in [&request.file1, &request.file2] {
                match kinds.get(path.as_path()) {
                    Some(&kind) if kind != request.kind => warn!(
                        "'{}' requested as {} after {}, keeping {}",
                        path.display(),
                        request.kind,
                        kind,
                        kind
                    ),
                    Some(_) => {}
                    None => {
                        kinds.insert(path.as_path(), request.kind);
                        ordered.push((path.clone(), request.kind));
                    }
                }
            }
        }

        ordered
    }

    /// Extract every unique path of the batch on `pool`.
    ///
    /// A failed file is stored as its error and never stops the others.
    /// If `cancel` is raised the partially built cache is discarded.
    pub fn build(
        requests: &[ComparisonRequest],
        extractor: &dyn Extractor,
        pool: &ThreadPool,
        cancel: &AtomicBool,
        reporter: &dyn ProgressReporter,
    ) -> Result<Self, Error> {
        let unique = Self::unique_paths(requests);
        let total = unique.len();
        let done = AtomicUsize::new(0);
        reporter.on_extract_start(total);

        // Worker threads log under the batch span of the caller.
        let span = Span::current();

        let extracted: Vec<(PathBuf, Extraction)> = pool.install(|| {
            unique
                .into_par_iter()
                .map(|(path, kind)| {
                    let _entered = span.enter();
                    if cancel.load(Ordering::Relaxed) {
                        return (path, Err(ExtractionError::Cancelled));
                    }
                    let extraction = extractor.extract(kind, &path);
                    if let Err(e) = &extraction {
                        debug!("Extraction failed for '{}': {}", path.display(), e);
                    }
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    reporter.on_extract_progress(finished, total);
                    (path, extraction)
                })
                .collect()
        });

        if cancel.load(Ordering::Relaxed) {
            return Err(Error::Cancelled);
        }

        Ok(Self {
            entries: extracted.into_iter().collect(),
        })
    }

    pub fn get(&self, path: &Path) -> Option<&Extraction> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failures(&self) -> usize {
        self.entries.values().filter(|e| e.is_err()).count()
    }
}
