use crate::config::{self, AppConfig};
use crate::error::Error;
use crate::extract::{DocumentExtractor, Extractor};
use crate::load_cache::LoadCache;
use crate::model::{ComparisonRequest, SimilarityResult};
use crate::progress::ProgressReporter;
use crate::similarity;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, field, info, info_span, warn};

static NEXT_BATCH: AtomicU64 = AtomicU64::new(1);

/// Runs batches of pairwise comparisons: parallel extraction into a
/// [`LoadCache`], then sequential scoring in request order.
pub struct CompareEngine {
    config: AppConfig,
    extractor: Arc<dyn Extractor>,
    cancel_token: Arc<AtomicBool>,
}

/// Scores for one batch, aligned with the request slice by index.
///
/// When `cancelled` is set, `results` holds only the comparisons that were
/// fully scored before cancellation was observed.
#[derive(Debug)]
pub struct BatchOutcome {
    pub results: Vec<SimilarityResult>,
    pub cancelled: bool,
    pub unique_files: usize,
    pub extraction_failures: usize,
    pub extract_duration: Duration,
    pub score_duration: Duration,
}

impl BatchOutcome {
    fn cancelled(results: Vec<SimilarityResult>, unique_files: usize) -> Self {
        Self {
            results,
            cancelled: true,
            unique_files,
            extraction_failures: 0,
            extract_duration: Duration::ZERO,
            score_duration: Duration::ZERO,
        }
    }

    pub fn similar_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_similar).count()
    }
}

impl CompareEngine {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            extractor: Arc::new(DocumentExtractor),
            cancel_token: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared flag; storing `true` cancels the running batch cooperatively.
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_token)
    }

    pub fn reset_cancellation(&self) {
        self.cancel_token.store(false, Ordering::Relaxed);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_token.load(Ordering::Relaxed)
    }

    fn build_pool(&self) -> Result<ThreadPool, Error> {
        let workers = config::extraction_workers(self.config.worker_threads);
        ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("near-duper-extract-{}", i))
            .build()
            .map_err(|e| Error::Other(format!("Failed to build extraction pool: {}", e)))
    }

    /// Score every request. Each distinct file is extracted exactly once.
    pub fn compare_batch(
        &self,
        requests: &[ComparisonRequest],
        reporter: &dyn ProgressReporter,
    ) -> Result<BatchOutcome, Error> {
        let batch_id = NEXT_BATCH.fetch_add(1, Ordering::Relaxed);
        let span = info_span!(
            "batch",
            id = batch_id,
            requests = requests.len(),
            unique_files = field::Empty
        );
        let _entered = span.enter();

        // Phase 1: parallel extraction
        let extract_start = Instant::now();
        let pool = self.build_pool()?;
        debug!("Extraction pool has {} workers", pool.current_num_threads());
        let cache = match LoadCache::build(
            requests,
            self.extractor.as_ref(),
            &pool,
            &self.cancel_token,
            reporter,
        ) {
            Ok(cache) => cache,
            Err(Error::Cancelled) => {
                warn!("Batch cancelled during extraction, discarding partial results");
                return Ok(BatchOutcome::cancelled(Vec::new(), 0));
            }
            Err(e) => return Err(e),
        };
        span.record("unique_files", cache.len());
        let extract_duration = extract_start.elapsed();
        let extraction_failures = cache.failures();
        reporter.on_extract_complete(extraction_failures, extract_duration.as_secs_f64());
        info!(
            "Extracted {} unique files in {:.2}s ({} failed)",
            cache.len(),
            extract_duration.as_secs_f64(),
            extraction_failures,
        );

        // Phase 2: sequential scoring over the frozen cache
        let score_start = Instant::now();
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            if self.is_cancelled() {
                warn!(
                    "Batch cancelled during scoring after {} of {} comparisons",
                    results.len(),
                    requests.len()
                );
                return Ok(BatchOutcome::cancelled(results, cache.len()));
            }
            results.push(score_request(&cache, request));
        }
        let score_duration = score_start.elapsed();

        let outcome = BatchOutcome {
            results,
            cancelled: false,
            unique_files: cache.len(),
            extraction_failures,
            extract_duration,
            score_duration,
        };
        reporter.on_score_complete(outcome.results.len(), outcome.similar_count());
        info!(
            "Scored {} comparisons in {:.2}s, {} similar",
            outcome.results.len(),
            score_duration.as_secs_f64(),
            outcome.similar_count(),
        );

        Ok(outcome)
    }
}

fn score_request(cache: &LoadCache, request: &ComparisonRequest) -> SimilarityResult {
    match (cache.get(&request.file1), cache.get(&request.file2)) {
        (Some(a), Some(b)) => similarity::score(request.kind.representation(), a.as_ref(), b.as_ref()),
        _ => SimilarityResult::not_similar(),
    }
}
