use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use screentask_core::{
    Analyzer, OutcomeSource, OutputCache, OutputRecord, TaskError, TaskOutcome,
};
use screentask_storage::ScreenshotEnumerator;

/// The orchestrator turns a user's screenshots into task records.
///
/// Each URL is an independent unit: lookup, then analyze on a miss, then
/// insert. Units run concurrently and are joined before returning. A unit's
/// cache, model or insert failure never affects the others.
pub struct TaskPipeline {
    enumerator: ScreenshotEnumerator,
    cache: Arc<dyn OutputCache>,
    analyzer: Arc<dyn Analyzer>,
    limiter: Option<Arc<Semaphore>>,
}

impl TaskPipeline {
    pub fn new(
        enumerator: ScreenshotEnumerator,
        cache: Arc<dyn OutputCache>,
        analyzer: Arc<dyn Analyzer>,
    ) -> Self {
        Self {
            enumerator,
            cache,
            analyzer,
            limiter: None,
        }
    }

    /// Cap the number of units in flight. `0` means unbounded.
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.limiter = (limit > 0).then(|| Arc::new(Semaphore::new(limit)));
        self
    }

    pub fn enumerator(&self) -> &ScreenshotEnumerator {
        &self.enumerator
    }

    /// Enumerate `user_id`'s screenshots and return one outcome per URL.
    ///
    /// Only a listing failure aborts the run.
    pub async fn run(&self, user_id: &str) -> Result<Vec<TaskOutcome>, TaskError> {
        let screenshots = self.enumerator.list(user_id).await?;
        if screenshots.is_empty() {
            debug!(user_id = %user_id, "No screenshots to process");
            return Ok(Vec::new());
        }

        let urls: Vec<String> = screenshots.into_iter().map(|s| s.resolved_url).collect();
        Ok(self.process_urls(urls).await)
    }

    /// Fan out over `urls` and join all units. Output follows input order.
    pub async fn process_urls(&self, urls: Vec<String>) -> Vec<TaskOutcome> {
        let start = Instant::now();
        let total = urls.len();
        let mut join_set = JoinSet::new();

        for (index, url) in urls.into_iter().enumerate() {
            let cache = Arc::clone(&self.cache);
            let analyzer = Arc::clone(&self.analyzer);
            let limiter = self.limiter.clone();
            join_set.spawn(async move {
                // Held for the whole unit; the semaphore is never closed.
                let _permit = match limiter {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                (index, process_one(&*cache, &*analyzer, url).await)
            });
        }

        let mut outcomes = Vec::with_capacity(total);
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(entry) => outcomes.push(entry),
                Err(e) => error!(error = %e, "Screenshot task panicked"),
            }
        }
        outcomes.sort_by_key(|(index, _)| *index);

        let outcomes: Vec<TaskOutcome> = outcomes.into_iter().map(|(_, o)| o).collect();
        info!(
            screenshots = total,
            cached = count(&outcomes, OutcomeSource::Cached),
            analyzed = count(&outcomes, OutcomeSource::Analyzed),
            unsaved = count(&outcomes, OutcomeSource::Unsaved),
            latency_ms = start.elapsed().as_millis() as u64,
            "Screenshot batch processed"
        );
        outcomes
    }
}

async fn process_one(cache: &dyn OutputCache, analyzer: &dyn Analyzer, url: String) -> TaskOutcome {
    match cache.lookup(&url).await {
        Ok(Some(record)) => {
            debug!(url = %url, "Cache hit");
            return TaskOutcome::new(record, OutcomeSource::Cached);
        }
        Ok(None) => {}
        // Fail open: a read error falls through to analysis.
        Err(e) => {
            let err = TaskError::CacheLookup(format!("{e:#}"));
            warn!(url = %url, error = %err, "Re-analyzing after cache lookup failure");
        }
    }

    let result = analyzer.analyze(&url).await;
    let record = OutputRecord::from_analysis(url, result);

    // Sentinels stay out of the cache so the next request retries the image.
    if record.is_error() {
        return TaskOutcome::new(record, OutcomeSource::Unsaved);
    }

    match cache.insert(&record).await {
        Ok(true) => TaskOutcome::new(record, OutcomeSource::Analyzed),
        Ok(false) => {
            debug!(url = %record.source_img, "Output already cached by a concurrent request");
            TaskOutcome::new(record, OutcomeSource::Analyzed)
        }
        Err(e) => {
            let err = TaskError::CacheWrite(format!("{e:#}"));
            error!(url = %record.source_img, error = %err, "Failed to cache output");
            TaskOutcome::new(record, OutcomeSource::Unsaved)
        }
    }
}

fn count(outcomes: &[TaskOutcome], source: OutcomeSource) -> usize {
    outcomes.iter().filter(|o| o.source == source).count()
}
