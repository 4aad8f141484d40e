pub mod sources;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::EnrichmentConfig;
use crate::error::Result;
use crate::infra::cache::{cache_key, EnrichmentCache};
use crate::pipeline::processing::catalog::CatalogIndex;
use crate::types::{EnrichmentData, MetadataSource};

/// Spaces outbound queries a minimum delay apart. One instance is shared by
/// every worker and every source, so the delay is global, not per-source.
pub struct EnrichmentThrottle {
    min_delay: Duration,
    last_query: Mutex<Option<Instant>>,
}

impl EnrichmentThrottle {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_query: Mutex::new(None),
        }
    }

    /// Waits until the shared delay slot opens, then claims it. Holding the
    /// lock across the sleep is what serializes concurrent waiters.
    pub async fn acquire(&self) {
        if self.min_delay.is_zero() {
            return;
        }
        let mut last = self.last_query.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_delay {
                tokio::time::sleep(self.min_delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Counters describing one enrichment pass.
#[derive(Debug, Default, Clone, Copy, serde::Serialize)]
pub struct EnrichmentStats {
    /// Incomplete catalog entries the pass looked at.
    pub keys_considered: usize,
    /// Entries answered from the cache without any query.
    pub cache_hits: usize,
    /// Outbound source queries issued.
    pub queries: usize,
    /// Entries that ended the pass with all five fields filled.
    pub completed: usize,
    /// Failed or timed-out queries.
    pub failures: usize,
}

struct KeyOutcome {
    canonical_key: String,
    data: EnrichmentData,
    cache_hit: bool,
    queries: usize,
    failures: usize,
}

/// Fills metadata gaps in the catalog by consulting sources in priority
/// order. Earlier sources win field by field; a movie stops querying as soon
/// as all five fields are filled. Source failures yield empty data and are
/// never retried within the run.
pub struct EnrichmentMerger {
    sources: Vec<Arc<dyn MetadataSource>>,
    cache: Arc<Mutex<EnrichmentCache>>,
    throttle: Arc<EnrichmentThrottle>,
    query_timeout: Duration,
    concurrency: usize,
}

impl EnrichmentMerger {
    pub fn new(
        sources: Vec<Arc<dyn MetadataSource>>,
        cache: EnrichmentCache,
        config: &EnrichmentConfig,
    ) -> Self {
        Self {
            sources,
            cache: Arc::new(Mutex::new(cache)),
            throttle: Arc::new(EnrichmentThrottle::new(Duration::from_millis(
                config.rate_delay_ms,
            ))),
            query_timeout: Duration::from_secs(config.timeout_seconds),
            concurrency: config.concurrency.max(1),
        }
    }

    /// Runs the pass over every incomplete catalog entry. The cache file is
    /// persisted before any result is written back into the catalog, so a
    /// crash between the two never loses fetched data.
    pub async fn enrich(&self, catalog: &mut CatalogIndex) -> Result<EnrichmentStats> {
        let keys = catalog.incomplete_keys();
        let mut stats = EnrichmentStats {
            keys_considered: keys.len(),
            ..Default::default()
        };
        if keys.is_empty() {
            info!("Catalog already complete, nothing to enrich");
            return Ok(stats);
        }
        if self.sources.is_empty() {
            info!(
                "No enrichment sources enabled, leaving {} movies incomplete",
                keys.len()
            );
            return Ok(stats);
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(keys.len());
        for key in keys {
            let sources = self.sources.clone();
            let cache = Arc::clone(&self.cache);
            let throttle = Arc::clone(&self.throttle);
            let semaphore = Arc::clone(&semaphore);
            let query_timeout = self.query_timeout;
            handles.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return KeyOutcome {
                            canonical_key: key,
                            data: EnrichmentData::default(),
                            cache_hit: false,
                            queries: 0,
                            failures: 0,
                        }
                    }
                };
                resolve_key(key, &sources, &cache, &throttle, query_timeout).await
            }));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    warn!("Enrichment worker failed: {}", err);
                    stats.failures += 1;
                }
            }
        }

        self.cache.lock().await.save()?;

        for outcome in outcomes {
            if outcome.cache_hit {
                stats.cache_hits += 1;
            }
            stats.queries += outcome.queries;
            stats.failures += outcome.failures;
            if let Some(movie) = catalog.get_mut(&outcome.canonical_key) {
                movie.metadata.fill_missing_from(&outcome.data);
                if movie.metadata.is_complete() {
                    stats.completed += 1;
                }
            }
        }

        info!(
            "Enrichment pass done: {} movies considered, {} cache hits, {} queries, {} failures",
            stats.keys_considered, stats.cache_hits, stats.queries, stats.failures
        );
        Ok(stats)
    }
}

async fn resolve_key(
    canonical_key: String,
    sources: &[Arc<dyn MetadataSource>],
    cache: &Mutex<EnrichmentCache>,
    throttle: &EnrichmentThrottle,
    query_timeout: Duration,
) -> KeyOutcome {
    let hash = cache_key(&canonical_key);
    if let Some(found) = cache.lock().await.get(&hash).cloned() {
        debug!("Cache hit for '{}'", canonical_key);
        return KeyOutcome {
            canonical_key,
            data: found,
            cache_hit: true,
            queries: 0,
            failures: 0,
        };
    }

    let mut merged = EnrichmentData::default();
    let mut queries = 0;
    let mut failures = 0;
    for source in sources {
        throttle.acquire().await;
        queries += 1;
        match tokio::time::timeout(query_timeout, source.lookup(&canonical_key)).await {
            Ok(Ok(found)) => merged.fill_missing_from(&found),
            Ok(Err(err)) => {
                warn!(
                    "Source {} failed for '{}': {}",
                    source.source_name(),
                    canonical_key,
                    err
                );
                failures += 1;
            }
            Err(_) => {
                warn!(
                    "Source {} timed out for '{}'",
                    source.source_name(),
                    canonical_key
                );
                failures += 1;
            }
        }
        if merged.is_complete() {
            break;
        }
    }

    // Empty results stay uncached so a later run can retry the movie.
    if !merged.is_empty() {
        let mut cache = cache.lock().await;
        cache.insert(hash, merged.clone());
        cache.maybe_save();
    }

    KeyOutcome {
        canonical_key,
        data: merged,
        cache_hit: false,
        queries,
        failures,
    }
}
