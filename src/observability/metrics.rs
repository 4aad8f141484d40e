//! Metrics for the standardization pipeline, recorded through the `metrics`
//! facade with standard Prometheus naming. The process is a batch job, so
//! instead of serving an endpoint the accumulated metrics are rendered to a
//! text snapshot at the end of the run.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::info;

/// Every metric name used in the system. The enum eliminates magic strings
/// and provides compile-time safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Ingest
    RecordsLoaded,
    RecordsDropped,

    // Normalize
    NormalizeRecordsProcessed,
    NormalizeDuration,

    // Catalog
    CatalogSize,
    CatalogTrailingIds,

    // Coherence
    CoherenceGroups,
    CoherenceFieldsFilled,

    // Enrichment
    EnrichmentKeysConsidered,
    EnrichmentCacheHits,
    EnrichmentQueries,
    EnrichmentFailures,
    EnrichmentCompleted,
    EnrichmentDuration,

    // Quality
    QualityScore,
    QualityChecksFailed,
    QualityReindexRuns,

    // Run
    RowsWritten,
    RunDuration,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::RecordsLoaded => "cinecat_records_loaded_total",
            MetricName::RecordsDropped => "cinecat_records_dropped_total",

            MetricName::NormalizeRecordsProcessed => "cinecat_normalize_records_processed_total",
            MetricName::NormalizeDuration => "cinecat_normalize_duration_seconds",

            MetricName::CatalogSize => "cinecat_catalog_size",
            MetricName::CatalogTrailingIds => "cinecat_catalog_trailing_ids_total",

            MetricName::CoherenceGroups => "cinecat_coherence_groups",
            MetricName::CoherenceFieldsFilled => "cinecat_coherence_fields_filled_total",

            MetricName::EnrichmentKeysConsidered => "cinecat_enrichment_keys_considered_total",
            MetricName::EnrichmentCacheHits => "cinecat_enrichment_cache_hits_total",
            MetricName::EnrichmentQueries => "cinecat_enrichment_queries_total",
            MetricName::EnrichmentFailures => "cinecat_enrichment_failures_total",
            MetricName::EnrichmentCompleted => "cinecat_enrichment_completed_total",
            MetricName::EnrichmentDuration => "cinecat_enrichment_duration_seconds",

            MetricName::QualityScore => "cinecat_quality_score",
            MetricName::QualityChecksFailed => "cinecat_quality_checks_failed_total",
            MetricName::QualityReindexRuns => "cinecat_quality_reindex_runs_total",

            MetricName::RowsWritten => "cinecat_rows_written_total",
            MetricName::RunDuration => "cinecat_run_duration_seconds",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Record a counter increment.
pub fn emit_counter(name: MetricName, value: f64) {
    ::metrics::counter!(name.as_str()).increment(value as u64);
}

/// Record a histogram observation.
pub fn emit_histogram(name: MetricName, value: f64) {
    ::metrics::histogram!(name.as_str()).record(value);
}

/// Record a gauge value.
pub fn emit_gauge(name: MetricName, value: f64) {
    ::metrics::gauge!(name.as_str()).set(value);
}

static METRICS_HANDLE: OnceLock<Arc<metrics_exporter_prometheus::PrometheusHandle>> =
    OnceLock::new();

/// Install the Prometheus recorder. Safe to call once per process; metrics
/// emitted before init land in the void, which is fine for tests.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    METRICS_HANDLE.set(Arc::new(handle)).ok();
    info!("Metrics system initialized");
    Ok(())
}

/// Render everything recorded so far in Prometheus text format. None until
/// init has run.
pub fn snapshot() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}
