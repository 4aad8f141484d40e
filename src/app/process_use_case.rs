use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::app::ports::TabularStorePort;
use crate::config::Config;
use crate::constants::OUTPUT_COLUMNS;
use crate::error::Result;
use crate::observability::metrics::{emit_counter, emit_gauge, emit_histogram, MetricName};
use crate::pipeline::processing::attributes::AttributeExtractor;
use crate::pipeline::processing::catalog::{reindex_rows, CatalogIndex, KeyResolution};
use crate::pipeline::processing::coherence::CoherencePropagator;
use crate::pipeline::processing::enrich::{EnrichmentMerger, EnrichmentStats};
use crate::pipeline::processing::formatting;
use crate::pipeline::processing::normalize::{DefaultNormalizer, NormalizedRecord, Normalizer};
use crate::pipeline::processing::quality_gate::{
    DefaultQualityValidator, QualityCheckKind, QualityReport, QualityValidator,
    QualityValidatorConfig,
};
use crate::types::MovieRow;

/// Per-invocation switches for the full pipeline run.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Leave the catalog unenriched; useful for offline runs and smoke tests.
    pub skip_enrichment: bool,
    /// Process at most this many input records.
    pub limit: Option<usize>,
}

/// What one full run did, returned to the caller for reporting and exit-code
/// decisions.
#[derive(Debug)]
pub struct ProcessSummary {
    pub rows_written: usize,
    pub records_dropped: usize,
    pub unique_movies: usize,
    pub enrichment: EnrichmentStats,
    pub report: QualityReport,
    pub reindex_applied: bool,
}

/// The run artifact written next to the output table, mirroring what the
/// validator and the enrichment pass saw.
#[derive(Debug, Serialize)]
pub struct RunMetrics {
    pub generated_at: DateTime<Utc>,
    pub rows: usize,
    pub columns: usize,
    pub records_dropped: usize,
    pub unique_names: usize,
    pub unique_ids: usize,
    pub one_to_one_mapping: bool,
    pub completeness_percent: BTreeMap<String, f64>,
    pub enrichment: EnrichmentStats,
    pub quality: QualityReport,
}

impl RunMetrics {
    fn collect(
        rows: &[MovieRow],
        records_dropped: usize,
        enrichment: EnrichmentStats,
        report: &QualityReport,
    ) -> Self {
        let unique_names: HashSet<&str> = rows
            .iter()
            .filter(|row| !row.nombre_unico.is_empty())
            .map(|row| row.nombre_unico.as_str())
            .collect();
        let unique_ids: HashSet<u64> = rows.iter().map(|row| row.movie_id).collect();

        let mut completeness_percent = BTreeMap::new();
        let columns: [(&str, fn(&MovieRow) -> &str); 6] = [
            ("CATEGORIA", |r| r.categoria.as_str()),
            ("DESCRIPCION", |r| r.descripcion.as_str()),
            ("ACTOR_PRINCIPAL", |r| r.actor_principal.as_str()),
            ("DIRECTOR", |r| r.director.as_str()),
            ("DURACION", |r| r.duracion.as_str()),
            ("FAMILIA", |r| r.familia.as_str()),
        ];
        for (name, get) in columns {
            completeness_percent.insert(name.to_string(), percent_filled(rows, get));
        }

        Self {
            generated_at: Utc::now(),
            rows: rows.len(),
            columns: OUTPUT_COLUMNS.len(),
            records_dropped,
            unique_names: unique_names.len(),
            unique_ids: unique_ids.len(),
            one_to_one_mapping: !report.failed(QualityCheckKind::IdBijection),
            completeness_percent,
            enrichment,
            quality: report.clone(),
        }
    }

    fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

fn percent_filled(rows: &[MovieRow], get: fn(&MovieRow) -> &str) -> f64 {
    if rows.is_empty() {
        return 100.0;
    }
    let filled = rows.iter().filter(|row| !get(row).is_empty()).count();
    filled as f64 * 100.0 / rows.len() as f64
}

fn emit_enrichment_stats(stats: &EnrichmentStats) {
    emit_counter(
        MetricName::EnrichmentKeysConsidered,
        stats.keys_considered as f64,
    );
    emit_counter(MetricName::EnrichmentCacheHits, stats.cache_hits as f64);
    emit_counter(MetricName::EnrichmentQueries, stats.queries as f64);
    emit_counter(MetricName::EnrichmentCompleted, stats.completed as f64);
    emit_counter(MetricName::EnrichmentFailures, stats.failures as f64);
}

/// Use case driving the standardization pipeline: load, normalize, index,
/// propagate, enrich, format, validate, write.
pub struct ProcessUseCase {
    store: Arc<dyn TabularStorePort>,
    merger: EnrichmentMerger,
    propagator: CoherencePropagator,
    validator: DefaultQualityValidator,
    normalizer: DefaultNormalizer,
    chunk_size: usize,
}

impl ProcessUseCase {
    pub fn new(store: Arc<dyn TabularStorePort>, merger: EnrichmentMerger, config: &Config) -> Self {
        Self {
            store,
            merger,
            propagator: CoherencePropagator::new(),
            validator: DefaultQualityValidator::with_config(QualityValidatorConfig {
                completeness_threshold: config.pipeline.completeness_threshold,
                ..Default::default()
            }),
            normalizer: DefaultNormalizer::new(AttributeExtractor::new(
                config.pipeline.duration_min,
                config.pipeline.duration_max,
            )),
            chunk_size: config.pipeline.chunk_size.max(1),
        }
    }

    /// Run the whole pipeline from a raw extract to a certified table.
    pub async fn process(
        &self,
        input: &Path,
        output: &Path,
        options: &ProcessOptions,
    ) -> Result<ProcessSummary> {
        let run_start = Instant::now();
        info!("🚀 Starting standardization run for {}", input.display());
        println!("🚀 Starting standardization run for {}", input.display());

        let mut raw_records = self.store.load_raw(input).await?;
        emit_counter(MetricName::RecordsLoaded, raw_records.len() as f64);
        if let Some(limit) = options.limit {
            raw_records.truncate(limit);
        }

        // Rows without any name are dropped; names that only lose their
        // content during normalization still flow through as keyless rows.
        let before_drop = raw_records.len();
        raw_records.retain(|record| !record.movie_name.trim().is_empty());
        let records_dropped = before_drop - raw_records.len();
        if records_dropped > 0 {
            warn!("Dropped {} records without a movie name", records_dropped);
            emit_counter(MetricName::RecordsDropped, records_dropped as f64);
        }
        info!("📊 Processing {} records", raw_records.len());
        println!(
            "📊 Processing {} records ({} dropped)",
            raw_records.len(),
            records_dropped
        );

        let normalized = self.normalize_all(&raw_records);

        let mut catalog = CatalogIndex::build(&normalized);
        emit_gauge(MetricName::CatalogSize, catalog.len() as f64);
        info!("🎬 Catalog holds {} canonical movies", catalog.len());
        println!("🎬 Catalog holds {} canonical movies", catalog.len());

        let mut rows = self.assign_rows(&mut catalog, &normalized);

        let propagation = self.propagator.propagate(&mut rows);
        emit_gauge(MetricName::CoherenceGroups, propagation.groups as f64);
        emit_counter(
            MetricName::CoherenceFieldsFilled,
            propagation.fields_filled as f64,
        );
        debug!(
            "Propagation filled {} fields across {} groups",
            propagation.fields_filled, propagation.groups
        );

        let enrichment = if options.skip_enrichment {
            info!("Enrichment skipped by flag");
            println!("⏭️ Enrichment skipped");
            EnrichmentStats::default()
        } else {
            let enrich_start = Instant::now();
            let stats = self.merger.enrich(&mut catalog).await?;
            emit_enrichment_stats(&stats);
            emit_histogram(
                MetricName::EnrichmentDuration,
                enrich_start.elapsed().as_secs_f64(),
            );
            println!(
                "📡 Enrichment: {} movies considered, {} cache hits, {} queries, {} failures",
                stats.keys_considered, stats.cache_hits, stats.queries, stats.failures
            );
            stats
        };

        self.propagator.apply_catalog(&mut rows, &catalog);
        formatting::apply(&mut rows);
        // the presentation pass rewrites primary fields, so mirrors go last
        self.propagator.assert_mirrors(&mut rows);

        let (report, reindex_applied) = self.validate_and_correct(&mut rows);

        self.store.save_finished(output, &rows).await?;
        emit_counter(MetricName::RowsWritten, rows.len() as f64);
        info!("💾 Wrote {} rows to {}", rows.len(), output.display());
        println!("💾 Wrote {} rows to {}", rows.len(), output.display());

        let metrics = RunMetrics::collect(&rows, records_dropped, enrichment, &report);
        let metrics_path = output.with_file_name("run_metrics.json");
        metrics.write(&metrics_path)?;
        debug!("Run metrics written to {}", metrics_path.display());

        emit_histogram(MetricName::RunDuration, run_start.elapsed().as_secs_f64());
        if report.certified {
            println!("✅ Dataset certified, score {:.1}", report.score);
        } else {
            println!(
                "❌ Certification failed, score {:.1}, failed checks: {:?}",
                report.score,
                report.failed_kinds()
            );
        }

        Ok(ProcessSummary {
            rows_written: rows.len(),
            records_dropped,
            unique_movies: catalog.len(),
            enrichment,
            report,
            reindex_applied,
        })
    }

    /// Enrichment plus propagation over an already standardized table.
    pub async fn enrich_existing(&self, input: &Path, output: &Path) -> Result<EnrichmentStats> {
        let mut rows = self.store.load_finished(input).await?;
        info!("📡 Enriching {} rows from {}", rows.len(), input.display());
        println!("📡 Enriching {} rows from {}", rows.len(), input.display());

        // Coherence first, so the catalog seeds from agreed group values.
        self.propagator.propagate(&mut rows);
        let mut catalog = CatalogIndex::from_rows(&rows);
        let stats = self.merger.enrich(&mut catalog).await?;
        emit_enrichment_stats(&stats);

        self.propagator.apply_catalog(&mut rows, &catalog);
        formatting::apply(&mut rows);
        self.propagator.assert_mirrors(&mut rows);

        self.store.save_finished(output, &rows).await?;
        emit_counter(MetricName::RowsWritten, rows.len() as f64);
        println!("💾 Wrote {} rows to {}", rows.len(), output.display());
        Ok(stats)
    }

    /// Run the quality battery over a finished table without touching it.
    pub async fn validate(&self, input: &Path) -> Result<QualityReport> {
        let rows = self.store.load_finished(input).await?;
        info!("Validating {} rows from {}", rows.len(), input.display());
        let report = self.validator.validate(&rows);
        emit_gauge(MetricName::QualityScore, report.score);
        Ok(report)
    }

    /// Corrective lexicographic re-indexing of a finished table.
    pub async fn reindex(&self, input: &Path, output: &Path) -> Result<usize> {
        let mut rows = self.store.load_finished(input).await?;
        let changed = reindex_rows(&mut rows);
        emit_counter(MetricName::QualityReindexRuns, 1.0);
        self.store.save_finished(output, &rows).await?;
        info!("Re-indexed {} of {} rows", changed, rows.len());
        Ok(changed)
    }

    fn normalize_all(&self, raw_records: &[crate::types::RawRecord]) -> Vec<NormalizedRecord> {
        let start = Instant::now();
        let mut normalized = Vec::with_capacity(raw_records.len());
        for chunk in raw_records.chunks(self.chunk_size) {
            for record in chunk {
                normalized.push(self.normalizer.normalize(record));
            }
            if raw_records.len() > self.chunk_size {
                println!(
                    "   Normalized {}/{} records",
                    normalized.len(),
                    raw_records.len()
                );
            }
        }
        emit_counter(
            MetricName::NormalizeRecordsProcessed,
            normalized.len() as f64,
        );
        emit_histogram(MetricName::NormalizeDuration, start.elapsed().as_secs_f64());
        normalized
    }

    fn assign_rows(
        &self,
        catalog: &mut CatalogIndex,
        normalized: &[NormalizedRecord],
    ) -> Vec<MovieRow> {
        let mut trailing_ids = 0usize;
        let mut rows = Vec::with_capacity(normalized.len());
        for record in normalized {
            let resolution = catalog.assign(record);
            if !matches!(resolution, KeyResolution::MatchedExisting(_)) {
                trailing_ids += 1;
            }
            rows.push(build_row(record, resolution.movie_id()));
        }
        if trailing_ids > 0 {
            emit_counter(MetricName::CatalogTrailingIds, trailing_ids as f64);
            debug!("{} rows took trailing identities", trailing_ids);
        }
        rows
    }

    fn validate_and_correct(&self, rows: &mut [MovieRow]) -> (QualityReport, bool) {
        let mut report = self.validator.validate(rows);
        let mut reindex_applied = false;
        if report.failed(QualityCheckKind::IdBijection) {
            warn!("Key/ID bijection broken, re-indexing the table");
            println!("⚠️ Key/ID bijection broken, re-indexing the table");
            let changed = reindex_rows(rows);
            emit_counter(MetricName::QualityReindexRuns, 1.0);
            info!("Corrective re-index renumbered {} rows", changed);
            report = self.validator.validate(rows);
            reindex_applied = true;
        }
        emit_gauge(MetricName::QualityScore, report.score);
        let failed = report.failed_kinds().len();
        if failed > 0 {
            emit_counter(MetricName::QualityChecksFailed, failed as f64);
        }
        (report, reindex_applied)
    }
}

/// One output row from a resolved record. Metadata columns start empty and
/// are filled by propagation, enrichment and the formatting pass.
fn build_row(record: &NormalizedRecord, movie_id: u64) -> MovieRow {
    let duracion = record
        .duration_minutes
        .map(|minutes| format!("{} minutos", minutes))
        .unwrap_or_default();
    MovieRow {
        movie_id,
        movie_name: record.raw.movie_name.clone(),
        titulo_limpio: record.title_l1.clone(),
        formato: record.format.as_str().to_string(),
        idioma: record.language.as_str().to_string(),
        categoria: String::new(),
        descripcion: String::new(),
        familia: record.family_key.clone(),
        nombre_original: record.raw.movie_name.clone(),
        descripcion2: String::new(),
        actor_principal: String::new(),
        director: String::new(),
        duracion,
        categoria_cinepolis: String::new(),
        nombre_original_clean: record.title_l2.clone(),
        titulo_limpio_clean: record.title_l2.clone(),
        nombre_unico: record.canonical_key.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::infra::cache::EnrichmentCache;
    use crate::infra::ndjson_store::NdjsonStore;
    use crate::types::{EnrichmentData, MetadataSource};

    struct StubSource {
        calls: Arc<AtomicUsize>,
        data: EnrichmentData,
    }

    #[async_trait]
    impl MetadataSource for StubSource {
        fn source_name(&self) -> &'static str {
            "stub"
        }

        async fn lookup(&self, _canonical_name: &str) -> crate::error::Result<EnrichmentData> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.data.clone())
        }
    }

    fn complete_data() -> EnrichmentData {
        EnrichmentData {
            categoria: "Ciencia Ficción".to_string(),
            descripcion: "arena y especia".to_string(),
            actor_principal: "timothee chalamet".to_string(),
            director: "denis villeneuve".to_string(),
            duracion: "166 min".to_string(),
        }
    }

    fn test_config(dir: &Path) -> Config {
        let mut config = Config::default();
        config.enrichment.rate_delay_ms = 0;
        config.enrichment.concurrency = 2;
        config.enrichment.cache_path = dir.join("cache.json").to_string_lossy().into_owned();
        config
    }

    fn use_case(dir: &Path, sources: Vec<Arc<dyn MetadataSource>>) -> ProcessUseCase {
        let config = test_config(dir);
        let cache = EnrichmentCache::open(
            &config.enrichment.cache_path,
            config.enrichment.cache_save_interval,
        );
        let merger = EnrichmentMerger::new(sources, cache, &config.enrichment);
        ProcessUseCase::new(Arc::new(NdjsonStore::new()), merger, &config)
    }

    fn write_input(dir: &Path, names: &[&str]) -> std::path::PathBuf {
        let path = dir.join("input.ndjson");
        let lines: Vec<String> = names
            .iter()
            .map(|name| format!("{{\"MOVIE_NAME\":{}}}", serde_json::to_string(name).unwrap()))
            .collect();
        fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    #[tokio::test]
    async fn suffix_variants_collapse_to_one_movie() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let source = Arc::new(StubSource {
            calls: calls.clone(),
            data: complete_data(),
        });
        let use_case = use_case(dir.path(), vec![source]);

        let input = write_input(
            dir.path(),
            &[
                "DUNE PARTE DOS 4DX SUB",
                "DUNE PARTE DOS ESP",
                "DUNE PARTE DOS 2",
                "   ",
            ],
        );
        let output = dir.path().join("out.ndjson");

        let summary = use_case
            .process(&input, &output, &ProcessOptions::default())
            .await
            .unwrap();

        assert_eq!(summary.rows_written, 3);
        assert_eq!(summary.records_dropped, 1);
        assert_eq!(summary.unique_movies, 2);
        assert!(summary.report.certified, "{:?}", summary.report.checks);

        let rows = NdjsonStore::new().load_finished(&output).await.unwrap();
        // the two suffix variants share identity, the sequel does not
        assert_eq!(rows[0].movie_id, rows[1].movie_id);
        assert_ne!(rows[0].movie_id, rows[2].movie_id);
        assert_eq!(rows[0].nombre_unico, "DUNE PARTE DOS");
        assert_eq!(rows[2].nombre_unico, "DUNE PARTE DOS 2");
        assert_eq!(rows[0].formato, "4D");
        assert_eq!(rows[1].formato, "2D");
        assert_eq!(rows[0].idioma, "SUB");
        assert_eq!(rows[1].idioma, "ESP");
        // sequel and base share the franchise
        assert_eq!(rows[0].familia, "DUNE PARTE DOS");
        assert_eq!(rows[2].familia, "DUNE PARTE DOS");
        // enrichment data passed through the formatting pass
        assert_eq!(rows[0].categoria, "CIENCIA_FICCION");
        assert_eq!(rows[0].director, "Denis Villeneuve");
        assert_eq!(rows[0].duracion, "166 minutos");
        assert_eq!(rows[0].categoria_cinepolis, rows[0].categoria);
    }

    #[tokio::test]
    async fn skip_enrichment_never_queries_sources() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let source = Arc::new(StubSource {
            calls: calls.clone(),
            data: complete_data(),
        });
        let use_case = use_case(dir.path(), vec![source]);

        let input = write_input(dir.path(), &["BARBIE ESP", "BARBIE SUB"]);
        let output = dir.path().join("out.ndjson");
        let options = ProcessOptions {
            skip_enrichment: true,
            ..Default::default()
        };

        let summary = use_case.process(&input, &output, &options).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(summary.enrichment.queries, 0);
        assert_eq!(summary.rows_written, 2);
    }

    #[tokio::test]
    async fn limit_caps_the_processed_records() {
        let dir = TempDir::new().unwrap();
        let use_case = use_case(dir.path(), Vec::new());

        let input = write_input(dir.path(), &["BARBIE", "AVATAR", "WICKED"]);
        let output = dir.path().join("out.ndjson");
        let options = ProcessOptions {
            skip_enrichment: true,
            limit: Some(2),
        };

        let summary = use_case.process(&input, &output, &options).await.unwrap();
        assert_eq!(summary.rows_written, 2);
    }

    #[tokio::test]
    async fn keyless_rows_take_distinct_trailing_ids() {
        let dir = TempDir::new().unwrap();
        let use_case = use_case(dir.path(), Vec::new());

        // pure punctuation normalizes to an empty canonical key
        let input = write_input(dir.path(), &["BARBIE", "---", "***"]);
        let output = dir.path().join("out.ndjson");
        let options = ProcessOptions {
            skip_enrichment: true,
            ..Default::default()
        };

        let summary = use_case.process(&input, &output, &options).await.unwrap();
        let rows = NdjsonStore::new().load_finished(&output).await.unwrap();
        assert_eq!(rows[0].movie_id, 1);
        assert_eq!(rows[1].nombre_unico, "");
        assert_eq!(rows[2].nombre_unico, "");
        assert_ne!(rows[1].movie_id, rows[2].movie_id);
        assert_ne!(rows[1].movie_id, rows[0].movie_id);
        assert!(!summary.report.failed(QualityCheckKind::IdBijection));
    }

    #[tokio::test]
    async fn run_metrics_artifact_lands_next_to_the_output() {
        let dir = TempDir::new().unwrap();
        let use_case = use_case(dir.path(), Vec::new());

        let input = write_input(dir.path(), &["BARBIE"]);
        let output = dir.path().join("out/table.ndjson");
        let options = ProcessOptions {
            skip_enrichment: true,
            ..Default::default()
        };
        use_case.process(&input, &output, &options).await.unwrap();

        let artifact = fs::read_to_string(dir.path().join("out/run_metrics.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&artifact).unwrap();
        assert_eq!(value["rows"], 1);
        assert_eq!(value["columns"], 17);
        assert_eq!(value["unique_names"], 1);
        assert_eq!(value["one_to_one_mapping"], true);
        assert!(value["quality"]["checks"].is_array());
    }

    #[tokio::test]
    async fn enrich_existing_fills_gaps_in_a_finished_table() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let source = Arc::new(StubSource {
            calls: calls.clone(),
            data: complete_data(),
        });
        let use_case = use_case(dir.path(), vec![source]);

        let store = NdjsonStore::new();
        let input = dir.path().join("table.ndjson");
        let rows = vec![MovieRow {
            movie_id: 1,
            movie_name: "BARBIE ESP".to_string(),
            titulo_limpio: "BARBIE ESP".to_string(),
            formato: "2D".to_string(),
            idioma: "ESP".to_string(),
            nombre_original: "BARBIE ESP".to_string(),
            nombre_original_clean: "BARBIE".to_string(),
            titulo_limpio_clean: "BARBIE".to_string(),
            nombre_unico: "BARBIE".to_string(),
            familia: "BARBIE".to_string(),
            ..Default::default()
        }];
        store.save_finished(&input, &rows).await.unwrap();

        let output = dir.path().join("enriched.ndjson");
        let stats = use_case.enrich_existing(&input, &output).await.unwrap();
        assert_eq!(stats.keys_considered, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let enriched = store.load_finished(&output).await.unwrap();
        assert_eq!(enriched[0].director, "Denis Villeneuve");
        assert_eq!(enriched[0].descripcion, "Arena y especia.");
        assert_eq!(enriched[0].descripcion2, enriched[0].descripcion);
    }

    #[tokio::test]
    async fn validate_reports_on_a_stored_table() {
        let dir = TempDir::new().unwrap();
        let use_case = use_case(dir.path(), Vec::new());

        let store = NdjsonStore::new();
        let input = dir.path().join("table.ndjson");
        // same key, two different ids: the bijection check must fail
        let rows = vec![
            MovieRow {
                movie_id: 1,
                nombre_unico: "DUNE".to_string(),
                ..Default::default()
            },
            MovieRow {
                movie_id: 2,
                nombre_unico: "DUNE".to_string(),
                ..Default::default()
            },
        ];
        store.save_finished(&input, &rows).await.unwrap();

        let report = use_case.validate(&input).await.unwrap();
        assert!(!report.certified);
        assert!(report.failed(QualityCheckKind::IdBijection));
    }

    #[tokio::test]
    async fn reindex_restores_the_bijection() {
        let dir = TempDir::new().unwrap();
        let use_case = use_case(dir.path(), Vec::new());

        let store = NdjsonStore::new();
        let input = dir.path().join("broken.ndjson");
        let rows = vec![
            MovieRow {
                movie_id: 9,
                nombre_unico: "ZORRO".to_string(),
                ..Default::default()
            },
            MovieRow {
                movie_id: 9,
                nombre_unico: "AVATAR".to_string(),
                ..Default::default()
            },
        ];
        store.save_finished(&input, &rows).await.unwrap();

        let output = dir.path().join("fixed.ndjson");
        let changed = use_case.reindex(&input, &output).await.unwrap();
        assert_eq!(changed, 2);

        let report = use_case.validate(&output).await.unwrap();
        assert!(!report.failed(QualityCheckKind::IdBijection));
    }
}
