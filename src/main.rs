use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use cinecat::app::ports::PageFetcherPort;
use cinecat::app::process_use_case::{ProcessOptions, ProcessUseCase};
use cinecat::config::Config;
use cinecat::infra::cache::EnrichmentCache;
use cinecat::infra::http_client::ReqwestFetcher;
use cinecat::infra::ndjson_store::NdjsonStore;
use cinecat::logging;
use cinecat::observability;
use cinecat::pipeline::processing::enrich::sources::sources_from_config;
use cinecat::pipeline::processing::enrich::EnrichmentMerger;
use cinecat::pipeline::processing::quality_gate::QualityCheckKind;

#[derive(Parser)]
#[command(name = "cinecat")]
#[command(about = "Cinema POS movie name standardization and enrichment pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: normalize, resolve identities, enrich, validate
    Process {
        /// Raw POS extract, one JSON record per line
        #[arg(long)]
        input: PathBuf,
        /// Where the standardized table is written
        #[arg(long)]
        output: PathBuf,
        /// Leave metadata unenriched (offline runs)
        #[arg(long)]
        skip_enrichment: bool,
        /// Process at most this many records
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Enrich an already standardized table
    Enrich {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Run the quality battery over a finished table
    Validate {
        #[arg(long)]
        input: PathBuf,
    },
    /// Re-derive MOVIE_ID from NOMBRE_UNICO to restore the key/ID bijection
    Reindex {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
}

fn build_use_case(config: &Config) -> Result<ProcessUseCase, Box<dyn std::error::Error>> {
    let fetcher: Arc<dyn PageFetcherPort> = Arc::new(ReqwestFetcher::new(Duration::from_secs(
        config.enrichment.timeout_seconds,
    ))?);
    let sources = sources_from_config(&config.enrichment.enabled_sources, &fetcher);
    let cache = EnrichmentCache::open(
        &config.enrichment.cache_path,
        config.enrichment.cache_save_interval,
    );
    let merger = EnrichmentMerger::new(sources, cache, &config.enrichment);
    Ok(ProcessUseCase::new(
        Arc::new(NdjsonStore::new()),
        merger,
        config,
    ))
}

fn write_metrics_snapshot() {
    if let Some(rendered) = observability::snapshot() {
        if let Err(e) = std::fs::write("logs/metrics.prom", rendered) {
            warn!("Could not write metrics snapshot: {}", e);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    logging::init_logging();
    if let Err(e) = observability::init() {
        warn!("Metrics recorder not installed: {}", e);
    }

    let cli = Cli::parse();
    let config = Config::load()?;
    let use_case = build_use_case(&config)?;

    match cli.command {
        Commands::Process {
            input,
            output,
            skip_enrichment,
            limit,
        } => {
            let options = ProcessOptions {
                skip_enrichment,
                limit,
            };
            match use_case.process(&input, &output, &options).await {
                Ok(summary) => {
                    println!("\n📊 Run summary:");
                    println!("   Rows written: {}", summary.rows_written);
                    println!("   Records dropped: {}", summary.records_dropped);
                    println!("   Unique movies: {}", summary.unique_movies);
                    println!("   Quality score: {:.1}", summary.report.score);
                    if summary.reindex_applied {
                        println!("   Corrective re-index was applied");
                    }
                    write_metrics_snapshot();

                    // An uncertified table still ships unless the identity
                    // guarantee itself is broken after the corrective pass.
                    if summary.report.failed(QualityCheckKind::IdBijection) {
                        error!("Key/ID bijection still broken after re-indexing");
                        println!("❌ Key/ID bijection still broken after re-indexing");
                        std::process::exit(1);
                    }
                }
                Err(e) => {
                    error!("Processing failed: {}", e);
                    println!("❌ Processing failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Enrich { input, output } => {
            let stats = use_case.enrich_existing(&input, &output).await?;
            println!("\n📊 Enrichment results:");
            println!("   Considered: {}", stats.keys_considered);
            println!("   Cache hits: {}", stats.cache_hits);
            println!("   Queries: {}", stats.queries);
            println!("   Completed: {}", stats.completed);
            println!("   Failures: {}", stats.failures);
            write_metrics_snapshot();
        }
        Commands::Validate { input } => {
            let report = use_case.validate(&input).await?;
            println!("\n📊 Validation of {}:", input.display());
            for check in &report.checks {
                let mark = if check.passed { "✅" } else { "❌" };
                match &check.detail {
                    Some(detail) => println!("   {} {:?}: {}", mark, check.kind, detail),
                    None => println!("   {} {:?}", mark, check.kind),
                }
            }
            println!(
                "   Score: {:.1} over {} rows",
                report.score, report.rows_validated
            );
            if report.certified {
                println!("✅ Dataset certified");
            } else {
                println!("❌ Dataset not certified");
                std::process::exit(1);
            }
        }
        Commands::Reindex { input, output } => {
            let changed = use_case.reindex(&input, &output).await?;
            info!("Re-index finished, {} rows renumbered", changed);
            println!(
                "✅ Re-indexed table written to {} ({} rows renumbered)",
                output.display(),
                changed
            );
        }
    }
    Ok(())
}
