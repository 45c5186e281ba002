use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use filmgrab_core::fetch::PageFetcher;
use filmgrab_core::lookup::LookupClient;
use filmgrab_core::translate::Translator;
use filmgrab_core::{
    load_filmgrab_config, Coordinator, DiscoveryStats, FilmgrabConfig, HttpFetcher,
    LimitedFetcher, LinkDiscoverer, MetadataEnricher, PipelineStats, PlaylistWriter,
    SiteMetadataExtractor, StreamLinkResolver, TmdbClient, WebTranslator,
};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] filmgrab_core::ConfigError),
    #[error("fetch error: {0}")]
    Fetch(#[from] filmgrab_core::FetchError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("no item links discovered")]
    NothingDiscovered,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "One-shot catalog-to-playlist batch pipeline", long_about = None)]
pub struct Cli {
    /// Path to filmgrab.toml
    #[arg(long, default_value = "configs/filmgrab.toml")]
    pub config: PathBuf,
    /// Override the output playlist path
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Override the discovery page cap
    #[arg(long)]
    pub max_pages: Option<usize>,
    /// Override the processing worker count
    #[arg(long)]
    pub workers: Option<usize>,
    /// Discover links only; skip processing and output
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
    /// Output format for the run report
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub discovery: DiscoveryStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<PipelineStats>,
    pub entries_written: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<String>>,
}

impl RunReport {
    fn display(&self) -> String {
        let mut lines = vec![format!(
            "Discovery: {} links across {} pages{}",
            self.discovery.links_found,
            self.discovery.pages_visited,
            if self.discovery.truncated {
                " (truncated at page cap)"
            } else {
                ""
            }
        )];
        if let Some(links) = &self.links {
            for link in links {
                lines.push(format!("  {link}"));
            }
        }
        if let Some(pipeline) = &self.pipeline {
            lines.push(format!(
                "Pipeline: {} records from {} items (fetch skips: {}, title skips: {}, stream skips: {}, enrich misses: {})",
                pipeline.records,
                pipeline.items,
                pipeline.skipped_fetch,
                pipeline.skipped_no_title,
                pipeline.skipped_no_stream,
                pipeline.enrich_misses,
            ));
        }
        if let Some(output) = &self.output {
            lines.push(format!("Wrote {} entries to {}", self.entries_written, output));
        }
        lines.join("\n")
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    init_tracing();

    let mut config = load_filmgrab_config(&cli.config)?;
    apply_overrides(&mut config, &cli);

    // Required precondition for enrichment; checked once, before any work.
    let api_key = config.lookup.resolve_api_key()?;

    let fetcher: Arc<dyn PageFetcher> = Arc::new(LimitedFetcher::new(
        HttpFetcher::new(config.pipeline.max_connections)?,
        config.pipeline.max_connections,
    ));
    let discoverer = LinkDiscoverer::new(Arc::clone(&fetcher), &config.site, &config.pipeline)?;
    let (links, discovery) = discoverer.discover_all().await;
    if links.is_empty() {
        return Err(AppError::NothingDiscovered);
    }

    if cli.dry_run {
        let report = RunReport {
            discovery,
            pipeline: None,
            entries_written: 0,
            output: None,
            links: Some(links),
        };
        return render(&report, cli.format);
    }

    let site = Arc::new(SiteMetadataExtractor::new(&config.site)?);
    let stream = Arc::new(StreamLinkResolver::new(&config.site)?);
    let lookup: Arc<dyn LookupClient> = Arc::new(TmdbClient::new(
        Arc::clone(&fetcher),
        config.lookup.api_base.clone(),
        api_key,
    ));
    let translator: Arc<dyn Translator> = Arc::new(WebTranslator::new(
        Arc::clone(&fetcher),
        config.lookup.translate_endpoint.clone(),
    ));
    let enricher = Arc::new(MetadataEnricher::new(lookup, translator, &config.lookup));
    let coordinator = Coordinator::new(
        Arc::clone(&fetcher),
        site,
        stream,
        enricher,
        config.pipeline.workers,
    );
    let (records, pipeline) = coordinator.process_all(links).await;

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.path));
    let writer = PlaylistWriter::new(&config.output);
    let entries_written = writer.write_file(&output_path, &records)?;
    info!(entries = entries_written, "run complete");

    let report = RunReport {
        discovery,
        pipeline: Some(pipeline),
        entries_written,
        output: Some(output_path.display().to_string()),
        links: None,
    };
    render(&report, cli.format)
}

fn apply_overrides(config: &mut FilmgrabConfig, cli: &Cli) {
    if let Some(max_pages) = cli.max_pages {
        config.pipeline.page_cap = max_pages;
    }
    if let Some(workers) = cli.workers {
        config.pipeline.workers = workers;
    }
}

fn render(report: &RunReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{}", report.display());
            Ok(())
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
            Ok(())
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
