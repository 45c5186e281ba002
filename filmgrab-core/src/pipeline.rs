use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::enrich::{
    CatalogMetadata, EnrichOutcome, MetadataEnricher, OVERVIEW_PLACEHOLDER, UNKNOWN_YEAR,
};
use crate::fetch::PageFetcher;
use crate::site::{SiteMetadata, SiteMetadataExtractor};
use crate::stream::{StreamInfo, StreamLinkResolver};

#[derive(Debug, Clone, Serialize)]
pub struct AggregatedRecord {
    pub title: String,
    pub year: String,
    pub genres: Vec<String>,
    pub cast: Vec<String>,
    pub director: String,
    pub overview: String,
    pub poster_url: String,
    pub stream_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    FetchFailed,
    NoTitle,
    NoStream,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkipReason::FetchFailed => "fetch_failed",
            SkipReason::NoTitle => "no_title",
            SkipReason::NoStream => "no_stream",
        };
        f.write_str(label)
    }
}

#[derive(Debug)]
enum ItemOutcome {
    Record {
        record: Box<AggregatedRecord>,
        enriched: bool,
    },
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct PipelineStats {
    pub items: usize,
    pub records: usize,
    pub skipped_fetch: usize,
    pub skipped_no_title: usize,
    pub skipped_no_stream: usize,
    pub enrich_misses: usize,
    pub abandoned: usize,
    pub duration_secs: u64,
}

/// Runs per-item processing under a fixed worker cap. Workers pull indices
/// from a shared cursor and write outcomes into slots keyed by the original
/// position, so the output order always matches the input link order.
#[derive(Clone)]
pub struct Coordinator {
    fetcher: Arc<dyn PageFetcher>,
    site: Arc<SiteMetadataExtractor>,
    stream: Arc<StreamLinkResolver>,
    enricher: Arc<MetadataEnricher>,
    workers: usize,
}

impl Coordinator {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        site: Arc<SiteMetadataExtractor>,
        stream: Arc<StreamLinkResolver>,
        enricher: Arc<MetadataEnricher>,
        workers: usize,
    ) -> Self {
        Self {
            fetcher,
            site,
            stream,
            enricher,
            workers: workers.max(1),
        }
    }

    pub async fn process_all(&self, links: Vec<String>) -> (Vec<AggregatedRecord>, PipelineStats) {
        let start = Instant::now();
        let total = links.len();
        let links = Arc::new(links);
        let cursor = Arc::new(AtomicUsize::new(0));
        let slots: Arc<Mutex<Vec<Option<ItemOutcome>>>> =
            Arc::new(Mutex::new((0..total).map(|_| None).collect()));

        let worker_count = self.workers.min(total.max(1));
        let mut handles = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let this = self.clone();
            let links = Arc::clone(&links);
            let cursor = Arc::clone(&cursor);
            let slots = Arc::clone(&slots);
            handles.push(tokio::spawn(async move {
                loop {
                    let index = cursor.fetch_add(1, Ordering::SeqCst);
                    if index >= links.len() {
                        break;
                    }
                    let outcome = this.process_item(&links[index]).await;
                    slots.lock().await[index] = Some(outcome);
                }
            }));
        }
        for handle in handles {
            if let Err(err) = handle.await {
                warn!(error = %err, "pipeline worker aborted");
            }
        }

        let mut stats = PipelineStats {
            items: total,
            ..Default::default()
        };
        let mut records = Vec::new();
        let mut slots = slots.lock().await;
        for slot in slots.drain(..) {
            match slot {
                Some(ItemOutcome::Record { record, enriched }) => {
                    if !enriched {
                        stats.enrich_misses += 1;
                    }
                    records.push(*record);
                }
                Some(ItemOutcome::Skipped(SkipReason::FetchFailed)) => stats.skipped_fetch += 1,
                Some(ItemOutcome::Skipped(SkipReason::NoTitle)) => stats.skipped_no_title += 1,
                Some(ItemOutcome::Skipped(SkipReason::NoStream)) => stats.skipped_no_stream += 1,
                None => stats.abandoned += 1,
            }
        }
        stats.records = records.len();
        stats.duration_secs = start.elapsed().as_secs();
        info!(
            items = stats.items,
            records = stats.records,
            enrich_misses = stats.enrich_misses,
            "pipeline finished"
        );
        (records, stats)
    }

    /// One item end to end. Failures before a stream link exists skip the
    /// item; enrichment never skips, it only degrades to defaults.
    async fn process_item(&self, url: &str) -> ItemOutcome {
        let html = match self.fetcher.get_text(url).await {
            Ok(html) => html,
            Err(err) => {
                warn!(url, error = %err, "detail page fetch failed");
                return ItemOutcome::Skipped(SkipReason::FetchFailed);
            }
        };

        let site = match self.site.extract(&html, url) {
            Some(site) => site,
            None => {
                warn!(url, "no usable title on detail page");
                return ItemOutcome::Skipped(SkipReason::NoTitle);
            }
        };
        let stream = match self.stream.resolve(&html, url) {
            Some(stream) => stream,
            None => {
                info!(url, title = %site.native_title, "no stream reference found");
                return ItemOutcome::Skipped(SkipReason::NoStream);
            }
        };

        info!(title = %site.native_title, original = site.original_title.as_deref().unwrap_or("-"), "processing item");
        let (catalog, enriched) = match self
            .enricher
            .enrich(&site.native_title, site.original_title.as_deref())
            .await
        {
            EnrichOutcome::Found(metadata) => (Some(metadata), true),
            EnrichOutcome::Miss(reason) => {
                info!(title = %site.native_title, reason = ?reason, "enrichment miss, using defaults");
                (None, false)
            }
        };

        ItemOutcome::Record {
            record: Box::new(merge_record(site, stream, catalog)),
            enriched,
        }
    }
}

/// The catalog poster wins only when the lookup actually returned one; a
/// catalog hit without a poster keeps the site poster.
fn merge_record(
    site: SiteMetadata,
    stream: StreamInfo,
    catalog: Option<CatalogMetadata>,
) -> AggregatedRecord {
    let site_poster = site.poster_url.unwrap_or_default();
    match catalog {
        Some(catalog) => AggregatedRecord {
            title: site.native_title,
            year: catalog.year,
            genres: catalog.genres,
            cast: catalog.cast,
            director: catalog.director,
            overview: catalog.overview,
            poster_url: catalog.poster_url.unwrap_or(site_poster),
            stream_url: stream.stream_url,
        },
        None => AggregatedRecord {
            title: site.native_title,
            year: UNKNOWN_YEAR.to_string(),
            genres: Vec::new(),
            cast: Vec::new(),
            director: String::new(),
            overview: OVERVIEW_PLACEHOLDER.to_string(),
            poster_url: site_poster,
            stream_url: stream.stream_url,
        },
    }
}
