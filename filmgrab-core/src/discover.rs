use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use scraper::{Html, Selector};
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{PipelineSection, SiteSection};
use crate::error::{ConfigError, Result};
use crate::fetch::PageFetcher;
use crate::site::absolutize_url;

#[derive(Debug, Clone, Serialize, Default)]
pub struct DiscoveryStats {
    pub pages_visited: usize,
    pub links_found: usize,
    pub truncated: bool,
    pub duration_secs: u64,
}

/// Walks the paginated listing and collects detail-page links. Pagination is
/// strictly increasing and stops on the first unproductive page, a missing
/// next-page affordance, a fetch failure, or the configured page cap.
pub struct LinkDiscoverer {
    fetcher: Arc<dyn PageFetcher>,
    listing_base: String,
    item_links: Selector,
    next_page: Selector,
    page_cap: usize,
    delay_range_ms: (u64, u64),
}

impl LinkDiscoverer {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        site: &SiteSection,
        pipeline: &PipelineSection,
    ) -> Result<Self> {
        let item_links = parse_selector(&site.item_link_selector)?;
        let next_page = parse_selector(&site.next_page_selector)?;
        Ok(Self {
            fetcher,
            listing_base: site.listing_base.clone(),
            item_links,
            next_page,
            page_cap: pipeline.page_cap.max(1),
            delay_range_ms: (pipeline.page_delay_ms[0], pipeline.page_delay_ms[1]),
        })
    }

    /// Returns the de-duplicated links in sorted order so downstream
    /// aggregation is deterministic regardless of page layout.
    pub async fn discover_all(&self) -> (Vec<String>, DiscoveryStats) {
        let start = Instant::now();
        let mut stats = DiscoveryStats::default();
        let mut links: HashSet<String> = HashSet::new();
        let mut page = 1usize;

        loop {
            let url = format!("{}?p={}", self.listing_base, page);
            let body = match self.fetcher.get_text(&url).await {
                Ok(body) => body,
                Err(err) => {
                    warn!(url = %url, error = %err, "listing fetch failed, stopping pagination");
                    break;
                }
            };
            stats.pages_visited += 1;

            let (page_links, has_next) = self.scan_page(&body);
            if page_links.is_empty() {
                debug!(page, "listing page yielded no item links");
                break;
            }
            for link in page_links {
                links.insert(link);
            }

            if !has_next {
                debug!(page, "no next-page affordance");
                break;
            }
            if page >= self.page_cap {
                warn!(
                    page_cap = self.page_cap,
                    links = links.len(),
                    "page cap reached, truncating discovery"
                );
                stats.truncated = true;
                break;
            }

            page += 1;
            self.inter_page_delay().await;
        }

        stats.links_found = links.len();
        stats.duration_secs = start.elapsed().as_secs();
        info!(
            links = stats.links_found,
            pages = stats.pages_visited,
            truncated = stats.truncated,
            "link discovery finished"
        );

        let mut sorted: Vec<String> = links.into_iter().collect();
        sorted.sort();
        (sorted, stats)
    }

    fn scan_page(&self, body: &str) -> (Vec<String>, bool) {
        let document = Html::parse_document(body);
        let links = document
            .select(&self.item_links)
            .filter_map(|anchor| anchor.value().attr("href"))
            .filter_map(|href| absolutize_url(&self.listing_base, href))
            .collect();
        let has_next = document.select(&self.next_page).next().is_some();
        (links, has_next)
    }

    async fn inter_page_delay(&self) {
        let (lower, upper) = self.delay_range_ms;
        if lower == 0 && upper == 0 {
            return;
        }
        let delay = {
            let mut rng = rand::thread_rng();
            rng.gen_range(lower.min(upper)..=lower.max(upper))
        };
        sleep(Duration::from_millis(delay)).await;
    }
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|_| ConfigError::Selector {
        selector: selector.to_string(),
    })
}
