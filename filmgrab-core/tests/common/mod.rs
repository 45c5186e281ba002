#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use filmgrab_core::fetch::{FetchError, FetchResult, PageFetcher};
use filmgrab_core::lookup::{
    CastEntry, Credits, CrewEntry, Genre, LookupClient, LookupError, LookupResult, MovieDetails,
    SearchHit, SearchResponse,
};
use filmgrab_core::translate::{TranslateError, TranslateResult, Translator};
use filmgrab_core::{LookupSection, OutputSection, PipelineSection, SiteSection};

/// Canned fetcher: serves bodies from a url map, returns a 404-style error
/// for anything unknown, and tracks the high-water mark of concurrent calls.
pub struct MockFetcher {
    pages: HashMap<String, String>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockFetcher {
    pub fn new(pages: HashMap<String, String>) -> Self {
        Self {
            pages,
            delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn get_text(&self, url: &str) -> FetchResult<String> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
        let result = match self.pages.get(url) {
            Some(body) => Ok(body.clone()),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub const LISTING_BASE: &str = "https://example.org/filmler";

pub fn site_section() -> SiteSection {
    SiteSection {
        listing_base: LISTING_BASE.into(),
        item_link_selector: "a.cover[href*='/film/']".into(),
        next_page_selector: ".pagination .next a".into(),
        title_selector: ".text-bold".into(),
        original_title_selector: ".muted-small".into(),
        poster_selector: ".media-cover img".into(),
        title_noise_markers: vec!["1080p".into(), "izle".into()],
        stream_host: "premiumvideo.click".into(),
        stream_url_template: "https://d2.premiumvideo.click/uploads/encode/{id}/master.m3u8".into(),
    }
}

pub fn pipeline_section(workers: usize, page_cap: usize) -> PipelineSection {
    PipelineSection {
        workers,
        max_connections: 10,
        page_cap,
        page_delay_ms: [0, 0],
    }
}

pub fn lookup_section() -> LookupSection {
    LookupSection {
        api_base: "https://api.example.org/3".into(),
        image_base: "https://img.example.org/w500".into(),
        language: "tr-TR".into(),
        fallback_language: "en-US".into(),
        api_key_env: "TMDB_API_KEY".into(),
        translate_endpoint: "https://translate.example.org".into(),
    }
}

pub fn output_section() -> OutputSection {
    OutputSection {
        path: "filmler.m3u".into(),
        proxy_base: "https://proxy.example.org/?url=".into(),
        default_group: "Filmler".into(),
    }
}

pub fn listing_url(page: usize) -> String {
    format!("{LISTING_BASE}?p={page}")
}

pub fn listing_page(hrefs: &[&str], has_next: bool) -> String {
    let mut body = String::from("<html><body>");
    for href in hrefs {
        body.push_str(&format!("<a class=\"cover\" href=\"{href}\">item</a>"));
    }
    if has_next {
        body.push_str("<div class=\"pagination\"><span class=\"next\"><a href=\"#\">next</a></span></div>");
    }
    body.push_str("</body></html>");
    body
}

/// Canned lookup service: search hits keyed by lowercased title, details
/// keyed by (id, language). Records every search query for order assertions.
#[derive(Default)]
pub struct MockLookup {
    pub results: HashMap<String, u64>,
    pub details: HashMap<(u64, String), MovieDetails>,
    pub fail_details: bool,
    pub failing_searches: HashSet<String>,
    pub searches: Mutex<Vec<String>>,
}

impl MockLookup {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_result(mut self, title: &str, id: u64) -> Self {
        self.results.insert(title.to_lowercase(), id);
        self
    }

    pub fn with_details(mut self, id: u64, language: &str, details: MovieDetails) -> Self {
        self.details.insert((id, language.to_string()), details);
        self
    }

    pub fn with_search_failure(mut self, title: &str) -> Self {
        self.failing_searches.insert(title.to_lowercase());
        self
    }

    pub fn searched_titles(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl LookupClient for MockLookup {
    async fn search_movie(&self, title: &str, _language: &str) -> LookupResult<SearchResponse> {
        self.searches.lock().unwrap().push(title.to_string());
        if self.failing_searches.contains(&title.to_lowercase()) {
            return Err(LookupError::Fetch(FetchError::Status {
                url: "mock://search".to_string(),
                status: 500,
            }));
        }
        let results = self
            .results
            .get(&title.to_lowercase())
            .map(|id| vec![SearchHit { id: *id }])
            .unwrap_or_default();
        Ok(SearchResponse { results })
    }

    async fn movie_details(
        &self,
        id: u64,
        language: &str,
        _with_credits: bool,
    ) -> LookupResult<MovieDetails> {
        if self.fail_details {
            return Err(LookupError::Fetch(FetchError::Status {
                url: format!("mock://movie/{id}"),
                status: 500,
            }));
        }
        match self.details.get(&(id, language.to_string())) {
            Some(details) => Ok(details.clone()),
            None => Err(LookupError::Fetch(FetchError::Status {
                url: format!("mock://movie/{id}"),
                status: 404,
            })),
        }
    }
}

pub enum TranslatorBehavior {
    Prefix(&'static str),
    Fail,
}

pub struct MockTranslator {
    pub behavior: TranslatorBehavior,
    pub calls: Mutex<Vec<String>>,
}

impl MockTranslator {
    pub fn prefixing(prefix: &'static str) -> Self {
        Self {
            behavior: TranslatorBehavior::Prefix(prefix),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            behavior: TranslatorBehavior::Fail,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, _target_lang: &str) -> TranslateResult<String> {
        self.calls.lock().unwrap().push(text.to_string());
        match &self.behavior {
            TranslatorBehavior::Prefix(prefix) => Ok(format!("{prefix}{text}")),
            TranslatorBehavior::Fail => Err(TranslateError::Shape),
        }
    }
}

pub fn movie_details(
    overview: &str,
    release_date: &str,
    genres: &[&str],
    cast: &[&str],
    director: Option<&str>,
    poster_path: Option<&str>,
) -> MovieDetails {
    MovieDetails {
        overview: overview.into(),
        release_date: release_date.into(),
        genres: genres
            .iter()
            .map(|name| Genre {
                name: (*name).into(),
            })
            .collect(),
        poster_path: poster_path.map(Into::into),
        credits: Credits {
            cast: cast
                .iter()
                .map(|name| CastEntry {
                    name: (*name).into(),
                })
                .collect(),
            crew: director
                .map(|name| {
                    vec![CrewEntry {
                        name: name.into(),
                        job: "Director".into(),
                    }]
                })
                .unwrap_or_default(),
        },
    }
}

pub fn detail_page(title: &str, original: Option<&str>, poster: Option<&str>, file_id: Option<&str>) -> String {
    let mut body = String::from("<html><body>");
    body.push_str(&format!("<h1 class=\"text-bold\">{title}</h1>"));
    if let Some(original) = original {
        body.push_str(&format!("<div class=\"muted-small\">{original}</div>"));
    }
    if let Some(poster) = poster {
        body.push_str(&format!("<div class=\"media-cover\"><img src=\"{poster}\"></div>"));
    }
    if let Some(file_id) = file_id {
        body.push_str(&format!(
            "<iframe src=\"https://premiumvideo.click/player/{file_id}\"></iframe>"
        ));
    }
    body.push_str("</body></html>");
    body
}
