use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::fetch::{FetchError, PageFetcher};

pub type LookupResult<T> = Result<T, LookupError>;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to decode lookup payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Typed shapes for the external lookup service. Defaulting happens here at
/// the deserialization boundary so business logic never touches raw maps.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct MovieDetails {
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub credits: Credits,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Genre {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastEntry>,
    #[serde(default)]
    pub crew: Vec<CrewEntry>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CastEntry {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CrewEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub job: String,
}

#[async_trait]
pub trait LookupClient: Send + Sync {
    async fn search_movie(&self, title: &str, language: &str) -> LookupResult<SearchResponse>;
    async fn movie_details(
        &self,
        id: u64,
        language: &str,
        with_credits: bool,
    ) -> LookupResult<MovieDetails>;
}

pub struct TmdbClient {
    fetcher: Arc<dyn PageFetcher>,
    api_base: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            api_base: api_base.into(),
            api_key: api_key.into(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> LookupResult<T> {
        let body = self.fetcher.get_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl LookupClient for TmdbClient {
    async fn search_movie(&self, title: &str, language: &str) -> LookupResult<SearchResponse> {
        let encoded: String = url::form_urlencoded::byte_serialize(title.as_bytes()).collect();
        let url = format!(
            "{}/search/movie?api_key={}&query={}&language={}",
            self.api_base, self.api_key, encoded, language
        );
        self.get_json(&url).await
    }

    async fn movie_details(
        &self,
        id: u64,
        language: &str,
        with_credits: bool,
    ) -> LookupResult<MovieDetails> {
        let mut url = format!(
            "{}/movie/{}?api_key={}&language={}",
            self.api_base, id, self.api_key, language
        );
        if with_credits {
            url.push_str("&append_to_response=credits");
        }
        self.get_json(&url).await
    }
}
