use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use thiserror::Error;
use tokio::sync::Semaphore;

pub type FetchResult<T> = Result<T, FetchError>;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build http client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },
}

/// Narrow seam over the HTTP transport: one GET, body as text. Everything
/// downstream (listing pages, detail pages, lookup and translation calls)
/// goes through this, so tests swap in a canned fetcher.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn get_text(&self, url: &str) -> FetchResult<String>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(max_connections: usize) -> FetchResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
            ),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("tr-TR,tr;q=0.8,en-US;q=0.5,en;q=0.3"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .pool_max_idle_per_host(max_connections)
            .build()
            .map_err(FetchError::Build)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn get_text(&self, url: &str) -> FetchResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })
    }
}

/// Caps simultaneously open connections through the inner fetcher. The
/// worker count bounds in-flight items; this bounds the transport across
/// every caller (listing walk, detail pages, lookup and translation calls
/// share the same permits).
pub struct LimitedFetcher<F> {
    inner: F,
    permits: Semaphore,
}

impl<F> LimitedFetcher<F> {
    pub fn new(inner: F, max_connections: usize) -> Self {
        Self {
            inner,
            permits: Semaphore::new(max_connections.max(1)),
        }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: PageFetcher> PageFetcher for LimitedFetcher<F> {
    async fn get_text(&self, url: &str) -> FetchResult<String> {
        // The semaphore is never closed, so acquire cannot fail.
        let _permit = self.permits.acquire().await.expect("semaphore closed");
        self.inner.get_text(url).await
    }
}
