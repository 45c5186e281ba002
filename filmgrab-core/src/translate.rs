use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::fetch::{FetchError, PageFetcher};

pub type TranslateResult<T> = Result<T, TranslateError>;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to decode translation payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unexpected translation payload shape")]
    Shape,
}

/// Translation is best-effort everywhere it is used: a failure degrades to
/// the untranslated source text, it never drops an item.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, target_lang: &str) -> TranslateResult<String>;
}

/// Client for the public web translation endpoint. The response is a nested
/// JSON array whose first element lists `[translated, original, ...]`
/// segments.
pub struct WebTranslator {
    fetcher: Arc<dyn PageFetcher>,
    endpoint: String,
}

impl WebTranslator {
    pub fn new(fetcher: Arc<dyn PageFetcher>, endpoint: impl Into<String>) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Translator for WebTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> TranslateResult<String> {
        let encoded: String = url::form_urlencoded::byte_serialize(text.as_bytes()).collect();
        let url = format!(
            "{}?client=gtx&sl=auto&tl={}&dt=t&q={}",
            self.endpoint, target_lang, encoded
        );
        let body = self.fetcher.get_text(&url).await?;
        parse_translation_payload(&body)
    }
}

fn parse_translation_payload(body: &str) -> TranslateResult<String> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let segments = value
        .get(0)
        .and_then(|segments| segments.as_array())
        .ok_or(TranslateError::Shape)?;

    let mut translated = String::new();
    for segment in segments {
        if let Some(text) = segment.get(0).and_then(|part| part.as_str()) {
            translated.push_str(text);
        }
    }
    if translated.is_empty() {
        return Err(TranslateError::Shape);
    }
    Ok(translated)
}
