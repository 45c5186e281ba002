use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FilmgrabConfig {
    pub site: SiteSection,
    pub lookup: LookupSection,
    pub pipeline: PipelineSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteSection {
    /// Listing base; pages are addressed as `{listing_base}?p={n}`.
    pub listing_base: String,
    pub item_link_selector: String,
    pub next_page_selector: String,
    pub title_selector: String,
    pub original_title_selector: String,
    pub poster_selector: String,
    /// Quality/language noise stripped from titles, case-insensitively.
    pub title_noise_markers: Vec<String>,
    pub stream_host: String,
    /// Template with an `{id}` placeholder for the extracted file id.
    pub stream_url_template: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LookupSection {
    pub api_base: String,
    pub image_base: String,
    pub language: String,
    pub fallback_language: String,
    pub api_key_env: String,
    pub translate_endpoint: String,
}

impl LookupSection {
    /// The api key is the one required secret; a missing or blank variable
    /// is fatal before any enrichment starts.
    pub fn resolve_api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ConfigError::MissingKey {
                var: self.api_key_env.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    pub workers: usize,
    pub max_connections: usize,
    /// Hard ceiling on listing pages; exceeding it truncates discovery.
    pub page_cap: usize,
    pub page_delay_ms: [u64; 2],
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSection {
    pub path: String,
    pub proxy_base: String,
    pub default_group: String,
}

pub fn load_filmgrab_config<P: AsRef<Path>>(path: P) -> Result<FilmgrabConfig> {
    load_toml(path)
}

fn load_toml<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        source,
        path: path.to_path_buf(),
    })
}
