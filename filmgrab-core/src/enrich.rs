use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::LookupSection;
use crate::lookup::{LookupClient, MovieDetails};
use crate::translate::Translator;

pub const OVERVIEW_PLACEHOLDER: &str = "No description.";
pub const UNKNOWN_DIRECTOR: &str = "Unknown";
pub const UNKNOWN_YEAR: &str = "????";

const MAX_CAST: usize = 5;
const DIRECTOR_JOB: &str = "Director";

#[derive(Debug, Clone, Serialize)]
pub struct CatalogMetadata {
    pub year: String,
    pub genres: Vec<String>,
    pub cast: Vec<String>,
    pub director: String,
    pub overview: String,
    pub poster_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichMiss {
    /// No search candidate produced any result.
    NoSearchResult,
    /// A candidate matched but the details fetch failed.
    DetailsUnavailable,
}

#[derive(Debug, Clone)]
pub enum EnrichOutcome {
    Found(CatalogMetadata),
    Miss(EnrichMiss),
}

/// Resolves external catalog metadata for one item: candidate-title search,
/// native-language details, and a translated fallback synopsis when the
/// native one is empty. All calls per item are sequential on purpose: a hit
/// on the first candidate skips the rest.
pub struct MetadataEnricher {
    lookup: Arc<dyn LookupClient>,
    translator: Arc<dyn Translator>,
    language: String,
    fallback_language: String,
    image_base: String,
}

impl MetadataEnricher {
    pub fn new(
        lookup: Arc<dyn LookupClient>,
        translator: Arc<dyn Translator>,
        section: &LookupSection,
    ) -> Self {
        Self {
            lookup,
            translator,
            language: section.language.clone(),
            fallback_language: section.fallback_language.clone(),
            image_base: section.image_base.clone(),
        }
    }

    pub async fn enrich(&self, native_title: &str, original_title: Option<&str>) -> EnrichOutcome {
        let movie_id = match self.find_movie_id(native_title, original_title).await {
            Some(id) => id,
            None => return EnrichOutcome::Miss(EnrichMiss::NoSearchResult),
        };

        let details = match self.lookup.movie_details(movie_id, &self.language, true).await {
            Ok(details) => details,
            Err(err) => {
                warn!(movie_id, error = %err, "details fetch failed");
                return EnrichOutcome::Miss(EnrichMiss::DetailsUnavailable);
            }
        };

        let overview = self
            .resolve_overview(movie_id, details.overview.trim().to_string())
            .await;
        EnrichOutcome::Found(self.build_metadata(&details, overview))
    }

    async fn find_movie_id(&self, native_title: &str, original_title: Option<&str>) -> Option<u64> {
        let mut candidates = vec![native_title];
        if let Some(original) = original_title {
            if original.to_lowercase() != native_title.to_lowercase() {
                candidates.push(original);
            }
        }

        for candidate in candidates {
            match self.lookup.search_movie(candidate, &self.language).await {
                Ok(response) => {
                    if let Some(hit) = response.results.first() {
                        info!(title = candidate, id = hit.id, "lookup matched");
                        return Some(hit.id);
                    }
                }
                Err(err) => {
                    debug!(title = candidate, error = %err, "lookup search failed");
                }
            }
        }
        None
    }

    /// Falls back to the secondary-language synopsis, translated back to the
    /// native language. Translation failure keeps the untranslated text.
    async fn resolve_overview(&self, movie_id: u64, native_overview: String) -> String {
        if !native_overview.is_empty() {
            return native_overview;
        }
        info!(movie_id, "no native overview, trying fallback language");

        let fallback = match self
            .lookup
            .movie_details(movie_id, &self.fallback_language, false)
            .await
        {
            Ok(details) => details.overview.trim().to_string(),
            Err(err) => {
                debug!(movie_id, error = %err, "fallback details fetch failed");
                String::new()
            }
        };
        if fallback.is_empty() {
            return String::new();
        }

        match self.translator.translate(&fallback, &self.language).await {
            Ok(translated) if !translated.trim().is_empty() => translated,
            Ok(_) => fallback,
            Err(err) => {
                warn!(movie_id, error = %err, "translation failed, keeping fallback text");
                fallback
            }
        }
    }

    fn build_metadata(&self, details: &MovieDetails, overview: String) -> CatalogMetadata {
        let year = details
            .release_date
            .split('-')
            .next()
            .filter(|year| !year.is_empty())
            .unwrap_or(UNKNOWN_YEAR)
            .to_string();
        let genres = details
            .genres
            .iter()
            .map(|genre| genre.name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        let cast = details
            .credits
            .cast
            .iter()
            .take(MAX_CAST)
            .map(|entry| entry.name.clone())
            .collect();
        let director = details
            .credits
            .crew
            .iter()
            .find(|entry| entry.job == DIRECTOR_JOB)
            .map(|entry| entry.name.clone())
            .unwrap_or_else(|| UNKNOWN_DIRECTOR.to_string());
        let overview = if overview.is_empty() {
            OVERVIEW_PLACEHOLDER.to_string()
        } else {
            overview
        };
        let poster_url = details
            .poster_path
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(|path| format!("{}{}", self.image_base, path));

        CatalogMetadata {
            year,
            genres,
            cast,
            director,
            overview,
            poster_url,
        }
    }
}
