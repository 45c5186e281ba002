use regex::{Regex, RegexBuilder};
use scraper::{Html, Selector};
use serde::Serialize;
use url::Url;

use crate::config::SiteSection;
use crate::discover::parse_selector;
use crate::error::Result;

#[derive(Debug, Clone, Serialize)]
pub struct SiteMetadata {
    pub native_title: String,
    pub original_title: Option<String>,
    pub poster_url: Option<String>,
}

/// Reads the per-item fields off a detail page. A page without a usable
/// title element yields `None`; callers treat that as an item skip.
pub struct SiteMetadataExtractor {
    title: Selector,
    original_title: Selector,
    poster: Selector,
    year_suffix: Regex,
    noise_markers: Vec<Regex>,
}

impl SiteMetadataExtractor {
    pub fn new(site: &SiteSection) -> Result<Self> {
        let noise_markers = site
            .title_noise_markers
            .iter()
            .map(|marker| {
                RegexBuilder::new(&regex::escape(marker))
                    .case_insensitive(true)
                    .build()
                    .expect("escaped marker is a valid regex")
            })
            .collect();
        Ok(Self {
            title: parse_selector(&site.title_selector)?,
            original_title: parse_selector(&site.original_title_selector)?,
            poster: parse_selector(&site.poster_selector)?,
            year_suffix: Regex::new(r"\s*\(\d{4}\)\s*").expect("valid regex"),
            noise_markers,
        })
    }

    pub fn extract(&self, html: &str, page_url: &str) -> Option<SiteMetadata> {
        let document = Html::parse_document(html);

        let raw_title = element_text(&document, &self.title)?;
        let native_title = self.clean_title(&raw_title);
        if native_title.is_empty() {
            return None;
        }

        let original_title = element_text(&document, &self.original_title);
        let poster_url = document
            .select(&self.poster)
            .next()
            .and_then(|img| img.value().attr("src"))
            .and_then(|src| absolutize_url(page_url, src));

        Some(SiteMetadata {
            native_title,
            original_title,
            poster_url,
        })
    }

    /// Strips a parenthesised 4-digit year and the configured quality or
    /// language markers, then collapses whitespace.
    pub fn clean_title(&self, raw: &str) -> String {
        let mut title = self.year_suffix.replace_all(raw, " ").into_owned();
        for marker in &self.noise_markers {
            title = marker.replace_all(&title, " ").into_owned();
        }
        title.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

fn element_text(document: &Html, selector: &Selector) -> Option<String> {
    let text = document
        .select(selector)
        .next()?
        .text()
        .collect::<String>()
        .trim()
        .to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Site markup mixes relative and absolute references; anything already
/// carrying a scheme passes through untouched.
pub(crate) fn absolutize_url(base: &str, candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }
    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        return Some(candidate.to_string());
    }
    Url::parse(base)
        .ok()?
        .join(candidate)
        .ok()
        .map(|url| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteSection;

    fn site_section() -> SiteSection {
        SiteSection {
            listing_base: "https://example.org/films".into(),
            item_link_selector: "a.cover[href*='/film/']".into(),
            next_page_selector: ".pagination .next a".into(),
            title_selector: ".text-bold".into(),
            original_title_selector: ".muted-small".into(),
            poster_selector: ".media-cover img".into(),
            title_noise_markers: vec![
                "türkçe dublaj".into(),
                "tr dublaj".into(),
                "altyazılı".into(),
                "full hd".into(),
                "1080p".into(),
                "720p".into(),
                "izle".into(),
            ],
            stream_host: "premiumvideo.click".into(),
            stream_url_template: "https://d2.premiumvideo.click/uploads/encode/{id}/master.m3u8"
                .into(),
        }
    }

    #[test]
    fn clean_title_strips_year_and_markers() {
        let extractor = SiteMetadataExtractor::new(&site_section()).unwrap();
        assert_eq!(
            extractor.clean_title("Movie Name (2019) 1080p"),
            "Movie Name"
        );
        assert_eq!(
            extractor.clean_title("Bir Film Türkçe Dublaj izle"),
            "Bir Film"
        );
        assert_eq!(extractor.clean_title("  Plain Title  "), "Plain Title");
    }

    #[test]
    fn extract_reads_title_original_and_poster() {
        let extractor = SiteMetadataExtractor::new(&site_section()).unwrap();
        let html = r#"
            <html><body>
                <h1 class="text-bold">Kara Film (2021) Full HD</h1>
                <div class="muted-small">The Dark Movie</div>
                <div class="media-cover"><img src="/posters/kara.jpg"></div>
            </body></html>
        "#;
        let metadata = extractor
            .extract(html, "https://example.org/film/kara-film")
            .unwrap();
        assert_eq!(metadata.native_title, "Kara Film");
        assert_eq!(metadata.original_title.as_deref(), Some("The Dark Movie"));
        assert_eq!(
            metadata.poster_url.as_deref(),
            Some("https://example.org/posters/kara.jpg")
        );
    }

    #[test]
    fn extract_without_title_is_none() {
        let extractor = SiteMetadataExtractor::new(&site_section()).unwrap();
        let html = "<html><body><p>nothing here</p></body></html>";
        assert!(extractor.extract(html, "https://example.org/film/x").is_none());
    }

    #[test]
    fn absolutize_handles_relative_and_absolute() {
        assert_eq!(
            absolutize_url("https://example.org/films", "/film/abc").as_deref(),
            Some("https://example.org/film/abc")
        );
        assert_eq!(
            absolutize_url("https://example.org/films", "https://cdn.example.org/p.jpg")
                .as_deref(),
            Some("https://cdn.example.org/p.jpg")
        );
        assert!(absolutize_url("https://example.org", "").is_none());
    }
}
