use regex::Regex;
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::debug;

use crate::config::SiteSection;
use crate::discover::parse_selector;
use crate::error::Result;
use crate::site::absolutize_url;

#[derive(Debug, Clone, Serialize)]
pub struct StreamInfo {
    pub stream_url: String,
}

/// Finds the embedded player frame for the trusted video host and turns its
/// opaque file id into a stream URL. The id appears in one of three URL
/// shapes (`/player/<id>`, `/e/<id>`, `file_id=<id>`); the first match wins.
pub struct StreamLinkResolver {
    iframe: Selector,
    id_pattern: Regex,
    template: String,
}

impl StreamLinkResolver {
    pub fn new(site: &SiteSection) -> Result<Self> {
        let iframe = parse_selector(&format!("iframe[src*=\"{}\"]", site.stream_host))?;
        Ok(Self {
            iframe,
            id_pattern: Regex::new(r"(?:/player/|/e/|file_id=)([a-zA-Z0-9]+)")
                .expect("valid regex"),
            template: site.stream_url_template.clone(),
        })
    }

    pub fn resolve(&self, html: &str, page_url: &str) -> Option<StreamInfo> {
        let src = {
            let document = Html::parse_document(html);
            let frame = document.select(&self.iframe).next()?;
            frame.value().attr("src")?.to_string()
        };
        let src = absolutize_url(page_url, &src)?;

        let file_id = match self.id_pattern.captures(&src) {
            Some(captures) => captures.get(1)?.as_str().to_string(),
            None => {
                debug!(src = %src, "player frame present but no recognised id shape");
                return None;
            }
        };

        Some(StreamInfo {
            stream_url: self.template.replace("{id}", &file_id),
        })
    }
}
