use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::info;
use unicode_normalization::UnicodeNormalization;

use crate::config::OutputSection;
use crate::pipeline::AggregatedRecord;

pub const UNKNOWN_ID: &str = "UNKNOWN";

/// Serializes aggregated records into the extended playlist format: an
/// `#EXTM3U` header, then three lines per entry.
pub struct PlaylistWriter {
    proxy_base: String,
    default_group: String,
}

impl PlaylistWriter {
    pub fn new(output: &OutputSection) -> Self {
        Self {
            proxy_base: output.proxy_base.clone(),
            default_group: output.default_group.clone(),
        }
    }

    pub fn write_file(&self, path: &Path, records: &[AggregatedRecord]) -> io::Result<usize> {
        let mut out = BufWriter::new(File::create(path)?);
        let written = self.write_to(&mut out, records)?;
        out.flush()?;
        info!(entries = written, path = %path.display(), "playlist written");
        Ok(written)
    }

    pub fn write_to<W: Write>(&self, out: &mut W, records: &[AggregatedRecord]) -> io::Result<usize> {
        writeln!(out, "#EXTM3U")?;
        let mut written = 0usize;
        for record in records {
            let group = record
                .genres
                .first()
                .map(|genre| genre.trim())
                .filter(|genre| !genre.is_empty())
                .unwrap_or(&self.default_group);
            writeln!(
                out,
                "#EXTINF:-1 tvg-id=\"{id}\" tvg-name=\"{title} ({year})\" tvg-logo=\"{logo}\" group-title=\"{group}\",{title}",
                id = sanitize_id(&record.title),
                title = record.title,
                year = record.year,
                logo = record.poster_url,
            )?;
            writeln!(
                out,
                "#EXTVLCOPT:description={overview} | Director: {director} | Cast: {cast}",
                overview = record.overview,
                director = record.director,
                cast = record.cast.join(", "),
            )?;
            writeln!(out, "{}", wrap_proxy_url(&self.proxy_base, record.stream_url.trim()))?;
            written += 1;
        }
        Ok(written)
    }
}

/// Prefixes the stream URL with the proxy template. Idempotent: a URL that
/// already carries the prefix passes through unchanged.
pub fn wrap_proxy_url(proxy_base: &str, url: &str) -> String {
    if proxy_base.is_empty() || url.contains(proxy_base) {
        return url.to_string();
    }
    format!("{proxy_base}{url}")
}

/// Derives the stable display key from a title: uppercase ASCII letters,
/// digits and underscores only. Turkish characters are folded explicitly
/// first because dotless `ı` does not decompose under NFD; everything else
/// accented goes through NFD with non-ASCII marks dropped.
pub fn sanitize_id(text: &str) -> String {
    let folded: String = text.chars().map(fold_turkish).collect();
    let ascii: String = folded.nfd().filter(char::is_ascii).collect();
    let cleaned: String = ascii
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    let token = cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase();
    if token.is_empty() {
        UNKNOWN_ID.to_string()
    } else {
        token
    }
}

fn fold_turkish(c: char) -> char {
    match c {
        'ç' => 'c',
        'Ç' => 'C',
        'ğ' => 'g',
        'Ğ' => 'G',
        'ı' => 'i',
        'İ' => 'I',
        'ö' => 'o',
        'Ö' => 'O',
        'ş' => 's',
        'Ş' => 'S',
        'ü' => 'u',
        'Ü' => 'U',
        other => other,
    }
}
