//! Page extractors for scraped HTML.
//!
//! Extractors are tried in priority order; the first whose [`PayloadExtractor::detect`]
//! accepts the URL and whose `extract` finds data wins. Site-specific
//! extractors come first, the generic Next.js one last.

mod celebrity;
mod next_data;

use scraper::{Html, Selector};
use soulseed_shared::{Result, SoulseedError};
use url::Url;

pub use celebrity::CelebrityBabiesExtractor;
pub use next_data::NextDataExtractor;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Data pulled out of one page, ready to cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    /// Cache file stem, e.g. `nameberry-a`.
    pub file_stem: String,
    pub data: serde_json::Value,
    /// Number of records (array length, or 1 for an object).
    pub records: usize,
}

/// Trait for site-specific extraction from a scraped page.
pub trait PayloadExtractor: Send + Sync {
    /// Whether this extractor should look at pages from `url`.
    fn detect(&self, url: &Url) -> bool;

    /// Extract data. `Ok(None)` means the page had nothing for this extractor.
    fn extract(&self, url: &Url, doc: &Html) -> Result<Option<Extracted>>;

    /// Human-readable extractor name for tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds registered extractors in priority order.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn PayloadExtractor>>,
}

impl ExtractorRegistry {
    /// All built-in extractors, site-specific first.
    pub fn new() -> Self {
        Self {
            extractors: vec![Box::new(CelebrityBabiesExtractor), Box::new(NextDataExtractor)],
        }
    }

    /// Run extractors in order until one yields data.
    pub fn extract(&self, url: &Url, doc: &Html) -> Result<Option<(&str, Extracted)>> {
        for extractor in &self.extractors {
            if !extractor.detect(url) {
                continue;
            }
            if let Some(found) = extractor.extract(url, doc)? {
                return Ok(Some((extractor.name(), found)));
            }
        }
        Ok(None)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse the JSON embedded in `<script id="__NEXT_DATA__">`, if present.
pub(crate) fn next_data(doc: &Html) -> Result<Option<serde_json::Value>> {
    let sel = Selector::parse(r#"script#__NEXT_DATA__"#)
        .map_err(|e| SoulseedError::parse(format!("selector: {e}")))?;
    let Some(script) = doc.select(&sel).next() else {
        return Ok(None);
    };
    let raw: String = script.text().collect();
    let value = serde_json::from_str(raw.trim())
        .map_err(|e| SoulseedError::parse(format!("__NEXT_DATA__ is not valid JSON: {e}")))?;
    Ok(Some(value))
}

/// Last non-empty path segment of `url`.
pub(crate) fn last_segment(url: &Url) -> Option<&str> {
    url.path_segments()?.rfind(|s| !s.is_empty())
}

pub(crate) fn record_count(value: &serde_json::Value) -> usize {
    value.as_array().map_or(1, Vec::len)
}

#[cfg(test)]
pub(crate) fn next_data_page(json: &str) -> Html {
    Html::parse_document(&format!(
        r#"<html><head><title>t</title></head><body><div id="__next"></div>
        <script id="__NEXT_DATA__" type="application/json">{json}</script></body></html>"#
    ))
}
