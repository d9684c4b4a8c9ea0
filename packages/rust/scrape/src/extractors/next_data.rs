//! Generic Next.js page data.

use scraper::Html;
use soulseed_shared::Result;
use url::Url;

use super::{Extracted, PayloadExtractor, last_segment, next_data, record_count};

/// Saves `props.pageProps` from any page that embeds `__NEXT_DATA__`.
pub struct NextDataExtractor;

impl PayloadExtractor for NextDataExtractor {
    fn detect(&self, _url: &Url) -> bool {
        true
    }

    fn extract(&self, url: &Url, doc: &Html) -> Result<Option<Extracted>> {
        let Some(data) = next_data(doc)? else {
            return Ok(None);
        };
        let page_props = &data["props"]["pageProps"];
        if page_props.is_null() {
            return Ok(None);
        }

        let host = url
            .host_str()
            .and_then(|h| h.trim_start_matches("www.").split('.').next())
            .unwrap_or("page");
        let slug = last_segment(url).unwrap_or("index");

        Ok(Some(Extracted {
            file_stem: format!("{host}-{slug}"),
            records: record_count(page_props),
            data: page_props.clone(),
        }))
    }

    fn name(&self) -> &str {
        "next-data"
    }
}
