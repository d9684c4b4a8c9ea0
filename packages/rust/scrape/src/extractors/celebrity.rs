//! Nameberry celebrity baby name pages.

use scraper::Html;
use soulseed_shared::Result;
use url::Url;

use super::{Extracted, PayloadExtractor, last_segment, next_data, record_count};

const PATH_PREFIX: &str = "/celebrity-baby-names";

/// Pulls the `babies` list out of a celebrity-baby-names letter page.
pub struct CelebrityBabiesExtractor;

impl PayloadExtractor for CelebrityBabiesExtractor {
    fn detect(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or("");
        (host == "nameberry.com" || host.ends_with(".nameberry.com"))
            && url.path().starts_with(PATH_PREFIX)
    }

    fn extract(&self, url: &Url, doc: &Html) -> Result<Option<Extracted>> {
        let Some(letter) = last_segment(url) else {
            return Ok(None);
        };
        let Some(data) = next_data(doc)? else {
            return Ok(None);
        };

        let babies = &data["props"]["pageProps"]["babies"];
        if !babies.is_array() {
            return Ok(None);
        }

        Ok(Some(Extracted {
            file_stem: format!("nameberry-{letter}"),
            records: record_count(babies),
            data: babies.clone(),
        }))
    }

    fn name(&self) -> &str {
        "celebrity-babies"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_only_celebrity_pages() {
        let ex = CelebrityBabiesExtractor;
        assert!(ex.detect(&Url::parse("https://nameberry.com/celebrity-baby-names/c").unwrap()));
        assert!(ex.detect(&Url::parse("https://www.nameberry.com/celebrity-baby-names/c").unwrap()));
        assert!(!ex.detect(&Url::parse("https://nameberry.com/babyname/luna").unwrap()));
        assert!(!ex.detect(&Url::parse("https://evilnameberry.com/celebrity-baby-names/c").unwrap()));
    }
}
