//! Runs extractors over a webhook payload and writes results to the cache.

use std::path::PathBuf;

use scraper::Html;
use serde::Serialize;
use tracing::{info, instrument, warn};
use url::Url;

use soulseed_shared::{Result, SoulseedError};

use crate::cache::ScrapeCache;
use crate::extractors::{Extracted, ExtractorRegistry};
use crate::payload::{RawContent, ScrapePayload, ScrapedPage};

/// What one webhook delivery produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessReport {
    pub pages: usize,
    /// Pages for which an extractor found data.
    pub extracted: usize,
    pub files: Vec<PathBuf>,
}

/// Applies the extractor registry to payloads and persists what it finds.
pub struct ScrapeProcessor {
    registry: ExtractorRegistry,
    cache: ScrapeCache,
}

impl ScrapeProcessor {
    pub fn new(registry: ExtractorRegistry, cache: ScrapeCache) -> Self {
        Self { registry, cache }
    }

    pub fn cache(&self) -> &ScrapeCache {
        &self.cache
    }

    #[instrument(skip_all)]
    pub async fn process(&self, payload: &ScrapePayload) -> Result<ProcessReport> {
        let mut report = ProcessReport::default();
        match payload {
            ScrapePayload::Pages(pages) => {
                info!(pages = pages.len(), "processing scraped pages");
                for page in pages {
                    self.process_page(page, &mut report).await?;
                }
            }
            ScrapePayload::Page(page) => {
                info!(url = %page.url, "processing scraped page");
                self.process_page(page, &mut report).await?;
            }
            ScrapePayload::Raw(raw) => {
                if let Some(path) = self.process_raw(raw).await? {
                    report.files.push(path);
                }
            }
        }
        Ok(report)
    }

    async fn process_page(&self, page: &ScrapedPage, report: &mut ProcessReport) -> Result<()> {
        report.pages += 1;
        let url = Url::parse(&page.url)
            .map_err(|e| SoulseedError::validation(format!("invalid page url {}: {e}", page.url)))?;

        let Some(html) = page.html() else {
            warn!(url = %url, "page arrived without HTML, skipping");
            return Ok(());
        };

        // Html is !Send, so extraction finishes before the next await.
        let found = self.extract(&url, html)?;
        let Some((extractor, extracted)) = found else {
            info!(url = %url, "no extractor matched");
            return Ok(());
        };

        info!(
            url = %url,
            extractor = %extractor,
            records = extracted.records,
            "page data extracted"
        );
        let path = self
            .cache
            .write_json(&extracted.file_stem, &extracted.data)
            .await?;
        report.extracted += 1;
        report.files.push(path);
        Ok(())
    }

    fn extract(&self, url: &Url, html: &str) -> Result<Option<(String, Extracted)>> {
        let doc = Html::parse_document(html);
        Ok(self
            .registry
            .extract(url, &doc)?
            .map(|(name, extracted)| (name.to_string(), extracted)))
    }

    async fn process_raw(&self, raw: &RawContent) -> Result<Option<PathBuf>> {
        let stem = format!("raw-{}", uuid::Uuid::now_v7());
        let path = match raw {
            RawContent::Markdown(md) => {
                info!(format = "markdown", "raw content received");
                self.cache.write_text(&stem, "md", md).await?
            }
            RawContent::Text(text) => {
                info!(format = "text", "raw content received");
                self.cache.write_text(&stem, "txt", text).await?
            }
            RawContent::Html(html) => {
                info!(format = "html", "raw content received");
                let markdown = html_to_markdown(html)?;
                self.cache.write_text(&stem, "md", &markdown).await?
            }
            RawContent::Empty => {
                warn!("webhook carried no recognised content");
                return Ok(None);
            }
        };
        Ok(Some(path))
    }
}

/// Convert scraped HTML to Markdown, dropping non-content tags.
pub fn html_to_markdown(html: &str) -> Result<String> {
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "nav", "iframe", "noscript", "svg"])
        .build();

    converter
        .convert(html)
        .map_err(|e| SoulseedError::Conversion(format!("htmd conversion failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::next_data_page;

    fn processor() -> (ScrapeProcessor, PathBuf) {
        let dir = std::env::temp_dir().join(format!("ss_proc_{}", uuid::Uuid::now_v7()));
        (
            ScrapeProcessor::new(ExtractorRegistry::new(), ScrapeCache::new(&dir)),
            dir,
        )
    }

    fn celebrity_html(letter_babies: &str) -> String {
        next_data_page(&format!(r#"{{"props":{{"pageProps":{{"babies":{letter_babies}}}}}}}"#)).html()
    }

    #[tokio::test]
    async fn pages_write_celebrity_cache_files() {
        let (processor, dir) = processor();
        let payload = ScrapePayload::Pages(vec![
            ScrapedPage {
                url: "https://nameberry.com/celebrity-baby-names/a".into(),
                content: Some(celebrity_html(r#"[{"name":"Apple"}]"#)),
                ..Default::default()
            },
            ScrapedPage {
                url: "https://nameberry.com/celebrity-baby-names/b".into(),
                content: Some("<html><body>nothing here</body></html>".into()),
                ..Default::default()
            },
        ]);

        let report = processor.process(&payload).await.expect("process");
        assert_eq!(report.pages, 2);
        assert_eq!(report.extracted, 1);
        assert_eq!(report.files, vec![dir.join("nameberry-a.json")]);
    }

    #[tokio::test]
    async fn bad_url_is_rejected() {
        let (processor, _) = processor();
        let payload = ScrapePayload::Page(ScrapedPage {
            url: "not a url".into(),
            ..Default::default()
        });
        assert!(processor.process(&payload).await.is_err());
    }

    #[tokio::test]
    async fn raw_html_becomes_markdown() {
        let (processor, _) = processor();
        let payload = ScrapePayload::Raw(RawContent::Html(
            "<h1>Names</h1><script>track()</script><p>Luna</p>".into(),
        ));
        let report = processor.process(&payload).await.unwrap();
        assert_eq!(report.files.len(), 1);
        let written = std::fs::read_to_string(&report.files[0]).unwrap();
        assert!(written.contains("# Names"));
        assert!(written.contains("Luna"));
        assert!(!written.contains("track()"));
        assert!(report.files[0].extension().is_some_and(|e| e == "md"));
    }

    #[tokio::test]
    async fn empty_raw_writes_nothing() {
        let (processor, dir) = processor();
        let report = processor
            .process(&ScrapePayload::Raw(RawContent::Empty))
            .await
            .unwrap();
        assert!(report.files.is_empty());
        assert!(!dir.exists());
    }
}
