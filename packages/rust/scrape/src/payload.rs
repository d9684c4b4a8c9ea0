//! Webhook body shapes posted by the scraping service.
//!
//! The service sends one of three shapes and the branch is chosen by which
//! keys are present: `urls` (several pages), `url` (one page), or neither
//! (raw content as `markdown`, `text` or `html`).

use serde::Deserialize;
use soulseed_shared::{Result, SoulseedError};

/// One scraped page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScrapedPage {
    pub url: String,
    /// Raw HTML of the page.
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub markdown: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl ScrapedPage {
    /// The page HTML, whichever key it arrived under.
    pub fn html(&self) -> Option<&str> {
        self.content.as_deref().or(self.html.as_deref())
    }
}

/// Content sent without a source URL. Markdown wins over text, text over HTML.
#[derive(Debug, Clone, PartialEq)]
pub enum RawContent {
    Markdown(String),
    Text(String),
    Html(String),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScrapePayload {
    Pages(Vec<ScrapedPage>),
    Page(ScrapedPage),
    Raw(RawContent),
}

impl ScrapePayload {
    /// Classify a webhook body. The body must be a JSON object.
    pub fn from_json(body: &serde_json::Value) -> Result<Self> {
        let obj = body
            .as_object()
            .ok_or_else(|| SoulseedError::validation("webhook body must be a JSON object"))?;

        if let Some(urls) = obj.get("urls").filter(|v| v.is_array()) {
            let pages: Vec<ScrapedPage> = serde_json::from_value(urls.clone())?;
            return Ok(Self::Pages(pages));
        }

        if obj.get("url").is_some_and(|v| v.is_string()) {
            let page: ScrapedPage = serde_json::from_value(body.clone())?;
            return Ok(Self::Page(page));
        }

        let field = |key: &str| obj.get(key).and_then(|v| v.as_str()).map(str::to_string);
        let raw = if let Some(md) = field("markdown") {
            RawContent::Markdown(md)
        } else if let Some(text) = field("text") {
            RawContent::Text(text)
        } else if let Some(html) = field("html") {
            RawContent::Html(html)
        } else {
            RawContent::Empty
        };
        Ok(Self::Raw(raw))
    }
}
