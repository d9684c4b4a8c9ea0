//! Scrape plumbing for the external scraping service.
//!
//! This crate provides:
//! - [`targets`]: the URL list handed out by the scrape input endpoint
//! - [`payload`]: parsing of the webhook bodies the scraper posts back
//! - [`extractors`]: page extractors tried in priority order
//! - [`processor`]: runs extractors over a payload and writes the cache

pub mod cache;
pub mod extractors;
pub mod payload;
pub mod processor;
pub mod targets;

pub use cache::ScrapeCache;
pub use extractors::{
    CelebrityBabiesExtractor, Extracted, ExtractorRegistry, NextDataExtractor, PayloadExtractor,
};
pub use payload::{RawContent, ScrapePayload, ScrapedPage};
pub use processor::{ProcessReport, ScrapeProcessor};
pub use targets::expand_targets;
