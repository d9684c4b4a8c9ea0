use std::path::Path;
use std::sync::Arc;

use soulseed_core::{BlogRewriter, Enricher};
use soulseed_llm::{ChatModel, OpenAiClient};
use soulseed_scrape::{ExtractorRegistry, ScrapeCache, ScrapeProcessor, expand_targets};
use soulseed_shared::{AppConfig, EnrichConfig, Result, RewriteConfig, read_secret};
use soulseed_storage::Storage;

/// Shared secrets, read from the environment once at startup.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    /// HMAC key for scrape output webhooks.
    pub webhook_secret: Option<String>,
    /// Key required by the scrape input endpoint.
    pub scraper_api_key: Option<String>,
}

impl Secrets {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            webhook_secret: read_secret(&config.secrets.webhook_secret_env),
            scraper_api_key: read_secret(&config.secrets.scraper_api_key_env),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub enricher: Arc<Enricher>,
    pub rewriter: Arc<BlogRewriter>,
    pub processor: Arc<ScrapeProcessor>,
    pub secrets: Arc<Secrets>,
    /// Expanded scrape target URLs.
    pub targets: Arc<Vec<String>>,
}

impl AppState {
    /// Assemble state from an already-built model and storage handle.
    pub fn new(
        config: &AppConfig,
        model: Arc<dyn ChatModel>,
        storage: Arc<Storage>,
        secrets: Secrets,
    ) -> Self {
        let enricher = Enricher::new(model.clone(), EnrichConfig::from(config));
        let rewriter =
            BlogRewriter::with_default_validator(model, storage, RewriteConfig::from(config));
        let processor = ScrapeProcessor::new(
            ExtractorRegistry::new(),
            ScrapeCache::new(&config.scrape.cache_dir),
        );

        Self {
            enricher: Arc::new(enricher),
            rewriter: Arc::new(rewriter),
            processor: Arc::new(processor),
            secrets: Arc::new(secrets),
            targets: Arc::new(expand_targets(&config.scrape.targets)),
        }
    }

    /// Production state: OpenAI client, on-disk storage, secrets from env.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let model: Arc<dyn ChatModel> = Arc::new(OpenAiClient::from_config(config)?);
        let storage = Arc::new(Storage::open(Path::new(&config.storage.db_path)).await?);
        Ok(Self::new(config, model, storage, Secrets::from_config(config)))
    }
}
