//! Application configuration for SoulSeed.
//!
//! User config lives at `~/.soulseed/soulseed.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets are never stored in the file: each secret is named by the
//! environment variable that holds it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SoulseedError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "soulseed.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".soulseed";

// ---------------------------------------------------------------------------
// Config structs (matching soulseed.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model provider settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Env var names for shared secrets.
    #[serde(default)]
    pub secrets: SecretsConfig,

    /// Blog rewrite batch settings.
    #[serde(default)]
    pub rewriter: RewriterConfig,

    /// Weekly rewrite trigger.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Scrape targets and cache.
    #[serde(default)]
    pub scrape: ScrapeConfig,

    /// Chunked name database source.
    #[serde(default)]
    pub names: NamesConfig,

    /// Database location.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for enrichment generation and verification.
    #[serde(default = "default_enrich_model")]
    pub enrich_model: String,

    /// Model used for blog rewrites.
    #[serde(default = "default_rewrite_model")]
    pub rewrite_model: String,

    #[serde(default = "default_enrich_temperature")]
    pub enrich_temperature: f32,

    #[serde(default = "default_verify_temperature")]
    pub verify_temperature: f32,

    #[serde(default = "default_rewrite_temperature")]
    pub rewrite_temperature: f32,

    /// Completion token cap for blog rewrites.
    #[serde(default = "default_rewrite_max_tokens")]
    pub rewrite_max_tokens: u32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            enrich_model: default_enrich_model(),
            rewrite_model: default_rewrite_model(),
            enrich_temperature: default_enrich_temperature(),
            verify_temperature: default_verify_temperature(),
            rewrite_temperature: default_rewrite_temperature(),
            rewrite_max_tokens: default_rewrite_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_enrich_model() -> String {
    "gpt-4o-mini".into()
}
fn default_rewrite_model() -> String {
    "gpt-4o".into()
}
fn default_enrich_temperature() -> f32 {
    0.7
}
fn default_verify_temperature() -> f32 {
    0.3
}
fn default_rewrite_temperature() -> f32 {
    0.8
}
fn default_rewrite_max_tokens() -> u32 {
    5000
}
fn default_timeout_secs() -> u64 {
    120
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Maximum accepted request body size.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8787".into()
}
fn default_body_limit() -> usize {
    4 * 1024 * 1024
}

/// `[secrets]` section. Holds env var names only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsConfig {
    /// Env var holding the HMAC key for scrape output webhooks.
    #[serde(default = "default_webhook_secret_env")]
    pub webhook_secret_env: String,

    /// Env var holding the API key for the scrape input endpoint.
    #[serde(default = "default_scraper_api_key_env")]
    pub scraper_api_key_env: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            webhook_secret_env: default_webhook_secret_env(),
            scraper_api_key_env: default_scraper_api_key_env(),
        }
    }
}

fn default_webhook_secret_env() -> String {
    "WEBHOOK_SECRET".into()
}
fn default_scraper_api_key_env() -> String {
    "SCRAPER_API_KEY".into()
}

/// `[rewriter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriterConfig {
    /// Only posts with this status are rewritten.
    #[serde(default = "default_collection_status")]
    pub collection_status: String,

    /// Minimum unique names a rewrite must contain to be accepted.
    #[serde(default = "default_min_names")]
    pub min_names: usize,

    /// Attempt budget per post.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause before retrying a failed attempt.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Pause between consecutive posts.
    #[serde(default = "default_item_delay_ms")]
    pub item_delay_ms: u64,

    /// Reading speed used for `readingTime`.
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: usize,
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self {
            collection_status: default_collection_status(),
            min_names: default_min_names(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            item_delay_ms: default_item_delay_ms(),
            words_per_minute: default_words_per_minute(),
        }
    }
}

fn default_collection_status() -> String {
    "published".into()
}
fn default_min_names() -> usize {
    50
}
fn default_max_attempts() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    5000
}
fn default_item_delay_ms() -> u64 {
    3000
}
fn default_words_per_minute() -> usize {
    200
}

/// `[schedule]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Three-letter weekday (`mon` .. `sun`).
    #[serde(default = "default_weekday")]
    pub weekday: String,

    /// Hour of day, UTC.
    #[serde(default = "default_hour_utc")]
    pub hour_utc: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            weekday: default_weekday(),
            hour_utc: default_hour_utc(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_weekday() -> String {
    "sun".into()
}
fn default_hour_utc() -> u32 {
    7
}

/// `[scrape]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// URL templates handed to the scraper. `{letter}` expands to `a`..`z`.
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,

    /// Directory extracted payloads are written to.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            targets: default_targets(),
            cache_dir: default_cache_dir(),
        }
    }
}

fn default_targets() -> Vec<String> {
    vec!["https://nameberry.com/celebrity-baby-names/{letter}".into()]
}
fn default_cache_dir() -> String {
    "./var/scrape-cache".into()
}

/// `[names]` section. `base_url` wins over `data_dir` when both are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamesConfig {
    #[serde(default = "default_names_dir")]
    pub data_dir: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for NamesConfig {
    fn default() -> Self {
        Self {
            data_dir: default_names_dir(),
            base_url: None,
        }
    }
}

fn default_names_dir() -> String {
    "./public/data".into()
}

/// `[storage]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "./var/soulseed.db".into()
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config file + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime settings for the enrichment pipeline.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub model: String,
    pub generate_temperature: f32,
    pub verify_temperature: f32,
}

impl From<&AppConfig> for EnrichConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            model: config.llm.enrich_model.clone(),
            generate_temperature: config.llm.enrich_temperature,
            verify_temperature: config.llm.verify_temperature,
        }
    }
}

/// Runtime settings for the blog rewrite orchestrator.
#[derive(Debug, Clone)]
pub struct RewriteConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub collection_status: String,
    pub min_names: usize,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub item_delay_ms: u64,
    pub words_per_minute: usize,
}

impl From<&AppConfig> for RewriteConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            model: config.llm.rewrite_model.clone(),
            temperature: config.llm.rewrite_temperature,
            max_tokens: config.llm.rewrite_max_tokens,
            collection_status: config.rewriter.collection_status.clone(),
            min_names: config.rewriter.min_names,
            max_attempts: config.rewriter.max_attempts,
            retry_delay_ms: config.rewriter.retry_delay_ms,
            item_delay_ms: config.rewriter.item_delay_ms,
            words_per_minute: config.rewriter.words_per_minute,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.soulseed/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| SoulseedError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.soulseed/soulseed.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SoulseedError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| SoulseedError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    init_config_at(&config_file_path()?)
}

/// Write a default config file at `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<PathBuf> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| SoulseedError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SoulseedError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| SoulseedError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path.to_path_buf())
}

/// Read a secret from the named env var. Empty values count as unset.
pub fn read_secret(var_name: &str) -> Option<String> {
    std::env::var(var_name).ok().filter(|v| !v.is_empty())
}

/// Check that the model provider API key env var is set and non-empty.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.llm.api_key_env;
    read_secret(var_name).ok_or_else(|| {
        SoulseedError::config(format!(
            "LLM API key not found. Set the {var_name} environment variable."
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("enrich_model"));
        assert!(toml_str.contains("OPENAI_API_KEY"));
        assert!(toml_str.contains("WEBHOOK_SECRET"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.rewriter.min_names, 50);
        assert_eq!(parsed.llm.api_key_env, "OPENAI_API_KEY");
        assert_eq!(parsed.schedule.weekday, "sun");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[rewriter]
max_attempts = 5

[scrape]
targets = ["https://example.com/names/{letter}"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.rewriter.max_attempts, 5);
        assert_eq!(config.rewriter.retry_delay_ms, 5000);
        assert_eq!(config.scrape.targets.len(), 1);
        assert_eq!(config.llm.rewrite_model, "gpt-4o");
    }

    #[test]
    fn rewrite_config_from_app_config() {
        let app = AppConfig::default();
        let rewrite = RewriteConfig::from(&app);
        assert_eq!(rewrite.model, "gpt-4o");
        assert_eq!(rewrite.max_tokens, 5000);
        assert_eq!(rewrite.max_attempts, 3);
        assert_eq!(rewrite.item_delay_ms, 3000);
        assert!((rewrite.temperature - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn enrich_config_from_app_config() {
        let enrich = EnrichConfig::from(&AppConfig::default());
        assert_eq!(enrich.model, "gpt-4o-mini");
        assert!((enrich.verify_temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn init_config_at_writes_defaults() {
        let path = std::env::temp_dir()
            .join(format!("ss_cfg_{}", uuid::Uuid::now_v7()))
            .join("soulseed.toml");
        init_config_at(&path).expect("init");
        let loaded = load_config_from(&path).expect("load");
        assert_eq!(loaded.server.bind, "127.0.0.1:8787");
    }

    #[test]
    fn api_key_validation() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.llm.api_key_env = "SS_TEST_NONEXISTENT_KEY_12345".into();
        let result = validate_api_key(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }
}
