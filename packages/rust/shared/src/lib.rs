//! Shared types, error model, and configuration for SoulSeed.
//!
//! This crate is the foundation depended on by all other SoulSeed crates.
//! It provides:
//! - [`SoulseedError`], the unified error type
//! - Domain types ([`NameRecord`], [`EnrichmentResult`], [`BlogPost`], [`BlogStats`])
//! - Configuration ([`AppConfig`], [`RewriteConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, EnrichConfig, LlmConfig, NamesConfig, RewriteConfig, RewriterConfig,
    ScheduleConfig, ScrapeConfig, SecretsConfig, ServerConfig, StorageConfig, config_dir,
    config_file_path, init_config, init_config_at, load_config, load_config_from, read_secret,
    validate_api_key,
};
pub use error::{Result, SoulseedError};
pub use types::{
    BlogPost, BlogStats, CharacterQuote, ENRICHMENT_VERSION, EnrichmentResponse,
    EnrichmentResult, FamousPerson, FamousQuote, Gender, HistoricFigure, MovieOrShow, NameRecord,
    ReligiousSignificance, Song, VARIANT_LIST_LEN, VerificationResult, YearValue,
};
