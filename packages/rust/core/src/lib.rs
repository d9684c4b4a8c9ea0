//! Core domain workflows for SoulSeed.
//!
//! This crate ties the chat model, the name utilities and storage into the
//! two LLM pipelines:
//! - [`enrichment`]: generate a name research payload, then fact-check it
//! - [`rewriter`]: the batch blog rewriter with per-post retries
//! - [`schedule`]: the weekly rewrite trigger

pub mod enrichment;
pub mod rewriter;
pub mod schedule;

pub use enrichment::{Enricher, check_historic_figures, check_variant_lists, structural_issues};
pub use rewriter::{
    BlogRewriter, ContentCheck, ContentValidator, ItemFailure, ItemOutcome, ItemState,
    ItemSuccess, MinimumNamesValidator, RewriteProgress, RewriteSummary, SilentRewriteProgress,
};
pub use schedule::{next_run_after, parse_weekday, run_scheduled_once, run_weekly, should_rewrite};
