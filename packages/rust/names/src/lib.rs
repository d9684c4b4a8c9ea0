//! Baby-name knowledge used across the service.
//!
//! This crate provides:
//! - [`markers`]: `<strong>Name</strong>` detection and post statistics
//! - [`database`]: the chunked name database cache
//! - [`origins`]: origin-group consolidation rules
//! - [`audit`]: blog post vs. database cross-checks

pub mod audit;
pub mod database;
pub mod markers;
pub mod origins;

pub use audit::{AuditReport, audit_post};
pub use database::{ChunkInfo, ChunkSource, DatabaseIndex, DatabaseStatus, NameDatabase, NameEntry};
pub use markers::{
    blog_stats, count_name_markers, extract_unique_names, reading_time, word_count,
};
pub use origins::{ConsolidationReport, consolidate_origin};
