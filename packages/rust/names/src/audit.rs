//! Blog post audit: which names a post mentions, whether the database knows
//! them, and whether the title's headline number holds up.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use soulseed_shared::BlogPost;

use crate::database::NameDatabase;
use crate::markers::{count_name_markers, extract_unique_names};

static TITLE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,4})\b").expect("valid regex"));

/// Findings for a single post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub post_id: String,
    pub title: String,
    pub unique_names: Vec<String>,
    pub total_mentions: usize,
    pub in_database: Vec<String>,
    pub missing_from_database: Vec<String>,
    /// First number in the title, e.g. `100` in "100 Celestial Names".
    pub title_claim: Option<usize>,
    /// Whether the post carries at least as many unique names as it claims.
    pub claim_met: Option<bool>,
}

impl AuditReport {
    /// True when nothing needs fixing.
    pub fn is_clean(&self) -> bool {
        self.missing_from_database.is_empty() && self.claim_met != Some(false)
    }
}

/// Audit one post against the database.
pub fn audit_post(post: &BlogPost, db: &NameDatabase) -> AuditReport {
    let unique_names = extract_unique_names(&post.content);
    let (in_database, missing_from_database): (Vec<String>, Vec<String>) = unique_names
        .iter()
        .cloned()
        .partition(|name| db.contains(name));

    let title_claim = TITLE_NUMBER_RE
        .captures(&post.title)
        .and_then(|caps| caps[1].parse().ok());

    AuditReport {
        post_id: post.id.clone(),
        title: post.title.clone(),
        total_mentions: count_name_markers(&post.content),
        claim_met: title_claim.map(|claim| unique_names.len() >= claim),
        unique_names,
        in_database,
        missing_from_database,
        title_claim,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{ChunkSource, NameEntry};
    use chrono::Utc;
    use soulseed_shared::BlogStats;

    fn post(title: &str, content: &str) -> BlogPost {
        BlogPost {
            id: "p1".into(),
            slug: "p1".into(),
            title: title.into(),
            category: String::new(),
            status: "published".into(),
            content: content.into(),
            stats: BlogStats::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn db() -> NameDatabase {
        NameDatabase::new(
            vec![NameEntry::new("Luna"), NameEntry::new("Aurora")],
            ChunkSource::dir("."),
        )
    }

    #[test]
    fn splits_known_and_unknown_names() {
        let post = post(
            "3 Celestial Names",
            "<strong>Luna</strong> <strong>Stella</strong> <strong>Luna</strong> <strong>aurora</strong>",
        );
        let report = audit_post(&post, &db());
        assert_eq!(report.unique_names, vec!["Luna", "Stella"]);
        assert_eq!(report.total_mentions, 3);
        assert_eq!(report.in_database, vec!["Luna"]);
        assert_eq!(report.missing_from_database, vec!["Stella"]);
        assert_eq!(report.title_claim, Some(3));
        assert_eq!(report.claim_met, Some(false));
        assert!(!report.is_clean());
    }

    #[test]
    fn title_without_number_makes_no_claim() {
        let post = post("Celestial Names", "<strong>Luna</strong>");
        let report = audit_post(&post, &db());
        assert_eq!(report.title_claim, None);
        assert_eq!(report.claim_met, None);
        assert!(report.is_clean());
    }
}
