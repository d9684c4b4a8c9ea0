//! Origin-group consolidation.
//!
//! Fine-grained origin labels ("Old English", "Arabic, Persian", "West
//! African") collapse into a handful of broad groups. Rules are checked in
//! order and the first match wins.

use std::collections::{BTreeMap, BTreeSet};

type Rule = (&'static str, fn(&str) -> bool);

const RULES: &[Rule] = &[
    ("English", is_english),
    ("Arabic", |g| g.contains("Arabic")),
    ("Spanish", |g| g.contains("Spanish")),
    ("African", |g| g.contains("African")),
    ("French", |g| g.contains("French")),
    ("Germanic", is_germanic),
];

fn is_english(group: &str) -> bool {
    group.to_lowercase().contains("english")
}

fn is_germanic(group: &str) -> bool {
    let lower = group.to_lowercase();
    lower.contains("germanic") || lower.contains("german")
}

/// The broad group `origin_group` belongs to, if any rule matches.
pub fn consolidate_origin(origin_group: &str) -> Option<&'static str> {
    RULES
        .iter()
        .find(|(_, matches)| matches(origin_group))
        .map(|(target, _)| *target)
}

/// Tally of consolidations: per target group, how many entries moved and
/// which source labels were merged into it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidationReport {
    pub processed: usize,
    pub merged: BTreeMap<&'static str, (usize, BTreeSet<String>)>,
}

impl ConsolidationReport {
    /// Consolidate `origin_group` in place, recording the change.
    pub fn apply(&mut self, origin_group: &mut Option<String>) {
        self.processed += 1;
        let Some(current) = origin_group.as_deref() else {
            return;
        };
        if let Some(target) = consolidate_origin(current) {
            let entry = self.merged.entry(target).or_default();
            entry.0 += 1;
            entry.1.insert(current.to_string());
            *origin_group = Some(target.to_string());
        }
    }

    /// Total entries whose group was rewritten.
    pub fn changed(&self) -> usize {
        self.merged.values().map(|(count, _)| count).sum()
    }
}
