//! Name markers in blog HTML.
//!
//! A qualifying entry is a `<strong>` element wrapping one or two capitalised
//! words, optionally prefixed by a list number (`<strong>12. Luna</strong>`).

use std::sync::LazyLock;

use regex::Regex;
use soulseed_shared::BlogStats;

static NAME_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<strong>(?:\d+\.\s+)?([A-Z][a-z]+(?:\s+[A-Z][a-z]+)?)</strong>")
        .expect("valid regex")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Count every name marker, duplicates included.
pub fn count_name_markers(html: &str) -> usize {
    NAME_MARKER_RE.find_iter(html).count()
}

/// Names in first-seen order, deduplicated case-sensitively.
pub fn extract_unique_names(html: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in NAME_MARKER_RE.captures_iter(html) {
        let name = caps[1].trim();
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Whitespace-separated words after tags are replaced by spaces.
pub fn word_count(html: &str) -> usize {
    TAG_RE.replace_all(html, " ").split_whitespace().count()
}

/// Minutes to read `words` at `words_per_minute`, rounded up.
pub fn reading_time(words: usize, words_per_minute: usize) -> usize {
    if words_per_minute == 0 {
        return 0;
    }
    words.div_ceil(words_per_minute)
}

/// Stats persisted with a rewritten post.
pub fn blog_stats(html: &str, words_per_minute: usize) -> BlogStats {
    let words = word_count(html);
    BlogStats {
        word_count: words,
        reading_time: reading_time(words, words_per_minute),
        names_count: extract_unique_names(html).len(),
    }
}
