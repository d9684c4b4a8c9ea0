//! Scrape target expansion.

const LETTER_PLACEHOLDER: &str = "{letter}";

/// Expand URL templates into concrete targets. A template containing
/// `{letter}` yields one URL per letter `a`..=`z`; others pass through.
/// Duplicates are dropped, first occurrence wins.
pub fn expand_targets(templates: &[String]) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    let mut push = |url: String| {
        if !urls.contains(&url) {
            urls.push(url);
        }
    };

    for template in templates {
        let template = template.trim();
        if template.is_empty() {
            continue;
        }
        if template.contains(LETTER_PLACEHOLDER) {
            for letter in 'a'..='z' {
                push(template.replace(LETTER_PLACEHOLDER, &letter.to_string()));
            }
        } else {
            push(template.to_string());
        }
    }
    urls
}
