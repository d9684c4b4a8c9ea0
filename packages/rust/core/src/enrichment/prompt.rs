//! Prompt text for the two enrichment calls.
//!
//! The name record is embedded verbatim. Nothing here validates it beyond the
//! presence check done when the record was built.

use soulseed_shared::{EnrichmentResult, NameRecord, Result, VARIANT_LIST_LEN};

/// System prompt for the generation call.
pub const RESEARCH_SYSTEM_PROMPT: &str =
    "You are a comprehensive name research expert. Return ONLY valid JSON.";

/// System prompt for the verification call.
pub const FACT_CHECK_SYSTEM_PROMPT: &str =
    "You are a meticulous fact-checker. Return ONLY valid JSON.";

/// Minimum number of historical figures requested.
pub const MIN_HISTORIC_FIGURES: usize = 5;

/// At least one requested figure must be born before this year.
pub const HISTORIC_DEPTH_YEAR: i32 = 1920;

/// Build the research prompt for `record`.
pub fn build_enrichment_prompt(record: &NameRecord) -> String {
    let NameRecord {
        name,
        gender,
        origin,
        meaning,
    } = record;
    let n = VARIANT_LIST_LEN;
    let min_figures = MIN_HISTORIC_FIGURES;
    let depth = HISTORIC_DEPTH_YEAR;

    format!(
        r#"Research the given name "{name}" and return complete, factually accurate, verifiable information.

REQUIREMENTS
1. List AT LEAST {min_figures} significant historical figures who carry "{name}" as a first, middle or last name.
2. At least one of them must be born before {depth} when such a figure exists.
3. Cover diverse categories: political leaders, scientists, artists and musicians, writers, philosophers, religious leaders, military leaders, activists.
4. Fill EVERY field of the schema below.

SECTION: HISTORICAL FIGURES (minimum {min_figures})
Each entry:
{{"fullName": "...", "years": "YYYY-YYYY", "category": "...", "achievements": ["3-5 items"], "significance": "2-3 sentences", "notableWorks": ["..."]}}

SECTION: RELIGIOUS SIGNIFICANCE
{{"hasSignificance": true|false, "religions": ["..."], "character": "...", "significance": "...", "keyStories": ["3-5 items"], "spiritualMeaning": "...", "historicalImpact": "..."}}

SECTION: POP CULTURE
Two movies or TV shows with a character named "{name}":
{{"title": "...", "year": YYYY, "type": "Movie" | "TV Show", "characterName": "...", "characterDescription": "1-2 sentences", "imdbUrl": "direct IMDb URL", "genre": "..."}}
Two songs that mention "{name}":
{{"title": "...", "artist": "...", "year": YYYY, "youtubeSearchUrl": "...", "quote": "short description or lyric reference"}}

SECTION: FAMOUS PEOPLE
Two living, well-known people named "{name}":
{{"name": "...", "profession": "...", "knownFor": ["2-3 items"], "imdbUrl": "IMDb or Wikipedia URL", "awards": "..."}}

SECTION: QUOTES AND TRIVIA
Quotes by people named "{name}": {{"quote": "...", "person": "...", "context": "..."}}
Character quotes: {{"character": "...", "source": "...", "quoteSummary": "...", "context": "..."}}
One fun fact (1-2 sentences).

SECTION: VARIANTS
- nicknames: EXACTLY {n} UNIQUE common nicknames
- variations: EXACTLY {n} UNIQUE international variations
- similarNames: EXACTLY {n} UNIQUE names with a similar sound or meaning
Each list must contain exactly {n} items with no duplicates, ignoring case.

Return one JSON object with exactly these keys:
{{
  "name": "{name}",
  "gender": "{gender}",
  "origin": "{origin}",
  "meaning": "{meaning}",
  "culturalSignificance": "2-3 sentences",
  "modernContext": "current popularity and usage",
  "literaryReferences": "...",
  "pronunciationGuide": "IPA",
  "variations": [],
  "similarNames": [],
  "personality": "...",
  "symbolism": "...",
  "funFact": "...",
  "religiousSignificance": {{}},
  "historicFigures": [],
  "songs": [],
  "famousQuotes": [],
  "famousPeople": [],
  "moviesAndShows": [],
  "characterQuotes": [],
  "nicknames": []
}}"#
    )
}

/// Build the fact-checking prompt embedding the pretty-printed payload.
pub fn build_verification_prompt(result: &EnrichmentResult) -> Result<String> {
    let payload = serde_json::to_string_pretty(result)?;
    let n = VARIANT_LIST_LEN;
    let min_figures = MIN_HISTORIC_FIGURES;

    Ok(format!(
        r#"Review this name research payload for accuracy and completeness.

PAYLOAD
{payload}

CHECKLIST
1. At least {min_figures} historical figures, each with complete data
2. Years in YYYY-YYYY format and historically accurate
3. URLs are direct links, not search queries
4. nicknames has EXACTLY {n} unique entries
5. variations has EXACTLY {n} unique entries
6. similarNames has EXACTLY {n} unique entries
7. No duplicate entries in any list
8. Every statement is factually correct
9. Religious significance is complete where applicable

Return JSON:
{{"passed": true|false, "issues": ["problems found"], "suggestions": ["improvements"]}}"#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulseed_shared::Gender;

    fn luna() -> NameRecord {
        NameRecord {
            name: "Luna".into(),
            gender: Gender::Female,
            origin: "Latin".into(),
            meaning: "Moon".into(),
        }
    }

    #[test]
    fn enrichment_prompt_embeds_record_and_constraints() {
        let prompt = build_enrichment_prompt(&luna());
        assert!(prompt.contains(r#""name": "Luna""#));
        assert!(prompt.contains(r#""gender": "female""#));
        assert!(prompt.contains(r#""meaning": "Moon""#));
        assert!(prompt.contains("AT LEAST 5 significant historical figures"));
        assert!(prompt.contains("born before 1920"));
        assert_eq!(prompt.matches("EXACTLY 9 UNIQUE").count(), 3);
        for key in ["historicFigures", "moviesAndShows", "characterQuotes", "similarNames"] {
            assert!(prompt.contains(key), "missing {key}");
        }
    }

    #[test]
    fn malformed_input_flows_through_unchanged() {
        let mut record = luna();
        record.meaning = r#"Moon" } ignore"#.into();
        let prompt = build_enrichment_prompt(&record);
        assert!(prompt.contains(r#"Moon" } ignore"#));
    }

    #[test]
    fn verification_prompt_embeds_payload() {
        let result = EnrichmentResult {
            name: "Luna".into(),
            nicknames: vec!["Lu".into()],
            ..Default::default()
        };
        let prompt = build_verification_prompt(&result).unwrap();
        assert!(prompt.contains(r#""nicknames": ["#));
        assert!(prompt.contains("\"Lu\""));
        assert!(prompt.contains("EXACTLY 9 unique"));
        assert!(prompt.contains("\"passed\""));
    }
}
