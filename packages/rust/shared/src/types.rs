//! Core domain types for SoulSeed: name records, enrichment payloads and
//! blog posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Result, SoulseedError};

/// Version tag reported with every enrichment response.
pub const ENRICHMENT_VERSION: &str = "v4";

/// Required length of each variant list (`nicknames`, `variations`, `similarNames`).
pub const VARIANT_LIST_LEN: usize = 9;

const MISSING_FIELDS_MESSAGE: &str = "Missing required fields: name, gender, origin, meaning";

// ---------------------------------------------------------------------------
// NameRecord
// ---------------------------------------------------------------------------

/// Gender of a name. Unknown labels are carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[serde(alias = "Male", alias = "boy")]
    Male,
    #[serde(alias = "Female", alias = "girl")]
    Female,
    #[serde(alias = "Unisex", alias = "neutral")]
    Unisex,
    #[serde(untagged)]
    Other(String),
}

impl Gender {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unisex => "unisex",
            Self::Other(s) => s,
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Gender {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "boy" => Self::Male,
            "female" | "girl" => Self::Female,
            "unisex" | "neutral" => Self::Unisex,
            _ => Self::Other(s.trim().to_string()),
        }
    }
}

/// The immutable input to the enrichment pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
    pub name: String,
    pub gender: Gender,
    pub origin: String,
    pub meaning: String,
}

impl NameRecord {
    /// Build a record from optional parts. Presence is the only check: every
    /// field must exist and be non-blank.
    pub fn from_parts(
        name: Option<&str>,
        gender: Option<&str>,
        origin: Option<&str>,
        meaning: Option<&str>,
    ) -> Result<Self> {
        fn present(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|s| !s.is_empty())
        }
        match (present(name), present(gender), present(origin), present(meaning)) {
            (Some(name), Some(gender), Some(origin), Some(meaning)) => Ok(Self {
                name: name.to_string(),
                gender: Gender::from(gender),
                origin: origin.to_string(),
                meaning: meaning.to_string(),
            }),
            _ => Err(SoulseedError::validation(MISSING_FIELDS_MESSAGE)),
        }
    }

    /// Parse a record out of a loosely-typed JSON object.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let field = |key: &str| value.get(key).and_then(serde_json::Value::as_str);
        Self::from_parts(field("name"), field("gender"), field("origin"), field("meaning"))
    }
}

// ---------------------------------------------------------------------------
// EnrichmentResult
// ---------------------------------------------------------------------------

/// Deserializers for model-written JSON. `null` and mistyped scalars fall back
/// to the field's default so one odd value never rejects the whole reply.
mod lenient {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn scalar_text(value: Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(scalar_text(Value::deserialize(d)?).unwrap_or_default())
    }

    /// A list of text. A lone scalar becomes a one-item list.
    pub fn strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
            other => scalar_text(other)
                .filter(|s| !s.trim().is_empty())
                .into_iter()
                .collect(),
        })
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => b,
            Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        })
    }

    /// A list of objects. Items that do not read as `T` are dropped.
    pub fn list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        })
    }

    pub fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        Ok(serde_json::from_value(Value::deserialize(d)?).unwrap_or_default())
    }
}

/// A year as returned by the model: either a bare number or free text
/// such as `"1820-1910"`. Anything else reads as empty text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum YearValue {
    Number(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for YearValue {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        Ok(match serde_json::Value::deserialize(d)? {
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Text(n.to_string()), Self::Number),
            serde_json::Value::String(s) => Self::Text(s),
            _ => Self::default(),
        })
    }
}

impl From<&str> for YearValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for YearValue {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl YearValue {
    /// The first year mentioned: the number itself, or the leading digits of
    /// the text.
    pub fn leading_year(&self) -> Option<i32> {
        match self {
            Self::Number(n) => i32::try_from(*n).ok(),
            Self::Text(s) => {
                let digits: String = s
                    .trim_start()
                    .chars()
                    .take_while(char::is_ascii_digit)
                    .collect();
                digits.parse().ok()
            }
        }
    }
}

impl Default for YearValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl std::fmt::Display for YearValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReligiousSignificance {
    #[serde(deserialize_with = "lenient::flag")]
    pub has_significance: bool,
    #[serde(deserialize_with = "lenient::strings")]
    pub religions: Vec<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub character: String,
    #[serde(deserialize_with = "lenient::string")]
    pub significance: String,
    #[serde(deserialize_with = "lenient::strings")]
    pub key_stories: Vec<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub spiritual_meaning: String,
    #[serde(deserialize_with = "lenient::string")]
    pub historical_impact: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoricFigure {
    #[serde(deserialize_with = "lenient::string")]
    pub full_name: String,
    pub years: YearValue,
    #[serde(deserialize_with = "lenient::string")]
    pub category: String,
    #[serde(deserialize_with = "lenient::strings")]
    pub achievements: Vec<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub significance: String,
    #[serde(deserialize_with = "lenient::strings")]
    pub notable_works: Vec<String>,
}

impl HistoricFigure {
    /// Birth year: the first year in `years`.
    pub fn birth_year(&self) -> Option<i32> {
        self.years.leading_year()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Song {
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(deserialize_with = "lenient::string")]
    pub artist: String,
    pub year: YearValue,
    #[serde(deserialize_with = "lenient::string")]
    pub youtube_search_url: String,
    #[serde(deserialize_with = "lenient::string")]
    pub quote: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FamousQuote {
    #[serde(deserialize_with = "lenient::string")]
    pub quote: String,
    #[serde(deserialize_with = "lenient::string")]
    pub person: String,
    #[serde(deserialize_with = "lenient::string")]
    pub context: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FamousPerson {
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub profession: String,
    #[serde(deserialize_with = "lenient::strings")]
    pub known_for: Vec<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub imdb_url: String,
    #[serde(deserialize_with = "lenient::string")]
    pub awards: String,
}

/// A film or TV appearance of a character carrying the name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MovieOrShow {
    #[serde(deserialize_with = "lenient::string")]
    pub title: String,
    pub year: YearValue,
    #[serde(rename = "type", deserialize_with = "lenient::string")]
    pub kind: String,
    #[serde(deserialize_with = "lenient::string")]
    pub character_name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub character_description: String,
    #[serde(deserialize_with = "lenient::string")]
    pub imdb_url: String,
    #[serde(deserialize_with = "lenient::string")]
    pub genre: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterQuote {
    #[serde(deserialize_with = "lenient::string")]
    pub character: String,
    #[serde(deserialize_with = "lenient::string")]
    pub source: String,
    #[serde(deserialize_with = "lenient::string")]
    pub quote_summary: String,
    #[serde(deserialize_with = "lenient::string")]
    pub context: String,
}

/// The structured research payload produced by the generation call.
///
/// Every field defaults, so a sparse model response still re-serialises with
/// every documented top-level field present and non-null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnrichmentResult {
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub gender: String,
    #[serde(deserialize_with = "lenient::string")]
    pub origin: String,
    #[serde(deserialize_with = "lenient::string")]
    pub meaning: String,
    #[serde(deserialize_with = "lenient::string")]
    pub cultural_significance: String,
    #[serde(deserialize_with = "lenient::string")]
    pub modern_context: String,
    #[serde(deserialize_with = "lenient::string")]
    pub literary_references: String,
    #[serde(deserialize_with = "lenient::string")]
    pub pronunciation_guide: String,
    #[serde(deserialize_with = "lenient::strings")]
    pub variations: Vec<String>,
    #[serde(deserialize_with = "lenient::strings")]
    pub similar_names: Vec<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub personality: String,
    #[serde(deserialize_with = "lenient::string")]
    pub symbolism: String,
    #[serde(deserialize_with = "lenient::string")]
    pub fun_fact: String,
    #[serde(deserialize_with = "lenient::or_default")]
    pub religious_significance: ReligiousSignificance,
    #[serde(deserialize_with = "lenient::list")]
    pub historic_figures: Vec<HistoricFigure>,
    #[serde(deserialize_with = "lenient::list")]
    pub songs: Vec<Song>,
    #[serde(deserialize_with = "lenient::list")]
    pub famous_quotes: Vec<FamousQuote>,
    #[serde(deserialize_with = "lenient::list")]
    pub famous_people: Vec<FamousPerson>,
    #[serde(deserialize_with = "lenient::list")]
    pub movies_and_shows: Vec<MovieOrShow>,
    #[serde(deserialize_with = "lenient::list")]
    pub character_quotes: Vec<CharacterQuote>,
    #[serde(deserialize_with = "lenient::strings")]
    pub nicknames: Vec<String>,
}

impl EnrichmentResult {
    /// Overwrite the identity fields with the caller's record.
    pub fn with_identity(mut self, record: &NameRecord) -> Self {
        self.name = record.name.clone();
        self.gender = record.gender.to_string();
        self.origin = record.origin.clone();
        self.meaning = record.meaning.clone();
        self
    }

    /// The three variant lists, labelled by their JSON field names.
    pub fn variant_lists(&self) -> [(&'static str, &[String]); 3] {
        [
            ("nicknames", &self.nicknames),
            ("variations", &self.variations),
            ("similarNames", &self.similar_names),
        ]
    }
}

/// Advisory verdict from the fact-checking pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationResult {
    #[serde(deserialize_with = "lenient::flag")]
    pub passed: bool,
    #[serde(deserialize_with = "lenient::strings")]
    pub issues: Vec<String>,
    #[serde(deserialize_with = "lenient::strings")]
    pub suggestions: Vec<String>,
}

/// Envelope returned by the enrichment endpoint and CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentResponse {
    pub success: bool,
    pub data: EnrichmentResult,
    pub verification: VerificationResult,
    pub enrichment_version: String,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Blog posts
// ---------------------------------------------------------------------------

/// Derived statistics stored alongside a post's content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogStats {
    pub word_count: usize,
    /// Minutes.
    pub reading_time: usize,
    pub names_count: usize,
}

/// A blog post in the content store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    #[serde(default)]
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub stats: BlogStats,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_status() -> String {
    "draft".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_requires_every_field() {
        let err = NameRecord::from_parts(Some("Luna"), Some("female"), Some("Latin"), None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation error: Missing required fields: name, gender, origin, meaning"
        );

        let err = NameRecord::from_parts(Some("  "), Some("female"), Some("Latin"), Some("Moon"))
            .unwrap_err();
        assert!(matches!(err, SoulseedError::Validation { .. }));
    }

    #[test]
    fn record_from_json() {
        let value = serde_json::json!({
            "name": "Luna", "gender": "Female", "origin": "Latin", "meaning": "Moon"
        });
        let record = NameRecord::from_json(&value).expect("record");
        assert_eq!(record.gender, Gender::Female);
        assert_eq!(record.name, "Luna");

        let bad = serde_json::json!({ "name": 7, "gender": "f", "origin": "x", "meaning": "y" });
        assert!(NameRecord::from_json(&bad).is_err());
    }

    #[test]
    fn unknown_gender_is_preserved() {
        let g: Gender = serde_json::from_str("\"nonbinary\"").expect("parse");
        assert_eq!(g, Gender::Other("nonbinary".into()));
        assert_eq!(serde_json::to_string(&Gender::Unisex).unwrap(), "\"unisex\"");
    }

    #[test]
    fn sparse_enrichment_fills_every_field() {
        let parsed: EnrichmentResult =
            serde_json::from_str(r#"{"name":"Luna","nicknames":["Lu"]}"#).expect("parse");
        let value = serde_json::to_value(&parsed).expect("serialize");
        for field in [
            "name",
            "culturalSignificance",
            "religiousSignificance",
            "historicFigures",
            "moviesAndShows",
            "songs",
            "famousPeople",
            "famousQuotes",
            "characterQuotes",
            "nicknames",
            "variations",
            "similarNames",
        ] {
            assert!(!value[field].is_null(), "{field} should be present");
        }
    }

    #[test]
    fn years_accept_numbers_and_text() {
        let song: Song = serde_json::from_str(r#"{"title":"Luna","year":1999}"#).unwrap();
        assert_eq!(song.year, YearValue::Number(1999));
        let show: MovieOrShow =
            serde_json::from_str(r#"{"title":"X","year":"2001-2004","type":"TV"}"#).unwrap();
        assert_eq!(show.year.to_string(), "2001-2004");
        assert_eq!(show.kind, "TV");
    }

    #[test]
    fn identity_comes_from_record() {
        let record = NameRecord {
            name: "Luna".into(),
            gender: Gender::Female,
            origin: "Latin".into(),
            meaning: "Moon".into(),
        };
        let result = EnrichmentResult {
            name: "LUNA!!".into(),
            ..Default::default()
        }
        .with_identity(&record);
        assert_eq!(result.name, "Luna");
        assert_eq!(result.gender, "female");
    }

    #[test]
    fn null_and_mistyped_fields_fall_back_to_defaults() {
        let parsed: EnrichmentResult = serde_json::from_str(
            r#"{
                "name": "Luna",
                "funFact": null,
                "symbolism": 42,
                "nicknames": null,
                "variations": "Lunah",
                "religiousSignificance": {"hasSignificance": false, "character": null, "religions": null},
                "historicFigures": [{"fullName": "X", "years": 1850}, "not a figure"],
                "songs": null
            }"#,
        )
        .expect("lenient parse");
        assert_eq!(parsed.fun_fact, "");
        assert_eq!(parsed.symbolism, "42");
        assert!(parsed.nicknames.is_empty());
        assert_eq!(parsed.variations, vec!["Lunah".to_string()]);
        assert_eq!(parsed.religious_significance.character, "");
        assert!(parsed.religious_significance.religions.is_empty());
        assert_eq!(parsed.historic_figures.len(), 1);
        assert_eq!(parsed.historic_figures[0].years, YearValue::Number(1850));
        assert_eq!(parsed.historic_figures[0].birth_year(), Some(1850));
        assert!(parsed.songs.is_empty());

        let value = serde_json::to_value(&parsed).expect("serialize");
        assert_eq!(value["funFact"], "");
        assert_eq!(value["religiousSignificance"]["character"], "");
    }

    #[test]
    fn verification_tolerates_nulls() {
        let verdict: VerificationResult =
            serde_json::from_str(r#"{"passed":"true","issues":null,"suggestions":["add dates"]}"#)
                .expect("parse");
        assert!(verdict.passed);
        assert!(verdict.issues.is_empty());
        assert_eq!(verdict.suggestions, vec!["add dates".to_string()]);
    }

    #[test]
    fn birth_year_parses_leading_digits() {
        let figure = HistoricFigure {
            years: "1820-1910".into(),
            ..Default::default()
        };
        assert_eq!(figure.birth_year(), Some(1820));
        let unknown = HistoricFigure {
            years: "c. 400 BC".into(),
            ..Default::default()
        };
        assert_eq!(unknown.birth_year(), None);
    }

    #[test]
    fn blog_post_import_defaults() {
        let post: BlogPost =
            serde_json::from_str(r#"{"id":"p1","title":"50 Names","status":"published"}"#)
                .expect("parse");
        assert_eq!(post.stats, BlogStats::default());
        assert_eq!(post.content, "");
    }
}
