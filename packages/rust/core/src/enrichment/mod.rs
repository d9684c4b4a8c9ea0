//! Two-phase name enrichment: generate a research payload, then have the
//! model fact-check it.
//!
//! Verification is advisory. Its verdict is logged and returned to the
//! caller but never triggers regeneration or rejects the payload.

pub mod prompt;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use soulseed_llm::{ChatModel, ChatRequest};
use soulseed_shared::{
    ENRICHMENT_VERSION, EnrichConfig, EnrichmentResponse, EnrichmentResult, NameRecord, Result,
    SoulseedError, VARIANT_LIST_LEN, VerificationResult,
};

use prompt::{
    FACT_CHECK_SYSTEM_PROMPT, HISTORIC_DEPTH_YEAR, MIN_HISTORIC_FIGURES, RESEARCH_SYSTEM_PROMPT,
    build_enrichment_prompt, build_verification_prompt,
};

/// Runs the generate → verify sequence against a chat model.
#[derive(Clone)]
pub struct Enricher {
    model: Arc<dyn ChatModel>,
    config: EnrichConfig,
}

impl Enricher {
    pub fn new(model: Arc<dyn ChatModel>, config: EnrichConfig) -> Self {
        Self { model, config }
    }

    /// Generation call. Malformed JSON is a parse error; no retry here.
    #[instrument(skip_all, fields(name = %record.name))]
    pub async fn generate(&self, record: &NameRecord) -> Result<EnrichmentResult> {
        let request = ChatRequest::new(
            &self.config.model,
            RESEARCH_SYSTEM_PROMPT,
            build_enrichment_prompt(record),
            self.config.generate_temperature,
        )
        .json();

        let completion = self.model.complete(&request).await?;
        let result: EnrichmentResult = parse_json_reply(&completion.text, "generation")?;
        let result = result.with_identity(record);

        info!(
            historic_figures = result.historic_figures.len(),
            tokens_out = completion.tokens_out,
            "generation complete"
        );
        Ok(result)
    }

    /// Verification call, merged with the local structural checks.
    #[instrument(skip_all, fields(name = %result.name))]
    pub async fn verify(&self, result: &EnrichmentResult) -> Result<VerificationResult> {
        let request = ChatRequest::new(
            &self.config.model,
            FACT_CHECK_SYSTEM_PROMPT,
            build_verification_prompt(result)?,
            self.config.verify_temperature,
        )
        .json();

        let completion = self.model.complete(&request).await?;
        let mut verification: VerificationResult =
            parse_json_reply(&completion.text, "verification")?;

        let local = structural_issues(result);
        if !local.is_empty() {
            verification.passed = false;
            for issue in local {
                if !verification.issues.contains(&issue) {
                    verification.issues.push(issue);
                }
            }
        }

        if verification.passed {
            info!("verification passed");
        } else {
            warn!(issues = ?verification.issues, "verification found issues");
        }
        Ok(verification)
    }

    /// Full pipeline: generate, verify, wrap.
    pub async fn enrich(&self, record: &NameRecord) -> Result<EnrichmentResponse> {
        let data = self.generate(record).await?;
        let verification = self.verify(&data).await?;
        Ok(EnrichmentResponse {
            success: true,
            data,
            verification,
            enrichment_version: ENRICHMENT_VERSION.to_string(),
            timestamp: Utc::now(),
        })
    }
}

/// Parse a JSON-mode reply, tolerating a Markdown code fence around it.
fn parse_json_reply<T: serde::de::DeserializeOwned>(text: &str, phase: &str) -> Result<T> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(body)
        .map_err(|e| SoulseedError::parse(format!("{phase} returned malformed JSON: {e}")))
}

// ---------------------------------------------------------------------------
// Local checks
// ---------------------------------------------------------------------------

/// Report each variant list that is not exactly [`VARIANT_LIST_LEN`] long or
/// that repeats an entry (exactly or ignoring case). Nothing is repaired.
pub fn check_variant_lists(result: &EnrichmentResult) -> Vec<String> {
    let mut issues = Vec::new();
    for (label, list) in result.variant_lists() {
        if list.len() != VARIANT_LIST_LEN {
            issues.push(format!(
                "{label} has {} entries, expected exactly {VARIANT_LIST_LEN}",
                list.len()
            ));
        }

        let mut exact = HashSet::new();
        let mut folded = HashSet::new();
        for item in list {
            let item = item.trim();
            if !exact.insert(item) {
                issues.push(format!("{label} repeats \"{item}\""));
            } else if !folded.insert(item.to_lowercase()) {
                issues.push(format!("{label} repeats \"{item}\" ignoring case"));
            }
        }
    }
    issues
}

/// Report a short figure list or one lacking a figure born before 1920.
pub fn check_historic_figures(result: &EnrichmentResult) -> Vec<String> {
    let mut issues = Vec::new();
    let figures = &result.historic_figures;
    if figures.len() < MIN_HISTORIC_FIGURES {
        issues.push(format!(
            "historicFigures has {} entries, expected at least {MIN_HISTORIC_FIGURES}",
            figures.len()
        ));
    }
    if !figures.is_empty()
        && !figures
            .iter()
            .filter_map(|f| f.birth_year())
            .any(|year| year < HISTORIC_DEPTH_YEAR)
    {
        issues.push(format!(
            "historicFigures has no figure born before {HISTORIC_DEPTH_YEAR}"
        ));
    }
    issues
}

/// Every local check, in report order.
pub fn structural_issues(result: &EnrichmentResult) -> Vec<String> {
    let mut issues = check_variant_lists(result);
    issues.extend(check_historic_figures(result));
    issues
}
