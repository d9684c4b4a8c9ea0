use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use tracing::{error, info};

use soulseed_shared::{EnrichmentResponse, NameRecord};

use crate::error::ApiError;
use crate::state::AppState;

const MISSING_FIELDS: &str = "Missing required fields: name, gender, origin, meaning";

/// POST /api/enrich - generate and verify a name research payload
pub async fn post_enrich(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<EnrichmentResponse>, ApiError> {
    let record = serde_json::from_slice::<serde_json::Value>(&body)
        .ok()
        .and_then(|value| NameRecord::from_json(&value).ok())
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, MISSING_FIELDS))?;

    info!(name = %record.name, origin = %record.origin, "enrichment requested");

    match state.enricher.enrich(&record).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!(name = %record.name, error = %e, "enrichment failed");
            Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Enrichment failed")
                .with_message(e.to_string()))
        }
    }
}

pub async fn enrich_method_not_allowed() -> ApiError {
    ApiError::method_not_allowed("Method not allowed. Use POST.")
}
