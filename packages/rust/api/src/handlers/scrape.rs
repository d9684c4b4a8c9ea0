use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use soulseed_scrape::ScrapePayload;
use soulseed_shared::SoulseedError;

use crate::error::ApiError;
use crate::signature;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// GET /api/scraper-input - newline-separated target URLs for the scraper
pub async fn get_scraper_input(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(expected) = state.secrets.scraper_api_key.as_deref() else {
        warn!("scrape input requested but no API key is configured");
        return Err(ApiError::unauthorized());
    };

    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| query.get("api_key").map(String::as_str));

    if provided != Some(expected) {
        return Err(ApiError::unauthorized());
    }

    info!(targets = state.targets.len(), "serving scrape targets");
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.targets.join("\n"),
    ))
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub processed: bool,
    pub timestamp: String,
    pub files: Vec<String>,
}

/// POST /api/scraper-output - receive scraped pages and extract what we know
pub async fn post_scraper_output(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let provided = headers.get(SIGNATURE_HEADER).map(|v| v.to_str().unwrap_or_default());
    if let (Some(secret), Some(sig)) = (state.secrets.webhook_secret.as_deref(), provided) {
        if !signature::verify(secret, &body, sig) {
            warn!("webhook signature mismatch");
            return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid signature"));
        }
    }

    let value: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        ApiError::new(StatusCode::BAD_REQUEST, "Invalid JSON").with_message(e.to_string())
    })?;
    let payload = ScrapePayload::from_json(&value).map_err(|e| {
        ApiError::new(StatusCode::BAD_REQUEST, "Invalid payload").with_message(e.to_string())
    })?;

    let report = state.processor.process(&payload).await.map_err(|e| match e {
        SoulseedError::Validation { message } => {
            warn!(error = %message, "webhook payload rejected");
            ApiError::new(StatusCode::BAD_REQUEST, "Invalid payload").with_message(message)
        }
        other => {
            error!(error = %other, "webhook processing failed");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                .with_message(other.to_string())
        }
    })?;

    info!(
        pages = report.pages,
        extracted = report.extracted,
        files = report.files.len(),
        "webhook processed"
    );

    Ok(Json(WebhookAck {
        received: true,
        processed: true,
        timestamp: Utc::now().to_rfc3339(),
        files: report
            .files
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
    }))
}
