use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use soulseed_core::ItemOutcome;
use soulseed_shared::SoulseedError;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteAllResponse {
    pub success: bool,
    pub total_posts: usize,
    pub success_count: usize,
    pub fail_count: usize,
    pub results: Vec<ItemOutcome>,
}

/// POST /api/blogs/rewrite - rewrite every published post
pub async fn post_rewrite_all(
    State(state): State<AppState>,
) -> Result<Json<RewriteAllResponse>, ApiError> {
    info!("full rewrite requested");
    let summary = state.rewriter.rewrite_all().await.map_err(|e| {
        error!(error = %e, "rewrite run failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).failed()
    })?;

    Ok(Json(RewriteAllResponse {
        success: true,
        total_posts: summary.total_posts,
        success_count: summary.success_count,
        fail_count: summary.fail_count,
        results: summary.results,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RewriteSingleParams {
    #[serde(rename = "postId")]
    pub post_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RewriteSingleResponse {
    pub success: bool,
    pub result: ItemOutcome,
}

/// POST /api/blogs/rewrite-single?postId=... - rewrite one post
pub async fn post_rewrite_single(
    State(state): State<AppState>,
    Query(params): Query<RewriteSingleParams>,
) -> Result<Json<RewriteSingleResponse>, ApiError> {
    let post_id = params
        .post_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Missing postId parameter"))?;

    info!(post_id = %post_id, "single rewrite requested");
    let outcome = match state.rewriter.rewrite_one(&post_id).await {
        Ok(outcome) => outcome,
        Err(SoulseedError::NotFound(_)) => {
            return Err(ApiError::new(StatusCode::NOT_FOUND, "Post not found"));
        }
        Err(e) => {
            error!(post_id = %post_id, error = %e, "single rewrite failed");
            return Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).failed());
        }
    };

    match outcome {
        ItemOutcome::Failure(failure) => {
            Err(ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, failure.error).failed())
        }
        result => Ok(Json(RewriteSingleResponse {
            success: true,
            result,
        })),
    }
}
