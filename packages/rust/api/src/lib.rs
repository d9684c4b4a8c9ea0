//! HTTP surface for SoulSeed.
//!
//! Routes:
//! - `POST /api/enrich`: name enrichment
//! - `GET  /api/scraper-input`: scrape target list (API-key protected)
//! - `POST /api/scraper-output`: scrape result webhook (HMAC-signed)
//! - `POST /api/blogs/rewrite` and `POST /api/blogs/rewrite-single`
//! - `GET  /health`

pub mod error;
pub mod handlers;
pub mod router;
pub mod security;
pub mod signature;
pub mod state;

pub use router::create_router;
pub use state::{AppState, Secrets};

use soulseed_core::run_weekly;
use soulseed_shared::{AppConfig, Result, SoulseedError};
use tracing::{error, info};

/// Bind the configured address and serve until Ctrl-C.
///
/// Spawns the weekly rewrite trigger when `schedule.enabled` is set.
pub async fn serve(config: &AppConfig) -> Result<()> {
    let state = AppState::from_config(config).await?;

    if config.schedule.enabled {
        let rewriter = (*state.rewriter).clone();
        let schedule = config.schedule.clone();
        tokio::spawn(async move {
            if let Err(e) = run_weekly(rewriter, schedule).await {
                error!(error = %e, "weekly rewrite trigger stopped");
            }
        });
    }

    let app = create_router(config.server.body_limit_bytes).with_state(state);
    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .map_err(|e| SoulseedError::Network(format!("failed to bind {}: {e}", config.server.bind)))?;

    info!(bind = %config.server.bind, "server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await
        .map_err(|e| SoulseedError::Network(format!("server error: {e}")))
}
