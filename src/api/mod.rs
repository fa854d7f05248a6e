//! HTTP server for the Teams bot and meeting tab.
//!
//! Provides HTTP endpoints for:
//! - Transcript view (GET /home?meetingId=...)
//! - Meeting tab content and configuration pages
//! - Bot Framework activity intake (POST /api/messages)
//! - Service info and cached transcript listing

pub mod error;
pub mod routes;

use crate::bot::ActivityHandler;
use crate::config::ServerConfig;
use crate::transcripts::TranscriptCache;
use crate::views::Views;
use anyhow::{Context, Result};
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub cache: TranscriptCache,
    pub views: Arc<Views>,
    pub bot: ActivityHandler,
}

pub struct ApiServer {
    host: String,
    port: u16,
    state: AppState,
}

impl ApiServer {
    pub fn new(state: AppState, config: &ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            state,
        }
    }

    pub async fn start(self) -> Result<()> {
        let app = router(self.state);

        let address = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .with_context(|| format!("Failed to bind {}", address))?;

        info!("Server listening on http://{}", address);
        info!("Endpoints:");
        info!("  GET  /                  - Service info");
        info!("  GET  /version           - Get version info");
        info!("  GET  /home?meetingId=ID - Meeting transcript view");
        info!("  GET  /transcripts       - List cached transcripts");
        info!("  GET  /tab               - Meeting tab page");
        info!("  GET  /config            - Tab configuration page");
        info!("  POST /api/messages      - Bot Framework activities");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/version", get(version))
        .merge(routes::transcripts::router(state.clone()))
        .merge(routes::tab::router(state.clone()))
        .merge(routes::messages::router(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "teams-transcript-bot",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "teams-transcript-bot"
    }))
}
