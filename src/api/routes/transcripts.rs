//! Transcript endpoints.
//!
//! Provides HTTP endpoints for:
//! - Rendering the transcript view for a meeting (GET /home?meetingId=...)
//! - Listing cached transcripts (GET /transcripts)

use crate::api::error::ApiResult;
use crate::api::AppState;
use axum::{
    extract::{Query, State},
    response::{Html, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Query parameters for the transcript view.
#[derive(Debug, Deserialize, Default)]
pub struct HomeQueryParams {
    #[serde(rename = "meetingId")]
    pub meeting_id: Option<String>,
}

/// Summary of a cached transcript; payloads are not exposed here.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedTranscript {
    pub id: String,
    pub length: usize,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/home", get(home))
        .route("/transcripts", get(list_transcripts))
        .with_state(state)
}

/// GET /home - Render the transcript for `meetingId`.
///
/// A missing or empty `meetingId` renders the fallback text without a lookup.
async fn home(
    State(state): State<AppState>,
    Query(params): Query<HomeQueryParams>,
) -> ApiResult<Html<String>> {
    info!("Home view requested");

    let meeting_id = params.meeting_id.as_deref().filter(|id| !id.is_empty());
    let lookup = state.cache.lookup_optional(meeting_id).await;

    let html = state.views.home(&lookup.display_text())?;
    Ok(Html(html))
}

/// GET /transcripts - List cached transcripts in discovery order.
async fn list_transcripts(State(state): State<AppState>) -> Json<Vec<CachedTranscript>> {
    let entries = state
        .cache
        .records()
        .await
        .into_iter()
        .map(|record| CachedTranscript {
            length: record.data.len(),
            id: record.id,
        })
        .collect();

    Json(entries)
}
