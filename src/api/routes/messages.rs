//! Bot Framework messaging endpoint.

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::bot::Activity;
use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Router};
use tracing::{debug, info};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/messages", post(receive_activity))
        .with_state(state)
}

/// POST /api/messages - Accept an activity from the Bot Connector.
///
/// Any well-formed activity is acknowledged with 200; meeting-end events
/// start a transcript warm-up in the background.
async fn receive_activity(State(state): State<AppState>, body: Bytes) -> ApiResult<StatusCode> {
    let activity: Activity = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid activity: {}", e)))?;

    info!(
        "Activity received: type={} name={:?}",
        activity.activity_type, activity.name
    );
    debug!("Activity conversation: {:?}", activity.conversation);

    // The warm-up outlives the request; its outcome is logged by the handler.
    let _ = state.bot.handle(&activity);

    Ok(StatusCode::OK)
}
