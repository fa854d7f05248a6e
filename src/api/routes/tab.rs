//! Meeting tab pages.

use crate::api::error::ApiResult;
use crate::api::AppState;
use axum::{extract::State, response::Html, routing::get, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/tab", get(tab))
        .route("/config", get(config))
        .with_state(state)
}

/// GET /tab - Tab content page.
async fn tab(State(state): State<AppState>) -> ApiResult<Html<String>> {
    Ok(Html(state.views.tab()?))
}

/// GET /config - Tab configuration page shown when adding the tab to a meeting.
async fn config(State(state): State<AppState>) -> ApiResult<Html<String>> {
    Ok(Html(state.views.config_page()?))
}
