use crate::api::{ApiServer, AppState};
use crate::bot::ActivityHandler;
use crate::config::Config;
use crate::graph::GraphClient;
use crate::transcripts::TranscriptCache;
use crate::views::Views;
use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

pub async fn run_service(port_override: Option<u16>) -> Result<()> {
    info!("Starting Teams transcript bot");

    let mut config = Config::load()?;
    if let Some(port) = port_override {
        config.server.port = port;
    }

    let state = build_state(&config)?;
    info!(
        "Transcripts are fetched via {}; tab URL is {}",
        state.cache.source_name(),
        config.tab_url()
    );

    let server = ApiServer::new(state, &config.server);
    let handle = tokio::spawn(server.start());

    tokio::select! {
        result = handle => match result {
            Ok(Ok(())) => info!("Server stopped"),
            Ok(Err(e)) => {
                error!("Server failed: {:#}", e);
                return Err(e);
            }
            Err(e) => return Err(e.into()),
        },
        _ = tokio::signal::ctrl_c() => info!("Shutdown requested"),
    }

    Ok(())
}

/// Wire the Graph client, transcript cache, views and bot handler together.
pub fn build_state(config: &Config) -> Result<AppState> {
    let graph = Arc::new(GraphClient::new(&config.graph)?);
    let cache = TranscriptCache::new(graph.clone());
    let bot = ActivityHandler::new(cache.clone(), graph);
    let views = Arc::new(Views::new(config)?);

    Ok(AppState { cache, views, bot })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_state_without_credentials() {
        let state = build_state(&Config::default()).unwrap();
        assert_eq!(state.cache.source_name(), "Microsoft Graph");
        assert!(state.cache.is_empty().await);
        assert_eq!(
            state.cache.get_transcript("meeting-1").await,
            "Transcript not found."
        );
    }
}
