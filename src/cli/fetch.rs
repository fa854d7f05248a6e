use anyhow::Result;
use std::sync::Arc;

use super::args::FetchCliArgs;
use crate::config::Config;
use crate::graph::GraphClient;
use crate::transcripts::{TranscriptCache, TranscriptLookup};

/// Look up one transcript through the same cache path the server uses and
/// print the text the transcript view would show.
pub async fn handle_fetch_command(args: FetchCliArgs) -> Result<()> {
    let config = Config::load()?;
    let graph = GraphClient::new(&config.graph)?;
    let cache = TranscriptCache::new(Arc::new(graph));

    let lookup = cache.lookup(&args.meeting_id).await;
    if let TranscriptLookup::Failed(reason) = &lookup {
        eprintln!("Transcript fetch failed: {}", reason);
    }

    println!("{}", lookup.display_text());
    Ok(())
}
