//! Meeting transcript lookup.
//!
//! A [`TranscriptCache`] answers "what is the transcript for meeting X?" by
//! serving previously fetched payloads from memory and delegating misses to a
//! [`TranscriptSource`] (Microsoft Graph in production).

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

mod cache;

pub use cache::TranscriptCache;

/// Prefix prepended to every transcript shown to the user.
pub const TRANSCRIPT_PREFIX: &str = "Format: ";

/// Text shown when no transcript is available for a meeting.
pub const TRANSCRIPT_NOT_FOUND: &str = "Transcript not found.";

/// External capability that retrieves the transcript body for a meeting.
///
/// An empty string means the meeting has no transcript (yet). Errors cover
/// transport, auth and API failures; the cache treats them like an empty
/// result but keeps the reason for logging.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_transcript(&self, meeting_id: &str) -> Result<String>;
}

/// A cached transcript, keyed by meeting identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptRecord {
    pub id: String,
    pub data: String,
}

impl TranscriptRecord {
    pub fn new(id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: data.into(),
        }
    }
}

/// Outcome of a single transcript lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptLookup {
    /// Served from memory without contacting the source.
    Cached(String),
    /// Cache miss; the source returned data which is now cached.
    Fetched(String),
    /// Cache miss; the source had nothing for this meeting.
    Empty,
    /// Cache miss; the source call failed.
    Failed(String),
    /// No meeting identifier was supplied, nothing was looked up.
    MissingId,
}

impl TranscriptLookup {
    /// Transcript payload, if the lookup produced one.
    pub fn data(&self) -> Option<&str> {
        match self {
            Self::Cached(data) | Self::Fetched(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.data().is_some()
    }

    /// The user-facing string: the prefixed transcript or the fallback text.
    pub fn display_text(&self) -> String {
        match self.data() {
            Some(data) => format!("{TRANSCRIPT_PREFIX}{data}"),
            None => TRANSCRIPT_NOT_FOUND.to_string(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cached(_) => "cached",
            Self::Fetched(_) => "fetched",
            Self::Empty => "empty",
            Self::Failed(_) => "failed",
            Self::MissingId => "missing_id",
        }
    }
}
