//! Bot Framework activity intake.
//!
//! Activities posted to `/api/messages` are parsed and classified. When a
//! meeting ends, the transcript for that meeting is fetched in the background
//! so the tab can serve it from the cache.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::transcripts::{TranscriptCache, TranscriptLookup};

pub const MEETING_START_EVENT: &str = "application/vnd.microsoft.meetingStart";
pub const MEETING_END_EVENT: &str = "application/vnd.microsoft.meetingEnd";

/// Maps a Teams meeting join URL to the Graph online meeting id.
#[async_trait]
pub trait MeetingResolver: Send + Sync {
    async fn resolve_meeting_id(&self, join_web_url: &str) -> Result<Option<String>>;
}

/// The subset of a Bot Framework activity this service reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type", default)]
    pub activity_type: String,
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub channel_data: Value,
    pub conversation: Option<ConversationAccount>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationAccount {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityKind {
    Message,
    MeetingStart,
    MeetingEnd,
    Other(String),
}

/// Payload of a meeting start/end event (`Id`, `JoinUrl`, `Title`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetingDetails {
    pub id: Option<String>,
    pub join_url: Option<String>,
    pub title: Option<String>,
}

impl Activity {
    pub fn kind(&self) -> ActivityKind {
        match (self.activity_type.as_str(), self.name.as_deref()) {
            ("message", _) => ActivityKind::Message,
            ("event", Some(MEETING_START_EVENT)) => ActivityKind::MeetingStart,
            ("event", Some(MEETING_END_EVENT)) => ActivityKind::MeetingEnd,
            (other, _) => ActivityKind::Other(other.to_string()),
        }
    }

    /// Meeting details from the event value, falling back to the Teams
    /// meeting id carried in channel data. Each field is read on its own so
    /// one malformed field does not discard the others.
    pub fn meeting_details(&self) -> MeetingDetails {
        let field = |name: &str| match self.value.get(name) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                warn!(
                    "Ignoring non-string meeting {} in {:?} activity: {}",
                    name, self.name, other
                );
                None
            }
        };

        MeetingDetails {
            id: field("Id").or_else(|| {
                self.channel_data
                    .pointer("/meeting/id")
                    .and_then(Value::as_str)
                    .map(String::from)
            }),
            join_url: field("JoinUrl"),
            title: field("Title"),
        }
    }
}

#[derive(Clone)]
pub struct ActivityHandler {
    cache: TranscriptCache,
    resolver: Arc<dyn MeetingResolver>,
}

impl ActivityHandler {
    pub fn new(cache: TranscriptCache, resolver: Arc<dyn MeetingResolver>) -> Self {
        Self { cache, resolver }
    }

    /// Handle an inbound activity. Returns the warm-up task when one was
    /// started.
    pub fn handle(&self, activity: &Activity) -> Option<JoinHandle<TranscriptLookup>> {
        match activity.kind() {
            ActivityKind::MeetingEnd => {
                let details = activity.meeting_details();
                info!(
                    "Meeting ended: {}",
                    details.title.as_deref().unwrap_or("(untitled)")
                );

                let handler = self.clone();
                Some(tokio::spawn(async move { handler.warm_up(&details).await }))
            }
            ActivityKind::MeetingStart => {
                info!(
                    "Meeting started: {}",
                    activity.meeting_details().title.as_deref().unwrap_or("(untitled)")
                );
                None
            }
            kind => {
                debug!("Ignoring {:?} activity {:?}", kind, activity.id);
                None
            }
        }
    }

    /// Fetch and cache the transcript for an ended meeting.
    pub async fn warm_up(&self, details: &MeetingDetails) -> TranscriptLookup {
        match self.meeting_id(details).await {
            Ok(Some(meeting_id)) => {
                let lookup = self.cache.lookup(&meeting_id).await;
                info!(
                    "Transcript warm-up for meeting {}: {}",
                    meeting_id,
                    lookup.as_str()
                );
                lookup
            }
            Ok(None) => {
                warn!("Meeting end event carried no usable meeting id");
                TranscriptLookup::MissingId
            }
            Err(e) => {
                warn!("Failed to resolve ended meeting: {:#}", e);
                TranscriptLookup::Failed(format!("{e:#}"))
            }
        }
    }

    async fn meeting_id(&self, details: &MeetingDetails) -> Result<Option<String>> {
        match details.join_url.as_deref().filter(|url| !url.is_empty()) {
            Some(join_url) => self
                .resolver
                .resolve_meeting_id(join_url)
                .await
                .context("Failed to resolve online meeting from join URL"),
            None => Ok(details.id.clone().filter(|id| !id.is_empty())),
        }
    }
}
