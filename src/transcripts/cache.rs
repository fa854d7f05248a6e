//! In-memory transcript cache with fetch-on-miss.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{TranscriptLookup, TranscriptRecord, TranscriptSource};

/// Process-lifetime cache of meeting transcripts.
///
/// Records are kept in discovery order and are never evicted or updated.
/// Misses for the same meeting are serialized through a per-meeting gate, so
/// concurrent requests trigger one fetch and store at most one record.
/// Cloning the cache yields another handle to the same records.
#[derive(Clone)]
pub struct TranscriptCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    source: Arc<dyn TranscriptSource>,
    records: Mutex<Vec<TranscriptRecord>>,
    gates: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TranscriptCache {
    pub fn new(source: Arc<dyn TranscriptSource>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                source,
                records: Mutex::new(Vec::new()),
                gates: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.inner.source.name()
    }

    /// Transcript for `meeting_id` as shown to the user: `"Format: <data>"`
    /// or `"Transcript not found."`.
    pub async fn get_transcript(&self, meeting_id: &str) -> String {
        self.lookup(meeting_id).await.display_text()
    }

    /// Like [`lookup`](Self::lookup), but an absent identifier short-circuits
    /// without touching the cache or the source.
    pub async fn lookup_optional(&self, meeting_id: Option<&str>) -> TranscriptLookup {
        match meeting_id {
            Some(id) => self.lookup(id).await,
            None => TranscriptLookup::MissingId,
        }
    }

    /// Serve `meeting_id` from memory, or fetch it from the source and cache
    /// a non-empty result.
    pub async fn lookup(&self, meeting_id: &str) -> TranscriptLookup {
        if let Some(record) = self.get(meeting_id).await {
            debug!("Transcript cache hit for meeting {}", meeting_id);
            return TranscriptLookup::Cached(record.data);
        }

        let gate = self.gate(meeting_id).await;
        let outcome = {
            let _guard = gate.lock().await;

            // Another request may have populated the entry while we waited.
            match self.get(meeting_id).await {
                Some(record) => TranscriptLookup::Cached(record.data),
                None => self.fetch_and_store(meeting_id).await,
            }
        };
        self.release_gate(meeting_id, gate).await;

        outcome
    }

    async fn fetch_and_store(&self, meeting_id: &str) -> TranscriptLookup {
        info!(
            "Transcript cache miss for meeting {}, fetching via {}",
            meeting_id,
            self.inner.source.name()
        );

        match self.inner.source.fetch_transcript(meeting_id).await {
            Ok(data) if data.is_empty() => {
                info!("No transcript available for meeting {}", meeting_id);
                TranscriptLookup::Empty
            }
            Ok(data) => {
                debug!("Fetched transcript for meeting {}: {} chars", meeting_id, data.len());
                self.insert(TranscriptRecord::new(meeting_id, data.clone()))
                    .await;
                TranscriptLookup::Fetched(data)
            }
            Err(e) => {
                warn!("Failed to fetch transcript for meeting {}: {:#}", meeting_id, e);
                TranscriptLookup::Failed(format!("{e:#}"))
            }
        }
    }

    /// Append `record` unless its id is already cached or its data is empty.
    pub async fn insert(&self, record: TranscriptRecord) -> bool {
        if record.data.is_empty() {
            return false;
        }

        let mut records = self.inner.records.lock().await;
        if records.iter().any(|r| r.id == record.id) {
            return false;
        }

        info!("Cached transcript for meeting {}", record.id);
        records.push(record);
        true
    }

    pub async fn get(&self, meeting_id: &str) -> Option<TranscriptRecord> {
        self.inner
            .records
            .lock()
            .await
            .iter()
            .find(|r| r.id == meeting_id)
            .cloned()
    }

    /// Snapshot of all cached records in discovery order.
    pub async fn records(&self) -> Vec<TranscriptRecord> {
        self.inner.records.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn gate(&self, meeting_id: &str) -> Arc<Mutex<()>> {
        let mut gates = self.inner.gates.lock().await;
        gates
            .entry(meeting_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn release_gate(&self, meeting_id: &str, gate: Arc<Mutex<()>>) {
        let mut gates = self.inner.gates.lock().await;
        let idle = gates
            .get(meeting_id)
            .is_some_and(|current| Arc::ptr_eq(current, &gate) && Arc::strong_count(&gate) == 2);
        if idle {
            gates.remove(meeting_id);
        }
    }
}
