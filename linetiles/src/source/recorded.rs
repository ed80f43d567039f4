//! Metadata source backed by a recorded hit-count dump.
//!
//! The dump is a JSON document:
//!
//! ```json
//! {
//!   "recording_id": "rec-1",
//!   "sources": [
//!     { "id": "1", "url": "https://example.com/app.js", "max_line": 40,
//!       "hit_counts": { "3": 12, "4": 1 } }
//!   ]
//! }
//! ```
//!
//! Fetches only answer while a session is connected (see [`SessionClient`]),
//! and each fetch sleeps for a configurable latency so pending state can be
//! observed.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::{
    BoxFuture, FetchError, FetchStatus, HitCount, LineEntries, MetadataSource, SourceDescriptor,
    SourceId,
};
use crate::session::{SessionClient, SessionError};
use crate::tile::LineSpan;

/// Errors loading a recording dump.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid recording dump: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Source {0} appears more than once")]
    DuplicateSource(String),

    #[error("Source {source_id} has a hit count for line 0")]
    InvalidLine { source_id: String },
}

/// One source file of a recording dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedFile {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Highest breakable line, if the recorder reported it.
    #[serde(default)]
    pub max_line: Option<u32>,
    /// Line -> number of hits.
    #[serde(default)]
    pub hit_counts: BTreeMap<u32, u64>,
}

/// A recorded run: its id and per-source hit counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingDump {
    pub recording_id: String,
    #[serde(default)]
    pub sources: Vec<RecordedFile>,
}

impl RecordingDump {
    /// Reads and parses a dump file.
    pub fn from_file(path: &Path) -> Result<Self, DumpError> {
        let content = std::fs::read_to_string(path).map_err(|source| DumpError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parses a dump from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, DumpError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// [`MetadataSource`] answering from a [`RecordingDump`].
pub struct RecordedSource {
    recording_id: String,
    files: Vec<RecordedFile>,
    index: HashMap<String, usize>,
    latency: Duration,
    connected: AtomicBool,
    spans: Mutex<HashMap<SourceId, HashMap<LineSpan, FetchStatus>>>,
    fetches: AtomicU64,
}

impl RecordedSource {
    /// Builds a source from a parsed dump.
    ///
    /// # Errors
    ///
    /// Fails on duplicate source ids and on hit counts for line 0.
    pub fn new(dump: RecordingDump) -> Result<Self, DumpError> {
        let mut index = HashMap::with_capacity(dump.sources.len());
        for (position, file) in dump.sources.iter().enumerate() {
            if file.hit_counts.contains_key(&0) {
                return Err(DumpError::InvalidLine {
                    source_id: file.id.clone(),
                });
            }
            if index.insert(file.id.clone(), position).is_some() {
                return Err(DumpError::DuplicateSource(file.id.clone()));
            }
        }

        Ok(Self {
            recording_id: dump.recording_id,
            files: dump.sources,
            index,
            latency: Duration::ZERO,
            connected: AtomicBool::new(false),
            spans: Mutex::new(HashMap::new()),
            fetches: AtomicU64::new(0),
        })
    }

    /// Loads a dump from disk.
    pub fn from_file(path: &Path) -> Result<Self, DumpError> {
        Self::new(RecordingDump::from_file(path)?)
    }

    /// Parses a dump from JSON.
    pub fn from_json(json: &str) -> Result<Self, DumpError> {
        Self::new(RecordingDump::from_json(json)?)
    }

    /// Delay applied to every fetch.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn recording_id(&self) -> &str {
        &self.recording_id
    }

    /// Descriptors of every source in the dump, in dump order.
    pub fn descriptors(&self) -> Vec<SourceDescriptor> {
        self.files
            .iter()
            .map(|file| SourceDescriptor::new(file.id.as_str(), file.url.clone()))
            .collect()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Number of fetches started so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }

    fn file(&self, source: &SourceId) -> Option<&RecordedFile> {
        self.index
            .get(source.as_str())
            .and_then(|position| self.files.get(*position))
    }

    fn set_status(&self, source: &SourceId, span: LineSpan, status: FetchStatus) {
        self.spans
            .lock()
            .entry(source.clone())
            .or_default()
            .insert(span, status);
    }

    /// Checks preconditions and marks the span pending.
    fn begin_fetch(
        &self,
        source: &SourceId,
        span: LineSpan,
    ) -> Result<PendingFetch<'_>, FetchError> {
        if !self.is_connected() {
            return Err(FetchError::NotConnected);
        }
        let file = self
            .file(source)
            .ok_or_else(|| FetchError::UnknownSource(source.clone()))?;

        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.set_status(source, span, FetchStatus::Pending);
        debug!(source = %source, span = %span, "Recorded fetch started");

        Ok(PendingFetch {
            owner: self,
            source: source.clone(),
            span,
            file,
            finished: false,
        })
    }
}

/// An in-progress fetch. Reverts the span to unknown if dropped unfinished.
struct PendingFetch<'a> {
    owner: &'a RecordedSource,
    source: SourceId,
    span: LineSpan,
    file: &'a RecordedFile,
    finished: bool,
}

impl PendingFetch<'_> {
    fn finish(mut self) -> LineEntries<HitCount> {
        let entries = self
            .file
            .hit_counts
            .range(self.span.start..=self.span.end)
            .map(|(line, count)| (*line, HitCount::new(*count)))
            .collect();
        self.owner
            .set_status(&self.source, self.span, FetchStatus::Resolved);
        self.finished = true;
        entries
    }
}

impl Drop for PendingFetch<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut spans = self.owner.spans.lock();
        if let Some(statuses) = spans.get_mut(&self.source) {
            if statuses.get(&self.span) == Some(&FetchStatus::Pending) {
                statuses.remove(&self.span);
            }
        }
    }
}

impl MetadataSource for RecordedSource {
    type Metadata = HitCount;

    fn status(&self, source: &SourceId, span: LineSpan) -> FetchStatus {
        let spans = self.spans.lock();
        let Some(statuses) = spans.get(source) else {
            return FetchStatus::NotFound;
        };
        if let Some(status) = statuses.get(&span) {
            return *status;
        }

        let covering = statuses
            .iter()
            .filter(|(known, _)| known.covers(&span))
            .map(|(_, status)| *status);
        let mut status = FetchStatus::NotFound;
        for found in covering {
            match found {
                FetchStatus::Pending => return FetchStatus::Pending,
                FetchStatus::Resolved => status = FetchStatus::Resolved,
                FetchStatus::NotFound => {}
            }
        }
        status
    }

    fn fetch(
        &self,
        source: &SourceId,
        span: LineSpan,
    ) -> BoxFuture<'_, Result<LineEntries<HitCount>, FetchError>> {
        let pending = self.begin_fetch(source, span);
        let latency = self.latency;

        Box::pin(async move {
            let pending = pending?;
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            Ok(pending.finish())
        })
    }

    fn max_breakable_line(
        &self,
        source: &SourceId,
    ) -> BoxFuture<'_, Result<Option<u32>, FetchError>> {
        let result = self
            .file(source)
            .map(|file| {
                file.max_line
                    .or_else(|| file.hit_counts.keys().next_back().copied())
            })
            .ok_or_else(|| FetchError::UnknownSource(source.clone()));
        Box::pin(async move { result })
    }
}

impl SessionClient for RecordedSource {
    fn connect<'a>(
        &'a self,
        recording_id: &'a str,
        _api_key: Option<&'a str>,
    ) -> BoxFuture<'a, Result<(), SessionError>> {
        Box::pin(async move {
            if recording_id != self.recording_id {
                return Err(SessionError::Connect(format!(
                    "dump contains recording {}, not {}",
                    self.recording_id, recording_id
                )));
            }
            self.connected.store(true, Ordering::Release);
            info!(
                recording_id,
                sources = self.files.len(),
                "Recorded session connected"
            );
            Ok(())
        })
    }

    fn close(&self) {
        self.connected.store(false, Ordering::Release);
        self.spans.lock().clear();
    }

    fn requires_api_key(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"{
        "recording_id": "rec-1",
        "sources": [
            { "id": "1", "url": "https://example.com/app.js", "max_line": 40,
              "hit_counts": { "3": 12, "4": 1, "9": 7 } },
            { "id": "2", "url": "record-replay-internal://x.js" },
            { "id": "3", "hit_counts": { "17": 2 } }
        ]
    }"#;

    fn span(start: u32, end: u32) -> LineSpan {
        LineSpan::new(start, end).unwrap()
    }

    async fn connected() -> RecordedSource {
        let source = RecordedSource::from_json(DUMP).unwrap();
        source.connect("rec-1", None).await.unwrap();
        source
    }

    #[test]
    fn test_parse_dump() {
        let source = RecordedSource::from_json(DUMP).unwrap();
        assert_eq!(source.recording_id(), "rec-1");

        let descriptors = source.descriptors();
        assert_eq!(descriptors.len(), 3);
        assert!(descriptors[1].is_internal());
        assert_eq!(descriptors[2].url, None);
    }

    #[test]
    fn test_duplicate_source_rejected() {
        let json = r#"{"recording_id":"r","sources":[{"id":"1"},{"id":"1"}]}"#;
        let err = RecordedSource::from_json(json).err().unwrap();
        assert!(matches!(err, DumpError::DuplicateSource(id) if id == "1"));
    }

    #[test]
    fn test_line_zero_rejected() {
        let json = r#"{"recording_id":"r","sources":[{"id":"1","hit_counts":{"0":1}}]}"#;
        let err = RecordedSource::from_json(json).err().unwrap();
        assert!(matches!(err, DumpError::InvalidLine { .. }));
    }

    #[test]
    fn test_from_missing_file() {
        let err = RecordedSource::from_file(Path::new("/nonexistent/dump.json"))
            .err()
            .unwrap();
        assert!(matches!(err, DumpError::Io { .. }));
    }

    #[tokio::test]
    async fn test_fetch_requires_connection() {
        let source = RecordedSource::from_json(DUMP).unwrap();
        let err = source
            .fetch(&SourceId::new("1"), span(1, 4))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::NotConnected);
    }

    #[tokio::test]
    async fn test_connect_rejects_other_recording() {
        let source = RecordedSource::from_json(DUMP).unwrap();
        let err = source.connect("rec-2", None).await.unwrap_err();
        assert!(matches!(err, SessionError::Connect(_)));
        assert!(!source.is_connected());
    }

    #[tokio::test]
    async fn test_fetch_returns_lines_in_span() {
        let source = connected().await;
        let id = SourceId::new("1");

        let entries = source.fetch(&id, span(1, 4)).await.unwrap();
        assert_eq!(
            entries,
            vec![(3, HitCount::new(12)), (4, HitCount::new(1))]
        );
        assert_eq!(source.status(&id, span(1, 4)), FetchStatus::Resolved);
        assert_eq!(source.status(&id, span(3, 3)), FetchStatus::Resolved);
        assert_eq!(source.status(&id, span(5, 5)), FetchStatus::NotFound);
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_source() {
        let source = connected().await;
        let err = source
            .fetch(&SourceId::new("99"), span(1, 4))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::UnknownSource(SourceId::new("99")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_while_sleeping() {
        let source = RecordedSource::from_json(DUMP)
            .unwrap()
            .with_latency(Duration::from_millis(50));
        source.connect("rec-1", None).await.unwrap();
        let id = SourceId::new("1");

        let fetch = source.fetch(&id, span(5, 8));
        assert_eq!(source.status(&id, span(5, 8)), FetchStatus::Pending);
        assert_eq!(source.status(&id, span(6, 6)), FetchStatus::Pending);

        let entries = fetch.await.unwrap();
        assert!(entries.is_empty());
        assert_eq!(source.status(&id, span(6, 6)), FetchStatus::Resolved);
    }

    #[tokio::test]
    async fn test_dropped_fetch_reverts_status() {
        let source = connected().await;
        let id = SourceId::new("1");

        let fetch = source.fetch(&id, span(1, 4));
        assert_eq!(source.status(&id, span(1, 4)), FetchStatus::Pending);
        drop(fetch);
        assert_eq!(source.status(&id, span(1, 4)), FetchStatus::NotFound);
    }

    #[tokio::test]
    async fn test_max_breakable_line() {
        let source = connected().await;
        assert_eq!(
            source.max_breakable_line(&SourceId::new("1")).await.unwrap(),
            Some(40)
        );
        // Falls back to the last line with hits.
        assert_eq!(
            source.max_breakable_line(&SourceId::new("3")).await.unwrap(),
            Some(17)
        );
        assert_eq!(
            source.max_breakable_line(&SourceId::new("2")).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_close_forgets_status() {
        let source = connected().await;
        let id = SourceId::new("1");
        source.fetch(&id, span(1, 4)).await.unwrap();

        source.close();
        assert!(!source.is_connected());
        assert_eq!(source.status(&id, span(1, 4)), FetchStatus::NotFound);
    }
}
