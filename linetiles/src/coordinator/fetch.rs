//! The fetch coordinator.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::registry::InFlightRegistry;
use super::stats::{CoordinatorStats, Counters};
use super::{CoordinatorConfig, RefetchPolicy};
use crate::report::Reporter;
use crate::session::SessionEvent;
use crate::source::{FetchError, FetchStatus, LineEntries, MetadataSource, SourceId};
use crate::tile::{LineSpan, RangeTiler, TileError};

/// Outcome of a single tile request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDecision {
    /// A fetch was started.
    Issued,
    /// A fetch for this tile is already in flight here.
    Coalesced,
    /// The status tracker reports the tile pending elsewhere.
    SkippedPending,
    /// The tile is resolved and the refetch policy says to keep it.
    AlreadyResolved,
    /// No Tokio runtime is running on this thread; nothing was issued.
    NoRuntime,
}

impl FetchDecision {
    pub fn is_issued(&self) -> bool {
        matches!(self, Self::Issued)
    }
}

/// Per-source mapping and bookkeeping.
struct SourceLines<M> {
    /// Bumped by every reset; completions from older generations are dropped.
    generation: u64,
    lines: HashMap<u32, M>,
    resolved: HashSet<LineSpan>,
    /// Spans whose fetch was dropped by a reset and has not finished yet,
    /// with the number of such fetches. The tracker may still report these
    /// pending on behalf of the dropped fetch.
    cancelled: HashMap<LineSpan, usize>,
    cancel: CancellationToken,
}

impl<M> SourceLines<M> {
    fn new() -> Self {
        Self {
            generation: 0,
            lines: HashMap::new(),
            resolved: HashSet::new(),
            cancelled: HashMap::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Forget all data and cancel fetches of the current generation.
    ///
    /// `dropped` are the spans that had a fetch in flight.
    fn reset(&mut self, dropped: Vec<LineSpan>) {
        self.generation += 1;
        self.lines.clear();
        self.resolved.clear();
        for span in dropped {
            *self.cancelled.entry(span).or_default() += 1;
        }
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
    }

    /// A fetch from an older generation finished.
    fn cancelled_finished(&mut self, span: LineSpan) {
        if let Some(count) = self.cancelled.get_mut(&span) {
            *count -= 1;
            if *count == 0 {
                self.cancelled.remove(&span);
            }
        }
    }
}

struct State<M> {
    sources: HashMap<SourceId, SourceLines<M>>,
    in_flight: InFlightRegistry,
}

struct Inner<S: MetadataSource> {
    source: Arc<S>,
    reporter: Arc<dyn Reporter>,
    tiler: RangeTiler,
    refetch: RefetchPolicy,
    state: Mutex<State<S::Metadata>>,
    outstanding: watch::Sender<usize>,
    counters: Counters,
}

/// Decrements the outstanding count when a fetch task ends, even on panic.
struct OutstandingGuard<'a>(&'a watch::Sender<usize>);

impl Drop for OutstandingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|count| *count = count.saturating_sub(1));
    }
}

/// Fetches per-line metadata in tiles and caches it per source.
///
/// Cloning is cheap; clones share state. Requests are fire-and-forget: they
/// spawn fetch tasks on the current Tokio runtime and return immediately.
/// Results become visible through [`get_metadata`](Self::get_metadata).
///
/// # Guarantees
///
/// - At most one fetch per tile per source is in flight at any time
/// - Stored metadata stays until [`reset`](Self::reset) or
///   [`reset_all`](Self::reset_all)
/// - A fetch that completes after a reset of its source writes nothing
pub struct FetchCoordinator<S: MetadataSource> {
    inner: Arc<Inner<S>>,
}

impl<S: MetadataSource> Clone for FetchCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: MetadataSource> FetchCoordinator<S> {
    /// Creates a coordinator.
    ///
    /// # Errors
    ///
    /// Returns `TileError::InvalidTileSize` if the configured tile size is 0.
    pub fn new(
        config: CoordinatorConfig,
        source: Arc<S>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self, TileError> {
        let tiler = RangeTiler::new(config.tile_size)?;
        let (outstanding, _) = watch::channel(0);

        Ok(Self {
            inner: Arc::new(Inner {
                source,
                reporter,
                tiler,
                refetch: config.refetch,
                state: Mutex::new(State {
                    sources: HashMap::new(),
                    in_flight: InFlightRegistry::default(),
                }),
                outstanding,
                counters: Counters::default(),
            }),
        })
    }

    pub fn source(&self) -> &Arc<S> {
        &self.inner.source
    }

    pub fn tiler(&self) -> RangeTiler {
        self.inner.tiler
    }

    pub fn refetch_policy(&self) -> RefetchPolicy {
        self.inner.refetch
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Make sure data for lines `from..=to` is fetched or being fetched.
    ///
    /// Fetches are spawned on the current Tokio runtime; outside of one
    /// nothing is fetched.
    ///
    /// # Errors
    ///
    /// `TileError::InvalidLine` if `from < 1`, `TileError::InvalidRange` if
    /// `to < from`. Nothing is fetched in either case.
    pub fn request_range(&self, source: &SourceId, from: u32, to: u32) -> Result<(), TileError> {
        let tiles = self.inner.tiler.tiles_covering(from, to)?;
        debug!(source = %source, from, to, tiles = tiles.len(), "Range requested");

        for (_, span) in tiles {
            self.maybe_fetch_tile(source, span);
        }
        Ok(())
    }

    /// Fetch one tile unless it is in flight, pending or already resolved.
    ///
    /// A tracker reporting `Pending` only because of a fetch dropped by
    /// [`reset`](Self::reset) does not hold the tile back.
    pub fn maybe_fetch_tile(&self, source: &SourceId, span: LineSpan) -> FetchDecision {
        let inner = &self.inner;
        let Ok(runtime) = Handle::try_current() else {
            warn!(source = %source, span = %span, "No Tokio runtime, tile not fetched");
            return FetchDecision::NoRuntime;
        };
        Counters::bump(&inner.counters.requests);

        let status = inner.source.status(source, span);

        let (generation, cancel) = {
            let mut state = inner.state.lock();
            if state.in_flight.contains(source, span) {
                Counters::bump(&inner.counters.coalesced);
                debug!(source = %source, span = %span, "Tile already in flight");
                return FetchDecision::Coalesced;
            }

            let lines = state
                .sources
                .entry(source.clone())
                .or_insert_with(SourceLines::new);

            match status {
                FetchStatus::Pending if !lines.cancelled.contains_key(&span) => {
                    Counters::bump(&inner.counters.skipped_pending);
                    return FetchDecision::SkippedPending;
                }
                FetchStatus::Resolved
                    if inner.refetch == RefetchPolicy::MissingOnly
                        && lines.resolved.contains(&span) =>
                {
                    Counters::bump(&inner.counters.already_resolved);
                    return FetchDecision::AlreadyResolved;
                }
                FetchStatus::Pending | FetchStatus::Resolved | FetchStatus::NotFound => {}
            }

            let generation = lines.generation;
            let cancel = lines.cancel.clone();
            state.in_flight.register(source, span, generation);
            (generation, cancel)
        };

        Counters::bump(&inner.counters.issued);
        debug!(source = %source, span = %span, generation, status = %status, "Fetching tile");
        self.spawn_fetch(&runtime, source.clone(), span, generation, cancel);
        FetchDecision::Issued
    }

    fn spawn_fetch(
        &self,
        runtime: &Handle,
        source: SourceId,
        span: LineSpan,
        generation: u64,
        cancel: CancellationToken,
    ) {
        self.inner.outstanding.send_modify(|count| *count += 1);
        let inner = Arc::clone(&self.inner);

        runtime.spawn(async move {
            let _outstanding = OutstandingGuard(&inner.outstanding);

            let result = tokio::select! {
                biased;

                _ = cancel.cancelled() => None,

                result = inner.source.fetch(&source, span) => Some(result),
            };

            inner.complete(&source, span, generation, result);
        });
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Metadata stored for `line`, if any.
    pub fn get_metadata(&self, source: &SourceId, line: u32) -> Option<S::Metadata> {
        self.inner
            .state
            .lock()
            .sources
            .get(source)?
            .lines
            .get(&line)
            .cloned()
    }

    /// Whether data for `line` is being fetched.
    ///
    /// True if this coordinator has a fetch covering the line in flight, or
    /// the status tracker reports the line pending.
    pub fn is_pending(&self, source: &SourceId, line: u32) -> bool {
        let Ok(span) = LineSpan::single(line) else {
            return false;
        };
        if self.inner.state.lock().in_flight.covers_line(source, line) {
            return true;
        }
        self.inner.source.status(source, span) == FetchStatus::Pending
    }

    /// All stored lines of `source`, sorted by line.
    pub fn lines(&self, source: &SourceId) -> LineEntries<S::Metadata> {
        let state = self.inner.state.lock();
        let mut lines: Vec<_> = state
            .sources
            .get(source)
            .map(|entry| {
                entry
                    .lines
                    .iter()
                    .map(|(line, metadata)| (*line, metadata.clone()))
                    .collect()
            })
            .unwrap_or_default();
        lines.sort_unstable_by_key(|(line, _)| *line);
        lines
    }

    /// Number of fetch tasks that have not finished.
    pub fn outstanding_fetches(&self) -> usize {
        *self.inner.outstanding.borrow()
    }

    /// Resolves once no fetch is outstanding.
    ///
    /// Fetches issued while waiting extend the wait.
    pub async fn wait_until_settled(&self) {
        let mut rx = self.inner.outstanding.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|count| *count == 0).await;
    }

    // =========================================================================
    // Resets
    // =========================================================================

    /// Discard everything known about `source` and cancel its fetches.
    pub fn reset(&self, source: &SourceId) {
        let mut state = self.inner.state.lock();
        let dropped = state.in_flight.drop_source(source);
        let cancelled = dropped.len();
        if let Some(lines) = state.sources.get_mut(source) {
            lines.reset(dropped);
            debug!(
                source = %source,
                generation = lines.generation,
                cancelled,
                "Source reset"
            );
        }
    }

    /// Reset every source.
    pub fn reset_all(&self) {
        let mut state = self.inner.state.lock();
        let mut dropped = state.in_flight.clear();
        let cancelled: usize = dropped.values().map(Vec::len).sum();
        for (source, lines) in state.sources.iter_mut() {
            lines.reset(dropped.remove(source).unwrap_or_default());
        }
        info!(
            sources = state.sources.len(),
            cancelled,
            "All sources reset"
        );
    }

    /// Forget which tiles overlapping `from..=to` were resolved, so the next
    /// request fetches them again. Stored metadata is kept until replaced.
    pub fn invalidate(&self, source: &SourceId, from: u32, to: u32) -> Result<(), TileError> {
        let range = LineSpan::new(from, to)?;
        let mut state = self.inner.state.lock();
        if let Some(lines) = state.sources.get_mut(source) {
            lines
                .resolved
                .retain(|span| span.end < range.start || span.start > range.end);
        }
        Ok(())
    }

    /// Reset all sources whenever a sync session starts or stops.
    ///
    /// Runs until `shutdown` is cancelled or the event channel closes. A
    /// lagged receiver also resets, since events were missed.
    pub async fn follow_session(
        &self,
        mut events: broadcast::Receiver<SessionEvent>,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    debug!("Session follower shutting down");
                    break;
                }

                event = events.recv() => {
                    match event {
                        Ok(SessionEvent::Started { recording_id })
                        | Ok(SessionEvent::Stopped { recording_id }) => {
                            info!(recording_id = %recording_id, "Session changed, resetting sources");
                            self.reset_all();
                        }
                        Ok(SessionEvent::Busy(_)) => {}
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            warn!(missed, "Session events lagged, resetting sources");
                            self.reset_all();
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    pub fn stats(&self) -> CoordinatorStats {
        let in_flight = self.inner.state.lock().in_flight.len();
        self.inner.counters.snapshot(in_flight)
    }

    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            tile_requests = stats.tile_requests,
            coalesced = stats.coalesced,
            skipped_pending = stats.skipped_pending,
            already_resolved = stats.already_resolved,
            issued = stats.fetches_issued,
            resolved = stats.fetches_resolved,
            failed = stats.fetches_failed,
            stale = stats.stale_discarded,
            in_flight = stats.in_flight,
            dedup_ratio = format!("{:.1}%", stats.dedup_ratio() * 100.0),
            "Fetch coordinator statistics"
        );
    }
}

impl<S: MetadataSource> Inner<S> {
    /// Apply a finished fetch. `None` means it was cancelled.
    fn complete(
        &self,
        source: &SourceId,
        span: LineSpan,
        generation: u64,
        result: Option<Result<LineEntries<S::Metadata>, FetchError>>,
    ) {
        let failure = {
            let mut state = self.state.lock();
            state.in_flight.complete(source, span, generation);

            let Some(lines) = state.sources.get_mut(source) else {
                Counters::bump(&self.counters.stale);
                return;
            };
            if lines.generation != generation {
                lines.cancelled_finished(span);
                Counters::bump(&self.counters.stale);
                debug!(source = %source, span = %span, generation, "Discarding stale fetch");
                return;
            }

            match result {
                None => {
                    debug!(source = %source, span = %span, "Fetch cancelled");
                    None
                }
                Some(Ok(entries)) => {
                    let count = entries.len();
                    lines.lines.extend(entries);
                    lines.resolved.insert(span);
                    Counters::bump(&self.counters.resolved);
                    debug!(source = %source, span = %span, lines = count, "Tile resolved");
                    None
                }
                Some(Err(e)) => {
                    Counters::bump(&self.counters.failed);
                    Some(e)
                }
            }
        };

        if let Some(e) = failure {
            warn!(source = %source, span = %span, error = %e, "Tile fetch failed");
            let context = format!("fetching lines {} of source {}", span, source);
            self.reporter.report_failure(&context, &e);
        }
    }
}
