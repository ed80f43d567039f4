//! Coordinator statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the coordinator.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub(crate) requests: AtomicU64,
    pub(crate) coalesced: AtomicU64,
    pub(crate) skipped_pending: AtomicU64,
    pub(crate) already_resolved: AtomicU64,
    pub(crate) issued: AtomicU64,
    pub(crate) resolved: AtomicU64,
    pub(crate) failed: AtomicU64,
    pub(crate) stale: AtomicU64,
}

impl Counters {
    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, in_flight: usize) -> CoordinatorStats {
        CoordinatorStats {
            tile_requests: self.requests.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            skipped_pending: self.skipped_pending.load(Ordering::Relaxed),
            already_resolved: self.already_resolved.load(Ordering::Relaxed),
            fetches_issued: self.issued.load(Ordering::Relaxed),
            fetches_resolved: self.resolved.load(Ordering::Relaxed),
            fetches_failed: self.failed.load(Ordering::Relaxed),
            stale_discarded: self.stale.load(Ordering::Relaxed),
            in_flight,
        }
    }
}

/// Snapshot of coordinator activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    /// Tile requests seen by `maybe_fetch_tile`
    pub tile_requests: u64,
    /// Requests joined to a fetch already in flight
    pub coalesced: u64,
    /// Requests skipped because the tracker reported the tile pending
    pub skipped_pending: u64,
    /// Requests skipped because the tile was already resolved here
    pub already_resolved: u64,
    /// Fetches started
    pub fetches_issued: u64,
    /// Fetches whose data was stored
    pub fetches_resolved: u64,
    /// Fetches that failed and were reported
    pub fetches_failed: u64,
    /// Completions discarded because the source was reset meanwhile
    pub stale_discarded: u64,
    /// Fetches currently in flight
    pub in_flight: usize,
}

impl CoordinatorStats {
    /// Share of tile requests that did not start a fetch (0.0 to 1.0).
    pub fn dedup_ratio(&self) -> f64 {
        if self.tile_requests == 0 {
            0.0
        } else {
            self.tile_requests.saturating_sub(self.fetches_issued) as f64 / self.tile_requests as f64
        }
    }
}
