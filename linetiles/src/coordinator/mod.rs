//! Tiled range fetch coordinator.
//!
//! Callers ask for line ranges; the coordinator splits them into tiles and
//! issues at most one fetch per tile per source, merging results into a
//! per-source line mapping.
//!
//! # Architecture
//!
//! ```text
//! request_range(src, 1, 10)
//!        │
//!        ▼
//!   RangeTiler ──► [1-4] [5-8] [9-12]
//!                    │     │     │
//!                    ▼     ▼     ▼
//!               maybe_fetch_tile (per tile)
//!                    │
//!     in flight here? ──yes──► Coalesced
//!                    │no
//!     tracker status:  Pending ──► SkippedPending (unless a reset dropped it)
//!                      Resolved ─► refetch policy
//!                      NotFound ─► Issued ──► spawned fetch task
//!                                                   │
//!                    ┌──────────────────────────────┘
//!                    ▼
//!     complete: generation matches? ──no──► discard
//!                    │yes
//!               Ok ──► merge lines, mark resolved
//!               Err ─► Reporter, lines stay unresolved
//! ```
//!
//! # Concurrency
//!
//! All mutable state sits behind one `parking_lot::Mutex` that is never held
//! across an `.await`. The number of outstanding fetches is published on a
//! `tokio::sync::watch` channel so [`FetchCoordinator::wait_until_settled`]
//! can await it. Each source carries a generation counter and a
//! `CancellationToken`; `reset` bumps the former and cancels the latter.

mod config;
mod fetch;
mod registry;
mod stats;

pub use config::{CoordinatorConfig, RefetchPolicy, UnknownPolicy};
pub use fetch::{FetchCoordinator, FetchDecision};
pub use stats::CoordinatorStats;
