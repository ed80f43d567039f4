//! linetiles - per-line execution data for editor gutters
//!
//! Fetches hit counts (or any per-line metadata) of a recorded run in
//! fixed-size tiles, deduplicates overlapping requests and tracks which lines
//! are still being fetched, so an editor can decorate the visible part of a
//! file while the user scrolls.
//!
//! # High-Level API
//!
//! ```ignore
//! use linetiles::coordinator::{CoordinatorConfig, FetchCoordinator};
//! use linetiles::report::TracingReporter;
//! use linetiles::source::{RecordedSource, SourceId};
//!
//! let source = Arc::new(RecordedSource::from_file(path)?);
//! let coordinator = FetchCoordinator::new(
//!     CoordinatorConfig::default(),
//!     source,
//!     Arc::new(TracingReporter),
//! )?;
//!
//! coordinator.request_range(&SourceId::new("1"), 1, 40)?;
//! coordinator.wait_until_settled().await;
//! let hits = coordinator.get_metadata(&SourceId::new("1"), 12);
//! ```

pub mod config;
pub mod coordinator;
pub mod gutter;
pub mod logging;
pub mod report;
pub mod session;
pub mod source;
pub mod tile;

/// Version of the linetiles library and CLI.
///
/// Synchronized across the workspace; injected from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
