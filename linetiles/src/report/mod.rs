//! Failure reporting.
//!
//! The coordinator never surfaces fetch failures to its callers. It hands
//! them to an injected [`Reporter`] and moves on; the next request for the
//! same lines retries.
//!
//! - `TracingReporter`: logs through `tracing` at error level
//! - `NoOpReporter`: discards everything (tests, benchmarks)
//! - `FloodGateReporter`: wraps another reporter and mutes bursts
//!
//! ```
//! use linetiles::report::{FloodGateReporter, Reporter, TracingReporter};
//! use std::sync::Arc;
//!
//! let reporter: Arc<dyn Reporter> = Arc::new(FloodGateReporter::new(TracingReporter));
//! let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
//! reporter.report_failure("fetch 1-4", &err);
//! ```

mod flood_gate;
mod noop;
mod tracing_adapter;
mod r#trait;

pub use flood_gate::{FloodGateReporter, DEFAULT_FLOOD_WINDOW};
pub use noop::NoOpReporter;
pub use r#trait::Reporter;
pub use tracing_adapter::TracingReporter;
