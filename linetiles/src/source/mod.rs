//! Collaborator contracts for per-line metadata.
//!
//! The coordinator never talks to the recording service directly. It asks an
//! injected [`MetadataSource`] two questions: "what is the fetch status of
//! these lines?" and "fetch these lines for me". The real implementation is
//! a remote protocol client owned by the sync session; [`RecordedSource`]
//! answers from a JSON dump of a recorded run.
//!
//! # Design
//!
//! - **Dyn-compatible**: async methods return [`BoxFuture`] so sources can be
//!   shared as `Arc<dyn ...>` wrappers where needed
//! - **Opaque metadata**: the coordinator only clones and stores values
//! - **Status is external**: the source owns its own notion of pending and
//!   resolved ranges; the coordinator consults it before fetching

mod descriptor;
mod hits;
mod recorded;

pub use descriptor::{editor_sources, SourceDescriptor, INTERNAL_URL_PREFIX};
pub use hits::HitCount;
pub use recorded::{DumpError, RecordedFile, RecordedSource, RecordingDump};

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

use crate::tile::LineSpan;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// `(line, metadata)` pairs returned by a fetch.
pub type LineEntries<M> = Vec<(u32, M)>;

/// Identifies one source file of a recording.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(String);

impl SourceId {
    /// Creates a source id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Fetch status of a line range, as reported by the metadata source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStatus {
    /// Nothing is known about the range.
    NotFound,
    /// A fetch covering the range is in flight.
    Pending,
    /// Data for the range has been fetched.
    Resolved,
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchStatus::NotFound => "not-found",
            FetchStatus::Pending => "pending",
            FetchStatus::Resolved => "resolved",
        };
        f.write_str(name)
    }
}

/// Errors returned by an asynchronous fetch.
///
/// These never propagate to the caller of `request_range`; the coordinator
/// reports them and leaves the lines unresolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// No sync session is connected.
    #[error("No session connected")]
    NotConnected,

    /// The recording has no source with this id.
    #[error("Unknown source: {0}")]
    UnknownSource(SourceId),

    /// The remote side did not answer in time.
    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    /// The remote side answered with an error.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Provider of per-line metadata and of its fetch status.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: fetches run on spawned Tokio tasks
/// while status queries come from the caller's task.
pub trait MetadataSource: Send + Sync + 'static {
    /// Value stored per line.
    type Metadata: Clone + Send + Sync + 'static;

    /// Current fetch status of `span` for `source`.
    ///
    /// Must be cheap and non-blocking; it is called on every tile request.
    fn status(&self, source: &SourceId, span: LineSpan) -> FetchStatus;

    /// Fetch the metadata for `span`.
    ///
    /// Lines without data are simply absent from the result.
    fn fetch(
        &self,
        source: &SourceId,
        span: LineSpan,
    ) -> BoxFuture<'_, Result<LineEntries<Self::Metadata>, FetchError>>;

    /// Highest line the recording can answer for, if known.
    ///
    /// Ranges past this line never resolve upstream, so callers clamp their
    /// requests to it.
    fn max_breakable_line(
        &self,
        _source: &SourceId,
    ) -> BoxFuture<'_, Result<Option<u32>, FetchError>> {
        Box::pin(async { Ok(None) })
    }
}
