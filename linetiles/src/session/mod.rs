//! Sync session lifecycle.
//!
//! A sync session mirrors one recording into the editor. The
//! [`SessionManager`] owns the session's protocol client (one per session,
//! never a process-wide singleton), tracks whether work is in progress and
//! publishes lifecycle events on a broadcast channel.
//!
//! # Events
//!
//! ```text
//! start_sync ──► Started ──► client.connect ──┬─► (ok)  session active
//!                                             └─► (err) Stopped, error returned
//! stop_sync  ──► Stopped ──► client.close
//! busy guard ──► Busy(true) on first holder, Busy(false) when the last drops
//! ```
//!
//! The fetch coordinator subscribes to these events and discards its cached
//! per-source data whenever a session starts or stops.

mod config;
mod manager;

pub use config::{SessionConfig, API_KEY_ENV_VAR, DEFAULT_DISPATCH_ADDRESS};
pub use manager::{BusyGuard, SessionManager, DEFAULT_EVENT_CAPACITY};

use thiserror::Error;

use crate::source::BoxFuture;

/// A recording that can be synced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    /// Recording id on the replay service
    pub id: String,
    /// Human-readable title, if the recording has one
    pub title: Option<String>,
}

impl Recording {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Lifecycle notifications published by the [`SessionManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session for this recording is starting.
    Started { recording_id: String },
    /// The session for this recording ended.
    Stopped { recording_id: String },
    /// Busy state changed.
    Busy(bool),
}

/// Errors from session lifecycle operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// `start_sync` was called while another session was active.
    #[error("Already syncing recording {0}")]
    AlreadySyncing(String),

    /// The client needs an API key but none is configured.
    #[error("No API key configured (set {} or session.api_key)", API_KEY_ENV_VAR)]
    MissingApiKey,

    /// The client failed to open the session.
    #[error("Failed to connect: {0}")]
    Connect(String),
}

/// Protocol client for one sync session.
///
/// The remote protocol itself is outside this crate; implementations wrap
/// whatever client library talks to the replay service.
pub trait SessionClient: Send + Sync {
    /// Open a session for the recording.
    fn connect<'a>(
        &'a self,
        recording_id: &'a str,
        api_key: Option<&'a str>,
    ) -> BoxFuture<'a, Result<(), SessionError>>;

    /// Close the session. Must not fail.
    fn close(&self);

    /// Whether `connect` needs an API key.
    fn requires_api_key(&self) -> bool {
        true
    }
}
