//! Session manager: start, stop, toggle and busy tracking.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{Recording, SessionClient, SessionConfig, SessionError, SessionEvent};

/// Capacity of the lifecycle event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

struct ActiveSession {
    recording: Recording,
    client: Arc<dyn SessionClient>,
}

/// Shared busy counter.
struct BusyCounter {
    count: AtomicUsize,
    events: broadcast::Sender<SessionEvent>,
}

/// Marks the session busy while alive.
///
/// Obtained from [`SessionManager::busy`]. Dropping the last guard publishes
/// `SessionEvent::Busy(false)`.
pub struct BusyGuard {
    counter: Arc<BusyCounter>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if self.counter.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            let _ = self.counter.events.send(SessionEvent::Busy(false));
        }
    }
}

/// Owns the active sync session, if any.
///
/// At most one session is active at a time. The protocol client is handed in
/// per session and dropped when the session ends.
pub struct SessionManager {
    config: SessionConfig,
    active: Mutex<Option<ActiveSession>>,
    busy: Arc<BusyCounter>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    /// Creates a manager with no active session.
    pub fn new(config: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(DEFAULT_EVENT_CAPACITY);
        Self {
            config,
            active: Mutex::new(None),
            busy: Arc::new(BusyCounter {
                count: AtomicUsize::new(0),
                events: events.clone(),
            }),
            events,
        }
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether a recording is being synced.
    pub fn is_syncing(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Id of the recording being synced.
    pub fn sync_id(&self) -> Option<String> {
        self.active
            .lock()
            .as_ref()
            .map(|session| session.recording.id.clone())
    }

    /// The recording being synced.
    pub fn recording(&self) -> Option<Recording> {
        self.active
            .lock()
            .as_ref()
            .map(|session| session.recording.clone())
    }

    /// Whether any [`BusyGuard`] is alive.
    pub fn is_busy(&self) -> bool {
        self.busy.count.load(Ordering::Acquire) > 0
    }

    /// Mark the session busy until the returned guard drops.
    pub fn busy(&self) -> BusyGuard {
        if self.busy.count.fetch_add(1, Ordering::AcqRel) == 0 {
            self.emit(SessionEvent::Busy(true));
        }
        BusyGuard {
            counter: Arc::clone(&self.busy),
        }
    }

    /// Start syncing `recording` through `client`.
    ///
    /// Publishes `Started` before connecting. If the connection fails the
    /// session is torn down again (publishing `Stopped`) and the error is
    /// returned.
    ///
    /// # Errors
    ///
    /// - `SessionError::AlreadySyncing` if a session is active
    /// - `SessionError::MissingApiKey` if the client needs a key and none is set
    /// - `SessionError::Connect` if the client fails to open the session
    pub async fn start_sync(
        &self,
        recording: Recording,
        client: Arc<dyn SessionClient>,
    ) -> Result<(), SessionError> {
        let api_key = self.config.resolve_api_key();
        if client.requires_api_key() && api_key.is_none() {
            return Err(SessionError::MissingApiKey);
        }

        {
            let mut active = self.active.lock();
            if let Some(current) = active.as_ref() {
                return Err(SessionError::AlreadySyncing(current.recording.id.clone()));
            }
            *active = Some(ActiveSession {
                recording: recording.clone(),
                client: Arc::clone(&client),
            });
        }

        let _busy = self.busy();
        info!(recording_id = %recording.id, "Starting sync session");
        self.emit(SessionEvent::Started {
            recording_id: recording.id.clone(),
        });

        match client.connect(&recording.id, api_key.as_deref()).await {
            Ok(()) => {
                info!(
                    recording_id = %recording.id,
                    dispatch = %self.config.dispatch_address,
                    "Sync session connected"
                );
                Ok(())
            }
            Err(e) => {
                warn!(recording_id = %recording.id, error = %e, "Sync session failed to connect");
                self.end_session(&recording.id);
                Err(e)
            }
        }
    }

    /// Stop the active session.
    ///
    /// Returns the recording that was being synced, or `None` if idle.
    pub fn stop_sync(&self) -> Option<Recording> {
        let active = self.active.lock().take()?;
        info!(recording_id = %active.recording.id, "Stopping sync session");
        self.emit(SessionEvent::Stopped {
            recording_id: active.recording.id.clone(),
        });
        active.client.close();
        Some(active.recording)
    }

    /// Stop the active session, then start `recording` unless it was the one
    /// being synced.
    ///
    /// Returns whether `recording` is being synced afterwards.
    pub async fn toggle_sync(
        &self,
        recording: Recording,
        client: Arc<dyn SessionClient>,
    ) -> Result<bool, SessionError> {
        let was_syncing = self.sync_id().as_deref() == Some(recording.id.as_str());
        if self.is_syncing() {
            self.stop_sync();
        }
        if was_syncing {
            return Ok(false);
        }

        self.start_sync(recording, client).await?;
        Ok(true)
    }

    /// Tear down the session for `recording_id` if it is still the active one.
    fn end_session(&self, recording_id: &str) {
        let ended = {
            let mut active = self.active.lock();
            match active.as_ref() {
                Some(session) if session.recording.id == recording_id => active.take(),
                _ => None,
            }
        };

        if let Some(session) = ended {
            self.emit(SessionEvent::Stopped {
                recording_id: session.recording.id.clone(),
            });
            session.client.close();
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        if self.events.send(event.clone()).is_err() {
            debug!(event = ?event, "Session event dropped (no subscribers)");
        }
    }
}
