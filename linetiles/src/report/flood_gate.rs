//! Flood-gated reporter decorator.
//!
//! Two reports arriving less than one window apart close the gate. While
//! closed, reports are counted but not forwarded; the first muted report is
//! announced once. The gate lifts on the first report after the window
//! elapses, logging how many reports were muted.

use std::error::Error;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{info, warn};

use super::Reporter;

/// Minimum spacing between forwarded reports before the gate closes.
pub const DEFAULT_FLOOD_WINDOW: Duration = Duration::from_secs(2);

#[derive(Debug, Default)]
struct GateState {
    last_report: Option<Instant>,
    closed_until: Option<Instant>,
    muted: u64,
    announced: bool,
}

/// Wraps a reporter and mutes error floods.
pub struct FloodGateReporter<R> {
    inner: R,
    window: Duration,
    state: Mutex<GateState>,
}

impl<R: Reporter> FloodGateReporter<R> {
    pub fn new(inner: R) -> Self {
        Self::with_window(inner, DEFAULT_FLOOD_WINDOW)
    }

    pub fn with_window(inner: R, window: Duration) -> Self {
        Self {
            inner,
            window,
            state: Mutex::new(GateState::default()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether the gate is currently closed.
    pub fn is_closed(&self) -> bool {
        self.state
            .lock()
            .closed_until
            .is_some_and(|until| Instant::now() < until)
    }

    /// Reports muted since the gate last closed.
    pub fn muted_count(&self) -> u64 {
        self.state.lock().muted
    }

    fn report_at(&self, now: Instant, context: &str, error: &(dyn Error + 'static)) {
        {
            let mut state = self.state.lock();

            if let Some(until) = state.closed_until {
                if now < until {
                    state.muted += 1;
                    if !state.announced {
                        state.announced = true;
                        warn!(
                            window_ms = self.window.as_millis() as u64,
                            "Reporting muted due to possible error flood"
                        );
                    }
                    return;
                }

                if state.muted > 0 {
                    info!(
                        muted = state.muted,
                        window_ms = self.window.as_millis() as u64,
                        "Flood gate lifted"
                    );
                }
                state.closed_until = None;
                state.muted = 0;
                state.announced = false;
            }

            let flooding = state
                .last_report
                .is_some_and(|last| now.saturating_duration_since(last) < self.window);
            if flooding {
                state.closed_until = Some(now + self.window);
            }
            state.last_report = Some(now);
        }

        self.inner.report_failure(context, error);
    }
}

impl<R: Reporter> Reporter for FloodGateReporter<R> {
    fn report_failure(&self, context: &str, error: &(dyn Error + 'static)) {
        self.report_at(Instant::now(), context, error);
    }
}
