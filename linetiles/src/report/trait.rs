//! Reporter trait definition.

use std::error::Error;
use std::sync::Arc;

/// Receives failures that have no caller to return to.
///
/// # Thread Safety
///
/// Reports arrive from spawned fetch tasks, so implementations must be
/// `Send + Sync`. They must not panic.
pub trait Reporter: Send + Sync {
    /// Report a failure. `context` names the operation that failed.
    fn report_failure(&self, context: &str, error: &(dyn Error + 'static));
}

impl<R: Reporter + ?Sized> Reporter for Arc<R> {
    fn report_failure(&self, context: &str, error: &(dyn Error + 'static)) {
        (**self).report_failure(context, error);
    }
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn report_failure(&self, context: &str, error: &(dyn Error + 'static)) {
        (**self).report_failure(context, error);
    }
}
