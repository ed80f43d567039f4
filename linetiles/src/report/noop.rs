//! No-operation reporter.

use std::error::Error;

use super::Reporter;

/// A reporter that discards every failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReporter;

impl Reporter for NoOpReporter {
    #[inline]
    fn report_failure(&self, _context: &str, _error: &(dyn Error + 'static)) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_noop_reporter_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NoOpReporter>();
    }

    #[test]
    fn test_noop_reporter_as_trait_object() {
        let reporter: Arc<dyn Reporter> = Arc::new(NoOpReporter);
        let err = std::fmt::Error;
        reporter.report_failure("test", &err);
    }
}
