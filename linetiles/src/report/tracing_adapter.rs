//! Tracing library adapter.

use std::error::Error;

use tracing::error;

use super::Reporter;

/// Reporter that logs failures through `tracing` at error level.
///
/// The error's source chain is flattened into the `cause` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report_failure(&self, context: &str, err: &(dyn Error + 'static)) {
        let cause = error_chain(err);
        error!(context, error = %err, cause = %cause, "Operation failed");
    }
}

/// `outer: inner: innermost` rendering of an error's source chain.
fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut chain = Vec::new();
    let mut current = err.source();
    while let Some(cause) = current {
        chain.push(cause.to_string());
        current = cause.source();
    }
    chain.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("outer")
        }
    }

    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_error_chain() {
        let err = Outer(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(error_chain(&err), "disk");
    }

    #[test]
    fn test_report_without_subscriber() {
        let err = std::fmt::Error;
        TracingReporter.report_failure("fetch", &err);
    }
}
