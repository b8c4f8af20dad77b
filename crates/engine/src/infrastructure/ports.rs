//! Testability ports for injecting time and error reporting.

use chrono::{DateTime, Utc};
use gamelab_domain::GameError;

// =============================================================================
// Testability Ports
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort {
    fn now(&self) -> DateTime<Utc>;
}

/// Sink for errors that were caught and are being reported rather than propagated.
#[cfg_attr(test, mockall::automock)]
pub trait ErrorReporter {
    fn report(&self, error: &GameError);
}
