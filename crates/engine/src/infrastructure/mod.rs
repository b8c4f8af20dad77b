//! Infrastructure: clock, configuration, error reporting

pub mod clock;
pub mod config;
pub mod ports;
pub mod reporting;

pub use clock::{FixedClock, SystemClock};
pub use config::RuntimeConfig;
pub use ports::{ClockPort, ErrorReporter};
pub use reporting::{escalate, log_error, safe_cleanup, RecordingReporter, TracingReporter};
