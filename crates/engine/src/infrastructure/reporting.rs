//! Error reporting.
//!
//! Recoverable errors are logged by severity and swallowed; non-recoverable
//! errors are logged and then handed back to the caller to propagate.

use std::cell::RefCell;

use gamelab_domain::{ErrorSeverity, GameError};

use crate::infrastructure::ports::ErrorReporter;

/// Reports through `tracing`, routing by severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &GameError) {
        log_error(error);
    }
}

/// Log `error` at the level matching its severity.
pub fn log_error(error: &GameError) {
    let kind = error.kind();
    let category = error.category();
    let recoverable = error.is_recoverable();
    match error.severity() {
        ErrorSeverity::Critical | ErrorSeverity::High => {
            tracing::error!(%category, recoverable, "[{}] {}", kind, error)
        }
        ErrorSeverity::Medium => {
            tracing::warn!(%category, recoverable, "[{}] {}", kind, error)
        }
        ErrorSeverity::Low => {
            tracing::info!(%category, recoverable, "[{}] {}", kind, error)
        }
    }
}

/// Keeps every reported error, for shells that surface them and for tests.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    reports: RefCell<Vec<GameError>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<GameError> {
        self.reports.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.reports.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.borrow().is_empty()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, error: &GameError) {
        log_error(error);
        self.reports.borrow_mut().push(error.clone());
    }
}

/// Report `error`, then return it if execution must not continue.
pub fn escalate(reporter: &dyn ErrorReporter, error: GameError) -> Result<(), GameError> {
    reporter.report(&error);
    if error.is_recoverable() {
        Ok(())
    } else {
        Err(error)
    }
}

/// Run a teardown step; a failure becomes a logged cleanup error.
pub fn safe_cleanup<F>(target: &str, step: F)
where
    F: FnOnce() -> Result<(), GameError>,
{
    if let Err(err) = step() {
        log_error(&GameError::cleanup(target, err.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockErrorReporter;

    #[test]
    fn test_escalate_swallows_recoverable_errors() {
        let mut reporter = MockErrorReporter::new();
        reporter.expect_report().times(1).return_const(());

        let result = escalate(&reporter, GameError::validation("settings must be an object"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_escalate_returns_fatal_errors_after_reporting() {
        let mut reporter = MockErrorReporter::new();
        reporter
            .expect_report()
            .withf(|err| matches!(err, GameError::Initialization(_)))
            .times(1)
            .return_const(());

        let result = escalate(&reporter, GameError::initialization("no surface"));
        assert_eq!(result, Err(GameError::initialization("no surface")));
    }

    #[test]
    fn test_recording_reporter_keeps_reports() {
        let reporter = RecordingReporter::new();
        assert!(reporter.is_empty());
        reporter.report(&GameError::storage("quota"));
        assert_eq!(reporter.len(), 1);
        assert_eq!(reporter.reports()[0], GameError::storage("quota"));
    }

    #[test]
    fn test_safe_cleanup_runs_step() {
        let mut ran = false;
        safe_cleanup("hud", || {
            ran = true;
            Err(GameError::validation("component refused"))
        });
        assert!(ran);
    }
}
