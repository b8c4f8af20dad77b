//! Unified error types for the game lifecycle runtime
//!
//! Every failure the runtime can observe is a [`GameError`]. Each variant carries
//! a fixed severity, a category, and a recoverability flag; the engine decides
//! whether to log-and-continue or to propagate based on those three properties.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How loudly an error is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Low => write!(f, "low"),
            ErrorSeverity::Medium => write!(f, "medium"),
            ErrorSeverity::High => write!(f, "high"),
            ErrorSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Which part of the runtime an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Initialization,
    StateManagement,
    Validation,
    Event,
    Cleanup,
    Audio,
    Storage,
    Lifecycle,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Initialization => write!(f, "initialization"),
            ErrorCategory::StateManagement => write!(f, "state_management"),
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Event => write!(f, "event"),
            ErrorCategory::Cleanup => write!(f, "cleanup"),
            ErrorCategory::Audio => write!(f, "audio"),
            ErrorCategory::Storage => write!(f, "storage"),
            ErrorCategory::Lifecycle => write!(f, "lifecycle"),
        }
    }
}

/// Unified error type for runtime operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GameError {
    /// A collaborator could not be set up; construction aborts
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// A phase name outside the known set, or a transition that could not be recorded
    #[error("Invalid state{}: {message}", .state.as_deref().map(|s| format!(" '{s}'")).unwrap_or_default())]
    State {
        message: String,
        state: Option<String>,
    },

    /// A value failed validation (e.g. game settings that are not an object)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A phase hook or event handler failed
    #[error("Handler for {event} failed: {message}")]
    Event {
        event: String,
        message: String,
        recoverable: bool,
    },

    /// Tearing a component down failed
    #[error("Cleanup of {target} failed: {message}")]
    Cleanup { target: String, message: String },

    /// The audio collaborator rejected a request
    #[error("Audio error{}: {message}", .sound_key.as_deref().map(|k| format!(" for '{k}'")).unwrap_or_default())]
    Audio {
        message: String,
        sound_key: Option<String>,
    },

    /// Loading or saving user preferences failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// An operation was invoked after teardown
    #[error("{component} has already been destroyed")]
    AlreadyDestroyed { component: &'static str },
}

impl GameError {
    /// Create an initialization error. These are always fatal.
    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    /// Create a state error, optionally naming the offending state.
    pub fn state(msg: impl Into<String>, state: Option<&str>) -> Self {
        Self::State {
            message: msg.into(),
            state: state.map(str::to_string),
        }
    }

    /// Creates a validation error for rejected input.
    ///
    /// # Example
    /// ```ignore
    /// if !value.is_object() {
    ///     return Err(GameError::validation("game settings must be an object"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a recoverable event error.
    pub fn event(event: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Event {
            event: event.into(),
            message: msg.into(),
            recoverable: true,
        }
    }

    /// Create an event error that must unwind through the triggering call.
    pub fn fatal_event(event: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Event {
            event: event.into(),
            message: msg.into(),
            recoverable: false,
        }
    }

    /// Wrap a failure raised while handling `event`.
    ///
    /// The wrapper inherits recoverability from the source, so a hook can
    /// escalate by returning a non-recoverable error.
    pub fn handler_failed(event: impl Into<String>, source: &GameError) -> Self {
        Self::Event {
            event: event.into(),
            message: source.to_string(),
            recoverable: source.is_recoverable(),
        }
    }

    /// Create a cleanup error.
    pub fn cleanup(target: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Cleanup {
            target: target.into(),
            message: msg.into(),
        }
    }

    /// Create an audio error.
    pub fn audio(msg: impl Into<String>, sound_key: Option<&str>) -> Self {
        Self::Audio {
            message: msg.into(),
            sound_key: sound_key.map(str::to_string),
        }
    }

    /// Create a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a post-teardown error for `component`.
    pub fn already_destroyed(component: &'static str) -> Self {
        Self::AlreadyDestroyed { component }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Initialization(_) | Self::State { .. } => ErrorSeverity::High,
            Self::Validation(_) => ErrorSeverity::Medium,
            Self::Event { recoverable, .. } => {
                if *recoverable {
                    ErrorSeverity::Medium
                } else {
                    ErrorSeverity::Critical
                }
            }
            Self::Cleanup { .. }
            | Self::Audio { .. }
            | Self::Storage(_)
            | Self::AlreadyDestroyed { .. } => ErrorSeverity::Low,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Initialization(_) => ErrorCategory::Initialization,
            Self::State { .. } => ErrorCategory::StateManagement,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Event { .. } => ErrorCategory::Event,
            Self::Cleanup { .. } => ErrorCategory::Cleanup,
            Self::Audio { .. } => ErrorCategory::Audio,
            Self::Storage(_) => ErrorCategory::Storage,
            Self::AlreadyDestroyed { .. } => ErrorCategory::Lifecycle,
        }
    }

    /// Whether execution may continue after this error has been reported.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Initialization(_) => false,
            Self::Event { recoverable, .. } => *recoverable,
            _ => true,
        }
    }

    /// Short kind name used as a log prefix.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Initialization(_) => "InitializationError",
            Self::State { .. } => "StateError",
            Self::Validation(_) => "ValidationError",
            Self::Event { .. } => "EventError",
            Self::Cleanup { .. } => "CleanupError",
            Self::Audio { .. } => "AudioError",
            Self::Storage(_) => "StorageError",
            Self::AlreadyDestroyed { .. } => "LifecycleError",
        }
    }
}
