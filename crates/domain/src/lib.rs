//! Game Lab Domain
//!
//! Pure types shared by every game built on the lifecycle runtime: phases and
//! their bounded history, game data, the event taxonomy with its payload
//! normalization rules, and the error model. Nothing here performs I/O or
//! reads the clock; callers pass `now` in.

pub mod error;
pub mod events;
pub mod game_data;
pub mod ledger;
pub mod lifecycle;
pub mod phase;
pub mod settings;

pub use error::{ErrorCategory, ErrorSeverity, GameError};
pub use events::{
    normalize_game_end, normalize_round_completed, GameEndOutcome, GameEndPayload, GameEvent,
    GameEventKind, RoundCompletedPayload, Transition,
};
pub use game_data::{GameData, SessionData};
pub use ledger::{PhaseLedger, MAX_PHASE_HISTORY};
pub use lifecycle::Lifecycle;
pub use phase::{Phase, PhaseHistoryEntry};
pub use settings::GameSettings;
