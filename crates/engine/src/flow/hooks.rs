//! Game-specific phase-entry operations.

use gamelab_domain::{GameError, SessionData};
use serde_json::{Map, Value};

use crate::flow::gameflow::Gameflow;

/// What a concrete game does when the flow enters each phase.
///
/// The flow controller supplies dispatch only. Entering `INIT` shows the
/// scene's start screen; every other phase calls one of these. A returned
/// error is reported and the game stays in the phase it just entered,
/// unless the error is non-recoverable, in which case it unwinds out of the
/// `emit` that triggered the transition.
pub trait GameHooks: Sized + 'static {
    type Session: SessionData + 'static;

    fn start_game(&self, flow: &Gameflow<Self>) -> Result<(), GameError>;

    fn start_round(&self, flow: &Gameflow<Self>, round_number: u32) -> Result<(), GameError>;

    fn show_round_result(
        &self,
        flow: &Gameflow<Self>,
        data: &Map<String, Value>,
    ) -> Result<(), GameError>;

    fn show_end_game(
        &self,
        flow: &Gameflow<Self>,
        result: &Value,
        timescale: Option<f64>,
    ) -> Result<(), GameError>;

    fn restart_game(&self, flow: &Gameflow<Self>) -> Result<(), GameError>;

    /// Subscribe game-specific events. Runs once during construction, after
    /// the lifecycle events are wired and before the current phase is
    /// entered.
    fn register_custom_handlers(&self, _flow: &Gameflow<Self>) -> Result<(), GameError> {
        Ok(())
    }
}
