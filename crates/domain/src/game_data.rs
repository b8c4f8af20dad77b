//! Game Data - a phase ledger composed with per-game session data
//!
//! The ledger is generic and identical for every game. Everything a specific
//! game needs to remember (scores, round counters, the last move) lives behind
//! the [`SessionData`] trait.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::GameError;
use crate::ledger::PhaseLedger;
use crate::phase::{Phase, PhaseHistoryEntry};
use crate::settings::GameSettings;

/// Game-specific state the runtime reads to feed phase hooks.
pub trait SessionData {
    /// Current round number.
    fn round_number(&self) -> u32;

    /// Data describing the latest round outcome.
    fn round_result(&self) -> Map<String, Value>;

    /// Data the HUD is initialised with when the game starts.
    fn hud_data(&self) -> Value {
        Value::Null
    }

    /// Clear all game-specific fields back to their starting values.
    fn reset_data(&mut self);
}

/// Per-session state holder: settings, phase ledger, game session data.
#[derive(Debug, Clone)]
pub struct GameData<S> {
    settings: GameSettings,
    ledger: PhaseLedger,
    session: S,
}

impl<S: SessionData> GameData<S> {
    pub fn new(settings: GameSettings, session: S, now: DateTime<Utc>) -> Self {
        Self::starting_at(Phase::Init, settings, session, now)
    }

    /// Start in a phase other than `INIT`, e.g. when rebuilding a flow mid-game.
    pub fn starting_at(initial: Phase, settings: GameSettings, session: S, now: DateTime<Utc>) -> Self {
        Self {
            settings,
            ledger: PhaseLedger::new(initial, now),
            session,
        }
    }

    /// Build from an already-sized ledger.
    pub fn with_ledger(settings: GameSettings, session: S, ledger: PhaseLedger) -> Self {
        Self {
            settings,
            ledger,
            session,
        }
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Replace the settings. Non-object values are rejected and the
    /// previous settings are kept.
    pub fn set_settings(&mut self, value: Value) -> Result<(), GameError> {
        self.settings = GameSettings::try_from(value)?;
        Ok(())
    }

    pub fn current_phase(&self) -> Phase {
        self.ledger.current()
    }

    pub fn previous_phase(&self) -> Option<Phase> {
        self.ledger.previous()
    }

    pub fn ledger(&self) -> &PhaseLedger {
        &self.ledger
    }

    pub fn history(&self) -> Vec<PhaseHistoryEntry> {
        self.ledger.history().cloned().collect()
    }

    pub fn history_len(&self) -> usize {
        self.ledger.history_len()
    }

    /// Record a transition into `phase`.
    pub fn change_state(
        &mut self,
        phase: Phase,
        metadata: Option<Map<String, Value>>,
        now: DateTime<Utc>,
    ) -> &PhaseHistoryEntry {
        self.ledger.record(phase, metadata, now)
    }

    /// Record a transition into the phase called `name`.
    ///
    /// Unknown names leave phase and history untouched.
    pub fn change_state_named(
        &mut self,
        name: &str,
        metadata: Option<Map<String, Value>>,
        now: DateTime<Utc>,
    ) -> Result<Phase, GameError> {
        let phase: Phase = name.parse()?;
        self.ledger.record(phase, metadata, now);
        Ok(phase)
    }

    pub fn clear_history(&mut self, now: DateTime<Utc>) {
        self.ledger.clear_history(now);
    }

    /// Back to `INIT` with a single history entry and fresh session data.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.ledger.reset(now);
        self.session.reset_data();
    }

    /// Like [`reset`](Self::reset) but leaves history empty.
    pub fn destroy(&mut self) {
        self.ledger.clear();
        self.session.reset_data();
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn round_number(&self) -> u32 {
        self.session.round_number()
    }

    pub fn round_result(&self) -> Map<String, Value> {
        self.session.round_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct TestSession {
        round: u32,
        result: Map<String, Value>,
    }

    impl SessionData for TestSession {
        fn round_number(&self) -> u32 {
            self.round
        }

        fn round_result(&self) -> Map<String, Value> {
            self.result.clone()
        }

        fn reset_data(&mut self) {
            self.round = 0;
            self.result.clear();
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn data() -> GameData<TestSession> {
        GameData::new(GameSettings::new(), TestSession::default(), now())
    }

    #[test]
    fn test_starts_in_init_with_one_entry() {
        let data = data();
        assert_eq!(data.current_phase(), Phase::Init);
        assert_eq!(data.history_len(), 1);
        assert_eq!(data.history()[0].name, Phase::Init);
        assert!(data.settings().is_empty());
    }

    #[test]
    fn test_custom_initial_phase() {
        let data = GameData::starting_at(Phase::Start, GameSettings::new(), TestSession::default(), now());
        assert_eq!(data.current_phase(), Phase::Start);
        assert_eq!(data.history()[0].name, Phase::Start);
    }

    #[test]
    fn test_invalid_settings_keep_previous() {
        let mut data = data();
        data.set_settings(json!({"bestOf": 3})).unwrap();

        for bad in [json!(null), json!([]), json!("invalid")] {
            assert!(matches!(data.set_settings(bad), Err(GameError::Validation(_))));
        }
        assert_eq!(data.settings().get_f64("bestOf"), Some(3.0));
    }

    #[test]
    fn test_change_state_named_rejects_unknown_name() {
        let mut data = data();
        let err = data.change_state_named("invalid", None, now()).unwrap_err();

        assert!(matches!(err, GameError::State { .. }));
        assert_eq!(data.current_phase(), Phase::Init);
        assert_eq!(data.history_len(), 1);
    }

    #[test]
    fn test_change_state_named_accepts_known_name() {
        let mut data = data();
        assert_eq!(data.change_state_named("START", None, now()).unwrap(), Phase::Start);
        assert_eq!(data.previous_phase(), Some(Phase::Init));
    }

    #[test]
    fn test_reset_clears_session_and_history() {
        let mut data = data();
        data.change_state(Phase::Start, None, now());
        data.change_state(Phase::Round, None, now());
        data.session_mut().round = 5;
        data.session_mut().result.insert("winner".into(), json!("player1"));

        data.reset(now());

        assert_eq!(data.current_phase(), Phase::Init);
        assert_eq!(data.history_len(), 1);
        assert_eq!(data.round_number(), 0);
        assert!(data.round_result().is_empty());
    }

    #[test]
    fn test_destroy_empties_history() {
        let mut data = data();
        data.change_state(Phase::Start, None, now());
        data.session_mut().round = 5;

        data.destroy();

        assert_eq!(data.current_phase(), Phase::Init);
        assert_eq!(data.history_len(), 0);
        assert_eq!(data.round_number(), 0);
    }
}
