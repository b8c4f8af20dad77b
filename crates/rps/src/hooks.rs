//! Phase hooks for rock-paper-scissors

use std::cell::RefCell;
use std::rc::Rc;

use gamelab_domain::{
    GameEndPayload, GameError, GameEvent, Phase, RoundCompletedPayload, SessionData,
};
use gamelab_engine::flow::{GameHooks, Gameflow};
use gamelab_engine::view::Scene;
use serde_json::{json, Map, Value};

use crate::moves::{Move, MoveSource};
use crate::scene::RpsScene;
use crate::session::{RoundOutcome, RpsSession};

/// Custom event carrying the player's move as its first argument.
pub const PLAYER_MOVE: &str = "PLAYER_MOVE";

pub struct RpsHooks {
    scene: Rc<RpsScene>,
    moves: Rc<RefCell<dyn MoveSource>>,
}

impl RpsHooks {
    pub fn new(scene: Rc<RpsScene>, moves: Rc<RefCell<dyn MoveSource>>) -> Self {
        Self { scene, moves }
    }

    pub fn scene(&self) -> &RpsScene {
        &self.scene
    }

    fn resolve_round(
        &self,
        flow: &Gameflow<Self>,
        data: &Map<String, Value>,
    ) -> Result<RoundOutcome, GameError> {
        let player_move = match data.get("playerMove").and_then(Value::as_str) {
            Some(raw) => Some(raw.parse::<Move>()?),
            None => None,
        };
        {
            let mut game = flow.data_mut()?;
            let session = game.session_mut();
            if let Some(player_move) = player_move {
                session.set_player_move(player_move);
            }
            if session.player_move().is_none() {
                return Err(GameError::validation("no player move to resolve the round with"));
            }
        }

        let opponent_move = self
            .moves
            .try_borrow_mut()
            .map_err(|_| GameError::state("move source is busy", Some(Phase::RoundResult.as_str())))?
            .next_move();
        flow.data_mut()?.session_mut().resolve_round(opponent_move)
    }

    /// Accept a move while a round is waiting for one.
    fn on_player_move(flow: &Gameflow<Self>, args: &[Value]) -> Result<(), GameError> {
        let phase = flow.current_phase()?;
        if phase != Phase::Round {
            tracing::debug!(phase = %phase, "Move ignored outside a round");
            return Ok(());
        }

        let raw = args.first().and_then(Value::as_str).unwrap_or_default();
        let player_move = match raw.parse::<Move>() {
            Ok(player_move) => player_move,
            Err(err) => {
                flow.hooks().scene.show_invalid_move(raw);
                return Err(err.into());
            }
        };

        let round_number = {
            let mut game = flow.data_mut()?;
            game.session_mut().set_player_move(player_move);
            game.round_number()
        };
        let mut extra = Map::new();
        extra.insert("playerMove".into(), json!(player_move));
        flow.dispatch(&GameEvent::RoundCompleted(RoundCompletedPayload {
            round_number,
            extra,
        }))
    }
}

impl GameHooks for RpsHooks {
    type Session = RpsSession;

    fn start_game(&self, flow: &Gameflow<Self>) -> Result<(), GameError> {
        let hud_data = flow.data()?.session().hud_data();
        self.scene.init_hud(&hud_data);
        self.scene.show_start_game(None);
        flow.dispatch(&GameEvent::RoundStarted)
    }

    fn start_round(&self, _flow: &Gameflow<Self>, round_number: u32) -> Result<(), GameError> {
        self.scene.show_round(round_number, None);
        Ok(())
    }

    /// Resolve the round, show it, then either end the game or start the
    /// next round. A round that cannot be resolved is replayed.
    fn show_round_result(
        &self,
        flow: &Gameflow<Self>,
        data: &Map<String, Value>,
    ) -> Result<(), GameError> {
        let outcome = match self.resolve_round(flow, data) {
            Ok(outcome) => outcome,
            Err(err) => {
                flow.dispatch(&GameEvent::RoundStarted)?;
                return Err(err);
            }
        };
        tracing::info!(
            round = outcome.round_number,
            player = %outcome.player_move,
            opponent = %outcome.opponent_move,
            winner = ?outcome.round_winner,
            "Round resolved"
        );
        self.scene.show_round_result(&outcome.to_map());

        match outcome.result {
            Some(result) => flow.dispatch(&GameEvent::GameEnd(Some(GameEndPayload {
                result: Some(Value::String(result)),
                timescale: None,
            }))),
            None => flow.dispatch(&GameEvent::RoundStarted),
        }
    }

    fn show_end_game(
        &self,
        _flow: &Gameflow<Self>,
        result: &Value,
        timescale: Option<f64>,
    ) -> Result<(), GameError> {
        self.scene.show_end_game(result, timescale);
        Ok(())
    }

    fn restart_game(&self, flow: &Gameflow<Self>) -> Result<(), GameError> {
        flow.data_mut()?.session_mut().reset_data();
        self.scene.restart_game();
        flow.dispatch(&GameEvent::GameInit)
    }

    fn register_custom_handlers(&self, flow: &Gameflow<Self>) -> Result<(), GameError> {
        flow.subscribe_handler(PLAYER_MOVE, Self::on_player_move)?;
        Ok(())
    }
}
