//! Rock-paper-scissors session data

use gamelab_domain::{GameError, SessionData};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::moves::{determine_winner, Move, Winner};

pub const PLAYER_WINS: &str = "Player wins!";
pub const OPPONENT_WINS: &str = "Opponent wins!";

/// What happened in one resolved round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundOutcome {
    pub round_number: u32,
    pub player_move: Move,
    pub opponent_move: Move,
    pub round_winner: Winner,
    pub player_score: u32,
    pub opponent_score: u32,
    /// Set on the round that decides the game.
    pub result: Option<String>,
}

impl RoundOutcome {
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    pub fn is_final(&self) -> bool {
        self.result.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RpsSession {
    best_of: u32,
    player_score: u32,
    opponent_score: u32,
    round_number: u32,
    player_move: Option<Move>,
    last_round: Option<RoundOutcome>,
}

impl RpsSession {
    pub fn new(best_of: u32) -> Self {
        Self {
            best_of,
            player_score: 0,
            opponent_score: 0,
            round_number: 1,
            player_move: None,
            last_round: None,
        }
    }

    pub fn best_of(&self) -> u32 {
        self.best_of
    }

    /// Rounds a side has to win to take the game.
    pub fn wins_needed(&self) -> u32 {
        self.best_of.div_ceil(2)
    }

    pub fn scores(&self) -> (u32, u32) {
        (self.player_score, self.opponent_score)
    }

    pub fn player_move(&self) -> Option<Move> {
        self.player_move
    }

    pub fn set_player_move(&mut self, player_move: Move) {
        self.player_move = Some(player_move);
    }

    pub fn last_round(&self) -> Option<&RoundOutcome> {
        self.last_round.as_ref()
    }

    /// Settle the current round against `opponent_move`.
    ///
    /// A tie replays the same round number. The player's move is consumed.
    pub fn resolve_round(&mut self, opponent_move: Move) -> Result<RoundOutcome, GameError> {
        let player_move = self
            .player_move
            .take()
            .ok_or_else(|| GameError::validation("player move must be set before resolving a round"))?;

        let round_number = self.round_number;
        let round_winner = determine_winner(player_move, opponent_move);
        match round_winner {
            Winner::Player => self.player_score += 1,
            Winner::Opponent => self.opponent_score += 1,
            Winner::Tie => {}
        }
        if round_winner != Winner::Tie {
            self.round_number += 1;
        }

        let outcome = RoundOutcome {
            round_number,
            player_move,
            opponent_move,
            round_winner,
            player_score: self.player_score,
            opponent_score: self.opponent_score,
            result: self.check_end_game().map(str::to_string),
        };
        self.last_round = Some(outcome.clone());
        Ok(outcome)
    }

    pub fn check_end_game(&self) -> Option<&'static str> {
        let needed = self.wins_needed();
        if self.player_score >= needed {
            Some(PLAYER_WINS)
        } else if self.opponent_score >= needed {
            Some(OPPONENT_WINS)
        } else {
            None
        }
    }
}

impl SessionData for RpsSession {
    fn round_number(&self) -> u32 {
        self.round_number
    }

    fn round_result(&self) -> Map<String, Value> {
        self.last_round
            .as_ref()
            .map(RoundOutcome::to_map)
            .unwrap_or_default()
    }

    fn hud_data(&self) -> Value {
        json!({
            "bestOf": self.best_of,
            "playerScore": self.player_score,
            "opponentScore": self.opponent_score,
        })
    }

    fn reset_data(&mut self) {
        *self = Self::new(self.best_of);
    }
}
