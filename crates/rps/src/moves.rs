//! Moves, round winners and where the opponent's moves come from.

use std::collections::VecDeque;
use std::str::FromStr;

use gamelab_domain::GameError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Rock,
    Paper,
    Scissors,
}

impl Move {
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    pub fn as_str(&self) -> &'static str {
        match self {
            Move::Rock => "rock",
            Move::Paper => "paper",
            Move::Scissors => "scissors",
        }
    }

    /// Whether `self` wins against `other`.
    pub fn beats(&self, other: Move) -> bool {
        matches!(
            (self, other),
            (Move::Rock, Move::Scissors) | (Move::Scissors, Move::Paper) | (Move::Paper, Move::Rock)
        )
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown move '{0}', expected rock, paper or scissors")]
pub struct UnknownMove(pub String);

impl From<UnknownMove> for GameError {
    fn from(err: UnknownMove) -> Self {
        GameError::validation(err.to_string())
    }
}

impl FromStr for Move {
    type Err = UnknownMove;

    /// Accepts full names and their first letter, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rock" | "r" => Ok(Move::Rock),
            "paper" | "p" => Ok(Move::Paper),
            "scissors" | "s" => Ok(Move::Scissors),
            _ => Err(UnknownMove(s.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Player,
    Opponent,
    Tie,
}

pub fn determine_winner(player: Move, opponent: Move) -> Winner {
    if player == opponent {
        Winner::Tie
    } else if player.beats(opponent) {
        Winner::Player
    } else {
        Winner::Opponent
    }
}

/// Supplies the opponent's move for each round.
#[cfg_attr(test, mockall::automock)]
pub trait MoveSource {
    fn next_move(&mut self) -> Move;
}

/// Uniformly random moves from the thread-local RNG.
#[derive(Debug, Clone, Default)]
pub struct RandomMoves;

impl RandomMoves {
    pub fn new() -> Self {
        Self
    }
}

impl MoveSource for RandomMoves {
    fn next_move(&mut self) -> Move {
        Move::ALL[rand::thread_rng().gen_range(0..Move::ALL.len())]
    }
}

/// Plays back a fixed sequence, cycling when it runs out.
#[derive(Debug, Clone)]
pub struct ScriptedMoves {
    moves: VecDeque<Move>,
}

impl ScriptedMoves {
    /// An empty script always plays rock.
    pub fn new(moves: impl IntoIterator<Item = Move>) -> Self {
        Self {
            moves: moves.into_iter().collect(),
        }
    }
}

impl MoveSource for ScriptedMoves {
    fn next_move(&mut self) -> Move {
        match self.moves.pop_front() {
            Some(next) => {
                self.moves.push_back(next);
                next
            }
            None => Move::Rock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winner_rules() {
        assert_eq!(determine_winner(Move::Rock, Move::Scissors), Winner::Player);
        assert_eq!(determine_winner(Move::Scissors, Move::Paper), Winner::Player);
        assert_eq!(determine_winner(Move::Paper, Move::Rock), Winner::Player);
        assert_eq!(determine_winner(Move::Rock, Move::Paper), Winner::Opponent);
        assert_eq!(determine_winner(Move::Paper, Move::Paper), Winner::Tie);
    }

    #[test]
    fn test_parse_accepts_names_and_initials() {
        assert_eq!("Rock".parse::<Move>().unwrap(), Move::Rock);
        assert_eq!(" p ".parse::<Move>().unwrap(), Move::Paper);
        assert_eq!("S".parse::<Move>().unwrap(), Move::Scissors);
        assert_eq!("lizard".parse::<Move>(), Err(UnknownMove("lizard".into())));
    }

    #[test]
    fn test_unknown_move_is_validation_error() {
        let err: GameError = UnknownMove("spock".into()).into();
        assert!(matches!(err, GameError::Validation(_)));
    }

    #[test]
    fn test_scripted_moves_cycle() {
        let mut source = ScriptedMoves::new([Move::Paper, Move::Scissors]);
        let played: Vec<Move> = (0..3).map(|_| source.next_move()).collect();
        assert_eq!(played, vec![Move::Paper, Move::Scissors, Move::Paper]);
    }

    #[test]
    fn test_random_moves_are_valid() {
        let mut source = RandomMoves::new();
        for _ in 0..50 {
            assert!(Move::ALL.contains(&source.next_move()));
        }
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Move::Scissors).unwrap(), "scissors");
        assert_eq!(serde_json::to_value(Winner::Tie).unwrap(), "tie");
    }
}
