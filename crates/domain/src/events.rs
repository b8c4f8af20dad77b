//! Event Taxonomy
//!
//! The closed set of semantic events exchanged between a scene and the flow
//! controller, the canonical tagged envelope they travel in, and the
//! normalization rules that turn loosely shaped payloads into phase input.
//!
//! ## Payload shapes
//!
//! The canonical shape is the tagged envelope produced by [`GameEvent`]:
//!
//! ```json
//! {"type": "ROUND_COMPLETED", "payload": {"roundNumber": 2, "winner": "player"}}
//! ```
//!
//! Bare scalars (`"rock"`) and plain objects (`{"winner": "player"}`) are
//! accepted as compatibility inputs for older producers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GameError;

/// Names of every event the flow controller subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEventKind {
    GameInit,
    GameStarted,
    RoundStarted,
    RoundCompleted,
    GameEnd,
    GameRestarted,
}

impl GameEventKind {
    pub const ALL: [GameEventKind; 6] = [
        GameEventKind::GameInit,
        GameEventKind::GameStarted,
        GameEventKind::RoundStarted,
        GameEventKind::RoundCompleted,
        GameEventKind::GameEnd,
        GameEventKind::GameRestarted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameEventKind::GameInit => "GAME_INIT",
            GameEventKind::GameStarted => "GAME_STARTED",
            GameEventKind::RoundStarted => "ROUND_STARTED",
            GameEventKind::RoundCompleted => "ROUND_COMPLETED",
            GameEventKind::GameEnd => "GAME_END",
            GameEventKind::GameRestarted => "GAME_RESTARTED",
        }
    }

    /// Whether events of this kind carry a payload.
    pub fn has_payload(&self) -> bool {
        matches!(
            self,
            GameEventKind::RoundCompleted | GameEventKind::GameEnd
        )
    }
}

impl std::fmt::Display for GameEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GameEventKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameEventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| GameError::event(s, "not a lifecycle event"))
    }
}

/// Payload of a completed round. Extra fields are game-defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundCompletedPayload {
    pub round_number: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload of a finished game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameEndPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timescale: Option<f64>,
}

/// Canonical, typed form of a lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameEvent {
    GameInit,
    GameStarted,
    RoundStarted,
    RoundCompleted(RoundCompletedPayload),
    GameEnd(Option<GameEndPayload>),
    GameRestarted,
}

impl GameEvent {
    pub fn kind(&self) -> GameEventKind {
        match self {
            GameEvent::GameInit => GameEventKind::GameInit,
            GameEvent::GameStarted => GameEventKind::GameStarted,
            GameEvent::RoundStarted => GameEventKind::RoundStarted,
            GameEvent::RoundCompleted(_) => GameEventKind::RoundCompleted,
            GameEvent::GameEnd(_) => GameEventKind::GameEnd,
            GameEvent::GameRestarted => GameEventKind::GameRestarted,
        }
    }

    /// The tagged envelope `{"type": ..., "payload": ...}`.
    pub fn to_envelope(&self) -> Value {
        // Every field is a JSON-native type, serialization cannot fail
        serde_json::to_value(self).unwrap_or_else(|_| {
            let mut envelope = Map::new();
            envelope.insert("type".into(), Value::from(self.kind().as_str()));
            Value::Object(envelope)
        })
    }
}

/// Outcome of a finished game, as handed to the end hook.
#[derive(Debug, Clone, PartialEq)]
pub struct GameEndOutcome {
    pub result: Value,
    pub timescale: Option<f64>,
}

impl GameEndOutcome {
    pub fn to_metadata(&self) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("result".into(), self.result.clone());
        if let Some(timescale) = self.timescale {
            metadata.insert("timescale".into(), Value::from(timescale));
        }
        metadata
    }
}

/// Input that accompanies a phase change.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Transition {
    #[default]
    Plain,
    RoundResult(Map<String, Value>),
    GameEnd(GameEndOutcome),
}

impl Transition {
    /// Metadata recorded alongside the history entry.
    pub fn metadata(&self) -> Option<Map<String, Value>> {
        match self {
            Transition::Plain => None,
            Transition::RoundResult(data) => Some(data.clone()),
            Transition::GameEnd(outcome) => Some(outcome.to_metadata()),
        }
    }
}

/// Unwrap a `{"type": kind, "payload": ...}` envelope.
///
/// Returns `Some(payload)` (possibly `None` inside) when `value` is an
/// envelope for `kind`.
fn envelope_payload(value: &Value, kind: GameEventKind) -> Option<Option<&Value>> {
    let object = value.as_object()?;
    match object.get("type") {
        Some(Value::String(tag)) if tag == kind.as_str() => Some(object.get("payload")),
        _ => None,
    }
}

/// Normalize a `ROUND_COMPLETED` payload.
///
/// An envelope is unwrapped first and the rules apply to its payload:
/// - object with a numeric `roundNumber` → unchanged
/// - scalar → `{playerMove: scalar, roundNumber: current}`
/// - any other object → merged with `roundNumber: current`
/// - absent, null or array → `None` (no transition)
pub fn normalize_round_completed(
    payload: Option<&Value>,
    current_round: u32,
) -> Option<Map<String, Value>> {
    let payload = payload?;
    let body = match envelope_payload(payload, GameEventKind::RoundCompleted) {
        Some(inner) => inner?,
        None => payload,
    };

    match body {
        Value::Object(object) if object.get("roundNumber").is_some_and(Value::is_number) => {
            Some(object.clone())
        }
        Value::Object(object) => {
            let mut merged = object.clone();
            merged.insert("roundNumber".into(), Value::from(current_round));
            Some(merged)
        }
        Value::String(_) | Value::Number(_) | Value::Bool(_) => {
            let mut wrapped = Map::new();
            wrapped.insert("playerMove".into(), body.clone());
            wrapped.insert("roundNumber".into(), Value::from(current_round));
            Some(wrapped)
        }
        Value::Null | Value::Array(_) => None,
    }
}

/// Normalize a `GAME_END` payload.
///
/// Objects (enveloped or not) yield `result` (the whole object when absent)
/// and a numeric `timescale`. Any other present value is the result itself.
/// An absent payload yields `None` (no transition).
pub fn normalize_game_end(payload: Option<&Value>) -> Option<GameEndOutcome> {
    let payload = payload?;

    let body = match envelope_payload(payload, GameEventKind::GameEnd) {
        Some(Some(inner)) => inner,
        Some(None) => {
            return Some(GameEndOutcome {
                result: Value::Null,
                timescale: None,
            })
        }
        None => payload,
    };

    match body {
        Value::Object(object) => Some(GameEndOutcome {
            result: object.get("result").cloned().unwrap_or_else(|| body.clone()),
            timescale: object.get("timescale").and_then(Value::as_f64),
        }),
        other => Some(GameEndOutcome {
            result: other.clone(),
            timescale: None,
        }),
    }
}
