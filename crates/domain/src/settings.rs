//! Opaque per-game settings

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GameError;

/// Settings handed to a game at session start.
///
/// The runtime treats the contents as opaque; it only guarantees the value is
/// a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameSettings(Map<String, Value>);

impl GameSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Numeric setting, if present and numeric.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for GameSettings {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for GameSettings {
    type Error = GameError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Err(GameError::validation("game settings must not be null")),
            Value::Array(_) => Err(GameError::validation(
                "game settings must be an object, got an array",
            )),
            other => Err(GameError::validation(format!(
                "game settings must be an object, got {other}"
            ))),
        }
    }
}
