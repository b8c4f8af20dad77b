//! Lifecycle phases and their history entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GameError;

/// One of the fixed lifecycle stages a game session passes through.
///
/// Marked `#[non_exhaustive]` so dispatch code outside this crate keeps a
/// fallback arm that reports drift instead of silently ignoring a new phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum Phase {
    #[default]
    Init,
    Start,
    Round,
    RoundResult,
    End,
    Restart,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Init,
        Phase::Start,
        Phase::Round,
        Phase::RoundResult,
        Phase::End,
        Phase::Restart,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Init => "INIT",
            Phase::Start => "START",
            Phase::Round => "ROUND",
            Phase::RoundResult => "ROUND_RESULT",
            Phase::End => "END",
            Phase::Restart => "RESTART",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        match normalized.as_str() {
            "INIT" => Ok(Phase::Init),
            "START" => Ok(Phase::Start),
            "ROUND" => Ok(Phase::Round),
            "ROUND_RESULT" => Ok(Phase::RoundResult),
            "END" => Ok(Phase::End),
            "RESTART" => Ok(Phase::Restart),
            _ => Err(GameError::state("unknown phase name", Some(s))),
        }
    }
}

/// A single recorded transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseHistoryEntry {
    pub name: Phase,
    pub entered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_state: Option<Phase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl PhaseHistoryEntry {
    /// Entry for a phase that was set directly rather than transitioned into.
    pub fn initial(name: Phase, entered_at: DateTime<Utc>) -> Self {
        Self {
            name,
            entered_at,
            previous_state: None,
            metadata: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_round_trips_through_its_name() {
        for phase in Phase::ALL {
            assert_eq!(phase.as_str().parse::<Phase>(), Ok(phase));
        }
    }

    #[test]
    fn test_phase_parse_is_lenient_about_case_and_dashes() {
        assert_eq!("round-result".parse::<Phase>(), Ok(Phase::RoundResult));
        assert_eq!(" init ".parse::<Phase>(), Ok(Phase::Init));
    }

    #[test]
    fn test_unknown_phase_is_a_state_error() {
        let err = "LOBBY".parse::<Phase>().unwrap_err();
        assert!(matches!(err, GameError::State { state: Some(ref s), .. } if s == "LOBBY"));
    }

    #[test]
    fn test_history_entry_serializes_camel_case() {
        let entry = PhaseHistoryEntry {
            name: Phase::Start,
            entered_at: DateTime::<Utc>::UNIX_EPOCH,
            previous_state: Some(Phase::Init),
            metadata: None,
        };
        let json = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(json["name"], "START");
        assert_eq!(json["previousState"], "INIT");
        assert!(json.get("metadata").is_none());
        assert!(json.get("enteredAt").is_some());
    }
}
