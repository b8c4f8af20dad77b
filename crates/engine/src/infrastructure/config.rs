//! Runtime configuration

use std::env;

use anyhow::{Context, Result};
use gamelab_domain::{Phase, MAX_PHASE_HISTORY};

/// Runtime configuration loaded from environment
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Phase history entries kept per session (1..=100)
    pub history_capacity: usize,
    /// Phase a new session starts in; the flow replays it on construction
    pub initial_phase: Phase,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            history_capacity: MAX_PHASE_HISTORY,
            initial_phase: Phase::Init,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let history_capacity = match lookup("GAMELAB_PHASE_HISTORY") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .context("GAMELAB_PHASE_HISTORY must be a positive integer")?
                .clamp(1, MAX_PHASE_HISTORY),
            None => MAX_PHASE_HISTORY,
        };

        let initial_phase = match lookup("GAMELAB_INITIAL_PHASE") {
            Some(raw) => raw
                .parse::<Phase>()
                .with_context(|| format!("GAMELAB_INITIAL_PHASE is not a phase: {raw}"))?,
            None => Phase::Init,
        };

        Ok(Self {
            history_capacity,
            initial_phase,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = RuntimeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn test_history_capacity_is_clamped() {
        let config = RuntimeConfig::from_lookup(lookup(&[("GAMELAB_PHASE_HISTORY", "500")])).unwrap();
        assert_eq!(config.history_capacity, MAX_PHASE_HISTORY);

        let config = RuntimeConfig::from_lookup(lookup(&[("GAMELAB_PHASE_HISTORY", "0")])).unwrap();
        assert_eq!(config.history_capacity, 1);
    }

    #[test]
    fn test_initial_phase_parses_loosely() {
        let config =
            RuntimeConfig::from_lookup(lookup(&[("GAMELAB_INITIAL_PHASE", "round-result")])).unwrap();
        assert_eq!(config.initial_phase, Phase::RoundResult);
    }

    #[test]
    fn test_malformed_values_are_errors() {
        assert!(RuntimeConfig::from_lookup(lookup(&[("GAMELAB_PHASE_HISTORY", "lots")])).is_err());
        assert!(RuntimeConfig::from_lookup(lookup(&[("GAMELAB_INITIAL_PHASE", "LOBBY")])).is_err());
    }
}
