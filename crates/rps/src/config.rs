//! Game configuration

use std::env;

use anyhow::{bail, Context, Result};
use serde_json::{json, Map, Value};

/// Rock-paper-scissors configuration loaded from environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpsConfig {
    /// Rounds in a match; odd so a match always has a winner
    pub best_of: u32,
    /// Sound effects enabled on first launch
    pub sound: bool,
    /// Background music enabled on first launch
    pub music: bool,
}

impl Default for RpsConfig {
    fn default() -> Self {
        Self {
            best_of: 5,
            sound: true,
            music: true,
        }
    }
}

impl RpsConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let best_of: u32 = lookup("RPS_BEST_OF")
            .unwrap_or_else(|| "5".into())
            .trim()
            .parse()
            .context("RPS_BEST_OF must be a positive integer")?;
        if best_of == 0 || best_of % 2 == 0 {
            bail!("RPS_BEST_OF must be odd and greater than zero, got {best_of}");
        }

        Ok(Self {
            best_of,
            sound: parse_flag(lookup("RPS_SOUND"), "RPS_SOUND")?,
            music: parse_flag(lookup("RPS_MUSIC"), "RPS_MUSIC")?,
        })
    }

    /// Settings object handed to the game data.
    pub fn game_settings(&self) -> Map<String, Value> {
        let mut settings = Map::new();
        settings.insert("bestOf".into(), json!(self.best_of));
        settings
    }
}

fn parse_flag(raw: Option<String>, key: &str) -> Result<bool> {
    let Some(raw) = raw else {
        return Ok(true);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{key} must be a boolean, got '{other}'"),
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
    fn test_defaults() {
        assert_eq!(RpsConfig::from_lookup(lookup(&[])).unwrap(), RpsConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = RpsConfig::from_lookup(lookup(&[
            ("RPS_BEST_OF", "3"),
            ("RPS_SOUND", "off"),
            ("RPS_MUSIC", "False"),
        ]))
        .unwrap();

        assert_eq!(
            config,
            RpsConfig {
                best_of: 3,
                sound: false,
                music: false
            }
        );
    }

    #[test]
    fn test_even_or_zero_best_of_is_rejected() {
        assert!(RpsConfig::from_lookup(lookup(&[("RPS_BEST_OF", "4")])).is_err());
        assert!(RpsConfig::from_lookup(lookup(&[("RPS_BEST_OF", "0")])).is_err());
        assert!(RpsConfig::from_lookup(lookup(&[("RPS_BEST_OF", "five")])).is_err());
    }

    #[test]
    fn test_malformed_flag_is_rejected() {
        assert!(RpsConfig::from_lookup(lookup(&[("RPS_SOUND", "loud")])).is_err());
    }

    #[test]
    fn test_game_settings_carry_best_of() {
        let config = RpsConfig {
            best_of: 7,
            ..RpsConfig::default()
        };
        assert_eq!(config.game_settings().get("bestOf"), Some(&json!(7)));
    }
}
