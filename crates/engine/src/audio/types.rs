//! Audio value types

use serde::{Deserialize, Serialize};

/// User preference for effects and music.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundSettings {
    pub sound: bool,
    pub music: bool,
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            sound: true,
            music: true,
        }
    }
}

/// How a sound asset is registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundConfig {
    pub src: String,
    #[serde(rename = "loop", default, skip_serializing_if = "Option::is_none")]
    pub looping: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

impl SoundConfig {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            looping: None,
            volume: None,
        }
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = Some(looping);
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }
}

/// Per-call overrides for [`play`](crate::audio::SoundService::play).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayOptions {
    pub looping: Option<bool>,
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundKind {
    /// Muted while sound is disabled; not started at all.
    Effect,
    /// Paused while music is disabled, keeping its position.
    Music,
}

/// A loaded asset inside the audio backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetId(pub u64);

/// One playback of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(pub u64);

/// Returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Clamp a volume into `0.0..=1.0`. NaN becomes silence.
pub fn clamp_volume(volume: f64) -> f64 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}
