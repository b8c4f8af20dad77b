//! Audio collaborator ports.

use std::cell::RefCell;

use gamelab_domain::GameError;

use crate::audio::types::{AssetId, InstanceId, SoundSettings};

/// Low-level playback engine the sound service drives.
#[cfg_attr(test, mockall::automock)]
pub trait AudioBackend {
    fn load(&mut self, src: &str, looping: bool, volume: f64) -> Result<AssetId, GameError>;

    fn unload(&mut self, asset: AssetId);

    fn play(&mut self, asset: AssetId) -> Option<InstanceId>;

    /// `None` applies to every instance of the asset.
    fn stop(&mut self, asset: AssetId, instance: Option<InstanceId>);

    fn pause(&mut self, asset: AssetId, instance: Option<InstanceId>);

    fn resume(&mut self, asset: AssetId, instance: Option<InstanceId>);

    fn set_muted(&mut self, asset: AssetId, muted: bool);

    fn set_volume(&mut self, asset: AssetId, volume: f64, instance: Option<InstanceId>);

    fn set_loop(&mut self, asset: AssetId, looping: bool);

    fn is_playing(&self, asset: AssetId) -> bool;

    fn set_master_volume(&mut self, volume: f64);

    fn stop_all(&mut self);
}

/// Where sound preferences persist between sessions.
#[cfg_attr(test, mockall::automock)]
pub trait SettingsStore {
    /// `Ok(None)` when nothing has been saved yet.
    fn load(&self) -> Result<Option<SoundSettings>, GameError>;

    fn save(&self, settings: &SoundSettings) -> Result<(), GameError>;
}

/// Keeps preferences for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    saved: RefCell<Option<SoundSettings>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: SoundSettings) -> Self {
        Self {
            saved: RefCell::new(Some(settings)),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Option<SoundSettings>, GameError> {
        Ok(*self.saved.borrow())
    }

    fn save(&self, settings: &SoundSettings) -> Result<(), GameError> {
        *self.saved.borrow_mut() = Some(*settings);
        Ok(())
    }
}
