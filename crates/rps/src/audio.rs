//! Game sounds over a headless playback backend.
//!
//! There is no sound card in a terminal, so [`LoggingBackend`] keeps track of
//! what would be playing and logs each request. One-shot effects finish as
//! soon as they start; looping tracks play until stopped.

use std::collections::HashMap;

use gamelab_domain::GameError;
use gamelab_engine::audio::{
    AssetId, AudioBackend, InstanceId, PlayOptions, SoundConfig, SoundService,
};

pub const BACKGROUND_MUSIC: &str = "bgMusic";
pub const CLICK: &str = "click";
pub const FLASH: &str = "flash";
pub const END_GAME_WIN: &str = "end-game-win";
pub const END_GAME_LOSE: &str = "end-game-lose";

pub type GameSound = SoundService<LoggingBackend>;

#[derive(Debug, Clone)]
struct Track {
    src: String,
    looping: bool,
    volume: f64,
    muted: bool,
    /// Live instances and whether each is paused
    instances: HashMap<InstanceId, bool>,
}

#[derive(Debug, Default)]
pub struct LoggingBackend {
    tracks: HashMap<AssetId, Track>,
    master_volume: f64,
    next_asset: u64,
    next_instance: u64,
    started: Vec<String>,
}

impl LoggingBackend {
    pub fn new() -> Self {
        Self {
            master_volume: 1.0,
            ..Self::default()
        }
    }

    /// Sources started so far, in order, audible or not.
    pub fn started(&self) -> &[String] {
        &self.started
    }

    pub fn is_muted(&self, asset: AssetId) -> bool {
        self.tracks.get(&asset).is_some_and(|track| track.muted)
    }

    pub fn master_volume(&self) -> f64 {
        self.master_volume
    }

    fn track(&mut self, asset: AssetId) -> Option<&mut Track> {
        let track = self.tracks.get_mut(&asset);
        if track.is_none() {
            tracing::debug!(asset = asset.0, "Audio request for unknown asset ignored");
        }
        track
    }
}

fn for_instances(track: &mut Track, instance: Option<InstanceId>, mut apply: impl FnMut(&mut bool)) {
    match instance {
        Some(id) => {
            if let Some(paused) = track.instances.get_mut(&id) {
                apply(paused);
            }
        }
        None => track.instances.values_mut().for_each(apply),
    }
}

impl AudioBackend for LoggingBackend {
    fn load(&mut self, src: &str, looping: bool, volume: f64) -> Result<AssetId, GameError> {
        if src.trim().is_empty() {
            return Err(GameError::audio("empty source path", None));
        }
        self.next_asset += 1;
        let asset = AssetId(self.next_asset);
        self.tracks.insert(
            asset,
            Track {
                src: src.to_string(),
                looping,
                volume,
                muted: false,
                instances: HashMap::new(),
            },
        );
        tracing::debug!(asset = asset.0, src, looping, volume, "Audio asset loaded");
        Ok(asset)
    }

    fn unload(&mut self, asset: AssetId) {
        if let Some(track) = self.tracks.remove(&asset) {
            tracing::debug!(asset = asset.0, src = %track.src, "Audio asset unloaded");
        }
    }

    fn play(&mut self, asset: AssetId) -> Option<InstanceId> {
        self.next_instance += 1;
        let instance = InstanceId(self.next_instance);
        let track = self.tracks.get_mut(&asset)?;
        tracing::info!(
            src = %track.src,
            muted = track.muted,
            volume = track.volume,
            "Playing sound"
        );
        let src = track.src.clone();
        if track.looping {
            track.instances.insert(instance, false);
        }
        self.started.push(src);
        Some(instance)
    }

    fn stop(&mut self, asset: AssetId, instance: Option<InstanceId>) {
        let Some(track) = self.track(asset) else {
            return;
        };
        match instance {
            Some(id) => {
                track.instances.remove(&id);
            }
            None => track.instances.clear(),
        }
    }

    fn pause(&mut self, asset: AssetId, instance: Option<InstanceId>) {
        if let Some(track) = self.track(asset) {
            for_instances(track, instance, |paused| *paused = true);
        }
    }

    fn resume(&mut self, asset: AssetId, instance: Option<InstanceId>) {
        if let Some(track) = self.track(asset) {
            for_instances(track, instance, |paused| *paused = false);
        }
    }

    fn set_muted(&mut self, asset: AssetId, muted: bool) {
        if let Some(track) = self.track(asset) {
            track.muted = muted;
        }
    }

    fn set_volume(&mut self, asset: AssetId, volume: f64, _instance: Option<InstanceId>) {
        if let Some(track) = self.track(asset) {
            track.volume = volume;
        }
    }

    fn set_loop(&mut self, asset: AssetId, looping: bool) {
        if let Some(track) = self.track(asset) {
            track.looping = looping;
        }
    }

    fn is_playing(&self, asset: AssetId) -> bool {
        self.tracks
            .get(&asset)
            .is_some_and(|track| track.instances.values().any(|paused| !paused))
    }

    fn set_master_volume(&mut self, volume: f64) {
        self.master_volume = volume;
    }

    fn stop_all(&mut self) {
        for track in self.tracks.values_mut() {
            track.instances.clear();
        }
    }
}

/// Register every sound the game uses and start the background music.
pub fn register_game_sounds(sound: &mut GameSound) -> Result<(), GameError> {
    sound.register_music(
        BACKGROUND_MUSIC,
        SoundConfig::new("assets/sounds/music-loop.mp3")
            .looping(true)
            .with_volume(0.01),
    )?;
    for (key, src) in [
        (CLICK, "assets/sounds/click.mp3"),
        (FLASH, "assets/sounds/flash.mp3"),
        (END_GAME_WIN, "assets/sounds/end-game-win.mp3"),
        (END_GAME_LOSE, "assets/sounds/end-game-lose.mp3"),
    ] {
        sound.register_sound(key, SoundConfig::new(src).with_volume(0.1))?;
    }

    if !sound.is_playing(BACKGROUND_MUSIC) {
        sound.play(BACKGROUND_MUSIC, PlayOptions::default())?;
    }
    Ok(())
}

/// Sound for the final result line.
pub fn end_game_sound(player_won: bool) -> &'static str {
    if player_won {
        END_GAME_WIN
    } else {
        END_GAME_LOSE
    }
}
