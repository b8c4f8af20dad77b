//! Sound Service
//!
//! Registers effects and music with an injected [`AudioBackend`] and keeps
//! them in line with the user's sound preferences:
//!
//! - effects are muted while sound is disabled, and `play` skips them
//! - music is paused, not stopped, while music is disabled, so enabling it
//!   again resumes from the same position
//!
//! Preferences load from and save to a [`SettingsStore`]. Storage failures
//! are logged and otherwise ignored.
//!
//! Construct one service per application (or per test) and inject it where
//! it is needed; `cleanup()` releases every asset and subscriber.

use std::collections::HashMap;

use gamelab_domain::{GameError, Lifecycle};

use crate::audio::ports::{AudioBackend, MemorySettingsStore, SettingsStore};
use crate::audio::types::{
    clamp_volume, AssetId, InstanceId, PlayOptions, SoundConfig, SoundKind, SoundSettings,
    SubscriptionId,
};
use crate::infrastructure::reporting::log_error;

const COMPONENT: &str = "SoundService";

struct RegisteredSound {
    asset: AssetId,
    kind: SoundKind,
    instances: Vec<InstanceId>,
}

type SettingsCallback = Box<dyn Fn(SoundSettings)>;

pub struct SoundService<B: AudioBackend> {
    lifecycle: Lifecycle,
    backend: B,
    store: Box<dyn SettingsStore>,
    settings: SoundSettings,
    sounds: HashMap<String, RegisteredSound>,
    subscribers: Vec<(SubscriptionId, SettingsCallback)>,
    next_subscription: u64,
}

impl<B: AudioBackend> SoundService<B> {
    pub fn new(backend: B, store: Box<dyn SettingsStore>) -> Self {
        let settings = match store.load() {
            Ok(Some(settings)) => settings,
            Ok(None) => SoundSettings::default(),
            Err(err) => {
                log_error(&err);
                SoundSettings::default()
            }
        };
        tracing::debug!(sound = settings.sound, music = settings.music, "Sound settings loaded");

        Self {
            lifecycle: Lifecycle::Active,
            backend,
            store,
            settings,
            sounds: HashMap::new(),
            subscribers: Vec::new(),
            next_subscription: 1,
        }
    }

    /// Service whose preferences live only as long as the process.
    pub fn in_memory(backend: B) -> Self {
        Self::new(backend, Box::new(MemorySettingsStore::new()))
    }

    fn ensure_active(&self) -> Result<(), GameError> {
        self.lifecycle.ensure_active(COMPONENT)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a sound effect. Effects do not loop unless asked to.
    pub fn register_sound(&mut self, key: &str, config: SoundConfig) -> Result<(), GameError> {
        let asset = self.load(key, &config, SoundKind::Effect)?;
        self.backend.set_muted(asset, !self.settings.sound);
        Ok(())
    }

    /// Register a music track. Music loops unless told otherwise.
    pub fn register_music(&mut self, key: &str, config: SoundConfig) -> Result<(), GameError> {
        self.load(key, &config, SoundKind::Music)?;
        Ok(())
    }

    fn load(&mut self, key: &str, config: &SoundConfig, kind: SoundKind) -> Result<AssetId, GameError> {
        self.ensure_active()?;
        if let Some(previous) = self.sounds.remove(key) {
            self.backend.unload(previous.asset);
        }

        let looping = config.looping.unwrap_or(kind == SoundKind::Music);
        let volume = clamp_volume(config.volume.unwrap_or(1.0));
        let asset = self
            .backend
            .load(&config.src, looping, volume)
            .map_err(|err| GameError::audio(err.to_string(), Some(key)))?;

        self.sounds.insert(
            key.to_string(),
            RegisteredSound {
                asset,
                kind,
                instances: Vec::new(),
            },
        );
        tracing::debug!(key, ?kind, src = %config.src, "Sound registered");
        Ok(asset)
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.sounds.contains_key(key)
    }

    // =========================================================================
    // Playback
    // =========================================================================

    /// Start `key`.
    ///
    /// Returns `None` when the key is unknown (logged as an audio error) or
    /// when it is an effect and sound is disabled. Music started while music
    /// is disabled is paused immediately, so enabling music resumes it.
    pub fn play(&mut self, key: &str, options: PlayOptions) -> Result<Option<InstanceId>, GameError> {
        self.ensure_active()?;
        let Some(sound) = self.sounds.get_mut(key) else {
            log_error(&GameError::audio("Sound is not registered", Some(key)));
            return Ok(None);
        };

        let enabled = match sound.kind {
            SoundKind::Effect => self.settings.sound,
            SoundKind::Music => self.settings.music,
        };
        if sound.kind == SoundKind::Effect && !enabled {
            return Ok(None);
        }

        if let Some(looping) = options.looping {
            self.backend.set_loop(sound.asset, looping);
        }
        if let Some(volume) = options.volume {
            self.backend.set_volume(sound.asset, clamp_volume(volume), None);
        }

        if sound.kind == SoundKind::Effect {
            self.backend.set_muted(sound.asset, false);
        }
        let Some(instance) = self.backend.play(sound.asset) else {
            log_error(&GameError::audio("Backend refused to play", Some(key)));
            return Ok(None);
        };
        if sound.kind == SoundKind::Music && !enabled {
            self.backend.pause(sound.asset, Some(instance));
        }
        sound.instances.push(instance);
        Ok(Some(instance))
    }

    /// Stop one instance, or every instance when `instance` is `None`.
    /// Unknown keys are ignored.
    pub fn stop(&mut self, key: &str, instance: Option<InstanceId>) -> Result<(), GameError> {
        self.ensure_active()?;
        let Some(sound) = self.sounds.get_mut(key) else {
            return Ok(());
        };
        self.backend.stop(sound.asset, instance);
        match instance {
            Some(instance) => sound.instances.retain(|i| *i != instance),
            None => sound.instances.clear(),
        }
        Ok(())
    }

    pub fn pause(&mut self, key: &str, instance: Option<InstanceId>) -> Result<(), GameError> {
        self.ensure_active()?;
        if let Some(sound) = self.sounds.get(key) {
            self.backend.pause(sound.asset, instance);
        }
        Ok(())
    }

    pub fn resume(&mut self, key: &str, instance: Option<InstanceId>) -> Result<(), GameError> {
        self.ensure_active()?;
        if let Some(sound) = self.sounds.get(key) {
            self.backend.resume(sound.asset, instance);
        }
        Ok(())
    }

    /// Set the volume of `key`, clamped to `0.0..=1.0`.
    pub fn set_volume(
        &mut self,
        key: &str,
        volume: f64,
        instance: Option<InstanceId>,
    ) -> Result<(), GameError> {
        self.ensure_active()?;
        if let Some(sound) = self.sounds.get(key) {
            self.backend.set_volume(sound.asset, clamp_volume(volume), instance);
        }
        Ok(())
    }

    pub fn set_master_volume(&mut self, volume: f64) -> Result<(), GameError> {
        self.ensure_active()?;
        self.backend.set_master_volume(clamp_volume(volume));
        Ok(())
    }

    /// Instances started through this service and not yet stopped.
    pub fn instances(&self, key: &str) -> Vec<InstanceId> {
        self.sounds
            .get(key)
            .map(|sound| sound.instances.clone())
            .unwrap_or_default()
    }

    pub fn is_playing(&self, key: &str) -> bool {
        self.sounds
            .get(key)
            .is_some_and(|sound| self.backend.is_playing(sound.asset))
    }

    pub fn stop_all(&mut self) -> Result<(), GameError> {
        self.ensure_active()?;
        self.backend.stop_all();
        for sound in self.sounds.values_mut() {
            sound.instances.clear();
        }
        Ok(())
    }

    // =========================================================================
    // Preferences
    // =========================================================================

    pub fn settings(&self) -> SoundSettings {
        self.settings
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) -> Result<(), GameError> {
        self.ensure_active()?;
        self.apply_sound(enabled);
        self.persist_and_notify();
        Ok(())
    }

    pub fn set_music_enabled(&mut self, enabled: bool) -> Result<(), GameError> {
        self.ensure_active()?;
        self.apply_music(enabled);
        self.persist_and_notify();
        Ok(())
    }

    /// Flip the effects preference and return the new value.
    pub fn toggle_sound(&mut self) -> Result<bool, GameError> {
        self.set_sound_enabled(!self.settings.sound)?;
        Ok(self.settings.sound)
    }

    /// Flip the music preference and return the new value.
    pub fn toggle_music(&mut self) -> Result<bool, GameError> {
        self.set_music_enabled(!self.settings.music)?;
        Ok(self.settings.music)
    }

    pub fn set_settings(&mut self, settings: SoundSettings) -> Result<(), GameError> {
        self.ensure_active()?;
        self.apply_sound(settings.sound);
        self.apply_music(settings.music);
        self.persist_and_notify();
        Ok(())
    }

    fn apply_sound(&mut self, enabled: bool) {
        self.settings.sound = enabled;
        for sound in self.sounds.values() {
            if sound.kind == SoundKind::Effect {
                self.backend.set_muted(sound.asset, !enabled);
            }
        }
    }

    fn apply_music(&mut self, enabled: bool) {
        self.settings.music = enabled;
        for sound in self.sounds.values() {
            if sound.kind != SoundKind::Music || sound.instances.is_empty() {
                continue;
            }
            if enabled {
                self.backend.resume(sound.asset, None);
            } else {
                self.backend.pause(sound.asset, None);
            }
        }
    }

    fn persist_and_notify(&self) {
        if let Err(err) = self.store.save(&self.settings) {
            log_error(&GameError::storage(err.to_string()));
        }
        for (_, callback) in &self.subscribers {
            callback(self.settings);
        }
    }

    /// Call `callback` now with the current settings and again after every
    /// change. Callbacks must not call back into the service.
    pub fn subscribe<F>(&mut self, callback: F) -> Result<SubscriptionId, GameError>
    where
        F: Fn(SoundSettings) + 'static,
    {
        self.ensure_active()?;
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        callback(self.settings);
        self.subscribers.push((id, Box::new(callback)));
        Ok(id)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Stop everything, unload every asset and drop all subscribers.
    /// Repeated calls do nothing.
    pub fn cleanup(&mut self) {
        if !self.lifecycle.is_active() {
            return;
        }
        self.lifecycle = Lifecycle::Destroyed;

        self.backend.stop_all();
        let released = self.sounds.len();
        for (_, sound) in self.sounds.drain() {
            self.backend.unload(sound.asset);
        }
        self.subscribers.clear();
        tracing::info!(released, "Sound service cleaned up");
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ports::{MockAudioBackend, MockSettingsStore};
    use mockall::predicate::eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    const CLICK: AssetId = AssetId(1);
    const THEME: AssetId = AssetId(2);

    /// Backend that loads "click.mp3" as CLICK and anything else as THEME.
    fn backend() -> MockAudioBackend {
        let mut backend = MockAudioBackend::new();
        backend.expect_load().returning(|src, _, _| {
            Ok(if src == "click.mp3" { CLICK } else { THEME })
        });
        backend
    }

    fn service_with(backend: MockAudioBackend, settings: SoundSettings) -> SoundService<MockAudioBackend> {
        SoundService::new(backend, Box::new(MemorySettingsStore::with_settings(settings)))
    }

    #[test]
    fn test_effects_are_skipped_while_sound_is_disabled() {
        let mut backend = backend();
        backend.expect_set_muted().with(eq(CLICK), eq(true)).times(1).return_const(());
        backend.expect_play().never();

        let mut service = service_with(
            backend,
            SoundSettings {
                sound: false,
                music: true,
            },
        );
        service.register_sound("click", SoundConfig::new("click.mp3")).unwrap();

        assert_eq!(service.play("click", PlayOptions::default()).unwrap(), None);
    }

    #[test]
    fn test_music_started_while_disabled_is_paused() {
        let mut backend = backend();
        backend
            .expect_play()
            .with(eq(THEME))
            .times(1)
            .returning(|_| Some(InstanceId(7)));
        backend
            .expect_pause()
            .with(eq(THEME), eq(Some(InstanceId(7))))
            .times(1)
            .return_const(());

        let mut service = service_with(
            backend,
            SoundSettings {
                sound: true,
                music: false,
            },
        );
        service.register_music("theme", SoundConfig::new("theme.mp3")).unwrap();

        assert_eq!(
            service.play("theme", PlayOptions::default()).unwrap(),
            Some(InstanceId(7))
        );
        assert_eq!(service.instances("theme"), vec![InstanceId(7)]);
    }

    #[test]
    fn test_enabling_music_resumes_paused_tracks() {
        let mut backend = backend();
        backend.expect_play().returning(|_| Some(InstanceId(3)));
        backend.expect_pause().return_const(());
        backend
            .expect_resume()
            .with(eq(THEME), eq(None::<InstanceId>))
            .times(1)
            .return_const(());

        let mut service = service_with(
            backend,
            SoundSettings {
                sound: true,
                music: false,
            },
        );
        service.register_music("theme", SoundConfig::new("theme.mp3")).unwrap();
        service.play("theme", PlayOptions::default()).unwrap();

        service.set_music_enabled(true).unwrap();
        assert!(service.settings().music);
    }

    #[test]
    fn test_music_loops_by_default_and_effects_do_not() {
        let mut backend = MockAudioBackend::new();
        backend
            .expect_load()
            .withf(|src, looping, volume| src == "theme.mp3" && *looping && *volume == 1.0)
            .times(1)
            .returning(|_, _, _| Ok(THEME));
        backend
            .expect_load()
            .withf(|src, looping, volume| src == "click.mp3" && !*looping && *volume == 0.5)
            .times(1)
            .returning(|_, _, _| Ok(CLICK));
        backend.expect_set_muted().return_const(());

        let mut service = SoundService::in_memory(backend);
        service.register_music("theme", SoundConfig::new("theme.mp3")).unwrap();
        service
            .register_sound("click", SoundConfig::new("click.mp3").with_volume(0.5))
            .unwrap();
    }

    #[test]
    fn test_unknown_key_plays_nothing() {
        let mut backend = MockAudioBackend::new();
        backend.expect_play().never();
        let mut service = SoundService::in_memory(backend);

        assert_eq!(service.play("missing", PlayOptions::default()).unwrap(), None);
        assert!(!service.is_playing("missing"));
    }

    #[test]
    fn test_set_volume_is_clamped() {
        let mut backend = backend();
        backend.expect_set_muted().return_const(());
        backend
            .expect_set_volume()
            .with(eq(CLICK), eq(1.0), eq(None::<InstanceId>))
            .times(1)
            .return_const(());
        backend
            .expect_set_volume()
            .with(eq(CLICK), eq(0.0), eq(None::<InstanceId>))
            .times(1)
            .return_const(());

        let mut service = SoundService::in_memory(backend);
        service.register_sound("click", SoundConfig::new("click.mp3")).unwrap();
        service.set_volume("click", 3.0, None).unwrap();
        service.set_volume("click", -1.0, None).unwrap();
    }

    #[test]
    fn test_subscribe_fires_immediately_and_on_change() {
        let mut backend = MockAudioBackend::new();
        backend.expect_set_muted().return_const(());
        let mut service = SoundService::in_memory(backend);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = service
            .subscribe(move |settings| sink.borrow_mut().push(settings.sound))
            .unwrap();

        assert!(!service.toggle_sound().unwrap());
        assert!(service.unsubscribe(id));
        service.toggle_sound().unwrap();

        assert_eq!(*seen.borrow(), vec![true, false]);
    }

    #[test]
    fn test_storage_failures_are_swallowed() {
        let mut store = MockSettingsStore::new();
        store
            .expect_load()
            .returning(|| Err(GameError::storage("corrupt preferences")));
        store
            .expect_save()
            .times(1)
            .returning(|_| Err(GameError::storage("quota exceeded")));

        let mut service = SoundService::new(MockAudioBackend::new(), Box::new(store));
        assert_eq!(service.settings(), SoundSettings::default());

        assert!(!service.toggle_music().unwrap());
        assert!(!service.settings().music);
    }

    #[test]
    fn test_cleanup_releases_everything_once() {
        let mut backend = backend();
        backend.expect_set_muted().return_const(());
        backend.expect_stop_all().times(1).return_const(());
        backend.expect_unload().times(2).return_const(());

        let mut service = SoundService::in_memory(backend);
        service.register_sound("click", SoundConfig::new("click.mp3")).unwrap();
        service.register_music("theme", SoundConfig::new("theme.mp3")).unwrap();

        service.cleanup();
        service.cleanup();

        assert!(!service.is_active());
        assert!(!service.is_registered("click"));
        assert!(matches!(
            service.play("click", PlayOptions::default()),
            Err(GameError::AlreadyDestroyed { .. })
        ));
    }

    #[test]
    fn test_reregistering_unloads_previous_asset() {
        let mut backend = backend();
        backend.expect_set_muted().return_const(());
        backend.expect_unload().with(eq(CLICK)).times(1).return_const(());

        let mut service = SoundService::in_memory(backend);
        service.register_sound("click", SoundConfig::new("click.mp3")).unwrap();
        service.register_sound("click", SoundConfig::new("click.mp3")).unwrap();
    }
}
