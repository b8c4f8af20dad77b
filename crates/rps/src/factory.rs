//! Wires the rock-paper-scissors pieces into a hostable game.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use gamelab_domain::{GameError, GameSettings};
use gamelab_engine::audio::{MemorySettingsStore, SoundSettings};
use gamelab_engine::host::GameFactory;
use gamelab_engine::infrastructure::RuntimeConfig;

use crate::audio::{GameSound, LoggingBackend};
use crate::config::RpsConfig;
use crate::hooks::RpsHooks;
use crate::moves::MoveSource;
use crate::output::LineSink;
use crate::scene::RpsScene;
use crate::session::RpsSession;

pub struct RpsFactory {
    config: RpsConfig,
    sink: Rc<dyn LineSink>,
    moves: Rc<RefCell<dyn MoveSource>>,
}

impl RpsFactory {
    pub fn new(config: RpsConfig, sink: Rc<dyn LineSink>, moves: Rc<RefCell<dyn MoveSource>>) -> Self {
        Self { config, sink, moves }
    }

    pub fn config(&self) -> &RpsConfig {
        &self.config
    }
}

#[async_trait(?Send)]
impl GameFactory for RpsFactory {
    type Scene = RpsScene;
    type Hooks = RpsHooks;

    async fn create_scene(&self, config: &RuntimeConfig) -> Result<Rc<RpsScene>, GameError> {
        tracing::debug!(
            history = config.history_capacity,
            initial_phase = %config.initial_phase,
            best_of = self.config.best_of,
            "Building rock-paper-scissors scene"
        );
        let store = MemorySettingsStore::with_settings(SoundSettings {
            sound: self.config.sound,
            music: self.config.music,
        });
        let sound = GameSound::new(LoggingBackend::new(), Box::new(store));
        let scene = Rc::new(RpsScene::new(Rc::clone(&self.sink), sound));
        scene.create()?;
        Ok(scene)
    }

    fn create_settings(&self) -> GameSettings {
        GameSettings::from(self.config.game_settings())
    }

    fn create_session(&self) -> RpsSession {
        RpsSession::new(self.config.best_of)
    }

    fn create_hooks(&self, scene: Rc<RpsScene>) -> RpsHooks {
        RpsHooks::new(scene, Rc::clone(&self.moves))
    }
}
