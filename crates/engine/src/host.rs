//! Game Host
//!
//! Drives the asynchronous setup of one game session: the factory builds a
//! scene (possibly loading assets), then game data and hooks, and finally the
//! flow controller. Every step observes a [`CancellationToken`] so a host
//! destroyed mid-setup leaves nothing half-built behind.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use async_trait::async_trait;
use gamelab_domain::{GameData, GameError, GameSettings, Lifecycle, PhaseLedger};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::events::{EventBus, ListenerId};
use crate::flow::{FlowOptions, GameHooks, Gameflow};
use crate::infrastructure::config::RuntimeConfig;
use crate::infrastructure::reporting::safe_cleanup;
use crate::view::scene::Scene;

const COMPONENT: &str = "GameHost";

/// Identifies one hosted session in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Builds the pieces of one concrete game.
#[async_trait(?Send)]
pub trait GameFactory {
    type Scene: Scene + 'static;
    type Hooks: GameHooks;

    /// Create the scene and everything it needs before a game can start.
    async fn create_scene(&self, config: &RuntimeConfig) -> Result<Rc<Self::Scene>, GameError>;

    fn create_settings(&self) -> GameSettings;

    fn create_session(&self) -> <Self::Hooks as GameHooks>::Session;

    fn create_hooks(&self, scene: Rc<Self::Scene>) -> Self::Hooks;
}

/// Owns one game session from setup to teardown.
pub struct GameHost<F: GameFactory> {
    id: SessionId,
    factory: F,
    config: RuntimeConfig,
    options: FlowOptions,
    token: CancellationToken,
    lifecycle: Cell<Lifecycle>,
    scene: RefCell<Option<Rc<F::Scene>>>,
    flow: RefCell<Option<Gameflow<F::Hooks>>>,
}

impl<F: GameFactory> GameHost<F> {
    pub fn new(factory: F, config: RuntimeConfig) -> Self {
        Self::with_options(factory, config, FlowOptions::default())
    }

    pub fn with_options(factory: F, config: RuntimeConfig, options: FlowOptions) -> Self {
        Self {
            id: SessionId::new(),
            factory,
            config,
            options,
            token: CancellationToken::new(),
            lifecycle: Cell::new(Lifecycle::Active),
            scene: RefCell::new(None),
            flow: RefCell::new(None),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.get().is_active()
    }

    pub fn is_ready(&self) -> bool {
        self.flow.borrow().is_some()
    }

    /// Token observed by setup. Cancelling it from outside aborts an
    /// in-flight [`init`](Self::init) without destroying the host.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn scene(&self) -> Option<Rc<F::Scene>> {
        self.scene.borrow().clone()
    }

    pub fn flow(&self) -> Option<Gameflow<F::Hooks>> {
        self.flow.borrow().clone()
    }

    /// Run setup to completion.
    ///
    /// Returns `Ok(None)` when setup was cancelled; any scene built so far is
    /// torn down. Calling again after success returns the running flow.
    pub async fn init(&self) -> Result<Option<Gameflow<F::Hooks>>, GameError> {
        self.lifecycle.get().ensure_active(COMPONENT)?;
        if let Some(flow) = self.flow() {
            return Ok(Some(flow));
        }
        if self.cancelled("create_scene") {
            return Ok(None);
        }

        tracing::info!(session = %self.id, "Creating scene");
        let scene = tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                tracing::info!(session = %self.id, "Game setup cancelled while creating scene");
                return Ok(None);
            }
            scene = self.factory.create_scene(&self.config) => scene?,
        };
        *self.scene.borrow_mut() = Some(Rc::clone(&scene));
        if self.cancelled("create_data") {
            self.discard_scene();
            return Ok(None);
        }

        let now = self.options.clock.now();
        let ledger = PhaseLedger::with_capacity(
            self.config.initial_phase,
            self.config.history_capacity,
            now,
        );
        let data = GameData::with_ledger(
            self.factory.create_settings(),
            self.factory.create_session(),
            ledger,
        );
        if self.cancelled("create_hooks") {
            self.discard_scene();
            return Ok(None);
        }

        let hooks = self.factory.create_hooks(Rc::clone(&scene));
        if self.cancelled("create_flow") {
            self.discard_scene();
            return Ok(None);
        }

        let scene: Rc<dyn Scene> = scene;
        let flow = match Gameflow::with_options(data, scene, hooks, self.options.clone()) {
            Ok(flow) => flow,
            Err(err) => {
                self.discard_scene();
                return Err(err);
            }
        };
        *self.flow.borrow_mut() = Some(flow.clone());
        tracing::info!(session = %self.id, phase = ?flow.current_phase().ok(), "Game ready");
        Ok(Some(flow))
    }

    fn cancelled(&self, step: &str) -> bool {
        let cancelled = self.token.is_cancelled();
        if cancelled {
            tracing::info!(session = %self.id, step, "Game setup cancelled");
        }
        cancelled
    }

    fn discard_scene(&self) {
        let scene = self.scene.borrow_mut().take();
        if let Some(scene) = scene {
            safe_cleanup("scene", || scene.teardown());
        }
    }

    fn running_flow(&self) -> Result<Gameflow<F::Hooks>, GameError> {
        self.lifecycle.get().ensure_active(COMPONENT)?;
        self.flow()
            .ok_or_else(|| GameError::state("game has not finished setup", None))
    }

    pub fn event_bus(&self) -> Result<EventBus, GameError> {
        self.running_flow()?.event_bus()
    }

    pub fn emit(&self, event: &str, args: &[Value]) -> Result<(), GameError> {
        self.running_flow()?.emit(event, args)
    }

    pub fn on<H>(&self, event: &str, handler: H) -> Result<ListenerId, GameError>
    where
        H: Fn(&[Value]) + 'static,
    {
        Ok(self.event_bus()?.on(event, handler))
    }

    pub fn once<H>(&self, event: &str, handler: H) -> Result<ListenerId, GameError>
    where
        H: Fn(&[Value]) + 'static,
    {
        Ok(self.event_bus()?.once(event, handler))
    }

    pub fn off(&self, event: &str, id: ListenerId) -> Result<(), GameError> {
        self.event_bus()?.off(event, id);
        Ok(())
    }

    pub fn resize(&self, scale: f64, width: u32, height: u32) -> Result<(), GameError> {
        self.lifecycle.get().ensure_active(COMPONENT)?;
        if let Some(scene) = self.scene() {
            scene.on_resize(scale, width, height);
        }
        Ok(())
    }

    /// Cancel any in-flight setup, destroy the flow and tear down the scene.
    ///
    /// A second call returns `AlreadyDestroyed` and has no side effects.
    pub fn destroy(&self) -> Result<(), GameError> {
        self.lifecycle.get().ensure_active(COMPONENT)?;
        self.lifecycle.set(Lifecycle::Destroyed);
        self.token.cancel();

        let flow = self.flow.borrow_mut().take();
        if let Some(flow) = flow {
            safe_cleanup("gameflow", || flow.destroy());
        }
        self.discard_scene();
        tracing::info!(session = %self.id, "Game host destroyed");
        Ok(())
    }
}

impl<F: GameFactory> Drop for GameHost<F> {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventSurface, LocalEmitter};
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::reporting::RecordingReporter;
    use chrono::{TimeZone, Utc};
    use gamelab_domain::{Phase, SessionData};
    use serde_json::{json, Map};
    use std::time::Duration;
    use tokio::sync::Notify;
    use tokio::task::LocalSet;

    #[derive(Default)]
    struct HostScene {
        surface: Rc<LocalEmitter>,
        start_screens: Cell<u32>,
        teardowns: Cell<u32>,
    }

    impl Scene for HostScene {
        fn event_surface(&self) -> Option<Rc<dyn EventSurface>> {
            let surface: Rc<dyn EventSurface> = self.surface.clone();
            Some(surface)
        }
        fn show_start_screen(&self) {
            self.start_screens.set(self.start_screens.get() + 1);
        }
        fn init_hud(&self, _data: &Value) {}
        fn show_start_game(&self, _timescale: Option<f64>) {}
        fn show_round(&self, _round_number: u32, _timescale: Option<f64>) {}
        fn show_round_result(&self, _data: &Map<String, Value>) {}
        fn show_end_game(&self, _result: &Value, _timescale: Option<f64>) {}
        fn restart_game(&self) {}
        fn teardown(&self) -> Result<(), GameError> {
            self.teardowns.set(self.teardowns.get() + 1);
            Ok(())
        }
    }

    #[derive(Default)]
    struct Session {
        round: u32,
    }

    impl SessionData for Session {
        fn round_number(&self) -> u32 {
            self.round
        }
        fn round_result(&self) -> Map<String, Value> {
            Map::new()
        }
        fn reset_data(&mut self) {
            self.round = 0;
        }
    }

    struct Hooks {
        started: Rc<Cell<u32>>,
    }

    impl GameHooks for Hooks {
        type Session = Session;

        fn start_game(&self, _flow: &Gameflow<Self>) -> Result<(), GameError> {
            self.started.set(self.started.get() + 1);
            Ok(())
        }
        fn start_round(&self, _flow: &Gameflow<Self>, _round: u32) -> Result<(), GameError> {
            Ok(())
        }
        fn show_round_result(
            &self,
            _flow: &Gameflow<Self>,
            _data: &Map<String, Value>,
        ) -> Result<(), GameError> {
            Ok(())
        }
        fn show_end_game(
            &self,
            _flow: &Gameflow<Self>,
            _result: &Value,
            _timescale: Option<f64>,
        ) -> Result<(), GameError> {
            Ok(())
        }
        fn restart_game(&self, _flow: &Gameflow<Self>) -> Result<(), GameError> {
            Ok(())
        }
    }

    /// Factory whose scene creation can be held open until released.
    struct Factory {
        scene: Rc<HostScene>,
        gate: Option<Rc<Notify>>,
        started: Rc<Cell<u32>>,
        fail_scene: bool,
    }

    impl Factory {
        fn immediate() -> Self {
            Self {
                scene: Rc::new(HostScene::default()),
                gate: None,
                started: Rc::new(Cell::new(0)),
                fail_scene: false,
            }
        }

        fn gated(gate: Rc<Notify>) -> Self {
            Self {
                gate: Some(gate),
                ..Self::immediate()
            }
        }
    }

    #[async_trait(?Send)]
    impl GameFactory for Factory {
        type Scene = HostScene;
        type Hooks = Hooks;

        async fn create_scene(&self, _config: &RuntimeConfig) -> Result<Rc<HostScene>, GameError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail_scene {
                return Err(GameError::initialization("assets missing"));
            }
            Ok(Rc::clone(&self.scene))
        }

        fn create_settings(&self) -> GameSettings {
            GameSettings::new()
        }

        fn create_session(&self) -> Session {
            Session::default()
        }

        fn create_hooks(&self, _scene: Rc<HostScene>) -> Hooks {
            Hooks {
                started: Rc::clone(&self.started),
            }
        }
    }

    fn options() -> FlowOptions {
        FlowOptions {
            reporter: Rc::new(RecordingReporter::new()),
            clock: Rc::new(FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_init_builds_flow_in_initial_phase() {
        let factory = Factory::immediate();
        let scene = Rc::clone(&factory.scene);
        let host = GameHost::with_options(factory, RuntimeConfig::default(), options());

        let flow = host.init().await.unwrap().unwrap();

        assert!(host.is_ready());
        assert_eq!(flow.current_phase().unwrap(), Phase::Init);
        assert_eq!(scene.start_screens.get(), 1);
        assert_eq!(flow.data().unwrap().ledger().capacity(), RuntimeConfig::default().history_capacity);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_init_respects_configured_initial_phase_and_capacity() {
        let factory = Factory::immediate();
        let started = Rc::clone(&factory.started);
        let config = RuntimeConfig {
            history_capacity: 3,
            initial_phase: Phase::Start,
        };
        let host = GameHost::with_options(factory, config, options());

        let flow = host.init().await.unwrap().unwrap();

        assert_eq!(flow.current_phase().unwrap(), Phase::Start);
        assert_eq!(started.get(), 1);
        assert_eq!(flow.data().unwrap().ledger().capacity(), 3);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_second_init_returns_running_flow() {
        let factory = Factory::immediate();
        let scene = Rc::clone(&factory.scene);
        let host = GameHost::with_options(factory, RuntimeConfig::default(), options());

        host.init().await.unwrap();
        host.init().await.unwrap();

        assert_eq!(scene.start_screens.get(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_cancel_before_init_builds_nothing() {
        let factory = Factory::immediate();
        let scene = Rc::clone(&factory.scene);
        let host = GameHost::with_options(factory, RuntimeConfig::default(), options());
        host.cancellation_token().cancel();

        assert!(host.init().await.unwrap().is_none());
        assert!(!host.is_ready());
        assert_eq!(scene.start_screens.get(), 0);
        assert_eq!(scene.teardowns.get(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_destroy_during_scene_creation_cancels_setup() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let gate = Rc::new(Notify::new());
                let factory = Factory::gated(Rc::clone(&gate));
                let scene = Rc::clone(&factory.scene);
                let host = Rc::new(GameHost::with_options(
                    factory,
                    RuntimeConfig::default(),
                    options(),
                ));

                let setup = {
                    let host = Rc::clone(&host);
                    tokio::task::spawn_local(async move { host.init().await })
                };
                tokio::time::sleep(Duration::from_millis(5)).await;

                host.destroy().unwrap();
                gate.notify_one();

                let outcome = setup.await.unwrap().unwrap();
                assert!(outcome.is_none());
                assert!(!host.is_ready());
                assert_eq!(scene.start_screens.get(), 0);
                assert!(matches!(
                    host.emit("GAME_INIT", &[]),
                    Err(GameError::AlreadyDestroyed { .. })
                ));
            })
            .await;
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_scene_failure_is_returned() {
        let mut factory = Factory::immediate();
        factory.fail_scene = true;
        let host = GameHost::with_options(factory, RuntimeConfig::default(), options());

        let err = host.init().await.err().unwrap();

        assert!(matches!(err, GameError::Initialization(_)));
        assert!(!host.is_ready());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_emit_forwards_to_flow() {
        let factory = Factory::immediate();
        let started = Rc::clone(&factory.started);
        let host = GameHost::with_options(factory, RuntimeConfig::default(), options());
        let flow = host.init().await.unwrap().unwrap();

        host.emit("GAME_STARTED", &[]).unwrap();

        assert_eq!(flow.current_phase().unwrap(), Phase::Start);
        assert_eq!(started.get(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_emit_before_setup_is_state_error() {
        let host = GameHost::with_options(Factory::immediate(), RuntimeConfig::default(), options());

        assert!(matches!(
            host.emit("GAME_STARTED", &[]),
            Err(GameError::State { .. })
        ));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_on_receives_forwarded_events() {
        let host = GameHost::with_options(Factory::immediate(), RuntimeConfig::default(), options());
        host.init().await.unwrap();
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);

        host.once("SCORE", move |_| counter.set(counter.get() + 1)).unwrap();
        host.emit("SCORE", &[json!(1)]).unwrap();
        host.emit("SCORE", &[json!(2)]).unwrap();

        assert_eq!(seen.get(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_destroy_tears_down_everything_once() {
        let factory = Factory::immediate();
        let scene = Rc::clone(&factory.scene);
        let host = GameHost::with_options(factory, RuntimeConfig::default(), options());
        let flow = host.init().await.unwrap().unwrap();

        host.destroy().unwrap();

        assert!(!flow.is_active());
        assert_eq!(scene.teardowns.get(), 1);
        assert_eq!(scene.surface.total_listeners(), 0);
        assert!(matches!(
            host.destroy(),
            Err(GameError::AlreadyDestroyed { .. })
        ));
        assert_eq!(scene.teardowns.get(), 1);
    }
}
