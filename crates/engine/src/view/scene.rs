//! Scene contract and the registries a scene owns.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gamelab_domain::{GameError, Lifecycle};
use serde_json::{Map, Value};

use crate::events::{EventBus, EventSurface};
use crate::infrastructure::ports::ErrorReporter;
use crate::infrastructure::reporting::TracingReporter;
use crate::view::animations::AnimationManager;
use crate::view::game_objects::GameObjects;
use crate::view::hud::Hud;

/// The rendering collaborator a game drives.
///
/// Methods take `&self`: a scene is shared between the flow controller and
/// the game hooks, so implementations keep their state behind interior
/// mutability.
pub trait Scene {
    /// The surface's publish/subscribe primitive. `None` means the scene
    /// cannot drive a game.
    fn event_surface(&self) -> Option<Rc<dyn EventSurface>>;

    fn show_start_screen(&self);

    fn init_hud(&self, data: &Value);

    fn show_start_game(&self, timescale: Option<f64>);

    fn show_round(&self, round_number: u32, timescale: Option<f64>);

    fn show_round_result(&self, data: &Map<String, Value>);

    fn show_end_game(&self, result: &Value, timescale: Option<f64>);

    fn restart_game(&self);

    fn on_resize(&self, _scale: f64, _width: u32, _height: u32) {}

    /// Release everything the scene holds. Called by the host before it
    /// discards the scene.
    fn teardown(&self) -> Result<(), GameError>;
}

/// Animation Manager, HUD and Game Objects owned by one scene, plus the
/// scene's cached event bus.
pub struct SceneRegistries {
    lifecycle: Cell<Lifecycle>,
    animations: RefCell<AnimationManager>,
    hud: RefCell<Hud>,
    objects: RefCell<GameObjects>,
    bus: RefCell<Option<EventBus>>,
    reporter: Rc<dyn ErrorReporter>,
}

impl Default for SceneRegistries {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRegistries {
    pub fn new() -> Self {
        Self::with_reporter(Rc::new(TracingReporter))
    }

    pub fn with_reporter(reporter: Rc<dyn ErrorReporter>) -> Self {
        Self {
            lifecycle: Cell::new(Lifecycle::Active),
            animations: RefCell::new(AnimationManager::with_reporter(Rc::clone(&reporter))),
            hud: RefCell::new(Hud::with_reporter(Rc::clone(&reporter))),
            objects: RefCell::new(GameObjects::with_reporter(Rc::clone(&reporter))),
            bus: RefCell::new(None),
            reporter,
        }
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.get().is_active()
    }

    /// The scene's event bus, created on first use and cached afterwards.
    pub fn event_bus(&self, scene: &dyn Scene) -> Result<EventBus, GameError> {
        self.lifecycle.get().ensure_active("SceneRegistries")?;
        if let Some(bus) = self.bus.borrow().as_ref() {
            return Ok(bus.clone());
        }
        let bus = EventBus::from_scene(scene)?;
        *self.bus.borrow_mut() = Some(bus.clone());
        Ok(bus)
    }

    pub fn with_animations<R>(
        &self,
        f: impl FnOnce(&mut AnimationManager) -> R,
    ) -> Result<R, GameError> {
        self.lifecycle.get().ensure_active("SceneRegistries")?;
        let mut animations = self
            .animations
            .try_borrow_mut()
            .map_err(|_| GameError::state("animation manager is busy", None))?;
        Ok(f(&mut animations))
    }

    pub fn with_hud<R>(&self, f: impl FnOnce(&mut Hud) -> R) -> Result<R, GameError> {
        self.lifecycle.get().ensure_active("SceneRegistries")?;
        let mut hud = self
            .hud
            .try_borrow_mut()
            .map_err(|_| GameError::state("hud is busy", None))?;
        Ok(f(&mut hud))
    }

    pub fn with_objects<R>(&self, f: impl FnOnce(&mut GameObjects) -> R) -> Result<R, GameError> {
        self.lifecycle.get().ensure_active("SceneRegistries")?;
        let mut objects = self
            .objects
            .try_borrow_mut()
            .map_err(|_| GameError::state("game objects are busy", None))?;
        Ok(f(&mut objects))
    }

    /// Destroy all three registries and drop the cached bus.
    ///
    /// A registry that cannot be torn down is reported as a cleanup error
    /// and does not stop the others.
    pub fn teardown(&self) -> Result<(), GameError> {
        self.lifecycle.get().ensure_active("SceneRegistries")?;
        self.lifecycle.set(Lifecycle::Destroyed);

        match self.animations.try_borrow_mut() {
            Ok(mut animations) => animations.destroy(),
            Err(_) => self
                .reporter
                .report(&GameError::cleanup("animations", "registry is busy")),
        }
        match self.hud.try_borrow_mut() {
            Ok(mut hud) => hud.destroy(),
            Err(_) => self
                .reporter
                .report(&GameError::cleanup("hud", "registry is busy")),
        }
        match self.objects.try_borrow_mut() {
            Ok(mut objects) => objects.destroy(),
            Err(_) => self
                .reporter
                .report(&GameError::cleanup("game objects", "registry is busy")),
        }
        self.bus.borrow_mut().take();

        tracing::debug!("Scene registries torn down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::LocalEmitter;
    use crate::view::capability::Capability;
    use crate::view::hud::HudComponent;

    struct Bare {
        surface: Option<Rc<LocalEmitter>>,
    }

    impl Scene for Bare {
        fn event_surface(&self) -> Option<Rc<dyn EventSurface>> {
            self.surface
                .as_ref()
                .map(|s| Rc::clone(s) as Rc<dyn EventSurface>)
        }
        fn show_start_screen(&self) {}
        fn init_hud(&self, _data: &Value) {}
        fn show_start_game(&self, _timescale: Option<f64>) {}
        fn show_round(&self, _round_number: u32, _timescale: Option<f64>) {}
        fn show_round_result(&self, _data: &Map<String, Value>) {}
        fn show_end_game(&self, _result: &Value, _timescale: Option<f64>) {}
        fn restart_game(&self) {}
        fn teardown(&self) -> Result<(), GameError> {
            Ok(())
        }
    }

    struct Counter(Rc<Cell<u32>>);

    impl HudComponent for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn supports(&self, capability: Capability) -> bool {
            capability == Capability::Destroy
        }

        fn destroy(&mut self) -> Result<(), GameError> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn test_event_bus_is_cached() {
        let emitter = Rc::new(LocalEmitter::new());
        let scene = Bare {
            surface: Some(emitter.clone()),
        };
        let registries = SceneRegistries::new();

        let first = registries.event_bus(&scene).unwrap();
        let second = registries.event_bus(&Bare { surface: None }).unwrap();

        first.on("GAME_INIT", |_: &[Value]| {});
        second.emit("GAME_INIT", &[]);
        assert_eq!(emitter.listener_count("GAME_INIT"), 1);
    }

    #[test]
    fn test_scene_without_surface_fails_initialization() {
        let registries = SceneRegistries::new();
        let err = registries.event_bus(&Bare { surface: None }).unwrap_err();
        assert!(matches!(err, GameError::Initialization(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_teardown_destroys_once_and_blocks_further_use() {
        let destroyed = Rc::new(Cell::new(0));
        let registries = SceneRegistries::new();
        registries
            .with_hud(|hud| hud.add_component(Box::new(Counter(Rc::clone(&destroyed)))))
            .unwrap();

        registries.teardown().unwrap();
        let again = registries.teardown();

        assert_eq!(destroyed.get(), 1);
        assert!(matches!(again, Err(GameError::AlreadyDestroyed { .. })));
        assert!(registries.with_objects(|objects| objects.len()).is_err());
        assert!(!registries.is_active());
    }
}
