//! Event Bus Adapter
//!
//! Wraps whatever emitter a scene's rendering surface exposes so the rest of
//! the runtime never depends on its concrete type. Surfaces without a native
//! `once` get one synthesized on top of `on`/`off`.

use std::cell::Cell;
use std::rc::Rc;

use gamelab_domain::{GameError, GameEvent};
use serde_json::Value;

use crate::events::surface::{EventSurface, Listener, ListenerId};
use crate::view::scene::Scene;

/// Cheap-clone handle onto a scene's event surface.
#[derive(Clone)]
pub struct EventBus {
    surface: Rc<dyn EventSurface>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("native_once", &self.has_native_once())
            .finish()
    }
}

impl EventBus {
    pub fn new(surface: Rc<dyn EventSurface>) -> Self {
        Self { surface }
    }

    /// Attach to the emitter exposed by `scene`.
    ///
    /// A scene without an event surface cannot drive a game; this is a fatal
    /// initialization error.
    pub fn from_scene(scene: &dyn Scene) -> Result<Self, GameError> {
        scene.event_surface().map(Self::new).ok_or_else(|| {
            GameError::initialization("scene does not expose an event surface with on/off/emit")
        })
    }

    pub fn has_native_once(&self) -> bool {
        self.surface.as_once().is_some()
    }

    pub fn on<F>(&self, event: &str, handler: F) -> ListenerId
    where
        F: Fn(&[Value]) + 'static,
    {
        self.surface.on(event, Rc::new(handler))
    }

    pub fn off(&self, event: &str, id: ListenerId) {
        self.surface.off(event, id);
    }

    /// Subscribe for a single delivery.
    pub fn once<F>(&self, event: &str, handler: F) -> ListenerId
    where
        F: Fn(&[Value]) + 'static,
    {
        if let Some(native) = self.surface.as_once() {
            return native.once(event, Rc::new(handler));
        }

        let slot: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
        let surface = Rc::downgrade(&self.surface);
        let name = event.to_string();
        let wrapper_slot = Rc::clone(&slot);
        let wrapper: Listener = Rc::new(move |args: &[Value]| {
            // Empty slot: already delivered
            let Some(id) = wrapper_slot.take() else { return };
            handler(args);
            if let Some(surface) = surface.upgrade() {
                surface.off(&name, id);
            }
        });

        let id = self.surface.on(event, wrapper);
        slot.set(Some(id));
        id
    }

    pub fn emit(&self, event: &str, args: &[Value]) {
        self.surface.emit(event, args);
    }

    /// Emit `event` as its tagged envelope under the event's own name.
    pub fn emit_event(&self, event: &GameEvent) {
        self.surface.emit(event.kind().as_str(), &[event.to_envelope()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::local::LocalEmitter;
    use serde_json::json;
    use std::cell::RefCell;

    fn counter() -> (Rc<Cell<u32>>, impl Fn(&[Value]) + 'static) {
        let hits = Rc::new(Cell::new(0));
        let sink = Rc::clone(&hits);
        (hits, move |_: &[Value]| sink.set(sink.get() + 1))
    }

    #[test]
    fn test_synthesized_once_fires_once_and_unsubscribes() {
        let emitter = Rc::new(LocalEmitter::without_once());
        let bus = EventBus::new(emitter.clone());
        assert!(!bus.has_native_once());

        let (hits, handler) = counter();
        bus.once("GAME_STARTED", handler);
        assert_eq!(emitter.listener_count("GAME_STARTED"), 1);

        bus.emit("GAME_STARTED", &[]);
        bus.emit("GAME_STARTED", &[]);

        assert_eq!(hits.get(), 1);
        assert_eq!(emitter.listener_count("GAME_STARTED"), 0);
    }

    #[test]
    fn test_synthesized_once_survives_reentrant_emit() {
        let emitter = Rc::new(LocalEmitter::without_once());
        let bus = EventBus::new(emitter.clone());
        let hits = Rc::new(Cell::new(0));

        let inner_bus = bus.clone();
        let sink = Rc::clone(&hits);
        bus.once("PING", move |_: &[Value]| {
            sink.set(sink.get() + 1);
            inner_bus.emit("PING", &[]);
        });

        bus.emit("PING", &[]);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_native_once_is_preferred() {
        let emitter = Rc::new(LocalEmitter::new());
        let bus = EventBus::new(emitter.clone());
        assert!(bus.has_native_once());

        let (hits, handler) = counter();
        bus.once("GAME_END", handler);
        bus.emit("GAME_END", &[]);
        bus.emit("GAME_END", &[]);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_off_by_id() {
        let bus = EventBus::new(Rc::new(LocalEmitter::new()));
        let (hits, handler) = counter();
        let id = bus.on("ROUND_STARTED", handler);
        bus.off("ROUND_STARTED", id);
        bus.emit("ROUND_STARTED", &[]);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_emit_event_sends_envelope() {
        let bus = EventBus::new(Rc::new(LocalEmitter::new()));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.on("GAME_STARTED", move |args: &[Value]| sink.borrow_mut().extend_from_slice(args));

        bus.emit_event(&GameEvent::GameStarted);
        assert_eq!(*seen.borrow(), vec![json!({"type": "GAME_STARTED"})]);
    }
}
