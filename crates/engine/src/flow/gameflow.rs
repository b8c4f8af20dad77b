//! Gameflow - the phase state machine
//!
//! Subscribes to the lifecycle events on the scene's event bus, normalizes
//! their payloads, records the transition in the game data and runs the
//! matching phase-entry hook.
//!
//! ## Ownership
//!
//! `Gameflow` is a cheap-clone handle. Event handlers hold only weak
//! references back to it, so dropping the last handle releases the game
//! data and scene and unsubscribes every handler, even without `destroy()`.
//!
//! ## Failure semantics
//!
//! Hook failures are wrapped as event errors and reported. Recoverable ones
//! stop there; non-recoverable ones are returned from the `emit` (or
//! `change_state`) call that triggered the transition. A fatal error is
//! reported once however many nested transitions it unwinds through. When
//! the event came straight from the scene's surface there is no caller to
//! return it to, so it is reported and dropped.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use gamelab_domain::{
    normalize_game_end, normalize_round_completed, GameData, GameEndOutcome, GameError,
    GameEvent, GameEventKind, Lifecycle, Phase, Transition,
};
use serde_json::Value;

use crate::events::{EventBus, ListenerId};
use crate::flow::hooks::GameHooks;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::ports::{ClockPort, ErrorReporter};
use crate::infrastructure::reporting::{escalate, TracingReporter};
use crate::view::scene::Scene;

const COMPONENT: &str = "Gameflow";

/// Collaborators a flow reports to and reads time from.
#[derive(Clone)]
pub struct FlowOptions {
    pub reporter: Rc<dyn ErrorReporter>,
    pub clock: Rc<dyn ClockPort>,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            reporter: Rc::new(TracingReporter),
            clock: Rc::new(SystemClock::new()),
        }
    }
}

struct FlowInner<H: GameHooks> {
    lifecycle: Cell<Lifecycle>,
    bus: RefCell<Option<EventBus>>,
    scene: RefCell<Option<Rc<dyn Scene>>>,
    data: RefCell<Option<GameData<H::Session>>>,
    handlers: RefCell<HashMap<String, ListenerId>>,
    delivery: Delivery,
    hooks: H,
    reporter: Rc<dyn ErrorReporter>,
    clock: Rc<dyn ClockPort>,
}

impl<H: GameHooks> Drop for FlowInner<H> {
    fn drop(&mut self) {
        if !self.lifecycle.get().is_active() {
            return;
        }
        let Some(bus) = self.bus.get_mut().take() else {
            return;
        };
        for (event, id) in self.handlers.get_mut().drain() {
            bus.off(&event, id);
        }
    }
}

/// Bookkeeping for the event delivery currently on the stack.
#[derive(Default)]
struct Delivery {
    /// Open `Gameflow::emit` calls
    emits: Cell<u32>,
    /// Running handlers, nested or not
    handlers: Cell<u32>,
    /// First non-recoverable error waiting for the innermost open emit
    fatal: RefCell<Option<GameError>>,
    /// Fatal error already reported during this delivery
    reported: RefCell<Option<GameError>>,
}

impl Delivery {
    fn in_progress(&self) -> bool {
        self.emits.get() > 0 || self.handlers.get() > 0
    }

    fn enter_handler(&self) {
        self.handlers.set(self.handlers.get() + 1);
    }

    fn leave_handler(&self) {
        self.handlers.set(self.handlers.get().saturating_sub(1));
    }

    fn store_fatal(&self, err: GameError) {
        let mut fatal = self.fatal.borrow_mut();
        if fatal.is_none() {
            *fatal = Some(err);
        }
    }

    /// Forget what was reported once nothing is being delivered.
    fn settle(&self) {
        if !self.in_progress() {
            self.reported.borrow_mut().take();
        }
    }
}

/// Flow controller handle.
pub struct Gameflow<H: GameHooks> {
    inner: Rc<FlowInner<H>>,
}

impl<H: GameHooks> Clone for Gameflow<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Non-owning flow handle for closures stored on the event surface.
pub struct WeakGameflow<H: GameHooks> {
    inner: Weak<FlowInner<H>>,
}

impl<H: GameHooks> Clone for WeakGameflow<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<H: GameHooks> WeakGameflow<H> {
    pub fn upgrade(&self) -> Option<Gameflow<H>> {
        self.inner.upgrade().map(|inner| Gameflow { inner })
    }
}

impl<H: GameHooks> Gameflow<H> {
    /// Build a flow over `data` and `scene`, then enter the phase `data`
    /// currently reports.
    pub fn new(data: GameData<H::Session>, scene: Rc<dyn Scene>, hooks: H) -> Result<Self, GameError> {
        Self::with_options(data, scene, hooks, FlowOptions::default())
    }

    pub fn with_options(
        data: GameData<H::Session>,
        scene: Rc<dyn Scene>,
        hooks: H,
        options: FlowOptions,
    ) -> Result<Self, GameError> {
        let bus = match EventBus::from_scene(scene.as_ref()) {
            Ok(bus) => bus,
            Err(err) => {
                options.reporter.report(&err);
                return Err(err);
            }
        };

        let flow = Self {
            inner: Rc::new(FlowInner {
                lifecycle: Cell::new(Lifecycle::Active),
                bus: RefCell::new(Some(bus)),
                scene: RefCell::new(Some(scene)),
                data: RefCell::new(Some(data)),
                handlers: RefCell::new(HashMap::new()),
                delivery: Delivery::default(),
                hooks,
                reporter: options.reporter,
                clock: options.clock,
            }),
        };

        flow.register_lifecycle_handlers()?;
        if let Err(err) = flow.inner.hooks.register_custom_handlers(&flow) {
            escalate(
                flow.reporter(),
                GameError::handler_failed("register_custom_handlers", &err),
            )?;
        }

        let phase = flow.current_phase()?;
        tracing::info!(phase = %phase, "Gameflow ready, entering current phase");
        flow.enter_phase(phase, Transition::Plain)?;
        Ok(flow)
    }

    pub fn is_active(&self) -> bool {
        self.inner.lifecycle.get().is_active()
    }

    /// A handle that does not keep the flow alive.
    pub fn downgrade(&self) -> WeakGameflow<H> {
        WeakGameflow {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn ensure_active(&self) -> Result<(), GameError> {
        self.inner.lifecycle.get().ensure_active(COMPONENT)
    }

    fn reporter(&self) -> &dyn ErrorReporter {
        self.inner.reporter.as_ref()
    }

    /// Report a non-recoverable error unless this delivery already did.
    fn report_fatal(&self, err: &GameError) {
        let delivery = &self.inner.delivery;
        if delivery.reported.borrow().as_ref() == Some(err) {
            return;
        }
        self.reporter().report(err);
        if delivery.in_progress() {
            *delivery.reported.borrow_mut() = Some(err.clone());
        }
    }

    pub fn hooks(&self) -> &H {
        &self.inner.hooks
    }

    pub fn scene(&self) -> Result<Rc<dyn Scene>, GameError> {
        self.ensure_active()?;
        self.inner
            .scene
            .borrow()
            .clone()
            .ok_or(GameError::already_destroyed(COMPONENT))
    }

    pub fn event_bus(&self) -> Result<EventBus, GameError> {
        self.ensure_active()?;
        self.inner
            .bus
            .borrow()
            .clone()
            .ok_or(GameError::already_destroyed(COMPONENT))
    }

    /// Shared access to the game data.
    ///
    /// Fails while a mutable borrow is held elsewhere (for example by a hook
    /// further up the call stack).
    pub fn data(&self) -> Result<Ref<'_, GameData<H::Session>>, GameError> {
        self.ensure_active()?;
        let slot = self
            .inner
            .data
            .try_borrow()
            .map_err(|_| GameError::state("game data is busy", None))?;
        Ref::filter_map(slot, Option::as_ref).map_err(|_| GameError::already_destroyed(COMPONENT))
    }

    pub fn data_mut(&self) -> Result<RefMut<'_, GameData<H::Session>>, GameError> {
        self.ensure_active()?;
        let slot = self
            .inner
            .data
            .try_borrow_mut()
            .map_err(|_| GameError::state("game data is busy", None))?;
        RefMut::filter_map(slot, Option::as_mut).map_err(|_| GameError::already_destroyed(COMPONENT))
    }

    fn read_data<R>(&self, read: impl FnOnce(&GameData<H::Session>) -> R) -> Result<R, GameError> {
        let data = self.data()?;
        Ok(read(&data))
    }

    pub fn current_phase(&self) -> Result<Phase, GameError> {
        self.read_data(GameData::current_phase)
    }

    /// Replace the game settings.
    ///
    /// A value that is not a JSON object is reported as a validation error
    /// and the previous settings stay in place.
    pub fn set_settings(&self, value: Value) -> Result<(), GameError> {
        self.ensure_active()?;
        let result = self.data_mut().and_then(|mut data| data.set_settings(value));
        match result {
            Ok(()) => Ok(()),
            Err(err) => escalate(self.reporter(), err),
        }
    }

    /// Number of event names this flow currently has a handler for.
    pub fn handler_count(&self) -> usize {
        self.inner.handlers.borrow().len()
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    fn register_lifecycle_handlers(&self) -> Result<(), GameError> {
        for kind in GameEventKind::ALL {
            self.subscribe_handler(kind.as_str(), move |flow, args| {
                flow.handle_event(kind, args.first())
            })?;
        }
        Ok(())
    }

    /// Register a fallible handler that receives this flow.
    ///
    /// The handler holds the flow weakly. Recoverable errors it returns are
    /// reported. A non-recoverable one is reported and returned from the
    /// `Gameflow::emit` that delivered the event; an event emitted directly
    /// on the surface has no such caller and the error stops at the report.
    pub fn subscribe_handler<F>(&self, event: &str, handler: F) -> Result<ListenerId, GameError>
    where
        F: Fn(&Gameflow<H>, &[Value]) -> Result<(), GameError> + 'static,
    {
        let weak = self.downgrade();
        let name = event.to_string();
        self.subscribe(event, move |args: &[Value]| {
            let Some(flow) = weak.upgrade() else {
                return;
            };
            let delivery = &flow.inner.delivery;
            delivery.enter_handler();
            let result = handler(&flow, args);
            delivery.leave_handler();

            match result {
                Ok(()) => {}
                Err(err) if err.is_recoverable() => flow.reporter().report(&err),
                Err(err) => {
                    flow.report_fatal(&err);
                    if delivery.emits.get() > 0 {
                        delivery.store_fatal(err);
                    } else {
                        tracing::warn!(
                            event = %name,
                            error = %err,
                            "Fatal error outside a flow emit, dropped after reporting"
                        );
                    }
                }
            }
            delivery.settle();
        })
    }

    /// Register `handler` as this flow's only handler for `event`.
    ///
    /// A handler previously registered under the same name is unsubscribed
    /// first.
    pub fn subscribe<F>(&self, event: &str, handler: F) -> Result<ListenerId, GameError>
    where
        F: Fn(&[Value]) + 'static,
    {
        let bus = self.event_bus()?;
        let previous = self.inner.handlers.borrow_mut().remove(event);
        if let Some(previous) = previous {
            tracing::debug!(event, "Replacing existing handler");
            bus.off(event, previous);
        }
        let id = bus.on(event, handler);
        self.inner.handlers.borrow_mut().insert(event.to_string(), id);
        Ok(id)
    }

    /// Remove this flow's handler for `event`. Returns whether one existed.
    pub fn unsubscribe(&self, event: &str) -> Result<bool, GameError> {
        let bus = self.event_bus()?;
        let removed = self.inner.handlers.borrow_mut().remove(event);
        Ok(match removed {
            Some(id) => {
                bus.off(event, id);
                true
            }
            None => false,
        })
    }

    /// Unsubscribe every handler this flow registered. Safe to repeat; later
    /// calls find nothing to remove.
    pub fn cleanup_event_handlers(&self) -> usize {
        let drained: Vec<(String, ListenerId)> = self.inner.handlers.borrow_mut().drain().collect();
        let bus = self.inner.bus.borrow().clone();
        if let Some(bus) = bus {
            for (event, id) in &drained {
                bus.off(event, *id);
            }
        }
        if !drained.is_empty() {
            tracing::debug!(count = drained.len(), "Event handlers cleaned up");
        }
        drained.len()
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Emit `event` on the bus and deliver it synchronously.
    ///
    /// Returns the first non-recoverable error raised by a transition during
    /// this dispatch.
    pub fn emit(&self, event: &str, args: &[Value]) -> Result<(), GameError> {
        let bus = self.event_bus()?;
        let delivery = &self.inner.delivery;
        let outer = delivery.fatal.borrow_mut().take();
        delivery.emits.set(delivery.emits.get() + 1);
        bus.emit(event, args);
        delivery.emits.set(delivery.emits.get().saturating_sub(1));

        let fatal = std::mem::replace(&mut *delivery.fatal.borrow_mut(), outer);
        delivery.settle();
        match fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Emit a typed event as its tagged envelope.
    pub fn dispatch(&self, event: &GameEvent) -> Result<(), GameError> {
        self.emit(event.kind().as_str(), &[event.to_envelope()])
    }

    fn handle_event(&self, kind: GameEventKind, payload: Option<&Value>) -> Result<(), GameError> {
        match kind {
            GameEventKind::GameInit => self.change_state(Phase::Init, Transition::Plain),
            GameEventKind::GameStarted => self.change_state(Phase::Start, Transition::Plain),
            GameEventKind::RoundStarted => self.change_state(Phase::Round, Transition::Plain),
            GameEventKind::RoundCompleted => {
                let round = self.read_data(GameData::round_number)?;
                match normalize_round_completed(payload, round) {
                    Some(data) => {
                        self.change_state(Phase::RoundResult, Transition::RoundResult(data))
                    }
                    None => {
                        tracing::debug!(event = %kind, "No usable payload, transition skipped");
                        Ok(())
                    }
                }
            }
            GameEventKind::GameEnd => match normalize_game_end(payload) {
                Some(outcome) => self.change_state(Phase::End, Transition::GameEnd(outcome)),
                None => {
                    tracing::debug!(event = %kind, "No payload, transition skipped");
                    Ok(())
                }
            },
            GameEventKind::GameRestarted => self.change_state(Phase::Restart, Transition::Plain),
        }
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Record a transition into `phase` and run its entry hook.
    #[tracing::instrument(level = "debug", skip(self, transition), fields(phase = %phase))]
    pub fn change_state(&self, phase: Phase, transition: Transition) -> Result<(), GameError> {
        self.ensure_active()?;
        let now = self.inner.clock.now();

        let recorded = match self.inner.data.try_borrow_mut() {
            Ok(mut slot) => match slot.as_mut() {
                Some(data) => Ok(data.change_state(phase, transition.metadata(), now).previous_state),
                None => Err(GameError::already_destroyed(COMPONENT)),
            },
            Err(_) => Err(GameError::state(
                "game data is busy, transition dropped",
                Some(phase.as_str()),
            )),
        };
        let previous = match recorded {
            Ok(previous) => previous,
            Err(err) => return escalate(self.reporter(), err),
        };

        tracing::info!(
            phase = %phase,
            previous = ?previous,
            "Phase changed"
        );
        self.enter_phase(phase, transition)
    }

    /// Like [`change_state`](Self::change_state) for a phase given by name.
    ///
    /// An unknown name is reported as a state error and changes nothing.
    pub fn change_state_named(&self, name: &str, transition: Transition) -> Result<(), GameError> {
        self.ensure_active()?;
        match name.parse::<Phase>() {
            Ok(phase) => self.change_state(phase, transition),
            Err(err) => escalate(self.reporter(), err),
        }
    }

    fn enter_phase(&self, phase: Phase, transition: Transition) -> Result<(), GameError> {
        let hooks = &self.inner.hooks;
        let outcome = match phase {
            Phase::Init => self.scene().map(|scene| scene.show_start_screen()),
            Phase::Start => hooks.start_game(self),
            Phase::Round => self
                .read_data(GameData::round_number)
                .and_then(|round| hooks.start_round(self, round)),
            Phase::RoundResult => {
                let data = match transition {
                    Transition::RoundResult(data) => Ok(data),
                    _ => self.read_data(GameData::round_result),
                };
                data.and_then(|data| hooks.show_round_result(self, &data))
            }
            Phase::End => {
                let outcome = match transition {
                    Transition::GameEnd(outcome) => Ok(outcome),
                    _ => self.read_data(|data| GameEndOutcome {
                        result: Value::Object(data.round_result()),
                        timescale: None,
                    }),
                };
                outcome.and_then(|outcome| {
                    hooks.show_end_game(self, &outcome.result, outcome.timescale)
                })
            }
            Phase::Restart => hooks.restart_game(self),
            other => {
                return escalate(
                    self.reporter(),
                    GameError::state("no entry hook for phase", Some(other.as_str())),
                )
            }
        };

        match outcome {
            Ok(()) => Ok(()),
            // Already wrapped by a nested transition; keep it as raised there
            Err(err @ GameError::Event { recoverable: false, .. }) => {
                self.report_fatal(&err);
                Err(err)
            }
            Err(err) => {
                let err = GameError::handler_failed(phase.as_str(), &err);
                if err.is_recoverable() {
                    escalate(self.reporter(), err)
                } else {
                    self.report_fatal(&err);
                    Err(err)
                }
            }
        }
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Unsubscribe everything and release the bus, scene and game data.
    ///
    /// A second call returns `AlreadyDestroyed` and has no side effects.
    pub fn destroy(&self) -> Result<(), GameError> {
        self.ensure_active()?;
        let removed = self.cleanup_event_handlers();
        self.inner.lifecycle.set(Lifecycle::Destroyed);

        self.inner.bus.borrow_mut().take();
        self.inner.scene.borrow_mut().take();
        match self.inner.data.try_borrow_mut() {
            Ok(mut data) => {
                data.take();
            }
            Err(_) => tracing::warn!("Game data still borrowed during destroy, released with the flow"),
        }
        self.inner.delivery.fatal.borrow_mut().take();
        self.inner.delivery.reported.borrow_mut().take();

        tracing::info!(handlers = removed, "Gameflow destroyed");
        Ok(())
    }
}
