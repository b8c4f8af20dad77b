//! Animation Manager - at most one animation is visible at a time

use std::cell::RefCell;
use std::rc::Rc;

use gamelab_domain::GameError;
use serde_json::Value;

use crate::infrastructure::ports::ErrorReporter;
use crate::infrastructure::reporting::TracingReporter;
use crate::view::capability::Capability;

/// A show/reset-capable presentation unit.
#[cfg_attr(test, mockall::automock)]
pub trait GameAnimation {
    fn create(&mut self);

    fn show(&mut self, args: &[Value]);

    fn reset(&mut self);

    /// `Destroy` is the only optional capability; the rest are required.
    fn supports(&self, capability: Capability) -> bool {
        matches!(
            capability,
            Capability::Create | Capability::Show | Capability::Reset
        )
    }

    fn destroy(&mut self) -> Result<(), GameError> {
        Ok(())
    }
}

/// Shared handle; the scene keeps one to pass to [`AnimationManager::show`].
pub type AnimationHandle = Rc<RefCell<dyn GameAnimation>>;

fn with_animation(handle: &AnimationHandle, call: &str, f: impl FnOnce(&mut dyn GameAnimation)) {
    match handle.try_borrow_mut() {
        Ok(mut animation) => f(&mut *animation),
        Err(_) => tracing::warn!(call, "Animation is busy, call skipped"),
    }
}

pub struct AnimationManager {
    current: Option<AnimationHandle>,
    registered: Vec<AnimationHandle>,
    reporter: Rc<dyn ErrorReporter>,
}

impl Default for AnimationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationManager {
    pub fn new() -> Self {
        Self::with_reporter(Rc::new(TracingReporter))
    }

    pub fn with_reporter(reporter: Rc<dyn ErrorReporter>) -> Self {
        Self {
            current: None,
            registered: Vec::new(),
            reporter,
        }
    }

    /// Track `animation` for bulk teardown. Does not show it.
    pub fn register_animation(&mut self, animation: AnimationHandle) {
        if self.is_registered(&animation) {
            return;
        }
        self.registered.push(animation);
    }

    pub fn is_registered(&self, animation: &AnimationHandle) -> bool {
        self.registered.iter().any(|a| Rc::ptr_eq(a, animation))
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    pub fn has_current(&self) -> bool {
        self.current.is_some()
    }

    pub fn is_current(&self, animation: &AnimationHandle) -> bool {
        self.current
            .as_ref()
            .is_some_and(|current| Rc::ptr_eq(current, animation))
    }

    /// Reset whatever is showing, then show `animation`.
    pub fn show(&mut self, animation: &AnimationHandle, args: &[Value]) {
        if let Some(previous) = self.current.take() {
            with_animation(&previous, "reset", |a| a.reset());
        }
        self.current = Some(Rc::clone(animation));
        with_animation(animation, "show", |a| a.show(args));
    }

    /// Reset and clear the current animation, if any.
    pub fn reset(&mut self) {
        if let Some(current) = self.current.take() {
            with_animation(&current, "reset", |a| a.reset());
        }
    }

    /// Reset the current animation and destroy every registered one.
    pub fn destroy(&mut self) {
        self.reset();
        for animation in self.registered.drain(..) {
            with_animation(&animation, "destroy", |a| {
                if !a.supports(Capability::Destroy) {
                    return;
                }
                if let Err(err) = a.destroy() {
                    self.reporter
                        .report(&GameError::cleanup("animation", err.to_string()));
                }
            });
        }
    }
}
