//! Game Objects Registry

use std::rc::Rc;

use gamelab_domain::GameError;
use serde_json::Value;

use crate::infrastructure::ports::ErrorReporter;
use crate::infrastructure::reporting::TracingReporter;
use crate::view::capability::Capability;

/// A per-frame scene object. Calls are only made for declared capabilities.
pub trait GameObject {
    fn name(&self) -> &str;

    fn supports(&self, capability: Capability) -> bool;

    fn create(&mut self, _args: &[Value]) {}

    fn show(&mut self) {}

    fn hide(&mut self) {}

    fn update(&mut self) {}

    fn reset(&mut self) {}

    fn destroy(&mut self) -> Result<(), GameError> {
        Ok(())
    }
}

/// Ordered game objects; insertion order is broadcast order.
pub struct GameObjects {
    objects: Vec<Box<dyn GameObject>>,
    reporter: Rc<dyn ErrorReporter>,
}

impl Default for GameObjects {
    fn default() -> Self {
        Self::new()
    }
}

impl GameObjects {
    pub fn new() -> Self {
        Self::with_reporter(Rc::new(TracingReporter))
    }

    pub fn with_reporter(reporter: Rc<dyn ErrorReporter>) -> Self {
        Self {
            objects: Vec::new(),
            reporter,
        }
    }

    pub fn add_object(&mut self, object: Box<dyn GameObject>) {
        self.objects.push(object);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn each(&mut self, capability: Capability, mut call: impl FnMut(&mut dyn GameObject)) {
        for object in self.objects.iter_mut() {
            if object.supports(capability) {
                call(object.as_mut());
            }
        }
    }

    pub fn create(&mut self, args: &[Value]) {
        self.each(Capability::Create, |o| o.create(args));
    }

    pub fn show(&mut self) {
        self.each(Capability::Show, |o| o.show());
    }

    pub fn hide(&mut self) {
        self.each(Capability::Hide, |o| o.hide());
    }

    /// Per-frame tick.
    pub fn update(&mut self) {
        self.each(Capability::Update, |o| o.update());
    }

    pub fn reset(&mut self) {
        self.each(Capability::Reset, |o| o.reset());
    }

    pub fn destroy(&mut self) {
        let reporter = Rc::clone(&self.reporter);
        for mut object in self.objects.drain(..) {
            if !object.supports(Capability::Destroy) {
                continue;
            }
            if let Err(err) = object.destroy() {
                reporter.report(&GameError::cleanup(
                    format!("game object '{}'", object.name()),
                    err.to_string(),
                ));
            }
        }
    }
}
