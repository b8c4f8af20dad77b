//! HUD Registry

use std::rc::Rc;

use gamelab_domain::GameError;

use crate::infrastructure::ports::ErrorReporter;
use crate::infrastructure::reporting::TracingReporter;
use crate::view::capability::Capability;

/// A heads-up display element. Every call except `name` is optional and is
/// only made when [`supports`](HudComponent::supports) says so.
pub trait HudComponent {
    fn name(&self) -> &str;

    fn supports(&self, capability: Capability) -> bool;

    fn create(&mut self, _scale: f64) {}

    fn show(&mut self) {}

    fn hide(&mut self) {}

    fn destroy(&mut self) -> Result<(), GameError> {
        Ok(())
    }
}

/// Ordered HUD components; insertion order is broadcast order.
pub struct Hud {
    components: Vec<Box<dyn HudComponent>>,
    reporter: Rc<dyn ErrorReporter>,
}

impl Default for Hud {
    fn default() -> Self {
        Self::new()
    }
}

impl Hud {
    pub fn new() -> Self {
        Self::with_reporter(Rc::new(TracingReporter))
    }

    pub fn with_reporter(reporter: Rc<dyn ErrorReporter>) -> Self {
        Self {
            components: Vec::new(),
            reporter,
        }
    }

    pub fn add_component(&mut self, component: Box<dyn HudComponent>) {
        self.components.push(component);
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    fn each(&mut self, capability: Capability, mut call: impl FnMut(&mut dyn HudComponent)) {
        for component in self.components.iter_mut() {
            if component.supports(capability) {
                call(component.as_mut());
            }
        }
    }

    pub fn create(&mut self, scale: f64) {
        self.each(Capability::Create, |c| c.create(scale));
    }

    pub fn show(&mut self) {
        self.each(Capability::Show, |c| c.show());
    }

    pub fn hide(&mut self) {
        self.each(Capability::Hide, |c| c.hide());
    }

    /// Destroy every component that can be destroyed, then forget them all.
    pub fn destroy(&mut self) {
        let reporter = Rc::clone(&self.reporter);
        for mut component in self.components.drain(..) {
            if !component.supports(Capability::Destroy) {
                continue;
            }
            if let Err(err) = component.destroy() {
                reporter.report(&GameError::cleanup(
                    format!("hud component '{}'", component.name()),
                    err.to_string(),
                ));
            }
        }
    }
}
