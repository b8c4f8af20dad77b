//! The publish/subscribe primitive a rendering surface exposes.

use std::rc::Rc;

use serde_json::Value;

/// Callback invoked with the arguments of an emitted event.
pub type Listener = Rc<dyn Fn(&[Value])>;

/// Handle returned by `on`/`once`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Minimum emitter capability: subscribe, unsubscribe, publish.
///
/// Delivery is synchronous. `emit` calls every listener currently subscribed
/// to `event`, in subscription order, before returning.
pub trait EventSurface {
    fn on(&self, event: &str, listener: Listener) -> ListenerId;

    /// Unknown ids are ignored.
    fn off(&self, event: &str, id: ListenerId);

    fn emit(&self, event: &str, args: &[Value]);

    /// Native one-shot subscription, when the surface has one.
    fn as_once(&self) -> Option<&dyn OnceSurface> {
        None
    }
}

/// Optional one-shot subscription capability.
pub trait OnceSurface {
    fn once(&self, event: &str, listener: Listener) -> ListenerId;
}
