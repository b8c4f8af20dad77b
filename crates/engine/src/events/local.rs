//! In-process event surface.
//!
//! Headless scenes and tests use this in place of a rendering surface's own
//! emitter. Listeners are snapshotted before dispatch so a listener may
//! subscribe, unsubscribe or emit again without invalidating the iteration.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use serde_json::Value;

use crate::events::surface::{EventSurface, Listener, ListenerId, OnceSurface};

struct Registration {
    id: ListenerId,
    listener: Listener,
    once: bool,
}

/// Single-threaded multicast emitter keyed by event name.
pub struct LocalEmitter {
    next_id: Cell<u64>,
    listeners: RefCell<HashMap<String, Vec<Registration>>>,
    native_once: bool,
}

impl Default for LocalEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalEmitter {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            listeners: RefCell::new(HashMap::new()),
            native_once: true,
        }
    }

    /// An emitter that does not advertise a native `once`.
    pub fn without_once() -> Self {
        Self {
            native_once: false,
            ..Self::new()
        }
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.borrow().get(event).map_or(0, Vec::len)
    }

    pub fn total_listeners(&self) -> usize {
        self.listeners.borrow().values().map(Vec::len).sum()
    }

    fn register(&self, event: &str, listener: Listener, once: bool) -> ListenerId {
        let id = ListenerId::new(self.next_id.get());
        self.next_id.set(id.get() + 1);
        self.listeners
            .borrow_mut()
            .entry(event.to_string())
            .or_default()
            .push(Registration { id, listener, once });
        id
    }
}

impl EventSurface for LocalEmitter {
    fn on(&self, event: &str, listener: Listener) -> ListenerId {
        self.register(event, listener, false)
    }

    fn off(&self, event: &str, id: ListenerId) {
        let mut map = self.listeners.borrow_mut();
        let Some(list) = map.get_mut(event) else { return };
        list.retain(|registration| registration.id != id);
        if list.is_empty() {
            map.remove(event);
        }
    }

    fn emit(&self, event: &str, args: &[Value]) {
        let snapshot: Vec<Listener> = {
            let mut map = self.listeners.borrow_mut();
            let Some(list) = map.get_mut(event) else { return };
            let snapshot = list.iter().map(|r| Listener::clone(&r.listener)).collect();
            list.retain(|registration| !registration.once);
            if list.is_empty() {
                map.remove(event);
            }
            snapshot
        };

        for listener in snapshot {
            listener(args);
        }
    }

    fn as_once(&self) -> Option<&dyn OnceSurface> {
        if self.native_once {
            Some(self)
        } else {
            None
        }
    }
}

impl OnceSurface for LocalEmitter {
    fn once(&self, event: &str, listener: Listener) -> ListenerId {
        self.register(event, listener, true)
    }
}
