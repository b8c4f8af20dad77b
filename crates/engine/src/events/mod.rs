//! Event plumbing between scenes and the flow controller

pub mod bus;
pub mod local;
pub mod surface;

pub use bus::EventBus;
pub use local::LocalEmitter;
pub use surface::{EventSurface, Listener, ListenerId, OnceSurface};
