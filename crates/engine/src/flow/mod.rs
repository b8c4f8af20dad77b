//! Flow controller: events in, phase transitions and hooks out

pub mod gameflow;
pub mod hooks;

pub use gameflow::{FlowOptions, Gameflow, WeakGameflow};
pub use hooks::GameHooks;
