//! Game Lab Engine library.
//!
//! The runtime a concrete game plugs into.
//!
//! ## Structure
//!
//! - `events/` - Event Bus Adapter over a scene's publish/subscribe surface
//! - `flow/` - Gameflow controller and the game-specific hook contract
//! - `view/` - Scene contract, Animation Manager, HUD and Game Objects registries
//! - `audio/` - Sound service over an injected playback backend
//! - `infrastructure/` - Clock, error reporting, runtime configuration
//! - `host` - Cancellable setup and teardown of one game session
//!
//! Everything is single-threaded: handles are `Rc`, state sits behind
//! `Cell`/`RefCell`, and async setup runs on a `LocalSet`.

pub mod audio;
pub mod events;
pub mod flow;
pub mod host;
pub mod infrastructure;
pub mod view;

pub use audio::SoundService;
pub use events::{EventBus, EventSurface, ListenerId, LocalEmitter};
pub use flow::{FlowOptions, GameHooks, Gameflow};
pub use host::{GameFactory, GameHost, SessionId};
pub use infrastructure::{ClockPort, ErrorReporter, RuntimeConfig, SystemClock, TracingReporter};
pub use view::{AnimationManager, Capability, GameObjects, Hud, Scene, SceneRegistries};
