//! Game Lab RPS
//!
//! Headless rock-paper-scissors on top of the lifecycle runtime. The game
//! supplies session data, phase hooks and a text scene; the engine supplies
//! the flow, the registries, sound and the host.

pub mod audio;
pub mod config;
pub mod factory;
pub mod hooks;
pub mod input;
pub mod moves;
pub mod output;
pub mod scene;
pub mod session;

pub use config::RpsConfig;
pub use factory::RpsFactory;
pub use hooks::{RpsHooks, PLAYER_MOVE};
pub use input::{handle_input, InputOutcome};
pub use moves::{Move, MoveSource, RandomMoves, ScriptedMoves, Winner};
pub use output::{LineSink, StdoutSink, Transcript};
pub use scene::RpsScene;
pub use session::{RoundOutcome, RpsSession};
