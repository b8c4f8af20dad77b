//! View composition: scene contract, animations, HUD, game objects

pub mod animations;
pub mod capability;
pub mod game_objects;
pub mod hud;
pub mod scene;

pub use animations::{AnimationHandle, AnimationManager, GameAnimation};
pub use capability::Capability;
pub use game_objects::{GameObject, GameObjects};
pub use hud::{Hud, HudComponent};
pub use scene::{Scene, SceneRegistries};
