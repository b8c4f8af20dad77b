//! Audio collaborator: sound service over an injected backend

pub mod ports;
pub mod service;
pub mod types;

pub use ports::{AudioBackend, MemorySettingsStore, SettingsStore};
pub use service::SoundService;
pub use types::{
    clamp_volume, AssetId, InstanceId, PlayOptions, SoundConfig, SoundKind, SoundSettings,
    SubscriptionId,
};
