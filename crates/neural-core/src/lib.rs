pub mod config;
pub mod error;
pub mod events;
pub mod settings;
pub mod types;

pub use config::NeuralConfig;
pub use error::{NeuralError, Result};
pub use events::{ChatEvent, NoticeLevel};
pub use settings::{
    load_settings, save_settings, FileSettingsStorage, LoadedSettings, MemorySettingsStorage,
    Personality, ResponseLength, Settings, SettingsPatch, SettingsStorage,
};
pub use types::*;
