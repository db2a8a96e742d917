use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{NeuralError, Result};

/// Top-level configuration for the Neural Chat application.
///
/// Loaded from `~/.neural-chat/config.toml` by default. This is the
/// operator-facing config; user preferences live in [`crate::Settings`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NeuralConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl NeuralConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: NeuralConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| NeuralError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Path of the persisted settings document inside the data directory.
    pub fn settings_path(&self) -> PathBuf {
        expand_home(&self.general.data_dir).join(SETTINGS_FILE_NAME)
    }
}

/// File name of the persisted settings document.
pub const SETTINGS_FILE_NAME: &str = "neuralChatSettings.json";

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the settings document.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.neural-chat".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Conversation engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum accepted message length, in characters.
    pub max_message_length: usize,
    /// Character count above which the input is flagged as near the limit.
    pub warn_message_length: usize,
    /// Delay between revealed characters of an assistant reply.
    pub typing_interval_ms: u64,
    /// Capacity of the presentation event channel.
    pub event_capacity: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: 2000,
            warn_message_length: 1800,
            typing_interval_ms: 30,
            event_capacity: 256,
        }
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = NeuralConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.chat.max_message_length, 2000);
        assert_eq!(config.chat.warn_message_length, 1800);
        assert_eq!(config.chat.typing_interval_ms, 30);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = NeuralConfig::default();
        config.general.log_level = "debug".to_string();
        config.chat.typing_interval_ms = 5;
        config.save(&path).unwrap();

        let loaded = NeuralConfig::load(&path).unwrap();
        assert_eq!(loaded.general.log_level, "debug");
        assert_eq!(loaded.chat.typing_interval_ms, 5);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chat]\nmax_message_length = 10\n").unwrap();

        let loaded = NeuralConfig::load(&path).unwrap();
        assert_eq!(loaded.chat.max_message_length, 10);
        assert_eq!(loaded.chat.event_capacity, 256);
        assert_eq!(loaded.general.data_dir, "~/.neural-chat");
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let config = NeuralConfig::load_or_default(&dir.path().join("absent.toml"));
        assert_eq!(config.chat.max_message_length, 2000);
    }

    #[test]
    fn test_load_or_default_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "chat = [[[").unwrap();
        let config = NeuralConfig::load_or_default(&path);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_expand_home_plain_path() {
        assert_eq!(expand_home("/var/data"), PathBuf::from("/var/data"));
    }

    #[test]
    fn test_settings_path_uses_data_dir() {
        let mut config = NeuralConfig::default();
        config.general.data_dir = "/tmp/neural".to_string();
        assert_eq!(
            config.settings_path(),
            PathBuf::from("/tmp/neural").join(SETTINGS_FILE_NAME)
        );
    }
}
