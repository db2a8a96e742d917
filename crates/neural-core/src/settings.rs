//! User-facing chat settings and their persistence.
//!
//! Settings are stored as one flat JSON object with camelCase keys. Loading
//! shallow-merges the stored keys over the defaults, so documents written by
//! older versions (or hand-edited ones missing keys) still load. A document
//! that cannot be parsed is discarded in favour of the defaults.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{NeuralError, Result};

/// Slowest selectable response speed.
pub const MIN_RESPONSE_SPEED: u8 = 1;
/// Fastest selectable response speed.
pub const MAX_RESPONSE_SPEED: u8 = 5;

/// Assistant personality, which colours the contextual suffix of answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    #[default]
    Helpful,
    Creative,
    Technical,
    Casual,
}

impl Personality {
    pub const ALL: [Personality; 4] = [
        Personality::Helpful,
        Personality::Creative,
        Personality::Technical,
        Personality::Casual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Personality::Helpful => "helpful",
            Personality::Creative => "creative",
            Personality::Technical => "technical",
            Personality::Casual => "casual",
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Personality {
    type Err = NeuralError;

    fn from_str(s: &str) -> Result<Self> {
        Personality::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| NeuralError::Settings(format!("unknown personality: {}", s)))
    }
}

/// Preferred answer length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl ResponseLength {
    pub const ALL: [ResponseLength; 3] = [
        ResponseLength::Short,
        ResponseLength::Medium,
        ResponseLength::Long,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseLength::Short => "short",
            ResponseLength::Medium => "medium",
            ResponseLength::Long => "long",
        }
    }
}

impl fmt::Display for ResponseLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResponseLength {
    type Err = NeuralError;

    fn from_str(s: &str) -> Result<Self> {
        ResponseLength::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| NeuralError::Settings(format!("unknown response length: {}", s)))
    }
}

const SPEED_KEY: &str = "responseSpeed";

/// Clamp any numeric speed into range before the typed parse, so values
/// outside `u8` clamp like any other out-of-range speed.
fn clamp_speed_value(speed: &mut Value) {
    let raw = match (speed.as_i64(), speed.as_f64()) {
        (Some(n), _) => n,
        (None, Some(f)) => f.round() as i64,
        (None, None) => return,
    };
    let clamped = raw.clamp(i64::from(MIN_RESPONSE_SPEED), i64::from(MAX_RESPONSE_SPEED));
    *speed = Value::from(clamped);
}

/// Process-wide chat preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub personality: Personality,
    pub response_length: ResponseLength,
    /// 1 (slowest) to 5 (fastest).
    pub response_speed: u8,
    pub show_typing: bool,
    pub show_timestamps: bool,
    pub sound_effects: bool,
    /// BCP 47 tag handed to the speech recognizer.
    pub language: String,
    pub is_dark_theme: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            personality: Personality::Helpful,
            response_length: ResponseLength::Medium,
            response_speed: 3,
            show_typing: true,
            show_timestamps: true,
            sound_effects: true,
            language: "ja".to_string(),
            is_dark_theme: true,
        }
    }
}

impl Settings {
    /// Parse a stored document, shallow-merging its keys over the defaults.
    pub fn from_document(document: &str) -> Result<Self> {
        let stored: Value = serde_json::from_str(document)?;
        let Value::Object(stored) = stored else {
            return Err(NeuralError::Settings(
                "settings document is not a JSON object".to_string(),
            ));
        };

        let mut merged: Map<String, Value> = match serde_json::to_value(Settings::default())? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in stored {
            merged.insert(key, value);
        }
        if let Some(speed) = merged.get_mut(SPEED_KEY) {
            clamp_speed_value(speed);
        }

        let settings: Settings = serde_json::from_value(Value::Object(merged))?;
        Ok(settings.normalized())
    }

    /// Serialize to the flat document format.
    pub fn to_document(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Clamp out-of-range values into their valid domain.
    pub fn normalized(mut self) -> Self {
        self.response_speed = self
            .response_speed
            .clamp(MIN_RESPONSE_SPEED, MAX_RESPONSE_SPEED);
        self
    }
}

/// A partial settings update. `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub personality: Option<Personality>,
    pub response_length: Option<ResponseLength>,
    pub response_speed: Option<u8>,
    pub show_typing: Option<bool>,
    pub show_timestamps: Option<bool>,
    pub sound_effects: Option<bool>,
    pub language: Option<String>,
    pub is_dark_theme: Option<bool>,
}

impl SettingsPatch {
    /// Apply the provided fields over `settings`.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(p) = self.personality {
            settings.personality = p;
        }
        if let Some(l) = self.response_length {
            settings.response_length = l;
        }
        if let Some(s) = self.response_speed {
            settings.response_speed = s.clamp(MIN_RESPONSE_SPEED, MAX_RESPONSE_SPEED);
        }
        if let Some(v) = self.show_typing {
            settings.show_typing = v;
        }
        if let Some(v) = self.show_timestamps {
            settings.show_timestamps = v;
        }
        if let Some(v) = self.sound_effects {
            settings.sound_effects = v;
        }
        if let Some(ref lang) = self.language {
            if !lang.trim().is_empty() {
                settings.language = lang.trim().to_string();
            }
        }
        if let Some(v) = self.is_dark_theme {
            settings.is_dark_theme = v;
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == SettingsPatch::default()
    }
}

// =============================================================================
// Storage
// =============================================================================

/// Backing store for the serialized settings document.
pub trait SettingsStorage: Send + Sync {
    /// Read the stored document, or `None` if nothing has been saved.
    fn read(&self) -> Result<Option<String>>;
    /// Replace the stored document.
    fn write(&self, document: &str) -> Result<()>;
    /// Remove the stored document.
    fn remove(&self) -> Result<()>;
}

/// Settings document kept in a single JSON file.
#[derive(Debug, Clone)]
pub struct FileSettingsStorage {
    path: PathBuf,
}

impl FileSettingsStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStorage for FileSettingsStorage {
    fn read(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, document: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, document)?;
        debug!(path = %self.path.display(), "Settings written");
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process settings store, used by tests and headless runs.
#[derive(Debug, Default)]
pub struct MemorySettingsStorage {
    slot: Mutex<Option<String>>,
}

impl MemorySettingsStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a pre-existing document.
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(document.into())),
        }
    }
}

impl SettingsStorage for MemorySettingsStorage {
    fn read(&self) -> Result<Option<String>> {
        let slot = self
            .slot
            .lock()
            .map_err(|e| NeuralError::Settings(format!("settings lock poisoned: {}", e)))?;
        Ok(slot.clone())
    }

    fn write(&self, document: &str) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| NeuralError::Settings(format!("settings lock poisoned: {}", e)))?;
        *slot = Some(document.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| NeuralError::Settings(format!("settings lock poisoned: {}", e)))?;
        *slot = None;
        Ok(())
    }
}

/// Outcome of loading settings at startup.
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: Settings,
    /// Set when a stored document existed but could not be used.
    pub warning: Option<String>,
}

/// Load settings, falling back to defaults when absent or unreadable.
pub fn load_settings(storage: &dyn SettingsStorage) -> LoadedSettings {
    let document = match storage.read() {
        Ok(Some(doc)) => doc,
        Ok(None) => {
            debug!("No stored settings, using defaults");
            return LoadedSettings {
                settings: Settings::default(),
                warning: None,
            };
        }
        Err(e) => {
            warn!(error = %e, "Failed to read settings. Using defaults.");
            return LoadedSettings {
                settings: Settings::default(),
                warning: Some(e.to_string()),
            };
        }
    };

    match Settings::from_document(&document) {
        Ok(settings) => {
            info!("Settings loaded");
            LoadedSettings {
                settings,
                warning: None,
            }
        }
        Err(e) => {
            warn!(error = %e, "Stored settings are corrupt. Using defaults.");
            LoadedSettings {
                settings: Settings::default(),
                warning: Some(e.to_string()),
            }
        }
    }
}

/// Overwrite the stored document with `settings`.
pub fn save_settings(storage: &dyn SettingsStorage, settings: &Settings) -> Result<()> {
    let document = settings.to_document()?;
    storage.write(&document)?;
    info!("Settings saved");
    Ok(())
}
