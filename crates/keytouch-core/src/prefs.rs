// Keytouch Preferences Module
// Small persisted key-value state such as the last used picker category

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Preference key holding the last attached picker category
pub const LAST_PICKER_CATEGORY: &str = "last_picker_category";

/// Opaque string key-value storage owned by the host.
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store, lost when dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: BTreeMap<String, String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// Errors that can occur when loading or saving preferences
#[derive(Debug, thiserror::Error)]
pub enum PreferencesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(String),

    #[error("No source path set")]
    NoSourcePath,
}

/// Preferences persisted as a flat TOML table of strings.
///
/// Loaded from `~/.config/keytouch/state.toml` by default. Every `set` is
/// written back to the file the preferences were loaded from, if any.
#[derive(Debug, Clone, Default)]
pub struct Preferences {
    values: BTreeMap<String, String>,

    /// Path to the preferences file (for reload and save)
    source_path: Option<PathBuf>,
}

impl Preferences {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load preferences from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PreferencesError> {
        let content = std::fs::read_to_string(&path)?;
        let mut prefs = Self::from_toml(&content)?;
        prefs.source_path = Some(path.as_ref().to_path_buf());
        Ok(prefs)
    }

    /// Parse preferences from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, PreferencesError> {
        let values: BTreeMap<String, String> =
            toml::from_str(content).map_err(|e| PreferencesError::TomlParse(e.to_string()))?;
        Ok(Self {
            values,
            source_path: None,
        })
    }

    /// Start empty but persist to `path` from the first `set` on
    pub fn at_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            values: BTreeMap::new(),
            source_path: Some(path.as_ref().to_path_buf()),
        }
    }

    /// Get the default preferences path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("keytouch").join("state.toml"))
    }

    /// Load from the default location, or start empty at that location
    pub fn load_default() -> Result<Self, PreferencesError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(path);
            }
            return Ok(Self::at_path(path));
        }
        Ok(Self::new())
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn to_toml(&self) -> Result<String, PreferencesError> {
        toml::to_string(&self.values).map_err(|e| PreferencesError::TomlSerialize(e.to_string()))
    }

    /// Write all values to the source file
    pub fn save(&self) -> Result<(), PreferencesError> {
        let path = self.source_path.as_ref().ok_or(PreferencesError::NoSourcePath)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Reload preferences from the file they came from
    pub fn reload(&mut self) -> Result<(), PreferencesError> {
        let path = self.source_path.clone().ok_or(PreferencesError::NoSourcePath)?;
        *self = Self::from_file(path)?;
        Ok(())
    }
}

impl PreferenceStore for Preferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        if self.source_path.is_some() {
            if let Err(e) = self.save() {
                log::warn!("Failed to persist preference {}: {}", key, e);
            }
        }
    }
}
