// Keytouch Config Parser - TOML with Serde
// Parses and validates the keyboard configuration file

use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::dispatch::{DispatchSettings, LangSwitchBehavior, SpaceLongPressBehavior};
use crate::gesture::{GestureTiming, SwipeSymbolDirection};
use crate::keyboard::TouchSettings;

const LONG_PRESS_RANGE: RangeInclusive<u64> = 100..=700;
const REPEAT_INTERVAL_RANGE: RangeInclusive<u64> = 10..=500;
const DOUBLE_TAP_RANGE: RangeInclusive<u64> = 50..=1000;
const PAGE_SIZE_RANGE: RangeInclusive<usize> = 1..=64;

/// Configuration parser errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Value out of range: {0}")]
    OutOfRange(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid layout: {0}")]
    InvalidLayout(String),
}

/// Root TOML table
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    #[serde(default)]
    keyboard: Option<KeyboardSection>,

    #[serde(default)]
    behavior: Option<BehaviorSection>,

    #[serde(default)]
    candidates: Option<CandidatesSection>,
}

/// Touch and gesture settings
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct KeyboardSection {
    long_press_delay_ms: Option<u64>,
    repeat_interval_ms: Option<u64>,
    double_tap_window_ms: Option<u64>,
    density: Option<f32>,
    haptic_feedback: Option<bool>,
    popup_on_key_press: Option<bool>,
    swipe_symbol_direction: Option<SwipeSymbolDirection>,
    space_swipe_move_cursor: Option<bool>,
    touch_workaround: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct BehaviorSection {
    lang_switch: Option<LangSwitchBehavior>,
    space_long_press: Option<SpaceLongPressBehavior>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct CandidatesSection {
    page_size: Option<usize>,
}

/// Validated keyboard configuration.
///
/// Loaded from `~/.config/keytouch/keyboard.toml` by default. Anything not
/// present in the file keeps its default value.
#[derive(Debug, Clone, Default)]
pub struct KeyboardConfig {
    touch: TouchSettings,
    dispatch: DispatchSettings,

    /// Path to the config file (for reload)
    source_path: Option<PathBuf>,
}

impl KeyboardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(&path)?;
        let mut config = Self::from_toml(&content)?;
        config.source_path = Some(path.as_ref().to_path_buf());
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let toml_config: ConfigToml =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;
        toml_config.to_config()
    }

    /// Get the default config path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("keytouch").join("keyboard.toml"))
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(path);
            }
        }
        Ok(Self::new())
    }

    /// Reload from the file this config came from
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        let Some(path) = self.source_path.clone() else {
            return Err(ConfigError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no source path set",
            )));
        };
        *self = Self::from_file(path)?;
        Ok(())
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn to_touch_settings(&self) -> TouchSettings {
        self.touch
    }

    pub fn to_dispatch_settings(&self) -> DispatchSettings {
        self.dispatch
    }
}

impl ConfigToml {
    fn to_config(&self) -> Result<KeyboardConfig, ConfigError> {
        let mut touch = TouchSettings::default();
        let mut dispatch = DispatchSettings::default();

        if let Some(keyboard) = &self.keyboard {
            let defaults = touch.timing;
            let long_press = millis_in_range(
                "long_press_delay_ms",
                keyboard.long_press_delay_ms,
                &LONG_PRESS_RANGE,
                defaults.long_press_delay,
            )?;
            let double_tap = millis_in_range(
                "double_tap_window_ms",
                keyboard.double_tap_window_ms,
                &DOUBLE_TAP_RANGE,
                defaults.double_tap_window,
            )?;
            let repeat = millis_in_range(
                "repeat_interval_ms",
                keyboard.repeat_interval_ms,
                &REPEAT_INTERVAL_RANGE,
                defaults.repeat_interval,
            )?;
            touch.timing = GestureTiming {
                long_press_delay: long_press,
                double_tap_window: double_tap,
                repeat_interval: repeat,
            };

            if let Some(density) = keyboard.density {
                if !density.is_finite() || density <= 0.0 {
                    return Err(ConfigError::OutOfRange(format!(
                        "density must be positive, got {}",
                        density
                    )));
                }
                touch.density = density;
            }
            if let Some(v) = keyboard.haptic_feedback {
                touch.haptic_feedback = v;
            }
            if let Some(v) = keyboard.popup_on_key_press {
                touch.popup_on_key_press = v;
            }
            if let Some(v) = keyboard.swipe_symbol_direction {
                touch.symbol_direction = v;
            }
            if let Some(v) = keyboard.space_swipe_move_cursor {
                touch.space_swipe_move_cursor = v;
            }
            if let Some(v) = keyboard.touch_workaround {
                touch.touch_workaround = v;
            }
        }

        if let Some(behavior) = &self.behavior {
            if let Some(v) = behavior.lang_switch {
                dispatch.lang_switch = v;
            }
            if let Some(v) = behavior.space_long_press {
                dispatch.space_long_press = v;
            }
        }

        if let Some(page_size) = self.candidates.as_ref().and_then(|c| c.page_size) {
            if !PAGE_SIZE_RANGE.contains(&page_size) {
                return Err(ConfigError::OutOfRange(format!(
                    "page_size {} not in {}..={}",
                    page_size,
                    PAGE_SIZE_RANGE.start(),
                    PAGE_SIZE_RANGE.end()
                )));
            }
            dispatch.page_size = page_size;
        }

        log::debug!("Loaded keyboard config: {:?}, {:?}", touch, dispatch);

        Ok(KeyboardConfig {
            touch,
            dispatch,
            source_path: None,
        })
    }
}

fn millis_in_range(
    name: &str,
    value: Option<u64>,
    range: &RangeInclusive<u64>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match value {
        None => Ok(default),
        Some(ms) if range.contains(&ms) => Ok(Duration::from_millis(ms)),
        Some(ms) => Err(ConfigError::OutOfRange(format!(
            "{} {} not in {}..={}",
            name,
            ms,
            range.start(),
            range.end()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        let config = KeyboardConfig::from_toml("").unwrap();
        assert_eq!(config.to_touch_settings(), TouchSettings::default());
        assert_eq!(config.to_dispatch_settings(), DispatchSettings::default());
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
[keyboard]
long_press_delay_ms = 450
repeat_interval_ms = 40
double_tap_window_ms = 250
density = 2.5
haptic_feedback = false
popup_on_key_press = false
swipe_symbol_direction = "down"
space_swipe_move_cursor = false
touch_workaround = true

[behavior]
lang_switch = "toggle-activate"
space_long_press = "show-picker"

[candidates]
page_size = 8
"#;
        let config = KeyboardConfig::from_toml(toml).unwrap();
        let touch = config.to_touch_settings();
        assert_eq!(touch.timing.long_press_delay, Duration::from_millis(450));
        assert_eq!(touch.timing.repeat_interval, Duration::from_millis(40));
        assert_eq!(touch.timing.double_tap_window, Duration::from_millis(250));
        assert_eq!(touch.density, 2.5);
        assert!(!touch.haptic_feedback);
        assert!(!touch.popup_on_key_press);
        assert_eq!(touch.symbol_direction, SwipeSymbolDirection::Down);
        assert!(!touch.space_swipe_move_cursor);
        assert!(touch.touch_workaround);

        let dispatch = config.to_dispatch_settings();
        assert_eq!(dispatch.lang_switch, LangSwitchBehavior::ToggleActivate);
        assert_eq!(dispatch.space_long_press, SpaceLongPressBehavior::ShowPicker);
        assert_eq!(dispatch.page_size, 8);
    }

    #[test]
    fn test_out_of_range_values() {
        for toml in [
            "[keyboard]\nlong_press_delay_ms = 50",
            "[keyboard]\nrepeat_interval_ms = 900",
            "[keyboard]\ndouble_tap_window_ms = 10",
            "[keyboard]\ndensity = 0.0",
            "[candidates]\npage_size = 0",
        ] {
            assert!(
                matches!(KeyboardConfig::from_toml(toml), Err(ConfigError::OutOfRange(_))),
                "{} should be rejected",
                toml
            );
        }
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(matches!(
            KeyboardConfig::from_toml("[keyboard]\nlong_press = 300"),
            Err(ConfigError::TomlParse(_))
        ));
        assert!(matches!(
            KeyboardConfig::from_toml("[theme]\nname = \"dark\""),
            Err(ConfigError::TomlParse(_))
        ));
        assert!(matches!(
            KeyboardConfig::from_toml("[behavior]\nlang_switch = \"cycle\""),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_from_file_and_reload() {
        let dir = std::env::temp_dir().join(format!("keytouch-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("keyboard.toml");
        fs::write(&path, "[candidates]\npage_size = 4\n").unwrap();

        let mut config = KeyboardConfig::from_file(&path).unwrap();
        assert_eq!(config.to_dispatch_settings().page_size, 4);
        assert_eq!(config.source_path(), Some(path.as_path()));

        fs::write(&path, "[candidates]\npage_size = 9\n").unwrap();
        config.reload().unwrap();
        assert_eq!(config.to_dispatch_settings().page_size, 9);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_reload_without_path() {
        assert!(KeyboardConfig::new().reload().is_err());
    }
}
