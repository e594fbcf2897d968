// Keytouch Dispatch - Behaviors
// User-selectable resolutions for the language, space and picker keys

use serde::Deserialize;
use strum_macros::{Display, EnumIter, EnumString};

/// Category shown when the picker window is attached.
///
/// The display form is the persisted form, so `"Emoji".parse()` restores
/// what `PickerCategory::Emoji.to_string()` stored.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum PickerCategory {
    #[default]
    Emoji,
    Emoticon,
    Symbol,
}

/// What the language-switch key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Deserialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum LangSwitchBehavior {
    /// Cycle through the enabled input variants
    #[default]
    Enumerate,
    /// Toggle between the two most recent variants
    ToggleActivate,
    /// Defer to the platform's own input-method switcher
    NextInputMethodApp,
}

/// What a long press on the space bar does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Deserialize)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum SpaceLongPressBehavior {
    #[default]
    None,
    Enumerate,
    ToggleActivate,
    ShowPicker,
}
