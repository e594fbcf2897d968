// Keytouch Layout
// Key definitions: behaviors, popups and the stock key presets

use crate::action::KeyAction;
use crate::dispatch::PickerCategory;
use crate::feedback::SoundEffect;
use crate::gesture::{GestureOptions, SwipeDirection};
use crate::handler::{GestureHandler, HandlerChain};
use crate::keysym::KeySym;
use crate::popup::MenuItem;

/// Discrete behaviors a key can be configured with.
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    Press(KeyAction),
    LongPress(KeyAction),
    /// Fired repeatedly while held past the long-press delay
    Repeat(KeyAction),
    /// Fired on release after a vertical swipe in the symbol direction
    Swipe(KeyAction),
    DoubleTap(KeyAction),
    /// Fired on release after a swipe in a fixed direction
    SwipeCustomize {
        action: KeyAction,
        direction: SwipeDirection,
    },
}

/// Popups a key can show.
#[derive(Debug, Clone, PartialEq)]
pub enum Popup {
    /// Menu shown on long-press
    Menu(Vec<MenuItem>),
    /// Popup keyboard shown on long-press, identified by a label
    Keyboard { label: String },
    Preview { content: String },
    AltPreview { content: String, alternative: String },
}

/// Which built-in gesture handling a key carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyKind {
    #[default]
    Standard,
    Space,
    Backspace,
    Return,
}

/// A key of the layout.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyDef {
    pub label: String,
    /// Fraction of the row width; `0.0` shares the remaining space
    pub width: f32,
    pub kind: KeyKind,
    pub behaviors: Vec<Behavior>,
    pub popups: Vec<Popup>,
}

impl KeyDef {
    pub fn new(label: impl Into<String>, kind: KeyKind) -> Self {
        Self {
            label: label.into(),
            width: 0.0,
            kind,
            behaviors: Vec::new(),
            popups: Vec::new(),
        }
    }

    pub fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    pub fn with_behavior(mut self, behavior: Behavior) -> Self {
        self.behaviors.push(behavior);
        self
    }

    pub fn with_popup(mut self, popup: Popup) -> Self {
        self.popups.push(popup);
        self
    }

    pub fn sound_effect(&self) -> SoundEffect {
        match self.kind {
            KeyKind::Standard => SoundEffect::Standard,
            KeyKind::Space => SoundEffect::SpaceBar,
            KeyKind::Backspace => SoundEffect::Delete,
            KeyKind::Return => SoundEffect::Return,
        }
    }

    fn find_behavior<F>(&self, pick: F) -> Option<&KeyAction>
    where
        F: Fn(&Behavior) -> Option<&KeyAction>,
    {
        // A later behavior of the same kind replaces an earlier one
        self.behaviors.iter().rev().find_map(pick)
    }

    pub fn press_action(&self) -> Option<&KeyAction> {
        self.find_behavior(|b| match b {
            Behavior::Press(action) => Some(action),
            _ => None,
        })
    }

    pub fn long_press_action(&self) -> Option<&KeyAction> {
        self.find_behavior(|b| match b {
            Behavior::LongPress(action) => Some(action),
            _ => None,
        })
    }

    pub fn repeat_action(&self) -> Option<&KeyAction> {
        self.find_behavior(|b| match b {
            Behavior::Repeat(action) => Some(action),
            _ => None,
        })
    }

    pub fn double_tap_action(&self) -> Option<&KeyAction> {
        self.find_behavior(|b| match b {
            Behavior::DoubleTap(action) => Some(action),
            _ => None,
        })
    }

    /// The menu or popup keyboard shown on long-press, if any.
    ///
    /// The last one configured wins and it replaces any long-press behavior.
    pub fn long_press_popup(&self) -> Option<&Popup> {
        self.popups
            .iter()
            .rev()
            .find(|p| matches!(p, Popup::Menu(_) | Popup::Keyboard { .. }))
    }

    /// Gesture options implied by the configured behaviors and popups
    pub fn gesture_options(&self) -> GestureOptions {
        GestureOptions {
            long_press: self.long_press_action().is_some() || self.long_press_popup().is_some(),
            repeat: self.repeat_action().is_some(),
            double_tap: self.double_tap_action().is_some(),
            swipe: None,
        }
    }

    /// Continuous gesture handlers for this key
    pub fn handler_chain(&self) -> HandlerChain {
        let mut chain = HandlerChain::new();
        match self.kind {
            KeyKind::Space => chain.push(GestureHandler::SpaceCursor),
            KeyKind::Backspace => chain.push(GestureHandler::BackspaceSelection),
            KeyKind::Standard | KeyKind::Return => {}
        }
        for behavior in &self.behaviors {
            match behavior {
                Behavior::Swipe(action) => chain.push(GestureHandler::SymbolSwipe {
                    action: action.clone(),
                }),
                Behavior::SwipeCustomize { action, direction } => {
                    chain.push(GestureHandler::DirectionalSwipe {
                        action: action.clone(),
                        direction: *direction,
                    })
                }
                _ => {}
            }
        }
        let mut focus_installed = false;
        for popup in &self.popups {
            match popup {
                Popup::Menu(_) | Popup::Keyboard { .. } => {
                    if !focus_installed {
                        chain.push(GestureHandler::PopupFocus);
                        focus_installed = true;
                    }
                }
                Popup::Preview { content } => chain.push(GestureHandler::Preview {
                    content: content.clone(),
                }),
                Popup::AltPreview {
                    content,
                    alternative,
                } => chain.push(GestureHandler::AltPreview {
                    content: content.clone(),
                    alternative: alternative.clone(),
                }),
            }
        }
        chain
    }
}

/// Action for typing `text`: a key symbol for one character, a commit otherwise
pub fn text_action(text: &str) -> KeyAction {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => KeyAction::sym(KeySym::from_char(c)),
        _ => KeyAction::Commit(text.to_string()),
    }
}

/// Letter key with an optional swipe alternative
pub fn alphabet_key(text: &str, alt: Option<&str>) -> KeyDef {
    let key = KeyDef::new(text, KeyKind::Standard)
        .with_behavior(Behavior::Press(text_action(text)))
        .with_popup(Popup::Keyboard {
            label: text.to_string(),
        });
    match alt {
        Some(alt) => key
            .with_behavior(Behavior::Swipe(text_action(alt)))
            .with_popup(Popup::AltPreview {
                content: text.to_string(),
                alternative: alt.to_string(),
            }),
        None => key.with_popup(Popup::Preview {
            content: text.to_string(),
        }),
    }
}

pub fn space_key() -> KeyDef {
    KeyDef::new("space", KeyKind::Space)
        .with_behavior(Behavior::Press(KeyAction::sym(KeySym::SPACE)))
        .with_behavior(Behavior::LongPress(KeyAction::SpaceLongPress))
}

pub fn backspace_key() -> KeyDef {
    KeyDef::new("⌫", KeyKind::Backspace)
        .with_behavior(Behavior::Press(KeyAction::sym(KeySym::BACKSPACE)))
        .with_behavior(Behavior::Repeat(KeyAction::sym(KeySym::BACKSPACE)))
}

pub fn return_key() -> KeyDef {
    KeyDef::new("⏎", KeyKind::Return).with_behavior(Behavior::Press(KeyAction::sym(KeySym::RETURN)))
}

pub fn lang_switch_key() -> KeyDef {
    KeyDef::new("🌐", KeyKind::Standard)
        .with_behavior(Behavior::Press(KeyAction::LangSwitch))
        .with_behavior(Behavior::LongPress(KeyAction::ShowInputMethodPicker))
}

/// Shift: tap for one shifted letter, double tap or hold for caps lock
pub fn shift_key() -> KeyDef {
    KeyDef::new("⇧", KeyKind::Standard)
        .with_behavior(Behavior::Press(KeyAction::sym(KeySym::SHIFT_L)))
        .with_behavior(Behavior::LongPress(KeyAction::sym(KeySym::CAPS_LOCK)))
        .with_behavior(Behavior::DoubleTap(KeyAction::sym(KeySym::CAPS_LOCK)))
}

/// Comma key that opens the picker on swipe
pub fn comma_key() -> KeyDef {
    KeyDef::new(",", KeyKind::Standard)
        .with_behavior(Behavior::Press(text_action(",")))
        .with_behavior(Behavior::Swipe(KeyAction::PickerSwitch(None)))
        .with_popup(Popup::AltPreview {
            content: ",".to_string(),
            alternative: PickerCategory::Emoji.to_string(),
        })
}

/// Rows of key definitions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layout {
    pub rows: Vec<Vec<KeyDef>>,
}

impl Layout {
    pub fn new(rows: Vec<Vec<KeyDef>>) -> Self {
        Self { rows }
    }

    /// Width fractions per row, as the grid expects them
    pub fn widths(&self) -> Vec<Vec<f32>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|key| key.width).collect())
            .collect()
    }

    pub fn key_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    /// A four-row QWERTY layout with number alternatives on the top row
    pub fn qwerty() -> Self {
        let top: Vec<KeyDef> = "qwertyuiop"
            .chars()
            .zip("1234567890".chars())
            .map(|(c, n)| alphabet_key(&c.to_string(), Some(&n.to_string())))
            .collect();
        let home: Vec<KeyDef> = "asdfghjkl"
            .chars()
            .map(|c| alphabet_key(&c.to_string(), None).with_width(0.1))
            .collect();
        let mut bottom = vec![shift_key().with_width(0.15)];
        bottom.extend("zxcvbnm".chars().map(|c| alphabet_key(&c.to_string(), None).with_width(0.1)));
        bottom.push(backspace_key().with_width(0.15));
        let last = vec![
            lang_switch_key().with_width(0.15),
            comma_key().with_width(0.1),
            space_key(),
            return_key().with_width(0.15),
        ];
        Self::new(vec![top, home, bottom, last])
    }
}
