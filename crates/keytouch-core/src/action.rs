// Keytouch Key Actions
// Resolvable intents produced by keys and consumed by the dispatcher

use std::fmt;

use crate::dispatch::PickerCategory;
use crate::keysym::{KeyStates, KeySym};

/// Direction of a candidate page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageDirection {
    Forward,
    Backward,
}

/// Snapshot of a backspace gesture at the moment of release.
///
/// `x`/`y` are the release position in the key's local space, `total_x`
/// and `total_y` the number of swipe steps taken on each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeRelease {
    pub x: f32,
    pub y: f32,
    pub total_x: i32,
    pub total_y: i32,
}

/// Every intent a key can resolve to.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    /// Send a key symbol with modifiers to the engine
    Sym { sym: KeySym, states: KeyStates },
    /// Send a key by name and hardware scancode (used for virtual Shift+Space)
    ScancodeKey {
        name: String,
        scancode: u16,
        states: KeyStates,
    },
    /// Commit literal text after flushing the current composition
    Commit(String),
    QuickPhrase,
    Unicode,
    LangSwitch,
    ShowInputMethodPicker,
    /// Shift the selection boundaries by the given number of characters
    MoveSelection { start: i32, end: i32 },
    DeleteSelection,
    /// End of a backspace gesture, carrying its swipe context
    DeleteSelectionAndSwipe(SwipeRelease),
    /// Attach the picker window; `None` restores the last used category
    PickerSwitch(Option<PickerCategory>),
    SpaceLongPress,
    Page(PageDirection),
    PerformContextMenu(u32),
    SendCombination {
        key_code: u16,
        alt: bool,
        ctrl: bool,
        shift: bool,
    },
    AttachWindow(String),
}

impl KeyAction {
    /// Plain symbol without modifiers
    pub fn sym(sym: KeySym) -> Self {
        KeyAction::Sym {
            sym,
            states: KeyStates::EMPTY,
        }
    }
}

impl fmt::Display for KeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAction::Sym { sym, states } => write!(f, "sym({}, {})", sym, states),
            KeyAction::ScancodeKey {
                name,
                scancode,
                states,
            } => write!(f, "key({}, {}, {})", name, scancode, states),
            KeyAction::Commit(text) => write!(f, "commit({:?})", text),
            KeyAction::QuickPhrase => write!(f, "quick-phrase"),
            KeyAction::Unicode => write!(f, "unicode"),
            KeyAction::LangSwitch => write!(f, "lang-switch"),
            KeyAction::ShowInputMethodPicker => write!(f, "show-im-picker"),
            KeyAction::MoveSelection { start, end } => {
                write!(f, "move-selection({}, {})", start, end)
            }
            KeyAction::DeleteSelection => write!(f, "delete-selection"),
            KeyAction::DeleteSelectionAndSwipe(release) => write!(
                f,
                "delete-selection-swipe(x={}, y={}, total=({}, {}))",
                release.x, release.y, release.total_x, release.total_y
            ),
            KeyAction::PickerSwitch(Some(category)) => write!(f, "picker({})", category),
            KeyAction::PickerSwitch(None) => write!(f, "picker(last)"),
            KeyAction::SpaceLongPress => write!(f, "space-long-press"),
            KeyAction::Page(direction) => write!(f, "page({:?})", direction),
            KeyAction::PerformContextMenu(id) => write!(f, "context-menu({})", id),
            KeyAction::SendCombination {
                key_code,
                alt,
                ctrl,
                shift,
            } => write!(
                f,
                "combination({}, alt={}, ctrl={}, shift={})",
                key_code, alt, ctrl, shift
            ),
            KeyAction::AttachWindow(name) => write!(f, "attach({})", name),
        }
    }
}

/// Where an action came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionSource {
    /// Direct key press or gesture
    Keyboard,
    /// Chosen from a popup keyboard or menu
    Popup,
}

/// Host-side receiver of resolved key actions.
pub trait KeyActionListener {
    fn on_key_action(&mut self, action: KeyAction, source: ActionSource);
}

impl KeyActionListener for Vec<(KeyAction, ActionSource)> {
    fn on_key_action(&mut self, action: KeyAction, source: ActionSource) {
        self.push((action, source));
    }
}

impl<F> KeyActionListener for F
where
    F: FnMut(KeyAction, ActionSource),
{
    fn on_key_action(&mut self, action: KeyAction, source: ActionSource) {
        self(action, source)
    }
}
