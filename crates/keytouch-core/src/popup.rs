// Keytouch Popups
// Popup sub-events sent to the host and the interface it implements

use std::sync::Arc;

use parking_lot::Mutex;

use crate::action::KeyAction;
use crate::geometry::Rect;
use crate::key::KeyId;

/// One entry of a long-press popup menu.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub label: String,
    pub action: KeyAction,
}

impl MenuItem {
    pub fn new(label: impl Into<String>, action: KeyAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Popup sub-events, keyed by the owning key and carrying its bounds where
/// the host needs to position something.
#[derive(Debug, Clone, PartialEq)]
pub enum PopupAction {
    /// Show a press preview bubble
    Preview {
        key: KeyId,
        content: String,
        bounds: Rect,
    },
    /// Replace the text of a visible preview
    PreviewUpdate { key: KeyId, content: String },
    Dismiss { key: KeyId },
    /// Show the popup keyboard identified by `label`
    ShowKeyboard {
        key: KeyId,
        label: String,
        bounds: Rect,
    },
    ShowMenu {
        key: KeyId,
        items: Vec<MenuItem>,
        bounds: Rect,
    },
}

impl PopupAction {
    pub fn key(&self) -> KeyId {
        match self {
            PopupAction::Preview { key, .. }
            | PopupAction::PreviewUpdate { key, .. }
            | PopupAction::Dismiss { key }
            | PopupAction::ShowKeyboard { key, .. }
            | PopupAction::ShowMenu { key, .. } => *key,
        }
    }
}

/// Host side of the popup protocol.
pub trait PopupActionListener: Send {
    fn on_popup_action(&mut self, action: PopupAction);

    /// Move the focus of `key`'s visible popup to a key-local position.
    /// Returns true if a popup took the move.
    fn change_focus(&mut self, _key: KeyId, _x: f32, _y: f32) -> bool {
        false
    }

    /// Resolve the focused entry of `key`'s popup, if one is showing
    fn trigger(&mut self, _key: KeyId) -> Option<KeyAction> {
        None
    }
}

/// Listener for hosts without popups.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPopup;

impl PopupActionListener for NoPopup {
    fn on_popup_action(&mut self, _action: PopupAction) {}
}

#[derive(Debug, Default)]
struct RecorderState {
    actions: Vec<PopupAction>,
    focus_changes: Vec<(KeyId, f32, f32)>,
    /// Entry returned by the next trigger while a popup is showing
    focused: Option<KeyAction>,
    showing: Option<KeyId>,
}

/// Popup listener that records everything it is sent.
///
/// Clones share state, so one handle can be boxed into a keyboard while
/// another inspects it. A shown menu focuses its first item; keyboards
/// focus whatever [`PopupRecorder::set_focused`] says.
#[derive(Debug, Default, Clone)]
pub struct PopupRecorder {
    state: Arc<Mutex<RecorderState>>,
}

impl PopupRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry the next trigger resolves to
    pub fn set_focused(&self, action: Option<KeyAction>) {
        self.state.lock().focused = action;
    }

    pub fn actions(&self) -> Vec<PopupAction> {
        self.state.lock().actions.clone()
    }

    pub fn take_actions(&self) -> Vec<PopupAction> {
        std::mem::take(&mut self.state.lock().actions)
    }

    pub fn focus_changes(&self) -> Vec<(KeyId, f32, f32)> {
        self.state.lock().focus_changes.clone()
    }
}

impl PopupActionListener for PopupRecorder {
    fn on_popup_action(&mut self, action: PopupAction) {
        let mut state = self.state.lock();
        match &action {
            PopupAction::ShowMenu { key, items, .. } => {
                state.showing = Some(*key);
                if state.focused.is_none() {
                    state.focused = items.first().map(|item| item.action.clone());
                }
            }
            PopupAction::ShowKeyboard { key, .. } => state.showing = Some(*key),
            PopupAction::Dismiss { key } if state.showing == Some(*key) => {
                state.showing = None;
                state.focused = None;
            }
            _ => {}
        }
        state.actions.push(action);
    }

    fn change_focus(&mut self, key: KeyId, x: f32, y: f32) -> bool {
        let mut state = self.state.lock();
        if state.showing != Some(key) {
            return false;
        }
        state.focus_changes.push((key, x, y));
        true
    }

    fn trigger(&mut self, key: KeyId) -> Option<KeyAction> {
        let state = self.state.lock();
        if state.showing != Some(key) {
            return None;
        }
        state.focused.clone()
    }
}
