// Keytouch Dispatch - UI Intents
// Requests the dispatcher hands to the host UI rather than to the engine

use std::fmt;

use crate::dispatch::PickerCategory;

/// Work only the host UI can carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiIntent {
    /// Shift the editor selection boundaries by the given character counts
    MoveSelection { start: i32, end: i32 },
    DeleteSelection,
    /// Fewer than two input variants are enabled; ask the user to add some
    PromptAddInputVariants,
    ShowInputMethodPicker,
    /// Switch to the next platform input method
    NextInputMethodApp,
    AttachPicker(PickerCategory),
    AttachWindow(String),
    PerformContextMenu(u32),
    SendCombination {
        key_code: u16,
        alt: bool,
        ctrl: bool,
        shift: bool,
    },
    /// The candidate window contents changed and should be redrawn
    CandidatesChanged,
}

impl fmt::Display for UiIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiIntent::MoveSelection { start, end } => write!(f, "move-selection({}, {})", start, end),
            UiIntent::DeleteSelection => write!(f, "delete-selection"),
            UiIntent::PromptAddInputVariants => write!(f, "prompt-add-input-variants"),
            UiIntent::ShowInputMethodPicker => write!(f, "show-im-picker"),
            UiIntent::NextInputMethodApp => write!(f, "next-input-method"),
            UiIntent::AttachPicker(category) => write!(f, "attach-picker({})", category),
            UiIntent::AttachWindow(name) => write!(f, "attach-window({})", name),
            UiIntent::PerformContextMenu(id) => write!(f, "context-menu({})", id),
            UiIntent::SendCombination {
                key_code,
                alt,
                ctrl,
                shift,
            } => write!(
                f,
                "combination({}, alt={}, ctrl={}, shift={})",
                key_code, alt, ctrl, shift
            ),
            UiIntent::CandidatesChanged => write!(f, "candidates-changed"),
        }
    }
}
