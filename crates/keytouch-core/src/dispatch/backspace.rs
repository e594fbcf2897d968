// Keytouch Dispatch - Backspace Swipe
// Decides whether a backspace drag selects text or clears the composition

use std::fmt;

use crate::action::SwipeRelease;
use crate::dispatch::UiIntent;
use crate::engine::EngineJob;
use crate::keysym::{KeyState, KeyStates, KeySym};

/// Mode of the current backspace drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackspaceSwipeState {
    /// No drag in progress
    #[default]
    Stopped,
    /// Dragging extends a text selection that release deletes
    Selection,
    /// A composition was active; release may clear it
    Reset,
}

impl fmt::Display for BackspaceSwipeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackspaceSwipeState::Stopped => "stopped",
            BackspaceSwipeState::Selection => "selection",
            BackspaceSwipeState::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// Outcome of a backspace swipe transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwipeEffect {
    Nothing,
    Ui(UiIntent),
    Engine(EngineJob),
}

/// The backspace swipe state machine.
#[derive(Debug, Clone, Default)]
pub struct BackspaceSwipe {
    state: BackspaceSwipeState,
}

impl BackspaceSwipe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> BackspaceSwipeState {
        self.state
    }

    /// One selection step of a drag
    pub fn on_move_selection(
        &mut self,
        start: i32,
        end: i32,
        composition_empty: bool,
        candidates_showing: bool,
    ) -> SwipeEffect {
        match self.state {
            BackspaceSwipeState::Stopped => {
                if composition_empty && !candidates_showing {
                    self.transition(BackspaceSwipeState::Selection);
                    SwipeEffect::Ui(UiIntent::MoveSelection { start, end })
                } else {
                    self.transition(BackspaceSwipeState::Reset);
                    SwipeEffect::Nothing
                }
            }
            BackspaceSwipeState::Selection => SwipeEffect::Ui(UiIntent::MoveSelection { start, end }),
            BackspaceSwipeState::Reset => SwipeEffect::Nothing,
        }
    }

    /// Release of the backspace key; always ends the drag
    pub fn on_release(&mut self, release: &SwipeRelease) -> SwipeEffect {
        let effect = match self.state {
            BackspaceSwipeState::Stopped => SwipeEffect::Nothing,
            BackspaceSwipeState::Selection => SwipeEffect::Ui(UiIntent::DeleteSelection),
            BackspaceSwipeState::Reset => {
                if release.y < 0.0 && release.x > 0.0 {
                    SwipeEffect::Engine(EngineJob::SendKey {
                        sym: KeySym::RETURN,
                        states: KeyStates::of(&[KeyState::Shift]),
                    })
                } else if release.total_x < 0 {
                    SwipeEffect::Engine(EngineJob::Reset)
                } else {
                    SwipeEffect::Nothing
                }
            }
        };
        self.transition(BackspaceSwipeState::Stopped);
        effect
    }

    fn transition(&mut self, next: BackspaceSwipeState) {
        if self.state != next {
            log::debug!("Backspace swipe {} -> {}", self.state, next);
            self.state = next;
        }
    }
}
