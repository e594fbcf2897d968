// Keytouch Dispatch Module
// Stateful resolution of key actions into engine jobs and UI intents

pub mod backspace;
pub mod behavior;
pub mod dispatcher;
pub mod intent;

pub use backspace::{BackspaceSwipe, BackspaceSwipeState, SwipeEffect};
pub use behavior::{LangSwitchBehavior, PickerCategory, SpaceLongPressBehavior};
pub use dispatcher::{ActionDispatcher, DispatchSettings, DEFAULT_PAGE_SIZE};
pub use intent::UiIntent;
