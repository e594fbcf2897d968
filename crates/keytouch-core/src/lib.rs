// Keytouch Core Library
// Touch input core of a virtual keyboard: routing, gestures, paging and dispatch

pub mod action;
pub mod candidates;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod feedback;
pub mod geometry;
pub mod gesture;
pub mod handler;
pub mod input;
pub mod key;
pub mod keyboard;
pub mod keysym;
pub mod layout;
pub mod popup;
pub mod prefs;

pub use action::{ActionSource, KeyAction, KeyActionListener, PageDirection, SwipeRelease};
pub use candidates::{CandidateList, CandidatePager, CandidateWindow};
pub use config::{parse_layout, parse_layout_file, ConfigError, KeyboardConfig};
pub use dispatch::{
    ActionDispatcher, BackspaceSwipe, BackspaceSwipeState, DispatchSettings, LangSwitchBehavior,
    PickerCategory, SpaceLongPressBehavior, UiIntent,
};
pub use engine::{
    run_jobs, Completion, CompletionSender, CompositionEngine, EngineJob, JobQueue, RecordingEngine,
};
pub use feedback::{FeedbackHook, FeedbackLog, Selection, SoundEffect};
pub use geometry::{Point, Rect};
pub use gesture::{
    Discrete, GestureEvent, GestureKind, GestureOptions, GestureRecognizer, GestureTiming,
    SwipeDirection, SwipeSymbolDirection, SwipeThresholds,
};
pub use handler::{Flow, GestureHandler, HandlerChain, HandlerPriority};
pub use input::{KeyGrid, LockingRouter, PassThrough, RoutingStrategy, TouchEvent, TouchPhase, TouchRouter};
pub use key::{KeyId, PointerId};
pub use keyboard::{Keyboard, TouchSettings};
pub use keysym::{KeyState, KeyStates, KeySym};
pub use layout::{Behavior, KeyDef, KeyKind, Layout, Popup};
pub use popup::{MenuItem, NoPopup, PopupAction, PopupActionListener, PopupRecorder};
pub use prefs::{MemoryPreferences, PreferenceStore, Preferences, PreferencesError};
