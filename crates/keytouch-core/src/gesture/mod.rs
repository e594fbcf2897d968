// Keytouch Gesture Layer
// Per-key classification of pointer streams into discrete gestures

mod recognizer;
mod session;
mod thresholds;

pub use recognizer::{
    Discrete, Discretes, GestureEvent, GestureKind, GestureOptions, GestureRecognizer, GestureTiming,
};
pub use session::GestureSession;
pub use thresholds::{
    SwipeDirection, SwipeSymbolDirection, SwipeThresholds, ThresholdLevel, DISABLED_SWIPE_THRESHOLD_DP,
    INPUT_SWIPE_THRESHOLD_DP, SELECTION_SWIPE_THRESHOLD_DP,
};
