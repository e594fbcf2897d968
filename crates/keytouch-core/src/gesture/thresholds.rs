// Keytouch Gesture - Swipe Thresholds
// Per-axis step distances and swipe direction checks

use serde::Deserialize;
use strum_macros::{Display, EnumString};

/// Step distance for swipes that adjust the cursor or selection, in dp
pub const SELECTION_SWIPE_THRESHOLD_DP: f32 = 10.0;
/// Step distance for swipes that input an alternative symbol, in dp
pub const INPUT_SWIPE_THRESHOLD_DP: f32 = 36.0;
/// Step distance large enough that the axis never registers a step, in dp
pub const DISABLED_SWIPE_THRESHOLD_DP: f32 = 800.0;

/// Named threshold levels, scaled by display density when resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdLevel {
    Selection,
    Input,
    Disabled,
}

impl ThresholdLevel {
    pub fn dp(self) -> f32 {
        match self {
            ThresholdLevel::Selection => SELECTION_SWIPE_THRESHOLD_DP,
            ThresholdLevel::Input => INPUT_SWIPE_THRESHOLD_DP,
            ThresholdLevel::Disabled => DISABLED_SWIPE_THRESHOLD_DP,
        }
    }

    /// Resolve to pixels for a given density (pixels per dp)
    pub fn px(self, density: f32) -> f32 {
        self.dp() * density
    }
}

/// Minimum displacement per axis, in pixels, for one discrete swipe step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeThresholds {
    pub x: f32,
    pub y: f32,
}

impl SwipeThresholds {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn from_levels(x: ThresholdLevel, y: ThresholdLevel, density: f32) -> Self {
        Self::new(x.px(density), y.px(density))
    }

    /// Whole steps covered by a displacement, truncated toward zero
    pub fn steps(&self, dx: f32, dy: f32) -> (i32, i32) {
        (axis_steps(dx, self.x), axis_steps(dy, self.y))
    }
}

fn axis_steps(displacement: f32, threshold: f32) -> i32 {
    if threshold <= 0.0 || !displacement.is_finite() {
        return 0;
    }
    (displacement / threshold) as i32
}

/// The four directions a directional swipe may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Up,
    Down,
    Left,
    Right,
}

impl SwipeDirection {
    /// Dominant direction of a step total, `None` when nothing moved.
    ///
    /// Horizontal wins only when strictly larger than vertical.
    pub fn classify(total_x: i32, total_y: i32) -> Option<Self> {
        if total_x.abs() > total_y.abs() {
            Some(if total_x > 0 {
                SwipeDirection::Right
            } else {
                SwipeDirection::Left
            })
        } else if total_y != 0 {
            Some(if total_y > 0 {
                SwipeDirection::Down
            } else {
                SwipeDirection::Up
            })
        } else {
            None
        }
    }
}

/// Which vertical swipe inputs a key's alternative symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SwipeSymbolDirection {
    #[default]
    Up,
    Down,
    Disabled,
}

impl SwipeSymbolDirection {
    /// Check a vertical step total against this direction
    pub fn check_y(self, total_y: i32) -> bool {
        match self {
            SwipeSymbolDirection::Up => total_y < 0,
            SwipeSymbolDirection::Down => total_y > 0,
            SwipeSymbolDirection::Disabled => false,
        }
    }
}
