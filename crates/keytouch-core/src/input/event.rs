// Keytouch Input Layer - Pointer Events
// One entry of a multi-pointer touch stream

use std::fmt;
use std::time::Instant;

use crate::geometry::Point;
use crate::key::PointerId;

/// Phase of a single pointer within a touch stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
    Cancel,
}

impl TouchPhase {
    /// Returns true for the phases that end a pointer's lifetime
    pub fn is_terminal(self) -> bool {
        matches!(self, TouchPhase::Up | TouchPhase::Cancel)
    }
}

impl fmt::Display for TouchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TouchPhase::Down => write!(f, "down"),
            TouchPhase::Move => write!(f, "move"),
            TouchPhase::Up => write!(f, "up"),
            TouchPhase::Cancel => write!(f, "cancel"),
        }
    }
}

/// A pointer event in the keyboard view's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub pointer: PointerId,
    pub phase: TouchPhase,
    pub position: Point,
    pub time: Instant,
}

impl TouchEvent {
    pub fn new(pointer: impl Into<PointerId>, phase: TouchPhase, x: f32, y: f32, time: Instant) -> Self {
        Self {
            pointer: pointer.into(),
            phase,
            position: Point::new(x, y),
            time,
        }
    }

    /// Same event relocated to another coordinate space
    pub fn with_position(self, position: Point) -> Self {
        Self { position, ..self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_phases() {
        assert!(TouchPhase::Up.is_terminal());
        assert!(TouchPhase::Cancel.is_terminal());
        assert!(!TouchPhase::Down.is_terminal());
        assert!(!TouchPhase::Move.is_terminal());
    }

    #[test]
    fn test_with_position_keeps_identity() {
        let now = Instant::now();
        let event = TouchEvent::new(2, TouchPhase::Move, 5.0, 6.0, now);
        let moved = event.with_position(Point::new(1.0, 1.0));
        assert_eq!(moved.pointer, PointerId(2));
        assert_eq!(moved.phase, TouchPhase::Move);
        assert_eq!(moved.time, now);
        assert_eq!(moved.position, Point::new(1.0, 1.0));
    }
}
