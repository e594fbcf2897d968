// Keytouch Gesture - Session
// State of one touch interaction on one key

use std::time::{Duration, Instant};

use crate::geometry::Point;
use crate::key::PointerId;

/// Tracking data for a single Down..Up/Cancel interaction.
///
/// Created on Down and dropped on Up, Cancel or a replacing Down. Step
/// counts only ever move by whole steps and are reported exactly once.
#[derive(Debug, Clone)]
pub struct GestureSession {
    pub pointer: PointerId,
    pub start_time: Instant,
    pub start: Point,
    pub last: Point,
    /// Steps already reported along each axis
    pub steps_x: i32,
    pub steps_y: i32,
    /// Set once a Move handler consumed the gesture
    pub consumed: bool,
    pub long_press_fired: bool,
    pub repeating: bool,
    /// At least one swipe step was crossed
    pub swiped: bool,
    pub(crate) long_press_deadline: Option<Instant>,
    pub(crate) next_repeat: Option<Instant>,
}

impl GestureSession {
    pub fn new(pointer: PointerId, start: Point, start_time: Instant) -> Self {
        Self {
            pointer,
            start_time,
            start,
            last: start,
            steps_x: 0,
            steps_y: 0,
            consumed: false,
            long_press_fired: false,
            repeating: false,
            swiped: false,
            long_press_deadline: None,
            next_repeat: None,
        }
    }

    /// Displacement of the last seen position from the start
    pub fn displacement(&self) -> (f32, f32) {
        (self.last.x - self.start.x, self.last.y - self.start.y)
    }

    pub fn press_time(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start_time)
    }

    /// Stop any pending long-press or repeat
    pub fn disarm(&mut self) {
        self.long_press_deadline = None;
        self.next_repeat = None;
    }

    /// Earliest instant at which this session has something to fire
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.long_press_deadline, self.next_repeat) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_displacement_and_press_time() {
        let t0 = Instant::now();
        let mut session = GestureSession::new(PointerId(0), Point::new(10.0, 10.0), t0);
        session.last = Point::new(4.0, 30.0);
        assert_eq!(session.displacement(), (-6.0, 20.0));
        assert_eq!(session.press_time(t0 + Duration::from_millis(120)), Duration::from_millis(120));
    }

    #[test]
    fn test_disarm_clears_deadlines() {
        let t0 = Instant::now();
        let mut session = GestureSession::new(PointerId(0), Point::ORIGIN, t0);
        session.long_press_deadline = Some(t0 + Duration::from_millis(300));
        assert_eq!(session.next_deadline(), Some(t0 + Duration::from_millis(300)));
        session.disarm();
        assert_eq!(session.next_deadline(), None);
    }
}
