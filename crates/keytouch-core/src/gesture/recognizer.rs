// Keytouch Gesture - Recognizer
// Turns one key's Down/Move/Up/Cancel stream plus elapsed time into discrete gestures

use std::time::{Duration, Instant};

use smallvec::SmallVec;

use crate::geometry::Point;
use crate::gesture::{GestureSession, SwipeThresholds};
use crate::handler::Flow;
use crate::key::PointerId;

/// Externally configured timing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureTiming {
    /// Hold time before long-press (or repeat) engages
    pub long_press_delay: Duration,
    /// Maximum Up-to-Up gap for two taps to count as a double tap
    pub double_tap_window: Duration,
    pub repeat_interval: Duration,
}

impl GestureTiming {
    pub fn from_millis(long_press: u64, double_tap: u64, repeat: u64) -> Self {
        Self {
            long_press_delay: Duration::from_millis(long_press),
            double_tap_window: Duration::from_millis(double_tap),
            repeat_interval: Duration::from_millis(repeat),
        }
    }
}

impl Default for GestureTiming {
    fn default() -> Self {
        Self::from_millis(300, 300, 50)
    }
}

/// Which gestures a key listens for.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureOptions {
    pub long_press: bool,
    pub repeat: bool,
    pub double_tap: bool,
    /// Step thresholds; `None` means moves never produce swipe steps
    pub swipe: Option<SwipeThresholds>,
}

/// Kind of continuous gesture event handed to the handler chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Down,
    Move,
    Up,
}

/// A continuous gesture event in the key's local coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureEvent {
    pub kind: GestureKind,
    /// Current pointer position
    pub x: f32,
    pub y: f32,
    /// Displacement from the Down position
    pub dx: f32,
    pub dy: f32,
    /// Steps newly crossed by this event
    pub count_x: i32,
    pub count_y: i32,
    /// Steps crossed since Down
    pub total_x: i32,
    pub total_y: i32,
    pub press_time: Duration,
    /// A handler already consumed an earlier Move of this session
    pub consumed: bool,
}

impl GestureEvent {
    fn from_session(
        kind: GestureKind,
        session: &GestureSession,
        count: (i32, i32),
        now: Instant,
    ) -> Self {
        let (dx, dy) = session.displacement();
        Self {
            kind,
            x: session.last.x,
            y: session.last.y,
            dx,
            dy,
            count_x: count.0,
            count_y: count.1,
            total_x: session.steps_x,
            total_y: session.steps_y,
            press_time: session.press_time(now),
            consumed: session.consumed,
        }
    }
}

/// Discrete gestures produced by the recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Discrete {
    Tap,
    LongPress,
    DoubleTap,
    RepeatTick,
}

pub type Discretes = SmallVec<[Discrete; 4]>;

/// Per-key gesture state machine.
///
/// Time never advances on its own: every entry point takes the current
/// instant, and expired deadlines are handled first thing on each call.
/// Hosts with no pointer traffic call [`GestureRecognizer::poll`] to let
/// long-press, repeat and deferred taps fire.
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    options: GestureOptions,
    timing: GestureTiming,
    session: Option<GestureSession>,
    /// Up time of a tap held back while a double tap is still possible
    pending_tap: Option<Instant>,
}

impl GestureRecognizer {
    pub fn new(options: GestureOptions, timing: GestureTiming) -> Self {
        Self {
            options,
            timing,
            session: None,
            pending_tap: None,
        }
    }

    pub fn options(&self) -> &GestureOptions {
        &self.options
    }

    pub fn timing(&self) -> &GestureTiming {
        &self.timing
    }

    /// Deadlines already armed keep their instants
    pub fn set_timing(&mut self, timing: GestureTiming) {
        self.timing = timing;
    }

    /// Takes effect from the next Move
    pub fn set_swipe_thresholds(&mut self, swipe: Option<SwipeThresholds>) {
        self.options.swipe = swipe;
    }

    pub fn session(&self) -> Option<&GestureSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Earliest instant at which [`Self::poll`] would produce something
    pub fn next_deadline(&self) -> Option<Instant> {
        let session = self.session.as_ref().and_then(GestureSession::next_deadline);
        let tap = self.pending_tap.map(|t| t + self.timing.double_tap_window);
        match (session, tap) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn on_down<H>(&mut self, pointer: PointerId, position: Point, now: Instant, mut handler: H) -> Discretes
    where
        H: FnMut(&GestureEvent) -> Flow,
    {
        let out = self.poll(now);
        if let Some(previous) = self.session.take() {
            log::debug!("Session of {} replaced by {}", previous.pointer, pointer);
        }

        let mut session = GestureSession::new(pointer, position, now);
        if self.options.long_press || self.options.repeat {
            session.long_press_deadline = Some(now + self.timing.long_press_delay);
        }
        handler(&GestureEvent::from_session(GestureKind::Down, &session, (0, 0), now));
        self.session = Some(session);
        out
    }

    pub fn on_move<H>(&mut self, pointer: PointerId, position: Point, now: Instant, mut handler: H) -> Discretes
    where
        H: FnMut(&GestureEvent) -> Flow,
    {
        let out = self.poll(now);
        let swipe = self.options.swipe;
        let Some(session) = self.session.as_mut().filter(|s| s.pointer == pointer) else {
            return out;
        };

        let count = advance_steps(session, swipe, position);
        let event = GestureEvent::from_session(GestureKind::Move, session, count, now);
        if handler(&event) == Flow::Consumed {
            session.consumed = true;
        }
        out
    }

    pub fn on_up<H>(&mut self, pointer: PointerId, position: Point, now: Instant, mut handler: H) -> Discretes
    where
        H: FnMut(&GestureEvent) -> Flow,
    {
        let mut out = self.poll(now);
        if self.session.as_ref().map(|s| s.pointer) != Some(pointer) {
            return out;
        }
        let Some(mut session) = self.session.take() else {
            return out;
        };

        let count = advance_steps(&mut session, self.options.swipe, position);
        let event = GestureEvent::from_session(GestureKind::Up, &session, count, now);
        let flow = handler(&event);

        let is_tap = flow == Flow::Pass
            && !session.consumed
            && !session.swiped
            && !session.long_press_fired
            && !session.repeating;
        if !is_tap {
            return out;
        }

        if !self.options.double_tap {
            out.push(Discrete::Tap);
        } else {
            match self.pending_tap.take() {
                Some(previous) if now.saturating_duration_since(previous) < self.timing.double_tap_window => {
                    out.push(Discrete::DoubleTap);
                }
                _ => self.pending_tap = Some(now),
            }
        }
        out
    }

    /// Drop the session of `pointer` without emitting anything.
    ///
    /// Returns true if a session was dropped.
    pub fn on_cancel(&mut self, pointer: PointerId) -> bool {
        if self.session.as_ref().is_some_and(|s| s.pointer == pointer) {
            self.session = None;
            return true;
        }
        false
    }

    /// Give up waiting for a second tap and fire the held-back one now
    pub fn flush_pending_tap(&mut self) -> Discretes {
        let mut out = Discretes::new();
        if self.pending_tap.take().is_some() {
            out.push(Discrete::Tap);
        }
        out
    }

    /// Forget the session and any deferred tap
    pub fn reset(&mut self) {
        self.session = None;
        self.pending_tap = None;
    }

    /// Fire whatever became due by `now`
    pub fn poll(&mut self, now: Instant) -> Discretes {
        let mut out = Discretes::new();
        let window = self.timing.double_tap_window;
        if self
            .pending_tap
            .is_some_and(|t| now.saturating_duration_since(t) >= window)
        {
            self.pending_tap = None;
            out.push(Discrete::Tap);
        }

        let Some(session) = self.session.as_mut() else {
            return out;
        };
        let interval = self.timing.repeat_interval.max(Duration::from_millis(1));

        if let Some(deadline) = session.long_press_deadline.filter(|d| now >= *d) {
            session.long_press_deadline = None;
            if self.pending_tap.take().is_some() {
                out.push(Discrete::Tap);
            }
            if self.options.repeat {
                session.repeating = true;
                session.next_repeat = Some(deadline + interval);
                out.push(Discrete::RepeatTick);
            } else {
                session.long_press_fired = true;
                out.push(Discrete::LongPress);
            }
        }

        while let Some(next) = session.next_repeat.filter(|n| now >= *n) {
            session.next_repeat = Some(next + interval);
            out.push(Discrete::RepeatTick);
        }
        out
    }
}

/// Move the session to `position` and return the newly crossed steps
fn advance_steps(session: &mut GestureSession, swipe: Option<SwipeThresholds>, position: Point) -> (i32, i32) {
    session.last = position;
    let Some(thresholds) = swipe else {
        return (0, 0);
    };
    let (dx, dy) = session.displacement();
    let (total_x, total_y) = thresholds.steps(dx, dy);
    let count = (total_x - session.steps_x, total_y - session.steps_y);
    session.steps_x = total_x;
    session.steps_y = total_y;
    if count != (0, 0) {
        session.swiped = true;
        session.disarm();
        log::trace!(
            "{} swipe steps ({}, {}), total ({}, {})",
            session.pointer,
            count.0,
            count.1,
            total_x,
            total_y
        );
    }
    count
}
