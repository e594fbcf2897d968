// Keytouch Input Layer - Touch Router
// Resolves which key owns each pointer of a multi-pointer stream

use std::collections::HashMap;

use crate::input::{KeyGrid, TouchEvent, TouchPhase};
use crate::key::{KeyId, PointerId};

/// An event delivered to a key, already in that key's local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Routed {
    pub key: KeyId,
    pub event: TouchEvent,
}

/// How pointer events reach keys.
///
/// Implementations never fail: anything they cannot route comes back as
/// `None` and the caller falls back to its default dispatch.
pub trait RoutingStrategy: Send {
    /// Route one view-local event against the current grid
    fn route(&mut self, grid: &KeyGrid, event: &TouchEvent) -> Option<Routed>;

    /// Key currently owning a pointer, if the strategy tracks ownership
    fn owner(&self, _pointer: PointerId) -> Option<KeyId> {
        None
    }

    /// Forget all pointer state, e.g. when the keyboard is detached
    fn reset(&mut self) {}

    fn name(&self) -> &'static str;
}

/// Locks each pointer to the key it first touched.
///
/// Used on devices whose platform splitting drops or misroutes pointer-down
/// events when several keys are touched in quick succession. A pointer is
/// hit-tested once on Down and every later event of that pointer goes to the
/// same key until Up or Cancel, wherever it lands.
#[derive(Debug, Default)]
pub struct LockingRouter {
    locks: HashMap<PointerId, KeyId>,
}

impl LockingRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pointers currently locked
    pub fn active_pointers(&self) -> usize {
        self.locks.len()
    }

    fn forward(grid: &KeyGrid, key: KeyId, event: &TouchEvent) -> Option<Routed> {
        let local = grid.to_key_local(key, event.position)?;
        Some(Routed {
            key,
            event: event.with_position(local),
        })
    }
}

impl RoutingStrategy for LockingRouter {
    fn route(&mut self, grid: &KeyGrid, event: &TouchEvent) -> Option<Routed> {
        match event.phase {
            TouchPhase::Down => {
                let key = grid.find_key(event.position)?;
                if let Some(previous) = self.locks.insert(event.pointer, key) {
                    log::debug!(
                        "{} went down again while locked to {}, relocking",
                        event.pointer,
                        previous
                    );
                }
                log::debug!("Locked {} to {}", event.pointer, key);
                Self::forward(grid, key, event)
            }
            TouchPhase::Move => {
                let key = *self.locks.get(&event.pointer)?;
                Self::forward(grid, key, event)
            }
            TouchPhase::Up | TouchPhase::Cancel => {
                let key = self.locks.remove(&event.pointer)?;
                log::debug!("Released {} from {} ({})", event.pointer, key, event.phase);
                Self::forward(grid, key, event)
            }
        }
    }

    fn owner(&self, pointer: PointerId) -> Option<KeyId> {
        self.locks.get(&pointer).copied()
    }

    fn reset(&mut self) {
        self.locks.clear();
    }

    fn name(&self) -> &'static str {
        "locking"
    }
}

/// Trusts the platform's own multi-touch splitting.
///
/// The router stays inert; events arrive at keys directly through
/// [`crate::Keyboard::on_key_event`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;

impl RoutingStrategy for PassThrough {
    fn route(&mut self, _grid: &KeyGrid, _event: &TouchEvent) -> Option<Routed> {
        None
    }

    fn name(&self) -> &'static str {
        "pass-through"
    }
}

/// Front for the routing strategy chosen when the keyboard is built.
pub struct TouchRouter {
    strategy: Box<dyn RoutingStrategy>,
    workaround: bool,
}

impl TouchRouter {
    /// Pick [`LockingRouter`] when the device needs the touch workaround,
    /// [`PassThrough`] otherwise
    pub fn new(workaround: bool) -> Self {
        let strategy: Box<dyn RoutingStrategy> = if workaround {
            Box::new(LockingRouter::new())
        } else {
            Box::new(PassThrough)
        };
        Self {
            strategy,
            workaround,
        }
    }

    /// Use a custom strategy; it is treated as a workaround router
    pub fn with_strategy(strategy: Box<dyn RoutingStrategy>) -> Self {
        Self {
            strategy,
            workaround: true,
        }
    }

    pub fn is_workaround(&self) -> bool {
        self.workaround
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn route(&mut self, grid: &KeyGrid, event: &TouchEvent) -> Option<Routed> {
        let routed = self.strategy.route(grid, event);
        if routed.is_none() {
            log::trace!("{} {} not routed by {}", event.pointer, event.phase, self.strategy.name());
        }
        routed
    }

    pub fn owner(&self, pointer: PointerId) -> Option<KeyId> {
        self.strategy.owner(pointer)
    }

    pub fn reset(&mut self) {
        self.strategy.reset();
    }
}

impl std::fmt::Debug for TouchRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TouchRouter")
            .field("strategy", &self.strategy.name())
            .field("workaround", &self.workaround)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Rect};
    use std::time::Instant;

    fn grid() -> KeyGrid {
        let mut grid = KeyGrid::new(vec![vec![KeyId(0), KeyId(1)], vec![KeyId(2)]]);
        grid.layout(Rect::from_origin_size(0.0, 100.0, 200.0, 100.0), &[]);
        grid
    }

    fn event(pointer: i32, phase: TouchPhase, x: f32, y: f32) -> TouchEvent {
        TouchEvent::new(pointer, phase, x, y, Instant::now())
    }

    #[test]
    fn test_down_locks_and_transforms() {
        let grid = grid();
        let mut router = LockingRouter::new();
        let routed = router.route(&grid, &event(0, TouchPhase::Down, 150.0, 10.0)).unwrap();
        assert_eq!(routed.key, KeyId(1));
        assert_eq!(routed.event.position, Point::new(50.0, 10.0));
        assert_eq!(router.owner(PointerId(0)), Some(KeyId(1)));
    }

    #[test]
    fn test_move_follows_lock_outside_key() {
        let grid = grid();
        let mut router = LockingRouter::new();
        router.route(&grid, &event(0, TouchPhase::Down, 10.0, 10.0));
        // Drag across into the neighbouring key and the next row
        let routed = router.route(&grid, &event(0, TouchPhase::Move, 150.0, 80.0)).unwrap();
        assert_eq!(routed.key, KeyId(0));
        assert_eq!(routed.event.position, Point::new(150.0, 80.0));
    }

    #[test]
    fn test_up_and_cancel_release() {
        let grid = grid();
        let mut router = LockingRouter::new();
        router.route(&grid, &event(0, TouchPhase::Down, 10.0, 10.0));
        router.route(&grid, &event(1, TouchPhase::Down, 10.0, 60.0));
        assert_eq!(router.active_pointers(), 2);

        let up = router.route(&grid, &event(0, TouchPhase::Up, 12.0, 10.0)).unwrap();
        assert_eq!(up.key, KeyId(0));
        assert_eq!(router.owner(PointerId(0)), None);
        assert_eq!(router.owner(PointerId(1)), Some(KeyId(2)));

        let cancel = router.route(&grid, &event(1, TouchPhase::Cancel, 0.0, 0.0)).unwrap();
        assert_eq!(cancel.key, KeyId(2));
        assert_eq!(router.active_pointers(), 0);
    }

    #[test]
    fn test_unmatched_events_are_noops() {
        let grid = grid();
        let mut router = LockingRouter::new();
        assert!(router.route(&grid, &event(5, TouchPhase::Up, 10.0, 10.0)).is_none());
        assert!(router.route(&grid, &event(5, TouchPhase::Move, 10.0, 10.0)).is_none());
        assert_eq!(router.active_pointers(), 0);
    }

    #[test]
    fn test_down_miss_is_unhandled() {
        let grid = grid();
        let mut router = LockingRouter::new();
        assert!(router.route(&grid, &event(0, TouchPhase::Down, 10.0, -5.0)).is_none());
        assert!(router.route(&grid, &event(0, TouchPhase::Down, 10.0, 150.0)).is_none());
        assert_eq!(router.active_pointers(), 0);
    }

    #[test]
    fn test_detached_key_releases_but_is_unhandled() {
        let mut grid = grid();
        let mut router = LockingRouter::new();
        router.route(&grid, &event(0, TouchPhase::Down, 10.0, 10.0));
        grid.set_key_bounds(KeyId(0), None);
        assert!(router.route(&grid, &event(0, TouchPhase::Up, 10.0, 10.0)).is_none());
        assert_eq!(router.active_pointers(), 0);
    }

    #[test]
    fn test_pass_through_is_inert() {
        let grid = grid();
        let mut router = TouchRouter::new(false);
        assert!(!router.is_workaround());
        assert_eq!(router.strategy_name(), "pass-through");
        assert!(router.route(&grid, &event(0, TouchPhase::Down, 10.0, 10.0)).is_none());
        assert_eq!(router.owner(PointerId(0)), None);
    }

    #[test]
    fn test_touch_router_workaround_mode() {
        let grid = grid();
        let mut router = TouchRouter::new(true);
        assert_eq!(router.strategy_name(), "locking");
        router.route(&grid, &event(3, TouchPhase::Down, 10.0, 60.0));
        assert_eq!(router.owner(PointerId(3)), Some(KeyId(2)));
        router.reset();
        assert_eq!(router.owner(PointerId(3)), None);
    }
}
