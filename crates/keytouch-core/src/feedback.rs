// Keytouch Feedback
// Selection tracking and the haptic/sound side-effect hook

use std::sync::Arc;

use parking_lot::Mutex;

/// Current text cursor or selection as last reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: i32,
    pub end: i32,
}

impl Selection {
    /// Build a selection with `start <= end`
    pub fn new(a: i32, b: i32) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> i32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.is_caret()
    }
}

/// Click sound played on press, by key kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SoundEffect {
    #[default]
    Standard,
    SpaceBar,
    Delete,
    Return,
}

/// Host-provided side effects, invoked synchronously on the event thread.
pub trait FeedbackHook: Send {
    fn haptic(&mut self);
    fn sound(&mut self, effect: SoundEffect);
}

/// What a [`FeedbackLog`] saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackEvent {
    Haptic,
    Sound(SoundEffect),
}

/// Hook that only records; clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct FeedbackLog {
    events: Arc<Mutex<Vec<FeedbackEvent>>>,
}

impl FeedbackLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<FeedbackEvent> {
        self.events.lock().clone()
    }

    pub fn haptic_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| **e == FeedbackEvent::Haptic)
            .count()
    }
}

impl FeedbackHook for FeedbackLog {
    fn haptic(&mut self) {
        self.events.lock().push(FeedbackEvent::Haptic);
    }

    fn sound(&mut self, effect: SoundEffect) {
        self.events.lock().push(FeedbackEvent::Sound(effect));
    }
}

/// Applies the feedback gating rules in front of an optional hook.
#[derive(Default)]
pub struct Feedback {
    hook: Option<Box<dyn FeedbackHook>>,
    haptic_enabled: bool,
}

impl Feedback {
    pub fn new(hook: Option<Box<dyn FeedbackHook>>, haptic_enabled: bool) -> Self {
        Self {
            hook,
            haptic_enabled,
        }
    }

    pub fn set_hook(&mut self, hook: Option<Box<dyn FeedbackHook>>) {
        self.hook = hook;
    }

    pub fn set_haptic_enabled(&mut self, enabled: bool) {
        self.haptic_enabled = enabled;
    }

    /// Key press: sound always, haptic whenever enabled
    pub fn press(&mut self, effect: SoundEffect) {
        let haptic = self.haptic_enabled;
        if let Some(hook) = self.hook.as_mut() {
            hook.sound(effect);
            if haptic {
                hook.haptic();
            }
        }
    }

    /// Haptic for repeat ticks and selection-moving swipe steps.
    ///
    /// Suppressed while the cursor sits at the very start of the text, and
    /// whenever the caller's own condition does not hold.
    pub fn gated(&mut self, selection: Selection, condition: bool) {
        if !self.haptic_enabled || !(selection.end > 0 && selection.start > 0 && condition) {
            return;
        }
        if let Some(hook) = self.hook.as_mut() {
            hook.haptic();
        }
    }
}

impl std::fmt::Debug for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feedback")
            .field("hooked", &self.hook.is_some())
            .field("haptic_enabled", &self.haptic_enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feedback(enabled: bool) -> (Feedback, FeedbackLog) {
        let log = FeedbackLog::new();
        (Feedback::new(Some(Box::new(log.clone())), enabled), log)
    }

    #[test]
    fn test_selection_normalizes() {
        let sel = Selection::new(7, 3);
        assert_eq!(sel, Selection { start: 3, end: 7 });
        assert_eq!(sel.len(), 4);
        assert!(Selection::new(2, 2).is_caret());
    }

    #[test]
    fn test_press_is_unconditional() {
        let (mut fb, log) = feedback(true);
        fb.press(SoundEffect::Delete);
        assert_eq!(
            log.events(),
            vec![FeedbackEvent::Sound(SoundEffect::Delete), FeedbackEvent::Haptic]
        );
    }

    #[test]
    fn test_gated_requires_selection_past_start() {
        let (mut fb, log) = feedback(true);
        fb.gated(Selection::new(0, 0), true);
        fb.gated(Selection::new(0, 5), true);
        assert_eq!(log.haptic_count(), 0);
        fb.gated(Selection::new(3, 3), true);
        assert_eq!(log.haptic_count(), 1);
        fb.gated(Selection::new(3, 3), false);
        assert_eq!(log.haptic_count(), 1);
    }

    #[test]
    fn test_disabled_haptics_still_click() {
        let (mut fb, log) = feedback(false);
        fb.press(SoundEffect::SpaceBar);
        fb.gated(Selection::new(4, 9), true);
        assert_eq!(log.events(), vec![FeedbackEvent::Sound(SoundEffect::SpaceBar)]);
    }
}
