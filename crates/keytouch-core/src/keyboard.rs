// Keytouch Keyboard
// Wires pointer routing, per-key gesture recognition and handlers to the action listener

use std::time::Instant;

use indexmap::IndexMap;

use crate::action::{ActionSource, KeyActionListener};
use crate::feedback::{Feedback, FeedbackHook, Selection};
use crate::geometry::Rect;
use crate::gesture::{Discrete, Discretes, GestureEvent, GestureRecognizer, GestureTiming, SwipeSymbolDirection};
use crate::handler::{HandlerChain, HandlerContext};
use crate::input::{KeyGrid, TouchEvent, TouchPhase, TouchRouter};
use crate::key::KeyId;
use crate::layout::{KeyDef, Layout, Popup};
use crate::popup::{NoPopup, PopupAction, PopupActionListener};

/// Keyboard-wide touch behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSettings {
    pub timing: GestureTiming,
    /// Pixels per density-independent unit
    pub density: f32,
    pub haptic_feedback: bool,
    pub popup_on_key_press: bool,
    pub symbol_direction: SwipeSymbolDirection,
    pub space_swipe_move_cursor: bool,
    /// Lock pointers to keys at first contact instead of trusting the platform
    pub touch_workaround: bool,
}

impl Default for TouchSettings {
    fn default() -> Self {
        Self {
            timing: GestureTiming::default(),
            density: 1.0,
            haptic_feedback: true,
            popup_on_key_press: true,
            symbol_direction: SwipeSymbolDirection::Up,
            space_swipe_move_cursor: true,
            touch_workaround: false,
        }
    }
}

struct KeySlot {
    def: KeyDef,
    recognizer: GestureRecognizer,
    chain: HandlerChain,
}

impl KeySlot {
    fn new(def: KeyDef, settings: &TouchSettings) -> Self {
        let chain = def.handler_chain();
        let mut options = def.gesture_options();
        options.swipe = chain.thresholds(settings);
        Self {
            recognizer: GestureRecognizer::new(options, settings.timing),
            chain,
            def,
        }
    }
}

/// A keyboard layout instance receiving touch input.
///
/// Owns the key grid, the router chosen at construction and one gesture
/// recognizer plus handler chain per key. Resolved actions go to the
/// [`KeyActionListener`] passed into each call.
pub struct Keyboard {
    keys: IndexMap<KeyId, KeySlot>,
    grid: KeyGrid,
    widths: Vec<Vec<f32>>,
    router: TouchRouter,
    settings: TouchSettings,
    popups: Box<dyn PopupActionListener>,
    feedback: Feedback,
    selection: Selection,
    candidates_showing: bool,
}

impl Keyboard {
    pub fn new(layout: Layout, settings: TouchSettings) -> Self {
        let widths = layout.widths();
        let mut keys = IndexMap::with_capacity(layout.key_count());
        let mut rows = Vec::with_capacity(layout.rows.len());
        let mut next_id = 0u32;
        for row in layout.rows {
            let mut ids = Vec::with_capacity(row.len());
            for def in row {
                let id = KeyId(next_id);
                next_id += 1;
                keys.insert(id, KeySlot::new(def, &settings));
                ids.push(id);
            }
            rows.push(ids);
        }

        log::debug!(
            "Keyboard built with {} keys in {} rows, workaround={}",
            keys.len(),
            rows.len(),
            settings.touch_workaround
        );

        Self {
            keys,
            grid: KeyGrid::new(rows),
            widths,
            router: TouchRouter::new(settings.touch_workaround),
            settings,
            popups: Box::new(NoPopup),
            feedback: Feedback::new(None, settings.haptic_feedback),
            selection: Selection::default(),
            candidates_showing: false,
        }
    }

    pub fn with_popups(mut self, popups: Box<dyn PopupActionListener>) -> Self {
        self.popups = popups;
        self
    }

    pub fn with_feedback(mut self, hook: Box<dyn FeedbackHook>) -> Self {
        self.feedback.set_hook(Some(hook));
        self
    }

    pub fn settings(&self) -> &TouchSettings {
        &self.settings
    }

    /// Apply new settings to every key.
    ///
    /// The routing mode is fixed at construction and is not changed here.
    pub fn set_settings(&mut self, settings: TouchSettings) {
        if settings.touch_workaround != self.router.is_workaround() {
            log::warn!("Touch workaround mode only changes when the keyboard is rebuilt");
        }
        for slot in self.keys.values_mut() {
            slot.recognizer.set_timing(settings.timing);
            slot.recognizer.set_swipe_thresholds(slot.chain.thresholds(&settings));
        }
        self.feedback.set_haptic_enabled(settings.haptic_feedback);
        self.settings = settings;
    }

    pub fn grid(&self) -> &KeyGrid {
        &self.grid
    }

    pub fn router(&self) -> &TouchRouter {
        &self.router
    }

    pub fn key_ids(&self) -> impl Iterator<Item = KeyId> + '_ {
        self.keys.keys().copied()
    }

    pub fn key_def(&self, key: KeyId) -> Option<&KeyDef> {
        self.keys.get(&key).map(|slot| &slot.def)
    }

    /// First key whose label matches
    pub fn find_key_by_label(&self, label: &str) -> Option<KeyId> {
        self.keys
            .iter()
            .find(|(_, slot)| slot.def.label == label)
            .map(|(id, _)| *id)
    }

    /// Recompute all key bounds for the view's new screen-space bounds
    pub fn set_size(&mut self, view: Rect) {
        self.grid.layout(view, &self.widths);
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn on_selection_update(&mut self, start: i32, end: i32) {
        self.selection = Selection::new(start, end);
    }

    pub fn candidates_showing(&self) -> bool {
        self.candidates_showing
    }

    pub fn on_candidate_update(&mut self, showing: bool) {
        self.candidates_showing = showing;
    }

    /// Handle one event of the view's touch stream.
    ///
    /// Returns false when the event was not routed to any key, in which case
    /// the host falls back to its default dispatch.
    pub fn on_touch(&mut self, event: TouchEvent, listener: &mut dyn KeyActionListener) -> bool {
        let owner = self.router.owner(event.pointer);
        let Some(routed) = self.router.route(&self.grid, &event) else {
            // A lock released without delivery must not leave a live session behind
            if let Some((owner_key, slot)) = owner
                .filter(|_| event.phase.is_terminal())
                .and_then(|key| self.keys.get_mut(&key).map(|slot| (key, slot)))
            {
                if slot.recognizer.on_cancel(event.pointer) {
                    self.popups.on_popup_action(PopupAction::Dismiss { key: owner_key });
                }
            }
            return false;
        };
        self.on_key_event(routed.key, routed.event, listener)
    }

    /// Handle an event the platform already delivered to `key`, in the
    /// key's local coordinates
    pub fn on_key_event(
        &mut self,
        key: KeyId,
        event: TouchEvent,
        listener: &mut dyn KeyActionListener,
    ) -> bool {
        if !self.keys.contains_key(&key) {
            log::warn!("Touch event for unknown {}", key);
            return false;
        }
        if event.phase == TouchPhase::Down {
            // A tap held back for a double tap goes out before anything this touch produces
            self.flush_deferred_taps(key, listener);
        }
        let Some(slot) = self.keys.get_mut(&key) else {
            return false;
        };
        let Some(bounds) = self.grid.key_bounds(key) else {
            log::warn!("{} has no bounds, dropping {} event", key, event.phase);
            if event.phase.is_terminal() && slot.recognizer.on_cancel(event.pointer) {
                self.popups.on_popup_action(PopupAction::Dismiss { key });
            }
            return false;
        };

        let mut ctx = HandlerContext {
            key,
            bounds,
            settings: &self.settings,
            candidates_showing: self.candidates_showing,
            selection: self.selection,
            actions: listener,
            popups: self.popups.as_mut(),
            feedback: &mut self.feedback,
        };
        let chain = &slot.chain;
        let discretes = match event.phase {
            TouchPhase::Down => {
                ctx.feedback.press(slot.def.sound_effect());
                slot.recognizer
                    .on_down(event.pointer, event.position, event.time, |e: &GestureEvent| {
                        chain.handle(e, &mut ctx)
                    })
            }
            TouchPhase::Move => slot
                .recognizer
                .on_move(event.pointer, event.position, event.time, |e: &GestureEvent| {
                    chain.handle(e, &mut ctx)
                }),
            TouchPhase::Up => slot
                .recognizer
                .on_up(event.pointer, event.position, event.time, |e: &GestureEvent| {
                    chain.handle(e, &mut ctx)
                }),
            TouchPhase::Cancel => {
                // Popups shown for the session go away; no action is emitted
                if slot.recognizer.on_cancel(event.pointer) {
                    ctx.popups.on_popup_action(PopupAction::Dismiss { key });
                }
                Discretes::new()
            }
        };
        apply_discretes(&slot.def, discretes, &mut ctx);
        true
    }

    /// Fire long-presses, repeats and deferred taps that became due
    pub fn tick(&mut self, now: Instant, listener: &mut dyn KeyActionListener) {
        self.drain_keys(listener, |_, recognizer| recognizer.poll(now));
    }

    /// Release the held-back taps of every key but `except`
    fn flush_deferred_taps(&mut self, except: KeyId, listener: &mut dyn KeyActionListener) {
        self.drain_keys(listener, |key, recognizer| {
            if key == except {
                Discretes::new()
            } else {
                recognizer.flush_pending_tap()
            }
        });
    }

    /// Collect discrete gestures from each key in layout order and apply them
    fn drain_keys<F>(&mut self, listener: &mut dyn KeyActionListener, mut collect: F)
    where
        F: FnMut(KeyId, &mut GestureRecognizer) -> Discretes,
    {
        for (key, slot) in self.keys.iter_mut() {
            let discretes = collect(*key, &mut slot.recognizer);
            if discretes.is_empty() {
                continue;
            }
            let mut ctx = HandlerContext {
                key: *key,
                bounds: self.grid.key_bounds(*key).unwrap_or_default(),
                settings: &self.settings,
                candidates_showing: self.candidates_showing,
                selection: self.selection,
                actions: &mut *listener,
                popups: self.popups.as_mut(),
                feedback: &mut self.feedback,
            };
            apply_discretes(&slot.def, discretes, &mut ctx);
        }
    }

    /// Earliest instant at which [`Self::tick`] has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        self.keys
            .values()
            .filter_map(|slot| slot.recognizer.next_deadline())
            .min()
    }

    /// Drop all pointer locks and gesture sessions without emitting any
    /// action. Popups of keys still being touched are dismissed.
    pub fn detach(&mut self) {
        self.router.reset();
        for (key, slot) in self.keys.iter_mut() {
            if slot.recognizer.is_active() {
                self.popups.on_popup_action(PopupAction::Dismiss { key: *key });
            }
            slot.recognizer.reset();
        }
    }
}

fn apply_discretes(def: &KeyDef, discretes: Discretes, ctx: &mut HandlerContext<'_>) {
    for discrete in discretes {
        log::trace!("{} {:?}", ctx.key, discrete);
        match discrete {
            Discrete::Tap => {
                if let Some(action) = def.press_action() {
                    ctx.actions.on_key_action(action.clone(), ActionSource::Keyboard);
                }
            }
            Discrete::DoubleTap => {
                if let Some(action) = def.double_tap_action() {
                    ctx.actions.on_key_action(action.clone(), ActionSource::Keyboard);
                }
            }
            Discrete::LongPress => match def.long_press_popup() {
                Some(Popup::Menu(items)) => ctx.popups.on_popup_action(PopupAction::ShowMenu {
                    key: ctx.key,
                    items: items.clone(),
                    bounds: ctx.bounds,
                }),
                Some(Popup::Keyboard { label }) => ctx.popups.on_popup_action(PopupAction::ShowKeyboard {
                    key: ctx.key,
                    label: label.clone(),
                    bounds: ctx.bounds,
                }),
                _ => {
                    if let Some(action) = def.long_press_action() {
                        ctx.actions.on_key_action(action.clone(), ActionSource::Keyboard);
                    }
                }
            },
            Discrete::RepeatTick => {
                if let Some(action) = def.repeat_action() {
                    ctx.actions.on_key_action(action.clone(), ActionSource::Keyboard);
                    let selection = ctx.selection;
                    ctx.feedback.gated(selection, selection.end >= selection.start);
                }
            }
        }
    }
}

impl std::fmt::Debug for Keyboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keyboard")
            .field("keys", &self.keys.len())
            .field("router", &self.router)
            .field("settings", &self.settings)
            .field("selection", &self.selection)
            .field("candidates_showing", &self.candidates_showing)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::KeyAction;
    use crate::feedback::{FeedbackEvent, FeedbackLog, SoundEffect};
    use crate::key::PointerId;
    use crate::keysym::KeySym;
    use crate::layout::{alphabet_key, backspace_key, space_key};
    use crate::popup::PopupRecorder;
    use std::time::Duration;

    type Sink = Vec<(KeyAction, ActionSource)>;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// One row: "a" (0..100), space (100..300), backspace (300..400); 50 px high
    fn keyboard(workaround: bool) -> Keyboard {
        let layout = Layout::new(vec![vec![
            alphabet_key("a", Some("1")).with_width(0.25),
            space_key().with_width(0.5),
            backspace_key().with_width(0.25),
        ]]);
        let settings = TouchSettings {
            touch_workaround: workaround,
            ..Default::default()
        };
        let mut kb = Keyboard::new(layout, settings);
        kb.set_size(Rect::from_origin_size(0.0, 600.0, 400.0, 50.0));
        kb
    }

    fn touch(kb: &mut Keyboard, sink: &mut Sink, phase: TouchPhase, x: f32, y: f32, t: Instant) -> bool {
        kb.on_touch(TouchEvent::new(0, phase, x, y, t), sink)
    }

    #[test]
    fn test_tap_through_router() {
        let mut kb = keyboard(true);
        let mut sink = Sink::new();
        let t0 = Instant::now();
        assert!(touch(&mut kb, &mut sink, TouchPhase::Down, 50.0, 20.0, t0));
        assert!(touch(&mut kb, &mut sink, TouchPhase::Up, 52.0, 22.0, t0 + ms(60)));
        assert_eq!(sink, vec![(KeyAction::sym(KeySym(0x61)), ActionSource::Keyboard)]);
    }

    #[test]
    fn test_pass_through_router_does_not_route() {
        let mut kb = keyboard(false);
        let mut sink = Sink::new();
        let t0 = Instant::now();
        assert!(!touch(&mut kb, &mut sink, TouchPhase::Down, 50.0, 20.0, t0));
        // The platform delivers to the key directly instead
        let a = kb.find_key_by_label("a").unwrap();
        assert!(kb.on_key_event(a, TouchEvent::new(0, TouchPhase::Down, 50.0, 20.0, t0), &mut sink));
        assert!(kb.on_key_event(a, TouchEvent::new(0, TouchPhase::Up, 50.0, 20.0, t0 + ms(40)), &mut sink));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_miss_is_unhandled() {
        let mut kb = keyboard(true);
        let mut sink = Sink::new();
        assert!(!touch(&mut kb, &mut sink, TouchPhase::Down, 50.0, 80.0, Instant::now()));
        assert!(!touch(&mut kb, &mut sink, TouchPhase::Up, 50.0, 20.0, Instant::now()));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_symbol_swipe_up_commits_alternative() {
        let mut kb = keyboard(true);
        let mut sink = Sink::new();
        let t0 = Instant::now();
        touch(&mut kb, &mut sink, TouchPhase::Down, 50.0, 40.0, t0);
        touch(&mut kb, &mut sink, TouchPhase::Move, 50.0, 10.0, t0 + ms(30));
        touch(&mut kb, &mut sink, TouchPhase::Move, 52.0, -5.0, t0 + ms(60));
        touch(&mut kb, &mut sink, TouchPhase::Up, 52.0, -5.0, t0 + ms(90));
        assert_eq!(sink, vec![(KeyAction::sym(KeySym(0x31)), ActionSource::Keyboard)]);
    }

    #[test]
    fn test_long_press_shows_popup_keyboard_and_triggers() {
        let popups = PopupRecorder::new();
        let mut kb = keyboard(true).with_popups(Box::new(popups.clone()));
        let mut sink = Sink::new();
        let t0 = Instant::now();
        touch(&mut kb, &mut sink, TouchPhase::Down, 50.0, 20.0, t0);
        assert_eq!(kb.next_deadline(), Some(t0 + ms(300)));
        kb.tick(t0 + ms(300), &mut sink);
        assert!(popups
            .actions()
            .iter()
            .any(|a| matches!(a, PopupAction::ShowKeyboard { label, .. } if label == "a")));

        popups.set_focused(Some(KeyAction::Commit("á".into())));
        touch(&mut kb, &mut sink, TouchPhase::Move, 60.0, 20.0, t0 + ms(350));
        touch(&mut kb, &mut sink, TouchPhase::Up, 60.0, 20.0, t0 + ms(400));
        assert_eq!(sink, vec![(KeyAction::Commit("á".into()), ActionSource::Popup)]);
        assert_eq!(popups.focus_changes(), vec![(KeyId(0), 60.0, 20.0)]);
    }

    #[test]
    fn test_press_feedback_sound_per_kind() {
        let log = FeedbackLog::new();
        let mut kb = keyboard(true).with_feedback(Box::new(log.clone()));
        let mut sink = Sink::new();
        let t0 = Instant::now();
        touch(&mut kb, &mut sink, TouchPhase::Down, 350.0, 20.0, t0);
        touch(&mut kb, &mut sink, TouchPhase::Up, 350.0, 20.0, t0 + ms(20));
        assert_eq!(
            log.events(),
            vec![FeedbackEvent::Sound(SoundEffect::Delete), FeedbackEvent::Haptic]
        );
    }

    #[test]
    fn test_backspace_repeat_while_held() {
        let mut kb = keyboard(true);
        let mut sink = Sink::new();
        let t0 = Instant::now();
        touch(&mut kb, &mut sink, TouchPhase::Down, 350.0, 20.0, t0);
        kb.tick(t0 + ms(300), &mut sink);
        kb.tick(t0 + ms(400), &mut sink);
        touch(&mut kb, &mut sink, TouchPhase::Up, 350.0, 20.0, t0 + ms(410));
        let deletes = sink
            .iter()
            .filter(|(a, _)| *a == KeyAction::sym(KeySym::BACKSPACE))
            .count();
        // 300, 350, 400, no tap on release
        assert_eq!(deletes, 3);
        assert!(matches!(sink.last(), Some((KeyAction::DeleteSelectionAndSwipe(_), _))));
    }

    #[test]
    fn test_space_drag_moves_cursor() {
        let mut kb = keyboard(true);
        kb.on_selection_update(4, 4);
        let mut sink = Sink::new();
        let t0 = Instant::now();
        touch(&mut kb, &mut sink, TouchPhase::Down, 200.0, 25.0, t0);
        touch(&mut kb, &mut sink, TouchPhase::Move, 225.0, 26.0, t0 + ms(200));
        touch(&mut kb, &mut sink, TouchPhase::Up, 225.0, 26.0, t0 + ms(250));
        assert_eq!(
            sink,
            vec![
                (KeyAction::sym(KeySym::RIGHT), ActionSource::Keyboard),
                (KeyAction::sym(KeySym::RIGHT), ActionSource::Keyboard)
            ]
        );
    }

    #[test]
    fn test_cancel_emits_nothing() {
        let mut kb = keyboard(true);
        let mut sink = Sink::new();
        let t0 = Instant::now();
        touch(&mut kb, &mut sink, TouchPhase::Down, 200.0, 25.0, t0);
        touch(&mut kb, &mut sink, TouchPhase::Cancel, 200.0, 25.0, t0 + ms(100));
        kb.tick(t0 + ms(1000), &mut sink);
        assert!(sink.is_empty());
        assert_eq!(kb.router().owner(PointerId(0)), None);
    }

    #[test]
    fn test_settings_update_reaches_keys() {
        let mut kb = keyboard(true);
        let mut settings = *kb.settings();
        settings.space_swipe_move_cursor = false;
        kb.set_settings(settings);
        let mut sink = Sink::new();
        let t0 = Instant::now();
        touch(&mut kb, &mut sink, TouchPhase::Down, 200.0, 25.0, t0);
        touch(&mut kb, &mut sink, TouchPhase::Move, 290.0, 26.0, t0 + ms(200));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_cancel_dismisses_preview() {
        let popups = PopupRecorder::new();
        let mut kb = keyboard(true).with_popups(Box::new(popups.clone()));
        let mut sink = Sink::new();
        let t0 = Instant::now();
        touch(&mut kb, &mut sink, TouchPhase::Down, 50.0, 20.0, t0);
        touch(&mut kb, &mut sink, TouchPhase::Cancel, 50.0, 20.0, t0 + ms(40));
        kb.tick(t0 + ms(1000), &mut sink);

        let shown = popups.actions();
        assert_eq!(shown.len(), 2);
        assert!(matches!(&shown[0], PopupAction::Preview { key: KeyId(0), content, .. } if content == "a"));
        assert_eq!(shown[1], PopupAction::Dismiss { key: KeyId(0) });
        assert!(sink.is_empty());
    }

    #[test]
    fn test_detach_dismisses_only_touched_keys() {
        let popups = PopupRecorder::new();
        let mut kb = keyboard(true).with_popups(Box::new(popups.clone()));
        let mut sink = Sink::new();
        touch(&mut kb, &mut sink, TouchPhase::Down, 50.0, 20.0, Instant::now());
        popups.take_actions();

        kb.detach();
        assert_eq!(popups.take_actions(), vec![PopupAction::Dismiss { key: KeyId(0) }]);
        kb.detach();
        assert!(popups.actions().is_empty());
        assert!(sink.is_empty());
    }
}
