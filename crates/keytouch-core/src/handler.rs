// Keytouch Gesture Handlers
// Per-key continuous gesture handling, chained by priority

use smallvec::SmallVec;

use crate::action::{ActionSource, KeyAction, KeyActionListener, SwipeRelease};
use crate::feedback::{Feedback, Selection};
use crate::geometry::Rect;
use crate::gesture::{GestureEvent, GestureKind, SwipeDirection, SwipeThresholds, ThresholdLevel};
use crate::key::KeyId;
use crate::keyboard::TouchSettings;
use crate::keysym::{KeyState, KeyStates, KeySym};
use crate::popup::{PopupAction, PopupActionListener};

/// Hardware scancode of the space bar
pub const SCANCODE_SPACE: u16 = 57;

/// Whether a handler took an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Consumed,
    Pass,
}

impl Flow {
    pub fn from_consumed(consumed: bool) -> Self {
        if consumed {
            Flow::Consumed
        } else {
            Flow::Pass
        }
    }

    pub fn is_consumed(self) -> bool {
        self == Flow::Consumed
    }
}

/// Evaluation order inside a [`HandlerChain`], highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandlerPriority {
    Default,
    CustomSwipe,
    Popup,
}

/// Everything a handler may read or call while handling one event.
pub struct HandlerContext<'a> {
    pub key: KeyId,
    /// Screen-space bounds of the key, for positioning popups
    pub bounds: Rect,
    pub settings: &'a TouchSettings,
    pub candidates_showing: bool,
    pub selection: Selection,
    pub actions: &'a mut dyn KeyActionListener,
    pub popups: &'a mut dyn PopupActionListener,
    pub feedback: &'a mut Feedback,
}

impl HandlerContext<'_> {
    fn emit(&mut self, action: KeyAction) {
        self.actions.on_key_action(action, ActionSource::Keyboard);
    }
}

/// A continuous gesture capability installed on a key.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureHandler {
    /// Drives a long-press menu or popup keyboard: moves change its focus,
    /// release triggers the focused entry
    PopupFocus,
    /// Press preview bubble
    Preview { content: String },
    /// Press preview that shows `alternative` while swiping in the symbol direction
    AltPreview { content: String, alternative: String },
    /// Fire `action` on release after a vertical swipe in the symbol direction
    SymbolSwipe { action: KeyAction },
    /// Fire `action` on release after a swipe dominated by `direction`
    DirectionalSwipe {
        action: KeyAction,
        direction: SwipeDirection,
    },
    /// Space bar: horizontal drag moves the cursor, vertical swipe switches language
    SpaceCursor,
    /// Backspace: horizontal drag adjusts the selection, release reports the swipe
    BackspaceSelection,
}

impl GestureHandler {
    pub fn priority(&self) -> HandlerPriority {
        match self {
            GestureHandler::PopupFocus
            | GestureHandler::Preview { .. }
            | GestureHandler::AltPreview { .. } => HandlerPriority::Popup,
            GestureHandler::SymbolSwipe { .. } | GestureHandler::DirectionalSwipe { .. } => {
                HandlerPriority::CustomSwipe
            }
            GestureHandler::SpaceCursor | GestureHandler::BackspaceSelection => HandlerPriority::Default,
        }
    }

    /// Step thresholds this handler needs, `None` if it has no opinion
    pub fn thresholds(&self, settings: &TouchSettings) -> Option<SwipeThresholds> {
        let (x, y) = match self {
            GestureHandler::PopupFocus | GestureHandler::Preview { .. } | GestureHandler::AltPreview { .. } => {
                return None
            }
            GestureHandler::SymbolSwipe { .. } => (ThresholdLevel::Disabled, ThresholdLevel::Input),
            GestureHandler::DirectionalSwipe { .. } => (ThresholdLevel::Input, ThresholdLevel::Input),
            GestureHandler::SpaceCursor => {
                let x = if settings.space_swipe_move_cursor {
                    ThresholdLevel::Selection
                } else {
                    ThresholdLevel::Disabled
                };
                (x, ThresholdLevel::Input)
            }
            GestureHandler::BackspaceSelection => (ThresholdLevel::Selection, ThresholdLevel::Disabled),
        };
        Some(SwipeThresholds::from_levels(x, y, settings.density))
    }

    pub fn handle(&self, event: &GestureEvent, ctx: &mut HandlerContext<'_>) -> Flow {
        match self {
            GestureHandler::PopupFocus => popup_focus(event, ctx),
            GestureHandler::Preview { content } => {
                if ctx.settings.popup_on_key_press {
                    match event.kind {
                        GestureKind::Down => ctx.popups.on_popup_action(PopupAction::Preview {
                            key: ctx.key,
                            content: content.clone(),
                            bounds: ctx.bounds,
                        }),
                        GestureKind::Up => ctx.popups.on_popup_action(PopupAction::Dismiss { key: ctx.key }),
                        GestureKind::Move => {}
                    }
                }
                Flow::Pass
            }
            GestureHandler::AltPreview {
                content,
                alternative,
            } => {
                if ctx.settings.popup_on_key_press {
                    let action = match event.kind {
                        GestureKind::Down => PopupAction::Preview {
                            key: ctx.key,
                            content: content.clone(),
                            bounds: ctx.bounds,
                        },
                        GestureKind::Move => {
                            let text = if ctx.settings.symbol_direction.check_y(event.total_y) {
                                alternative
                            } else {
                                content
                            };
                            PopupAction::PreviewUpdate {
                                key: ctx.key,
                                content: text.clone(),
                            }
                        }
                        GestureKind::Up => PopupAction::Dismiss { key: ctx.key },
                    };
                    ctx.popups.on_popup_action(action);
                }
                Flow::Pass
            }
            GestureHandler::SymbolSwipe { action } => {
                let fire = event.kind == GestureKind::Up
                    && !event.consumed
                    && ctx.settings.symbol_direction.check_y(event.total_y);
                if fire {
                    ctx.emit(action.clone());
                }
                Flow::from_consumed(fire)
            }
            GestureHandler::DirectionalSwipe { action, direction } => {
                let fire = event.kind == GestureKind::Up
                    && SwipeDirection::classify(event.total_x, event.total_y) == Some(*direction);
                if fire {
                    ctx.emit(action.clone());
                }
                Flow::from_consumed(fire)
            }
            GestureHandler::SpaceCursor => space_cursor(event, ctx),
            GestureHandler::BackspaceSelection => backspace_selection(event, ctx),
        }
    }
}

fn popup_focus(event: &GestureEvent, ctx: &mut HandlerContext<'_>) -> Flow {
    match event.kind {
        GestureKind::Down => Flow::Pass,
        GestureKind::Move => Flow::from_consumed(ctx.popups.change_focus(ctx.key, event.x, event.y)),
        GestureKind::Up => {
            let Some(action) = ctx.popups.trigger(ctx.key) else {
                return Flow::Pass;
            };
            ctx.actions.on_key_action(action, ActionSource::Popup);
            ctx.popups.on_popup_action(PopupAction::Dismiss { key: ctx.key });
            Flow::Consumed
        }
    }
}

fn space_cursor(event: &GestureEvent, ctx: &mut HandlerContext<'_>) -> Flow {
    match event.kind {
        GestureKind::Move => {
            let count = event.count_x;
            // Only a deliberate horizontal drag moves the cursor
            if count == 0
                || event.press_time <= ctx.settings.timing.long_press_delay / 2
                || event.dx.abs() <= event.dy.abs()
            {
                return Flow::Pass;
            }
            let sym = match (count > 0, ctx.candidates_showing) {
                (true, false) => KeySym::RIGHT,
                (true, true) => KeySym::DOWN,
                (false, false) => KeySym::LEFT,
                (false, true) => KeySym::UP,
            };
            for _ in 0..count.unsigned_abs() {
                ctx.emit(KeyAction::sym(sym));
                let selection = ctx.selection;
                ctx.feedback.gated(selection, selection.end >= selection.start);
            }
            Flow::Consumed
        }
        GestureKind::Up => {
            if event.consumed || !ctx.settings.symbol_direction.check_y(event.total_y) {
                return Flow::Pass;
            }
            let action = if ctx.candidates_showing {
                KeyAction::ScancodeKey {
                    name: "Space".to_string(),
                    scancode: SCANCODE_SPACE,
                    states: KeyStates::of(&[KeyState::Virtual, KeyState::Shift]),
                }
            } else {
                KeyAction::LangSwitch
            };
            ctx.emit(action);
            Flow::Consumed
        }
        GestureKind::Down => Flow::Pass,
    }
}

fn backspace_selection(event: &GestureEvent, ctx: &mut HandlerContext<'_>) -> Flow {
    match event.kind {
        GestureKind::Move => {
            if event.count_x == 0 {
                return Flow::Pass;
            }
            ctx.emit(KeyAction::MoveSelection {
                start: event.count_x,
                end: 0,
            });
            let selection = ctx.selection;
            ctx.feedback.gated(selection, selection.end > selection.start);
            Flow::Consumed
        }
        GestureKind::Up => {
            ctx.emit(KeyAction::DeleteSelectionAndSwipe(SwipeRelease {
                x: event.x,
                y: event.y,
                total_x: event.total_x,
                total_y: event.total_y,
            }));
            // Release never consumes; a plain tap still deletes
            Flow::Pass
        }
        GestureKind::Down => Flow::Pass,
    }
}

/// Handlers of one key, kept in priority order.
///
/// Handlers of equal priority run in installation order. The first handler
/// that consumes an event stops the walk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlerChain {
    handlers: SmallVec<[GestureHandler; 2]>,
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handler: GestureHandler) {
        let priority = handler.priority();
        let index = self
            .handlers
            .iter()
            .position(|h| h.priority() < priority)
            .unwrap_or(self.handlers.len());
        self.handlers.insert(index, handler);
    }

    pub fn iter(&self) -> impl Iterator<Item = &GestureHandler> {
        self.handlers.iter()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Thresholds of the highest priority handler that declares any
    pub fn thresholds(&self, settings: &TouchSettings) -> Option<SwipeThresholds> {
        self.handlers.iter().find_map(|h| h.thresholds(settings))
    }

    pub fn handle(&self, event: &GestureEvent, ctx: &mut HandlerContext<'_>) -> Flow {
        for handler in &self.handlers {
            if handler.handle(event, ctx).is_consumed() {
                return Flow::Consumed;
            }
        }
        Flow::Pass
    }
}

impl FromIterator<GestureHandler> for HandlerChain {
    fn from_iter<I: IntoIterator<Item = GestureHandler>>(iter: I) -> Self {
        let mut chain = HandlerChain::new();
        for handler in iter {
            chain.push(handler);
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FeedbackLog;
    use crate::gesture::SwipeSymbolDirection;
    use crate::popup::{MenuItem, PopupRecorder};
    use std::time::Duration;

    struct Harness {
        settings: TouchSettings,
        actions: Vec<(KeyAction, ActionSource)>,
        popups: PopupRecorder,
        feedback: Feedback,
        haptics: FeedbackLog,
        candidates_showing: bool,
        selection: Selection,
    }

    impl Harness {
        fn new() -> Self {
            let haptics = FeedbackLog::new();
            Self {
                settings: TouchSettings::default(),
                actions: Vec::new(),
                popups: PopupRecorder::new(),
                feedback: Feedback::new(Some(Box::new(haptics.clone())), true),
                haptics,
                candidates_showing: false,
                selection: Selection::new(5, 5),
            }
        }

        fn run(&mut self, chain: &HandlerChain, event: GestureEvent) -> Flow {
            let mut popups = self.popups.clone();
            let mut ctx = HandlerContext {
                key: KeyId(1),
                bounds: Rect::new(0.0, 0.0, 40.0, 50.0),
                settings: &self.settings,
                candidates_showing: self.candidates_showing,
                selection: self.selection,
                actions: &mut self.actions,
                popups: &mut popups,
                feedback: &mut self.feedback,
            };
            chain.handle(&event, &mut ctx)
        }
    }

    fn event(kind: GestureKind) -> GestureEvent {
        GestureEvent {
            kind,
            x: 0.0,
            y: 0.0,
            dx: 0.0,
            dy: 0.0,
            count_x: 0,
            count_y: 0,
            total_x: 0,
            total_y: 0,
            press_time: Duration::from_millis(500),
            consumed: false,
        }
    }

    fn moved(count_x: i32, total_x: i32, dx: f32) -> GestureEvent {
        GestureEvent {
            count_x,
            total_x,
            dx,
            ..event(GestureKind::Move)
        }
    }

    fn up_with(total_x: i32, total_y: i32) -> GestureEvent {
        GestureEvent {
            total_x,
            total_y,
            ..event(GestureKind::Up)
        }
    }

    #[test]
    fn test_chain_orders_by_priority() {
        let chain: HandlerChain = vec![
            GestureHandler::SpaceCursor,
            GestureHandler::Preview { content: "a".into() },
            GestureHandler::SymbolSwipe {
                action: KeyAction::Commit("1".into()),
            },
            GestureHandler::PopupFocus,
        ]
        .into_iter()
        .collect();
        let priorities: Vec<_> = chain.iter().map(GestureHandler::priority).collect();
        assert_eq!(
            priorities,
            vec![
                HandlerPriority::Popup,
                HandlerPriority::Popup,
                HandlerPriority::CustomSwipe,
                HandlerPriority::Default
            ]
        );
        // Installation order kept inside a priority
        assert_eq!(chain.iter().next(), Some(&GestureHandler::Preview { content: "a".into() }));
    }

    #[test]
    fn test_chain_thresholds_from_highest_priority() {
        let settings = TouchSettings::default();
        let chain: HandlerChain = vec![
            GestureHandler::BackspaceSelection,
            GestureHandler::Preview { content: "x".into() },
        ]
        .into_iter()
        .collect();
        assert_eq!(chain.thresholds(&settings), Some(SwipeThresholds::new(10.0, 800.0)));
        let popup_only: HandlerChain = std::iter::once(GestureHandler::PopupFocus).collect();
        assert_eq!(popup_only.thresholds(&settings), None);
    }

    #[test]
    fn test_space_thresholds_follow_cursor_setting() {
        let mut settings = TouchSettings::default();
        assert_eq!(
            GestureHandler::SpaceCursor.thresholds(&settings),
            Some(SwipeThresholds::new(10.0, 36.0))
        );
        settings.space_swipe_move_cursor = false;
        settings.density = 2.0;
        assert_eq!(
            GestureHandler::SpaceCursor.thresholds(&settings),
            Some(SwipeThresholds::new(1600.0, 72.0))
        );
    }

    #[test]
    fn test_space_moves_cursor_after_half_delay() {
        let mut h = Harness::new();
        let chain: HandlerChain = std::iter::once(GestureHandler::SpaceCursor).collect();

        let early = GestureEvent {
            press_time: Duration::from_millis(100),
            ..moved(2, 2, 25.0)
        };
        assert_eq!(h.run(&chain, early), Flow::Pass);
        assert!(h.actions.is_empty());

        assert_eq!(h.run(&chain, moved(-2, -2, -25.0)), Flow::Consumed);
        assert_eq!(
            h.actions,
            vec![
                (KeyAction::sym(KeySym::LEFT), ActionSource::Keyboard),
                (KeyAction::sym(KeySym::LEFT), ActionSource::Keyboard)
            ]
        );
        assert_eq!(h.haptics.haptic_count(), 2);
    }

    #[test]
    fn test_space_moves_through_candidates() {
        let mut h = Harness::new();
        h.candidates_showing = true;
        let chain: HandlerChain = std::iter::once(GestureHandler::SpaceCursor).collect();
        h.run(&chain, moved(1, 1, 12.0));
        assert_eq!(h.actions[0].0, KeyAction::sym(KeySym::DOWN));
    }

    #[test]
    fn test_space_vertical_move_ignored() {
        let mut h = Harness::new();
        let chain: HandlerChain = std::iter::once(GestureHandler::SpaceCursor).collect();
        let steep = GestureEvent {
            dy: -40.0,
            ..moved(1, 1, 12.0)
        };
        assert_eq!(h.run(&chain, steep), Flow::Pass);
        assert!(h.actions.is_empty());
    }

    #[test]
    fn test_space_swipe_up_switches_language() {
        let mut h = Harness::new();
        let chain: HandlerChain = std::iter::once(GestureHandler::SpaceCursor).collect();
        assert_eq!(h.run(&chain, up_with(0, -1)), Flow::Consumed);
        assert_eq!(h.actions[0].0, KeyAction::LangSwitch);

        h.candidates_showing = true;
        h.run(&chain, up_with(0, -2));
        assert_eq!(
            h.actions[1].0,
            KeyAction::ScancodeKey {
                name: "Space".into(),
                scancode: SCANCODE_SPACE,
                states: KeyStates::of(&[KeyState::Shift, KeyState::Virtual]),
            }
        );

        let consumed = GestureEvent {
            consumed: true,
            ..up_with(0, -1)
        };
        assert_eq!(h.run(&chain, consumed), Flow::Pass);
        assert_eq!(h.actions.len(), 2);
    }

    #[test]
    fn test_backspace_selection_and_release() {
        let mut h = Harness::new();
        h.selection = Selection::new(3, 8);
        let chain: HandlerChain = std::iter::once(GestureHandler::BackspaceSelection).collect();
        assert_eq!(h.run(&chain, moved(0, 0, 3.0)), Flow::Pass);
        assert_eq!(h.run(&chain, moved(-1, -1, -11.0)), Flow::Consumed);
        let release = GestureEvent {
            x: 4.0,
            y: -3.0,
            ..up_with(-1, 0)
        };
        assert_eq!(h.run(&chain, release), Flow::Pass);
        assert_eq!(
            h.actions.iter().map(|(a, _)| a.clone()).collect::<Vec<_>>(),
            vec![
                KeyAction::MoveSelection { start: -1, end: 0 },
                KeyAction::DeleteSelectionAndSwipe(SwipeRelease {
                    x: 4.0,
                    y: -3.0,
                    total_x: -1,
                    total_y: 0
                })
            ]
        );
        assert_eq!(h.haptics.haptic_count(), 1);
    }

    #[test]
    fn test_symbol_swipe_fires_on_release_only() {
        let mut h = Harness::new();
        let chain: HandlerChain = std::iter::once(GestureHandler::SymbolSwipe {
            action: KeyAction::Commit("1".into()),
        })
        .collect();
        assert_eq!(h.run(&chain, up_with(0, 1)), Flow::Pass);
        assert_eq!(h.run(&chain, up_with(0, -1)), Flow::Consumed);
        h.settings.symbol_direction = SwipeSymbolDirection::Disabled;
        assert_eq!(h.run(&chain, up_with(0, -1)), Flow::Pass);
        assert_eq!(h.actions.len(), 1);
    }

    #[test]
    fn test_directional_swipe() {
        let mut h = Harness::new();
        let chain: HandlerChain = std::iter::once(GestureHandler::DirectionalSwipe {
            action: KeyAction::Commit("←".into()),
            direction: SwipeDirection::Left,
        })
        .collect();
        assert_eq!(h.run(&chain, up_with(-2, 1)), Flow::Consumed);
        assert_eq!(h.run(&chain, up_with(-1, 1)), Flow::Pass);
        assert_eq!(h.run(&chain, up_with(0, 0)), Flow::Pass);
        assert_eq!(h.actions.len(), 1);
    }

    #[test]
    fn test_alt_preview_never_consumes() {
        let mut h = Harness::new();
        let chain: HandlerChain = vec![
            GestureHandler::AltPreview {
                content: "q".into(),
                alternative: "1".into(),
            },
            GestureHandler::SymbolSwipe {
                action: KeyAction::Commit("1".into()),
            },
        ]
        .into_iter()
        .collect();
        assert_eq!(h.run(&chain, event(GestureKind::Down)), Flow::Pass);
        let swiped = GestureEvent {
            total_y: -1,
            ..event(GestureKind::Move)
        };
        assert_eq!(h.run(&chain, swiped), Flow::Pass);
        // The symbol swipe below the preview still fires
        assert_eq!(h.run(&chain, up_with(0, -1)), Flow::Consumed);
        assert_eq!(
            h.popups.actions(),
            vec![
                PopupAction::Preview {
                    key: KeyId(1),
                    content: "q".into(),
                    bounds: Rect::new(0.0, 0.0, 40.0, 50.0)
                },
                PopupAction::PreviewUpdate {
                    key: KeyId(1),
                    content: "1".into()
                },
                PopupAction::Dismiss { key: KeyId(1) },
            ]
        );
        assert_eq!(h.actions.len(), 1);
    }

    #[test]
    fn test_preview_respects_setting() {
        let mut h = Harness::new();
        h.settings.popup_on_key_press = false;
        let chain: HandlerChain = std::iter::once(GestureHandler::Preview { content: "w".into() }).collect();
        h.run(&chain, event(GestureKind::Down));
        h.run(&chain, event(GestureKind::Up));
        assert!(h.popups.actions().is_empty());
    }

    #[test]
    fn test_popup_focus_trigger_dispatches_from_popup() {
        let mut h = Harness::new();
        let chain: HandlerChain = vec![GestureHandler::BackspaceSelection, GestureHandler::PopupFocus]
            .into_iter()
            .collect();
        // Nothing showing: defers to the backspace handler
        assert_eq!(h.run(&chain, moved(1, 1, 11.0)), Flow::Consumed);
        assert_eq!(h.actions.len(), 1);

        let mut popups = h.popups.clone();
        popups.on_popup_action(PopupAction::ShowMenu {
            key: KeyId(1),
            items: vec![MenuItem::new("Cut", KeyAction::PerformContextMenu(1))],
            bounds: Rect::default(),
        });
        assert_eq!(h.run(&chain, moved(0, 1, 2.0)), Flow::Consumed);
        assert_eq!(h.run(&chain, up_with(1, 0)), Flow::Consumed);
        assert_eq!(
            h.actions.last(),
            Some(&(KeyAction::PerformContextMenu(1), ActionSource::Popup))
        );
        assert_eq!(h.popups.actions().last(), Some(&PopupAction::Dismiss { key: KeyId(1) }));
    }
}
