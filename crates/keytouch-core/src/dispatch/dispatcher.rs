// Keytouch Dispatch - Action Dispatcher
// Resolves key actions against session state into engine jobs and UI intents

use crate::action::{ActionSource, KeyAction, KeyActionListener, PageDirection};
use crate::candidates::{CandidateList, CandidateWindow};
use crate::dispatch::backspace::{BackspaceSwipe, BackspaceSwipeState, SwipeEffect};
use crate::dispatch::{LangSwitchBehavior, PickerCategory, SpaceLongPressBehavior, UiIntent};
use crate::engine::{run_jobs, Completion, CompletionSender, CompositionEngine, EngineJob, JobQueue};
use crate::prefs::{PreferenceStore, LAST_PICKER_CATEGORY};

/// Default number of candidates fetched per page
pub const DEFAULT_PAGE_SIZE: usize = 6;

/// Behavior choices the dispatcher resolves actions with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    pub lang_switch: LangSwitchBehavior,
    pub space_long_press: SpaceLongPressBehavior,
    pub page_size: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            lang_switch: LangSwitchBehavior::default(),
            space_long_press: SpaceLongPressBehavior::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// The single point where key actions meet session state.
///
/// Engine work is queued in submission order and handed out through
/// [`ActionDispatcher::drain_jobs`]; results come back through the
/// [`CompletionSender`] and are applied by
/// [`ActionDispatcher::apply_completions`] on the UI thread.
pub struct ActionDispatcher {
    settings: DispatchSettings,
    backspace: BackspaceSwipe,
    candidates: CandidateWindow,
    composition_empty: bool,
    jobs: JobQueue,
    outbox: Vec<UiIntent>,
    completions: CompletionSender,
    prefs: Box<dyn PreferenceStore>,
}

impl ActionDispatcher {
    pub fn new(settings: DispatchSettings, prefs: Box<dyn PreferenceStore>) -> Self {
        Self {
            settings,
            backspace: BackspaceSwipe::new(),
            candidates: CandidateWindow::new(),
            composition_empty: true,
            jobs: JobQueue::new(),
            outbox: Vec::new(),
            completions: CompletionSender::new(),
            prefs,
        }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: DispatchSettings) {
        self.settings = settings;
    }

    pub fn backspace_state(&self) -> BackspaceSwipeState {
        self.backspace.state()
    }

    pub fn candidates(&self) -> &CandidateWindow {
        &self.candidates
    }

    pub fn composition_empty(&self) -> bool {
        self.composition_empty
    }

    pub fn preferences(&self) -> &dyn PreferenceStore {
        self.prefs.as_ref()
    }

    /// Handle for the engine side to post completions with
    pub fn completion_sender(&self) -> CompletionSender {
        self.completions.clone()
    }

    /// The engine's composition buffer changed
    pub fn on_preedit_changed(&mut self, empty: bool) {
        self.composition_empty = empty;
    }

    /// A candidate list arrived from the engine; `page` is set for lists
    /// fetched by a page action
    pub fn on_candidate_list(&mut self, list: CandidateList, page: Option<PageDirection>) {
        self.candidates.update(list, page);
        self.outbox.push(UiIntent::CandidatesChanged);
    }

    /// The host laid out `count` candidates of the current page
    pub fn on_candidates_laid_out(&mut self, count: usize) {
        self.candidates.on_laid_out(count);
    }

    /// The user tapped the displayed candidate at `position`
    pub fn select_candidate(&mut self, position: usize) -> bool {
        match self.candidates.candidate_index(position) {
            Some(index) => {
                self.jobs.push(EngineJob::SelectCandidate(index));
                true
            }
            None => false,
        }
    }

    /// Resolve one action
    pub fn dispatch(&mut self, action: KeyAction, source: ActionSource) {
        log::trace!("Dispatching {} from {:?}", action, source);
        match action {
            KeyAction::Sym { sym, states } => self.jobs.push(EngineJob::SendKey { sym, states }),
            KeyAction::ScancodeKey {
                name,
                scancode,
                states,
            } => self.jobs.push(EngineJob::SendScancode {
                name,
                scancode,
                states,
            }),
            KeyAction::Commit(text) => self.jobs.push(EngineJob::Commit(text)),
            KeyAction::QuickPhrase => self.jobs.push(EngineJob::QuickPhrase),
            KeyAction::Unicode => self.jobs.push(EngineJob::Unicode),
            KeyAction::LangSwitch => match self.settings.lang_switch {
                LangSwitchBehavior::Enumerate => self.jobs.push(EngineJob::EnumerateOrPrompt),
                LangSwitchBehavior::ToggleActivate => self.jobs.push(EngineJob::Toggle),
                LangSwitchBehavior::NextInputMethodApp => {
                    self.outbox.push(UiIntent::NextInputMethodApp)
                }
            },
            KeyAction::ShowInputMethodPicker => self.outbox.push(UiIntent::ShowInputMethodPicker),
            KeyAction::MoveSelection { start, end } => {
                let effect = self.backspace.on_move_selection(
                    start,
                    end,
                    self.composition_empty,
                    self.candidates.is_showing(),
                );
                self.apply_effect(effect);
            }
            KeyAction::DeleteSelection => self.outbox.push(UiIntent::DeleteSelection),
            KeyAction::DeleteSelectionAndSwipe(release) => {
                let effect = self.backspace.on_release(&release);
                self.apply_effect(effect);
            }
            KeyAction::PickerSwitch(category) => {
                let category = self.resolve_picker(category);
                self.outbox.push(UiIntent::AttachPicker(category));
            }
            KeyAction::SpaceLongPress => match self.settings.space_long_press {
                SpaceLongPressBehavior::None => {}
                SpaceLongPressBehavior::Enumerate => self.jobs.push(EngineJob::Enumerate),
                SpaceLongPressBehavior::ToggleActivate => self.jobs.push(EngineJob::Toggle),
                SpaceLongPressBehavior::ShowPicker => {
                    self.outbox.push(UiIntent::ShowInputMethodPicker)
                }
            },
            KeyAction::Page(direction) => self.request_page(direction),
            KeyAction::PerformContextMenu(id) => self.outbox.push(UiIntent::PerformContextMenu(id)),
            KeyAction::SendCombination {
                key_code,
                alt,
                ctrl,
                shift,
            } => self.outbox.push(UiIntent::SendCombination {
                key_code,
                alt,
                ctrl,
                shift,
            }),
            KeyAction::AttachWindow(name) => self.outbox.push(UiIntent::AttachWindow(name)),
        }
    }

    fn apply_effect(&mut self, effect: SwipeEffect) {
        match effect {
            SwipeEffect::Nothing => {}
            SwipeEffect::Ui(intent) => self.outbox.push(intent),
            SwipeEffect::Engine(job) => self.jobs.push(job),
        }
    }

    /// An explicit category wins and is remembered; otherwise the last one
    /// is restored
    fn resolve_picker(&mut self, category: Option<PickerCategory>) -> PickerCategory {
        if let Some(category) = category {
            self.prefs.set(LAST_PICKER_CATEGORY, &category.to_string());
            return category;
        }
        match self.prefs.get(LAST_PICKER_CATEGORY) {
            None => PickerCategory::default(),
            Some(stored) => stored.parse().unwrap_or_else(|_| {
                log::warn!(
                    "Unknown picker category {:?}, using {}",
                    stored,
                    PickerCategory::default()
                );
                PickerCategory::default()
            }),
        }
    }

    fn request_page(&mut self, direction: PageDirection) {
        let pager = self.candidates.pager_mut();
        let offset = match direction {
            PageDirection::Forward => pager.advance(),
            PageDirection::Backward => match pager.retreat() {
                Some(offset) => offset,
                None => return,
            },
        };
        let generation = pager.generation();
        self.jobs.push(EngineJob::FetchPage {
            offset,
            count: self.settings.page_size,
            direction,
            generation,
        });
    }

    /// Apply every completion posted since the last call
    pub fn apply_completions(&mut self) {
        for completion in self.completions.take_all() {
            match completion {
                Completion::PromptAddVariants => self.outbox.push(UiIntent::PromptAddInputVariants),
                Completion::Page {
                    items,
                    direction,
                    generation,
                } => self.apply_page(items, direction, generation),
            }
        }
    }

    fn apply_page(&mut self, items: Vec<String>, direction: PageDirection, generation: u64) {
        let current = self.candidates.pager().generation();
        if generation != current {
            log::debug!(
                "Dropping stale candidate page (generation {}, current {})",
                generation,
                current
            );
            return;
        }
        if items.is_empty() {
            if direction == PageDirection::Forward {
                log::debug!("Empty page after advance, rolling back page counter");
                self.candidates.pager_mut().retreat_one_step();
            }
            return;
        }
        let total = i32::try_from(items.len()).unwrap_or(i32::MAX);
        let page = i32::try_from(self.candidates.pager().current_page()).unwrap_or(i32::MAX);
        self.candidates
            .update(CandidateList::new(items, total, page), Some(direction));
        self.outbox.push(UiIntent::CandidatesChanged);
    }

    pub fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }

    pub fn drain_jobs(&mut self) -> Vec<EngineJob> {
        self.jobs.drain()
    }

    pub fn drain_ui(&mut self) -> Vec<UiIntent> {
        std::mem::take(&mut self.outbox)
    }

    /// Run queued jobs synchronously against `engine` and apply their
    /// completions
    pub fn run_pending(&mut self, engine: &mut dyn CompositionEngine) {
        let jobs = self.drain_jobs();
        run_jobs(jobs, engine, &self.completions);
        self.apply_completions();
    }
}

impl KeyActionListener for ActionDispatcher {
    fn on_key_action(&mut self, action: KeyAction, source: ActionSource) {
        self.dispatch(action, source);
    }
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("settings", &self.settings)
            .field("backspace", &self.backspace.state())
            .field("candidates", &self.candidates)
            .field("composition_empty", &self.composition_empty)
            .field("jobs", &self.jobs.len())
            .field("outbox", &self.outbox.len())
            .finish()
    }
}
