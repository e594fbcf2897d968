// Keytouch Engine Boundary
// The composition engine interface, the jobs posted to it and their completions

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::action::PageDirection;
use crate::keysym::{KeyStates, KeySym};

/// The external text-composition engine.
///
/// Only ever called from the engine's own job context, never from the
/// touch path directly.
pub trait CompositionEngine {
    fn send_key(&mut self, sym: KeySym, states: KeyStates);
    /// Send a key identified by name and hardware scancode
    fn send_scancode(&mut self, name: &str, scancode: u16, states: KeyStates);
    fn commit_text(&mut self, text: &str);
    fn reset(&mut self);
    /// Select a candidate by engine index; false if nothing was selected
    fn select_candidate(&mut self, index: usize) -> bool;
    fn enumerate_variants(&mut self);
    fn toggle_variant(&mut self);
    fn fetch_candidates(&mut self, offset: usize, count: usize) -> Vec<String>;
    fn is_composition_empty(&self) -> bool;
    fn enabled_variant_count(&self) -> usize;
    fn trigger_quick_phrase(&mut self);
    fn trigger_unicode(&mut self);
}

/// A unit of work for the engine, executed in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineJob {
    SendKey {
        sym: KeySym,
        states: KeyStates,
    },
    SendScancode {
        name: String,
        scancode: u16,
        states: KeyStates,
    },
    /// Flush the composition, then commit literal text
    Commit(String),
    QuickPhrase,
    Unicode,
    /// Clear the composition without committing
    Reset,
    /// Pick a candidate by engine index
    SelectCandidate(usize),
    /// Enumerate variants, or ask the user to enable more when fewer than two are on
    EnumerateOrPrompt,
    Enumerate,
    Toggle,
    FetchPage {
        offset: usize,
        count: usize,
        direction: PageDirection,
        /// Pager generation at request time
        generation: u64,
    },
}

impl EngineJob {
    /// Run against the engine; some jobs answer back with a completion
    pub fn run(self, engine: &mut dyn CompositionEngine) -> Option<Completion> {
        match self {
            EngineJob::SendKey { sym, states } => engine.send_key(sym, states),
            EngineJob::SendScancode {
                name,
                scancode,
                states,
            } => engine.send_scancode(&name, scancode, states),
            EngineJob::Commit(text) => {
                commit_and_reset(engine);
                engine.commit_text(&text);
            }
            EngineJob::QuickPhrase => {
                commit_and_reset(engine);
                engine.trigger_quick_phrase();
            }
            EngineJob::Unicode => {
                commit_and_reset(engine);
                engine.trigger_unicode();
            }
            EngineJob::Reset => engine.reset(),
            EngineJob::SelectCandidate(index) => {
                if !engine.select_candidate(index) {
                    log::debug!("Engine did not select candidate {}", index);
                }
            }
            EngineJob::EnumerateOrPrompt => {
                if engine.enabled_variant_count() < 2 {
                    return Some(Completion::PromptAddVariants);
                }
                engine.enumerate_variants();
            }
            EngineJob::Enumerate => engine.enumerate_variants(),
            EngineJob::Toggle => engine.toggle_variant(),
            EngineJob::FetchPage {
                offset,
                count,
                direction,
                generation,
            } => {
                let items = engine.fetch_candidates(offset, count);
                return Some(Completion::Page {
                    items,
                    direction,
                    generation,
                });
            }
        }
        None
    }
}

/// Settle the composition before something else is inserted.
///
/// An empty composition may still have prediction candidates, which a reset
/// clears. Otherwise the first candidate is taken, falling back to a reset.
fn commit_and_reset(engine: &mut dyn CompositionEngine) {
    if engine.is_composition_empty() || !engine.select_candidate(0) {
        engine.reset();
    }
}

impl fmt::Display for EngineJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineJob::SendKey { sym, states } => write!(f, "send-key({}, {})", sym, states),
            EngineJob::SendScancode {
                name,
                scancode,
                states,
            } => write!(f, "send-scancode({}, {}, {})", name, scancode, states),
            EngineJob::Commit(text) => write!(f, "commit({:?})", text),
            EngineJob::QuickPhrase => write!(f, "quick-phrase"),
            EngineJob::Unicode => write!(f, "unicode"),
            EngineJob::Reset => write!(f, "reset"),
            EngineJob::SelectCandidate(index) => write!(f, "select-candidate({})", index),
            EngineJob::EnumerateOrPrompt => write!(f, "enumerate-or-prompt"),
            EngineJob::Enumerate => write!(f, "enumerate"),
            EngineJob::Toggle => write!(f, "toggle"),
            EngineJob::FetchPage {
                offset,
                count,
                direction,
                generation,
            } => write!(
                f,
                "fetch-page(offset={}, count={}, {:?}, gen={})",
                offset, count, direction, generation
            ),
        }
    }
}

/// Results that must be applied back on the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    PromptAddVariants,
    Page {
        items: Vec<String>,
        direction: PageDirection,
        generation: u64,
    },
}

/// Jobs waiting to be handed to the engine, in submission order.
#[derive(Debug, Default, Clone)]
pub struct JobQueue {
    jobs: VecDeque<EngineJob>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, job: EngineJob) {
        log::trace!("Queued engine job {}", job);
        self.jobs.push_back(job);
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn drain(&mut self) -> Vec<EngineJob> {
        self.jobs.drain(..).collect()
    }
}

/// Thread-safe inbox for completions.
///
/// The engine side holds a clone and calls [`CompletionSender::send`]; the
/// dispatcher drains it on the UI thread.
#[derive(Debug, Default, Clone)]
pub struct CompletionSender {
    inbox: Arc<Mutex<VecDeque<Completion>>>,
}

impl CompletionSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&self, completion: Completion) {
        self.inbox.lock().push_back(completion);
    }

    pub fn pending(&self) -> usize {
        self.inbox.lock().len()
    }

    pub(crate) fn take_all(&self) -> Vec<Completion> {
        self.inbox.lock().drain(..).collect()
    }
}

/// Run jobs in order, posting completions to `sender`
pub fn run_jobs(jobs: Vec<EngineJob>, engine: &mut dyn CompositionEngine, sender: &CompletionSender) {
    for job in jobs {
        if let Some(completion) = job.run(engine) {
            sender.send(completion);
        }
    }
}

/// Engine double that records every call, for tests and trace replay.
#[derive(Debug, Clone, Default)]
pub struct RecordingEngine {
    pub calls: Vec<String>,
    /// Composition buffer; empty means nothing is being composed
    pub composition: String,
    pub candidates: Vec<String>,
    pub variants: usize,
    /// Result of `select_candidate`
    pub select_succeeds: bool,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self {
            variants: 2,
            select_succeeds: true,
            ..Default::default()
        }
    }

    pub fn take_calls(&mut self) -> Vec<String> {
        std::mem::take(&mut self.calls)
    }
}

impl CompositionEngine for RecordingEngine {
    fn send_key(&mut self, sym: KeySym, states: KeyStates) {
        self.calls.push(format!("send_key({}, {})", sym, states));
    }

    fn send_scancode(&mut self, name: &str, scancode: u16, states: KeyStates) {
        self.calls
            .push(format!("send_scancode({}, {}, {})", name, scancode, states));
    }

    fn commit_text(&mut self, text: &str) {
        self.calls.push(format!("commit_text({})", text));
    }

    fn reset(&mut self) {
        self.composition.clear();
        self.calls.push("reset".to_string());
    }

    fn select_candidate(&mut self, index: usize) -> bool {
        self.calls.push(format!("select_candidate({})", index));
        if self.select_succeeds {
            self.composition.clear();
        }
        self.select_succeeds
    }

    fn enumerate_variants(&mut self) {
        self.calls.push("enumerate".to_string());
    }

    fn toggle_variant(&mut self) {
        self.calls.push("toggle".to_string());
    }

    fn fetch_candidates(&mut self, offset: usize, count: usize) -> Vec<String> {
        self.calls.push(format!("fetch_candidates({}, {})", offset, count));
        self.candidates.iter().skip(offset).take(count).cloned().collect()
    }

    fn is_composition_empty(&self) -> bool {
        self.composition.is_empty()
    }

    fn enabled_variant_count(&self) -> usize {
        self.variants
    }

    fn trigger_quick_phrase(&mut self) {
        self.calls.push("quick_phrase".to_string());
    }

    fn trigger_unicode(&mut self) {
        self.calls.push("unicode".to_string());
    }
}
