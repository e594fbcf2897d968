// Keytouch Trace Replay CLI
// Feeds a recorded touch trace through the keyboard core and prints what it did

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;

use keytouch_core::{
    parse_layout_file, run_jobs, ActionDispatcher, CandidateList, KeyboardConfig, Keyboard, Layout,
    LockingRouter,
    MemoryPreferences, Rect, RecordingEngine, RoutingStrategy, TouchEvent, TouchPhase,
};

/// Replay touch traces against the virtual keyboard core
#[derive(Parser, Debug)]
#[command(name = "keytouch-replay")]
#[command(author = "keytouch contributors")]
#[command(version)]
#[command(about = "Replay a touch trace through the keyboard core", long_about = None)]
struct Args {
    /// Touch trace (TOML)
    #[arg(value_name = "TRACE")]
    trace: PathBuf,

    /// Keyboard configuration file (defaults to ~/.config/keytouch/keyboard.toml)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Layout description file (defaults to the built-in QWERTY layout)
    #[arg(short, long, value_name = "LAYOUT")]
    layout: Option<PathBuf>,

    /// Keep ticking this long after the last event so pending timers fire
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    settle_ms: u64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Trace file root
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Trace {
    #[serde(default)]
    view: ViewToml,

    #[serde(default)]
    engine: EngineToml,

    #[serde(default)]
    event: Vec<EventToml>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct ViewToml {
    left: f32,
    top: f32,
    width: f32,
    height: f32,
}

impl Default for ViewToml {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: 1000.0,
            height: 400.0,
        }
    }
}

/// Initial state of the recording engine
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
struct EngineToml {
    composition: String,
    candidates: Vec<String>,
    variants: Option<usize>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PhaseToml {
    Down,
    Move,
    Up,
    Cancel,
}

impl From<PhaseToml> for TouchPhase {
    fn from(phase: PhaseToml) -> Self {
        match phase {
            PhaseToml::Down => TouchPhase::Down,
            PhaseToml::Move => TouchPhase::Move,
            PhaseToml::Up => TouchPhase::Up,
            PhaseToml::Cancel => TouchPhase::Cancel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EventToml {
    /// Milliseconds since the start of the trace
    t: u64,
    #[serde(default)]
    pointer: i32,
    kind: PhaseToml,
    x: f32,
    y: f32,
}

fn load_trace(path: &Path) -> Result<Trace> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read trace {}", path.display()))?;
    let trace: Trace = toml::from_str(&content)
        .with_context(|| format!("failed to parse trace {}", path.display()))?;
    if trace.view.width <= 0.0 || trace.view.height <= 0.0 {
        bail!("view size must be positive");
    }
    if trace.event.windows(2).any(|w| w[1].t < w[0].t) {
        bail!("trace events must be in time order");
    }
    Ok(trace)
}

fn load_config(path: Option<&Path>) -> Result<KeyboardConfig> {
    match path {
        Some(path) => KeyboardConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => KeyboardConfig::load_default().context("failed to load default config"),
    }
}

fn load_layout(path: Option<&Path>) -> Result<Layout> {
    match path {
        Some(path) => parse_layout_file(path)
            .with_context(|| format!("failed to load layout {}", path.display())),
        None => Ok(Layout::qwerty()),
    }
}

/// Drives the keyboard the way a host view would
struct Replay {
    keyboard: Keyboard,
    dispatcher: ActionDispatcher,
    engine: RecordingEngine,
    /// Stands in for platform pointer splitting when the keyboard does not
    /// route touches itself
    platform: Option<LockingRouter>,
    t0: Instant,
}

impl Replay {
    fn new(config: &KeyboardConfig, layout: Layout, trace: &Trace) -> Self {
        let touch = config.to_touch_settings();
        let mut keyboard = Keyboard::new(layout, touch);
        keyboard.set_size(Rect::from_origin_size(
            trace.view.left,
            trace.view.top,
            trace.view.width,
            trace.view.height,
        ));

        let mut engine = RecordingEngine::new();
        engine.composition = trace.engine.composition.clone();
        engine.candidates = trace.engine.candidates.clone();
        if let Some(variants) = trace.engine.variants {
            engine.variants = variants;
        }

        let mut dispatcher = ActionDispatcher::new(
            config.to_dispatch_settings(),
            Box::new(MemoryPreferences::new()),
        );
        dispatcher.on_preedit_changed(engine.composition.is_empty());
        if !engine.candidates.is_empty() {
            let page_size = config.to_dispatch_settings().page_size;
            let first: Vec<String> = engine.candidates.iter().take(page_size).cloned().collect();
            let shown = first.len();
            let total = i32::try_from(engine.candidates.len()).unwrap_or(i32::MAX);
            dispatcher.on_candidate_list(CandidateList::new(first, total, 0), None);
            dispatcher.on_candidates_laid_out(shown);
        }
        keyboard.on_candidate_update(dispatcher.candidates().is_showing());

        let platform = (!touch.touch_workaround).then(LockingRouter::new);
        log::debug!(
            "Replaying with {} routing",
            if platform.is_some() { "platform" } else { "keyboard" }
        );

        Self {
            keyboard,
            dispatcher,
            engine,
            platform,
            t0: Instant::now(),
        }
    }

    fn at(&self, t: u64) -> Instant {
        self.t0 + Duration::from_millis(t)
    }

    fn feed(&mut self, event: &EventToml) {
        let time = self.at(event.t);
        self.keyboard.tick(time, &mut self.dispatcher);
        let touch = TouchEvent::new(event.pointer, event.kind.into(), event.x, event.y, time);

        let handled = match self.platform.as_mut() {
            Some(router) => match router.route(self.keyboard.grid(), &touch) {
                Some(routed) => {
                    self.keyboard
                        .on_key_event(routed.key, routed.event, &mut self.dispatcher)
                }
                None => false,
            },
            None => self.keyboard.on_touch(touch, &mut self.dispatcher),
        };
        if !handled {
            println!("{:>6} ms  {} at ({}, {}) not routed", event.t, touch.phase, event.x, event.y);
        }
        self.flush(event.t);
    }

    fn settle(&mut self, until: u64) {
        self.keyboard.tick(self.at(until), &mut self.dispatcher);
        self.flush(until);
    }

    /// Run queued engine jobs and report everything that came out
    fn flush(&mut self, t: u64) {
        let jobs = self.dispatcher.drain_jobs();
        for job in &jobs {
            println!("{:>6} ms  job     {}", t, job);
        }
        run_jobs(jobs, &mut self.engine, &self.dispatcher.completion_sender());
        self.dispatcher.apply_completions();
        for call in self.engine.take_calls() {
            println!("{:>6} ms  engine  {}", t, call);
        }
        self.dispatcher
            .on_preedit_changed(self.engine.composition.is_empty());
        self.keyboard
            .on_candidate_update(self.dispatcher.candidates().is_showing());
        for intent in self.dispatcher.drain_ui() {
            println!("{:>6} ms  ui      {}", t, intent);
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let layout = load_layout(args.layout.as_deref())?;
    let trace = load_trace(&args.trace)?;
    log::info!(
        "Replaying {} events on a {} key layout",
        trace.event.len(),
        layout.key_count()
    );

    let mut replay = Replay::new(&config, layout, &trace);
    for event in &trace.event {
        replay.feed(event);
    }
    let last = trace.event.last().map_or(0, |e| e.t);
    replay.settle(last + args.settle_ms);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    run(&args)
}
