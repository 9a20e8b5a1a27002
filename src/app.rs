use std::collections::HashMap;
use std::path::PathBuf;

use crate::chunk::ChunkWindow;
use crate::clock::{Clock, MonotonicClock};
use crate::error::Result;
use crate::levels::{LevelContent, LevelRegistry};
use crate::progress::{LevelProgress, ProgressStore};
use crate::runtime::KeyAction;
use crate::session::{SessionEvent, SessionSummary, TypingSession};

/// Where the practice text comes from
#[derive(Debug, Clone, PartialEq)]
pub enum PracticeSource {
    Level(u32),
    File { path: PathBuf, target_wpm: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Typing,
    Results(SessionSummary),
}

/// Figures shown in the status line, refreshed from session events and ticks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveStats {
    pub wpm: f64,
    pub accuracy: f64,
    pub progress: usize,
}

impl Default for LiveStats {
    fn default() -> Self {
        Self {
            wpm: 0.0,
            accuracy: 100.0,
            progress: 0,
        }
    }
}

/// Presentation-side owner of the current session and its display window.
///
/// A level change or reset builds a complete new session and window before
/// swapping them in; a failed load leaves the running session untouched.
pub struct App<C: Clock + Clone = MonotonicClock> {
    pub source: PracticeSource,
    pub content: LevelContent,
    pub session: TypingSession<C>,
    pub window: ChunkWindow,
    pub state: AppState,
    pub stats: LiveStats,
    pub current_char: Option<char>,
    pub next_char: Option<char>,
    /// Last load failure, shown until the next successful load
    pub notice: Option<String>,
    lines_per_chunk: usize,
    registry: LevelRegistry,
    store: Box<dyn ProgressStore>,
    /// Read once at startup and after each recorded attempt
    progress: HashMap<u32, LevelProgress>,
    clock: C,
}

impl<C: Clock + Clone> App<C> {
    pub fn new(
        source: PracticeSource,
        lines_per_chunk: usize,
        store: Box<dyn ProgressStore>,
        clock: C,
    ) -> Result<Self> {
        let registry = LevelRegistry;
        let content = load_content(&registry, &source)?;
        let session = TypingSession::with_clock(&content.text, content.target_wpm, clock.clone())?;
        let window = ChunkWindow::new(&content.text, lines_per_chunk);
        let progress: HashMap<_, _> = registry
            .all()
            .iter()
            .map(|level| (level.id, read_progress(store.as_ref(), level.id)))
            .collect();

        let mut app = Self {
            source,
            content,
            session,
            window,
            state: AppState::Typing,
            stats: LiveStats::default(),
            current_char: None,
            next_char: None,
            notice: None,
            lines_per_chunk,
            registry,
            store,
            progress,
            clock,
        };
        app.sync_key_hint();
        Ok(app)
    }

    /// Applies one key press. Returns false when the user asked to quit.
    pub fn handle_key(&mut self, action: KeyAction) -> bool {
        match action {
            KeyAction::Quit => return false,
            KeyAction::Type(c) => self.type_char(c),
            KeyAction::ResetLevel => self.reset(),
            KeyAction::NextLevel => self.step_level(true),
            KeyAction::PrevLevel => self.step_level(false),
            KeyAction::Ignore => {}
        }
        true
    }

    pub fn type_char(&mut self, c: char) {
        if self.state != AppState::Typing {
            return;
        }

        self.session.process_keystroke(c);
        for event in self.session.drain_events() {
            self.apply_event(event);
        }
    }

    /// Re-polls the live speed; elapsed time moves even when no key is pressed.
    pub fn on_tick(&mut self) {
        if self.session.has_started() && !self.session.has_finished() {
            self.stats.wpm = self.session.calculate_wpm();
        }
    }

    pub fn reset(&mut self) {
        let source = self.source.clone();
        self.switch_to(source);
    }

    pub fn select_level(&mut self, level_id: u32) {
        self.switch_to(PracticeSource::Level(level_id));
    }

    pub fn level_progress(&self, level_id: u32) -> LevelProgress {
        self.progress
            .get(&level_id)
            .cloned()
            .unwrap_or_else(|| LevelProgress::new(level_id))
    }

    pub fn registry(&self) -> &LevelRegistry {
        &self.registry
    }

    /// Highlight offset of the cursor inside the visible chunk
    pub fn cursor_in_chunk(&self) -> isize {
        self.window.position_in_chunk(self.session.current_index())
    }

    fn step_level(&mut self, forward: bool) {
        if let PracticeSource::Level(id) = self.source {
            let next = if forward {
                self.registry.next_id(id)
            } else {
                self.registry.prev_id(id)
            };
            self.select_level(next);
        }
    }

    fn switch_to(&mut self, source: PracticeSource) {
        match self.build(&source) {
            Ok((content, session, window)) => {
                self.source = source;
                self.content = content;
                self.session = session;
                self.window = window;
                self.state = AppState::Typing;
                self.stats = LiveStats::default();
                self.notice = None;
                self.sync_key_hint();
            }
            Err(e) => {
                log::error!("failed to load {:?}: {}", source, e);
                self.notice = Some(format!("Failed to load level: {e}"));
            }
        }
    }

    fn build(
        &self,
        source: &PracticeSource,
    ) -> Result<(LevelContent, TypingSession<C>, ChunkWindow)> {
        let content = load_content(&self.registry, source)?;
        let session =
            TypingSession::with_clock(&content.text, content.target_wpm, self.clock.clone())?;
        let window = ChunkWindow::new(&content.text, self.lines_per_chunk);
        Ok((content, session, window))
    }

    fn apply_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::CharChanged { current, next } => {
                self.current_char = current;
                self.next_char = next;
            }
            SessionEvent::StatsUpdated {
                wpm,
                accuracy,
                progress,
            } => {
                self.stats = LiveStats {
                    wpm,
                    accuracy,
                    progress,
                };
                self.window.maybe_advance(progress);
            }
            SessionEvent::SessionComplete { passed } => {
                let Some(summary) = self.session.summary() else {
                    return;
                };
                self.stats = LiveStats {
                    wpm: summary.wpm,
                    accuracy: summary.accuracy,
                    progress: self.session.current_index(),
                };
                self.current_char = None;
                self.next_char = None;

                if let Some(level_id) = self.content.level_id {
                    let saved = self
                        .store
                        .record(level_id, summary.wpm, summary.accuracy, passed);
                    if let Err(e) = saved {
                        log::warn!("could not save progress for level {}: {}", level_id, e);
                    }
                    let refreshed = read_progress(self.store.as_ref(), level_id);
                    self.progress.insert(level_id, refreshed);
                }
                self.state = AppState::Results(summary);
            }
        }
    }

    fn sync_key_hint(&mut self) {
        self.current_char = self.session.current_char();
        self.next_char = self.session.next_char();
    }
}

fn read_progress(store: &dyn ProgressStore, level_id: u32) -> LevelProgress {
    store.get(level_id).unwrap_or_else(|e| {
        log::warn!("could not read progress for level {}: {}", level_id, e);
        LevelProgress::new(level_id)
    })
}

fn load_content(registry: &LevelRegistry, source: &PracticeSource) -> Result<LevelContent> {
    let content = match source {
        PracticeSource::Level(id) => registry.load(*id)?,
        PracticeSource::File { path, target_wpm } => LevelContent::from_file(path, *target_wpm)?,
    };
    Ok(content)
}
