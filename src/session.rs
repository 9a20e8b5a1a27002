use std::time::Duration;

use crate::clock::{Clock, MonotonicClock};
use crate::error::SessionError;
use crate::metrics;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// A keystroke that did not match the expected character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeystrokeError {
    pub position: usize,
    pub expected: char,
    pub typed: char,
}

/// Notifications queued for the presentation layer, drained after each keystroke.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SessionEvent {
    /// `None` stands for "past the end of the text"
    CharChanged {
        current: Option<char>,
        next: Option<char>,
    },
    StatsUpdated {
        wpm: f64,
        accuracy: f64,
        progress: usize,
    },
    SessionComplete {
        passed: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeystrokeOutcome {
    Correct,
    Incorrect,
    /// The keystroke was correct and finished the text
    Completed,
    /// The session had already completed; nothing changed
    Ignored,
}

/// Final figures captured at the moment the last character was typed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSummary {
    pub wpm: f64,
    pub accuracy: f64,
    pub passed: bool,
    pub elapsed: Duration,
    pub error_count: usize,
}

/// One attempt at typing a fixed text against a target speed.
///
/// The session owns the cursor and every counter; it never skips ahead on a
/// wrong key and never moves backwards. Time is read from the injected
/// [`Clock`] whenever a metric is queried, so nothing ticks in the background.
#[derive(Debug)]
pub struct TypingSession<C: Clock = MonotonicClock> {
    text: Vec<char>,
    target_wpm: f64,
    current_index: usize,
    correct_chars: usize,
    total_keystrokes: usize,
    started_at: Option<Duration>,
    finished_at: Option<Duration>,
    errors: Vec<KeystrokeError>,
    status: SessionStatus,
    summary: Option<SessionSummary>,
    events: Vec<SessionEvent>,
    clock: C,
}

impl TypingSession<MonotonicClock> {
    pub fn new(text: &str, target_wpm: f64) -> Result<Self, SessionError> {
        Self::with_clock(text, target_wpm, MonotonicClock::new())
    }
}

impl<C: Clock> TypingSession<C> {
    pub fn with_clock(text: &str, target_wpm: f64, clock: C) -> Result<Self, SessionError> {
        if text.is_empty() {
            return Err(SessionError::EmptyText);
        }
        if !target_wpm.is_finite() || target_wpm < 0.0 {
            return Err(SessionError::InvalidTargetWpm(target_wpm));
        }

        Ok(Self {
            text: text.chars().collect(),
            target_wpm,
            current_index: 0,
            correct_chars: 0,
            total_keystrokes: 0,
            started_at: None,
            finished_at: None,
            errors: Vec::new(),
            status: SessionStatus::NotStarted,
            summary: None,
            events: Vec::new(),
            clock,
        })
    }

    /// Starts (or restarts) the attempt from the first character.
    pub fn start(&mut self) {
        let previous = self.status;
        self.started_at = Some(self.clock.now());
        self.finished_at = None;
        self.current_index = 0;
        self.correct_chars = 0;
        self.total_keystrokes = 0;
        self.errors.clear();
        self.summary = None;
        self.status = SessionStatus::InProgress;

        log::debug!(
            "session {} -> {} ({} chars)",
            previous,
            self.status,
            self.text.len()
        );
        self.emit_current_char();
    }

    pub fn process_keystroke(&mut self, c: char) -> KeystrokeOutcome {
        if self.status == SessionStatus::Completed {
            return KeystrokeOutcome::Ignored;
        }
        if self.status == SessionStatus::NotStarted {
            self.start();
        }

        self.total_keystrokes += 1;
        let expected = self.text[self.current_index];

        if c == expected {
            self.correct_chars += 1;
            self.current_index += 1;

            // The finishing keystroke reports only completion, no stats update.
            if self.current_index == self.text.len() {
                self.finish();
                return KeystrokeOutcome::Completed;
            }

            self.emit_current_char();
            self.emit_stats();
            KeystrokeOutcome::Correct
        } else {
            self.errors.push(KeystrokeError {
                position: self.current_index,
                expected,
                typed: c,
            });
            self.emit_stats();
            KeystrokeOutcome::Incorrect
        }
    }

    pub fn calculate_wpm(&self) -> f64 {
        if self.started_at.is_none() {
            return 0.0;
        }

        metrics::wpm(self.correct_chars, self.elapsed())
    }

    pub fn calculate_accuracy(&self) -> f64 {
        metrics::accuracy(self.correct_chars, self.total_keystrokes)
    }

    /// Time since start; frozen once the session completes.
    pub fn elapsed(&self) -> Duration {
        match self.started_at {
            Some(started) => {
                let end = self.finished_at.unwrap_or_else(|| self.clock.now());
                end.saturating_sub(started)
            }
            None => Duration::ZERO,
        }
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn current_char(&self) -> Option<char> {
        self.text.get(self.current_index).copied()
    }

    pub fn next_char(&self) -> Option<char> {
        self.text.get(self.current_index + 1).copied()
    }

    pub fn text(&self) -> &[char] {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Always false: empty texts are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn target_wpm(&self) -> f64 {
        self.target_wpm
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn correct_chars(&self) -> usize {
        self.correct_chars
    }

    pub fn total_keystrokes(&self) -> usize {
        self.total_keystrokes
    }

    pub fn errors(&self) -> &[KeystrokeError] {
        &self.errors
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn has_started(&self) -> bool {
        self.status != SessionStatus::NotStarted
    }

    pub fn has_finished(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        self.summary
    }

    fn finish(&mut self) {
        self.finished_at = Some(self.clock.now());

        let wpm = self.calculate_wpm();
        let accuracy = self.calculate_accuracy();
        let passed = metrics::passes(wpm, accuracy, self.target_wpm);

        log::debug!("session {} -> {}", self.status, SessionStatus::Completed);
        self.status = SessionStatus::Completed;
        self.summary = Some(SessionSummary {
            wpm,
            accuracy,
            passed,
            elapsed: self.elapsed(),
            error_count: self.errors.len(),
        });

        log::info!(
            "session complete: {:.1} wpm, {:.1}% accuracy, target {} wpm, passed={}",
            wpm,
            accuracy,
            self.target_wpm,
            passed
        );
        self.events.push(SessionEvent::SessionComplete { passed });
    }

    fn emit_current_char(&mut self) {
        self.events.push(SessionEvent::CharChanged {
            current: self.current_char(),
            next: self.next_char(),
        });
    }

    fn emit_stats(&mut self) {
        self.events.push(SessionEvent::StatsUpdated {
            wpm: self.calculate_wpm(),
            accuracy: self.calculate_accuracy(),
            progress: self.current_index,
        });
    }
}
