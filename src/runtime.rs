use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Input the main loop reacts to
#[derive(Clone, Debug)]
pub enum TutorEvent {
    Key(KeyEvent),
    Resize,
    /// No input within one tick interval
    Tick,
}

/// Anything that can hand the loop its next terminal event.
pub trait TutorEventSource: Send + 'static {
    /// Waits at most `timeout`; `Err(Timeout)` when nothing arrived.
    fn recv_timeout(&self, timeout: Duration) -> Result<TutorEvent, RecvTimeoutError>;
}

/// Events fed through a channel. Tests push keys into the sender directly.
pub struct ChannelEventSource {
    rx: Receiver<TutorEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<TutorEvent>) -> Self {
        Self { rx }
    }
}

impl TutorEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TutorEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Reads the real terminal on a background thread and forwards keys and resizes.
pub struct CrosstermEventSource {
    inner: ChannelEventSource,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) => TutorEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => TutorEvent::Resize,
                Ok(_) => continue,
                Err(e) => {
                    log::error!("terminal event stream failed: {}", e);
                    break;
                }
            };
            // receiver gone: the app has quit
            if tx.send(evt).is_err() {
                break;
            }
        });

        Self {
            inner: ChannelEventSource::new(rx),
        }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TutorEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TutorEvent, RecvTimeoutError> {
        self.inner.recv_timeout(timeout)
    }
}

/// How often the live WPM is re-polled while no key is pressed
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Pulls one event at a time so the loop body stays testable without a terminal.
pub struct Runner<E: TutorEventSource, T: Ticker> {
    events: E,
    ticker: T,
}

impl<E: TutorEventSource, T: Ticker> Runner<E, T> {
    pub fn new(events: E, ticker: T) -> Self {
        Self { events, ticker }
    }

    /// Next input, or `Tick` once the interval passes without any.
    /// A closed source also reads as `Tick`.
    pub fn step(&self) -> TutorEvent {
        self.events
            .recv_timeout(self.ticker.interval())
            .unwrap_or(TutorEvent::Tick)
    }
}

/// What a key press means to the tutor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// Forwarded to the typing session
    Type(char),
    Quit,
    ResetLevel,
    NextLevel,
    PrevLevel,
    Ignore,
}

/// Enter becomes `'\n'` and Tab `'\t'`; other non-printable keys never reach the session.
pub fn map_key(key: &KeyEvent) -> KeyAction {
    if key.kind != KeyEventKind::Press {
        return KeyAction::Ignore;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Char(_)
            if key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            KeyAction::Ignore
        }
        KeyCode::Char(c) => KeyAction::Type(c),
        KeyCode::Enter => KeyAction::Type('\n'),
        KeyCode::Tab => KeyAction::Type('\t'),
        KeyCode::Esc => KeyAction::Quit,
        KeyCode::Left => KeyAction::ResetLevel,
        KeyCode::Up => KeyAction::PrevLevel,
        KeyCode::Down => KeyAction::NextLevel,
        _ => KeyAction::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn runner(rx: Receiver<TutorEvent>) -> Runner<ChannelEventSource, FixedTicker> {
        Runner::new(
            ChannelEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(2)),
        )
    }

    #[test]
    fn idle_runner_ticks() {
        let (_tx, rx) = mpsc::channel();
        assert!(matches!(runner(rx).step(), TutorEvent::Tick));
    }

    #[test]
    fn queued_keys_come_out_in_order_then_ticks() {
        let (tx, rx) = mpsc::channel();
        tx.send(TutorEvent::Key(key(KeyCode::Char('q')))).unwrap();
        tx.send(TutorEvent::Resize).unwrap();
        let runner = runner(rx);

        assert!(matches!(
            runner.step(),
            TutorEvent::Key(KeyEvent {
                code: KeyCode::Char('q'),
                ..
            })
        ));
        assert!(matches!(runner.step(), TutorEvent::Resize));
        assert!(matches!(runner.step(), TutorEvent::Tick));
    }

    #[test]
    fn closed_source_ticks() {
        let (tx, rx) = mpsc::channel();
        drop(tx);
        assert!(matches!(runner(rx).step(), TutorEvent::Tick));
    }

    #[test]
    fn printable_keys_are_typed() {
        assert_eq!(map_key(&key(KeyCode::Char('a'))), KeyAction::Type('a'));
        assert_eq!(map_key(&key(KeyCode::Char(' '))), KeyAction::Type(' '));
        assert_eq!(
            map_key(&KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            KeyAction::Type('A')
        );
    }

    #[test]
    fn enter_and_tab_become_whitespace() {
        assert_eq!(map_key(&key(KeyCode::Enter)), KeyAction::Type('\n'));
        assert_eq!(map_key(&key(KeyCode::Tab)), KeyAction::Type('\t'));
    }

    #[test]
    fn special_keys_are_dropped() {
        assert_eq!(map_key(&key(KeyCode::Backspace)), KeyAction::Ignore);
        assert_eq!(map_key(&key(KeyCode::F(1))), KeyAction::Ignore);
        assert_eq!(map_key(&key(KeyCode::Right)), KeyAction::Ignore);
        assert_eq!(
            map_key(&KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL)),
            KeyAction::Ignore
        );
    }

    #[test]
    fn navigation_keys() {
        assert_eq!(map_key(&key(KeyCode::Esc)), KeyAction::Quit);
        assert_eq!(
            map_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyAction::Quit
        );
        assert_eq!(map_key(&key(KeyCode::Left)), KeyAction::ResetLevel);
        assert_eq!(map_key(&key(KeyCode::Up)), KeyAction::PrevLevel);
        assert_eq!(map_key(&key(KeyCode::Down)), KeyAction::NextLevel);
    }

    #[test]
    fn key_release_is_ignored() {
        let release = KeyEvent::new_with_kind_and_state(
            KeyCode::Char('a'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
            KeyEventState::NONE,
        );
        assert_eq!(map_key(&release), KeyAction::Ignore);
    }
}
