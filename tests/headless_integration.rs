use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use keytutor::app::{App, AppState, PracticeSource};
use keytutor::clock::ManualClock;
use keytutor::progress::MemoryProgressStore;
use keytutor::runtime::{map_key, ChannelEventSource, FixedTicker, Runner, TutorEvent};

fn file_app(
    dir: &tempfile::TempDir,
    text: &str,
    target_wpm: f64,
) -> (App<ManualClock>, ManualClock) {
    let path = dir.path().join("drill.txt");
    std::fs::write(&path, text).unwrap();

    let clock = ManualClock::new();
    let app = App::new(
        PracticeSource::File { path, target_wpm },
        10,
        Box::new(MemoryProgressStore::new()),
        clock.clone(),
    )
    .unwrap();
    (app, clock)
}

fn key(code: KeyCode) -> TutorEvent {
    TutorEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

// Headless integration using the internal runtime + App without a TTY
#[test]
fn headless_typing_flow_completes() {
    let dir = tempfile::tempdir().unwrap();
    let (mut app, clock) = file_app(&dir, "hi\nyo", 0.0);

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    for code in [
        KeyCode::Char('h'),
        KeyCode::Char('x'),
        KeyCode::Char('i'),
        KeyCode::Backspace,
        KeyCode::Enter,
        KeyCode::Char('y'),
        KeyCode::Char('o'),
    ] {
        tx.send(key(code)).unwrap();
    }

    for _ in 0..100u32 {
        match runner.step() {
            TutorEvent::Tick => app.on_tick(),
            TutorEvent::Resize => {}
            TutorEvent::Key(k) => {
                clock.advance(Duration::from_millis(200));
                assert!(app.handle_key(map_key(&k)));
            }
        }
        if app.session.has_finished() {
            break;
        }
    }

    assert!(app.session.has_finished(), "session should have finished");
    assert_eq!(app.session.total_keystrokes(), 6);
    assert_eq!(app.session.errors().len(), 1);

    match app.state {
        AppState::Results(summary) => {
            // 5 correct of 6 keystrokes
            assert!(!summary.passed);
            assert!((summary.accuracy - 500.0 / 6.0).abs() < 1e-9);
            assert!(summary.wpm > 0.0);
        }
        AppState::Typing => panic!("expected results"),
    }
}

#[test]
fn headless_escape_quits() {
    let dir = tempfile::tempdir().unwrap();
    let (mut app, _) = file_app(&dir, "abc", 10.0);

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );
    tx.send(key(KeyCode::Char('a'))).unwrap();
    tx.send(key(KeyCode::Esc)).unwrap();
    tx.send(key(KeyCode::Char('b'))).unwrap();

    let mut quit = false;
    for _ in 0..20u32 {
        if let TutorEvent::Key(k) = runner.step() {
            if !app.handle_key(map_key(&k)) {
                quit = true;
                break;
            }
        }
    }

    assert!(quit);
    assert_eq!(app.session.current_index(), 1);
}

#[test]
fn headless_long_text_scrolls_window() {
    let dir = tempfile::tempdir().unwrap();
    let text: String = (0..30)
        .map(|i| format!("line number {i}"))
        .collect::<Vec<_>>()
        .join("\n");
    let (mut app, clock) = file_app(&dir, &text, 0.0);

    let mut seen_starts = vec![app.window.start_line()];
    for c in text.chars() {
        clock.advance(Duration::from_millis(100));
        app.type_char(c);
        let start = app.window.start_line();
        if seen_starts.last() != Some(&start) {
            seen_starts.push(start);
        }
        // The window moves ahead before the cursor reaches its end, so the
        // cursor never runs past the visible text.
        if !app.session.has_finished() {
            assert!(app.cursor_in_chunk() < app.window.chunk_char_len() as isize);
        }
    }

    assert_eq!(seen_starts, vec![0, 10, 20]);
    assert!(app.session.has_finished());
}
