use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use keyrace::scheduler::{EngineEvent, FixedTicker, TestEventSource, TickScheduler};
use keyrace::session::{Lifecycle, Session};

// Headless integration using the scheduler + a session without a TTY.
// Verifies that a minimal typing flow completes via TickScheduler/TestEventSource.
#[test]
fn headless_typing_flow_completes() {
    let mut session = Session::with_text("hi");

    // Channel for the test event source
    let (tx, rx) = mpsc::channel();

    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(5));
    let scheduler = TickScheduler::new(es, ticker);

    // Producer: send the keystrokes for the prompt
    for c in ['h', 'i'] {
        tx.send(EngineEvent::Key(KeyEvent::new(
            KeyCode::Char(c),
            KeyModifiers::NONE,
        )))
        .unwrap();
    }

    // Act: drive a tiny event loop until finished (or bounded steps)
    let mut typed = String::new();
    for _ in 0..100u32 {
        match scheduler.step(true) {
            EngineEvent::Tick => session.tick(),
            EngineEvent::Resize => {}
            EngineEvent::Key(key) => {
                if let KeyCode::Char(c) = key.code {
                    typed.push(c);
                    session.update_typed(&typed);
                    if session.has_finished() {
                        break;
                    }
                }
            }
        }
    }

    assert!(session.has_finished(), "session should have finished typing");
    let snap = session.snapshot();
    assert_eq!(snap.errors, 0);
    assert_eq!(snap.accuracy, 100.0);
    assert!(snap.wpm >= 0.0);
}

// An idle scheduler must deliver queued input without manufacturing ticks.
#[test]
fn headless_idle_scheduler_delivers_input_only() {
    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(1));
    let scheduler = TickScheduler::new(es, ticker);

    tx.send(EngineEvent::Key(KeyEvent::new(
        KeyCode::Char('a'),
        KeyModifiers::NONE,
    )))
    .unwrap();

    match scheduler.step(false) {
        EngineEvent::Key(key) => assert_eq!(key.code, KeyCode::Char('a')),
        other => panic!("expected the queued key event, got {other:?}"),
    }
}

// Ticks alone never move a session forward.
#[test]
fn headless_ticks_do_not_type() {
    let mut session = Session::with_text("abc");
    session.update_typed("a");

    for _ in 0..50 {
        session.tick();
    }

    assert_eq!(session.typed(), "a");
    assert_eq!(session.error_count(), 0);
    assert_eq!(session.lifecycle(), Lifecycle::Running);
}
