use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use breth::clock::ManualTimeSource;
use breth::controller::{CompletionSink, CueEmitter, SessionController};
use breth::cues::SilentCue;
use breth::pattern::{box_breathing, BreathingPhase};
use breth::runtime::{BrethEvent, FixedTicker, Runner, TestEventSource};
use breth::session::{SessionConfig, SessionResult, SessionState};

#[derive(Default)]
struct LastResult {
    result: Option<SessionResult>,
}

impl CompletionSink for LastResult {
    fn on_session_complete(&mut self, result: &SessionResult) {
        self.result = Some(result.clone());
    }
}

// Headless integration using the internal runtime + controller without a TTY.
// Each Tick from the runner advances the manual clock by a fixed delta and
// polls, the same loop shape the binary runs.
#[test]
fn headless_session_completes_via_runner_ticks() {
    let time = ManualTimeSource::new();
    let config = SessionConfig::new(box_breathing(1).unwrap(), 2.0).unwrap();
    let mut controller =
        SessionController::new(config, time.clone(), SilentCue, LastResult::default());

    let (_tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(5));
    let runner = Runner::new(es, ticker);

    controller.start().unwrap();

    for _ in 0..100u32 {
        if let BrethEvent::Tick = runner.step() {
            time.advance(0.1);
            controller.poll().unwrap();
        }
        if controller.state() == SessionState::Completed {
            break;
        }
    }

    assert_eq!(controller.state(), SessionState::Completed);
    let result = controller.result().unwrap();
    assert!(result.completed);
    assert_eq!(result.actual_secs, 2.0);
}

#[test]
fn headless_key_event_cancels_the_session() {
    let time = ManualTimeSource::new();
    let config = SessionConfig::new(box_breathing(4).unwrap(), 60.0).unwrap();
    let mut controller =
        SessionController::new(config, time.clone(), SilentCue, LastResult::default());

    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(5));
    let runner = Runner::new(es, ticker);

    controller.start().unwrap();

    // A few ticks of breathing, then the user hits escape
    tx.send(BrethEvent::Tick).unwrap();
    tx.send(BrethEvent::Tick).unwrap();
    tx.send(BrethEvent::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)))
        .unwrap();

    for _ in 0..10u32 {
        match runner.step() {
            BrethEvent::Tick => {
                time.advance(1.5);
                controller.poll().unwrap();
            }
            BrethEvent::Key(key) if key.code == KeyCode::Esc => {
                controller.stop().unwrap();
                break;
            }
            _ => {}
        }
    }

    assert_eq!(controller.state(), SessionState::Cancelled);
    let result = controller.result().unwrap();
    assert!(!result.completed);
    assert!((result.actual_secs - 3.0).abs() < 1e-9);
}

#[test]
fn headless_opening_cue_fires_once() {
    #[derive(Default)]
    struct CountInhale {
        count: u32,
    }

    impl CueEmitter for CountInhale {
        fn on_phase_transition(&mut self, phase: &BreathingPhase) {
            if phase.kind.to_string() == "Inhale" {
                self.count += 1;
            }
        }

        fn on_cycle_complete(&mut self, _completed_cycles: u64) {}
    }

    let time = ManualTimeSource::new();
    let config = SessionConfig::new(box_breathing(4).unwrap(), 16.0).unwrap();
    let mut controller = SessionController::new(
        config,
        time.clone(),
        CountInhale::default(),
        LastResult::default(),
    );

    controller.start().unwrap();
    let snap = controller.poll().unwrap();
    assert!(snap.transitioned);
    assert_eq!(snap.phase_index, 0);

    // Repeated polls inside the opening inhale do not re-fire the cue
    time.advance(0.1);
    let snap = controller.poll().unwrap();
    assert!(!snap.transitioned);
    assert_eq!(snap.phase_index, 0);
}
