use std::sync::mpsc;
use std::time::Duration;

use assert_matches::assert_matches;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use countmein::anticheat::IrregularReason;
use countmein::app::{App, AppState};
use countmein::clock::ManualClock;
use countmein::config::Config;
use countmein::grid::GridPreset;
use countmein::runtime::{FixedTicker, GameEvent, Runner, TestEventSource};
use countmein::submission::{CsvOutbox, MemorySink};

fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
}

fn enter() -> KeyEvent {
    KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)
}

/// Every keystroke needed to fill `grid`, left to right, top to bottom
fn solution(grid: GridPreset) -> Vec<KeyEvent> {
    let (rows, cols) = (grid.rows(), grid.cols());
    let mut keys = Vec::new();
    for r in 1..=rows {
        for c in 1..=cols {
            keys.extend((r * c).to_string().chars().map(key));
            if !(r == rows && c == cols) {
                keys.push(enter());
            }
        }
    }
    keys
}

/// Drive `app` through a Runner until the queue drains, spacing each
/// event `step_ms` apart on the manual clock
fn drive(app: &mut App<ManualClock>, clock: &ManualClock, events: Vec<GameEvent>, step_ms: u64) {
    let (tx, rx) = mpsc::channel();
    let count = events.len();
    for ev in events {
        tx.send(ev).unwrap();
    }
    drop(tx);

    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );
    for _ in 0..count {
        let ev = runner.step();
        clock.advance_ms(step_ms);
        app.handle_event(ev);
    }
}

fn headless_app(grid: GridPreset, clock: &ManualClock) -> App<ManualClock> {
    App::with_clock(
        Config {
            grid,
            ..Config::default()
        },
        Box::new(MemorySink::default()),
        None,
        Vec::new(),
        clock.clone(),
    )
}

#[test]
fn headless_honest_run_reaches_form_and_submits() {
    let dir = tempfile::tempdir().unwrap();
    let outbox_path = dir.path().join("outbox.csv");
    let clock = ManualClock::default();
    let mut app = App::with_clock(
        Config {
            grid: GridPreset::FiveByFive,
            player_name: "Ada".into(),
            ..Config::default()
        },
        Box::new(CsvOutbox::new(&outbox_path)),
        None,
        Vec::new(),
        clock.clone(),
    );

    let events = solution(GridPreset::FiveByFive)
        .into_iter()
        .map(GameEvent::key)
        .collect();
    drive(&mut app, &clock, events, 150);
    assert_eq!(app.state, AppState::Form);

    drive(&mut app, &clock, vec![GameEvent::key(enter())], 10);
    assert_eq!(app.state, AppState::Submitted);

    let rows = CsvOutbox::new(&outbox_path).read_all().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Ada");
    assert_eq!(rows[0].grid, "5x5");
    assert_eq!(rows[0].ac_untrusted, "0");
    assert_eq!(rows[0].ac_paste, "0");
}

#[test]
fn headless_scripted_input_is_rejected() {
    let clock = ManualClock::default();
    let mut app = headless_app(GridPreset::FiveByFive, &clock);

    let events = solution(GridPreset::FiveByFive)
        .into_iter()
        .map(GameEvent::scripted_key)
        .collect();
    drive(&mut app, &clock, events, 150);

    assert_matches!(&app.state, AppState::Rejected(v) if v.reasons == vec![IrregularReason::UntrustedInput]);
}

#[test]
fn headless_burst_input_is_too_fast() {
    let clock = ManualClock::default();
    let mut app = headless_app(GridPreset::FiveByFive, &clock);

    let events = solution(GridPreset::FiveByFive)
        .into_iter()
        .map(GameEvent::key)
        .collect();
    drive(&mut app, &clock, events, 1);

    assert_matches!(&app.state, AppState::Rejected(v) if v.reasons.contains(&IrregularReason::TooFast));
}

#[test]
fn headless_paste_is_flagged_but_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let outbox_path = dir.path().join("outbox.csv");
    let clock = ManualClock::default();
    let mut app = App::with_clock(
        Config {
            grid: GridPreset::FiveByFive,
            player_name: "Grace".into(),
            ..Config::default()
        },
        Box::new(CsvOutbox::new(&outbox_path)),
        None,
        Vec::new(),
        clock.clone(),
    );

    let mut events = vec![GameEvent::Paste("1".into())];
    events.extend(solution(GridPreset::FiveByFive).into_iter().map(GameEvent::key));
    events.push(GameEvent::key(enter()));
    drive(&mut app, &clock, events, 150);

    assert_eq!(app.state, AppState::Submitted);
    let rows = CsvOutbox::new(&outbox_path).read_all().unwrap();
    assert_eq!(rows[0].ac_paste, "1");
}

#[test]
fn headless_ticks_keep_timer_running() {
    let clock = ManualClock::default();
    let mut app = headless_app(GridPreset::FiveByFive, &clock);

    drive(&mut app, &clock, vec![GameEvent::key(key('1'))], 100);
    drive(&mut app, &clock, vec![GameEvent::Tick, GameEvent::Tick], 500);

    assert!(app.game.has_started());
    assert_eq!(app.game.elapsed_ms(), 1_000);
}
