use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::grid::GridPreset;

/// Interactions the recorder knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputKind {
    DigitKey,
    /// Backspace, Delete, Enter or Tab
    ControlKey,
    ValueChange,
    Paste,
    VirtualKeyPress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub kind: InputKind,
    pub trusted: bool,
    /// Monotonic reading at the time of recording
    pub occurred_at: Duration,
}

/// Finish-time reduction of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub grid: GridPreset,
    pub duration_ms: u64,
    pub move_count: u32,
    pub trusted_count: u32,
    pub untrusted_count: u32,
    pub avg_delta_ms: u64,
    pub std_delta_ms: u64,
    pub paste_occurred: bool,
    pub virtual_key_press_count: u32,
}

/// Welford accumulator over inter-event deltas (milliseconds)
#[derive(Debug, Clone, Copy, Default)]
struct DeltaStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl DeltaStats {
    fn push(&mut self, delta_ms: f64) {
        self.count += 1;
        let diff = delta_ms - self.mean;
        self.mean += diff / self.count as f64;
        self.m2 += diff * (delta_ms - self.mean);
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Population standard deviation (divides by N)
    fn std_dev(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.m2 / self.count as f64).max(0.0).sqrt()
        }
    }
}

/// Collects input telemetry for one grid attempt.
///
/// A recorder is never reset. When the grid is reset, completed or switched
/// to another preset the owner drops it and creates a fresh one.
#[derive(Debug)]
pub struct SessionRecorder<C: Clock = SystemClock> {
    clock: C,
    grid: GridPreset,
    started_at: DateTime<Utc>,
    last_event_at: Duration,
    events: Vec<InputEvent>,
    deltas: DeltaStats,
    move_count: u32,
    trusted_count: u32,
    untrusted_count: u32,
    paste_occurred: bool,
    virtual_key_press_count: u32,
}

impl SessionRecorder<SystemClock> {
    pub fn new(grid: GridPreset) -> Self {
        Self::with_clock(grid, SystemClock::new())
    }
}

impl<C: Clock> SessionRecorder<C> {
    pub fn with_clock(grid: GridPreset, clock: C) -> Self {
        let started_at = clock.wall();
        let last_event_at = clock.monotonic();
        Self {
            clock,
            grid,
            started_at,
            last_event_at,
            events: Vec::new(),
            deltas: DeltaStats::default(),
            move_count: 0,
            trusted_count: 0,
            untrusted_count: 0,
            paste_occurred: false,
            virtual_key_press_count: 0,
        }
    }

    pub fn grid(&self) -> GridPreset {
        self.grid
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    pub fn paste_occurred(&self) -> bool {
        self.paste_occurred
    }

    /// Record one interaction. `Paste` is not a move and is dropped here;
    /// pastes go through [`record_paste`](Self::record_paste).
    pub fn record(&mut self, kind: InputKind, trusted: bool) {
        if kind == InputKind::Paste {
            return;
        }
        self.push(kind, trusted);
    }

    /// Flag that a paste was attempted. The flag is sticky for the session.
    /// Suppressing the pasted value is the caller's job.
    pub fn record_paste(&mut self) {
        if !self.paste_occurred {
            tracing::debug!(grid = %self.grid, "paste attempt recorded");
        }
        self.paste_occurred = true;
    }

    /// On-screen keypad presses are always trusted
    pub fn record_virtual_key_press(&mut self) {
        self.push(InputKind::VirtualKeyPress, true);
        self.virtual_key_press_count += 1;
    }

    fn push(&mut self, kind: InputKind, trusted: bool) {
        let now = self.clock.monotonic();
        let delta = now.saturating_sub(self.last_event_at);
        self.last_event_at = now;
        self.deltas.push(delta.as_secs_f64() * 1000.0);

        self.events.push(InputEvent {
            kind,
            trusted,
            occurred_at: now,
        });
        self.move_count += 1;
        if trusted {
            self.trusted_count += 1;
        } else {
            self.untrusted_count += 1;
        }
        tracing::trace!(?kind, trusted, delta_ms = delta.as_millis() as u64, "input recorded");
    }

    /// Snapshot the accumulated state. Does not reset anything; repeated
    /// calls agree on every field except `duration_ms`, which is measured
    /// against the wall clock at call time.
    pub fn finish(&self) -> SessionSummary {
        let elapsed = self.clock.wall() - self.started_at;
        SessionSummary {
            grid: self.grid,
            duration_ms: elapsed.num_milliseconds().max(0) as u64,
            move_count: self.move_count,
            trusted_count: self.trusted_count,
            untrusted_count: self.untrusted_count,
            avg_delta_ms: self.deltas.mean().round() as u64,
            std_delta_ms: self.deltas.std_dev().round() as u64,
            paste_occurred: self.paste_occurred,
            virtual_key_press_count: self.virtual_key_press_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn recorder() -> (SessionRecorder<ManualClock>, ManualClock) {
        let clock = ManualClock::default();
        (
            SessionRecorder::with_clock(GridPreset::FiveByFive, clock.clone()),
            clock,
        )
    }

    #[test]
    fn empty_session_has_zero_stats() {
        let (rec, _clock) = recorder();
        let summary = rec.finish();

        assert_eq!(summary.move_count, 0);
        assert_eq!(summary.avg_delta_ms, 0);
        assert_eq!(summary.std_delta_ms, 0);
        assert_eq!(summary.duration_ms, 0);
        assert!(!summary.paste_occurred);
    }

    #[test]
    fn counts_split_by_trust() {
        let (mut rec, clock) = recorder();
        for trusted in [true, true, false, true] {
            clock.advance_ms(100);
            rec.record(InputKind::DigitKey, trusted);
        }

        let summary = rec.finish();
        assert_eq!(summary.move_count, 4);
        assert_eq!(summary.trusted_count, 3);
        assert_eq!(summary.untrusted_count, 1);
        assert_eq!(
            summary.trusted_count + summary.untrusted_count,
            summary.move_count
        );
    }

    #[test]
    fn first_delta_is_measured_from_session_start() {
        let (mut rec, clock) = recorder();
        clock.advance_ms(900);
        rec.record(InputKind::DigitKey, true);

        assert_eq!(rec.finish().avg_delta_ms, 900);
    }

    #[test]
    fn population_std_dev_of_deltas() {
        let (mut rec, clock) = recorder();
        // deltas 100, 300 -> mean 200, population sd 100
        clock.advance_ms(100);
        rec.record(InputKind::DigitKey, true);
        clock.advance_ms(300);
        rec.record(InputKind::DigitKey, true);

        let summary = rec.finish();
        assert_eq!(summary.avg_delta_ms, 200);
        assert_eq!(summary.std_delta_ms, 100);
    }

    #[test]
    fn std_dev_rounds_at_summary_time() {
        let (mut rec, clock) = recorder();
        // deltas 10, 20, 30 -> population sd 8.1649...
        for ms in [10, 20, 30] {
            clock.advance_ms(ms);
            rec.record(InputKind::DigitKey, true);
        }

        let summary = rec.finish();
        assert_eq!(summary.avg_delta_ms, 20);
        assert_eq!(summary.std_delta_ms, 8);
    }

    #[test]
    fn wall_clock_jump_does_not_disturb_deltas() {
        let (mut rec, clock) = recorder();
        clock.advance_ms(200);
        rec.record(InputKind::DigitKey, true);
        clock.set_wall_back(Duration::from_secs(3600));
        clock.advance_ms(200);
        rec.record(InputKind::DigitKey, true);

        let summary = rec.finish();
        assert_eq!(summary.avg_delta_ms, 200);
        assert_eq!(summary.std_delta_ms, 0);
        // negative wall elapsed clamps to zero
        assert_eq!(summary.duration_ms, 0);
    }

    #[test]
    fn paste_is_sticky_and_not_a_move() {
        let (mut rec, clock) = recorder();
        rec.record_paste();
        clock.advance_ms(50);
        rec.record(InputKind::DigitKey, true);
        rec.record_paste();
        rec.record(InputKind::Paste, false);

        let summary = rec.finish();
        assert!(summary.paste_occurred);
        assert_eq!(summary.move_count, 1);
        assert_eq!(summary.untrusted_count, 0);
    }

    #[test]
    fn virtual_key_press_is_trusted_move() {
        let (mut rec, clock) = recorder();
        clock.advance_ms(300);
        rec.record_virtual_key_press();
        clock.advance_ms(300);
        rec.record_virtual_key_press();

        let summary = rec.finish();
        assert_eq!(summary.virtual_key_press_count, 2);
        assert_eq!(summary.move_count, 2);
        assert_eq!(summary.trusted_count, 2);
        assert_eq!(rec.events()[0].kind, InputKind::VirtualKeyPress);
    }

    #[test]
    fn events_keep_recording_order() {
        let (mut rec, clock) = recorder();
        rec.record(InputKind::DigitKey, true);
        clock.advance_ms(5);
        rec.record(InputKind::ValueChange, true);
        clock.advance_ms(5);
        rec.record(InputKind::ControlKey, true);

        let kinds: Vec<InputKind> = rec.events().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                InputKind::DigitKey,
                InputKind::ValueChange,
                InputKind::ControlKey
            ]
        );
        assert!(rec
            .events()
            .windows(2)
            .all(|w| w[0].occurred_at <= w[1].occurred_at));
    }

    #[test]
    fn finish_twice_with_frozen_clock_is_identical() {
        let (mut rec, clock) = recorder();
        for _ in 0..10 {
            clock.advance_ms(180);
            rec.record(InputKind::DigitKey, true);
        }

        assert_eq!(rec.finish(), rec.finish());
    }

    #[test]
    fn finish_later_only_moves_duration() {
        let (mut rec, clock) = recorder();
        clock.advance_ms(400);
        rec.record(InputKind::DigitKey, true);
        let first = rec.finish();
        clock.advance_ms(1_000);
        let second = rec.finish();

        assert_eq!(second.duration_ms, first.duration_ms + 1_000);
        assert_eq!(
            SessionSummary {
                duration_ms: first.duration_ms,
                ..second
            },
            first
        );
    }
}
