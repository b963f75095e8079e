use std::time::Duration;

use crate::anticheat::{self, InputKind, SessionRecorder, SessionSummary, Verdict};
use crate::celebration::Celebration;
use crate::clock::{Clock, SystemClock};
use crate::grid::{Direction, Grid, GridPreset};

/// Keys on the on-screen keypad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VirtualKey {
    Digit(char),
    Backspace,
    Enter,
}

/// Everything the player can do to the grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameInput {
    Digit(char),
    Backspace,
    Delete,
    Enter,
    Tab,
    Arrow(Direction),
    /// Pasted text; never reaches a cell
    Paste(String),
    VirtualKey(VirtualKey),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameState {
    Recording,
    Accepted {
        summary: SessionSummary,
        verdict: Verdict,
    },
    Rejected {
        summary: SessionSummary,
        verdict: Verdict,
    },
}

/// Result of feeding one input to the game
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    Continue,
    Accepted(SessionSummary),
    Rejected(Verdict),
}

/// One attempt at a grid: cells, telemetry and timer
#[derive(Debug)]
pub struct Game<C: Clock + Clone = SystemClock> {
    clock: C,
    pub grid: Grid,
    recorder: SessionRecorder<C>,
    timer_started: Option<Duration>,
    final_elapsed_ms: Option<u64>,
    state: GameState,
    pub celebration: Celebration,
}

impl Game<SystemClock> {
    pub fn new(preset: GridPreset) -> Self {
        Self::with_clock(preset, SystemClock::new())
    }
}

impl<C: Clock + Clone> Game<C> {
    pub fn with_clock(preset: GridPreset, clock: C) -> Self {
        tracing::info!(grid = %preset, "new session");
        Self {
            recorder: SessionRecorder::with_clock(preset, clock.clone()),
            clock,
            grid: Grid::new(preset),
            timer_started: None,
            final_elapsed_ms: None,
            state: GameState::Recording,
            celebration: Celebration::new(),
        }
    }

    pub fn preset(&self) -> GridPreset {
        self.grid.preset()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn recorder(&self) -> &SessionRecorder<C> {
        &self.recorder
    }

    pub fn has_started(&self) -> bool {
        self.timer_started.is_some()
    }

    pub fn has_finished(&self) -> bool {
        !matches!(self.state, GameState::Recording)
    }

    /// Milliseconds on the game timer. Frozen once the grid is complete.
    pub fn elapsed_ms(&self) -> u64 {
        if let Some(done) = self.final_elapsed_ms {
            return done;
        }
        match self.timer_started {
            Some(start) => self.clock.monotonic().saturating_sub(start).as_millis() as u64,
            None => 0,
        }
    }

    pub fn display_time(&self) -> String {
        crate::util::format_time(self.elapsed_ms())
    }

    /// Replace the whole session with a fresh one on the same preset
    pub fn reset(&mut self) {
        self.change_preset(self.preset());
    }

    /// Replace the whole session with a fresh one on `preset`
    pub fn change_preset(&mut self, preset: GridPreset) {
        tracing::info!(grid = %preset, "session replaced");
        self.grid = Grid::new(preset);
        self.recorder = SessionRecorder::with_clock(preset, self.clock.clone());
        self.timer_started = None;
        self.final_elapsed_ms = None;
        self.state = GameState::Recording;
        self.celebration.stop();
    }

    /// Apply one input. `trusted` is the host's verdict on whether the
    /// input came from the player directly. Inputs after completion are
    /// ignored.
    pub fn handle(&mut self, input: GameInput, trusted: bool) -> Progress {
        if self.has_finished() {
            return Progress::Continue;
        }

        match input {
            GameInput::Digit(d) => {
                self.recorder.record(InputKind::DigitKey, trusted);
                self.type_digit(d)
            }
            GameInput::Backspace | GameInput::Delete => {
                self.recorder.record(InputKind::ControlKey, trusted);
                self.grid.clear();
                Progress::Continue
            }
            GameInput::Enter | GameInput::Tab => {
                self.recorder.record(InputKind::ControlKey, trusted);
                self.grid.advance();
                Progress::Continue
            }
            GameInput::Arrow(dir) => {
                self.grid.move_cursor(dir);
                Progress::Continue
            }
            GameInput::Paste(_) => {
                self.recorder.record_paste();
                Progress::Continue
            }
            GameInput::VirtualKey(key) => {
                self.recorder.record_virtual_key_press();
                match key {
                    VirtualKey::Digit(d) => self.type_digit(d),
                    VirtualKey::Backspace => {
                        self.grid.clear();
                        Progress::Continue
                    }
                    VirtualKey::Enter => {
                        self.grid.advance();
                        Progress::Continue
                    }
                }
            }
        }
    }

    fn type_digit(&mut self, d: char) -> Progress {
        if self.timer_started.is_none() && self.grid.current_is_empty() && d.is_ascii_digit() {
            self.timer_started = Some(self.clock.monotonic());
        }
        if self.grid.type_digit(d) && self.grid.is_complete() {
            return self.complete();
        }
        Progress::Continue
    }

    fn complete(&mut self) -> Progress {
        self.final_elapsed_ms = Some(self.elapsed_ms());
        let (summary, verdict) = anticheat::assess(&self.recorder);

        if verdict.suspicious {
            tracing::warn!(
                grid = %summary.grid,
                reasons = ?verdict.reasons,
                moves = summary.move_count,
                untrusted = summary.untrusted_count,
                duration_ms = summary.duration_ms,
                "irregular run rejected"
            );
            self.state = GameState::Rejected {
                summary,
                verdict: verdict.clone(),
            };
            Progress::Rejected(verdict)
        } else {
            tracing::info!(
                grid = %summary.grid,
                time = %self.display_time(),
                moves = summary.move_count,
                "grid completed"
            );
            self.state = GameState::Accepted {
                summary,
                verdict,
            };
            Progress::Accepted(summary)
        }
    }

    /// Fresh verdict for the pre-submission gate. This one is authoritative
    /// over the verdict taken at completion.
    pub fn submission_check(&self) -> (SessionSummary, Verdict) {
        anticheat::assess(&self.recorder)
    }

    /// Start the confetti, timed by the game clock
    pub fn start_celebration(&mut self, width: u16, height: u16) {
        self.celebration.start(width, height, self.clock.monotonic());
    }

    pub fn on_tick(&mut self) {
        self.celebration.update(self.clock.monotonic());
    }
}
