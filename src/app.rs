use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;

use crate::anticheat::Verdict;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::Error;
use crate::game::{Game, GameInput, Progress};
use crate::grid::Direction;
use crate::history::{HistoryDb, RunRecord};
use crate::leaderboard::Entry;
use crate::runtime::GameEvent;
use crate::submission::{prepare_submission, SubmissionForm, SubmissionSink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppState {
    Playing,
    /// Completed grid failed the plausibility checks
    Rejected(Verdict),
    Form,
    Submitted,
    Leaderboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    School,
    Email,
    Category,
}

impl FormField {
    const ORDER: [FormField; 4] = [
        FormField::Name,
        FormField::School,
        FormField::Email,
        FormField::Category,
    ];

    fn next(self) -> Self {
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(idx + 1) % Self::ORDER.len()]
    }

    fn prev(self) -> Self {
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(idx + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

#[derive(Debug, Clone)]
pub struct FormState {
    pub form: SubmissionForm,
    pub focus: FormField,
    pub error: Option<String>,
}

impl FormState {
    fn from_config(config: &Config) -> Self {
        Self {
            form: SubmissionForm {
                name: config.player_name.clone(),
                school: config.school.clone(),
                email: config.email.clone(),
                category: config.category,
            },
            focus: FormField::Name,
            error: None,
        }
    }

    fn focused_text(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Name => Some(&mut self.form.name),
            FormField::School => Some(&mut self.form.school),
            FormField::Email => Some(&mut self.form.email),
            FormField::Category => None,
        }
    }
}

/// What the outer loop should do after an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
    OpenUrl(String),
}

pub struct App<C: Clock + Clone = SystemClock> {
    pub game: Game<C>,
    pub state: AppState,
    pub form: FormState,
    pub config: Config,
    pub leaderboard: Vec<Entry>,
    pub personal_best: Option<u64>,
    pub show_keypad: bool,
    pub last_submission: Option<String>,
    /// Terminal size, for keypad hit testing and confetti bounds
    pub size: (u16, u16),
    clock: C,
    history: Option<HistoryDb>,
    sink: Box<dyn SubmissionSink>,
}

impl App<SystemClock> {
    pub fn new(
        config: Config,
        sink: Box<dyn SubmissionSink>,
        history: Option<HistoryDb>,
        leaderboard: Vec<Entry>,
    ) -> Self {
        Self::with_clock(config, sink, history, leaderboard, SystemClock::new())
    }
}

impl<C: Clock + Clone> App<C> {
    pub fn with_clock(
        config: Config,
        sink: Box<dyn SubmissionSink>,
        history: Option<HistoryDb>,
        leaderboard: Vec<Entry>,
        clock: C,
    ) -> Self {
        let mut app = Self {
            game: Game::with_clock(config.grid, clock.clone()),
            state: AppState::Playing,
            form: FormState::from_config(&config),
            show_keypad: config.keypad,
            config,
            leaderboard,
            personal_best: None,
            last_submission: None,
            size: (80, 24),
            clock,
            history,
            sink,
        };
        app.refresh_personal_best();
        app
    }

    fn refresh_personal_best(&mut self) {
        let grid = self.game.preset();
        self.personal_best = self
            .history
            .as_ref()
            .and_then(|db| match db.best_time(grid) {
                Ok(best) => best,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read personal best");
                    None
                }
            });
    }

    /// Start over on the same grid with a fresh session
    pub fn new_game(&mut self) {
        self.game.reset();
        self.state = AppState::Playing;
        self.form = FormState::from_config(&self.config);
        self.refresh_personal_best();
    }

    pub fn next_preset(&mut self) {
        let next = self.game.preset().next();
        self.game.change_preset(next);
        self.config.grid = next;
        self.state = AppState::Playing;
        self.refresh_personal_best();
    }

    pub fn handle_event(&mut self, event: GameEvent) -> Action {
        match event {
            GameEvent::Tick => {
                self.game.on_tick();
                Action::Continue
            }
            GameEvent::Resize => Action::Continue,
            GameEvent::Paste(text) => {
                self.on_paste(text);
                Action::Continue
            }
            GameEvent::Click { column, row } => {
                self.on_click(column, row);
                Action::Continue
            }
            GameEvent::Key { key, trusted } => self.on_key(key, trusted),
        }
    }

    fn on_paste(&mut self, text: String) {
        match self.state {
            AppState::Playing => {
                self.game.handle(GameInput::Paste(text), true);
            }
            AppState::Form => {
                if let Some(field) = self.form.focused_text() {
                    field.push_str(text.trim());
                }
            }
            _ => {}
        }
    }

    fn on_click(&mut self, column: u16, row: u16) {
        if self.state != AppState::Playing || !self.show_keypad {
            return;
        }
        let area = Rect::new(0, 0, self.size.0, self.size.1);
        if let Some(key) = crate::ui::keypad::hit(area, column, row) {
            let progress = self.game.handle(GameInput::VirtualKey(key), true);
            self.on_progress(progress);
        }
    }

    fn on_key(&mut self, key: KeyEvent, trusted: bool) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Action::Quit;
        }

        match self.state.clone() {
            AppState::Playing => self.on_playing_key(key, trusted),
            AppState::Rejected(_) => match key.code {
                KeyCode::Esc => Action::Quit,
                KeyCode::Enter | KeyCode::Char('r') | KeyCode::Char(' ') => {
                    self.new_game();
                    Action::Continue
                }
                _ => Action::Continue,
            },
            AppState::Form => {
                self.on_form_key(key);
                Action::Continue
            }
            AppState::Submitted => match key.code {
                KeyCode::Esc => Action::Quit,
                KeyCode::Enter | KeyCode::Char('n') => {
                    self.new_game();
                    Action::Continue
                }
                KeyCode::Char('b') => {
                    self.state = AppState::Leaderboard;
                    Action::Continue
                }
                KeyCode::Char('l') => match &self.config.leaderboard_url {
                    Some(url) => Action::OpenUrl(url.clone()),
                    None => Action::Continue,
                },
                _ => Action::Continue,
            },
            AppState::Leaderboard => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('b') | KeyCode::F(3)) {
                    self.state = if self.game.has_finished() {
                        AppState::Submitted
                    } else {
                        AppState::Playing
                    };
                }
                Action::Continue
            }
        }
    }

    fn on_playing_key(&mut self, key: KeyEvent, trusted: bool) -> Action {
        let input = match key.code {
            KeyCode::Esc => return Action::Quit,
            KeyCode::F(2) => {
                self.next_preset();
                return Action::Continue;
            }
            KeyCode::F(3) if !self.game.has_started() => {
                self.state = AppState::Leaderboard;
                return Action::Continue;
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.new_game();
                return Action::Continue;
            }
            KeyCode::Char(c) if c.is_ascii_digit() => GameInput::Digit(c),
            KeyCode::Backspace => GameInput::Backspace,
            KeyCode::Delete => GameInput::Delete,
            KeyCode::Enter => GameInput::Enter,
            KeyCode::Tab => GameInput::Tab,
            KeyCode::Up => GameInput::Arrow(Direction::Up),
            KeyCode::Down => GameInput::Arrow(Direction::Down),
            KeyCode::Left => GameInput::Arrow(Direction::Left),
            KeyCode::Right => GameInput::Arrow(Direction::Right),
            _ => return Action::Continue,
        };

        let progress = self.game.handle(input, trusted);
        self.on_progress(progress);
        Action::Continue
    }

    fn on_progress(&mut self, progress: Progress) {
        match progress {
            Progress::Continue => {}
            Progress::Rejected(verdict) => {
                self.state = AppState::Rejected(verdict);
            }
            Progress::Accepted(summary) => {
                let elapsed_ms = self.game.elapsed_ms();
                if let Some(db) = &self.history {
                    let run = RunRecord {
                        grid: summary.grid,
                        elapsed_ms,
                        completed_at: self.clock.wall(),
                        summary,
                    };
                    if let Err(e) = db.record_run(&run) {
                        tracing::warn!(error = %e, "failed to save run to history");
                    }
                }
                let (width, height) = self.size;
                self.game.start_celebration(width, height);
                self.form = FormState::from_config(&self.config);
                self.state = AppState::Form;
            }
        }
    }

    fn on_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.new_game(),
            KeyCode::Tab | KeyCode::Down => self.form.focus = self.form.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.form.focus = self.form.focus.prev(),
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                if let Some(field) = self.form.focused_text() {
                    field.pop();
                }
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
                if self.form.focus == FormField::Category =>
            {
                self.form.form.category = self.form.form.category.next();
            }
            KeyCode::Char(c) => {
                if let Some(field) = self.form.focused_text() {
                    field.push(c);
                }
            }
            _ => {}
        }
    }

    /// Gate and send the submission
    pub fn submit(&mut self) {
        let payload = match prepare_submission(&self.game, &self.form.form, self.clock.wall()) {
            Ok(payload) => payload,
            Err(Error::IrregularRun) => {
                let (_, verdict) = self.game.submission_check();
                self.state = AppState::Rejected(verdict);
                return;
            }
            Err(e) => {
                self.form.error = Some(e.to_string());
                return;
            }
        };

        match self.sink.submit(&payload) {
            Ok(()) => {
                self.config.player_name = self.form.form.name.clone();
                self.config.school = self.form.form.school.clone();
                self.config.email = self.form.form.email.clone();
                self.config.category = self.form.form.category;
                self.last_submission = Some(payload.time.clone());
                self.refresh_personal_best();
                self.state = AppState::Submitted;
            }
            Err(e) => {
                tracing::error!(error = %e, "submission failed");
                self.form.error = Some(format!("could not submit: {e}"));
            }
        }
    }

    pub fn top_players(&self) -> std::collections::BTreeMap<crate::submission::Category, Entry> {
        crate::leaderboard::top_players(&self.leaderboard, self.game.preset())
    }
}
