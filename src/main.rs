use chrono::{Local, NaiveDate};
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

use countmein::{
    app::{Action, App},
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore},
    grid::GridPreset,
    hall_of_fame::{self, MonthKey},
    history::HistoryDb,
    leaderboard,
    logging,
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    submission::{Category, CsvOutbox},
    util::format_time,
};

const TICK_RATE_MS: u64 = 100;

/// times-table grid challenge for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Fill in a multiplication grid against the clock, submit your time and see how you stack up on the monthly Hall of Fame."
)]
pub struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,

    /// grid size: 5x5, 5x12, 12x12 or 15x15
    #[clap(short = 'g', long, global = true)]
    grid: Option<GridPreset>,

    /// hide the on-screen keypad
    #[clap(long, global = true)]
    no_keypad: bool,

    /// directory holding `<grid>-<Category>.csv` leaderboard exports
    #[clap(long, global = true)]
    leaderboard_dir: Option<PathBuf>,

    /// log filter, overridden by RUST_LOG
    #[clap(long, global = true, default_value = "info")]
    log_level: String,

    /// where logs go; the terminal belongs to the game
    #[clap(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// play a grid (default)
    Play,
    /// print the leaderboard for a grid
    Leaderboard,
    /// print monthly winners
    HallOfFame {
        /// month as YYYY-MM; defaults to the current month
        #[clap(long, conflicts_with = "all")]
        month: Option<MonthKey>,
        /// every month on record
        #[clap(long)]
        all: bool,
    },
    /// print recent runs on this machine
    History {
        #[clap(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let log_file = cli.log_file.clone().unwrap_or_else(AppDirs::log_file);
    logging::init(&cli.log_level, &log_file)?;

    let store = FileConfigStore::new();
    let mut config = store.load();
    if let Some(grid) = cli.grid {
        config.grid = grid;
    }
    if cli.no_keypad {
        config.keypad = false;
    }
    if let Some(dir) = &cli.leaderboard_dir {
        config.leaderboard_dir = Some(dir.clone());
    }

    let entries = config
        .leaderboard_dir
        .as_deref()
        .map(leaderboard::load_dir)
        .unwrap_or_default();

    match cli.command.clone().unwrap_or(Command::Play) {
        Command::Leaderboard => print_leaderboard(&entries, config.grid),
        Command::HallOfFame { month, all } => {
            let today = Local::now().date_naive();
            print_hall_of_fame(&entries, hall_of_fame_months(&entries, month, all, today));
        }
        Command::History { limit } => print_history(limit)?,
        Command::Play => {
            if !stdin().is_tty() {
                let mut cmd = Cli::command();
                cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
            }

            let history = match HistoryDb::open(AppDirs::history_db()) {
                Ok(db) => Some(db),
                Err(e) => {
                    tracing::warn!(error = %e, "history unavailable");
                    None
                }
            };
            let sink = Box::new(CsvOutbox::new(config.outbox_path()));
            let mut app = App::new(config, sink, history, entries);

            enable_raw_mode()?;
            let mut stdout = io::stdout();
            execute!(
                stdout,
                EnterAlternateScreen,
                EnableBracketedPaste,
                EnableMouseCapture
            )?;
            let backend = CrosstermBackend::new(stdout);
            let mut terminal = Terminal::new(backend)?;

            let result = start_tui(&mut terminal, &mut app);

            disable_raw_mode()?;
            execute!(
                terminal.backend_mut(),
                DisableMouseCapture,
                DisableBracketedPaste,
                LeaveAlternateScreen
            )?;
            terminal.show_cursor()?;

            if let Err(e) = store.save(&app.config) {
                tracing::warn!(error = %e, "failed to save config");
            }
            result?;
        }
    }

    Ok(())
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        let size = terminal.size()?;
        app.size = (size.width, size.height);
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        let event = runner.step();
        let action = app.handle_event(event);
        match action {
            Action::Continue => {}
            Action::Quit => break,
            Action::OpenUrl(url) => {
                if let Err(e) = webbrowser::open(&url) {
                    tracing::warn!(url = %url, error = %e, "could not open browser");
                }
            }
        }
    }

    Ok(())
}

fn print_leaderboard(entries: &[leaderboard::Entry], grid: GridPreset) {
    println!("Leaderboard {}", grid.label());
    for category in Category::ALL {
        println!("\n{}", category.short_label());
        let ranked = leaderboard::ranking(entries, grid, category);
        if ranked.is_empty() {
            println!("  no times yet");
        }
        for (i, e) in ranked.iter().enumerate() {
            println!("  {:>3}. {}  {}", i + 1, e.time, e.name);
        }
    }
}

/// Months the `hall-of-fame` command prints
fn hall_of_fame_months(
    entries: &[leaderboard::Entry],
    month: Option<MonthKey>,
    all: bool,
    today: NaiveDate,
) -> Vec<MonthKey> {
    match (month, all) {
        (Some(m), _) => vec![m],
        (None, true) => hall_of_fame::months(entries, today),
        (None, false) => vec![MonthKey::of(&today)],
    }
}

fn print_hall_of_fame(entries: &[leaderboard::Entry], months: Vec<MonthKey>) {
    let winners = hall_of_fame::winners(entries);
    if months.is_empty() {
        println!("No winners yet.");
        return;
    }

    for m in months {
        println!("{}", m.label());
        let list = hall_of_fame::for_month(&winners, m);
        if list.is_empty() {
            println!("  no winners");
        }
        for w in list {
            println!(
                "  {:<6} {:<10} {}  {}",
                w.grid.label(),
                w.category.short_label(),
                w.time,
                w.name
            );
        }
    }
}

fn print_history(limit: usize) -> Result<(), Box<dyn Error>> {
    let db = HistoryDb::open(AppDirs::history_db())?;
    let runs = db.recent(limit)?;
    if runs.is_empty() {
        println!("No runs recorded yet.");
    }
    for run in runs {
        println!(
            "{}  {:<6} {}  moves {}",
            run.completed_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            run.grid.label(),
            format_time(run.elapsed_ms),
            run.summary.move_count
        );
    }
    Ok(())
}
