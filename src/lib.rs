// Library surface for the binary, headless tests and reuse.
pub mod anticheat;
pub mod app;
pub mod app_dirs;
pub mod celebration;
pub mod clock;
pub mod config;
pub mod error;
pub mod game;
pub mod grid;
pub mod hall_of_fame;
pub mod history;
pub mod leaderboard;
pub mod logging;
pub mod runtime;
pub mod submission;
pub mod ui;
pub mod util;

pub use error::{Error, Result};
