use directories::ProjectDirs;
use std::path::PathBuf;

const APP: &str = "countmein";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/countmein`, or the platform data dir
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join(APP))
        } else {
            ProjectDirs::from("", "", APP).map(|dirs| dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn config_file() -> PathBuf {
        ProjectDirs::from("", "", APP)
            .map(|dirs| dirs.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("countmein_config.json"))
    }

    pub fn history_db() -> PathBuf {
        Self::in_state("history.db")
    }

    pub fn outbox() -> PathBuf {
        Self::in_state("outbox.csv")
    }

    pub fn log_file() -> PathBuf {
        Self::in_state("countmein.log")
    }

    fn in_state(name: &str) -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join(name))
            .unwrap_or_else(|| PathBuf::from(name))
    }
}
