use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::grid::GridPreset;
use crate::submission::Category;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub grid: GridPreset,
    /// Pre-filled into the submission form
    pub player_name: String,
    pub school: String,
    pub email: String,
    pub category: Category,
    /// Directory holding `<grid>-<Category>.csv` leaderboard exports
    pub leaderboard_dir: Option<PathBuf>,
    pub outbox_path: Option<PathBuf>,
    /// Opened from the results screen when a browser is available
    pub leaderboard_url: Option<String>,
    pub keypad: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid: GridPreset::default(),
            player_name: String::new(),
            school: String::new(),
            email: String::new(),
            category: Category::default(),
            leaderboard_dir: None,
            outbox_path: None,
            leaderboard_url: None,
            keypad: true,
        }
    }
}

impl Config {
    pub fn outbox_path(&self) -> PathBuf {
        self.outbox_path.clone().unwrap_or_else(AppDirs::outbox)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> crate::error::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_file(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Config::default(),
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "unreadable config, using defaults");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> crate::error::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
