use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::bank::DEFAULT_CATEGORY;
use crate::leaderboard::LEADERBOARD_CAPACITY;
use crate::scoring::DEFAULT_PASS_THRESHOLD;
use crate::session::QUESTION_TIME_SECS;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QuizConfig {
    /// Clamped to 1..=15 when a session starts.
    pub question_time_secs: u32,
    pub pass_threshold: u32,
    /// Board size; anything above the built-in capacity of ten is ignored.
    pub leaderboard_capacity: usize,
    pub default_category: String,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            question_time_secs: QUESTION_TIME_SECS,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            leaderboard_capacity: LEADERBOARD_CAPACITY,
            default_category: DEFAULT_CATEGORY.to_string(),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> QuizConfig;
    fn save(&self, cfg: &QuizConfig) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> QuizConfig {
        let Ok(bytes) = fs::read(&self.path) else {
            return QuizConfig::default();
        };
        match serde_json::from_slice::<QuizConfig>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring malformed config");
                QuizConfig::default()
            }
        }
    }

    fn save(&self, cfg: &QuizConfig) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
