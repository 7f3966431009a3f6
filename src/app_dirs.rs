use directories::ProjectDirs;
use std::path::PathBuf;

const APP_NAME: &str = "quizzer";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Leaderboard database under $HOME/.local/state/quizzer, or the platform data dir
    pub fn db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME);
            Some(state_dir.join("quizzer.db"))
        } else {
            ProjectDirs::from("", "", APP_NAME)
                .map(|proj_dirs| proj_dirs.data_local_dir().join("quizzer.db"))
        }
    }

    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("quizzer_config.json"))
    }
}
