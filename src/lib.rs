// Library surface for hosts that render the quiz and feed it input.
// Presentation (screens, animation, styling) lives outside this crate.
pub mod app_dirs;
pub mod bank;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod quiz;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod storage;

pub use bank::{Category, Question, QuestionBank};
pub use config::QuizConfig;
pub use error::{BankError, SessionError, StartError, StorageError, ValidationErrors};
pub use leaderboard::{AttemptResult, LeaderboardEntry, LeaderboardStore};
pub use quiz::{FinishedAttempt, Quiz, Transition};
pub use scoring::{grade, Grade, Tier};
pub use session::{Phase, Session};
