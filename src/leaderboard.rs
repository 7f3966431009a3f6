//! Ranked, capacity-bounded record of finished attempts.
//!
//! The list lives in memory and every mutation is written through to a
//! [`Storage`] under [`LEADERBOARD_KEY`] as a JSON array. Mutations take
//! `&mut self`, so the read-modify-write-persist sequence has a single writer;
//! hosts that share a store across threads wrap it in a `Mutex`.

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::QuizConfig;
use crate::error::StorageError;
use crate::scoring;
use crate::storage::Storage;

pub const LEADERBOARD_KEY: &str = "quizLeaderboard";
pub const LEADERBOARD_CAPACITY: usize = 10;

/// Snapshot of a finished attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptResult {
    pub player_name: String,
    pub score: u32,
    pub total: u32,
    pub category: String,
    pub percentage: u32,
    pub passed: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: Uuid,
    #[serde(flatten)]
    pub result: AttemptResult,
}

impl LeaderboardEntry {
    pub fn percentage(&self) -> u32 {
        self.result.percentage
    }
}

#[derive(Debug)]
pub struct LeaderboardStore<S: Storage> {
    storage: S,
    entries: Vec<LeaderboardEntry>,
    capacity: usize,
    pass_threshold: u32,
}

impl<S: Storage> LeaderboardStore<S> {
    pub fn open(storage: S, config: &QuizConfig) -> Self {
        let mut store = Self {
            storage,
            entries: Vec::new(),
            capacity: config.leaderboard_capacity.min(LEADERBOARD_CAPACITY),
            pass_threshold: config.pass_threshold,
        };
        store.load();
        store
    }

    /// Re-read the persisted list. Missing or malformed data yields an empty board.
    pub fn load(&mut self) -> &[LeaderboardEntry] {
        self.entries = match self.storage.get(LEADERBOARD_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<LeaderboardEntry>>(&raw) {
                Ok(entries) => rank(entries, self.capacity),
                Err(e) => {
                    warn!(error = %e, "discarding malformed leaderboard data");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "unable to read leaderboard");
                Vec::new()
            }
        };
        &self.entries
    }

    /// Add a finished attempt, keep the best `capacity` entries and persist.
    pub fn record(
        &mut self,
        name: &str,
        score: u32,
        total: u32,
        category: &str,
    ) -> LeaderboardEntry {
        let score = score.min(total);
        let grade = scoring::grade(score, total, self.pass_threshold);
        let entry = LeaderboardEntry {
            id: Uuid::new_v4(),
            result: AttemptResult {
                player_name: name.trim().to_string(),
                score,
                total,
                category: category.to_string(),
                percentage: grade.percentage,
                passed: grade.passed,
                timestamp: Utc::now(),
            },
        };

        let mut entries = std::mem::take(&mut self.entries);
        entries.push(entry.clone());
        self.entries = rank(entries, self.capacity);
        info!(
            player = %entry.result.player_name,
            percentage = entry.result.percentage,
            rank = ?self.rank_of(entry.id),
            "leaderboard entry recorded"
        );
        self.persist();
        entry
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        info!("leaderboard cleared");
        self.persist();
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Zero-based position of an entry, if it made the board.
    pub fn rank_of(&self, id: Uuid) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn persist(&mut self) {
        let result = serde_json::to_string(&self.entries)
            .map_err(StorageError::from)
            .and_then(|json| self.storage.set(LEADERBOARD_KEY, &json));
        if let Err(e) = result {
            warn!(error = %e, "unable to persist leaderboard");
        }
    }
}

// Stable: equal percentages keep insertion order.
fn rank(entries: Vec<LeaderboardEntry>, capacity: usize) -> Vec<LeaderboardEntry> {
    entries
        .into_iter()
        .sorted_by(|a, b| b.percentage().cmp(&a.percentage()))
        .take(capacity)
        .collect()
}
