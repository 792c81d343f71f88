//! Persistent score store

use serde_json::Value;
use std::collections::BTreeMap;
use tg_common::{LeaderboardEntry, QuizMode};

use super::kv::{KeyValueStore, StoreError};

/// Storage key of the `{mode: best}` map
pub const HIGH_SCORES_KEY: &str = "trackGuessrHighScores";

/// Storage key of the leaderboard array
pub const LEADERBOARD_KEY: &str = "trackGuessrLeaderboard";

/// Leaderboard length
pub const LEADERBOARD_CAPACITY: usize = 10;

/// Best score per mode plus the top-10 leaderboard
///
/// Records only change through this type's methods. Every write goes through
/// [`ScoreStore::persist`], whose failures are logged and dropped.
pub struct ScoreStore<K: KeyValueStore> {
    kv: K,
    best: BTreeMap<QuizMode, u32>,
    leaderboard: Vec<LeaderboardEntry>,
}

impl<K: KeyValueStore> ScoreStore<K> {
    /// Load both records from `kv`
    ///
    /// Unreadable or malformed records are logged and replaced by empty ones.
    pub fn open(kv: K) -> Self {
        let mut best: BTreeMap<QuizMode, u32> = QuizMode::ALL.iter().map(|m| (*m, 0)).collect();
        match load_best_scores(&kv) {
            Ok(stored) => best.extend(stored),
            Err(e) => tracing::warn!(error = %e, "Failed to load high scores"),
        }

        let mut leaderboard = match load_leaderboard(&kv) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load leaderboard");
                Vec::new()
            }
        };
        sort_and_truncate(&mut leaderboard);

        Self {
            kv,
            best,
            leaderboard,
        }
    }

    /// Best score ever recorded for `mode` (0 if none)
    pub fn get_best(&self, mode: QuizMode) -> u32 {
        self.best.get(&mode).copied().unwrap_or(0)
    }

    /// Store `score` as the new best for `mode` if it beats the current one
    ///
    /// Returns whether the best changed.
    pub fn record_if_best(&mut self, mode: QuizMode, score: u32) -> bool {
        if score <= self.get_best(mode) {
            return false;
        }

        self.best.insert(mode, score);
        tracing::info!(mode = mode.key(), score, "New best score");

        let result = self.encode_best().and_then(|json| self.persist(HIGH_SCORES_KEY, &json));
        log_persist_failure(HIGH_SCORES_KEY, result);
        true
    }

    /// Add a finished round to the leaderboard
    ///
    /// Returns the 0-based rank of the new entry, or `None` if it did not make
    /// the top [`LEADERBOARD_CAPACITY`].
    pub fn append_leaderboard_entry(&mut self, mode: QuizMode, score: u32) -> Option<usize> {
        self.insert_leaderboard_entry(LeaderboardEntry::new(mode, score))
    }

    /// Add a prepared entry to the leaderboard (see [`Self::append_leaderboard_entry`])
    pub fn insert_leaderboard_entry(&mut self, entry: LeaderboardEntry) -> Option<usize> {
        // Stable sort puts the newcomer after every entry with an equal score
        let rank = self
            .leaderboard
            .iter()
            .filter(|existing| existing.score >= entry.score)
            .count();

        self.leaderboard.push(entry);
        sort_and_truncate(&mut self.leaderboard);

        let result = self
            .encode_leaderboard()
            .and_then(|json| self.persist(LEADERBOARD_KEY, &json));
        log_persist_failure(LEADERBOARD_KEY, result);

        (rank < LEADERBOARD_CAPACITY).then_some(rank)
    }

    /// Best score for every mode
    pub fn best_scores(&self) -> BTreeMap<QuizMode, u32> {
        self.best.clone()
    }

    /// Leaderboard, highest score first
    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    /// Give back the underlying storage
    pub fn into_inner(self) -> K {
        self.kv
    }

    fn persist(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.kv.set(key, value)
    }

    fn encode_best(&self) -> Result<String, StoreError> {
        serde_json::to_string(&self.best).map_err(|e| StoreError::WriteFailed(e.to_string()))
    }

    fn encode_leaderboard(&self) -> Result<String, StoreError> {
        serde_json::to_string(&self.leaderboard).map_err(|e| StoreError::WriteFailed(e.to_string()))
    }
}

fn log_persist_failure(key: &str, result: Result<(), StoreError>) {
    if let Err(e) = result {
        tracing::warn!(key, error = %e, "Score not saved; keeping it for this session only");
    }
}

fn sort_and_truncate(entries: &mut Vec<LeaderboardEntry>) {
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries.truncate(LEADERBOARD_CAPACITY);
}

fn load_best_scores<K: KeyValueStore>(kv: &K) -> Result<BTreeMap<QuizMode, u32>, StoreError> {
    let Some(raw) = kv.get(HIGH_SCORES_KEY)? else {
        return Ok(BTreeMap::new());
    };

    let stored: serde_json::Map<String, Value> =
        serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
            key: HIGH_SCORES_KEY.to_string(),
            message: e.to_string(),
        })?;

    // Unknown keys and non-numeric values are ignored
    Ok(QuizMode::ALL
        .iter()
        .filter_map(|mode| {
            let score = stored.get(mode.key())?.as_u64()?;
            Some((*mode, u32::try_from(score).unwrap_or(u32::MAX)))
        })
        .collect())
}

fn load_leaderboard<K: KeyValueStore>(kv: &K) -> Result<Vec<LeaderboardEntry>, StoreError> {
    let Some(raw) = kv.get(LEADERBOARD_KEY)? else {
        return Ok(Vec::new());
    };

    let stored: Vec<Value> = serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
        key: LEADERBOARD_KEY.to_string(),
        message: e.to_string(),
    })?;

    Ok(stored
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<LeaderboardEntry>(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed leaderboard entry");
                None
            }
        })
        .collect())
}
