//! Best scores and the local leaderboard
//!
//! [`ScoreStore`] owns both records and writes them through a
//! [`KeyValueStore`]. Storage problems are logged and swallowed: the in-memory
//! records stay correct for the rest of the session even when nothing can be
//! written.

mod kv;
mod store;

pub use kv::{FileKv, KeyValueStore, MemoryKv, StoreError};
pub use store::{ScoreStore, HIGH_SCORES_KEY, LEADERBOARD_CAPACITY, LEADERBOARD_KEY};
