//! # TrackGuessr Common Library
//!
//! Shared code for the TrackGuessr round engine and its front-ends:
//! - Domain models (quiz modes, songs, leaderboard entries)
//! - Event types (GameEvent enum) and the EventBus
//! - Configuration loading and resolution
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod time;

pub use error::{Error, Result};
pub use models::{LeaderboardEntry, QuizMode, Song};
