//! Quiz loading
//!
//! Fetches a mode's questions from the quiz backend and normalizes them into
//! [`Song`](tg_common::Song) records for the round engine.

mod loader;

pub use loader::{parse_quiz, HttpQuizClient, LoadError, QuizSource, SONG_ID_OFFSET};
