//! # TrackGuessr Round Engine (tg-game)
//!
//! Runs music-trivia rounds: fetches a quiz for the chosen mode, presents one
//! song at a time, scores guesses by how long the player listened and keeps
//! best scores plus a top-10 leaderboard across sessions.
//!
//! **Architecture:** a pure [`round::Session`] state machine driven by the
//! [`controller::GameController`] task, which publishes
//! [`tg_common::events::GameEvent`]s for any subscribed view.

pub mod controller;
pub mod error;
pub mod quiz;
pub mod round;
pub mod scores;
pub mod terminal;

pub use controller::{Command, ControllerConfig, GameController, GameHandle};
pub use error::{Error, Result};
