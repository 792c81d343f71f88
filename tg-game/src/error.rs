//! Error types for tg-game
//!
//! Load and persistence failures have their own enums next to the code that
//! raises them; this type gathers them for callers that want one `Result`.

use thiserror::Error;

use crate::quiz::LoadError;
use crate::scores::StoreError;

/// Main error type for the round engine
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid engine configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Quiz could not be loaded
    #[error("Quiz load error: {0}")]
    Load(#[from] LoadError),

    /// Score storage read/write failed
    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// Shared library error (config files, JSON)
    #[error(transparent)]
    Common(#[from] tg_common::Error),

    /// The controller task has exited and no longer accepts commands
    #[error("Game controller stopped")]
    ControllerStopped,
}

/// Convenience Result type using tg-game Error
pub type Result<T> = std::result::Result<T, Error>;
