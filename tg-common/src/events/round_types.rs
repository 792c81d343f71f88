//! Round outcome type definitions
//!
//! Supporting types carried by round lifecycle events.

use serde::{Deserialize, Serialize};

/// Why a quiz could not be started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum LoadFailureReason {
    /// Transport failure or unparseable body
    NetworkFailure,
    /// Non-success HTTP status or missing question list
    BadResponse,
    /// Valid response without any usable question
    EmptyQuiz,
}

impl LoadFailureReason {
    /// Message suitable for showing to the player
    pub fn user_message(&self) -> &'static str {
        match self {
            LoadFailureReason::NetworkFailure | LoadFailureReason::BadResponse => {
                "Error contacting backend."
            }
            LoadFailureReason::EmptyQuiz => "No tracks available for this mode.",
        }
    }
}

impl std::fmt::Display for LoadFailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadFailureReason::NetworkFailure => write!(f, "NetworkFailure"),
            LoadFailureReason::BadResponse => write!(f, "BadResponse"),
            LoadFailureReason::EmptyQuiz => write!(f, "EmptyQuiz"),
        }
    }
}

/// Why the session went back to the mode menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum MenuReturnReason {
    /// Round finished and was recorded
    RoundFinished,
    /// Player left the round; nothing was recorded
    UserExit,
}

impl std::fmt::Display for MenuReturnReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MenuReturnReason::RoundFinished => write!(f, "RoundFinished"),
            MenuReturnReason::UserExit => write!(f, "UserExit"),
        }
    }
}
