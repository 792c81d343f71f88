//! Round engine: listening clock, scoring, option shuffling and the session
//! state machine that ties them together.

pub mod clock;
pub mod scoring;
pub mod session;
pub mod shuffle;

pub use clock::ListenClock;
pub use scoring::score;
pub use session::{Disposition, Effect, Input, LoadTicket, Outcome, Phase, Session};
pub use shuffle::{shuffle, shuffle_with};
