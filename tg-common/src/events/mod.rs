//! Event types for the TrackGuessr event system
//!
//! Provides the round lifecycle events and the EventBus that carries them
//! from the round engine to whatever view layer is subscribed.

mod round_types;

pub use round_types::{LoadFailureReason, MenuReturnReason};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::broadcast;

use crate::models::{LeaderboardEntry, QuizMode, Song};

/// Round lifecycle events
///
/// The view layer is a pure subscriber: everything it needs to render the
/// game arrives through these events. Serialized with a `type` tag so they can
/// be forwarded as JSON unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    /// A mode was chosen and its quiz is being fetched
    ///
    /// Triggers:
    /// - View: switch to the game screen, show loading indicator
    /// - View: reset score and streak displays to zero
    ModeStarted {
        mode: QuizMode,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A song is ready to be guessed
    ///
    /// Triggers:
    /// - View: show cover art and artist, hide the title
    /// - View: render `options` in the given order
    /// - View: load `song.audio_url` into the player (or show "no preview")
    SongLoaded {
        song: Song,
        /// Answer choices in presentation order
        options: Vec<String>,
        /// Songs left after this one
        remaining: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A guess was scored
    ///
    /// Triggers:
    /// - View: reveal the title, highlight the correct option
    /// - View: update score and streak, flash success or error
    GuessResolved {
        correct: bool,
        points_awarded: u32,
        /// Consecutive correct answers including this one
        streak: u32,
        /// Running round score
        score: u32,
        correct_title: String,
        /// Listening time the points were computed from
        listened_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The last song was answered
    ///
    /// The session returns to the menu automatically after the configured delay.
    RoundComplete {
        mode: QuizMode,
        final_score: u32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The quiz could not be started; the session is back at the menu
    LoadFailed {
        mode: QuizMode,
        reason: LoadFailureReason,
        /// Diagnostic detail (not meant for the player)
        detail: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The session is back at the mode menu
    ReturnedToMenu {
        reason: MenuReturnReason,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Best scores or leaderboard changed (also sent once at startup)
    ScoresUpdated {
        best_scores: BTreeMap<QuizMode, u32>,
        leaderboard: Vec<LeaderboardEntry>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl GameEvent {
    /// Event type name as it appears in the serialized `type` tag
    pub fn event_type(&self) -> &str {
        match self {
            GameEvent::ModeStarted { .. } => "ModeStarted",
            GameEvent::SongLoaded { .. } => "SongLoaded",
            GameEvent::GuessResolved { .. } => "GuessResolved",
            GameEvent::RoundComplete { .. } => "RoundComplete",
            GameEvent::LoadFailed { .. } => "LoadFailed",
            GameEvent::ReturnedToMenu { .. } => "ReturnedToMenu",
            GameEvent::ScoresUpdated { .. } => "ScoresUpdated",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the round engine)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use tg_common::events::{EventBus, GameEvent};
/// use tg_common::QuizMode;
///
/// let event_bus = EventBus::new(64);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit(GameEvent::ModeStarted {
///     mode: QuizMode::TopTracks,
///     timestamp: chrono::Utc::now(),
/// }).ok();
///
/// assert_eq!(rx.try_recv().unwrap().event_type(), "ModeStarted");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<GameEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered per subscriber before the
    /// oldest are dropped.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: GameEvent,
    ) -> Result<usize, broadcast::error::SendError<GameEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: GameEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode_started() -> GameEvent {
        GameEvent::ModeStarted {
            mode: QuizMode::GlobalHits,
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_emit_without_subscribers_fails() {
        let bus = EventBus::new(10);
        assert!(bus.emit(mode_started()).is_err());
        // Lossy variant just drops it
        bus.emit_lossy(mode_started());
    }

    #[test]
    fn test_eventbus_multiple_subscribers() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        assert_eq!(bus.emit(mode_started()).expect("emit should succeed"), 2);

        assert_eq!(rx1.try_recv().expect("rx1 should receive").event_type(), "ModeStarted");
        assert_eq!(rx2.try_recv().expect("rx2 should receive").event_type(), "ModeStarted");
    }

    #[test]
    fn test_eventbus_emit_lossy_on_full_channel() {
        let bus = EventBus::new(2);
        let _rx = bus.subscribe();
        for _ in 0..10 {
            bus.emit_lossy(mode_started());
        }
        assert_eq!(bus.capacity(), 2);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = GameEvent::LoadFailed {
            mode: QuizMode::TopTracks,
            reason: LoadFailureReason::BadResponse,
            detail: "HTTP 500".to_string(),
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "LoadFailed");
        assert_eq!(json["mode"], "top");
        assert_eq!(json["reason"], "BadResponse");
    }

    #[test]
    fn test_scores_updated_round_trips_mode_keys() {
        let mut best_scores = BTreeMap::new();
        best_scores.insert(QuizMode::TopTracks, 450);
        best_scores.insert(QuizMode::GlobalHits, 0);
        let event = GameEvent::ScoresUpdated {
            best_scores,
            leaderboard: vec![],
            timestamp: chrono::Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        let parsed: GameEvent = serde_json::from_str(&json).unwrap();
        match parsed {
            GameEvent::ScoresUpdated { best_scores, .. } => {
                assert_eq!(best_scores.get(&QuizMode::TopTracks), Some(&450));
            }
            other => panic!("Wrong event type deserialized: {}", other.event_type()),
        }
    }

    #[test]
    fn test_load_failure_user_messages() {
        assert_eq!(
            LoadFailureReason::EmptyQuiz.user_message(),
            "No tracks available for this mode."
        );
        assert_eq!(
            LoadFailureReason::NetworkFailure.user_message(),
            "Error contacting backend."
        );
    }
}
