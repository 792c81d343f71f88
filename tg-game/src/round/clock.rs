//! Listening-time clock
//!
//! Accumulates how long the current preview has actually been playing,
//! across any number of pause/resume cycles. Timestamps are supplied by the
//! caller so the clock itself never reads the system time.

use std::time::Instant;
use tg_common::time::millis_between;

/// Cumulative listening time for one song
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenClock {
    accumulated_ms: u64,
    running_since: Option<Instant>,
}

impl ListenClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Playback started. No-op if already running.
    pub fn on_play_start(&mut self, now: Instant) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    /// Playback stopped. No-op if not running.
    pub fn on_play_stop(&mut self, now: Instant) {
        if let Some(since) = self.running_since.take() {
            self.accumulated_ms = self.accumulated_ms.saturating_add(millis_between(since, now));
        }
    }

    /// Total listened time as of `now`, including a span still running
    pub fn elapsed_ms(&self, now: Instant) -> u64 {
        match self.running_since {
            Some(since) => self.accumulated_ms.saturating_add(millis_between(since, now)),
            None => self.accumulated_ms,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Zero the clock for a new song
    pub fn reset(&mut self) {
        self.accumulated_ms = 0;
        self.running_since = None;
    }
}
