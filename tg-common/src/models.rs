//! Domain models shared between the round engine and its front-ends

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Quiz mode selectable from the main menu
///
/// Serialized as the short keys the persisted score maps use (`"top"`, `"global"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuizMode {
    /// Quiz built from the signed-in listener's own top tracks
    #[serde(rename = "top")]
    TopTracks,
    /// Quiz built from a popular global playlist
    #[serde(rename = "global")]
    GlobalHits,
}

impl QuizMode {
    /// All modes, in menu order
    pub const ALL: [QuizMode; 2] = [QuizMode::TopTracks, QuizMode::GlobalHits];

    /// Short key used in persisted score maps and on the command line
    pub fn key(&self) -> &'static str {
        match self {
            QuizMode::TopTracks => "top",
            QuizMode::GlobalHits => "global",
        }
    }

    /// Backend path serving this mode's quiz
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            QuizMode::TopTracks => "/api/quiz/top-tracks",
            QuizMode::GlobalHits => "/api/quiz/global-hits",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            QuizMode::TopTracks => "Top Tracks",
            QuizMode::GlobalHits => "Global Hits",
        }
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for QuizMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" | "top-tracks" | "toptracks" => Ok(QuizMode::TopTracks),
            "global" | "global-hits" | "globalhits" => Ok(QuizMode::GlobalHits),
            other => Err(Error::InvalidInput(format!("Unknown quiz mode: {}", other))),
        }
    }
}

/// One quiz question, normalized for play
///
/// `options` always contains `title` exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    /// Synthetic id, stable within one load (UI keying only)
    pub id: u32,
    /// Canonical answer
    pub title: String,
    pub artist: String,
    /// Preview clip URL
    pub audio_url: Option<String>,
    /// Cover art URL
    pub image_url: Option<String>,
    /// Answer choices in backend order
    pub options: Vec<String>,
}

impl Song {
    /// Build a song, repairing `options` so the title appears exactly once
    pub fn new(
        id: u32,
        title: impl Into<String>,
        artist: impl Into<String>,
        options: Vec<String>,
    ) -> Self {
        let title = title.into();
        let options = Self::normalize_options(&title, options);
        Self {
            id,
            title,
            artist: artist.into(),
            audio_url: None,
            image_url: None,
            options,
        }
    }

    /// Attach a preview clip URL (empty strings count as no preview)
    pub fn with_audio_url(mut self, url: Option<String>) -> Self {
        self.audio_url = url.filter(|u| !u.trim().is_empty());
        self
    }

    /// Attach a cover art URL (empty strings count as no image)
    pub fn with_image_url(mut self, url: Option<String>) -> Self {
        self.image_url = url.filter(|u| !u.trim().is_empty());
        self
    }

    /// Whether a preview clip can be played for this song
    pub fn has_preview(&self) -> bool {
        self.audio_url.is_some()
    }

    /// Whether `option` is the right answer
    pub fn is_correct(&self, option: &str) -> bool {
        option == self.title
    }

    fn normalize_options(title: &str, options: Vec<String>) -> Vec<String> {
        let mut seen_title = false;
        let mut normalized: Vec<String> = options
            .into_iter()
            .filter(|option| {
                if option == title {
                    let keep = !seen_title;
                    seen_title = true;
                    keep
                } else {
                    true
                }
            })
            .collect();

        if !seen_title {
            normalized.insert(0, title.to_string());
        }
        normalized
    }
}

/// One finished round on the local leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub mode: QuizMode,
    pub score: u32,
    /// When the round was recorded (epoch milliseconds on disk)
    #[serde(rename = "ts", with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl LeaderboardEntry {
    pub fn new(mode: QuizMode, score: u32) -> Self {
        Self {
            mode,
            score,
            timestamp: crate::time::now(),
        }
    }
}
