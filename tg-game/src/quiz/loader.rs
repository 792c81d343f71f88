//! Quiz backend client
//!
//! One credentialed `GET` per quiz. The backend answers with
//! `{ "questions": [ { "correct", "artist", "audio_url"?, "image"?, "options"? } ] }`.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tg_common::events::LoadFailureReason;
use tg_common::{QuizMode, Song};

/// First synthetic song id of every load
pub const SONG_ID_OFFSET: u32 = 1000;

const USER_AGENT: &str = concat!("tg-game/", env!("CARGO_PKG_VERSION"));

/// Quiz load failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// Transport failure or a body that is not JSON
    #[error("Network error: {0}")]
    NetworkFailure(String),

    /// Non-success status or a body without a question list
    #[error("Bad response: {0}")]
    BadResponse(String),

    /// The question list held nothing playable
    #[error("Quiz contains no questions")]
    EmptyQuiz,
}

impl LoadError {
    /// Category reported to the view layer
    pub fn reason(&self) -> LoadFailureReason {
        match self {
            LoadError::NetworkFailure(_) => LoadFailureReason::NetworkFailure,
            LoadError::BadResponse(_) => LoadFailureReason::BadResponse,
            LoadError::EmptyQuiz => LoadFailureReason::EmptyQuiz,
        }
    }
}

/// Anything that can produce the songs for a quiz mode
#[async_trait]
pub trait QuizSource: Send + Sync {
    /// Fetch and normalize the questions for `mode`
    ///
    /// Returns at least one song on success.
    async fn load_quiz(&self, mode: QuizMode) -> Result<Vec<Song>, LoadError>;
}

/// HTTP client for the quiz backend
pub struct HttpQuizClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpQuizClient {
    /// Create a client for the backend at `base_url`
    ///
    /// The client keeps a cookie store so the backend's login session is sent
    /// with every quiz request.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> crate::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| crate::Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Full URL of the quiz endpoint for `mode`
    pub fn endpoint_url(&self, mode: QuizMode) -> String {
        format!("{}{}", self.base_url, mode.endpoint_path())
    }
}

#[async_trait]
impl QuizSource for HttpQuizClient {
    async fn load_quiz(&self, mode: QuizMode) -> Result<Vec<Song>, LoadError> {
        let url = self.endpoint_url(mode);
        tracing::debug!(mode = mode.key(), url = %url, "Requesting quiz");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| LoadError::NetworkFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::BadResponse(format!("HTTP {}", status.as_u16())));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LoadError::NetworkFailure(format!("Unreadable quiz body: {}", e)))?;

        let songs = parse_quiz(&body)?;
        tracing::info!(mode = mode.key(), songs = songs.len(), "Quiz loaded");
        Ok(songs)
    }
}

/// Normalize a quiz response body into songs
///
/// Questions without a usable `correct` title are skipped. Ids are
/// [`SONG_ID_OFFSET`] plus the question's position in the response.
pub fn parse_quiz(body: &Value) -> Result<Vec<Song>, LoadError> {
    let questions = match body.get("questions") {
        None | Some(Value::Null) => {
            return Err(LoadError::BadResponse("missing questions list".to_string()))
        }
        Some(Value::Array(questions)) => questions,
        Some(_) => return Err(LoadError::BadResponse("questions is not a list".to_string())),
    };

    let songs: Vec<Song> = questions
        .iter()
        .enumerate()
        .filter_map(|(index, question)| {
            let song = parse_question(index, question);
            if song.is_none() {
                tracing::warn!(index, "Skipping quiz question without a title");
            }
            song
        })
        .collect();

    if songs.is_empty() {
        return Err(LoadError::EmptyQuiz);
    }
    Ok(songs)
}

fn parse_question(index: usize, question: &Value) -> Option<Song> {
    let title = question
        .get("correct")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())?;

    let artist = question.get("artist").and_then(Value::as_str).unwrap_or_default();

    let options = match question.get("options") {
        Some(Value::Array(options)) => options
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    let id = SONG_ID_OFFSET.saturating_add(u32::try_from(index).unwrap_or(u32::MAX));

    Some(
        Song::new(id, title, artist, options)
            .with_audio_url(string_field(question, "audio_url"))
            .with_image_url(string_field(question, "image")),
    )
}

fn string_field(question: &Value, key: &str) -> Option<String> {
    question.get(key).and_then(Value::as_str).map(str::to_string)
}
