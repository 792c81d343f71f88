//! Shared fixtures for tg-game integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tg_common::events::{EventBus, GameEvent};
use tg_common::{QuizMode, Song};
use tg_game::quiz::{LoadError, QuizSource};
use tg_game::scores::{KeyValueStore, ScoreStore, StoreError};
use tg_game::{ControllerConfig, GameController, GameHandle};
use tokio::sync::{broadcast, oneshot};

/// One scripted quiz response
struct Scripted {
    gate: Option<oneshot::Receiver<()>>,
    result: Result<Vec<Song>, LoadError>,
}

/// Quiz source that replays scripted responses per mode
///
/// A gated response is held back until its release handle fires.
#[derive(Default)]
pub struct StubSource {
    responses: Mutex<HashMap<QuizMode, VecDeque<Scripted>>>,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, mode: QuizMode, result: Result<Vec<Song>, LoadError>) {
        self.push(mode, Scripted { gate: None, result });
    }

    /// Script a response that waits for the returned sender
    pub fn respond_gated(
        &self,
        mode: QuizMode,
        result: Result<Vec<Song>, LoadError>,
    ) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.push(mode, Scripted { gate: Some(gate), result });
        release
    }

    fn push(&self, mode: QuizMode, scripted: Scripted) {
        self.responses
            .lock()
            .unwrap()
            .entry(mode)
            .or_default()
            .push_back(scripted);
    }
}

#[async_trait]
impl QuizSource for StubSource {
    async fn load_quiz(&self, mode: QuizMode) -> Result<Vec<Song>, LoadError> {
        let scripted = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&mode)
            .and_then(VecDeque::pop_front);

        let Some(scripted) = scripted else {
            return Err(LoadError::NetworkFailure("no scripted response".to_string()));
        };
        if let Some(gate) = scripted.gate {
            let _ = gate.await;
        }
        scripted.result
    }
}

/// In-memory storage shared with the test so writes can be inspected
#[derive(Clone, Default)]
pub struct SharedKv {
    inner: Arc<Mutex<HashMap<String, String>>>,
}

impl SharedKv {
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.lock().unwrap().get(key).cloned()
    }
}

impl KeyValueStore for SharedKv {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.inner.lock().unwrap().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.inner.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Storage where every call fails
pub struct FailingKv;

impl KeyValueStore for FailingKv {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("storage disabled".to_string()))
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::WriteFailed("quota exceeded".to_string()))
    }
}

pub fn song(id: u32, title: &str, decoys: &[&str]) -> Song {
    let mut options = vec![title.to_string()];
    options.extend(decoys.iter().map(|d| d.to_string()));
    Song::new(id, title, "Test Artist", options)
}

/// Start a controller and subscribe to it before it publishes anything
pub fn start<K: KeyValueStore + 'static>(
    source: Arc<StubSource>,
    kv: K,
) -> (GameHandle, broadcast::Receiver<GameEvent>) {
    let bus = EventBus::new(256);
    let events = bus.subscribe();
    let handle = GameController::new(
        source,
        ScoreStore::open(kv),
        bus,
        ControllerConfig {
            round_reset_delay: Duration::from_millis(2500),
            command_capacity: 32,
        },
    )
    .spawn();
    (handle, events)
}

/// Receive events until one of type `event_type` arrives
///
/// Returns every event received, the match last.
pub async fn events_until(
    events: &mut broadcast::Receiver<GameEvent>,
    event_type: &str,
) -> Vec<GameEvent> {
    let mut seen = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(30), events.recv())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {}", event_type))
            .expect("event bus closed");
        let done = event.event_type() == event_type;
        seen.push(event);
        if done {
            return seen;
        }
    }
}

/// Event types in order
pub fn types(events: &[GameEvent]) -> Vec<&str> {
    events.iter().map(GameEvent::event_type).collect()
}
