//! Game controller task
//!
//! Owns the [`Session`] and the [`ScoreStore`] and is the only place either is
//! mutated. Player commands arrive over an mpsc channel. Quiz fetches and
//! the post-round delay run as spawned tasks that report back over an internal
//! channel, so every state change happens on this one task in arrival order.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tg_common::events::{EventBus, GameEvent};
use tg_common::QuizMode;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::quiz::{LoadError, QuizSource};
use crate::round::{Disposition, Effect, Input, LoadTicket, Session};
use crate::scores::{KeyValueStore, ScoreStore};
use crate::{Error, Result};

/// Player intents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SelectMode(QuizMode),
    SubmitGuess { option: String, at: Instant },
    Advance,
    PlayStarted { at: Instant },
    PlayStopped { at: Instant },
    BackToMenu,
}

/// Controller tuning
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Pause between RoundComplete and the automatic return to the menu
    pub round_reset_delay: Duration,
    /// Buffered player commands
    pub command_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            round_reset_delay: Duration::from_millis(2500),
            command_capacity: 32,
        }
    }
}

/// Results of background work, posted back to the controller
#[derive(Debug)]
enum Internal {
    QuizLoaded {
        ticket: LoadTicket,
        result: std::result::Result<Vec<tg_common::Song>, LoadError>,
    },
    ResetDue {
        generation: u64,
    },
}

/// Current instant on the tokio clock (follows paused time in tests)
fn clock_now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Round engine driver
pub struct GameController<S: QuizSource + 'static, K: KeyValueStore + 'static> {
    session: Session,
    source: Arc<S>,
    store: ScoreStore<K>,
    event_bus: EventBus,
    config: ControllerConfig,
    rng: StdRng,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,
}

impl<S: QuizSource + 'static, K: KeyValueStore + 'static> GameController<S, K> {
    pub fn new(source: Arc<S>, store: ScoreStore<K>, event_bus: EventBus, config: ControllerConfig) -> Self {
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        Self {
            session: Session::new(),
            source,
            store,
            event_bus,
            config,
            rng: StdRng::from_entropy(),
            internal_tx,
            internal_rx,
        }
    }

    /// Use a fixed option-shuffle sequence
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Start the controller on the current tokio runtime
    pub fn spawn(self) -> GameHandle {
        let (commands_tx, commands_rx) = mpsc::channel(self.config.command_capacity);
        let task = tokio::spawn(self.run(commands_rx));
        GameHandle {
            commands: commands_tx,
            task,
        }
    }

    /// Process commands until every sender is dropped
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        info!("Game controller started");
        self.publish_scores();

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(internal) = self.internal_rx.recv() => self.handle_internal(internal),
            }
        }

        info!("Game controller stopped");
    }

    fn handle_command(&mut self, command: Command) {
        debug!(?command, "Command received");
        let input = match command {
            Command::SelectMode(mode) => Input::SelectMode(mode),
            Command::SubmitGuess { option, at } => Input::SubmitGuess { option, at },
            Command::Advance => Input::Advance,
            Command::PlayStarted { at } => Input::PlayStarted { at },
            Command::PlayStopped { at } => Input::PlayStopped { at },
            Command::BackToMenu => Input::BackToMenu,
        };
        self.apply(input);
    }

    fn handle_internal(&mut self, internal: Internal) {
        let input = match internal {
            Internal::QuizLoaded { ticket, result } => Input::QuestionsReceived { ticket, result },
            Internal::ResetDue { generation } => Input::RoundResetDue { generation },
        };
        self.apply(input);
    }

    fn apply(&mut self, input: Input) {
        let session = std::mem::take(&mut self.session);
        let outcome = session.step(input, &mut self.rng);
        self.session = outcome.session;

        if let Disposition::Ignored(reason) = outcome.disposition {
            debug!(phase = ?self.session.phase(), reason, "Input ignored");
            return;
        }

        for event in outcome.events {
            debug!(event = event.event_type(), "Emitting event");
            self.event_bus.emit_lossy(event);
        }
        for effect in outcome.effects {
            self.execute(effect);
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::FetchQuiz(ticket) => {
                info!(mode = ticket.mode.key(), "Loading quiz");
                let source = Arc::clone(&self.source);
                let tx = self.internal_tx.clone();
                tokio::spawn(async move {
                    let result = source.load_quiz(ticket.mode).await;
                    // Receiver only goes away when the controller has stopped
                    let _ = tx.send(Internal::QuizLoaded { ticket, result });
                });
            }
            Effect::ScheduleReset { generation } => {
                let delay = self.config.round_reset_delay;
                let tx = self.internal_tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(Internal::ResetDue { generation });
                });
            }
            Effect::Finalize { mode, score } => self.finalize(mode, score),
        }
    }

    fn finalize(&mut self, mode: QuizMode, score: u32) {
        let new_best = self.store.record_if_best(mode, score);
        let rank = self.store.append_leaderboard_entry(mode, score);
        info!(mode = mode.key(), score, new_best, ?rank, "Round recorded");
        self.publish_scores();
    }

    fn publish_scores(&self) {
        self.event_bus.emit_lossy(GameEvent::ScoresUpdated {
            best_scores: self.store.best_scores(),
            leaderboard: self.store.leaderboard().to_vec(),
            timestamp: tg_common::time::now(),
        });
    }
}

/// Handle to a spawned [`GameController`]
pub struct GameHandle {
    commands: mpsc::Sender<Command>,
    task: JoinHandle<()>,
}

impl GameHandle {
    pub async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::ControllerStopped)
    }

    pub async fn select_mode(&self, mode: QuizMode) -> Result<()> {
        self.send(Command::SelectMode(mode)).await
    }

    /// Guess `option` for the current song, timestamped now
    pub async fn submit_guess(&self, option: impl Into<String>) -> Result<()> {
        self.send(Command::SubmitGuess {
            option: option.into(),
            at: clock_now(),
        })
        .await
    }

    pub async fn advance(&self) -> Result<()> {
        self.send(Command::Advance).await
    }

    /// Report that the preview started playing
    pub async fn play_started(&self) -> Result<()> {
        self.send(Command::PlayStarted { at: clock_now() }).await
    }

    /// Report that the preview paused or ended
    pub async fn play_stopped(&self) -> Result<()> {
        self.send(Command::PlayStopped { at: clock_now() }).await
    }

    pub async fn back_to_menu(&self) -> Result<()> {
        self.send(Command::BackToMenu).await
    }

    /// Stop accepting commands and wait for the controller to exit
    pub async fn shutdown(self) -> Result<()> {
        drop(self.commands);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Game controller task failed");
            return Err(Error::ControllerStopped);
        }
        Ok(())
    }
}
