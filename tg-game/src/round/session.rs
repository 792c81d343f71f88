//! Round session state machine
//!
//! `Idle → Loading → Playing → Answered → … → RoundComplete → Idle`
//!
//! [`Session`] is a plain value. [`Session::step`] consumes it together with
//! one [`Input`] and returns the next session, the events to publish and the
//! side effects the caller has to carry out. Nothing in here performs I/O or
//! reads the clock.

use rand::Rng;
use std::collections::VecDeque;
use std::time::Instant;
use tg_common::events::{GameEvent, MenuReturnReason};
use tg_common::time::now;
use tg_common::{QuizMode, Song};

use super::clock::ListenClock;
use super::scoring;
use super::shuffle::shuffle_with;
use crate::quiz::LoadError;

/// Where the session is in the round lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// At the mode menu
    #[default]
    Idle,
    /// Quiz fetch in flight
    Loading,
    /// Song presented, waiting for a guess
    Playing,
    /// Guess scored, waiting for "next"
    Answered,
    /// Queue exhausted, waiting for the automatic return to the menu
    RoundComplete,
}

/// Identifies one quiz fetch so late responses can be recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub mode: QuizMode,
    pub generation: u64,
}

/// Everything that can happen to a session
#[derive(Debug)]
pub enum Input {
    SelectMode(QuizMode),
    QuestionsReceived {
        ticket: LoadTicket,
        result: Result<Vec<Song>, LoadError>,
    },
    SubmitGuess {
        option: String,
        at: Instant,
    },
    Advance,
    PlayStarted {
        at: Instant,
    },
    PlayStopped {
        at: Instant,
    },
    /// The post-round delay scheduled for `generation` ran out
    RoundResetDue {
        generation: u64,
    },
    BackToMenu,
}

/// Work the session asks its owner to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the quiz and feed the result back as `Input::QuestionsReceived`
    FetchQuiz(LoadTicket),
    /// After the post-round delay, feed back `Input::RoundResetDue`
    ScheduleReset { generation: u64 },
    /// Record a finished round's score
    Finalize { mode: QuizMode, score: u32 },
}

/// Whether an input changed anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Applied,
    /// Not valid in the current phase, or stale; the session is unchanged
    Ignored(&'static str),
}

/// Result of one [`Session::step`]
#[derive(Debug)]
pub struct Outcome {
    pub session: Session,
    pub events: Vec<GameEvent>,
    pub effects: Vec<Effect>,
    pub disposition: Disposition,
}

impl Outcome {
    fn applied(session: Session) -> Self {
        Self {
            session,
            events: Vec::new(),
            effects: Vec::new(),
            disposition: Disposition::Applied,
        }
    }

    fn ignored(session: Session, reason: &'static str) -> Self {
        Self {
            session,
            events: Vec::new(),
            effects: Vec::new(),
            disposition: Disposition::Ignored(reason),
        }
    }

    fn event(mut self, event: GameEvent) -> Self {
        self.events.push(event);
        self
    }

    fn effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn is_applied(&self) -> bool {
        self.disposition == Disposition::Applied
    }
}

/// State of the current round
#[derive(Debug, Clone, Default)]
pub struct Session {
    phase: Phase,
    mode: Option<QuizMode>,
    queue: VecDeque<Song>,
    current_song: Option<Song>,
    current_options: Vec<String>,
    score: u32,
    streak: u32,
    clock: ListenClock,
    /// Bumped whenever a round is started or abandoned
    generation: u64,
}

impl Session {
    /// Empty session at the menu
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> Option<QuizMode> {
        self.mode
    }

    pub fn current_song(&self) -> Option<&Song> {
        self.current_song.as_ref()
    }

    /// Options of the current song in presentation order
    pub fn current_options(&self) -> &[String] {
        &self.current_options
    }

    /// Songs still waiting after the current one
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Listening time of the current song as of `at`
    pub fn listened_ms(&self, at: Instant) -> u64 {
        self.clock.elapsed_ms(at)
    }

    /// Apply one input
    ///
    /// `rng` is only used to shuffle the options of the next song.
    pub fn step<R: Rng + ?Sized>(self, input: Input, rng: &mut R) -> Outcome {
        match input {
            Input::SelectMode(mode) => self.select_mode(mode),
            Input::QuestionsReceived { ticket, result } => {
                self.questions_received(ticket, result, rng)
            }
            Input::SubmitGuess { option, at } => self.submit_guess(option, at),
            Input::Advance => self.advance(rng),
            Input::PlayStarted { at } => self.play_edge(at, true),
            Input::PlayStopped { at } => self.play_edge(at, false),
            Input::RoundResetDue { generation } => self.round_reset_due(generation),
            Input::BackToMenu => self.back_to_menu(),
        }
    }

    fn select_mode(mut self, mode: QuizMode) -> Outcome {
        if self.phase != Phase::Idle {
            return Outcome::ignored(self, "a round is already in progress");
        }

        self = self.cleared();
        self.phase = Phase::Loading;
        self.mode = Some(mode);
        let ticket = LoadTicket {
            mode,
            generation: self.generation,
        };

        Outcome::applied(self)
            .event(GameEvent::ModeStarted {
                mode,
                timestamp: now(),
            })
            .effect(Effect::FetchQuiz(ticket))
    }

    fn questions_received<R: Rng + ?Sized>(
        mut self,
        ticket: LoadTicket,
        result: Result<Vec<Song>, LoadError>,
        rng: &mut R,
    ) -> Outcome {
        let expected = LoadTicket {
            mode: match self.mode {
                Some(mode) => mode,
                None => return Outcome::ignored(self, "stale quiz response"),
            },
            generation: self.generation,
        };
        if self.phase != Phase::Loading || ticket != expected {
            return Outcome::ignored(self, "stale quiz response");
        }

        let songs = match result {
            Ok(songs) if !songs.is_empty() => songs,
            Ok(_) => return self.load_failed(ticket.mode, LoadError::EmptyQuiz),
            Err(e) => return self.load_failed(ticket.mode, e),
        };

        self.queue = songs.into();
        self.next_song(rng)
    }

    fn load_failed(mut self, mode: QuizMode, error: LoadError) -> Outcome {
        self.phase = Phase::Idle;
        self.mode = None;

        Outcome::applied(self).event(GameEvent::LoadFailed {
            mode,
            reason: error.reason(),
            detail: error.to_string(),
            timestamp: now(),
        })
    }

    fn submit_guess(mut self, option: String, at: Instant) -> Outcome {
        if self.phase != Phase::Playing {
            return Outcome::ignored(self, "no song is waiting for a guess");
        }
        let Some(song) = self.current_song.as_ref() else {
            return Outcome::ignored(self, "no song is waiting for a guess");
        };

        // Answer reveal pauses playback
        self.clock.on_play_stop(at);
        let listened_ms = self.clock.elapsed_ms(at);

        let correct = song.is_correct(&option);
        let correct_title = song.title.clone();
        let points = scoring::score(correct, listened_ms);

        self.score = self.score.saturating_add(points);
        self.streak = if correct { self.streak + 1 } else { 0 };
        self.phase = Phase::Answered;

        let event = GameEvent::GuessResolved {
            correct,
            points_awarded: points,
            streak: self.streak,
            score: self.score,
            correct_title,
            listened_ms,
            timestamp: now(),
        };
        Outcome::applied(self).event(event)
    }

    fn advance<R: Rng + ?Sized>(self, rng: &mut R) -> Outcome {
        if self.phase != Phase::Answered {
            return Outcome::ignored(self, "current song has not been answered");
        }
        self.next_song(rng)
    }

    /// Present the next queued song, or finish the round if there is none
    fn next_song<R: Rng + ?Sized>(mut self, rng: &mut R) -> Outcome {
        self.clock.reset();

        let Some(song) = self.queue.pop_front() else {
            return self.complete_round();
        };

        self.current_options = shuffle_with(&song.options, rng);
        self.phase = Phase::Playing;

        let event = GameEvent::SongLoaded {
            song: song.clone(),
            options: self.current_options.clone(),
            remaining: self.queue.len(),
            timestamp: now(),
        };
        self.current_song = Some(song);
        Outcome::applied(self).event(event)
    }

    fn complete_round(mut self) -> Outcome {
        let Some(mode) = self.mode else {
            return Outcome::ignored(self, "no mode selected");
        };

        self.phase = Phase::RoundComplete;
        self.current_song = None;
        self.current_options.clear();
        let generation = self.generation;
        let final_score = self.score;

        Outcome::applied(self)
            .event(GameEvent::RoundComplete {
                mode,
                final_score,
                timestamp: now(),
            })
            .effect(Effect::ScheduleReset { generation })
    }

    fn play_edge(mut self, at: Instant, started: bool) -> Outcome {
        if self.phase != Phase::Playing {
            return Outcome::ignored(self, "no song is playing");
        }
        if started {
            self.clock.on_play_start(at);
        } else {
            self.clock.on_play_stop(at);
        }
        Outcome::applied(self)
    }

    fn round_reset_due(self, generation: u64) -> Outcome {
        if self.phase != Phase::RoundComplete || generation != self.generation {
            return Outcome::ignored(self, "stale round reset");
        }
        let Some(mode) = self.mode else {
            return Outcome::ignored(self, "stale round reset");
        };

        let score = self.score;
        Outcome::applied(self.cleared())
            .effect(Effect::Finalize { mode, score })
            .event(GameEvent::ReturnedToMenu {
                reason: MenuReturnReason::RoundFinished,
                timestamp: now(),
            })
    }

    fn back_to_menu(self) -> Outcome {
        Outcome::applied(self.cleared()).event(GameEvent::ReturnedToMenu {
            reason: MenuReturnReason::UserExit,
            timestamp: now(),
        })
    }

    /// Empty Idle session; in-flight fetches and pending resets become stale
    fn cleared(self) -> Session {
        Session {
            generation: self.generation.wrapping_add(1),
            ..Session::default()
        }
    }
}
