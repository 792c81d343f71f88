//! Line-oriented terminal front-end
//!
//! Subscribes to [`GameEvent`]s, renders them as text and turns typed lines
//! into controller commands. There is no audio output: `p` toggles a
//! simulated preview so the listening clock behaves as it would with a real
//! player attached.

use std::collections::BTreeMap;
use tg_common::events::{GameEvent, MenuReturnReason};
use tg_common::{LeaderboardEntry, QuizMode};

use crate::controller::GameHandle;
use crate::Result;

/// What a typed line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SelectMode(QuizMode),
    Guess(String),
    TogglePlay,
    Next,
    Menu,
    Scores,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Loading,
    Guessing,
    Answered,
    Finished,
}

/// Terminal view state
#[derive(Debug)]
pub struct TerminalView {
    screen: Screen,
    options: Vec<String>,
    /// Current song has a preview clip
    has_preview: bool,
    playing: bool,
    best_scores: BTreeMap<QuizMode, u32>,
    leaderboard: Vec<LeaderboardEntry>,
}

impl Default for TerminalView {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalView {
    pub fn new() -> Self {
        Self {
            screen: Screen::Menu,
            options: Vec::new(),
            has_preview: false,
            playing: false,
            best_scores: BTreeMap::new(),
            leaderboard: Vec::new(),
        }
    }

    /// Interpret one input line in the context of the current screen
    ///
    /// Returns `Err` with a hint for the player when the line means nothing.
    pub fn parse(&self, line: &str) -> std::result::Result<Action, String> {
        let input = line.trim();
        match input.to_ascii_lowercase().as_str() {
            "q" | "quit" | "exit" => return Ok(Action::Quit),
            "h" | "help" | "?" => return Ok(Action::Help),
            "s" | "scores" => return Ok(Action::Scores),
            "m" | "menu" => return Ok(Action::Menu),
            _ => {}
        }

        match self.screen {
            Screen::Menu => match input {
                "1" => Ok(Action::SelectMode(QuizMode::TopTracks)),
                "2" => Ok(Action::SelectMode(QuizMode::GlobalHits)),
                other => other
                    .parse::<QuizMode>()
                    .map(Action::SelectMode)
                    .map_err(|_| "Pick a mode: 1 (top) or 2 (global)".to_string()),
            },
            Screen::Guessing => match input {
                "p" | "P" if self.has_preview => Ok(Action::TogglePlay),
                "p" | "P" => Err(NO_PREVIEW_HINT.to_string()),
                other => self.option_by_number(other).map(Action::Guess),
            },
            Screen::Answered => match input {
                "n" | "N" | "" => Ok(Action::Next),
                _ => Err("Press n for the next song".to_string()),
            },
            Screen::Loading | Screen::Finished => Err("Please wait...".to_string()),
        }
    }

    fn option_by_number(&self, input: &str) -> std::result::Result<String, String> {
        let hint = || format!("Type 1-{} to guess, or p to play/pause", self.options.len());
        let index: usize = input.parse().map_err(|_| hint())?;
        index
            .checked_sub(1)
            .and_then(|i| self.options.get(i))
            .cloned()
            .ok_or_else(hint)
    }

    /// Carry out an action against the controller
    ///
    /// Returns `Ok(false)` once the player asked to quit.
    pub async fn dispatch(&mut self, action: Action, handle: &GameHandle) -> Result<bool> {
        match action {
            Action::SelectMode(mode) => handle.select_mode(mode).await?,
            Action::Guess(option) => handle.submit_guess(option).await?,
            Action::TogglePlay => {
                self.playing = !self.playing;
                if self.playing {
                    println!("▶ playing preview");
                    handle.play_started().await?;
                } else {
                    println!("⏸ paused");
                    handle.play_stopped().await?;
                }
            }
            Action::Next => handle.advance().await?,
            Action::Menu => handle.back_to_menu().await?,
            Action::Scores => println!("{}", self.render_scores().join("\n")),
            Action::Help => println!("{}", help_text()),
            Action::Quit => return Ok(false),
        }
        Ok(true)
    }

    /// Update the view from an event and return the lines to print
    pub fn render(&mut self, event: &GameEvent) -> Vec<String> {
        match event {
            GameEvent::ModeStarted { mode, .. } => {
                self.screen = Screen::Loading;
                vec![format!("=== {} ===", mode), "Loading quiz...".to_string()]
            }
            GameEvent::SongLoaded { song, options, remaining, .. } => {
                self.screen = Screen::Guessing;
                self.options = options.clone();
                self.has_preview = song.has_preview();
                self.playing = false;

                let mut lines = vec![String::new(), format!("Artist: {}", song.artist)];
                match &song.audio_url {
                    Some(url) => lines.push(format!("Preview: {}  (p to play/pause)", url)),
                    None => lines.push("No preview available".to_string()),
                }
                lines.extend(
                    options
                        .iter()
                        .enumerate()
                        .map(|(i, option)| format!("  {}. {}", i + 1, option)),
                );
                lines.push(format!("({} more after this one)", remaining));
                lines
            }
            GameEvent::GuessResolved {
                correct,
                points_awarded,
                streak,
                score,
                correct_title,
                ..
            } => {
                self.screen = Screen::Answered;
                self.playing = false;

                let verdict = if *correct {
                    format!("Correct! +{} points", points_awarded)
                } else {
                    format!("Wrong, it was \"{}\"", correct_title)
                };
                vec![
                    verdict,
                    format!("Score: {}   Streak: {}", score, streak),
                    "n for next song".to_string(),
                ]
            }
            GameEvent::RoundComplete { mode, final_score, .. } => {
                self.screen = Screen::Finished;
                vec![format!("Round over ({}): final score {}", mode, final_score)]
            }
            GameEvent::LoadFailed { reason, .. } => {
                self.screen = Screen::Menu;
                vec![reason.user_message().to_string(), menu_text()]
            }
            GameEvent::ReturnedToMenu { reason, .. } => {
                let was_at_menu = self.screen == Screen::Menu;
                self.screen = Screen::Menu;
                self.options.clear();
                self.has_preview = false;
                self.playing = false;
                match reason {
                    MenuReturnReason::UserExit if !was_at_menu => {
                        vec!["Round abandoned.".to_string(), menu_text()]
                    }
                    _ => vec![menu_text()],
                }
            }
            GameEvent::ScoresUpdated { best_scores, leaderboard, .. } => {
                self.best_scores = best_scores.clone();
                self.leaderboard = leaderboard.clone();
                if self.screen == Screen::Menu {
                    self.render_scores()
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn render_scores(&self) -> Vec<String> {
        let mut lines: Vec<String> = QuizMode::ALL
            .iter()
            .map(|mode| {
                let best = self.best_scores.get(mode).copied().unwrap_or(0);
                format!("Best {}: {}", mode, best)
            })
            .collect();

        if self.leaderboard.is_empty() {
            lines.push("Leaderboard: no rounds yet".to_string());
        } else {
            lines.push("Leaderboard:".to_string());
            lines.extend(self.leaderboard.iter().enumerate().map(|(i, entry)| {
                format!(
                    "  {:>2}. {:>5}  {:<11} {}",
                    i + 1,
                    entry.score,
                    entry.mode.label(),
                    entry.timestamp.format("%Y-%m-%d %H:%M")
                )
            }));
        }
        lines
    }
}

const NO_PREVIEW_HINT: &str = "No preview for this track - guess based on the options.";

fn menu_text() -> String {
    "Choose a mode: 1) Top Tracks  2) Global Hits   (s scores, h help, q quit)".to_string()
}

pub fn help_text() -> String {
    [
        "Commands:",
        "  1 / top      start a Top Tracks round",
        "  2 / global   start a Global Hits round",
        "  p            play or pause the preview",
        "  <number>     guess that option",
        "  n            next song",
        "  m            back to the menu",
        "  s            show best scores and leaderboard",
        "  q            quit",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tg_common::Song;

    fn song_loaded(options: &[&str]) -> GameEvent {
        GameEvent::SongLoaded {
            song: Song::new(1000, "Alpha", "Band", options.iter().map(|s| s.to_string()).collect()),
            options: options.iter().map(|s| s.to_string()).collect(),
            remaining: 0,
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_menu_parses_modes() {
        let view = TerminalView::new();
        assert_eq!(view.parse("1"), Ok(Action::SelectMode(QuizMode::TopTracks)));
        assert_eq!(view.parse(" global "), Ok(Action::SelectMode(QuizMode::GlobalHits)));
        assert!(view.parse("3").is_err());
        assert_eq!(view.parse("Q"), Ok(Action::Quit));
    }

    fn song_loaded_with_preview(options: &[&str]) -> GameEvent {
        match song_loaded(options) {
            GameEvent::SongLoaded { song, options, remaining, timestamp } => GameEvent::SongLoaded {
                song: song.with_audio_url(Some("https://p.scdn.co/mp3-preview/1".to_string())),
                options,
                remaining,
                timestamp,
            },
            other => other,
        }
    }

    fn returned_to_menu(reason: MenuReturnReason) -> GameEvent {
        GameEvent::ReturnedToMenu {
            reason,
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_guess_by_option_number() {
        let mut view = TerminalView::new();
        view.render(&song_loaded_with_preview(&["Beta", "Alpha", "Gamma"]));

        assert_eq!(view.parse("2"), Ok(Action::Guess("Alpha".to_string())));
        assert_eq!(view.parse("p"), Ok(Action::TogglePlay));
        assert!(view.parse("0").is_err());
        assert!(view.parse("4").is_err());
    }

    #[test]
    fn test_answered_screen_accepts_next() {
        let mut view = TerminalView::new();
        view.render(&song_loaded(&["Alpha"]));
        view.render(&GameEvent::GuessResolved {
            correct: true,
            points_awarded: 500,
            streak: 1,
            score: 500,
            correct_title: "Alpha".to_string(),
            listened_ms: 0,
            timestamp: chrono::Utc::now(),
        });

        assert_eq!(view.parse("n"), Ok(Action::Next));
        assert!(view.parse("1").is_err());
    }

    #[test]
    fn test_song_without_preview_is_announced() {
        let mut view = TerminalView::new();
        let lines = view.render(&song_loaded(&["Alpha", "Beta"]));

        assert!(lines.iter().any(|l| l == "No preview available"));
        assert!(lines.iter().any(|l| l == "  2. Beta"));
    }

    #[test]
    fn test_play_toggle_refused_without_preview() {
        let mut view = TerminalView::new();
        view.render(&song_loaded(&["Alpha", "Beta"]));

        assert_eq!(
            view.parse("p"),
            Err("No preview for this track - guess based on the options.".to_string())
        );
        // Guessing still works
        assert_eq!(view.parse("1"), Ok(Action::Guess("Alpha".to_string())));

        view.render(&song_loaded_with_preview(&["Alpha", "Beta"]));
        assert_eq!(view.parse("p"), Ok(Action::TogglePlay));
    }

    #[test]
    fn test_menu_command_at_menu_does_not_claim_abandon() {
        let mut view = TerminalView::new();
        let lines = view.render(&returned_to_menu(MenuReturnReason::UserExit));
        assert!(!lines.iter().any(|l| l == "Round abandoned."));

        view.render(&song_loaded(&["Alpha", "Beta"]));
        let lines = view.render(&returned_to_menu(MenuReturnReason::UserExit));
        assert_eq!(lines[0], "Round abandoned.");
    }

    #[test]
    fn test_load_failure_shows_user_message() {
        let mut view = TerminalView::new();
        view.render(&GameEvent::ModeStarted {
            mode: QuizMode::TopTracks,
            timestamp: chrono::Utc::now(),
        });
        let lines = view.render(&GameEvent::LoadFailed {
            mode: QuizMode::TopTracks,
            reason: tg_common::events::LoadFailureReason::EmptyQuiz,
            detail: String::new(),
            timestamp: chrono::Utc::now(),
        });

        assert_eq!(lines[0], "No tracks available for this mode.");
        assert_eq!(view.parse("1"), Ok(Action::SelectMode(QuizMode::TopTracks)));
    }

    #[test]
    fn test_scores_render_leaderboard() {
        let mut view = TerminalView::new();
        let mut best = BTreeMap::new();
        best.insert(QuizMode::TopTracks, 450);
        let lines = view.render(&GameEvent::ScoresUpdated {
            best_scores: best,
            leaderboard: vec![LeaderboardEntry::new(QuizMode::GlobalHits, 725)],
            timestamp: chrono::Utc::now(),
        });

        assert_eq!(lines[0], "Best Top Tracks: 450");
        assert_eq!(lines[1], "Best Global Hits: 0");
        assert!(lines[3].contains("725"));
        assert!(lines[3].contains("Global Hits"));
    }
}
