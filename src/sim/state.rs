//! Game lifecycle, score and progress ledger
//!
//! Small bookkeeping shared by the loop and the HUD. Phase changes only go
//! through `set_phase`, which enforces the legal transition table and runs
//! the high-score comparison exactly once per game over.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::character::CharacterKind;

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecyclePhase {
    /// Character select / title
    Menu,
    Playing,
    Paused,
    /// Run ended by an obstacle hit
    GameOver,
}

impl LifecyclePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecyclePhase::Menu => "menu",
            LifecyclePhase::Playing => "playing",
            LifecyclePhase::Paused => "paused",
            LifecyclePhase::GameOver => "gameOver",
        }
    }

    /// Legal transition table
    pub fn can_transition_to(&self, next: LifecyclePhase) -> bool {
        use LifecyclePhase::*;
        matches!(
            (self, next),
            (Menu, Playing)
                | (Playing, Paused)
                | (Playing, GameOver)
                | (Playing, Menu)
                | (Paused, Playing)
                | (Paused, Menu)
                | (GameOver, Playing)
                | (GameOver, Menu)
        )
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecyclePhase {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "menu" => Ok(LifecyclePhase::Menu),
            "playing" => Ok(LifecyclePhase::Playing),
            "paused" => Ok(LifecyclePhase::Paused),
            "gameOver" => Ok(LifecyclePhase::GameOver),
            other => Err(StateError::UnknownState(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("unknown lifecycle state `{0}`")]
    UnknownState(String),
    #[error("illegal transition {from} -> {to}")]
    IllegalTransition {
        from: LifecyclePhase,
        to: LifecyclePhase,
    },
}

/// Result of an accepted transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub from: LifecyclePhase,
    pub to: LifecyclePhase,
    /// Set when entering game over beat the stored best
    pub new_high_score: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub phase: LifecyclePhase,
    /// Coin score for this run
    pub score: u64,
    /// Best score across runs (loaded from storage at startup)
    pub high_score: u64,
    /// Matching tokens collected toward the ability threshold
    pub tokens: u32,
    pub token_threshold: u32,
    pub character: CharacterKind,
}

impl GameState {
    pub fn new(character: CharacterKind, token_threshold: u32, high_score: u64) -> Self {
        Self {
            phase: LifecyclePhase::Menu,
            score: 0,
            high_score,
            tokens: 0,
            token_threshold: token_threshold.max(1),
            character,
        }
    }

    /// Move to `next` if the transition table allows it
    pub fn set_phase(&mut self, next: LifecyclePhase) -> Result<PhaseChange, StateError> {
        let from = self.phase;
        if !from.can_transition_to(next) {
            return Err(StateError::IllegalTransition { from, to: next });
        }
        self.phase = next;

        let mut new_high_score = None;
        if next == LifecyclePhase::GameOver && self.score > self.high_score {
            self.high_score = self.score;
            new_high_score = Some(self.score);
            log::info!("New high score: {}", self.score);
        }

        log::debug!("Phase {} -> {}", from, next);
        Ok(PhaseChange {
            from,
            to: next,
            new_high_score,
        })
    }

    /// String-named transition request from a UI host
    pub fn request_state(&mut self, name: &str) -> Result<PhaseChange, StateError> {
        let next: LifecyclePhase = name.parse()?;
        self.set_phase(next)
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.phase == LifecyclePhase::Playing
    }

    #[inline]
    pub fn is_game_over(&self) -> bool {
        self.phase == LifecyclePhase::GameOver
    }

    pub fn add_score(&mut self, value: u64) {
        self.score = self.score.saturating_add(value);
    }

    /// Mirror the player's token count; returns true when the threshold was just crossed
    pub fn set_token_progress(&mut self, tokens: u32) -> bool {
        let was_ready = self.tokens >= self.token_threshold;
        self.tokens = tokens;
        !was_ready && self.tokens >= self.token_threshold
    }

    /// Ability progress for the HUD (0-100)
    pub fn token_progress_percent(&self) -> f32 {
        (self.tokens as f32 / self.token_threshold as f32 * 100.0).min(100.0)
    }

    /// Clear per-run values; the phase and high score are kept
    pub fn reset(&mut self) {
        self.score = 0;
        self.tokens = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        GameState::new(CharacterKind::Dax, 5, 100)
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("gameOver".parse::<LifecyclePhase>(), Ok(LifecyclePhase::GameOver));
        assert_eq!(
            "victory".parse::<LifecyclePhase>(),
            Err(StateError::UnknownState("victory".to_string()))
        );
    }

    #[test]
    fn test_unknown_request_leaves_state() {
        let mut s = state();
        s.set_phase(LifecyclePhase::Playing).unwrap();
        assert!(s.request_state("flying").is_err());
        assert_eq!(s.phase, LifecyclePhase::Playing);
    }

    #[test]
    fn test_illegal_transition_rejected() {
        let mut s = state();
        let err = s.set_phase(LifecyclePhase::GameOver).unwrap_err();
        assert_eq!(
            err,
            StateError::IllegalTransition {
                from: LifecyclePhase::Menu,
                to: LifecyclePhase::GameOver
            }
        );
        assert_eq!(s.phase, LifecyclePhase::Menu);
    }

    #[test]
    fn test_game_over_checks_high_score_once() {
        let mut s = state();
        s.set_phase(LifecyclePhase::Playing).unwrap();
        s.add_score(150);
        let change = s.set_phase(LifecyclePhase::GameOver).unwrap();
        assert_eq!(change.new_high_score, Some(150));
        assert_eq!(s.high_score, 150);

        // Re-entering game over is illegal, so the comparison cannot repeat
        assert!(s.set_phase(LifecyclePhase::GameOver).is_err());
    }

    #[test]
    fn test_lower_score_keeps_best() {
        let mut s = state();
        s.set_phase(LifecyclePhase::Playing).unwrap();
        s.add_score(40);
        let change = s.set_phase(LifecyclePhase::GameOver).unwrap();
        assert_eq!(change.new_high_score, None);
        assert_eq!(s.high_score, 100);
    }

    #[test]
    fn test_token_progress() {
        let mut s = state();
        assert!(!s.set_token_progress(4));
        assert_eq!(s.token_progress_percent(), 80.0);
        assert!(s.set_token_progress(5));
        assert!(!s.set_token_progress(6));
        assert_eq!(s.token_progress_percent(), 100.0);
    }
}
