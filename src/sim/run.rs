//! One play session's simulation state
//!
//! `Run` owns the player, the level director, the game ledger and the event
//! buffer. The player and director never hold references to each other;
//! `tick` lends the director to the player for the duration of an update.

use super::character::CharacterKind;
use super::director::LevelDirector;
use super::events::{SimEvent, push_phase_change};
use super::player::PlayerState;
use super::state::{GameState, LifecyclePhase, PhaseChange, StateError};
use crate::assets::{self, AssetError, ModelSource};
use crate::tuning::Tuning;

#[derive(Debug, Clone)]
pub struct Run {
    pub seed: u64,
    pub tuning: Tuning,
    pub player: PlayerState,
    pub director: LevelDirector,
    pub game: GameState,
    /// Simulation ticks advanced while playing
    pub time_ticks: u64,
    pub(crate) events: Vec<SimEvent>,
}

impl Run {
    pub fn new(character: CharacterKind, tuning: Tuning, seed: u64, high_score: u64) -> Self {
        log::info!("New run: {} (seed {})", character, seed);
        let tuning = match tuning.validate() {
            Ok(()) => tuning,
            Err(e) => {
                log::warn!("{}; using default tuning", e);
                Tuning::default()
            }
        };
        Self {
            seed,
            player: PlayerState::new(character, tuning.clone()),
            director: LevelDirector::new(tuning.clone(), seed),
            game: GameState::new(character, tuning.token_threshold, high_score),
            tuning,
            time_ticks: 0,
            events: Vec::new(),
        }
    }

    pub fn character(&self) -> CharacterKind {
        self.player.kind()
    }

    /// Completion signal for the character model. A failed load still
    /// readies the player, on the fallback geometry.
    pub fn mark_model_loaded(&mut self, result: Result<(), AssetError>) -> ModelSource {
        let source = assets::resolve_model(self.player.profile.model_ref, result);
        self.player.set_model(source.clone());
        source
    }

    fn apply(&mut self, next: LifecyclePhase) -> Result<PhaseChange, StateError> {
        let change = self.game.set_phase(next)?;
        push_phase_change(&mut self.events, change);
        Ok(change)
    }

    /// Leave the menu and start running
    pub fn start(&mut self) {
        if let Err(e) = self.apply(LifecyclePhase::Playing) {
            log::warn!("Start ignored: {}", e);
        }
    }

    pub fn pause(&mut self) {
        if self.game.phase == LifecyclePhase::Playing {
            let _ = self.apply(LifecyclePhase::Paused);
        }
    }

    pub fn resume(&mut self) {
        if self.game.phase == LifecyclePhase::Paused {
            let _ = self.apply(LifecyclePhase::Playing);
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.game.phase {
            LifecyclePhase::Playing => self.pause(),
            LifecyclePhase::Paused => self.resume(),
            _ => {}
        }
    }

    /// Fresh run with the same character. Pending ability and slide
    /// countdowns are cancelled along with every live entity.
    pub fn restart(&mut self) {
        self.player.reset(&mut self.director);
        self.director.clear();
        self.game.reset();
        self.time_ticks = 0;
        log::info!("Restart with {}", self.character());
        if self.game.phase != LifecyclePhase::Playing {
            if let Err(e) = self.apply(LifecyclePhase::Playing) {
                log::warn!("Restart could not resume play: {}", e);
            }
        }
    }

    /// Swap characters and return to the menu. The new model has to load
    /// before the run can move again.
    pub fn select_character(&mut self, character: CharacterKind) {
        self.player.reset(&mut self.director);
        self.director.clear();
        self.player = PlayerState::new(character, self.tuning.clone());
        self.game.character = character;
        self.game.reset();
        self.time_ticks = 0;
        if self.game.phase != LifecyclePhase::Menu {
            let _ = self.apply(LifecyclePhase::Menu);
        }
        log::info!("Selected {}", character);
    }

    /// String-named lifecycle request from a UI host. Unknown or illegal
    /// requests are logged and leave the state unchanged.
    pub fn request_state(&mut self, name: &str) -> Result<PhaseChange, StateError> {
        let next = name.parse::<LifecyclePhase>().and_then(|next| self.apply(next));
        if let Err(e) = &next {
            log::warn!("State request `{}` rejected: {}", name, e);
        }
        next
    }

    pub fn score(&self) -> u64 {
        self.game.score
    }

    pub fn high_score(&self) -> u64 {
        self.game.high_score
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.game.phase
    }

    /// Ability progress for the HUD (0-100)
    pub fn token_progress_percent(&self) -> f32 {
        self.game.token_progress_percent()
    }

    pub(crate) fn flush_director_events(&mut self) {
        self.events.extend(self.director.drain_events());
    }

    /// Everything emitted since the last drain, in emission order per source
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.flush_director_events();
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Fallback;
    use crate::sim::tick::{TickInput, tick};

    fn playing() -> Run {
        let mut run = Run::new(CharacterKind::Dax, Tuning::default(), 9, 0);
        run.mark_model_loaded(Ok(()));
        run.start();
        run
    }

    #[test]
    fn test_failed_model_uses_fallback() {
        let mut run = Run::new(CharacterKind::Buggy, Tuning::default(), 1, 0);
        let missing = AssetError::NotFound("models/buggy/buggy.gltf".into());
        let source = run.mark_model_loaded(Err(missing));
        assert_eq!(source, ModelSource::Fallback(Fallback::BoxGeometry));
        assert!(run.player.model.is_ready());
    }

    #[test]
    fn test_invalid_tuning_falls_back_to_defaults() {
        let tuning = Tuning {
            lane_count: 1,
            ..Tuning::default()
        };
        let mut run = Run::new(CharacterKind::Nox, tuning, 4, 0);
        assert_eq!(run.tuning.lane_count, Tuning::default().lane_count);
        assert_eq!(run.director.tuning().lane_count, Tuning::default().lane_count);
        assert!(run.director.spawn_obstacle().is_ok());
    }

    #[test]
    fn test_unknown_request_keeps_phase() {
        let mut run = playing();
        assert!(run.request_state("warp").is_err());
        assert_eq!(run.phase(), LifecyclePhase::Playing);
        assert!(run.request_state("paused").is_ok());
        assert_eq!(run.phase(), LifecyclePhase::Paused);
    }

    #[test]
    fn test_restart_clears_run() {
        let mut run = playing();
        for _ in 0..400 {
            tick(&mut run, &TickInput::default(), crate::consts::SIM_DT);
        }
        run.game.add_score(30);
        assert!(run.director.entity_count() > 0);
        run.restart();
        assert_eq!(run.score(), 0);
        assert_eq!(run.director.entity_count(), 0);
        assert_eq!(run.player.position.z, 0.0);
        assert_eq!(run.phase(), LifecyclePhase::Playing);
    }

    #[test]
    fn test_restart_after_game_over() {
        let mut run = playing();
        run.game.add_score(50);
        run.game.set_phase(LifecyclePhase::GameOver).unwrap();
        run.restart();
        assert_eq!(run.phase(), LifecyclePhase::Playing);
        assert_eq!(run.high_score(), 50);
    }

    #[test]
    fn test_select_character_returns_to_menu() {
        let mut run = playing();
        run.select_character(CharacterKind::Teag);
        assert_eq!(run.character(), CharacterKind::Teag);
        assert_eq!(run.phase(), LifecyclePhase::Menu);
        assert!(!run.player.model.is_ready());
        assert!(
            run.drain_events()
                .contains(&SimEvent::Music { playing: false })
        );
    }
}
