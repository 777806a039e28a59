//! Frame driver
//!
//! A `Session` owns one `Run` plus every collaborator it talks to: the
//! durable store, the audio sink, the scene and the fixed-step clock. Each
//! host frame becomes zero or more fixed ticks; after every tick the
//! simulation's events are dispatched to the collaborators.

use glam::Vec3;
use serde::Serialize;

use crate::assets::{AssetError, AssetKind, AssetStatus, AssetTracker};
use crate::audio::AudioSink;
use crate::highscores::HighScore;
use crate::persistence::KeyValueStore;
use crate::platform::{EntityHandle, FixedStep, InputSource, SceneGraph};
use crate::settings::Settings;
use crate::sim::{
    AbilityPhase, CharacterKind, LifecyclePhase, PhaseChange, Run, SimEvent, StateError, tick,
};
use crate::tuning::Tuning;

/// Everything the HUD shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hud {
    pub phase: LifecyclePhase,
    pub character: CharacterKind,
    pub ability_name: &'static str,
    pub score: u64,
    pub high_score: u64,
    /// Ability progress (0-100)
    pub token_progress: f32,
    pub ability_ready: bool,
    pub ability_active: bool,
    pub cooldown: f32,
    pub speed: f32,
    /// Distance run so far
    pub distance: f32,
    pub player_position: Vec3,
    pub player_yaw: f32,
    pub sliding: bool,
    pub show_hitboxes: bool,
}

pub struct Session<A: AudioSink, G: SceneGraph> {
    run: Run,
    clock: FixedStep,
    store: Box<dyn KeyValueStore>,
    audio: A,
    scene: G,
    high_score: HighScore,
    settings: Settings,
    assets: AssetTracker,
}

impl<A: AudioSink, G: SceneGraph> Session<A, G> {
    pub fn new(
        character: CharacterKind,
        tuning: Tuning,
        seed: u64,
        store: Box<dyn KeyValueStore>,
        mut audio: A,
        scene: G,
    ) -> Self {
        let high_score = HighScore::load(store.as_ref());
        let settings = Settings::load(store.as_ref());
        audio.apply_settings(&settings);

        let run = Run::new(character, tuning, seed, high_score.best);
        let mut assets = AssetTracker::new();
        assets.request(run.player.profile.model_ref, AssetKind::Model);

        Self {
            run,
            clock: FixedStep::default(),
            store,
            audio,
            scene,
            high_score,
            settings,
            assets,
        }
    }

    pub fn run(&self) -> &Run {
        &self.run
    }

    pub fn run_mut(&mut self) -> &mut Run {
        &mut self.run
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn scene(&self) -> &G {
        &self.scene
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn high_score(&self) -> u64 {
        self.high_score.best
    }

    pub fn assets(&self) -> &AssetTracker {
        &self.assets
    }

    /// Model the current character needs
    pub fn pending_model(&self) -> Option<&'static str> {
        let model = self.run.player.profile.model_ref;
        matches!(self.assets.status(model), Some(AssetStatus::Pending)).then_some(model)
    }

    /// Host finished (or failed) loading an asset
    pub fn asset_loaded(&mut self, path: &str, result: Result<(), AssetError>) {
        let model_result = result.clone();
        self.assets.complete(path, result);
        if path == self.run.player.profile.model_ref {
            self.run.mark_model_loaded(model_result);
        }
    }

    /// One host frame. Returns the number of simulation steps taken.
    pub fn frame(&mut self, frame_dt: f32, input: &mut dyn InputSource) -> u32 {
        let steps = self.clock.advance(frame_dt);
        let dt = self.clock.step();
        for _ in 0..steps {
            let tick_input = input.sample(dt);
            tick(&mut self.run, &tick_input, dt);
            self.dispatch();
        }

        for entity in self.run.director.all() {
            self.scene
                .move_entity(entity.id, entity.position, entity.rotation);
        }
        steps
    }

    /// Hand pending simulation events to the collaborators
    fn dispatch(&mut self) {
        for event in self.run.drain_events() {
            match event {
                SimEvent::Spawned {
                    id,
                    kind,
                    position,
                    size,
                } => self
                    .scene
                    .add_entity(EntityHandle { id, kind, size }, position),
                SimEvent::Despawned { id } => self.scene.remove_entity(id),
                SimEvent::Cue(cue) => self.audio.play(cue),
                SimEvent::Music { playing } => self.audio.set_music(playing),
                SimEvent::PhaseChanged { from, to } => {
                    log::info!("{} -> {}", from, to);
                    if to != LifecyclePhase::Playing {
                        self.clock.reset();
                    }
                }
                SimEvent::NewHighScore(score) => {
                    self.high_score.record(score, self.store.as_mut());
                }
                SimEvent::AbilityReady(kind) => log::info!("{} ability ready", kind),
                SimEvent::AbilityActivated(kind) | SimEvent::AbilityEnded(kind) => {
                    log::debug!("{} ability toggled", kind)
                }
            }
        }
    }

    pub fn start(&mut self) {
        self.run.start();
        self.dispatch();
    }

    pub fn toggle_pause(&mut self) {
        self.run.toggle_pause();
        self.dispatch();
    }

    pub fn restart(&mut self) {
        self.run.restart();
        self.clock.reset();
        self.dispatch();
    }

    /// Switch character; the new model must be reported through `asset_loaded`
    pub fn select_character(&mut self, character: CharacterKind) {
        self.run.select_character(character);
        self.assets
            .request(self.run.player.profile.model_ref, AssetKind::Model);
        if let Some(AssetStatus::Ready) = self.assets.status(self.run.player.profile.model_ref) {
            self.run.mark_model_loaded(Ok(()));
        } else if let Some(AssetStatus::Fallback(_)) =
            self.assets.status(self.run.player.profile.model_ref)
        {
            self.run.mark_model_loaded(Err(AssetError::NotFound(
                self.run.player.profile.model_ref.to_string(),
            )));
        }
        self.dispatch();
    }

    pub fn request_state(&mut self, name: &str) -> Result<PhaseChange, StateError> {
        let result = self.run.request_state(name);
        self.dispatch();
        result
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings.sanitized();
        self.audio.apply_settings(&self.settings);
        if let Err(e) = self.settings.save(self.store.as_mut()) {
            log::warn!("Could not save settings: {}", e);
        }
    }

    pub fn toggle_hitboxes(&mut self) {
        let mut settings = self.settings.clone();
        settings.show_hitboxes = !settings.show_hitboxes;
        self.set_settings(settings);
    }

    pub fn hud(&self) -> Hud {
        let player = &self.run.player;
        Hud {
            phase: self.run.phase(),
            character: player.kind(),
            ability_name: player.profile.ability_name,
            score: self.run.score(),
            high_score: self.run.high_score(),
            token_progress: self.run.token_progress_percent(),
            ability_ready: player.ability_enabled
                && player.ability == AbilityPhase::Idle
                && player.ability_timer <= 0.0,
            ability_active: player.is_ability_active(),
            cooldown: player.ability_timer,
            speed: player.effective_speed(),
            distance: -player.position.z,
            player_position: player.position,
            player_yaw: player.yaw,
            sliding: player.sliding,
            show_hitboxes: self.settings.show_hitboxes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{Cue, CueLog};
    use crate::persistence::{FileStore, MemoryStore};
    use crate::platform::{SceneMirror, ScriptedInput};
    use crate::sim::EntityKind;

    type TestSession = Session<CueLog, SceneMirror>;

    fn session(store: Box<dyn KeyValueStore>) -> TestSession {
        let mut s = Session::new(
            CharacterKind::Dax,
            Tuning::default(),
            11,
            store,
            CueLog::default(),
            SceneMirror::new(),
        );
        let model = s.pending_model().unwrap();
        s.asset_loaded(model, Ok(()));
        s.start();
        s
    }

    fn crash_into_wall(s: &mut TestSession) {
        let feet = s.run().player.position;
        s.run_mut().director.place(
            EntityKind::Obstacle { archetype: 0 },
            feet + Vec3::new(0.0, 0.5, -3.0),
            Vec3::new(18.0, 1.0, 1.0),
        );
        let mut input = ScriptedInput::default();
        for _ in 0..120 {
            s.frame(1.0 / 60.0, &mut input);
            if s.run().phase() == LifecyclePhase::GameOver {
                break;
            }
        }
    }

    #[test]
    fn test_scene_mirrors_director() {
        let mut s = session(Box::new(MemoryStore::new()));
        let mut input = ScriptedInput::autopilot();
        for _ in 0..600 {
            s.frame(1.0 / 60.0, &mut input);
        }
        assert!(s.scene().totals().0 > 0);
        assert!(s.scene().matches(s.run().director.all()));
    }

    #[test]
    fn test_high_score_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.json");

        {
            let mut s = session(Box::new(FileStore::open(&path).unwrap()));
            s.run_mut().game.add_score(120);
            crash_into_wall(&mut s);
            assert_eq!(s.run().phase(), LifecyclePhase::GameOver);
            assert_eq!(s.high_score(), 120);
            assert_eq!(s.audio().count(Cue::HighScore), 1);
            assert!(!s.audio().music_playing);
        }

        let s = session(Box::new(FileStore::open(&path).unwrap()));
        assert_eq!(s.high_score(), 120);
        assert_eq!(s.run().high_score(), 120);
    }

    #[test]
    fn test_lower_score_not_saved() {
        let mut store = MemoryStore::new();
        HighScore::new(500).save(&mut store).unwrap();
        let mut s = session(Box::new(store));
        s.run_mut().game.add_score(20);
        crash_into_wall(&mut s);
        assert_eq!(s.high_score(), 500);
        assert_eq!(s.audio().count(Cue::HighScore), 0);
        assert_eq!(s.audio().count(Cue::Crash), 1);
    }

    #[test]
    fn test_waits_for_model() {
        let mut s = Session::new(
            CharacterKind::Teag,
            Tuning::default(),
            2,
            Box::new(MemoryStore::new()),
            CueLog::default(),
            SceneMirror::new(),
        );
        s.start();
        let mut input = ScriptedInput::default();
        for _ in 0..30 {
            s.frame(1.0 / 60.0, &mut input);
        }
        assert_eq!(s.hud().distance, 0.0);

        s.asset_loaded("models/teag/teag.gltf", Err(AssetError::NotFound("teag".into())));
        for _ in 0..30 {
            s.frame(1.0 / 60.0, &mut input);
        }
        assert!(s.hud().distance > 0.0);
    }

    #[test]
    fn test_restart_empties_scene() {
        let mut s = session(Box::new(MemoryStore::new()));
        let mut input = ScriptedInput::default();
        for _ in 0..400 {
            s.frame(1.0 / 60.0, &mut input);
        }
        assert!(!s.scene().is_empty());
        s.restart();
        assert!(s.scene().is_empty());
        assert_eq!(s.hud().score, 0);
    }

    #[test]
    fn test_settings_persist_and_mute() {
        let mut s = session(Box::new(MemoryStore::new()));
        s.toggle_hitboxes();
        assert!(s.hud().show_hitboxes);
        s.set_settings(Settings {
            muted: true,
            ..s.settings().clone()
        });
        assert!(s.audio().muted);
    }
}
