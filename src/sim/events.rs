//! Outbound notifications from the simulation
//!
//! The core never touches the scene graph, audio or storage directly. It
//! appends `SimEvent`s to a buffer that the session drains after each tick.

use glam::Vec3;

use super::character::CharacterKind;
use super::entity::{EntityId, EntityKind};
use super::state::LifecyclePhase;

/// Named audio cues (fire-and-forget)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    Coin,
    Token,
    Crash,
    Ability,
    Smash,
    HighScore,
}

impl Cue {
    pub fn name(&self) -> &'static str {
        match self {
            Cue::Coin => "coin",
            Cue::Token => "token",
            Cue::Crash => "crash",
            Cue::Ability => "ability",
            Cue::Smash => "smash",
            Cue::HighScore => "highScore",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// Entity entered the track; the scene should add a handle for it
    Spawned {
        id: EntityId,
        kind: EntityKind,
        position: Vec3,
        size: Vec3,
    },
    /// Entity left the track (retired, collected or smashed)
    Despawned { id: EntityId },
    Cue(Cue),
    Music { playing: bool },
    PhaseChanged {
        from: LifecyclePhase,
        to: LifecyclePhase,
    },
    /// Score beat the stored best when the run ended
    NewHighScore(u64),
    AbilityReady(CharacterKind),
    AbilityActivated(CharacterKind),
    AbilityEnded(CharacterKind),
}

/// Translate a phase change into its events (phase, music, high score)
pub fn push_phase_change(events: &mut Vec<SimEvent>, change: super::state::PhaseChange) {
    events.push(SimEvent::PhaseChanged {
        from: change.from,
        to: change.to,
    });
    match change.to {
        LifecyclePhase::Playing => events.push(SimEvent::Music { playing: true }),
        LifecyclePhase::Paused | LifecyclePhase::Menu => {
            events.push(SimEvent::Music { playing: false })
        }
        LifecyclePhase::GameOver => {
            events.push(SimEvent::Music { playing: false });
            events.push(SimEvent::Cue(Cue::Crash));
        }
    }
    if let Some(score) = change.new_high_score {
        events.push(SimEvent::Cue(Cue::HighScore));
        events.push(SimEvent::NewHighScore(score));
    }
}
