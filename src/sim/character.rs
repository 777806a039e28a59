//! Playable characters
//!
//! Each character is a plain profile record: model reference, ability timing,
//! ability effect and collision shape. Ability effects are a closed enum
//! dispatched through `apply_ability` / `revert_ability`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::director::LevelDirector;
use super::entity::{Aabb, EntityId};
use super::player::PlayerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterKind {
    Dax,
    Nox,
    Buggy,
    Teag,
}

impl CharacterKind {
    pub const ALL: [CharacterKind; 4] = [
        CharacterKind::Dax,
        CharacterKind::Nox,
        CharacterKind::Buggy,
        CharacterKind::Teag,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CharacterKind::Dax => "Dax",
            CharacterKind::Nox => "Nox",
            CharacterKind::Buggy => "Buggy",
            CharacterKind::Teag => "Teag",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "dax" => Some(CharacterKind::Dax),
            "nox" => Some(CharacterKind::Nox),
            "buggy" => Some(CharacterKind::Buggy),
            "teag" => Some(CharacterKind::Teag),
            _ => None,
        }
    }

    /// Menu / token color (0xRRGGBB)
    pub fn color(&self) -> u32 {
        match self {
            CharacterKind::Dax => 0xFFA500,
            CharacterKind::Nox => 0xA52A2A,
            CharacterKind::Buggy => 0x32CD32,
            CharacterKind::Teag => 0xFFD700,
        }
    }

    pub fn profile(&self) -> CharacterProfile {
        match self {
            CharacterKind::Dax => CharacterProfile {
                kind: *self,
                ability_name: "Pathfinder",
                model_ref: "models/dax/dax.gltf",
                ability_cooldown: 10.0,
                ability_duration: 5.0,
                effect: AbilityEffect::ShortcutSpawn {
                    distance: 20.0,
                    size: Vec3::new(2.0, 0.5, 8.0),
                },
                collision: CollisionProfile::STANDARD,
                pickup_radius: 2.0,
            },
            CharacterKind::Nox => CharacterProfile {
                kind: *self,
                ability_name: "Beast Burst",
                model_ref: "models/nox.gltf",
                ability_cooldown: 8.0,
                ability_duration: 3.0,
                effect: AbilityEffect::SpeedBurst {
                    boost: 2.0,
                    smash_archetype: Some(0),
                },
                collision: CollisionProfile::STANDARD,
                pickup_radius: 2.0,
            },
            CharacterKind::Buggy => CharacterProfile {
                kind: *self,
                ability_name: "Flip Flow",
                model_ref: "models/buggy/buggy.gltf",
                ability_cooldown: 9.0,
                ability_duration: 1.0,
                effect: AbilityEffect::JumpBoost {
                    lift: 5.0,
                    airborne_only: true,
                },
                collision: CollisionProfile::CROUCHED,
                pickup_radius: 1.0,
            },
            CharacterKind::Teag => CharacterProfile {
                kind: *self,
                ability_name: "Spotter's Edge",
                model_ref: "models/teag/teag.gltf",
                ability_cooldown: 12.0,
                ability_duration: 5.0,
                effect: AbilityEffect::TimeDilation { factor: 0.5 },
                collision: CollisionProfile::CROUCHED,
                pickup_radius: 1.0,
            },
        }
    }
}

impl std::fmt::Display for CharacterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a character's ability does while active
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AbilityEffect {
    /// Temporary forward speed bonus; hits on `smash_archetype` break the
    /// obstacle instead of ending the run
    SpeedBurst {
        boost: f32,
        smash_archetype: Option<u8>,
    },
    /// Drops a short-lived shortcut platform ahead of the player
    ShortcutSpawn { distance: f32, size: Vec3 },
    /// Extra vertical lift
    JumpBoost { lift: f32, airborne_only: bool },
    /// Scales the character's own delta
    TimeDilation { factor: f32 },
}

/// Player hitbox shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CollisionProfile {
    /// Full body box with x/z faces pulled in by a forgiveness margin
    Shrunken { body: Vec3, margin: f32 },
    /// Small fixed box for crouched models
    Crouched { half_width: f32, height: f32 },
}

impl CollisionProfile {
    pub const STANDARD: CollisionProfile = CollisionProfile::Shrunken {
        body: Vec3::new(1.6, 1.8, 1.6),
        margin: 0.5,
    };
    pub const CROUCHED: CollisionProfile = CollisionProfile::Crouched {
        half_width: 0.3,
        height: 0.6,
    };

    /// Unshrunk body size (also the fallback model geometry)
    pub fn body_size(&self) -> Vec3 {
        match *self {
            CollisionProfile::Shrunken { body, .. } => body,
            CollisionProfile::Crouched { half_width, height } => {
                Vec3::new(half_width * 2.0, height, half_width * 2.0)
            }
        }
    }

    /// Obstacle hitbox for a player standing at `feet`
    pub fn hitbox(&self, feet: Vec3, height_scale: f32) -> Aabb {
        match *self {
            CollisionProfile::Shrunken { body, margin } => {
                let size = Vec3::new(body.x, body.y * height_scale, body.z);
                Aabb::from_feet_size(feet, size).shrink_horizontal(margin)
            }
            CollisionProfile::Crouched { half_width, height } => {
                let size = Vec3::new(half_width * 2.0, height * height_scale, half_width * 2.0);
                Aabb::from_feet_size(feet, size)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterProfile {
    pub kind: CharacterKind,
    pub ability_name: &'static str,
    pub model_ref: &'static str,
    pub ability_cooldown: f32,
    /// How long the effect stays on (real seconds)
    pub ability_duration: f32,
    pub effect: AbilityEffect,
    pub collision: CollisionProfile,
    /// Horizontal pickup reach when the pickup has no radius of its own
    pub pickup_radius: f32,
}

/// Preconditions beyond cooldown / enable, checked before activation
pub fn can_activate(profile: &CharacterProfile, player: &PlayerState) -> bool {
    match profile.effect {
        AbilityEffect::JumpBoost { airborne_only, .. } => !airborne_only || !player.grounded,
        _ => true,
    }
}

/// Switch the effect on. Returns the shortcut entity when one was placed.
pub fn apply_ability(
    profile: &CharacterProfile,
    player: &mut PlayerState,
    director: &mut LevelDirector,
) -> Option<EntityId> {
    match profile.effect {
        AbilityEffect::SpeedBurst {
            boost,
            smash_archetype,
        } => {
            player.burst_bonus += boost;
            player.smashing = smash_archetype;
            None
        }
        AbilityEffect::ShortcutSpawn { distance, size } => {
            let id = director.spawn_shortcut(player.position.x, player.position.z - distance, size);
            player.shortcut = Some(id);
            Some(id)
        }
        AbilityEffect::JumpBoost { lift, .. } => {
            player.velocity.y += lift;
            None
        }
        AbilityEffect::TimeDilation { factor } => {
            player.time_scale = factor;
            None
        }
    }
}

/// Switch the effect off again
pub fn revert_ability(
    profile: &CharacterProfile,
    player: &mut PlayerState,
    director: &mut LevelDirector,
) {
    match profile.effect {
        AbilityEffect::SpeedBurst { boost, .. } => {
            player.burst_bonus = (player.burst_bonus - boost).max(0.0);
            player.smashing = None;
        }
        AbilityEffect::ShortcutSpawn { .. } => {
            if let Some(id) = player.shortcut.take() {
                director.remove(id);
            }
        }
        // Lift is an impulse; nothing to undo
        AbilityEffect::JumpBoost { .. } => {}
        AbilityEffect::TimeDilation { .. } => {
            player.time_scale = 1.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in CharacterKind::ALL {
            assert_eq!(CharacterKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(CharacterKind::from_name("NOX"), Some(CharacterKind::Nox));
        assert_eq!(CharacterKind::from_name("zed"), None);
    }

    #[test]
    fn test_standard_hitbox_is_forgiving() {
        let hitbox = CollisionProfile::STANDARD.hitbox(Vec3::ZERO, 1.0);
        let size = hitbox.size();
        assert!((size.x - 0.6).abs() < 1e-5);
        assert!((size.z - 0.6).abs() < 1e-5);
        assert!((size.y - 1.8).abs() < 1e-5);
    }

    #[test]
    fn test_slide_halves_height() {
        let standing = CollisionProfile::CROUCHED.hitbox(Vec3::ZERO, 1.0);
        let sliding = CollisionProfile::CROUCHED.hitbox(Vec3::ZERO, 0.5);
        assert!((sliding.size().y * 2.0 - standing.size().y).abs() < 1e-5);
    }

    #[test]
    fn test_cooldowns_match_roster() {
        assert_eq!(CharacterKind::Dax.profile().ability_cooldown, 10.0);
        assert_eq!(CharacterKind::Nox.profile().ability_cooldown, 8.0);
        assert_eq!(CharacterKind::Buggy.profile().ability_cooldown, 9.0);
        assert_eq!(CharacterKind::Teag.profile().ability_cooldown, 12.0);
    }
}
