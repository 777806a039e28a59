//! Data-driven game balance
//!
//! Every gameplay number the simulation reads lives here so a run can be
//! rebalanced from a JSON file without touching code. Missing fields fall
//! back to the shipped defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Player ===
    /// Forward speed at the start of a run (units/sec)
    pub initial_speed: f32,
    /// Forward speed gained per second survived
    pub acceleration: f32,
    /// Lateral speed while steering
    pub strafe_speed: f32,
    pub gravity: f32,
    pub jump_force: f32,
    /// Extra upward velocity for the single mid-air boost
    pub air_boost: f32,
    pub slide_duration: f32,
    /// Hitbox height multiplier while sliding
    pub slide_height_scale: f32,
    /// Matching tokens needed to unlock the ability
    pub token_threshold: u32,

    // === Spawning ===
    pub obstacle_interval: f32,
    pub collectible_interval: f32,
    pub platform_interval: f32,
    pub barrier_interval: f32,
    /// Distance ahead of the player where obstacles and barriers appear
    pub spawn_distance: f32,
    /// Distance ahead of the player where platforms appear
    pub platform_distance: f32,
    /// Extra random distance added to collectible spawns
    pub collectible_depth_jitter: f32,
    pub lane_count: usize,
    /// Maximum sideways jitter of an obstacle inside its lane
    pub lane_jitter: f32,
    pub placement_attempts: u32,
    pub coin_value: u64,
    /// Cosmetic collectible spin (radians/sec)
    pub pickup_spin: f32,

    // === Lifecycle / collision ===
    /// Entities this far behind the player are retired
    pub retire_margin: f32,
    /// Entities farther than this from the player skip precise tests
    pub collision_cutoff: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            initial_speed: 13.125,
            acceleration: 0.1,
            strafe_speed: 7.5,
            gravity: 30.0,
            jump_force: 15.0,
            air_boost: 5.0,
            slide_duration: 1.0,
            slide_height_scale: 0.5,
            token_threshold: 5,

            obstacle_interval: 2.0,
            collectible_interval: 3.0,
            platform_interval: 5.0,
            barrier_interval: 7.0,
            spawn_distance: 20.0,
            platform_distance: 25.0,
            collectible_depth_jitter: 10.0,
            lane_count: 4,
            lane_jitter: 0.5,
            placement_attempts: 10,
            coin_value: 10,
            pickup_spin: 2.0,

            retire_margin: 15.0,
            collision_cutoff: 5.0,
        }
    }
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if self.lane_count < 2 {
            return Err(TuningError::Invalid {
                field: "lane_count",
                reason: format!("need at least 2 lanes to keep one open, got {}", self.lane_count),
            });
        }
        let intervals = [
            ("obstacle_interval", self.obstacle_interval),
            ("collectible_interval", self.collectible_interval),
            ("platform_interval", self.platform_interval),
            ("barrier_interval", self.barrier_interval),
        ];
        for (field, value) in intervals {
            if !(value > 0.0) {
                return Err(TuningError::Invalid {
                    field,
                    reason: format!("must be positive, got {value}"),
                });
            }
        }
        let non_negative = [
            ("initial_speed", self.initial_speed),
            ("acceleration", self.acceleration),
            ("strafe_speed", self.strafe_speed),
            ("gravity", self.gravity),
            ("retire_margin", self.retire_margin),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) {
                return Err(TuningError::Invalid {
                    field,
                    reason: format!("must not be negative, got {value}"),
                });
            }
        }
        if self.token_threshold == 0 {
            return Err(TuningError::Invalid {
                field: "token_threshold",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = Tuning::from_json(r#"{ "strafe_speed": 9.0, "lane_count": 5 }"#).unwrap();
        assert_eq!(tuning.strafe_speed, 9.0);
        assert_eq!(tuning.lane_count, 5);
        assert_eq!(tuning.token_threshold, 5);
        assert_eq!(tuning.obstacle_interval, 2.0);
    }

    #[test]
    fn test_rejects_single_lane() {
        let err = Tuning::from_json(r#"{ "lane_count": 1 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "lane_count", .. }));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let err = Tuning::from_json(r#"{ "platform_interval": 0.0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "platform_interval", .. }));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(Tuning::from_json("{ nope"), Err(TuningError::Parse(_))));
    }

    #[test]
    fn test_json_survives_reload() {
        let mut tuning = Tuning::default();
        tuning.coin_value = 25;
        let reloaded = Tuning::from_json(&tuning.to_json().unwrap()).unwrap();
        assert_eq!(reloaded, tuning);
    }
}
