//! Sprint Squad - lane-based endless runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (player physics, spawning, collisions, game state)
//! - `platform`: Input, scene and clock seams the host plugs into
//! - `persistence`: Durable key/value storage for high score and settings
//! - `tuning`: Data-driven game balance
//! - `session`: Frame driver tying the simulation to its collaborators

pub mod assets;
pub mod audio;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

pub use highscores::HighScore;
pub use session::Session;
pub use settings::Settings;
pub use tuning::Tuning;

use glam::{Vec2, Vec3};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest real frame delta accepted before clamping (tab switches etc.)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Lateral clamp for the player (track is 20 units wide, centered at 0)
    pub const TRACK_HALF_WIDTH: f32 = 9.0;
    /// Height of the bare track surface
    pub const GROUND_HEIGHT: f32 = 0.0;

    /// Heading ease toward the strafe direction (per second)
    pub const HEADING_EASE_RATE: f32 = 5.0;
    /// Yaw offset while strafing (radians, 30 degrees)
    pub const HEADING_STRAFE_YAW: f32 = std::f32::consts::PI / 6.0;
}

/// Horizontal (x/z) projection of a world position
#[inline]
pub fn ground_plane(pos: Vec3) -> Vec2 {
    Vec2::new(pos.x, pos.z)
}

/// Linear interpolation clamped to the target
#[inline]
pub fn ease_toward(current: f32, target: f32, t: f32) -> f32 {
    current + (target - current) * t.clamp(0.0, 1.0)
}
