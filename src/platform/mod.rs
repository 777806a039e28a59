//! Platform abstraction layer
//!
//! Seams between the deterministic core and whatever hosts it:
//! - Time: fixed-step accumulator fed by real frame deltas
//! - Input: key/touch events folded into per-tick action flags
//! - Scene: entity handles mirrored from simulation events

pub mod clock;
pub mod input;
pub mod scene;

pub use clock::FixedStep;
pub use input::{InputSource, KeyboardInput, ScriptedInput};
pub use scene::{EntityHandle, SceneGraph, SceneMirror};
