//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (entities kept in spawn order)
//! - Timers are countdown fields advanced inside `tick`, never wall-clock callbacks
//! - No rendering or platform dependencies; collaborators learn about changes
//!   through the `SimEvent` buffer

pub mod character;
pub mod collision;
pub mod director;
pub mod entity;
pub mod events;
pub mod player;
pub mod run;
pub mod state;
pub mod tick;

pub use character::{AbilityEffect, CharacterKind, CharacterProfile, CollisionProfile};
pub use collision::{Contact, resolve_contact, swept_along_z};
pub use director::{LevelDirector, ObstacleWave, PlayerView, SpawnError};
pub use entity::{Aabb, EntityId, EntityKind, SpatialEntity};
pub use events::{Cue, SimEvent};
pub use player::{AbilityPhase, Heading, ModelState, PlayerState};
pub use run::Run;
pub use state::{GameState, LifecyclePhase, PhaseChange, StateError};
pub use tick::{ActionFlags, TickInput, tick};
