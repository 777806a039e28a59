//! Player movement, physics and ability state machine
//!
//! One `PlayerState` serves every character; the character only changes the
//! `CharacterProfile` it is built from. All timers (slide, ability duration,
//! cooldown) are countdown fields advanced at the top of `update`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::character::{self, CharacterKind, CharacterProfile};
use super::collision::{Contact, resolve_contact, swept_along_z};
use super::director::{LevelDirector, PlayerView};
use super::entity::{Aabb, EntityId, EntityKind};
use super::events::{Cue, SimEvent, push_phase_change};
use super::state::{GameState, LifecyclePhase};
use super::tick::ActionFlags;
use crate::assets::ModelSource;
use crate::consts::{GROUND_HEIGHT, HEADING_EASE_RATE, HEADING_STRAFE_YAW, TRACK_HALF_WIDTH};
use crate::ease_toward;
use crate::tuning::Tuning;

/// Last lateral move, drives the cosmetic yaw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Heading {
    Left,
    Right,
    #[default]
    Forward,
}

impl Heading {
    /// Yaw offset from straight ahead (radians)
    pub fn target_yaw(&self) -> f32 {
        match self {
            Heading::Left => HEADING_STRAFE_YAW,
            Heading::Right => -HEADING_STRAFE_YAW,
            Heading::Forward => 0.0,
        }
    }
}

/// Whether the renderable model is available yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelState {
    Loading,
    Ready { source: ModelSource },
}

impl ModelState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ModelState::Ready { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AbilityPhase {
    #[default]
    Idle,
    /// Effect on; `remaining` counts real seconds
    Active { remaining: f32 },
}

#[derive(Debug, Clone)]
pub struct PlayerState {
    pub profile: CharacterProfile,
    tuning: Tuning,
    pub model: ModelState,

    /// Feet position
    pub position: Vec3,
    pub velocity: Vec3,
    /// Base forward speed, never decreases during a run
    pub speed: f32,
    /// Temporary bonus on top of `speed` (speed bursts)
    pub burst_bonus: f32,
    pub grounded: bool,
    pub sliding: bool,
    slide_remaining: f32,
    /// Mid-air boost still unused for the current jump
    air_boost_ready: bool,
    /// Jump flag seen on the previous update
    jump_held: bool,

    pub ability: AbilityPhase,
    /// Cooldown remaining (seconds of the character's own time)
    pub ability_timer: f32,
    pub ability_enabled: bool,
    pub tokens: u32,

    pub heading: Heading,
    /// Cosmetic yaw offset eased toward the heading
    pub yaw: f32,
    /// Multiplier on the character's own delta
    pub time_scale: f32,
    /// Obstacle archetype smashed instead of ending the run
    pub smashing: Option<u8>,
    /// Shortcut placed by the active ability
    pub shortcut: Option<EntityId>,

    pub crashed: bool,
    /// Seconds survived (own time)
    pub elapsed: f32,
}

impl PlayerState {
    pub fn new(kind: CharacterKind, tuning: Tuning) -> Self {
        Self {
            profile: kind.profile(),
            speed: tuning.initial_speed,
            tuning,
            model: ModelState::Loading,
            position: Vec3::new(0.0, GROUND_HEIGHT, 0.0),
            velocity: Vec3::ZERO,
            burst_bonus: 0.0,
            grounded: true,
            sliding: false,
            slide_remaining: 0.0,
            air_boost_ready: false,
            jump_held: false,
            ability: AbilityPhase::Idle,
            ability_timer: 0.0,
            ability_enabled: false,
            tokens: 0,
            heading: Heading::Forward,
            yaw: 0.0,
            time_scale: 1.0,
            smashing: None,
            shortcut: None,
            crashed: false,
            elapsed: 0.0,
        }
    }

    pub fn kind(&self) -> CharacterKind {
        self.profile.kind
    }

    pub fn set_model(&mut self, source: ModelSource) {
        self.model = ModelState::Ready { source };
    }

    /// Forward speed including temporary bonuses
    #[inline]
    pub fn effective_speed(&self) -> f32 {
        (self.speed + self.burst_bonus).max(0.0)
    }

    /// Snapshot handed to the level director
    pub fn view(&self) -> PlayerView {
        PlayerView {
            position: self.position,
            speed: self.effective_speed() * self.time_scale,
        }
    }

    /// Obstacle hitbox at the current position
    pub fn hitbox(&self) -> Aabb {
        let scale = if self.sliding {
            self.tuning.slide_height_scale
        } else {
            1.0
        };
        self.profile.collision.hitbox(self.position, scale)
    }

    pub fn is_ability_active(&self) -> bool {
        matches!(self.ability, AbilityPhase::Active { .. })
    }

    /// Advance one step: timers, movement, abilities, then collisions
    pub fn update(
        &mut self,
        dt: f32,
        actions: &ActionFlags,
        director: &mut LevelDirector,
        game: &mut GameState,
        events: &mut Vec<SimEvent>,
    ) {
        // Model still loading
        if !self.model.is_ready() || self.crashed {
            return;
        }
        let real_dt = dt.max(0.0);
        let dt = real_dt * self.time_scale;

        self.advance_timers(real_dt, dt, director, game, events);

        self.heading = match (actions.steer_left, actions.steer_right) {
            (true, false) => Heading::Left,
            (false, true) => Heading::Right,
            _ => Heading::Forward,
        };
        self.yaw = ease_toward(self.yaw, self.heading.target_yaw(), HEADING_EASE_RATE * dt);

        self.elapsed += dt;
        self.speed += self.tuning.acceleration * dt;
        self.position.z -= self.effective_speed() * dt;

        let prev_x = self.position.x;
        if actions.steer_left {
            self.position.x -= self.tuning.strafe_speed * dt;
        }
        if actions.steer_right {
            self.position.x += self.tuning.strafe_speed * dt;
        }
        self.position.x = self.position.x.clamp(-TRACK_HALF_WIDTH, TRACK_HALF_WIDTH);

        // Held jump re-jumps on landing; the mid-air boost needs a fresh press
        if actions.jump && (self.grounded || !self.jump_held) {
            self.jump();
        }
        self.jump_held = actions.jump;

        if actions.slide {
            self.slide();
        }

        if actions.use_ability {
            self.use_ability(director, events);
        }

        self.integrate_vertical(dt, director);

        let hitbox = self.hitbox();
        let radius = self.profile.pickup_radius;
        let cutoff = self.tuning.collision_cutoff;

        let blocked = director.barriers().iter().any(|b| {
            resolve_contact(self.position, &hitbox, radius, cutoff, b) == Some(Contact::Blocked)
        });
        if blocked {
            self.position.x = prev_x;
        }

        // Hitbox after a possible barrier revert; obstacles swept by the
        // closing distance since the last check
        let hitbox = self.hitbox();
        let travel = self.effective_speed() * dt + director.track_speed() * real_dt;
        let hits: Vec<(EntityId, u8)> = director
            .obstacles()
            .iter()
            .filter(|o| {
                let swept = swept_along_z(o, travel);
                resolve_contact(self.position, &hitbox, radius, cutoff, &swept)
                    == Some(Contact::Lethal)
            })
            .filter_map(|o| match o.kind {
                EntityKind::Obstacle { archetype } => Some((o.id, archetype)),
                _ => None,
            })
            .collect();
        if !hits.is_empty() {
            if hits.iter().any(|&(_, archetype)| self.smashing != Some(archetype)) {
                self.crash(game, events);
                return;
            }
            for (id, _) in hits {
                if director.take(id).is_some() {
                    log::debug!("Smashed obstacle {:?}", id);
                    events.push(SimEvent::Cue(Cue::Smash));
                }
            }
        }

        let reached: Vec<EntityId> = director
            .collectibles()
            .iter()
            .filter(|c| {
                resolve_contact(self.position, &hitbox, radius, cutoff, c) == Some(Contact::Pickup)
            })
            .map(|c| c.id)
            .collect();
        for id in reached {
            self.collect(id, director, game, events);
        }
    }

    fn advance_timers(
        &mut self,
        real_dt: f32,
        dt: f32,
        director: &mut LevelDirector,
        game: &mut GameState,
        events: &mut Vec<SimEvent>,
    ) {
        if self.sliding {
            self.slide_remaining -= dt;
            if self.slide_remaining <= 0.0 {
                self.sliding = false;
                self.slide_remaining = 0.0;
            }
        }

        if self.ability_timer > 0.0 {
            self.ability_timer = (self.ability_timer - dt).max(0.0);
        }

        if let AbilityPhase::Active { remaining } = self.ability {
            let remaining = remaining - real_dt;
            if remaining <= 0.0 {
                self.end_ability(director, game, events);
            } else {
                self.ability = AbilityPhase::Active { remaining };
            }
        }
    }

    fn integrate_vertical(&mut self, dt: f32, director: &LevelDirector) {
        if !self.grounded {
            self.velocity.y -= self.tuning.gravity * dt;
        }
        self.position.y += self.velocity.y * dt;

        let ground = director.ground_height_at(self.position);
        if self.velocity.y <= 0.0 && self.position.y <= ground {
            self.position.y = ground;
            self.velocity.y = 0.0;
            if !self.grounded {
                self.air_boost_ready = false;
            }
            self.grounded = true;
        } else {
            self.grounded = false;
        }
    }

    /// Leave the ground, or spend the single mid-air boost while still rising
    pub fn jump(&mut self) -> bool {
        if self.grounded && !self.sliding {
            self.velocity.y = self.tuning.jump_force;
            self.grounded = false;
            self.air_boost_ready = true;
            true
        } else if !self.grounded && self.air_boost_ready && self.velocity.y > 0.0 {
            self.velocity.y += self.tuning.air_boost;
            self.air_boost_ready = false;
            true
        } else {
            false
        }
    }

    pub fn slide(&mut self) -> bool {
        if self.grounded && !self.sliding {
            self.sliding = true;
            self.slide_remaining = self.tuning.slide_duration;
            true
        } else {
            false
        }
    }

    /// Try to switch the ability on. Returns whether it activated.
    pub fn use_ability(
        &mut self,
        director: &mut LevelDirector,
        events: &mut Vec<SimEvent>,
    ) -> bool {
        let name = self.profile.ability_name;
        if self.is_ability_active() {
            log::debug!("{} already active", name);
            return false;
        }
        if self.ability_timer > 0.0 {
            log::debug!("{} on cooldown: {:.2}s", name, self.ability_timer);
            return false;
        }
        if !self.ability_enabled {
            log::debug!(
                "{} not enabled ({}/{} tokens)",
                name,
                self.tokens,
                self.tuning.token_threshold
            );
            return false;
        }
        let profile = self.profile;
        if !character::can_activate(&profile, self) {
            log::debug!("{} cannot activate right now", name);
            return false;
        }

        character::apply_ability(&profile, self, director);
        self.ability = AbilityPhase::Active {
            remaining: profile.ability_duration,
        };
        self.ability_timer = profile.ability_cooldown;
        log::info!("{} activated {}", profile.kind, name);
        events.push(SimEvent::AbilityActivated(profile.kind));
        events.push(SimEvent::Cue(Cue::Ability));
        true
    }

    /// Switch the effect off and spend the collected tokens
    fn end_ability(
        &mut self,
        director: &mut LevelDirector,
        game: &mut GameState,
        events: &mut Vec<SimEvent>,
    ) {
        let profile = self.profile;
        character::revert_ability(&profile, self, director);
        self.ability = AbilityPhase::Idle;
        self.tokens = 0;
        self.ability_enabled = false;
        game.set_token_progress(0);
        log::info!("{} ended", profile.ability_name);
        events.push(SimEvent::AbilityEnded(profile.kind));
    }

    /// Consume a pickup. Removal from the director happens first, so a second
    /// call for the same id awards nothing.
    pub fn collect(
        &mut self,
        id: EntityId,
        director: &mut LevelDirector,
        game: &mut GameState,
        events: &mut Vec<SimEvent>,
    ) -> bool {
        let Some(entity) = director.take(id) else {
            return false;
        };
        match entity.kind {
            EntityKind::Coin { value } => {
                game.add_score(value);
                events.push(SimEvent::Cue(Cue::Coin));
                log::debug!("Coin +{} (score {})", value, game.score);
            }
            EntityKind::Token { owner } if owner == self.kind() => {
                self.tokens += 1;
                game.set_token_progress(self.tokens);
                events.push(SimEvent::Cue(Cue::Token));
                if !self.ability_enabled && self.tokens >= self.tuning.token_threshold {
                    self.ability_enabled = true;
                    log::info!("{} ready", self.profile.ability_name);
                    events.push(SimEvent::AbilityReady(owner));
                }
            }
            EntityKind::Token { owner } => {
                log::debug!("{} token ignored by {}", owner, self.kind());
            }
            other => {
                log::warn!("Tried to collect non-pickup {}", other.label());
            }
        }
        true
    }

    /// Obstacle hit: stop dead and end the run
    fn crash(&mut self, game: &mut GameState, events: &mut Vec<SimEvent>) {
        self.crashed = true;
        self.speed = 0.0;
        self.burst_bonus = 0.0;
        self.velocity = Vec3::ZERO;
        log::info!("Hit obstacle, game over (score {})", game.score);
        match game.set_phase(LifecyclePhase::GameOver) {
            Ok(change) => push_phase_change(events, change),
            Err(e) => log::warn!("Crash ignored: {}", e),
        }
    }

    /// Back to the start line. Pending slide and ability countdowns are
    /// cancelled; the shortcut (if any) is removed from the director.
    pub fn reset(&mut self, director: &mut LevelDirector) {
        if let Some(id) = self.shortcut.take() {
            director.remove(id);
        }
        let model = std::mem::replace(&mut self.model, ModelState::Loading);
        *self = PlayerState::new(self.kind(), self.tuning.clone());
        self.model = model;
    }
}
