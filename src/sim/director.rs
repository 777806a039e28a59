//! Procedural spawner and entity lifecycle
//!
//! The director owns every live track entity, split per category and kept
//! in spawn order so iteration is stable. It only ever reads the player
//! through a `PlayerView` snapshot; outcomes are applied by the player side.

use glam::Vec3;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use thiserror::Error;

use super::character::CharacterKind;
use super::entity::{Aabb, EntityId, EntityKind, SpatialEntity};
use super::events::SimEvent;
use crate::consts::{GROUND_HEIGHT, TRACK_HALF_WIDTH};
use crate::tuning::Tuning;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
    #[error("no free spot for {kind} after {attempts} attempts")]
    PlacementExhausted { kind: &'static str, attempts: u32 },
}

/// What the director needs to know about the player each update
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerView {
    /// Feet position
    pub position: Vec3,
    /// Effective forward speed (track speed)
    pub speed: f32,
}

/// Result of one obstacle spawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObstacleWave {
    /// Lanes chosen to be blocked (always fewer than the lane count)
    pub blocked_lanes: Vec<usize>,
    /// Obstacles actually placed
    pub ids: Vec<EntityId>,
}

/// Obstacle archetypes: (size, color)
const OBSTACLE_ARCHETYPES: [(Vec3, u32); 3] = [
    (Vec3::new(1.0, 1.0, 1.0), 0xff0000),
    (Vec3::new(2.0, 2.0, 1.0), 0xff4500),
    (Vec3::new(1.0, 2.0, 1.0), 0x8b0000),
];

const COLLECTIBLE_SIZE: f32 = 0.5;
const COLLECTIBLE_HEIGHT: f32 = 1.0;
const COIN_COLOR: u32 = 0xffff00;

const PLATFORM_SIZE: Vec3 = Vec3::new(5.0, 0.5, 10.0);
const PLATFORM_HEIGHT: f32 = 1.5;
const PLATFORM_COLOR: u32 = 0xa9a9a9;

const BARRIER_SIZE: Vec3 = Vec3::new(0.3, 1.5, 6.0);
const BARRIER_COLOR: u32 = 0x808080;

const SHORTCUT_HEIGHT: f32 = 1.0;
const SHORTCUT_COLOR: u32 = 0xffff00;

/// How far below a surface top the feet may be and still land on it
pub const SURFACE_CATCH: f32 = 0.3;

/// Collectible table: one coin entry plus one token per character
fn collectible_table(coin_value: u64) -> [EntityKind; 5] {
    [
        EntityKind::Coin { value: coin_value },
        EntityKind::Token { owner: CharacterKind::Dax },
        EntityKind::Token { owner: CharacterKind::Nox },
        EntityKind::Token { owner: CharacterKind::Buggy },
        EntityKind::Token { owner: CharacterKind::Teag },
    ]
}

fn overlaps_any<'a>(bounds: &Aabb, mut others: impl Iterator<Item = &'a SpatialEntity>) -> bool {
    others.any(|e| e.bounds().intersects(bounds))
}

#[derive(Debug, Clone)]
pub struct LevelDirector {
    tuning: Tuning,
    rng: Pcg32,

    obstacles: Vec<SpatialEntity>,
    collectibles: Vec<SpatialEntity>,
    /// Platforms and shortcuts (every walkable surface)
    platforms: Vec<SpatialEntity>,
    barriers: Vec<SpatialEntity>,

    obstacle_timer: f32,
    collectible_timer: f32,
    platform_timer: f32,
    barrier_timer: f32,

    /// Speed entities moved at during the last update
    track_speed: f32,
    player: PlayerView,
    next_id: u32,
    pending: Vec<SimEvent>,
}

impl LevelDirector {
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        Self {
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            obstacles: Vec::new(),
            collectibles: Vec::new(),
            platforms: Vec::new(),
            barriers: Vec::new(),
            obstacle_timer: 0.0,
            collectible_timer: 0.0,
            platform_timer: 0.0,
            barrier_timer: 0.0,
            track_speed: 0.0,
            player: PlayerView::default(),
            next_id: 1,
            pending: Vec::new(),
        }
    }

    /// Spawn on schedule, move everything toward the player, retire what passed
    pub fn update(&mut self, dt: f32, player: PlayerView) {
        self.player = player;
        self.track_speed = player.speed;

        self.obstacle_timer += dt;
        while self.obstacle_timer >= self.tuning.obstacle_interval {
            self.obstacle_timer -= self.tuning.obstacle_interval;
            if let Err(e) = self.spawn_obstacle() {
                log::warn!("Obstacle spawn skipped: {}", e);
            }
        }

        self.collectible_timer += dt;
        while self.collectible_timer >= self.tuning.collectible_interval {
            self.collectible_timer -= self.tuning.collectible_interval;
            if let Err(e) = self.spawn_collectible() {
                log::warn!("Collectible spawn skipped: {}", e);
            }
        }

        self.platform_timer += dt;
        while self.platform_timer >= self.tuning.platform_interval {
            self.platform_timer -= self.tuning.platform_interval;
            self.spawn_platform();
        }

        self.barrier_timer += dt;
        while self.barrier_timer >= self.tuning.barrier_interval {
            self.barrier_timer -= self.tuning.barrier_interval;
            if let Err(e) = self.spawn_barrier() {
                log::warn!("Barrier spawn skipped: {}", e);
            }
        }

        let dz = self.track_speed * dt;
        for entity in self.all_mut() {
            entity.advance(dz, dt);
        }

        self.retire_passed();
    }

    fn all_mut(&mut self) -> impl Iterator<Item = &mut SpatialEntity> {
        self.obstacles
            .iter_mut()
            .chain(self.collectibles.iter_mut())
            .chain(self.platforms.iter_mut())
            .chain(self.barriers.iter_mut())
    }

    /// Every live entity, in category then spawn order
    pub fn all(&self) -> impl Iterator<Item = &SpatialEntity> {
        self.obstacles
            .iter()
            .chain(self.collectibles.iter())
            .chain(self.platforms.iter())
            .chain(self.barriers.iter())
    }

    fn retire_passed(&mut self) {
        let limit = self.player.position.z + self.tuning.retire_margin;
        let pending = &mut self.pending;
        for list in [
            &mut self.obstacles,
            &mut self.collectibles,
            &mut self.platforms,
            &mut self.barriers,
        ] {
            list.retain(|e| {
                if e.position.z > limit {
                    log::debug!("Retired {} {:?} at z={:.2}", e.kind.label(), e.id, e.position.z);
                    pending.push(SimEvent::Despawned { id: e.id });
                    false
                } else {
                    true
                }
            });
        }
    }

    fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    fn lane_width(&self) -> f32 {
        TRACK_HALF_WIDTH * 2.0 / self.tuning.lane_count as f32
    }

    /// Center x of a lane
    pub fn lane_center(&self, lane: usize) -> f32 {
        -TRACK_HALF_WIDTH + self.lane_width() * (lane as f32 + 0.5)
    }

    /// Commit an entity to its category collection and announce it
    fn commit(&mut self, entity: SpatialEntity) -> EntityId {
        let id = entity.id;
        self.pending.push(SimEvent::Spawned {
            id,
            kind: entity.kind,
            position: entity.position,
            size: entity.size,
        });
        match entity.kind {
            EntityKind::Obstacle { .. } => self.obstacles.push(entity),
            EntityKind::Coin { .. } | EntityKind::Token { .. } => self.collectibles.push(entity),
            EntityKind::Platform | EntityKind::Shortcut => self.platforms.push(entity),
            EntityKind::Barrier => self.barriers.push(entity),
        }
        id
    }

    /// Place an entity directly (no overlap check)
    pub fn place(&mut self, kind: EntityKind, position: Vec3, size: Vec3) -> EntityId {
        let id = self.next_entity_id();
        self.commit(SpatialEntity::new(id, kind, position, size))
    }

    /// Block a random subset of lanes, always leaving at least one open
    pub fn spawn_obstacle(&mut self) -> Result<ObstacleWave, SpawnError> {
        let lane_count = self.tuning.lane_count;
        let lane_width = self.lane_width();
        let attempts = self.tuning.placement_attempts.max(1);
        let z = self.player.position.z - self.tuning.spawn_distance;

        let mut lanes: Vec<usize> = (0..lane_count).collect();
        lanes.shuffle(&mut self.rng);
        let block_count = self.rng.random_range(1..lane_count);
        lanes.truncate(block_count);
        lanes.sort_unstable();

        let mut ids = Vec::with_capacity(lanes.len());
        for &lane in &lanes {
            let archetype = self.rng.random_range(0..OBSTACLE_ARCHETYPES.len());
            let (base_size, color) = OBSTACLE_ARCHETYPES[archetype];
            // Never wider than the lane, so neighbors stay untouched
            let size = Vec3::new(base_size.x.min(lane_width), base_size.y, base_size.z);
            let slack = ((lane_width - size.x) * 0.5).max(0.0);
            let jitter = self.tuning.lane_jitter.min(slack);
            let center_x = self.lane_center(lane);

            let mut placed = None;
            for _ in 0..attempts {
                let x = if jitter > 0.0 {
                    center_x + self.rng.random_range(-jitter..=jitter)
                } else {
                    center_x
                };
                let position = Vec3::new(x, GROUND_HEIGHT + size.y * 0.5, z);
                let bounds = Aabb::from_center_size(position, size);
                let blocked = overlaps_any(
                    &bounds,
                    self.obstacles
                        .iter()
                        .chain(self.collectibles.iter())
                        .chain(self.barriers.iter()),
                );
                if !blocked {
                    placed = Some(position);
                    break;
                }
            }

            match placed {
                Some(position) => {
                    let id = self.next_entity_id();
                    let mut entity = SpatialEntity::new(
                        id,
                        EntityKind::Obstacle {
                            archetype: archetype as u8,
                        },
                        position,
                        size,
                    );
                    entity.color = color;
                    log::debug!("Spawned obstacle {:?} in lane {} at {:?}", id, lane, position);
                    ids.push(self.commit(entity));
                }
                None => log::debug!("Lane {} had no free spot", lane),
            }
        }

        if ids.is_empty() {
            return Err(SpawnError::PlacementExhausted {
                kind: "obstacle",
                attempts,
            });
        }
        Ok(ObstacleWave {
            blocked_lanes: lanes,
            ids,
        })
    }

    /// Coin or token at a random lateral offset and depth
    pub fn spawn_collectible(&mut self) -> Result<EntityId, SpawnError> {
        let attempts = self.tuning.placement_attempts.max(1);
        let table = collectible_table(self.tuning.coin_value);
        let kind = table[self.rng.random_range(0..table.len())];
        let size = Vec3::splat(COLLECTIBLE_SIZE);
        let reach = TRACK_HALF_WIDTH - COLLECTIBLE_SIZE * 0.5;

        for _ in 0..attempts {
            let x = self.rng.random_range(-reach..=reach);
            let depth = self.tuning.spawn_distance
                + self.rng.random::<f32>() * self.tuning.collectible_depth_jitter;
            let position = Vec3::new(x, COLLECTIBLE_HEIGHT, self.player.position.z - depth);
            let bounds = Aabb::from_center_size(position, size);
            let blocked = overlaps_any(
                &bounds,
                self.obstacles
                    .iter()
                    .chain(self.platforms.iter())
                    .chain(self.collectibles.iter()),
            );
            if blocked {
                continue;
            }

            let id = self.next_entity_id();
            let mut entity = SpatialEntity::new(id, kind, position, size);
            entity.rotation_speed = self.tuning.pickup_spin;
            entity.color = match kind {
                EntityKind::Token { owner } => owner.color(),
                _ => COIN_COLOR,
            };
            log::debug!("Spawned {} {:?} at {:?}", kind.label(), id, position);
            return Ok(self.commit(entity));
        }

        Err(SpawnError::PlacementExhausted {
            kind: "collectible",
            attempts,
        })
    }

    /// Fixed elevated platform at track center
    pub fn spawn_platform(&mut self) -> EntityId {
        let position = Vec3::new(
            0.0,
            PLATFORM_HEIGHT,
            self.player.position.z - self.tuning.platform_distance,
        );
        let id = self.next_entity_id();
        let mut entity = SpatialEntity::new(id, EntityKind::Platform, position, PLATFORM_SIZE);
        entity.color = PLATFORM_COLOR;
        log::debug!("Spawned platform {:?} at {:?}", id, position);
        self.commit(entity)
    }

    /// Thin wall standing on a random lane boundary
    pub fn spawn_barrier(&mut self) -> Result<EntityId, SpawnError> {
        let attempts = self.tuning.placement_attempts.max(1);
        let lane_width = self.lane_width();
        let z = self.player.position.z - self.tuning.spawn_distance;

        for _ in 0..attempts {
            let boundary = self.rng.random_range(1..self.tuning.lane_count);
            let x = -TRACK_HALF_WIDTH + lane_width * boundary as f32;
            let position = Vec3::new(x, GROUND_HEIGHT + BARRIER_SIZE.y * 0.5, z);
            let bounds = Aabb::from_center_size(position, BARRIER_SIZE);
            if overlaps_any(&bounds, self.obstacles.iter().chain(self.barriers.iter())) {
                continue;
            }
            let id = self.next_entity_id();
            let mut entity = SpatialEntity::new(id, EntityKind::Barrier, position, BARRIER_SIZE);
            entity.color = BARRIER_COLOR;
            log::debug!("Spawned barrier {:?} on boundary {}", id, boundary);
            return Ok(self.commit(entity));
        }

        Err(SpawnError::PlacementExhausted {
            kind: "barrier",
            attempts,
        })
    }

    /// Temporary walkable shortcut centered on (x, z)
    pub fn spawn_shortcut(&mut self, x: f32, z: f32, size: Vec3) -> EntityId {
        let id = self.next_entity_id();
        let position = Vec3::new(x, SHORTCUT_HEIGHT, z);
        let mut entity = SpatialEntity::new(id, EntityKind::Shortcut, position, size);
        entity.color = SHORTCUT_COLOR;
        log::debug!("Shortcut {:?} placed at {:?}", id, position);
        self.commit(entity)
    }

    /// Remove an entity from its collection; returns it if it was still live.
    ///
    /// Removal is immediate, so a second call for the same id is a no-op.
    pub fn take(&mut self, id: EntityId) -> Option<SpatialEntity> {
        for list in [
            &mut self.obstacles,
            &mut self.collectibles,
            &mut self.platforms,
            &mut self.barriers,
        ] {
            if let Some(index) = list.iter().position(|e| e.id == id) {
                let entity = list.remove(index);
                self.pending.push(SimEvent::Despawned { id });
                return Some(entity);
            }
        }
        None
    }

    pub fn remove(&mut self, id: EntityId) -> bool {
        self.take(id).is_some()
    }

    /// Drop every entity and restart the spawn schedule
    pub fn clear(&mut self) {
        let ids: Vec<EntityId> = self.all().map(|e| e.id).collect();
        for id in ids {
            self.pending.push(SimEvent::Despawned { id });
        }
        self.obstacles.clear();
        self.collectibles.clear();
        self.platforms.clear();
        self.barriers.clear();
        self.obstacle_timer = 0.0;
        self.collectible_timer = 0.0;
        self.platform_timer = 0.0;
        self.barrier_timer = 0.0;
        self.track_speed = 0.0;
    }

    /// Height the feet rest on at (x, z): highest surface caught, else the track
    pub fn ground_height_at(&self, feet: Vec3) -> f32 {
        self.platforms
            .iter()
            .filter_map(|p| super::collision::surface_under(feet, p, SURFACE_CATCH))
            .fold(GROUND_HEIGHT, f32::max)
    }

    /// Point the director at a new player snapshot without advancing anything
    pub fn observe(&mut self, player: PlayerView) {
        self.player = player;
    }

    pub fn obstacles(&self) -> &[SpatialEntity] {
        &self.obstacles
    }

    pub fn collectibles(&self) -> &[SpatialEntity] {
        &self.collectibles
    }

    pub fn platforms(&self) -> &[SpatialEntity] {
        &self.platforms
    }

    pub fn barriers(&self) -> &[SpatialEntity] {
        &self.barriers
    }

    pub fn get(&self, id: EntityId) -> Option<&SpatialEntity> {
        self.all().find(|e| e.id == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn track_speed(&self) -> f32 {
        self.track_speed
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn entity_count(&self) -> usize {
        self.obstacles.len() + self.collectibles.len() + self.platforms.len() + self.barriers.len()
    }

    /// Hand queued scene events to the caller
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn director() -> LevelDirector {
        LevelDirector::new(Tuning::default(), 7)
    }

    /// Lanes whose open interval is touched by any obstacle of the wave
    fn covered_lanes(d: &LevelDirector, wave: &ObstacleWave) -> Vec<usize> {
        let lane_width = TRACK_HALF_WIDTH * 2.0 / d.tuning().lane_count as f32;
        let mut covered = Vec::new();
        for lane in 0..d.tuning().lane_count {
            let lo = -TRACK_HALF_WIDTH + lane_width * lane as f32;
            let hi = lo + lane_width;
            let hit = wave.ids.iter().any(|id| {
                let b = d.get(*id).unwrap().bounds();
                b.max.x > lo + 1e-4 && b.min.x < hi - 1e-4
            });
            if hit {
                covered.push(lane);
            }
        }
        covered
    }

    #[test]
    fn test_obstacle_retired_after_passing_margin() {
        let mut d = director();
        let view = PlayerView {
            position: Vec3::ZERO,
            speed: 10.0,
        };
        d.observe(view);
        let id = d.place(
            EntityKind::Obstacle { archetype: 0 },
            Vec3::new(0.0, 0.5, -20.0),
            Vec3::ONE,
        );

        for _ in 0..34 {
            d.update(0.1, view);
        }
        assert!(d.contains(id), "still ahead of the boundary at z=14");

        // 3.5 s: exactly on the boundary, retirement needs z strictly past it
        d.update(0.1, view);
        assert_eq!(d.get(id).map(|o| o.position.z), Some(15.0));

        d.update(0.1, view);
        assert!(!d.contains(id));
        assert!(d.obstacles().iter().all(|o| o.id != id));
        assert!(
            d.drain_events()
                .iter()
                .any(|e| *e == SimEvent::Despawned { id })
        );
    }

    #[test]
    fn test_timers_subtract_interval() {
        let tuning = Tuning {
            collectible_interval: 100.0,
            ..Tuning::default()
        };
        let mut d = LevelDirector::new(tuning, 7);
        // Moving track so each wave clears the spawn row before the next
        let view = PlayerView {
            position: Vec3::ZERO,
            speed: 10.0,
        };
        // 2.5 s in one step: one obstacle wave is due, the 5 s platform is not
        d.update(2.5, view);
        assert!(!d.obstacles().is_empty());
        assert!(d.platforms().is_empty());
        // Leftover 0.5 s carries over, so the next wave comes 1.5 s later
        let before = d.obstacles().len();
        d.update(1.4, view);
        assert_eq!(d.obstacles().len(), before);
        d.update(0.2, view);
        assert!(d.obstacles().len() > before);
    }

    #[test]
    fn test_take_is_idempotent() {
        let mut d = director();
        let id = d.place(
            EntityKind::Coin { value: 10 },
            Vec3::new(0.0, 1.0, -5.0),
            Vec3::splat(0.5),
        );
        assert!(d.take(id).is_some());
        assert!(d.take(id).is_none());
        assert!(d.collectibles().is_empty());
    }

    #[test]
    fn test_collectible_avoids_obstacles() {
        let mut d = director();
        for _ in 0..20 {
            let _ = d.spawn_obstacle();
            if let Ok(id) = d.spawn_collectible() {
                let c = d.get(id).unwrap().bounds();
                assert!(d.obstacles().iter().all(|o| !o.bounds().intersects(&c)));
            }
        }
    }

    #[test]
    fn test_exhausted_placement_is_reported() {
        let mut d = director();
        // Wall the whole spawn row with one wide obstacle
        d.place(
            EntityKind::Obstacle { archetype: 0 },
            Vec3::new(0.0, 1.0, -20.0),
            Vec3::new(20.0, 2.0, 2.0),
        );
        let err = d.spawn_obstacle().unwrap_err();
        assert_eq!(
            err,
            SpawnError::PlacementExhausted {
                kind: "obstacle",
                attempts: 10
            }
        );
        // update swallows the failure
        d.update(2.0, PlayerView::default());
    }

    #[test]
    fn test_platform_is_fixed() {
        let mut d = director();
        d.observe(PlayerView {
            position: Vec3::new(3.0, 0.0, -40.0),
            speed: 0.0,
        });
        let id = d.spawn_platform();
        let p = d.get(id).unwrap();
        assert_eq!(p.position, Vec3::new(0.0, 1.5, -65.0));
        assert_eq!(p.size, Vec3::new(5.0, 0.5, 10.0));
    }

    #[test]
    fn test_ground_height_from_platform() {
        let mut d = director();
        d.place(
            EntityKind::Platform,
            Vec3::new(0.0, 1.5, -10.0),
            Vec3::new(5.0, 0.5, 10.0),
        );
        assert_eq!(d.ground_height_at(Vec3::new(0.0, 2.0, -10.0)), 1.75);
        assert_eq!(d.ground_height_at(Vec3::new(0.0, 0.0, -10.0)), GROUND_HEIGHT);
        assert_eq!(d.ground_height_at(Vec3::new(6.0, 2.0, -10.0)), GROUND_HEIGHT);
    }

    #[test]
    fn test_barrier_sits_on_lane_boundary() {
        let mut d = director();
        let id = d.spawn_barrier().unwrap();
        let x = d.get(id).unwrap().position.x;
        let boundaries = [-4.5, 0.0, 4.5];
        assert!(boundaries.iter().any(|b| (x - b).abs() < 1e-4));
    }

    #[test]
    fn test_clear_announces_removals() {
        let mut d = director();
        d.update(5.0, PlayerView::default());
        let live = d.entity_count();
        assert!(live > 0);
        d.drain_events();
        d.clear();
        assert_eq!(d.entity_count(), 0);
        let removed = d
            .drain_events()
            .iter()
            .filter(|e| matches!(e, SimEvent::Despawned { .. }))
            .count();
        assert_eq!(removed, live);
    }

    proptest! {
        #[test]
        fn prop_wave_leaves_open_lane(seed in any::<u64>(), lanes in 2usize..=8) {
            let tuning = Tuning { lane_count: lanes, ..Tuning::default() };
            let mut d = LevelDirector::new(tuning, seed);
            let wave = d.spawn_obstacle().unwrap();
            prop_assert!(wave.blocked_lanes.len() < lanes);
            prop_assert!(!wave.blocked_lanes.is_empty());
            let covered = covered_lanes(&d, &wave);
            prop_assert!(covered.len() < lanes);
            for lane in covered {
                prop_assert!(wave.blocked_lanes.contains(&lane));
            }
        }

        #[test]
        fn prop_spawns_stay_on_track(seed in any::<u64>()) {
            let mut d = LevelDirector::new(Tuning::default(), seed);
            for _ in 0..10 {
                let _ = d.spawn_obstacle();
                let _ = d.spawn_collectible();
            }
            for e in d.all() {
                let b = e.bounds();
                prop_assert!(b.min.x >= -TRACK_HALF_WIDTH - 1e-4);
                prop_assert!(b.max.x <= TRACK_HALF_WIDTH + 1e-4);
            }
        }
    }
}
