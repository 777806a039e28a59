//! Spatial entities shared by the player, spawner and collision resolver
//!
//! Positions are box centers except for the player, whose position is the
//! center of its feet. Bounds are always derived from the current position,
//! so a bounding volume can never go stale between a move and a query.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::character::CharacterKind;

/// Unique identifier for a spawned entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box of `size` centered on `center`
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Box of `size` standing on `feet` (feet = bottom face center)
    pub fn from_feet_size(feet: Vec3, size: Vec3) -> Self {
        let half = Vec3::new(size.x * 0.5, 0.0, size.z * 0.5);
        Self {
            min: feet - half,
            max: feet + half + Vec3::new(0.0, size.y, 0.0),
        }
    }

    /// Overlap test; touching faces count as intersecting
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Pull the x/z faces inward by `margin`, never past the center
    pub fn shrink_horizontal(&self, margin: f32) -> Self {
        let center = self.center();
        let shrink = |lo: f32, hi: f32, c: f32| -> (f32, f32) {
            ((lo + margin).min(c), (hi - margin).max(c))
        };
        let (min_x, max_x) = shrink(self.min.x, self.max.x, center.x);
        let (min_z, max_z) = shrink(self.min.z, self.max.z, center.z);
        Self {
            min: Vec3::new(min_x, self.min.y, min_z),
            max: Vec3::new(max_x, self.max.y, max_z),
        }
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// True when the x/z point lies inside the box footprint
    pub fn contains_footprint(&self, x: f32, z: f32) -> bool {
        x >= self.min.x && x <= self.max.x && z >= self.min.z && z <= self.max.z
    }
}

/// Entity category, with the per-category payload attached
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Lethal on contact
    Obstacle { archetype: u8 },
    /// Score pickup
    Coin { value: u64 },
    /// Ability progress pickup for one character
    Token { owner: CharacterKind },
    /// Elevated, non-blocking surface
    Platform,
    /// Non-lethal wall that blocks lateral movement
    Barrier,
    /// Temporary platform placed by the Pathfinder ability
    Shortcut,
}

impl EntityKind {
    pub fn is_pickup(&self) -> bool {
        matches!(self, EntityKind::Coin { .. } | EntityKind::Token { .. })
    }

    pub fn is_surface(&self) -> bool {
        matches!(self, EntityKind::Platform | EntityKind::Shortcut)
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Obstacle { .. } => "obstacle",
            EntityKind::Coin { .. } => "coin",
            EntityKind::Token { .. } => "token",
            EntityKind::Platform => "platform",
            EntityKind::Barrier => "barrier",
            EntityKind::Shortcut => "shortcut",
        }
    }
}

/// A positioned, sized object in the track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpatialEntity {
    pub id: EntityId,
    pub kind: EntityKind,
    /// Box center
    pub position: Vec3,
    pub size: Vec3,
    /// Cosmetic spin (radians/sec, 0 = static)
    #[serde(default)]
    pub rotation_speed: f32,
    /// Current cosmetic yaw
    #[serde(default)]
    pub rotation: f32,
    /// Per-entity pickup radius override
    #[serde(default)]
    pub pickup_radius: Option<f32>,
    /// Display color (0xRRGGBB), cosmetic
    #[serde(default)]
    pub color: u32,
}

impl SpatialEntity {
    pub fn new(id: EntityId, kind: EntityKind, position: Vec3, size: Vec3) -> Self {
        Self {
            id,
            kind,
            position,
            size,
            rotation_speed: 0.0,
            rotation: 0.0,
            pickup_radius: None,
            color: 0xffffff,
        }
    }

    /// Bounding box at the current position
    #[inline]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_size(self.position, self.size)
    }

    /// Top surface height (used for platforms)
    #[inline]
    pub fn top(&self) -> f32 {
        self.position.y + self.size.y * 0.5
    }

    /// Advance toward the player and apply cosmetic spin
    pub fn advance(&mut self, dz: f32, dt: f32) {
        self.position.z += dz;
        if self.rotation_speed != 0.0 {
            self.rotation = (self.rotation + self.rotation_speed * dt) % std::f32::consts::TAU;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_touching_faces_intersect() {
        let a = Aabb::from_center_size(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::from_center_size(Vec3::new(1.0, 0.0, 0.0), Vec3::ONE);
        assert!(a.intersects(&b));

        let c = Aabb::from_center_size(Vec3::new(1.01, 0.0, 0.0), Vec3::ONE);
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_shrink_never_inverts() {
        let a = Aabb::from_center_size(Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.6, 1.0, 0.6));
        let s = a.shrink_horizontal(0.5);
        assert!(s.min.x <= s.max.x);
        assert!((s.center().x - 2.0).abs() < 1e-5);
        assert_eq!(s.min.y, a.min.y);
    }

    #[test]
    fn test_feet_box_stands_on_point() {
        let b = Aabb::from_feet_size(Vec3::new(1.0, 0.5, -3.0), Vec3::new(2.0, 1.0, 2.0));
        assert_eq!(b.min.y, 0.5);
        assert_eq!(b.max.y, 1.5);
        assert_eq!(b.min.x, 0.0);
        assert_eq!(b.max.z, -2.0);
    }

    #[test]
    fn test_advance_spins_pickups() {
        let mut e = SpatialEntity::new(
            EntityId(1),
            EntityKind::Coin { value: 10 },
            Vec3::new(0.0, 1.0, -20.0),
            Vec3::splat(0.5),
        );
        e.rotation_speed = 2.0;
        e.advance(1.5, 0.1);
        assert!((e.position.z + 18.5).abs() < 1e-5);
        assert!((e.rotation - 0.2).abs() < 1e-5);
    }
}
