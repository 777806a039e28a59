//! Collision detection between the player and track entities
//!
//! Stateless: every check is a pure function of the player's current feet
//! position / hitbox and one entity. Each category uses its own test:
//! - Obstacles and barriers: box overlap against the forgiving player hitbox
//! - Pickups: horizontal distance only (height is ignored, pickups float)
//! - Platforms: support under the feet, never blocking
//!
//! Anything farther than the cutoff distance is rejected before the precise test.

use glam::Vec3;

use super::entity::{Aabb, EntityKind, SpatialEntity};
use crate::ground_plane;

/// Outcome of a player/entity contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// Run-ending obstacle hit
    Lethal,
    /// Pickup reached
    Pickup,
    /// Lateral movement blocked by a barrier
    Blocked,
    /// Standing on or over a surface
    Support,
}

/// Cheap pre-filter: centers within `cutoff` (3D distance)
#[inline]
pub fn within_cutoff(player_pos: Vec3, entity: &SpatialEntity, cutoff: f32) -> bool {
    player_pos.distance_squared(entity.position) <= cutoff * cutoff
}

/// Box overlap between the player hitbox and the entity's current bounds
#[inline]
pub fn boxes_overlap(hitbox: &Aabb, entity: &SpatialEntity) -> bool {
    hitbox.intersects(&entity.bounds())
}

/// Horizontal distance test; the entity's own radius wins over the default
#[inline]
pub fn pickup_in_reach(player_pos: Vec3, entity: &SpatialEntity, default_radius: f32) -> bool {
    let radius = entity.pickup_radius.unwrap_or(default_radius);
    ground_plane(player_pos).distance(ground_plane(entity.position)) < radius
}

/// Copy of `entity` stretched along -z by `travel`, so the box covers every
/// spot the player crossed relative to it since the previous check
pub fn swept_along_z(entity: &SpatialEntity, travel: f32) -> SpatialEntity {
    let travel = travel.max(0.0);
    let mut swept = entity.clone();
    swept.size.z += travel;
    swept.position.z -= travel * 0.5;
    swept
}

/// Surface height under the feet, if this entity can hold the player.
///
/// A surface counts when the feet are inside its footprint and no lower than
/// `tolerance` beneath its top, so a falling player is caught even if one
/// step would carry it slightly past the top.
pub fn surface_under(feet: Vec3, entity: &SpatialEntity, tolerance: f32) -> Option<f32> {
    if !entity.kind.is_surface() {
        return None;
    }
    let top = entity.top();
    if entity.bounds().contains_footprint(feet.x, feet.z) && feet.y >= top - tolerance {
        Some(top)
    } else {
        None
    }
}

/// Classify the contact between the player and one entity
pub fn resolve_contact(
    player_pos: Vec3,
    hitbox: &Aabb,
    pickup_radius: f32,
    cutoff: f32,
    entity: &SpatialEntity,
) -> Option<Contact> {
    if !within_cutoff(player_pos, entity, cutoff) {
        return None;
    }

    match entity.kind {
        EntityKind::Obstacle { .. } => boxes_overlap(hitbox, entity).then_some(Contact::Lethal),
        EntityKind::Barrier => boxes_overlap(hitbox, entity).then_some(Contact::Blocked),
        EntityKind::Coin { .. } | EntityKind::Token { .. } => {
            pickup_in_reach(player_pos, entity, pickup_radius).then_some(Contact::Pickup)
        }
        EntityKind::Platform | EntityKind::Shortcut => {
            boxes_overlap(hitbox, entity).then_some(Contact::Support)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::character::CollisionProfile;
    use crate::sim::entity::EntityId;

    fn obstacle_at(pos: Vec3, size: Vec3) -> SpatialEntity {
        SpatialEntity::new(EntityId(1), EntityKind::Obstacle { archetype: 0 }, pos, size)
    }

    fn coin_at(pos: Vec3) -> SpatialEntity {
        SpatialEntity::new(EntityId(2), EntityKind::Coin { value: 10 }, pos, Vec3::splat(0.5))
    }

    #[test]
    fn test_obstacle_overlap_is_lethal() {
        let feet = Vec3::new(0.0, 0.0, -10.0);
        let hitbox = CollisionProfile::STANDARD.hitbox(feet, 1.0);
        let obstacle = obstacle_at(Vec3::new(0.2, 0.5, -10.0), Vec3::ONE);
        assert_eq!(
            resolve_contact(feet, &hitbox, 2.0, 5.0, &obstacle),
            Some(Contact::Lethal)
        );
    }

    #[test]
    fn test_forgiveness_margin_avoids_grazes() {
        // Body edge (0.8) would touch a box starting at 0.75, shrunk edge (0.3) does not
        let feet = Vec3::ZERO;
        let hitbox = CollisionProfile::STANDARD.hitbox(feet, 1.0);
        let obstacle = obstacle_at(Vec3::new(1.25, 0.5, 0.0), Vec3::ONE);
        let body = Aabb::from_feet_size(feet, Vec3::new(1.6, 1.8, 1.6));
        assert!(body.intersects(&obstacle.bounds()));
        assert_eq!(resolve_contact(feet, &hitbox, 2.0, 5.0, &obstacle), None);
    }

    #[test]
    fn test_pickup_ignores_height() {
        let feet = Vec3::new(0.0, 0.0, 0.0);
        let hitbox = CollisionProfile::STANDARD.hitbox(feet, 1.0);
        let high_coin = coin_at(Vec3::new(1.0, 3.0, 1.0));
        assert_eq!(
            resolve_contact(feet, &hitbox, 2.0, 5.0, &high_coin),
            Some(Contact::Pickup)
        );
        let far_coin = coin_at(Vec3::new(2.5, 1.0, 0.0));
        assert_eq!(resolve_contact(feet, &hitbox, 2.0, 5.0, &far_coin), None);
    }

    #[test]
    fn test_entity_radius_overrides_default() {
        let mut coin = coin_at(Vec3::new(0.0, 1.0, 1.5));
        assert!(pickup_in_reach(Vec3::ZERO, &coin, 2.0));
        coin.pickup_radius = Some(1.0);
        assert!(!pickup_in_reach(Vec3::ZERO, &coin, 2.0));
    }

    #[test]
    fn test_cutoff_skips_far_entities() {
        let feet = Vec3::ZERO;
        // Absurdly large hitbox would overlap, but the center is past the cutoff
        let hitbox = Aabb::from_center_size(Vec3::ZERO, Vec3::splat(100.0));
        let obstacle = obstacle_at(Vec3::new(0.0, 0.5, -6.0), Vec3::ONE);
        assert_eq!(resolve_contact(feet, &hitbox, 2.0, 5.0, &obstacle), None);
    }

    #[test]
    fn test_barrier_blocks() {
        let feet = Vec3::ZERO;
        let hitbox = CollisionProfile::CROUCHED.hitbox(feet, 1.0);
        let barrier = SpatialEntity::new(
            EntityId(3),
            EntityKind::Barrier,
            Vec3::new(0.4, 0.75, 0.0),
            Vec3::new(0.3, 1.5, 6.0),
        );
        assert_eq!(
            resolve_contact(feet, &hitbox, 1.0, 5.0, &barrier),
            Some(Contact::Blocked)
        );
    }

    #[test]
    fn test_sweep_catches_fast_crossing() {
        // Feet already 1.5 past the far face; the last step covered 2.0
        let feet = Vec3::new(0.0, 0.0, -2.3);
        let hitbox = CollisionProfile::STANDARD.hitbox(feet, 1.0);
        let obstacle = obstacle_at(Vec3::new(0.0, 0.5, 0.0), Vec3::ONE);
        assert_eq!(resolve_contact(feet, &hitbox, 2.0, 5.0, &obstacle), None);
        let swept = swept_along_z(&obstacle, 2.0);
        assert_eq!(
            resolve_contact(feet, &hitbox, 2.0, 5.0, &swept),
            Some(Contact::Lethal)
        );
        // Nothing gained behind the obstacle
        assert!((swept.bounds().max.z - obstacle.bounds().max.z).abs() < 1e-6);
    }

    #[test]
    fn test_surface_catches_fall_within_tolerance() {
        let platform = SpatialEntity::new(
            EntityId(4),
            EntityKind::Platform,
            Vec3::new(0.0, 1.5, 0.0),
            Vec3::new(5.0, 0.5, 10.0),
        );
        assert_eq!(surface_under(Vec3::new(1.0, 1.8, 2.0), &platform, 0.3), Some(1.75));
        assert_eq!(surface_under(Vec3::new(1.0, 1.6, 2.0), &platform, 0.3), Some(1.75));
        assert_eq!(surface_under(Vec3::new(1.0, 0.0, 2.0), &platform, 0.3), None);
        assert_eq!(surface_under(Vec3::new(3.0, 2.0, 2.0), &platform, 0.3), None);
    }
}
