//! Scene collaborator
//!
//! The core only adds, moves and removes opaque handles; it never reads
//! rendering state back.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::Serialize;

use crate::sim::{EntityId, EntityKind, SpatialEntity};

/// What a renderer needs to create a node for an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EntityHandle {
    pub id: EntityId,
    pub kind: EntityKind,
    pub size: Vec3,
}

pub trait SceneGraph {
    fn add_entity(&mut self, handle: EntityHandle, position: Vec3);
    fn remove_entity(&mut self, id: EntityId);
    /// Per-frame transform sync; renderers that poll can ignore it
    fn move_entity(&mut self, _id: EntityId, _position: Vec3, _rotation: f32) {}
}

/// Node as last reported to the scene
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SceneNode {
    pub handle: EntityHandle,
    pub position: Vec3,
    pub rotation: f32,
}

/// In-memory scene that mirrors every call, used headless and as the
/// snapshot source for a JS renderer
#[derive(Debug, Clone, Default)]
pub struct SceneMirror {
    nodes: BTreeMap<EntityId, SceneNode>,
    added: u64,
    removed: u64,
}

impl SceneMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: EntityId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.values()
    }

    /// (added, removed) totals since creation
    pub fn totals(&self) -> (u64, u64) {
        (self.added, self.removed)
    }

    /// True when the mirror holds exactly the live entities, at their positions
    pub fn matches<'a>(&self, live: impl Iterator<Item = &'a SpatialEntity>) -> bool {
        let mut count = 0;
        for entity in live {
            count += 1;
            match self.nodes.get(&entity.id) {
                Some(node) if node.position == entity.position => {}
                _ => return false,
            }
        }
        count == self.nodes.len()
    }
}

impl SceneGraph for SceneMirror {
    fn add_entity(&mut self, handle: EntityHandle, position: Vec3) {
        self.added += 1;
        self.nodes.insert(
            handle.id,
            SceneNode {
                handle,
                position,
                rotation: 0.0,
            },
        );
    }

    fn remove_entity(&mut self, id: EntityId) {
        if self.nodes.remove(&id).is_some() {
            self.removed += 1;
        } else {
            log::debug!("Scene asked to remove unknown {:?}", id);
        }
    }

    fn move_entity(&mut self, id: EntityId, position: Vec3, rotation: f32) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.position = position;
            node.rotation = rotation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_tracks_calls() {
        let mut scene = SceneMirror::new();
        let handle = EntityHandle {
            id: EntityId(3),
            kind: EntityKind::Platform,
            size: Vec3::new(5.0, 0.5, 10.0),
        };
        scene.add_entity(handle, Vec3::new(0.0, 1.5, -25.0));
        scene.move_entity(EntityId(3), Vec3::new(0.0, 1.5, -20.0), 0.0);
        assert_eq!(scene.node(EntityId(3)).unwrap().position.z, -20.0);

        scene.remove_entity(EntityId(3));
        scene.remove_entity(EntityId(3));
        assert!(scene.is_empty());
        assert_eq!(scene.totals(), (1, 1));
    }
}
