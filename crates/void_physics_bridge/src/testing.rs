//! Scripted backend for tests that must not depend on solver output

use crate::backend::{BackendRayHit, DynamicsBackend};
use crate::body::{BodyDesc, BodyHandle, Pose};
use crate::collider::{ColliderDesc, ColliderHandle};
use crate::config::PhysicsConfig;
use crate::error::{PhysicsError, Result};
use crate::layers::CollisionGroups;
use std::collections::HashMap;

struct ScriptedBody {
    pose: Pose,
    velocity: [f32; 3],
}

struct ScriptedCollider {
    groups: CollisionGroups,
    parent: Option<BodyHandle>,
}

/// Moves bodies by their linear velocity and reports whatever touching
/// pairs and ray hits the test scripted.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    bodies: HashMap<BodyHandle, ScriptedBody>,
    colliders: HashMap<ColliderHandle, ScriptedCollider>,
    next_index: u32,

    pub gravity: [f32; 3],
    pub touching: Vec<(ColliderHandle, ColliderHandle)>,
    pub hits: Vec<BackendRayHit>,
    pub integrated: Vec<f32>,
    pub refreshes: usize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collider_parent(&self, collider: ColliderHandle) -> Option<BodyHandle> {
        self.colliders.get(&collider).and_then(|c| c.parent)
    }

    pub fn collider_groups(&self, collider: ColliderHandle) -> Option<CollisionGroups> {
        self.colliders.get(&collider).map(|c| c.groups)
    }

    fn next(&mut self) -> u32 {
        self.next_index += 1;
        self.next_index
    }
}

impl DynamicsBackend for ScriptedBackend {
    fn apply_config(&mut self, config: &PhysicsConfig) {
        self.gravity = config.gravity;
    }

    fn set_gravity(&mut self, gravity: [f32; 3]) {
        self.gravity = gravity;
    }

    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let handle = BodyHandle::from_raw_parts(self.next(), 0);
        self.bodies.insert(
            handle,
            ScriptedBody {
                pose: desc.pose,
                velocity: desc.linear_velocity,
            },
        );
        handle
    }

    fn destroy_body(&mut self, body: BodyHandle) -> Result<()> {
        self.bodies
            .remove(&body)
            .ok_or(PhysicsError::UnknownBody(body))?;
        for collider in self.colliders.values_mut() {
            if collider.parent == Some(body) {
                collider.parent = None;
            }
        }
        Ok(())
    }

    fn create_collider(
        &mut self,
        desc: &ColliderDesc,
        parent: Option<BodyHandle>,
    ) -> Result<ColliderHandle> {
        if let Some(body) = parent {
            if !self.bodies.contains_key(&body) {
                return Err(PhysicsError::UnknownBody(body));
            }
        }
        let handle = ColliderHandle::from_raw_parts(self.next(), 0);
        self.colliders.insert(
            handle,
            ScriptedCollider {
                groups: desc.groups,
                parent,
            },
        );
        Ok(handle)
    }

    fn destroy_collider(&mut self, collider: ColliderHandle) -> Result<()> {
        self.colliders
            .remove(&collider)
            .map(|_| ())
            .ok_or_else(|| PhysicsError::Backend(format!("no collider {:?}", collider)))
    }

    fn set_collision_groups(
        &mut self,
        collider: ColliderHandle,
        groups: CollisionGroups,
    ) -> Result<()> {
        let collider = self
            .colliders
            .get_mut(&collider)
            .ok_or_else(|| PhysicsError::Backend(format!("no collider {:?}", collider)))?;
        collider.groups = groups;
        Ok(())
    }

    fn set_body_pose(&mut self, body: BodyHandle, pose: &Pose) -> Result<()> {
        let body = self
            .bodies
            .get_mut(&body)
            .ok_or(PhysicsError::UnknownBody(body))?;
        body.pose = *pose;
        Ok(())
    }

    fn set_body_linear_velocity(&mut self, body: BodyHandle, velocity: [f32; 3]) -> Result<()> {
        let body = self
            .bodies
            .get_mut(&body)
            .ok_or(PhysicsError::UnknownBody(body))?;
        body.velocity = velocity;
        Ok(())
    }

    fn body_pose(&self, body: BodyHandle) -> Option<Pose> {
        self.bodies.get(&body).map(|b| b.pose)
    }

    fn integrate(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            for axis in 0..3 {
                body.pose.position[axis] += body.velocity[axis] * dt;
            }
        }
        self.integrated.push(dt);
    }

    fn touching_pairs(&self) -> Vec<(ColliderHandle, ColliderHandle)> {
        self.touching.clone()
    }

    fn refresh_queries(&mut self) {
        self.refreshes += 1;
    }

    fn raycast(
        &self,
        _origin: [f32; 3],
        _direction: [f32; 3],
        max_distance: f32,
    ) -> Vec<BackendRayHit> {
        self.hits
            .iter()
            .filter(|hit| hit.distance <= max_distance)
            .copied()
            .collect()
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn collider_count(&self) -> usize {
        self.colliders.len()
    }
}
