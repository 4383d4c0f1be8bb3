//! Dynamics backend seam
//!
//! The bridge never integrates or tests shapes itself. Everything that touches
//! numerical simulation or narrow-phase geometry goes through this trait;
//! [`crate::rapier_backend::RapierBackend`] is the production implementation.

use crate::body::{BodyDesc, BodyHandle, Pose};
use crate::collider::{ColliderDesc, ColliderHandle};
use crate::config::PhysicsConfig;
use crate::error::Result;
use crate::layers::CollisionGroups;

/// A ray hit as reported by the backend, before entity resolution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackendRayHit {
    /// The collider that was hit
    pub collider: ColliderHandle,
    /// Distance from the ray origin along the normalized direction
    pub distance: f32,
    /// Surface normal at the hit point
    pub normal: [f32; 3],
}

/// Operations the bridge needs from a rigid-body engine.
///
/// Methods taking a handle return an error when the handle is unknown to the
/// backend; the registry only hands out handles the backend created, so such
/// an error is a broken invariant.
pub trait DynamicsBackend {
    /// Apply solver settings and gravity from a validated configuration
    fn apply_config(&mut self, config: &PhysicsConfig);

    /// Replace gravity (already validated)
    fn set_gravity(&mut self, gravity: [f32; 3]);

    /// Create a rigid body
    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle;

    /// Destroy a rigid body. Attached colliders stay in place, detached.
    fn destroy_body(&mut self, body: BodyHandle) -> Result<()>;

    /// Create a collider, attached to `parent` or standalone
    fn create_collider(
        &mut self,
        desc: &ColliderDesc,
        parent: Option<BodyHandle>,
    ) -> Result<ColliderHandle>;

    /// Destroy a collider
    fn destroy_collider(&mut self, collider: ColliderHandle) -> Result<()>;

    /// Replace a collider's group/mask
    fn set_collision_groups(&mut self, collider: ColliderHandle, groups: CollisionGroups)
        -> Result<()>;

    /// Force a body's pose (teleport)
    fn set_body_pose(&mut self, body: BodyHandle, pose: &Pose) -> Result<()>;

    /// Force a body's linear velocity
    fn set_body_linear_velocity(&mut self, body: BodyHandle, velocity: [f32; 3]) -> Result<()>;

    /// Current pose of a body
    fn body_pose(&self, body: BodyHandle) -> Option<Pose>;

    /// Advance the simulation by one substep of `dt` seconds
    fn integrate(&mut self, dt: f32);

    /// Colliders currently touching (contact or sensor overlap)
    fn touching_pairs(&self) -> Vec<(ColliderHandle, ColliderHandle)>;

    /// Refresh spatial query structures after structural changes
    fn refresh_queries(&mut self);

    /// Every collider crossed by a ray within `max_distance`, in any order.
    /// `direction` is normalized.
    fn raycast(&self, origin: [f32; 3], direction: [f32; 3], max_distance: f32)
        -> Vec<BackendRayHit>;

    /// Number of live bodies
    fn body_count(&self) -> usize;

    /// Number of live colliders
    fn collider_count(&self) -> usize;
}
