//! Raycast queries
//!
//! Queries read the backend's spatial structures as of the last
//! synchronize or step. Contact filtering does not apply to rays unless the
//! caller passes a mask in [`RaycastOptions`].

use crate::backend::DynamicsBackend;
use crate::collider::ColliderHandle;
use crate::entity::Entity;
use crate::error::{PhysicsError, Result};
use crate::registry::Registry;
use std::iter::FusedIterator;

/// Result of a raycast.
///
/// Callers can keep one around and pass it to every
/// [`PhysicsQuery::raycast_closest`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastResult {
    /// Entity that was hit
    pub entity: Option<Entity>,
    /// Hit point in world space
    pub point: [f32; 3],
    /// Surface normal at hit point
    pub normal: [f32; 3],
    /// Distance from ray origin
    pub distance: f32,
    /// Collider that was hit
    pub collider: Option<ColliderHandle>,
}

impl Default for RaycastResult {
    fn default() -> Self {
        Self {
            entity: None,
            point: [0.0; 3],
            normal: [0.0; 3],
            distance: f32::INFINITY,
            collider: None,
        }
    }
}

impl RaycastResult {
    /// Clear back to "no hit"
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether this holds a hit
    pub fn is_hit(&self) -> bool {
        self.entity.is_some()
    }
}

/// Options for raycasting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RaycastOptions {
    /// Only hit colliders whose group intersects this mask
    pub filter_mask: Option<u32>,
    /// Ignore sensor colliders
    pub skip_sensors: bool,
}

impl RaycastOptions {
    /// Restrict hits to the given groups
    pub fn with_filter_mask(mut self, mask: u32) -> Self {
        self.filter_mask = Some(mask);
        self
    }

    /// Ignore sensors
    pub fn skipping_sensors(mut self) -> Self {
        self.skip_sensors = true;
        self
    }
}

/// Hits of a [`PhysicsQuery::raycast_all`], nearest first.
///
/// Consumed once; run the query again for a fresh sequence.
#[derive(Debug)]
pub struct RaycastHits {
    inner: std::vec::IntoIter<RaycastResult>,
}

impl Iterator for RaycastHits {
    type Item = RaycastResult;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for RaycastHits {}
impl FusedIterator for RaycastHits {}

/// Physics query interface
pub struct PhysicsQuery<'a, B: DynamicsBackend + ?Sized> {
    backend: &'a B,
    registry: &'a Registry,
}

impl<'a, B: DynamicsBackend + ?Sized> PhysicsQuery<'a, B> {
    pub fn new(backend: &'a B, registry: &'a Registry) -> Self {
        Self { backend, registry }
    }

    /// Nearest hit on the segment `origin -> target`, written into `out`.
    ///
    /// Returns `Ok(false)` and resets `out` when nothing is hit.
    pub fn raycast_closest(
        &self,
        origin: [f32; 3],
        target: [f32; 3],
        out: &mut RaycastResult,
    ) -> Result<bool> {
        self.raycast_closest_with(origin, target, RaycastOptions::default(), out)
    }

    /// [`Self::raycast_closest`] with options
    pub fn raycast_closest_with(
        &self,
        origin: [f32; 3],
        target: [f32; 3],
        options: RaycastOptions,
        out: &mut RaycastResult,
    ) -> Result<bool> {
        out.reset();
        self.visit_hits(origin, target, options, |hit| {
            if !out.is_hit() || nearer(&hit, out) {
                *out = hit;
            }
        })?;
        Ok(out.is_hit())
    }

    /// Every hit on the segment `origin -> target`, nearest first
    pub fn raycast_all(&self, origin: [f32; 3], target: [f32; 3]) -> Result<RaycastHits> {
        self.raycast_all_with(origin, target, RaycastOptions::default())
    }

    /// [`Self::raycast_all`] with options
    pub fn raycast_all_with(
        &self,
        origin: [f32; 3],
        target: [f32; 3],
        options: RaycastOptions,
    ) -> Result<RaycastHits> {
        let mut hits = Vec::new();
        self.visit_hits(origin, target, options, |hit| hits.push(hit))?;
        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.entity.cmp(&b.entity))
        });
        Ok(RaycastHits {
            inner: hits.into_iter(),
        })
    }

    /// Resolve and filter every backend hit on the segment, in backend order
    fn visit_hits(
        &self,
        origin: [f32; 3],
        target: [f32; 3],
        options: RaycastOptions,
        mut visit: impl FnMut(RaycastResult),
    ) -> Result<()> {
        let delta = [
            target[0] - origin[0],
            target[1] - origin[1],
            target[2] - origin[2],
        ];
        let length = (delta[0] * delta[0] + delta[1] * delta[1] + delta[2] * delta[2]).sqrt();

        if !length.is_finite() || length <= f32::EPSILON || !origin.iter().all(|c| c.is_finite())
        {
            return Ok(());
        }

        let direction = [delta[0] / length, delta[1] / length, delta[2] / length];

        for hit in self.backend.raycast(origin, direction, length) {
            let entity = self.registry.collider_owner(hit.collider).ok_or_else(|| {
                log::error!("Ray hit collider {:?} that no entity owns", hit.collider);
                PhysicsError::UnknownCollider(hit.collider)
            })?;

            if options.skip_sensors && self.registry.is_sensor(entity) {
                continue;
            }
            if let Some(mask) = options.filter_mask {
                let group = self
                    .registry
                    .collider_desc(entity)
                    .map(|desc| desc.groups.group)
                    .unwrap_or(0);
                if mask & group == 0 {
                    continue;
                }
            }

            visit(RaycastResult {
                entity: Some(entity),
                point: [
                    origin[0] + direction[0] * hit.distance,
                    origin[1] + direction[1] * hit.distance,
                    origin[2] + direction[2] * hit.distance,
                ],
                normal: hit.normal,
                distance: hit.distance,
                collider: Some(hit.collider),
            });
        }
        Ok(())
    }
}

/// Order by distance, then entity for equal distances
fn nearer(candidate: &RaycastResult, best: &RaycastResult) -> bool {
    candidate
        .distance
        .total_cmp(&best.distance)
        .then_with(|| candidate.entity.cmp(&best.entity))
        .is_lt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendRayHit;
    use crate::collider::{ColliderDesc, ColliderShape};
    use crate::layers::CollisionGroups;
    use crate::testing::ScriptedBackend;
    use approx::assert_relative_eq;

    fn setup(count: u32) -> (ScriptedBackend, Registry, Vec<Entity>) {
        let mut backend = ScriptedBackend::new();
        let mut registry = Registry::new();
        let entities: Vec<_> = (1..=count).map(|i| Entity::new(i, 0)).collect();
        for entity in &entities {
            registry
                .add_collider(*entity, ColliderDesc::new(ColliderShape::sphere(1.0)))
                .unwrap();
        }
        registry.synchronize(&mut backend).unwrap();
        (backend, registry, entities)
    }

    fn hit(registry: &Registry, entity: Entity, distance: f32) -> BackendRayHit {
        BackendRayHit {
            collider: registry.lookup_collider(entity).unwrap(),
            distance,
            normal: [0.0, 0.0, -1.0],
        }
    }

    #[test]
    fn test_closest_hit() {
        let (mut backend, registry, e) = setup(2);
        backend.hits = vec![hit(&registry, e[0], 12.0), hit(&registry, e[1], 6.0)];

        let query = PhysicsQuery::new(&backend, &registry);
        let mut result = RaycastResult::default();
        assert!(query
            .raycast_closest([0.0, 0.0, -10.0], [0.0, 0.0, 10.0], &mut result)
            .unwrap());
        assert_eq!(result.entity, Some(e[1]));
        assert_relative_eq!(result.distance, 6.0);
        assert_relative_eq!(result.point[2], -4.0);
    }

    #[test]
    fn test_ties_break_by_entity() {
        let (mut backend, registry, e) = setup(3);
        backend.hits = vec![
            hit(&registry, e[2], 5.0),
            hit(&registry, e[0], 5.0),
            hit(&registry, e[1], 1.0),
        ];

        let query = PhysicsQuery::new(&backend, &registry);
        let order: Vec<_> = query
            .raycast_all([0.0; 3], [0.0, 0.0, 10.0])
            .unwrap()
            .map(|r| r.entity.unwrap())
            .collect();
        assert_eq!(order, vec![e[1], e[0], e[2]]);

        // The closest query folds to the same winner without sorting
        backend.hits.truncate(2);
        let query = PhysicsQuery::new(&backend, &registry);
        let mut result = RaycastResult::default();
        assert!(query
            .raycast_closest([0.0; 3], [0.0, 0.0, 10.0], &mut result)
            .unwrap());
        assert_eq!(result.entity, Some(e[0]));

        // A miss clears the reused record
        assert!(!query
            .raycast_closest([0.0; 3], [0.0, 0.0, 2.0], &mut result)
            .unwrap());
        assert_eq!(result, RaycastResult::default());
    }

    #[test]
    fn test_zero_length_ray_hits_nothing() {
        let (mut backend, registry, e) = setup(1);
        backend.hits = vec![hit(&registry, e[0], 0.0)];

        let query = PhysicsQuery::new(&backend, &registry);
        let mut result = RaycastResult {
            entity: Some(e[0]),
            ..Default::default()
        };
        assert!(!query
            .raycast_closest([1.0, 2.0, 3.0], [1.0, 2.0, 3.0], &mut result)
            .unwrap());
        assert!(!result.is_hit());
        assert_eq!(query.raycast_all([0.0; 3], [0.0; 3]).unwrap().len(), 0);
        assert_eq!(
            query.raycast_all([f32::NAN; 3], [0.0; 3]).unwrap().len(),
            0
        );
    }

    #[test]
    fn test_hits_beyond_target_are_ignored() {
        let (mut backend, registry, e) = setup(1);
        backend.hits = vec![hit(&registry, e[0], 15.0)];

        let query = PhysicsQuery::new(&backend, &registry);
        assert_eq!(query.raycast_all([0.0; 3], [0.0, 0.0, 10.0]).unwrap().len(), 0);
    }

    #[test]
    fn test_filter_mask_only_when_supplied() {
        let (mut backend, mut registry, e) = setup(2);
        registry.set_collision_groups(e[0], CollisionGroups::new(0b10, 0));
        registry.synchronize(&mut backend).unwrap();
        backend.hits = vec![hit(&registry, e[0], 1.0), hit(&registry, e[1], 2.0)];

        let query = PhysicsQuery::new(&backend, &registry);

        // A zero contact mask leaves the collider visible to rays
        assert_eq!(query.raycast_all([0.0; 3], [0.0, 0.0, 10.0]).unwrap().len(), 2);

        let filtered: Vec<_> = query
            .raycast_all_with(
                [0.0; 3],
                [0.0, 0.0, 10.0],
                RaycastOptions::default().with_filter_mask(0b10),
            )
            .unwrap()
            .map(|r| r.entity.unwrap())
            .collect();
        // e[1] has the default group (all bits), so it matches too
        assert_eq!(filtered, vec![e[0], e[1]]);

        let filtered: Vec<_> = query
            .raycast_all_with(
                [0.0; 3],
                [0.0, 0.0, 10.0],
                RaycastOptions::default().with_filter_mask(0b100),
            )
            .unwrap()
            .map(|r| r.entity.unwrap())
            .collect();
        assert_eq!(filtered, vec![e[1]]);
    }

    #[test]
    fn test_skip_sensors() {
        let mut backend = ScriptedBackend::new();
        let mut registry = Registry::new();
        let solid = Entity::new(1, 0);
        let trigger = Entity::new(2, 0);
        registry
            .add_collider(solid, ColliderDesc::new(ColliderShape::sphere(1.0)))
            .unwrap();
        registry
            .add_collider(trigger, ColliderDesc::sensor(ColliderShape::sphere(1.0)))
            .unwrap();
        registry.synchronize(&mut backend).unwrap();
        backend.hits = vec![hit(&registry, trigger, 1.0), hit(&registry, solid, 2.0)];

        let query = PhysicsQuery::new(&backend, &registry);
        let mut result = RaycastResult::default();
        query
            .raycast_closest([0.0; 3], [0.0, 0.0, 10.0], &mut result)
            .unwrap();
        assert_eq!(result.entity, Some(trigger));

        query
            .raycast_closest_with(
                [0.0; 3],
                [0.0, 0.0, 10.0],
                RaycastOptions::default().skipping_sensors(),
                &mut result,
            )
            .unwrap();
        assert_eq!(result.entity, Some(solid));
    }

    #[test]
    fn test_unknown_collider_is_fatal() {
        let (mut backend, registry, _) = setup(0);
        backend.hits = vec![BackendRayHit {
            collider: ColliderHandle::from_raw_parts(42, 0),
            distance: 1.0,
            normal: [0.0, 1.0, 0.0],
        }];

        let query = PhysicsQuery::new(&backend, &registry);
        let err = query.raycast_all([0.0; 3], [0.0, 0.0, 10.0]).unwrap_err();
        assert!(err.is_fatal());
    }
}
