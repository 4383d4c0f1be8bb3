//! Rapier 3D implementation of [`DynamicsBackend`]

use crate::backend::{BackendRayHit, DynamicsBackend};
use crate::body::{BodyDesc, BodyHandle, BodyKind, Pose};
use crate::collider::{ColliderDesc, ColliderHandle, ColliderShape};
use crate::config::PhysicsConfig;
use crate::error::{PhysicsError, Result};
use crate::layers::CollisionGroups;
use rapier3d::na::{Quaternion, Unit, UnitQuaternion};
use rapier3d::parry::transformation::try_convex_hull;
use rapier3d::prelude as rapier;
use std::num::NonZeroUsize;

/// All Rapier simulation state behind the bridge
pub struct RapierBackend {
    /// Rapier physics pipeline
    pipeline: rapier::PhysicsPipeline,

    /// Gravity
    gravity: rapier::Vector<f32>,

    /// Integration parameters (dt is rewritten per substep)
    integration_params: rapier::IntegrationParameters,

    islands: rapier::IslandManager,
    broad_phase: rapier::DefaultBroadPhase,
    narrow_phase: rapier::NarrowPhase,
    impulse_joints: rapier::ImpulseJointSet,
    multibody_joints: rapier::MultibodyJointSet,
    ccd_solver: rapier::CCDSolver,

    /// Query pipeline
    query_pipeline: rapier::QueryPipeline,

    /// Rigid body set
    bodies: rapier::RigidBodySet,

    /// Collider set
    colliders: rapier::ColliderSet,
}

impl RapierBackend {
    /// Create an empty backend configured from `config`
    pub fn new(config: &PhysicsConfig) -> Self {
        let mut backend = Self {
            pipeline: rapier::PhysicsPipeline::new(),
            gravity: rapier::Vector::zeros(),
            integration_params: rapier::IntegrationParameters::default(),
            islands: rapier::IslandManager::new(),
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            impulse_joints: rapier::ImpulseJointSet::new(),
            multibody_joints: rapier::MultibodyJointSet::new(),
            ccd_solver: rapier::CCDSolver::new(),
            query_pipeline: rapier::QueryPipeline::new(),
            bodies: rapier::RigidBodySet::new(),
            colliders: rapier::ColliderSet::new(),
        };
        backend.apply_config(config);
        backend
    }

    /// Current gravity
    pub fn gravity(&self) -> [f32; 3] {
        [self.gravity.x, self.gravity.y, self.gravity.z]
    }

    /// Get number of active (awake) dynamic bodies
    pub fn active_body_count(&self) -> usize {
        self.islands.active_dynamic_bodies().len()
    }
}

impl Default for RapierBackend {
    fn default() -> Self {
        Self::new(&PhysicsConfig::default())
    }
}

impl DynamicsBackend for RapierBackend {
    fn apply_config(&mut self, config: &PhysicsConfig) {
        self.set_gravity(config.gravity);
        self.integration_params.dt = config.fixed_substep;
        self.integration_params.num_solver_iterations =
            NonZeroUsize::new(config.solver_iterations).unwrap_or(NonZeroUsize::MIN);
    }

    fn set_gravity(&mut self, gravity: [f32; 3]) {
        self.gravity = vector(gravity);
    }

    fn create_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let body_type = match desc.kind {
            BodyKind::Static => rapier::RigidBodyType::Fixed,
            BodyKind::Kinematic => rapier::RigidBodyType::KinematicPositionBased,
            BodyKind::Dynamic => rapier::RigidBodyType::Dynamic,
        };

        let mut builder = rapier::RigidBodyBuilder::new(body_type)
            .position(isometry(&desc.pose))
            .linvel(vector(desc.linear_velocity))
            .angvel(vector(desc.angular_velocity))
            .gravity_scale(desc.gravity_scale)
            .linear_damping(desc.linear_damping)
            .angular_damping(desc.angular_damping)
            .ccd_enabled(desc.ccd_enabled)
            .can_sleep(desc.can_sleep);

        if desc.mass > 0.0 {
            builder = builder.additional_mass(desc.mass);
        }

        body_handle(self.bodies.insert(builder))
    }

    fn destroy_body(&mut self, body: BodyHandle) -> Result<()> {
        self.bodies
            .remove(
                body_key(body),
                &mut self.islands,
                &mut self.colliders,
                &mut self.impulse_joints,
                &mut self.multibody_joints,
                false, // Detach colliders, the registry owns their lifecycle
            )
            .map(|_| ())
            .ok_or(PhysicsError::UnknownBody(body))
    }

    fn create_collider(
        &mut self,
        desc: &ColliderDesc,
        parent: Option<BodyHandle>,
    ) -> Result<ColliderHandle> {
        let builder = rapier::ColliderBuilder::new(shared_shape(&desc.shape)?)
            .translation(vector(desc.offset))
            .sensor(desc.is_sensor)
            .friction(desc.material.friction)
            .restitution(desc.material.restitution)
            .density(desc.material.density)
            .collision_groups(interaction_groups(desc.groups))
            // Kinematic and standalone colliders must report overlaps too
            .active_collision_types(rapier::ActiveCollisionTypes::all());

        let handle = match parent {
            Some(body) => {
                let key = body_key(body);
                if !self.bodies.contains(key) {
                    return Err(PhysicsError::UnknownBody(body));
                }
                self.colliders
                    .insert_with_parent(builder, key, &mut self.bodies)
            }
            None => self.colliders.insert(builder),
        };

        Ok(collider_handle(handle))
    }

    fn destroy_collider(&mut self, collider: ColliderHandle) -> Result<()> {
        self.colliders
            .remove(
                collider_key(collider),
                &mut self.islands,
                &mut self.bodies,
                true,
            )
            .map(|_| ())
            .ok_or_else(|| PhysicsError::Backend(format!("no collider {:?}", collider)))
    }

    fn set_collision_groups(
        &mut self,
        collider: ColliderHandle,
        groups: CollisionGroups,
    ) -> Result<()> {
        self.colliders
            .get_mut(collider_key(collider))
            .map(|c| c.set_collision_groups(interaction_groups(groups)))
            .ok_or_else(|| PhysicsError::Backend(format!("no collider {:?}", collider)))
    }

    fn set_body_pose(&mut self, body: BodyHandle, pose: &Pose) -> Result<()> {
        self.bodies
            .get_mut(body_key(body))
            .map(|b| b.set_position(isometry(pose), true))
            .ok_or(PhysicsError::UnknownBody(body))
    }

    fn set_body_linear_velocity(&mut self, body: BodyHandle, velocity: [f32; 3]) -> Result<()> {
        self.bodies
            .get_mut(body_key(body))
            .map(|b| b.set_linvel(vector(velocity), true))
            .ok_or(PhysicsError::UnknownBody(body))
    }

    fn body_pose(&self, body: BodyHandle) -> Option<Pose> {
        self.bodies.get(body_key(body)).map(|b| {
            let pos = b.translation();
            let rot = b.rotation();
            Pose {
                position: [pos.x, pos.y, pos.z],
                rotation: [rot.i, rot.j, rot.k, rot.w],
            }
        })
    }

    fn integrate(&mut self, dt: f32) {
        self.integration_params.dt = dt;

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    fn touching_pairs(&self) -> Vec<(ColliderHandle, ColliderHandle)> {
        let contacts = self
            .narrow_phase
            .contact_pairs()
            .filter(|pair| pair.has_any_active_contact)
            .map(|pair| (collider_handle(pair.collider1), collider_handle(pair.collider2)));

        let overlaps = self
            .narrow_phase
            .intersection_pairs()
            .filter(|(_, _, intersecting)| *intersecting)
            .map(|(h1, h2, _)| (collider_handle(h1), collider_handle(h2)));

        contacts.chain(overlaps).collect()
    }

    fn refresh_queries(&mut self) {
        // Teleported bodies only move their colliders during a pipeline step
        self.bodies
            .propagate_modified_body_positions_to_colliders(&mut self.colliders);
        self.query_pipeline.update(&self.colliders);
    }

    fn raycast(
        &self,
        origin: [f32; 3],
        direction: [f32; 3],
        max_distance: f32,
    ) -> Vec<BackendRayHit> {
        let ray = rapier::Ray::new(
            rapier::Point::new(origin[0], origin[1], origin[2]),
            vector(direction),
        );

        let mut hits = Vec::new();
        self.query_pipeline.intersections_with_ray(
            &self.bodies,
            &self.colliders,
            &ray,
            max_distance,
            true,
            rapier::QueryFilter::default(),
            |handle, intersection| {
                hits.push(BackendRayHit {
                    collider: collider_handle(handle),
                    distance: intersection.time_of_impact,
                    normal: [
                        intersection.normal.x,
                        intersection.normal.y,
                        intersection.normal.z,
                    ],
                });
                true // Continue searching
            },
        );
        hits
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn collider_count(&self) -> usize {
        self.colliders.len()
    }
}

fn body_key(handle: BodyHandle) -> rapier::RigidBodyHandle {
    let (index, generation) = handle.into_raw_parts();
    rapier::RigidBodyHandle::from_raw_parts(index, generation)
}

fn body_handle(raw: rapier::RigidBodyHandle) -> BodyHandle {
    let (index, generation) = raw.into_raw_parts();
    BodyHandle::from_raw_parts(index, generation)
}

fn collider_key(handle: ColliderHandle) -> rapier::ColliderHandle {
    let (index, generation) = handle.into_raw_parts();
    rapier::ColliderHandle::from_raw_parts(index, generation)
}

fn collider_handle(raw: rapier::ColliderHandle) -> ColliderHandle {
    let (index, generation) = raw.into_raw_parts();
    ColliderHandle::from_raw_parts(index, generation)
}

fn vector(v: [f32; 3]) -> rapier::Vector<f32> {
    rapier::Vector::new(v[0], v[1], v[2])
}

fn isometry(pose: &Pose) -> rapier::Isometry<f32> {
    let [x, y, z] = pose.position;
    let [qx, qy, qz, qw] = pose.rotation;
    rapier::Isometry::from_parts(
        rapier::Translation::new(x, y, z),
        UnitQuaternion::from_quaternion(Quaternion::new(qw, qx, qy, qz)),
    )
}

fn interaction_groups(groups: CollisionGroups) -> rapier::InteractionGroups {
    rapier::InteractionGroups::new(
        rapier::Group::from_bits_truncate(groups.group),
        rapier::Group::from_bits_truncate(groups.mask),
    )
}

fn shared_shape(shape: &ColliderShape) -> Result<rapier::SharedShape> {
    let shape = match shape {
        ColliderShape::Sphere { radius } => rapier::SharedShape::ball(*radius),
        ColliderShape::Box { half_extents } => {
            rapier::SharedShape::cuboid(half_extents[0], half_extents[1], half_extents[2])
        }
        ColliderShape::Capsule { half_height, radius } => {
            rapier::SharedShape::capsule_y(*half_height, *radius)
        }
        ColliderShape::Cylinder { half_height, radius } => {
            rapier::SharedShape::cylinder(*half_height, *radius)
        }
        ColliderShape::Plane { normal } => {
            rapier::SharedShape::halfspace(Unit::new_normalize(vector(*normal)))
        }
        ColliderShape::ConvexHull { points } => {
            let points: Vec<_> = points
                .iter()
                .map(|p| rapier::Point::new(p[0], p[1], p[2]))
                .collect();
            // The infallible hull builder panics on degenerate clouds
            let (vertices, indices) = try_convex_hull(&points).map_err(|err| {
                PhysicsError::InvalidShape(format!("convex hull failed: {:?}", err))
            })?;
            rapier::SharedShape::convex_mesh(vertices, &indices).ok_or_else(|| {
                PhysicsError::InvalidShape("convex hull points are degenerate".into())
            })?
        }
    };
    Ok(shape)
}
