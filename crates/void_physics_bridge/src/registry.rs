//! Entity to body/collider registry
//!
//! Every mutation is queued and only reaches the backend inside
//! [`Registry::synchronize`], which the step controller calls before any
//! integration. Removals of unknown associations are silent no-ops.
//!
//! Descriptors and poses are validated when queued, whichever way they
//! arrive, so nothing invalid ever reaches the backend.

use crate::backend::DynamicsBackend;
use crate::body::{validate_velocity, BodyDesc, BodyHandle, BodyKind, Pose};
use crate::collider::{ColliderDesc, ColliderHandle};
use crate::contact::ContactParticipants;
use crate::entity::Entity;
use crate::error::Result;
use crate::layers::CollisionGroups;
use crossbeam_channel::Receiver;
use std::collections::{HashMap, VecDeque};

/// Component lifecycle notifications from the entity container
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleNotice {
    /// Entity despawned; drops its collider and body
    EntityRemoved(Entity),
    /// Rigid-body capability attached (or replaced)
    BodyAttached { entity: Entity, desc: BodyDesc },
    /// Rigid-body capability detached
    BodyDetached(Entity),
    /// Collider capability attached (or replaced)
    ColliderAttached { entity: Entity, desc: ColliderDesc },
    /// Collider capability detached
    ColliderDetached(Entity),
}

impl LifecycleNotice {
    /// Check the descriptor an attach notice carries
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::BodyAttached { desc, .. } => desc.validate(),
            Self::ColliderAttached { desc, .. } => desc.validate(),
            Self::EntityRemoved(_) | Self::BodyDetached(_) | Self::ColliderDetached(_) => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
enum PendingOp {
    AddBody(Entity, BodyDesc),
    RemoveBody(Entity),
    AddCollider(Entity, ColliderDesc),
    RemoveCollider(Entity),
    SetPose(Entity, Pose),
    SetLinearVelocity(Entity, [f32; 3]),
    SetCollisionGroups(Entity, CollisionGroups),
    RemoveEntity(Entity),
}

impl From<LifecycleNotice> for PendingOp {
    fn from(notice: LifecycleNotice) -> Self {
        match notice {
            LifecycleNotice::EntityRemoved(entity) => Self::RemoveEntity(entity),
            LifecycleNotice::BodyAttached { entity, desc } => Self::AddBody(entity, desc),
            LifecycleNotice::BodyDetached(entity) => Self::RemoveBody(entity),
            LifecycleNotice::ColliderAttached { entity, desc } => Self::AddCollider(entity, desc),
            LifecycleNotice::ColliderDetached(entity) => Self::RemoveCollider(entity),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct BodyRecord {
    handle: BodyHandle,
    kind: BodyKind,
}

#[derive(Debug, Clone)]
struct ColliderRecord {
    handle: ColliderHandle,
    desc: ColliderDesc,
    parent: Option<BodyHandle>,
}

/// Owns the entity <-> body <-> collider associations
#[derive(Default)]
pub struct Registry {
    pending: VecDeque<PendingOp>,
    lifecycle: Option<Receiver<LifecycleNotice>>,

    bodies: HashMap<Entity, BodyRecord>,
    body_owners: HashMap<BodyHandle, Entity>,

    colliders: HashMap<Entity, ColliderRecord>,
    collider_owners: HashMap<ColliderHandle, Entity>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a body for `entity`, replacing any existing one.
    ///
    /// An invalid descriptor is rejected and never queued.
    pub fn add_body(&mut self, entity: Entity, desc: BodyDesc) -> Result<()> {
        desc.validate()?;
        self.pending.push_back(PendingOp::AddBody(entity, desc));
        Ok(())
    }

    /// Queue removal of the entity's body
    pub fn remove_body(&mut self, entity: Entity) {
        self.pending.push_back(PendingOp::RemoveBody(entity));
    }

    /// Queue a collider for `entity`, replacing any existing one.
    ///
    /// Shape parameters are checked here; an invalid collider is never queued.
    pub fn add_collider(&mut self, entity: Entity, desc: ColliderDesc) -> Result<()> {
        desc.validate()?;
        self.pending.push_back(PendingOp::AddCollider(entity, desc));
        Ok(())
    }

    /// Queue removal of the entity's collider
    pub fn remove_collider(&mut self, entity: Entity) {
        self.pending.push_back(PendingOp::RemoveCollider(entity));
    }

    /// Queue removal of both collider and body
    pub fn remove_entity(&mut self, entity: Entity) {
        self.pending.push_back(PendingOp::RemoveEntity(entity));
    }

    /// Queue a teleport
    pub fn set_pose(&mut self, entity: Entity, pose: Pose) -> Result<()> {
        pose.validate()?;
        self.pending.push_back(PendingOp::SetPose(entity, pose));
        Ok(())
    }

    /// Queue a linear velocity override
    pub fn set_linear_velocity(&mut self, entity: Entity, velocity: [f32; 3]) -> Result<()> {
        validate_velocity(velocity)?;
        self.pending
            .push_back(PendingOp::SetLinearVelocity(entity, velocity));
        Ok(())
    }

    /// Queue a group/mask change for the entity's collider
    pub fn set_collision_groups(&mut self, entity: Entity, groups: CollisionGroups) {
        self.pending
            .push_back(PendingOp::SetCollisionGroups(entity, groups));
    }

    /// Queue a lifecycle notice
    pub fn notify(&mut self, notice: LifecycleNotice) -> Result<()> {
        notice.validate()?;
        self.pending.push_back(notice.into());
        Ok(())
    }

    /// Drain `receiver` into the queue at every synchronize.
    ///
    /// Nobody is there to receive an error for a drained notice, so invalid
    /// ones are logged and dropped.
    pub fn attach_lifecycle(&mut self, receiver: Receiver<LifecycleNotice>) {
        self.lifecycle = Some(receiver);
    }

    /// Number of queued mutations
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Apply every queued mutation to the backend, in order.
    ///
    /// Returns the number of operations applied. A backend error aborts the
    /// remaining queue; it means the maps and the backend have diverged.
    pub fn synchronize<B: DynamicsBackend + ?Sized>(&mut self, backend: &mut B) -> Result<usize> {
        if let Some(receiver) = &self.lifecycle {
            for notice in receiver.try_iter() {
                match notice.validate() {
                    Ok(()) => self.pending.push_back(notice.into()),
                    Err(err) => log::warn!("Dropped lifecycle notice {:?}: {}", notice, err),
                }
            }
        }

        let mut applied = 0;
        while let Some(op) = self.pending.pop_front() {
            self.apply(op, backend)?;
            applied += 1;
        }

        if applied > 0 {
            log::trace!("Registry synchronized {} operations", applied);
        }
        Ok(applied)
    }

    fn apply<B: DynamicsBackend + ?Sized>(&mut self, op: PendingOp, backend: &mut B) -> Result<()> {
        match op {
            PendingOp::AddBody(entity, desc) => self.apply_add_body(entity, &desc, backend),
            PendingOp::RemoveBody(entity) => self.apply_remove_body(entity, backend),
            PendingOp::AddCollider(entity, desc) => self.apply_add_collider(entity, desc, backend),
            PendingOp::RemoveCollider(entity) => self.apply_remove_collider(entity, backend),
            PendingOp::SetPose(entity, pose) => match self.bodies.get(&entity) {
                Some(record) => backend.set_body_pose(record.handle, &pose),
                None => {
                    log::warn!("Ignoring teleport of {:?}: no rigid body", entity);
                    Ok(())
                }
            },
            PendingOp::SetLinearVelocity(entity, velocity) => match self.bodies.get(&entity) {
                Some(record) => backend.set_body_linear_velocity(record.handle, velocity),
                None => {
                    log::warn!("Ignoring velocity of {:?}: no rigid body", entity);
                    Ok(())
                }
            },
            PendingOp::SetCollisionGroups(entity, groups) => {
                match self.colliders.get_mut(&entity) {
                    Some(record) => {
                        record.desc.groups = groups;
                        backend.set_collision_groups(record.handle, groups)
                    }
                    None => {
                        log::trace!("No collider on {:?}, groups change ignored", entity);
                        Ok(())
                    }
                }
            }
            PendingOp::RemoveEntity(entity) => {
                self.apply_remove_collider(entity, backend)?;
                self.apply_remove_body(entity, backend)
            }
        }
    }

    fn apply_add_body<B: DynamicsBackend + ?Sized>(
        &mut self,
        entity: Entity,
        desc: &BodyDesc,
        backend: &mut B,
    ) -> Result<()> {
        if let Some(stale) = self.bodies.remove(&entity) {
            self.body_owners.remove(&stale.handle);
            backend.destroy_body(stale.handle)?;
            log::debug!("Replacing rigid body of {:?}", entity);
        }

        let handle = backend.create_body(desc);
        self.bodies.insert(
            entity,
            BodyRecord {
                handle,
                kind: desc.kind,
            },
        );
        self.body_owners.insert(handle, entity);
        log::debug!("Created {:?} rigid body for {:?}", desc.kind, entity);

        // An existing collider moves onto the new body
        if let Some(desc) = self.colliders.get(&entity).map(|record| record.desc.clone()) {
            self.apply_add_collider(entity, desc, backend)?;
        }
        Ok(())
    }

    fn apply_remove_body<B: DynamicsBackend + ?Sized>(
        &mut self,
        entity: Entity,
        backend: &mut B,
    ) -> Result<()> {
        let Some(record) = self.bodies.remove(&entity) else {
            log::trace!("No rigid body on {:?}, removal ignored", entity);
            return Ok(());
        };

        self.body_owners.remove(&record.handle);
        backend.destroy_body(record.handle)?;

        // The backend leaves the collider in place, now standalone
        if let Some(collider) = self.colliders.get_mut(&entity) {
            collider.parent = None;
        }

        log::debug!("Removed rigid body of {:?}", entity);
        Ok(())
    }

    fn apply_add_collider<B: DynamicsBackend + ?Sized>(
        &mut self,
        entity: Entity,
        desc: ColliderDesc,
        backend: &mut B,
    ) -> Result<()> {
        if let Some(stale) = self.colliders.remove(&entity) {
            self.collider_owners.remove(&stale.handle);
            backend.destroy_collider(stale.handle)?;
        }

        let parent = self.bodies.get(&entity).map(|record| record.handle);
        let handle = backend.create_collider(&desc, parent)?;
        self.collider_owners.insert(handle, entity);
        self.colliders.insert(
            entity,
            ColliderRecord {
                handle,
                desc,
                parent,
            },
        );

        log::debug!(
            "Created collider for {:?} ({})",
            entity,
            if parent.is_some() { "attached" } else { "standalone" }
        );
        Ok(())
    }

    fn apply_remove_collider<B: DynamicsBackend + ?Sized>(
        &mut self,
        entity: Entity,
        backend: &mut B,
    ) -> Result<()> {
        let Some(record) = self.colliders.remove(&entity) else {
            log::trace!("No collider on {:?}, removal ignored", entity);
            return Ok(());
        };

        self.collider_owners.remove(&record.handle);
        backend.destroy_collider(record.handle)?;
        log::debug!("Removed collider of {:?}", entity);
        Ok(())
    }

    /// Entity owning a backend body
    pub fn lookup_entity(&self, body: BodyHandle) -> Option<Entity> {
        self.body_owners.get(&body).copied()
    }

    /// Backend body of an entity
    pub fn lookup_body(&self, entity: Entity) -> Option<BodyHandle> {
        self.bodies.get(&entity).map(|record| record.handle)
    }

    /// Backend collider of an entity
    pub fn lookup_collider(&self, entity: Entity) -> Option<ColliderHandle> {
        self.colliders.get(&entity).map(|record| record.handle)
    }

    /// Entity owning a backend collider
    pub fn collider_owner(&self, collider: ColliderHandle) -> Option<Entity> {
        self.collider_owners.get(&collider).copied()
    }

    /// Collider description currently applied for an entity
    pub fn collider_desc(&self, entity: Entity) -> Option<&ColliderDesc> {
        self.colliders.get(&entity).map(|record| &record.desc)
    }

    /// Body the entity's collider is attached to, if any
    pub fn collider_parent(&self, entity: Entity) -> Option<BodyHandle> {
        self.colliders.get(&entity).and_then(|record| record.parent)
    }

    /// Whether the entity's collider is a sensor
    pub fn is_sensor(&self, entity: Entity) -> bool {
        self.colliders
            .get(&entity)
            .map(|record| record.desc.is_sensor)
            .unwrap_or(false)
    }

    /// Every entity with a body, ascending
    pub fn body_entities(&self) -> Vec<(Entity, BodyHandle)> {
        let mut entities: Vec<_> = self
            .bodies
            .iter()
            .map(|(entity, record)| (*entity, record.handle))
            .collect();
        entities.sort_unstable_by_key(|(entity, _)| *entity);
        entities
    }

    /// Number of registered bodies
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of registered colliders
    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }
}

impl ContactParticipants for Registry {
    fn collision_groups(&self, entity: Entity) -> Option<CollisionGroups> {
        self.colliders.get(&entity).map(|record| record.desc.groups)
    }

    fn body_kind(&self, entity: Entity) -> BodyKind {
        self.bodies
            .get(&entity)
            .map(|record| record.kind)
            .unwrap_or(BodyKind::Static)
    }
}
