//! Physics world - owns the backend, registry, tracker and step controller

use crate::backend::DynamicsBackend;
use crate::body::{BodyDesc, BodyHandle, Pose};
use crate::collider::ColliderDesc;
use crate::config::PhysicsConfig;
use crate::contact::{ContactPair, ContactState, ContactTracker};
use crate::entity::Entity;
use crate::error::Result;
use crate::layers::CollisionGroups;
use crate::query::{PhysicsQuery, RaycastHits, RaycastOptions, RaycastResult};
use crate::rapier_backend::RapierBackend;
use crate::registry::{LifecycleNotice, Registry};
use crate::step::{SimulationState, StepController, StepReport};
use void_event::SubscriberId;

/// The physics adapter as seen by the owning world
pub struct PhysicsWorld<B: DynamicsBackend = RapierBackend> {
    backend: B,
    registry: Registry,
    tracker: ContactTracker,
    controller: StepController,
    lifecycle_subscription: Option<SubscriberId>,
}

impl PhysicsWorld<RapierBackend> {
    /// Create a world on the Rapier backend
    pub fn new(config: PhysicsConfig) -> Result<Self> {
        config.validate()?;
        let backend = RapierBackend::new(&config);
        Self::with_backend(config, backend)
    }
}

impl<B: DynamicsBackend> PhysicsWorld<B> {
    /// Create a world on a custom backend
    pub fn with_backend(config: PhysicsConfig, mut backend: B) -> Result<Self> {
        let controller = StepController::new(config)?;
        backend.apply_config(controller.config());

        log::info!(
            "Physics world created (gravity {:?}, max {} substeps of {}s)",
            controller.config().gravity,
            controller.config().max_substeps,
            controller.config().fixed_substep
        );

        Ok(Self {
            backend,
            registry: Registry::new(),
            tracker: ContactTracker::new(),
            controller,
            lifecycle_subscription: None,
        })
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Give `entity` a rigid body (replacing any existing one) on the next
    /// synchronize. The descriptor must validate.
    pub fn add_body(&mut self, entity: Entity, desc: BodyDesc) -> Result<()> {
        self.registry.add_body(entity, desc)
    }

    /// Drop the entity's body on the next synchronize
    pub fn remove_body(&mut self, entity: Entity) {
        self.registry.remove_body(entity);
    }

    /// Give `entity` a collider (replacing any existing one)
    pub fn add_collider(&mut self, entity: Entity, desc: ColliderDesc) -> Result<()> {
        self.registry.add_collider(entity, desc)
    }

    /// Drop the entity's collider on the next synchronize
    pub fn remove_collider(&mut self, entity: Entity) {
        self.registry.remove_collider(entity);
    }

    /// Drop collider and body
    pub fn remove_entity(&mut self, entity: Entity) {
        self.registry.remove_entity(entity);
    }

    /// Teleport a body
    pub fn set_pose(&mut self, entity: Entity, pose: Pose) -> Result<()> {
        self.registry.set_pose(entity, pose)
    }

    /// Teleport a body, keeping its current orientation
    pub fn set_position(&mut self, entity: Entity, position: [f32; 3]) -> Result<()> {
        let rotation = self
            .body_pose(entity)
            .map(|pose| pose.rotation)
            .unwrap_or(Pose::IDENTITY.rotation);
        self.set_pose(entity, Pose { position, rotation })
    }

    /// Override a body's linear velocity
    pub fn set_linear_velocity(&mut self, entity: Entity, velocity: [f32; 3]) -> Result<()> {
        self.registry.set_linear_velocity(entity, velocity)
    }

    /// Change the group/mask of the entity's collider
    pub fn set_collision_groups(&mut self, entity: Entity, groups: CollisionGroups) {
        self.registry.set_collision_groups(entity, groups);
    }

    /// Feed a component lifecycle notice
    pub fn notify(&mut self, notice: LifecycleNotice) -> Result<()> {
        self.registry.notify(notice)
    }

    /// Receive [`LifecycleNotice`]s published on the global bus.
    ///
    /// Returns `false` when no global bus is initialized.
    pub fn connect_lifecycle_bus(&mut self) -> bool {
        if self.lifecycle_subscription.is_some() {
            return true;
        }
        match void_event::global::channel::<LifecycleNotice>() {
            Some((id, receiver)) => {
                self.registry.attach_lifecycle(receiver);
                self.lifecycle_subscription = Some(id);
                log::debug!("Physics world listening for lifecycle notices");
                true
            }
            None => {
                log::warn!("No global event bus; lifecycle notices not connected");
                false
            }
        }
    }

    /// Apply queued registry mutations without stepping
    pub fn synchronize(&mut self) -> Result<()> {
        self.registry.synchronize(&mut self.backend)?;
        self.backend.refresh_queries();
        Ok(())
    }

    /// Entity owning a backend body
    pub fn lookup_entity(&self, body: BodyHandle) -> Option<Entity> {
        self.registry.lookup_entity(body)
    }

    /// Backend body of an entity
    pub fn lookup_body(&self, entity: Entity) -> Option<BodyHandle> {
        self.registry.lookup_body(entity)
    }

    // ------------------------------------------------------------------
    // Stepping
    // ------------------------------------------------------------------

    /// Replace the configuration; rejected whole when invalid
    pub fn configure(&mut self, config: PhysicsConfig) -> Result<()> {
        self.controller.configure(config, &mut self.backend)
    }

    /// Active configuration
    pub fn config(&self) -> &PhysicsConfig {
        self.controller.config()
    }

    /// Replace gravity; non-finite components are rejected
    pub fn set_gravity(&mut self, gravity: [f32; 3]) -> Result<()> {
        self.controller.set_gravity(gravity, &mut self.backend)
    }

    /// Current gravity
    pub fn gravity(&self) -> [f32; 3] {
        self.controller.gravity()
    }

    /// Pause simulation
    pub fn pause(&mut self) {
        self.controller.pause();
    }

    /// Resume simulation
    pub fn play(&mut self) {
        self.controller.play();
    }

    /// Current state
    pub fn state(&self) -> SimulationState {
        self.controller.state()
    }

    /// Whether stepping is suspended
    pub fn is_paused(&self) -> bool {
        self.controller.is_paused()
    }

    /// Advance the simulation by `elapsed` seconds
    pub fn step(&mut self, elapsed: f32) -> Result<StepReport> {
        self.controller.step(
            elapsed,
            &mut self.backend,
            &mut self.registry,
            &mut self.tracker,
        )
    }

    /// Total simulated seconds
    pub fn simulated_time(&self) -> f64 {
        self.controller.simulated_time()
    }

    /// Substeps integrated by the last step
    pub fn last_substeps(&self) -> u32 {
        self.controller.last_substeps()
    }

    /// Steps taken while playing
    pub fn frame(&self) -> u64 {
        self.controller.frame()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Query interface over the current collider set
    pub fn query(&self) -> PhysicsQuery<'_, B> {
        PhysicsQuery::new(&self.backend, &self.registry)
    }

    /// Nearest hit on `origin -> target`
    pub fn raycast_closest(
        &self,
        origin: [f32; 3],
        target: [f32; 3],
        out: &mut RaycastResult,
    ) -> Result<bool> {
        self.query().raycast_closest(origin, target, out)
    }

    /// Every hit on `origin -> target`, nearest first
    pub fn raycast_all(&self, origin: [f32; 3], target: [f32; 3]) -> Result<RaycastHits> {
        self.query().raycast_all(origin, target)
    }

    /// Every hit on `origin -> target` that passes `options`
    pub fn raycast_all_with(
        &self,
        origin: [f32; 3],
        target: [f32; 3],
        options: RaycastOptions,
    ) -> Result<RaycastHits> {
        self.query().raycast_all_with(origin, target, options)
    }

    /// Current pose of an entity's body
    pub fn body_pose(&self, entity: Entity) -> Option<Pose> {
        self.registry
            .lookup_body(entity)
            .and_then(|body| self.backend.body_pose(body))
    }

    /// Poses of every body, ordered by entity
    pub fn body_poses(&self) -> Vec<(Entity, Pose)> {
        self.registry
            .body_entities()
            .into_iter()
            .filter_map(|(entity, body)| self.backend.body_pose(body).map(|pose| (entity, pose)))
            .collect()
    }

    /// Contact state of a pair
    pub fn contact_state(&self, a: Entity, b: Entity) -> ContactState {
        self.tracker.state(a, b)
    }

    /// Every tracked pair, ordered
    pub fn tracked_contacts(&self) -> Vec<(ContactPair, ContactState)> {
        self.tracker.tracked()
    }

    /// The backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl<B: DynamicsBackend> Drop for PhysicsWorld<B> {
    fn drop(&mut self) {
        if let Some(id) = self.lifecycle_subscription.take() {
            void_event::global::unsubscribe(id);
        }
    }
}
