//! Void Physics Bridge - entity-facing physics adapter
//!
//! Maps application entities onto rigid bodies and colliders of a dynamics
//! backend (Rapier 3D by default), advances the simulation in capped fixed
//! substeps and turns the backend's touching pairs into contact lifecycle
//! events published on the global `void_event` bus.
//!
//! # Features
//!
//! - Deferred entity <-> body <-> collider registry
//! - Contact tracking (`beginContact`, `duringContact`, `endContact`)
//! - Group/mask collision filtering
//! - Closest/all raycasts with deterministic ordering
//! - Pause/play with capped substepping
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                    PhysicsWorld                      │
//! │  ┌──────────┐  ┌──────────────┐  ┌────────────────┐  │
//! │  │ Registry │  │ContactTracker│  │ StepController │  │
//! │  └──────────┘  └──────────────┘  └────────────────┘  │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │         DynamicsBackend (RapierBackend)        │  │
//! │  └────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────┘
//!          │                                  │
//!          ▼                                  ▼
//!   ┌──────────────┐                  ┌──────────────┐
//!   │ PhysicsQuery │                  │ void_event   │
//!   │  (raycasts)  │                  │ global bus   │
//!   └──────────────┘                  └──────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use void_physics_bridge::prelude::*;
//!
//! void_event::global::init();
//! void_event::global::subscribe(|event: &ContactEvent| {
//!     println!("{} {} {}", event.kind.name(), event.entity_a, event.entity_b);
//! });
//!
//! let mut physics = PhysicsWorld::new(PhysicsConfig::default())?;
//!
//! let ball = Entity::new(0, 0);
//! physics.add_body(ball, BodyDesc::dynamic().with_position(0.0, 10.0, 0.0))?;
//! physics.add_collider(ball, ColliderDesc::new(ColliderShape::sphere(0.5)))?;
//!
//! let ground = Entity::new(1, 0);
//! physics.add_body(ground, BodyDesc::fixed())?;
//! physics.add_collider(ground, ColliderDesc::new(ColliderShape::ground()))?;
//!
//! // Step simulation
//! physics.step(1.0 / 60.0)?;
//! ```

pub mod backend;
pub mod body;
pub mod collider;
pub mod config;
pub mod contact;
pub mod entity;
pub mod error;
pub mod events;
pub mod layers;
pub mod material;
pub mod query;
pub mod rapier_backend;
pub mod registry;
pub mod step;
pub mod world;

#[cfg(test)]
mod testing;

pub mod prelude {
    //! Common imports for the physics bridge
    pub use crate::backend::{BackendRayHit, DynamicsBackend};
    pub use crate::body::{BodyDesc, BodyHandle, BodyKind, Pose};
    pub use crate::collider::{ColliderDesc, ColliderHandle, ColliderShape};
    pub use crate::config::PhysicsConfig;
    pub use crate::contact::{ContactPair, ContactState, ContactTracker, ContactTransitions};
    pub use crate::entity::Entity;
    pub use crate::error::{PhysicsError, Result};
    pub use crate::events::{ContactEvent, ContactEventKind};
    pub use crate::layers::{should_collide, CollisionGroups, CollisionLayer};
    pub use crate::material::PhysicsMaterial;
    pub use crate::query::{PhysicsQuery, RaycastHits, RaycastOptions, RaycastResult};
    pub use crate::rapier_backend::RapierBackend;
    pub use crate::registry::{LifecycleNotice, Registry};
    pub use crate::step::{SimulationState, StepController, StepReport};
    pub use crate::world::PhysicsWorld;
}

pub use prelude::*;
