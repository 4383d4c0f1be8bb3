//! Step controller
//!
//! One `step` per frame: synchronize the registry, integrate a capped
//! number of fixed substeps, read the touching pairs once, run the contact
//! tracker and publish the resulting events.

use crate::backend::DynamicsBackend;
use crate::collider::ColliderHandle;
use crate::config::{validate_gravity, PhysicsConfig};
use crate::contact::ContactTracker;
use crate::entity::Entity;
use crate::error::{PhysicsError, Result};
use crate::events::{self, ContactEvent};
use crate::registry::Registry;
use serde::{Deserialize, Serialize};

/// Relative slack when converting elapsed time to substeps, so that
/// 1/60 s with a 1/60 s substep does not round up to two.
const SUBSTEP_TOLERANCE: f32 = 1e-4;

/// Simulation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SimulationState {
    #[default]
    Playing,
    Paused,
}

/// Outcome of one `step` call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Events in publication order (ended, began, during)
    pub events: Vec<ContactEvent>,
    /// Substeps integrated
    pub substeps: u32,
    /// Simulated seconds advanced
    pub advanced: f32,
    /// Number of events a live global bus accepted
    pub published: usize,
    /// The controller was paused; nothing happened
    pub paused: bool,
}

impl StepReport {
    fn paused() -> Self {
        Self {
            paused: true,
            ..Default::default()
        }
    }
}

/// Drives the backend and the contact tracker
#[derive(Debug)]
pub struct StepController {
    config: PhysicsConfig,
    state: SimulationState,
    simulated_time: f64,
    frame: u64,
    last_substeps: u32,
}

impl StepController {
    /// Create a controller from a configuration that must validate
    pub fn new(config: PhysicsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: SimulationState::Playing,
            simulated_time: 0.0,
            frame: 0,
            last_substeps: 0,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Replace the configuration. An invalid one is rejected whole and the
    /// previous configuration stays in effect.
    pub fn configure<B: DynamicsBackend + ?Sized>(
        &mut self,
        config: PhysicsConfig,
        backend: &mut B,
    ) -> Result<()> {
        if let Err(err) = config.validate() {
            log::warn!("Rejected physics configuration: {}", err);
            return Err(err);
        }
        backend.apply_config(&config);
        self.config = config;
        log::debug!("Physics configuration updated: {:?}", self.config);
        Ok(())
    }

    /// Replace gravity. Non-finite components are rejected.
    pub fn set_gravity<B: DynamicsBackend + ?Sized>(
        &mut self,
        gravity: [f32; 3],
        backend: &mut B,
    ) -> Result<()> {
        if let Err(err) = validate_gravity(gravity) {
            log::warn!("Rejected gravity {:?}", gravity);
            return Err(err);
        }
        backend.set_gravity(gravity);
        self.config.gravity = gravity;
        log::debug!("Gravity set to {:?}", gravity);
        Ok(())
    }

    /// Current gravity
    pub fn gravity(&self) -> [f32; 3] {
        self.config.gravity
    }

    /// Pause simulation
    pub fn pause(&mut self) {
        if self.state != SimulationState::Paused {
            log::debug!("Physics paused");
        }
        self.state = SimulationState::Paused;
    }

    /// Resume simulation
    pub fn play(&mut self) {
        if self.state != SimulationState::Playing {
            log::debug!("Physics resumed");
        }
        self.state = SimulationState::Playing;
    }

    /// Current state
    pub fn state(&self) -> SimulationState {
        self.state
    }

    /// Whether `step` is currently a no-op
    pub fn is_paused(&self) -> bool {
        self.state == SimulationState::Paused
    }

    /// Total simulated seconds
    pub fn simulated_time(&self) -> f64 {
        self.simulated_time
    }

    /// Number of steps taken while playing
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Substeps integrated by the last playing step
    pub fn last_substeps(&self) -> u32 {
        self.last_substeps
    }

    /// Number of fixed substeps covering `elapsed`, capped at
    /// `max_substeps`. Excess time is dropped.
    pub fn substeps_for(&self, elapsed: f32) -> u32 {
        if !elapsed.is_finite() || elapsed <= 0.0 {
            return 0;
        }

        let ratio = elapsed / self.config.fixed_substep;
        let needed = (ratio - SUBSTEP_TOLERANCE).ceil().max(1.0);
        if needed >= self.config.max_substeps as f32 {
            self.config.max_substeps
        } else {
            needed as u32
        }
    }

    /// Advance the simulation by `elapsed` seconds
    pub fn step<B: DynamicsBackend + ?Sized>(
        &mut self,
        elapsed: f32,
        backend: &mut B,
        registry: &mut Registry,
        tracker: &mut ContactTracker,
    ) -> Result<StepReport> {
        if self.is_paused() {
            log::trace!("Step skipped: paused");
            return Ok(StepReport::paused());
        }

        registry.synchronize(backend)?;
        self.frame += 1;

        let substeps = self.substeps_for(elapsed);
        self.last_substeps = substeps;
        if substeps == 0 {
            backend.refresh_queries();
            return Ok(StepReport::default());
        }

        let dt = self.config.fixed_substep;
        for _ in 0..substeps {
            backend.integrate(dt);
        }
        backend.refresh_queries();

        let advanced = dt * substeps as f32;
        self.simulated_time += advanced as f64;

        // Read once per frame, not per substep
        let touching = backend
            .touching_pairs()
            .into_iter()
            .map(|(c1, c2)| -> Result<(Entity, Entity)> {
                Ok((owner(registry, c1)?, owner(registry, c2)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let transitions = tracker.update(touching, &*registry);
        let events = events::ordered_events(&transitions);
        let published = events::publish(&events);

        log::trace!(
            "Frame {}: {} substeps, {} contact events",
            self.frame,
            substeps,
            events.len()
        );

        Ok(StepReport {
            events,
            substeps,
            advanced,
            published,
            paused: false,
        })
    }
}

fn owner(registry: &Registry, collider: ColliderHandle) -> Result<Entity> {
    registry.collider_owner(collider).ok_or_else(|| {
        log::error!(
            "Backend reported collider {:?} that no entity owns",
            collider
        );
        PhysicsError::UnknownCollider(collider)
    })
}
