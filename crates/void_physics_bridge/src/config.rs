//! Physics configuration

use crate::error::{PhysicsError, Result};
use serde::{Deserialize, Serialize};

/// Physics world configuration.
///
/// Omitted fields take their defaults when deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity vector (default: -9.81 in Y)
    pub gravity: [f32; 3],

    /// Maximum number of substeps per frame; time beyond the cap is dropped
    pub max_substeps: u32,

    /// Duration of one integration substep, in seconds
    pub fixed_substep: f32,

    /// Velocity solver iterations per substep
    pub solver_iterations: usize,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.81, 0.0],
            max_substeps: 10,
            fixed_substep: 1.0 / 60.0,
            solver_iterations: 4,
        }
    }
}

impl PhysicsConfig {
    /// Configuration for high-precision simulation
    pub fn high_precision() -> Self {
        Self {
            fixed_substep: 1.0 / 120.0,
            max_substeps: 16,
            solver_iterations: 8,
            ..Default::default()
        }
    }

    /// Configuration for fast simulation (lower quality)
    pub fn fast() -> Self {
        Self {
            max_substeps: 2,
            solver_iterations: 2,
            ..Default::default()
        }
    }

    /// Set gravity
    pub fn with_gravity(mut self, x: f32, y: f32, z: f32) -> Self {
        self.gravity = [x, y, z];
        self
    }

    /// Set the substep cap
    pub fn with_max_substeps(mut self, max_substeps: u32) -> Self {
        self.max_substeps = max_substeps;
        self
    }

    /// Set the substep duration
    pub fn with_fixed_substep(mut self, fixed_substep: f32) -> Self {
        self.fixed_substep = fixed_substep;
        self
    }

    /// Check every field; nothing is applied by callers unless this passes
    pub fn validate(&self) -> Result<()> {
        validate_gravity(self.gravity)?;
        if self.max_substeps == 0 {
            return Err(PhysicsError::InvalidConfig(
                "max_substeps must be at least 1".into(),
            ));
        }
        if !self.fixed_substep.is_finite() || self.fixed_substep <= 0.0 {
            return Err(PhysicsError::InvalidConfig(format!(
                "fixed_substep must be a positive finite number, got {}",
                self.fixed_substep
            )));
        }
        if self.solver_iterations == 0 {
            return Err(PhysicsError::InvalidConfig(
                "solver_iterations must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Reject gravity vectors with non-finite components
pub fn validate_gravity(gravity: [f32; 3]) -> Result<()> {
    if gravity.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(PhysicsError::InvalidConfig(format!(
            "gravity must be finite, got {:?}",
            gravity
        )))
    }
}
