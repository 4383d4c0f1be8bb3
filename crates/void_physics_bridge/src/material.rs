//! Surface materials

use serde::{Deserialize, Serialize};

/// Friction, restitution and density of a collider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsMaterial {
    /// Friction coefficient (0 = frictionless)
    pub friction: f32,
    /// Restitution/bounciness (0 = no bounce, 1 = perfect bounce)
    pub restitution: f32,
    /// Density for mass calculation (kg/m³)
    pub density: f32,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.0,
            density: 1.0,
        }
    }
}

impl PhysicsMaterial {
    pub fn new(friction: f32, restitution: f32) -> Self {
        Self {
            friction,
            restitution,
            ..Default::default()
        }
    }

    pub fn ice() -> Self {
        Self {
            friction: 0.05,
            restitution: 0.0,
            density: 0.9,
        }
    }

    pub fn rubber() -> Self {
        Self {
            friction: 0.8,
            restitution: 0.8,
            density: 1.1,
        }
    }

    pub fn metal() -> Self {
        Self {
            friction: 0.3,
            restitution: 0.2,
            density: 7.8,
        }
    }

    pub fn wood() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.3,
            density: 0.6,
        }
    }

    pub fn stone() -> Self {
        Self {
            friction: 0.7,
            restitution: 0.1,
            density: 2.5,
        }
    }

    /// Set friction, clamped to be non-negative
    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction.max(0.0);
        self
    }

    /// Set restitution, clamped to [0, 1]
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution.clamp(0.0, 1.0);
        self
    }

    /// Set density, kept strictly positive
    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density.max(0.001);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_clamp() {
        let m = PhysicsMaterial::default()
            .with_friction(-1.0)
            .with_restitution(3.0)
            .with_density(0.0);
        assert_eq!(m.friction, 0.0);
        assert_eq!(m.restitution, 1.0);
        assert!(m.density > 0.0);
    }
}
