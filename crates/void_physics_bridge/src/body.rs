//! Rigid body descriptors and handles

use crate::error::{PhysicsError, Result};
use serde::{Deserialize, Serialize};

/// Handle to a rigid body owned by the dynamics backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

impl BodyHandle {
    /// Build from a backend's raw index/generation pair
    pub const fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Split into the backend's raw index/generation pair
    pub const fn into_raw_parts(self) -> (u32, u32) {
        (self.index, self.generation)
    }
}

/// Kinematic classification of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BodyKind {
    /// Never moves, infinite mass
    Static,
    /// Moved by the owner, unaffected by forces, still generates contacts
    Kinematic,
    /// Fully simulated
    #[default]
    Dynamic,
}

/// Position and orientation (quaternion: x, y, z, w)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: [f32; 3],
    pub rotation: [f32; 4],
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: [0.0, 0.0, 0.0],
        rotation: [0.0, 0.0, 0.0, 1.0],
    };

    /// Identity rotation at a position
    pub fn from_position(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
            ..Self::IDENTITY
        }
    }

    /// Whether every component is finite
    pub fn is_finite(&self) -> bool {
        self.position.iter().chain(self.rotation.iter()).all(|c| c.is_finite())
    }

    /// Finite position and a rotation that normalizes to a unit quaternion
    pub fn validate(&self) -> Result<()> {
        if !self.is_finite() {
            return Err(PhysicsError::InvalidConfig(format!(
                "pose must be finite, got {:?}",
                self
            )));
        }
        let norm_sq: f32 = self.rotation.iter().map(|c| c * c).sum();
        if !norm_sq.is_finite() || norm_sq <= f32::EPSILON {
            return Err(PhysicsError::InvalidConfig(format!(
                "rotation {:?} cannot be normalized",
                self.rotation
            )));
        }
        Ok(())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Description for creating a rigid body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyDesc {
    /// Kinematic classification
    pub kind: BodyKind,
    /// Initial pose
    pub pose: Pose,
    /// Initial linear velocity
    pub linear_velocity: [f32; 3],
    /// Initial angular velocity
    pub angular_velocity: [f32; 3],
    /// Mass added on top of the collider-derived mass
    pub mass: f32,
    /// Gravity scale (0 = no gravity, 1 = normal)
    pub gravity_scale: f32,
    /// Linear damping
    pub linear_damping: f32,
    /// Angular damping
    pub angular_damping: f32,
    /// Enable continuous collision detection
    pub ccd_enabled: bool,
    /// Can this body sleep when inactive
    pub can_sleep: bool,
}

impl Default for BodyDesc {
    fn default() -> Self {
        Self {
            kind: BodyKind::Dynamic,
            pose: Pose::IDENTITY,
            linear_velocity: [0.0; 3],
            angular_velocity: [0.0; 3],
            mass: 0.0,
            gravity_scale: 1.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            ccd_enabled: false,
            can_sleep: true,
        }
    }
}

impl BodyDesc {
    /// Static body
    pub fn fixed() -> Self {
        Self {
            kind: BodyKind::Static,
            ..Default::default()
        }
    }

    /// Dynamic body
    pub fn dynamic() -> Self {
        Self::default()
    }

    /// Kinematic body
    pub fn kinematic() -> Self {
        Self {
            kind: BodyKind::Kinematic,
            ..Default::default()
        }
    }

    /// Set position
    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.pose.position = [x, y, z];
        self
    }

    /// Set rotation quaternion (x, y, z, w)
    pub fn with_rotation(mut self, rotation: [f32; 4]) -> Self {
        self.pose.rotation = rotation;
        self
    }

    /// Set linear velocity
    pub fn with_linear_velocity(mut self, x: f32, y: f32, z: f32) -> Self {
        self.linear_velocity = [x, y, z];
        self
    }

    /// Set additional mass
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    /// Set gravity scale
    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    /// Enable CCD
    pub fn with_ccd(mut self, enabled: bool) -> Self {
        self.ccd_enabled = enabled;
        self
    }

    /// Check pose, velocities and mass properties
    pub fn validate(&self) -> Result<()> {
        self.pose.validate()?;
        validate_velocity(self.linear_velocity)?;
        validate_velocity(self.angular_velocity)?;

        let non_negative = [
            ("mass", self.mass),
            ("linear damping", self.linear_damping),
            ("angular damping", self.angular_damping),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(PhysicsError::InvalidConfig(format!(
                    "body {} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        if !self.gravity_scale.is_finite() {
            return Err(PhysicsError::InvalidConfig(format!(
                "gravity scale must be finite, got {}",
                self.gravity_scale
            )));
        }
        Ok(())
    }
}

/// Reject velocities with non-finite components
pub fn validate_velocity(velocity: [f32; 3]) -> Result<()> {
    if velocity.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(PhysicsError::InvalidConfig(format!(
            "velocity must be finite, got {:?}",
            velocity
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_validation() {
        assert!(Pose::IDENTITY.validate().is_ok());
        // Non-unit rotations are normalized later
        let scaled = Pose {
            rotation: [0.0, 0.0, 0.0, 2.0],
            ..Pose::IDENTITY
        };
        assert!(scaled.validate().is_ok());

        let zero_rotation = Pose {
            rotation: [0.0; 4],
            ..Pose::IDENTITY
        };
        assert!(zero_rotation.is_finite());
        assert!(matches!(
            zero_rotation.validate(),
            Err(PhysicsError::InvalidConfig(_))
        ));
        assert!(Pose::from_position(f32::NAN, 0.0, 0.0).validate().is_err());
    }

    #[test]
    fn test_body_desc_validation() {
        assert!(BodyDesc::dynamic().with_mass(2.0).validate().is_ok());

        assert!(BodyDesc::dynamic().with_rotation([0.0; 4]).validate().is_err());
        assert!(BodyDesc::dynamic().with_mass(-1.0).validate().is_err());
        assert!(BodyDesc::dynamic()
            .with_linear_velocity(f32::INFINITY, 0.0, 0.0)
            .validate()
            .is_err());
        assert!(BodyDesc::dynamic()
            .with_gravity_scale(f32::NAN)
            .validate()
            .is_err());
    }
}
