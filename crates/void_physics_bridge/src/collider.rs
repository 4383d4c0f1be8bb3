//! Collider shapes and descriptors

use crate::error::{PhysicsError, Result};
use crate::layers::CollisionGroups;
use crate::material::PhysicsMaterial;
use serde::{Deserialize, Serialize};

/// Handle to a collider owned by the dynamics backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderHandle {
    index: u32,
    generation: u32,
}

impl ColliderHandle {
    /// Build from a backend's raw index/generation pair
    pub const fn from_raw_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Split into the backend's raw index/generation pair
    pub const fn into_raw_parts(self) -> (u32, u32) {
        (self.index, self.generation)
    }
}

/// Collision shape.
///
/// Capsules and cylinders are aligned on the local Y axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    Sphere { radius: f32 },
    Box { half_extents: [f32; 3] },
    Capsule { half_height: f32, radius: f32 },
    Cylinder { half_height: f32, radius: f32 },
    /// Infinite half-space whose outward normal is `normal`
    Plane { normal: [f32; 3] },
    /// Convex hull of a point cloud
    ConvexHull { points: Vec<[f32; 3]> },
}

impl Default for ColliderShape {
    fn default() -> Self {
        Self::Box {
            half_extents: [0.5, 0.5, 0.5],
        }
    }
}

impl ColliderShape {
    /// Create a sphere shape
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Create a box shape from half-extents
    pub fn cuboid(hx: f32, hy: f32, hz: f32) -> Self {
        Self::Box {
            half_extents: [hx, hy, hz],
        }
    }

    /// Create a capsule shape
    pub fn capsule(half_height: f32, radius: f32) -> Self {
        Self::Capsule { half_height, radius }
    }

    /// Create a cylinder shape
    pub fn cylinder(half_height: f32, radius: f32) -> Self {
        Self::Cylinder { half_height, radius }
    }

    /// Create a ground plane facing +Y
    pub fn ground() -> Self {
        Self::Plane {
            normal: [0.0, 1.0, 0.0],
        }
    }

    /// Check shape parameters before anything reaches the backend
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, v: f32| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(PhysicsError::InvalidShape(format!(
                    "{} must be positive and finite, got {}",
                    name, v
                )))
            }
        };

        match self {
            Self::Sphere { radius } => positive("radius", *radius),
            Self::Box { half_extents } => half_extents
                .iter()
                .try_for_each(|h| positive("half extent", *h)),
            Self::Capsule { half_height, radius } | Self::Cylinder { half_height, radius } => {
                positive("half_height", *half_height)?;
                positive("radius", *radius)
            }
            Self::Plane { normal } => {
                let len_sq: f32 = normal.iter().map(|c| c * c).sum();
                if len_sq.is_finite() && len_sq > f32::EPSILON {
                    Ok(())
                } else {
                    Err(PhysicsError::InvalidShape(format!(
                        "plane normal must be non-zero and finite, got {:?}",
                        normal
                    )))
                }
            }
            Self::ConvexHull { points } => {
                if points.len() < 4 {
                    return Err(PhysicsError::InvalidShape(format!(
                        "convex hull needs at least 4 points, got {}",
                        points.len()
                    )));
                }
                if !points.iter().flatten().all(|c| c.is_finite()) {
                    return Err(PhysicsError::InvalidShape(
                        "convex hull points must be finite".into(),
                    ));
                }
                if spans_volume(points) {
                    Ok(())
                } else {
                    Err(PhysicsError::InvalidShape(
                        "convex hull points are coincident, collinear or coplanar".into(),
                    ))
                }
            }
        }
    }
}

/// Relative tolerance for hull degeneracy, scaled by the point cloud extent
const HULL_TOLERANCE: f32 = 1e-4;

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Whether four of the points are affinely independent: grow a segment, a
/// triangle and a tetrahedron from the farthest candidates.
fn spans_volume(points: &[[f32; 3]]) -> bool {
    let Some(&origin) = points.first() else {
        return false;
    };

    let farthest = |measure: &dyn Fn([f32; 3]) -> f32| {
        points
            .iter()
            .map(|p| (*p, measure(sub(*p, origin))))
            .max_by(|a, b| a.1.total_cmp(&b.1))
    };

    let Some((far, extent_sq)) = farthest(&|d: [f32; 3]| dot(d, d)) else {
        return false;
    };
    let extent = extent_sq.sqrt();
    if extent <= f32::EPSILON {
        return false;
    }
    let axis = sub(far, origin);

    let Some((side, area)) = farthest(&|d: [f32; 3]| {
        let c = cross(axis, d);
        dot(c, c).sqrt()
    }) else {
        return false;
    };
    if area <= HULL_TOLERANCE * extent * extent {
        return false;
    }
    let normal = cross(axis, sub(side, origin));

    match farthest(&|d: [f32; 3]| dot(normal, d).abs()) {
        Some((_, volume)) => volume > HULL_TOLERANCE * extent * extent * extent,
        None => false,
    }
}

/// Description for creating a collider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColliderDesc {
    /// Collision shape
    pub shape: ColliderShape,
    /// Offset from the parent body, or world position when standalone
    pub offset: [f32; 3],
    /// Group/mask used by the filter policy
    pub groups: CollisionGroups,
    /// Surface material
    pub material: PhysicsMaterial,
    /// Overlap-only collider with no physical response
    pub is_sensor: bool,
}

impl Default for ColliderDesc {
    fn default() -> Self {
        Self {
            shape: ColliderShape::default(),
            offset: [0.0, 0.0, 0.0],
            groups: CollisionGroups::ALL,
            material: PhysicsMaterial::default(),
            is_sensor: false,
        }
    }
}

impl ColliderDesc {
    /// Create a new collider description with a shape
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            ..Default::default()
        }
    }

    /// Create a sensor (trigger volume)
    pub fn sensor(shape: ColliderShape) -> Self {
        Self {
            shape,
            is_sensor: true,
            ..Default::default()
        }
    }

    /// Set offset
    pub fn with_offset(mut self, x: f32, y: f32, z: f32) -> Self {
        self.offset = [x, y, z];
        self
    }

    /// Set group and mask
    pub fn with_groups(mut self, group: u32, mask: u32) -> Self {
        self.groups = CollisionGroups::new(group, mask);
        self
    }

    /// Set material
    pub fn with_material(mut self, material: PhysicsMaterial) -> Self {
        self.material = material;
        self
    }

    /// Check shape and offset
    pub fn validate(&self) -> Result<()> {
        self.shape.validate()?;
        if self.offset.iter().all(|c| c.is_finite()) {
            Ok(())
        } else {
            Err(PhysicsError::InvalidShape(format!(
                "collider offset must be finite, got {:?}",
                self.offset
            )))
        }
    }
}
