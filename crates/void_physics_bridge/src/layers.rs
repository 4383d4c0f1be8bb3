//! Collision groups and the pair filter policy

use serde::{Deserialize, Serialize};

/// A single collision layer (bit index into a group or mask)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionLayer(pub u32);

impl CollisionLayer {
    /// Get the layer as a bitmask. Layers past bit 31 map to no bits.
    pub fn as_mask(&self) -> u32 {
        1u32.checked_shl(self.0).unwrap_or(0)
    }
}

/// Group/mask pair attached to every collider.
///
/// `group` is what the collider is, `mask` is what it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionGroups {
    /// Which groups this collider belongs to
    pub group: u32,
    /// Which groups this collider accepts contacts from
    pub mask: u32,
}

impl CollisionGroups {
    /// Belongs to every group and accepts every group
    pub const ALL: Self = Self {
        group: u32::MAX,
        mask: u32::MAX,
    };

    /// Excluded from all contact generation
    pub const NONE: Self = Self { group: 0, mask: 0 };

    /// Create new collision groups
    pub const fn new(group: u32, mask: u32) -> Self {
        Self { group, mask }
    }

    /// A single layer accepting the listed layers
    pub fn from_layer(layer: CollisionLayer, collides_with: &[CollisionLayer]) -> Self {
        let mask = collides_with.iter().fold(0u32, |acc, l| acc | l.as_mask());
        Self {
            group: layer.as_mask(),
            mask,
        }
    }

    /// Replace the mask
    pub fn with_mask(mut self, mask: u32) -> Self {
        self.mask = mask;
        self
    }

    /// Replace the group
    pub fn with_group(mut self, group: u32) -> Self {
        self.group = group;
        self
    }

    /// Check if two colliders may generate contacts
    pub fn can_collide(&self, other: &CollisionGroups) -> bool {
        should_collide(self.group, self.mask, other.group, other.mask)
    }
}

impl Default for CollisionGroups {
    fn default() -> Self {
        Self::ALL
    }
}

/// Symmetric pair test: each side's mask must admit the other's group.
#[inline]
pub fn should_collide(group_a: u32, mask_a: u32, group_b: u32, mask_b: u32) -> bool {
    (mask_a & group_b) != 0 && (mask_b & group_a) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER: CollisionLayer = CollisionLayer(1);
    const ENEMIES: CollisionLayer = CollisionLayer(2);
    const PROJECTILES: CollisionLayer = CollisionLayer(3);

    #[test]
    fn test_collision_groups() {
        let player = CollisionGroups::from_layer(PLAYER, &[ENEMIES]);
        let enemy = CollisionGroups::from_layer(ENEMIES, &[PLAYER, PROJECTILES]);
        let projectile = CollisionGroups::from_layer(PROJECTILES, &[ENEMIES]);

        assert!(player.can_collide(&enemy));
        assert!(enemy.can_collide(&projectile));
        assert!(!player.can_collide(&projectile));
    }

    #[test]
    fn test_filter_is_and_not_or() {
        // A admits B, B does not admit A
        assert!(!should_collide(0b01, 0b10, 0b10, 0b00));
        assert!(!should_collide(0b10, 0b00, 0b01, 0b10));
        assert!(should_collide(0b01, 0b10, 0b10, 0b01));
    }

    #[test]
    fn test_zero_mask_excludes_everything() {
        let silent = CollisionGroups::ALL.with_mask(0);
        assert!(!silent.can_collide(&CollisionGroups::ALL));
        assert!(!CollisionGroups::ALL.can_collide(&silent));
        assert!(!CollisionGroups::NONE.can_collide(&CollisionGroups::NONE));
    }

    #[test]
    fn test_default_collides_with_everything() {
        let a = CollisionGroups::default();
        let b = CollisionGroups::new(0b100, 0b1);
        assert!(a.can_collide(&b));
        assert!(b.can_collide(&a));
    }

    #[test]
    fn test_layer_mask() {
        assert_eq!(CollisionLayer(0).as_mask(), 1);
        assert_eq!(CollisionLayer(5).as_mask(), 32);
        assert_eq!(CollisionLayer(40).as_mask(), 0);
    }
}
