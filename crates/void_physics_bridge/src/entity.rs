//! Entity references as seen by the physics bridge
//!
//! The entity container owns entity lifetimes. The bridge only stores these
//! non-owning generational indices and compares them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generational arena index naming an entity.
///
/// Ordering is by index, then generation. Contact pairs and raycast ties
/// rely on this ordering being total and stable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    /// Create an entity reference
    #[inline]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Entity index
    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Entity generation
    #[inline]
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Pack into a u64 (generation in the high half)
    #[inline]
    pub const fn to_bits(&self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }

    /// Unpack from [`Entity::to_bits`]
    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_bits() {
        let e = Entity::new(123, 456);
        assert_eq!(Entity::from_bits(e.to_bits()), e);
        assert_eq!(e.index(), 123);
        assert_eq!(e.generation(), 456);
    }

    #[test]
    fn test_entity_ordering() {
        let a = Entity::new(1, 9);
        let b = Entity::new(2, 0);
        let c = Entity::new(2, 1);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(format!("{:?}", c), "Entity(2v1)");
    }
}
