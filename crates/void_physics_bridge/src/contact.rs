//! Contact lifecycle tracking
//!
//! The backend only knows which colliders touch right now. The tracker turns
//! that per-step snapshot into begin/during/end transitions by remembering
//! the state of every pair it has admitted.
//!
//! | previous        | touching | next   | transition |
//! |-----------------|----------|--------|------------|
//! | None            | no       | None   | -          |
//! | None            | yes      | Began  | began      |
//! | Began / During  | yes      | During | during     |
//! | Began / During  | no       | None   | ended      |

use crate::body::BodyKind;
use crate::entity::Entity;
use crate::layers::CollisionGroups;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

/// Unordered pair of entities, stored with `a <= b`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContactPair {
    a: Entity,
    b: Entity,
}

impl ContactPair {
    /// Canonical pair; argument order does not matter
    pub fn new(x: Entity, y: Entity) -> Self {
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }

    /// Lower entity
    #[inline]
    pub fn a(&self) -> Entity {
        self.a
    }

    /// Higher entity
    #[inline]
    pub fn b(&self) -> Entity {
        self.b
    }

    /// Whether `entity` is one side of the pair
    pub fn contains(&self, entity: Entity) -> bool {
        self.a == entity || self.b == entity
    }

    /// The side that is not `entity`
    pub fn other(&self, entity: Entity) -> Option<Entity> {
        if self.a == entity {
            Some(self.b)
        } else if self.b == entity {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Tracked state of a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ContactState {
    /// Not touching (or filtered out)
    #[default]
    None,
    /// Started touching this step
    Began,
    /// Touching for more than one step
    During,
}

/// Pairs that changed state in one update, each list ascending
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactTransitions {
    pub began: Vec<ContactPair>,
    pub during: Vec<ContactPair>,
    pub ended: Vec<ContactPair>,
}

impl ContactTransitions {
    /// No transitions at all
    pub fn is_empty(&self) -> bool {
        self.began.is_empty() && self.during.is_empty() && self.ended.is_empty()
    }

    /// Total number of transitions
    pub fn len(&self) -> usize {
        self.began.len() + self.during.len() + self.ended.len()
    }
}

/// What the tracker needs to know about each entity of a pair
pub trait ContactParticipants {
    /// Group/mask of the entity's collider, `None` if it has no collider
    fn collision_groups(&self, entity: Entity) -> Option<CollisionGroups>;

    /// Kind of the entity's body; body-less colliders count as static
    fn body_kind(&self, entity: Entity) -> BodyKind;
}

/// Per-pair contact state machine
#[derive(Debug, Default)]
pub struct ContactTracker {
    tracked: HashMap<ContactPair, ContactState>,
}

impl ContactTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the set of currently touching entity pairs.
    ///
    /// Runs in time proportional to the tracked pairs plus the reported
    /// pairs. Duplicate and reversed reports of the same pair collapse.
    pub fn update<I, P>(&mut self, touching: I, participants: &P) -> ContactTransitions
    where
        I: IntoIterator<Item = (Entity, Entity)>,
        P: ContactParticipants + ?Sized,
    {
        let current: HashSet<ContactPair> = touching
            .into_iter()
            .filter(|(x, y)| x != y)
            .map(|(x, y)| ContactPair::new(x, y))
            .filter(|pair| Self::admits(pair, participants))
            .collect();

        let mut transitions = ContactTransitions::default();

        self.tracked.retain(|pair, _| {
            let still_touching = current.contains(pair);
            if !still_touching {
                transitions.ended.push(*pair);
            }
            still_touching
        });

        for pair in current {
            match self.tracked.entry(pair) {
                Entry::Occupied(mut entry) => {
                    entry.insert(ContactState::During);
                    transitions.during.push(pair);
                }
                Entry::Vacant(entry) => {
                    entry.insert(ContactState::Began);
                    transitions.began.push(pair);
                }
            }
        }

        transitions.began.sort_unstable();
        transitions.during.sort_unstable();
        transitions.ended.sort_unstable();

        log::trace!(
            "Contact update: {} began, {} during, {} ended",
            transitions.began.len(),
            transitions.during.len(),
            transitions.ended.len()
        );

        transitions
    }

    /// Filter policy plus the static-static exclusion
    fn admits<P: ContactParticipants + ?Sized>(pair: &ContactPair, participants: &P) -> bool {
        let (Some(groups_a), Some(groups_b)) = (
            participants.collision_groups(pair.a),
            participants.collision_groups(pair.b),
        ) else {
            return false;
        };

        if !groups_a.can_collide(&groups_b) {
            return false;
        }

        participants.body_kind(pair.a) != BodyKind::Static
            || participants.body_kind(pair.b) != BodyKind::Static
    }

    /// Current state of a pair
    pub fn state(&self, a: Entity, b: Entity) -> ContactState {
        self.tracked
            .get(&ContactPair::new(a, b))
            .copied()
            .unwrap_or_default()
    }

    /// Every tracked pair, ascending
    pub fn tracked(&self) -> Vec<(ContactPair, ContactState)> {
        let mut pairs: Vec<_> = self.tracked.iter().map(|(p, s)| (*p, *s)).collect();
        pairs.sort_unstable_by_key(|(pair, _)| *pair);
        pairs
    }

    /// Number of tracked pairs
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Forget every pair without emitting transitions
    pub fn clear(&mut self) {
        self.tracked.clear();
    }
}
