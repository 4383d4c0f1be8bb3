//! Contact events published to the process-wide bus

use crate::contact::{ContactPair, ContactTransitions};
use crate::entity::Entity;
use serde::{Deserialize, Serialize};

/// Lifecycle stage of a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactEventKind {
    Begin,
    During,
    End,
}

impl ContactEventKind {
    /// Event name as seen by listeners
    pub fn name(&self) -> &'static str {
        match self {
            Self::Begin => "beginContact",
            Self::During => "duringContact",
            Self::End => "endContact",
        }
    }
}

/// A contact lifecycle event. `entity_a <= entity_b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactEvent {
    pub kind: ContactEventKind,
    pub entity_a: Entity,
    pub entity_b: Entity,
}

impl ContactEvent {
    pub fn new(kind: ContactEventKind, pair: ContactPair) -> Self {
        Self {
            kind,
            entity_a: pair.a(),
            entity_b: pair.b(),
        }
    }

    /// The pair this event is about
    pub fn pair(&self) -> ContactPair {
        ContactPair::new(self.entity_a, self.entity_b)
    }

    /// Whether `entity` takes part in this contact
    pub fn involves(&self, entity: Entity) -> bool {
        self.entity_a == entity || self.entity_b == entity
    }
}

/// Flatten transitions into publication order: ended, began, during
pub fn ordered_events(transitions: &ContactTransitions) -> Vec<ContactEvent> {
    let ended = transitions
        .ended
        .iter()
        .map(|p| ContactEvent::new(ContactEventKind::End, *p));
    let began = transitions
        .began
        .iter()
        .map(|p| ContactEvent::new(ContactEventKind::Begin, *p));
    let during = transitions
        .during
        .iter()
        .map(|p| ContactEvent::new(ContactEventKind::During, *p));

    ended.chain(began).chain(during).collect()
}

/// Publish events to the global bus in order.
///
/// Returns the number of events delivered to a live bus; zero when no bus
/// has been initialized.
pub fn publish(events: &[ContactEvent]) -> usize {
    if events.is_empty() || !void_event::global::is_initialized() {
        return 0;
    }

    events
        .iter()
        .filter(|event| void_event::global::publish(*event))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(x: u32, y: u32) -> ContactPair {
        ContactPair::new(Entity::new(x, 0), Entity::new(y, 0))
    }

    #[test]
    fn test_names() {
        assert_eq!(ContactEventKind::Begin.name(), "beginContact");
        assert_eq!(ContactEventKind::During.name(), "duringContact");
        assert_eq!(ContactEventKind::End.name(), "endContact");
    }

    #[test]
    fn test_end_before_begin_before_during() {
        let transitions = ContactTransitions {
            began: vec![pair(1, 2)],
            during: vec![pair(3, 4), pair(5, 6)],
            ended: vec![pair(1, 2)],
        };

        let kinds: Vec<_> = ordered_events(&transitions)
            .into_iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                ContactEventKind::End,
                ContactEventKind::Begin,
                ContactEventKind::During,
                ContactEventKind::During,
            ]
        );
    }

    #[test]
    fn test_event_entities_are_canonical() {
        let event = ContactEvent::new(ContactEventKind::Begin, pair(7, 2));
        assert_eq!(event.entity_a, Entity::new(2, 0));
        assert_eq!(event.entity_b, Entity::new(7, 0));
        assert!(event.involves(Entity::new(7, 0)));
        assert_eq!(event.pair(), pair(2, 7));
    }
}
