//! # void_event - Typed Event Bus
//!
//! Publish/subscribe plumbing shared by engine subsystems:
//! - Typed handlers keyed by event type
//! - Priority-ordered delivery
//! - Channel subscriptions backed by `crossbeam-channel`
//! - A process-wide bus with explicit [`global::init`] / [`global::teardown`]
//!
//! Publishers never hold on to subscriber lists; they hand events to a bus
//! and the bus fans them out.

use crossbeam_channel::Receiver;
use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::sync::Arc;

pub mod global;

/// Delivery priority of a subscription
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
    Critical = 3,
}

/// Trait for events
pub trait Event: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Event for T {}

/// Type-erased handler as stored by the bus
pub(crate) type DynamicHandler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Subscriber ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

struct Subscription {
    id: SubscriberId,
    priority: Priority,
    handler: DynamicHandler,
}

/// Event bus for publishing and subscribing to events
pub struct EventBus {
    /// Handlers per event type, highest priority first
    handlers: BTreeMap<TypeId, Vec<Subscription>>,
    next_subscriber_id: u64,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
            next_subscriber_id: 1,
        }
    }

    /// Subscribe to an event type
    pub fn subscribe<E: Event, F>(&mut self, handler: F) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.subscribe_with_priority::<E, F>(handler, Priority::Normal)
    }

    /// Subscribe with priority.
    ///
    /// Handlers sharing a priority run in subscription order.
    pub fn subscribe_with_priority<E: Event, F>(
        &mut self,
        handler: F,
        priority: Priority,
    ) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriberId(self.next_subscriber_id);
        self.next_subscriber_id += 1;

        let wrapped: DynamicHandler = Arc::new(move |any: &dyn Any| {
            if let Some(event) = any.downcast_ref::<E>() {
                handler(event);
            }
        });

        let handlers = self.handlers.entry(TypeId::of::<E>()).or_default();
        handlers.push(Subscription {
            id,
            priority,
            handler: wrapped,
        });
        // Stable sort keeps subscription order within a priority
        handlers.sort_by(|a, b| b.priority.cmp(&a.priority));

        id
    }

    /// Subscribe through a channel.
    ///
    /// Every published `E` is cloned into the returned receiver. Dropping the
    /// receiver does not unsubscribe; pass the id to [`EventBus::unsubscribe`].
    pub fn channel<E: Event + Clone>(&mut self) -> (SubscriberId, Receiver<E>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let id = self.subscribe(move |event: &E| {
            let _ = sender.send(event.clone());
        });
        (id, receiver)
    }

    /// Unsubscribe. Returns whether a subscription was removed.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let mut removed = false;
        for handlers in self.handlers.values_mut() {
            let before = handlers.len();
            handlers.retain(|sub| sub.id != id);
            removed |= handlers.len() != before;
        }
        self.handlers.retain(|_, handlers| !handlers.is_empty());
        removed
    }

    /// Deliver an event to every handler of its type, in priority order.
    /// Returns the number of handlers invoked.
    pub fn publish<E: Event>(&self, event: &E) -> usize {
        let handlers = self.handlers_for::<E>();
        for handler in &handlers {
            handler(event as &dyn Any);
        }
        handlers.len()
    }

    /// Snapshot of the handlers for `E`, so they can run without a borrow of the bus
    pub(crate) fn handlers_for<E: Event>(&self) -> Vec<DynamicHandler> {
        self.handlers
            .get(&TypeId::of::<E>())
            .map(|subs| subs.iter().map(|sub| Arc::clone(&sub.handler)).collect())
            .unwrap_or_default()
    }

    /// Number of live subscriptions for `E`
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.handlers
            .get(&TypeId::of::<E>())
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Drop every subscription
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Prelude
pub mod prelude {
    pub use crate::{Event, EventBus, Priority, SubscriberId};
}
