//! Process-wide event bus.
//!
//! The bus only exists between [`init`] and [`teardown`]. Publishing while it
//! is absent drops the event and returns `false`; nothing is buffered.
//!
//! Handlers are invoked after the bus lock has been released, so a handler may
//! itself publish, subscribe or unsubscribe.

use crate::{Event, EventBus, Priority, SubscriberId};
use crossbeam_channel::Receiver;
use parking_lot::{const_rwlock, RwLock};
use std::any::Any;

static BUS: RwLock<Option<EventBus>> = const_rwlock(None);

/// Install the process-wide bus. Returns `false` if one is already installed,
/// in which case its subscriptions are kept.
pub fn init() -> bool {
    let mut bus = BUS.write();
    if bus.is_some() {
        return false;
    }
    *bus = Some(EventBus::new());
    log::debug!("Global event bus initialized");
    true
}

/// Remove the process-wide bus and every subscription on it.
/// Returns `false` if there was nothing to tear down.
pub fn teardown() -> bool {
    let removed = BUS.write().take().is_some();
    if removed {
        log::debug!("Global event bus torn down");
    }
    removed
}

/// Whether the bus is currently installed
pub fn is_initialized() -> bool {
    BUS.read().is_some()
}

/// Publish an event to every subscriber of its type.
/// Returns `false` when the bus is not installed.
pub fn publish<E: Event>(event: &E) -> bool {
    let handlers = match BUS.read().as_ref() {
        Some(bus) => bus.handlers_for::<E>(),
        None => return false,
    };
    for handler in &handlers {
        handler(event as &dyn Any);
    }
    true
}

/// Subscribe to an event type. `None` when the bus is not installed.
pub fn subscribe<E: Event, F>(handler: F) -> Option<SubscriberId>
where
    F: Fn(&E) + Send + Sync + 'static,
{
    subscribe_with_priority(handler, Priority::Normal)
}

/// Subscribe with priority. `None` when the bus is not installed.
pub fn subscribe_with_priority<E: Event, F>(handler: F, priority: Priority) -> Option<SubscriberId>
where
    F: Fn(&E) + Send + Sync + 'static,
{
    BUS.write()
        .as_mut()
        .map(|bus| bus.subscribe_with_priority(handler, priority))
}

/// Subscribe through a channel. `None` when the bus is not installed.
pub fn channel<E: Event + Clone>() -> Option<(SubscriberId, Receiver<E>)> {
    BUS.write().as_mut().map(|bus| bus.channel::<E>())
}

/// Remove a subscription. Returns whether anything was removed.
pub fn unsubscribe(id: SubscriberId) -> bool {
    BUS.write()
        .as_mut()
        .map(|bus| bus.unsubscribe(id))
        .unwrap_or(false)
}
