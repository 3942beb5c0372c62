//! Synchronous event bus owned by one simulation session.
//!
//! `emit` snapshots the subscriber list before dispatching. A handler added
//! during a dispatch first hears the next event; a handler removed during a
//! dispatch still receives the event in flight. Handlers may emit again: the
//! nested emit takes its own snapshot and runs to completion before the outer
//! dispatch continues.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use uuid::Uuid;

use super::GameEvent;

/// Identifies one subscription on a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Handler = Rc<dyn Fn(&GameEvent)>;
type HandlerList = RefCell<Vec<(SubscriptionId, Handler)>>;

/// Event bus. Handlers run on the emitting thread, in subscription order.
#[derive(Default)]
pub struct Bus {
    handlers: Rc<HandlerList>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, handler: impl Fn(&GameEvent) + 'static) -> Subscription {
        let id = SubscriptionId::new();
        self.handlers.borrow_mut().push((id, Rc::new(handler)));
        Subscription {
            id,
            handlers: Rc::downgrade(&self.handlers),
        }
    }

    pub fn emit(&self, event: &GameEvent) {
        let snapshot: Vec<Handler> = self
            .handlers
            .borrow()
            .iter()
            .map(|(_, handler)| Rc::clone(handler))
            .collect();

        tracing::trace!(event = %event.kind, handlers = snapshot.len(), "Dispatching event");
        for handler in snapshot {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.borrow().len()
    }
}

/// Handle returned by [`Bus::subscribe`]. Dropping it keeps the handler
/// subscribed; call [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    id: SubscriptionId,
    handlers: Weak<HandlerList>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Remove the handler. Returns false if the bus or handler is already gone.
    pub fn unsubscribe(self) -> bool {
        let Some(handlers) = self.handlers.upgrade() else {
            return false;
        };
        let mut handlers = handlers.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(id, _)| *id != self.id);
        handlers.len() != before
    }
}
