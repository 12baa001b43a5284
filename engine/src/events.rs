//! Change notifications.

use std::fmt;

use fields::{FieldIndex, StateSource};
use state::{ActorId, FieldValue, ObjectHandle};

/// What kind of operation produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ChangeKind {
    /// A single-field edit through the write API.
    Edit,
    /// Part of a whole-design application.
    Design,
    /// A reset back to base.
    Reset,
    /// Model following a host-driven change.
    Host,
    /// A deferred action run when a transformation window closed.
    Deferred,
}

/// One field of one actor changed.
///
/// `old` and `new` always differ. A write that lands on the current value
/// emits nothing, even when it changes the field's source.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateEvent {
    pub actor: ActorId,
    pub kind: ChangeKind,
    pub field: FieldIndex,
    pub old: FieldValue,
    pub new: FieldValue,
    pub source: StateSource,
    /// Live objects displaying the actor when the change happened.
    pub objects: Vec<ObjectHandle>,
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&StateEvent)>;

/// Synchronous fan-out of [`StateEvent`]s.
///
/// Subscribers run in subscription order on the emitting call stack.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&StateEvent) + 'static) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Removes a subscriber. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    pub fn emit(&mut self, event: &StateEvent) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(event);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
