//! Actions deferred until an actor's free transformation window closes.

use std::collections::BTreeMap;

use fields::EquipSlot;
use state::ActorId;

/// A command queued while a transformation window is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeferredAction {
    /// The model weapon was edited against the base family; reset it to base if
    /// the families still disagree.
    RevertWeapon { slot: EquipSlot },
    /// The host showed a foreign weapon family; push the model weapon again.
    ReassertWeapon { slot: EquipSlot },
}

/// Per-actor queue of deferred actions.
///
/// Each action runs at most once: [`DeferredQueue::take`] drains it and
/// [`DeferredQueue::discard`] drops it unrun.
#[derive(Debug, Clone, Default)]
pub struct DeferredQueue {
    actions: BTreeMap<ActorId, Vec<DeferredAction>>,
}

impl DeferredQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an action. Identical actions already queued are not duplicated.
    pub fn push(&mut self, actor: ActorId, action: DeferredAction) {
        let queue = self.actions.entry(actor).or_default();
        if !queue.contains(&action) {
            queue.push(action);
        }
    }

    /// Removes and returns every action queued for `actor`, oldest first.
    pub fn take(&mut self, actor: ActorId) -> Vec<DeferredAction> {
        self.actions.remove(&actor).unwrap_or_default()
    }

    /// Drops every action queued for `actor`. Returns how many were dropped.
    pub fn discard(&mut self, actor: ActorId) -> usize {
        self.actions.remove(&actor).map_or(0, |queue| queue.len())
    }

    #[must_use]
    pub fn pending(&self, actor: ActorId) -> usize {
        self.actions.get(&actor).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_runs_each_action_once() {
        let mut queue = DeferredQueue::new();
        let actor = ActorId::new(4);
        queue.push(actor, DeferredAction::ReassertWeapon { slot: EquipSlot::MainHand });
        queue.push(actor, DeferredAction::ReassertWeapon { slot: EquipSlot::MainHand });
        queue.push(actor, DeferredAction::RevertWeapon { slot: EquipSlot::OffHand });
        assert_eq!(queue.pending(actor), 2);

        let actions = queue.take(actor);
        assert_eq!(
            actions,
            vec![
                DeferredAction::ReassertWeapon { slot: EquipSlot::MainHand },
                DeferredAction::RevertWeapon { slot: EquipSlot::OffHand },
            ]
        );
        assert!(queue.take(actor).is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn discard_drops_without_running() {
        let mut queue = DeferredQueue::new();
        let actor = ActorId::new(4);
        queue.push(actor, DeferredAction::RevertWeapon { slot: EquipSlot::MainHand });
        queue.push(ActorId::new(5), DeferredAction::RevertWeapon { slot: EquipSlot::MainHand });
        assert_eq!(queue.discard(actor), 1);
        assert_eq!(queue.discard(actor), 0);
        assert_eq!(queue.pending(ActorId::new(5)), 1);
    }
}
