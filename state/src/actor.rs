//! The per-actor aggregate record.

use fields::{FieldIndex, FieldMask, SourceTable, StateSource};

use crate::snapshot::Snapshot;
use crate::types::{ActorId, LockKey};

/// Tracked state for one actor.
///
/// `base` mirrors what the unmodified host displays, `model` is what should be
/// displayed instead. Wherever a field's source is [`StateSource::Game`] the two
/// agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorState {
    pub(crate) id: ActorId,
    pub(crate) base: Snapshot,
    pub(crate) model: Snapshot,
    pub(crate) sources: SourceTable,
    pub(crate) lock: Option<LockKey>,
}

impl ActorState {
    /// Creates a state whose model equals `base`, every field sourced from the game.
    #[must_use]
    pub fn new(id: ActorId, base: Snapshot) -> Self {
        Self {
            id,
            model: base.clone(),
            base,
            sources: SourceTable::new(),
            lock: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> ActorId {
        self.id
    }

    #[must_use]
    pub const fn base(&self) -> &Snapshot {
        &self.base
    }

    #[must_use]
    pub const fn model(&self) -> &Snapshot {
        &self.model
    }

    #[must_use]
    pub const fn sources(&self) -> &SourceTable {
        &self.sources
    }

    #[must_use]
    pub fn source(&self, field: FieldIndex) -> StateSource {
        self.sources.get(field)
    }

    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    /// Returns `true` if a caller presenting `key` may edit this state.
    #[must_use]
    pub fn can_edit(&self, key: LockKey) -> bool {
        self.lock.map_or(true, |held| held == key)
    }

    /// Locks the state under `key`.
    ///
    /// Succeeds if the state was unlocked or already held by `key`.
    pub fn lock(&mut self, key: LockKey) -> bool {
        match self.lock {
            None => {
                self.lock = Some(key);
                true
            }
            Some(held) => held == key,
        }
    }

    /// Releases the lock if `key` holds it.
    pub fn unlock(&mut self, key: LockKey) -> bool {
        if self.lock == Some(key) {
            self.lock = None;
            true
        } else {
            false
        }
    }

    /// Fields whose source is game but whose model value differs from base.
    ///
    /// Always empty for states only touched through [`crate::StateEditor`].
    #[must_use]
    pub fn inconsistent_fields(&self) -> FieldMask {
        self.sources
            .iter()
            .filter(|(field, source)| source.is_game() && !self.model.same(&self.base, *field))
            .map(|(field, _)| field)
            .collect()
    }

    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.inconsistent_fields().is_empty()
    }

    /// Fields where model and base currently diverge.
    #[must_use]
    pub fn overrides(&self) -> FieldMask {
        self.model.diff(&self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fields::{EquipSlot, MetaIndex};

    #[test]
    fn new_state_is_consistent() {
        let state = ActorState::new(ActorId::new(1), Snapshot::new());
        assert!(state.is_consistent());
        assert!(state.overrides().is_empty());
        assert_eq!(state.sources().count(StateSource::is_game), FieldIndex::COUNT);
    }

    #[test]
    fn lock_requires_matching_key() {
        let mut state = ActorState::new(ActorId::new(1), Snapshot::new());
        let key = LockKey::new(77);
        assert!(state.can_edit(LockKey::NONE));
        assert!(state.lock(key));
        assert!(state.lock(key));
        assert!(!state.lock(LockKey::new(78)));
        assert!(state.can_edit(key));
        assert!(!state.can_edit(LockKey::NONE));
        assert!(!state.unlock(LockKey::NONE));
        assert!(state.unlock(key));
        assert!(!state.is_locked());
    }

    #[test]
    fn inconsistency_is_detected() {
        let mut state = ActorState::new(ActorId::new(1), Snapshot::new());
        state.model.set_meta(MetaIndex::Wetness, true);
        let field = FieldIndex::meta(MetaIndex::Wetness);
        assert_eq!(state.inconsistent_fields(), FieldMask::single(field));

        state.sources.set(field, StateSource::Manual);
        assert!(state.is_consistent());
        assert!(state.overrides().contains(field));
        assert!(!state.overrides().contains(FieldIndex::equip(EquipSlot::Head)));
    }
}
