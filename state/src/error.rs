//! Error types for state edits.

use fields::{AppearanceIndex, EquipSlot, FieldIndex};
use thiserror::Error;

use crate::types::{ActorId, WeaponFamily};

/// Result type for state operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors returned by the semantic write API.
///
/// A returned error always means nothing was written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The state is locked under a different key.
    #[error("{actor} is locked")]
    Locked { actor: ActorId },

    /// Appearance value outside its legal range for the current identity.
    #[error("appearance {index:?} value {value} is not legal for the current identity")]
    InvalidAppearance { index: AppearanceIndex, value: u8 },

    /// Race, clan, gender and body type do not form a legal identity.
    #[error("appearance identity is not legal")]
    InvalidIdentity,

    /// Weapon does not belong to the family recorded in the base snapshot.
    #[error("{slot:?} expects weapon {expected}, got {found}")]
    WeaponFamilyMismatch {
        slot: EquipSlot,
        expected: WeaponFamily,
        found: WeaponFamily,
    },

    /// No state is tracked for this actor.
    #[error("{actor} is not tracked")]
    UnknownActor { actor: ActorId },

    /// The host currently displays no object for this actor.
    #[error("{actor} has no live object")]
    ActorUnavailable { actor: ActorId },

    /// The configured actor cap is reached.
    #[error("actor registry full ({max} actors)")]
    RegistryFull { max: usize },

    /// A value of the wrong kind was addressed to a field.
    #[error("cannot store {found} value in {field}")]
    ValueKindMismatch {
        field: FieldIndex,
        found: &'static str,
    },
}

impl StateError {
    /// Returns `true` for rejections caused by another lock holder.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }
}
