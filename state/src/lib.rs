//! Actor snapshots and provenance-tracked actor state.
//!
//! This crate holds everything about a tracked actor that does not need the host:
//! - Value types for items, stains, raw host gear, model identities and colors
//! - [`Appearance`] plus pluggable legality rules ([`AppearanceRules`])
//! - [`Snapshot`], an actor's full visual composition
//! - [`ActorState`], pairing the base snapshot (what the host shows) with the
//!   model snapshot (what should be shown) and a per-field [`fields::SourceTable`]
//! - [`StateEditor`], the lock-checked mutation primitives
//!
//! # Design Principles
//!
//! - **No host knowledge** - Nothing here reads or writes a live object.
//! - **Whole or nothing** - Failed edits leave the state untouched.
//! - **Game means base** - A field sourced from the game always equals its base value.

mod actor;
mod appearance;
mod editor;
mod error;
mod snapshot;
mod types;

pub use actor::ActorState;
pub use appearance::{
    Appearance, AppearanceRules, StandardRules, GENDER_FEMALE, GENDER_MALE, RACE_AU_RA,
    RACE_ELEZEN, RACE_HROTHGAR, RACE_HYUR, RACE_LALAFELL, RACE_MIQOTE, RACE_ROEGADYN, RACE_VIERA,
};
pub use editor::{AppearanceChange, EditContext, StateEditor};
pub use error::{StateError, StateResult};
pub use snapshot::{body_fields, FieldValue, MetaFlags, Snapshot};
pub use types::{
    ActorId, Armor, ColorValue, EquipItem, ItemId, LockKey, ModelId, ObjectHandle, StainId,
    Weapon, WeaponFamily,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = Snapshot::new();
        let _ = ActorState::new(ActorId::new(0), Snapshot::new());
        let _ = EditContext::manual();
        let _ = StandardRules;
        let _: StateResult<()> = Ok(());
    }
}
