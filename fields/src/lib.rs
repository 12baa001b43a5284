//! Static field index and provenance tables for vesture actor state.
//!
//! This crate defines how an actor's visual composition is addressed:
//! - Slot enumerations for equipment, appearance, crests, meta flags and colors
//! - A flat, compile-time [`FieldIndex`] covering every trackable field
//! - Per-field provenance ([`StateSource`]) packed four bits per field
//! - Field and appearance bitmasks
//! - A deterministic layout hash
//!
//! # Design Principles
//!
//! - **Static layout** - Indices never change at runtime, so tables are fixed arrays.
//! - **Allocation-free lookups** - Every accessor works on plain integers.

mod error;
mod hash;
mod index;
mod mask;
mod slot;
mod source;

pub use error::{FieldError, FieldResult};
pub use hash::layout_hash;
pub use index::{Field, FieldIndex, FieldKind};
pub use mask::{AppearanceMask, FieldMask};
pub use slot::{AppearanceIndex, ColorParam, CrestSlot, EquipSlot, MetaIndex};
pub use source::{BaseSource, SourceTable, StateSource};

impl std::str::FromStr for Field {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(FieldError::UnknownField)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn public_api_exports() {
        let _ = FieldIndex::MODEL_ID;
        let _ = SourceTable::new();
        let _ = FieldMask::ALL;
        let _ = AppearanceMask::EMPTY;
        let _ = layout_hash();
        let _: FieldResult<()> = Ok(());
    }

    #[test]
    fn source_table_is_four_bits_per_field() {
        assert_eq!(size_of::<SourceTable>(), FieldIndex::COUNT.div_ceil(2));
    }

    #[test]
    fn field_from_str() {
        let field: Field = "meta:visor-toggled".parse().unwrap();
        assert_eq!(field, Field::Meta(MetaIndex::VisorToggled));
        assert!("meta:cape".parse::<Field>().is_err());
    }
}
