//! Per-field provenance tags and the packed provenance table.

use std::fmt;

use crate::error::FieldError;
use crate::FieldIndex;

/// The authority that last wrote a field.
///
/// Pending variants only occur for fields whose host-side application is
/// asynchronous (advanced colors) and collapse once the host applied them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum StateSource {
    #[default]
    Game = 0,
    Manual = 1,
    Fixed = 2,
    ExternalManual = 3,
    ExternalFixed = 4,
    ManualPending = 5,
    ExternalPending = 6,
}

/// The coarse classification of a [`StateSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseSource {
    Game,
    Manual,
    Fixed,
}

impl StateSource {
    pub const ALL: [Self; 7] = [
        Self::Game,
        Self::Manual,
        Self::Fixed,
        Self::ExternalManual,
        Self::ExternalFixed,
        Self::ManualPending,
        Self::ExternalPending,
    ];

    /// Decodes a source from its 4-bit cell value.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Game),
            1 => Some(Self::Manual),
            2 => Some(Self::Fixed),
            3 => Some(Self::ExternalManual),
            4 => Some(Self::ExternalFixed),
            5 => Some(Self::ManualPending),
            6 => Some(Self::ExternalPending),
            _ => None,
        }
    }

    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn base(self) -> BaseSource {
        match self {
            Self::Game => BaseSource::Game,
            Self::Manual | Self::ExternalManual | Self::ManualPending | Self::ExternalPending => {
                BaseSource::Manual
            }
            Self::Fixed | Self::ExternalFixed => BaseSource::Fixed,
        }
    }

    #[must_use]
    pub const fn is_game(self) -> bool {
        matches!(self.base(), BaseSource::Game)
    }

    #[must_use]
    pub const fn is_manual(self) -> bool {
        matches!(self.base(), BaseSource::Manual)
    }

    #[must_use]
    pub const fn is_fixed(self) -> bool {
        matches!(self.base(), BaseSource::Fixed)
    }

    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::ManualPending | Self::ExternalPending)
    }

    #[must_use]
    pub const fn is_external(self) -> bool {
        matches!(
            self,
            Self::ExternalManual | Self::ExternalFixed | Self::ExternalPending
        )
    }

    /// Returns the pending counterpart used while the host has not applied a value yet.
    #[must_use]
    pub const fn to_pending(self) -> Self {
        match self {
            Self::Manual | Self::Fixed => Self::ManualPending,
            Self::ExternalManual | Self::ExternalFixed => Self::ExternalPending,
            other => other,
        }
    }

    /// Collapses a pending source to the source it stands for once applied.
    #[must_use]
    pub const fn to_applied(self) -> Self {
        match self {
            Self::ManualPending => Self::Manual,
            Self::ExternalPending => Self::ExternalManual,
            other => other,
        }
    }

    /// Demotes a fixed source to its manual counterpart.
    #[must_use]
    pub const fn unfix(self) -> Self {
        match self {
            Self::Fixed => Self::Manual,
            Self::ExternalFixed => Self::ExternalManual,
            other => other,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Game => "game",
            Self::Manual => "manual",
            Self::Fixed => "fixed",
            Self::ExternalManual => "external-manual",
            Self::ExternalFixed => "external-fixed",
            Self::ManualPending => "manual-pending",
            Self::ExternalPending => "external-pending",
        }
    }
}

impl TryFrom<u8> for StateSource {
    type Error = FieldError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::from_raw(raw).ok_or(FieldError::InvalidSource { raw })
    }
}

impl fmt::Display for StateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const PACKED_LEN: usize = FieldIndex::COUNT.div_ceil(2);

/// One provenance tag per field, packed two per byte.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SourceTable {
    cells: [u8; PACKED_LEN],
}

impl SourceTable {
    /// Creates a table with every field sourced from the game.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cells: [0; PACKED_LEN],
        }
    }

    /// Returns the provenance of a field.
    #[must_use]
    pub fn get(&self, field: FieldIndex) -> StateSource {
        let (byte, shift) = Self::cell(field);
        let raw = (self.cells[byte] >> shift) & 0x0F;
        // Only `set` writes cells and it stores valid sources.
        StateSource::from_raw(raw).unwrap_or_default()
    }

    /// Sets the provenance of a field, returning the previous one.
    pub fn set(&mut self, field: FieldIndex, source: StateSource) -> StateSource {
        let old = self.get(field);
        let (byte, shift) = Self::cell(field);
        let cell = &mut self.cells[byte];
        *cell = (*cell & !(0x0F << shift)) | (source.raw() << shift);
        old
    }

    /// Sets every field to `source`.
    pub fn set_all(&mut self, source: StateSource) {
        let raw = source.raw();
        self.cells = [raw | (raw << 4); PACKED_LEN];
        if FieldIndex::COUNT % 2 == 1 {
            self.cells[PACKED_LEN - 1] &= 0x0F;
        }
    }

    /// Reclassifies every fixed source as manual.
    ///
    /// Returns the number of fields that changed.
    pub fn remove_fixed(&mut self) -> usize {
        let mut changed = 0;
        for field in FieldIndex::all() {
            let source = self.get(field);
            if source.is_fixed() {
                self.set(field, source.unfix());
                changed += 1;
            }
        }
        changed
    }

    /// Collapses a pending source on `field`, returning `true` if it was pending.
    pub fn collapse_pending(&mut self, field: FieldIndex) -> bool {
        let source = self.get(field);
        if source.is_pending() {
            self.set(field, source.to_applied());
            true
        } else {
            false
        }
    }

    /// Iterates `(field, source)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldIndex, StateSource)> + '_ {
        FieldIndex::all().map(move |field| (field, self.get(field)))
    }

    /// Counts fields whose source satisfies `pred`.
    #[must_use]
    pub fn count(&self, pred: impl Fn(StateSource) -> bool) -> usize {
        self.iter().filter(|(_, source)| pred(*source)).count()
    }

    /// Returns the packed cells.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PACKED_LEN] {
        &self.cells
    }

    const fn cell(field: FieldIndex) -> (usize, u32) {
        let index = field.get();
        (index / 2, ((index % 2) * 4) as u32)
    }
}

impl Default for SourceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SourceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.iter()
                    .filter(|(_, source)| !source.is_game())
                    .map(|(field, source)| (field.to_string(), source)),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColorParam, EquipSlot};

    #[test]
    fn raw_roundtrip() {
        for source in StateSource::ALL {
            assert_eq!(StateSource::from_raw(source.raw()), Some(source));
        }
        assert_eq!(StateSource::from_raw(7), None);
        assert!(matches!(
            StateSource::try_from(15),
            Err(FieldError::InvalidSource { raw: 15 })
        ));
    }

    #[test]
    fn base_classification() {
        assert!(StateSource::Game.is_game());
        assert!(StateSource::ExternalManual.is_manual());
        assert!(StateSource::ManualPending.is_manual());
        assert!(StateSource::ExternalPending.is_manual());
        assert!(StateSource::ExternalFixed.is_fixed());
        assert!(!StateSource::Fixed.is_manual());
    }

    #[test]
    fn pending_collapses_to_applied() {
        assert_eq!(StateSource::Manual.to_pending(), StateSource::ManualPending);
        assert_eq!(
            StateSource::ExternalFixed.to_pending(),
            StateSource::ExternalPending
        );
        assert_eq!(StateSource::Game.to_pending(), StateSource::Game);
        assert_eq!(StateSource::ManualPending.to_applied(), StateSource::Manual);
        assert_eq!(
            StateSource::ExternalPending.to_applied(),
            StateSource::ExternalManual
        );
    }

    #[test]
    fn neighbouring_cells_are_independent() {
        let mut table = SourceTable::new();
        let a = FieldIndex::equip(EquipSlot::Head);
        let b = FieldIndex::equip(EquipSlot::Body);
        table.set(a, StateSource::ExternalPending);
        table.set(b, StateSource::Fixed);
        assert_eq!(table.get(a), StateSource::ExternalPending);
        assert_eq!(table.get(b), StateSource::Fixed);
        assert_eq!(table.set(a, StateSource::Game), StateSource::ExternalPending);
        assert_eq!(table.get(a), StateSource::Game);
        assert_eq!(table.get(b), StateSource::Fixed);
    }

    #[test]
    fn set_all_and_count() {
        let mut table = SourceTable::new();
        table.set_all(StateSource::Manual);
        assert_eq!(table.count(StateSource::is_manual), FieldIndex::COUNT);
        let last = FieldIndex::color(ColorParam::FacePaintUvOffset);
        assert_eq!(table.get(last), StateSource::Manual);
    }

    #[test]
    fn remove_fixed_demotes_only_fixed() {
        let mut table = SourceTable::new();
        let fixed = FieldIndex::equip(EquipSlot::Legs);
        let external = FieldIndex::stain(EquipSlot::Legs);
        let manual = FieldIndex::equip(EquipSlot::Feet);
        table.set(fixed, StateSource::Fixed);
        table.set(external, StateSource::ExternalFixed);
        table.set(manual, StateSource::Manual);

        assert_eq!(table.remove_fixed(), 2);
        assert_eq!(table.get(fixed), StateSource::Manual);
        assert_eq!(table.get(external), StateSource::ExternalManual);
        assert_eq!(table.get(manual), StateSource::Manual);
        assert_eq!(table.count(StateSource::is_fixed), 0);
    }

    #[test]
    fn collapse_pending_only_touches_pending() {
        let mut table = SourceTable::new();
        let color = FieldIndex::color(ColorParam::HairDiffuse);
        table.set(color, StateSource::ManualPending);
        assert!(table.collapse_pending(color));
        assert_eq!(table.get(color), StateSource::Manual);
        assert!(!table.collapse_pending(color));
    }
}
