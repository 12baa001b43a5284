//! Bitmasks over field indices and appearance indices.

use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

use crate::{AppearanceIndex, ColorParam, CrestSlot, EquipSlot, FieldIndex, FieldKind, MetaIndex};

/// A set of field indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldMask(u128);

impl FieldMask {
    pub const EMPTY: Self = Self(0);
    pub const ALL: Self = Self(u128::MAX >> (128 - FieldIndex::COUNT));

    #[must_use]
    pub const fn single(field: FieldIndex) -> Self {
        Self(1 << field.raw())
    }

    #[must_use]
    pub const fn contains(self, field: FieldIndex) -> bool {
        self.0 & (1 << field.raw()) != 0
    }

    pub fn insert(&mut self, field: FieldIndex) {
        self.0 |= 1 << field.raw();
    }

    pub fn remove(&mut self, field: FieldIndex) {
        self.0 &= !(1 << field.raw());
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[must_use]
    pub const fn raw(self) -> u128 {
        self.0
    }

    /// Every field of the given kind.
    #[must_use]
    pub fn of_kind(kind: FieldKind) -> Self {
        FieldIndex::all()
            .filter(|field| field.kind() == kind)
            .collect()
    }

    /// All equipment items and stains.
    #[must_use]
    pub fn equipment() -> Self {
        Self::of_kind(FieldKind::Equip) | Self::of_kind(FieldKind::Stain)
    }

    /// All appearance values.
    #[must_use]
    pub fn appearance() -> Self {
        Self::of_kind(FieldKind::Appearance)
    }

    /// All meta fields, including the model identity.
    #[must_use]
    pub fn meta() -> Self {
        Self::of_kind(FieldKind::Meta)
    }

    /// All crest visibility fields.
    #[must_use]
    pub fn crests() -> Self {
        Self::of_kind(FieldKind::Crest)
    }

    /// All advanced color parameters.
    #[must_use]
    pub fn colors() -> Self {
        Self::of_kind(FieldKind::Color)
    }

    /// Projects the appearance part of this mask onto an [`AppearanceMask`].
    #[must_use]
    pub fn appearance_mask(self) -> AppearanceMask {
        AppearanceIndex::ALL
            .into_iter()
            .filter(|index| self.contains(FieldIndex::appearance(*index)))
            .collect()
    }

    /// Iterates contained fields in index order.
    pub fn iter(self) -> impl Iterator<Item = FieldIndex> {
        FieldIndex::all().filter(move |field| self.contains(*field))
    }
}

impl BitOr for FieldMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FieldMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for FieldMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for FieldMask {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0 & Self::ALL.0)
    }
}

impl FromIterator<FieldIndex> for FieldMask {
    fn from_iter<I: IntoIterator<Item = FieldIndex>>(iter: I) -> Self {
        let mut mask = Self::EMPTY;
        for field in iter {
            mask.insert(field);
        }
        mask
    }
}

impl From<AppearanceMask> for FieldMask {
    fn from(mask: AppearanceMask) -> Self {
        mask.iter().map(FieldIndex::appearance).collect()
    }
}

impl From<EquipSlot> for FieldMask {
    fn from(slot: EquipSlot) -> Self {
        Self::single(FieldIndex::equip(slot)) | Self::single(FieldIndex::stain(slot))
    }
}

impl From<CrestSlot> for FieldMask {
    fn from(slot: CrestSlot) -> Self {
        Self::single(FieldIndex::crest(slot))
    }
}

impl From<MetaIndex> for FieldMask {
    fn from(index: MetaIndex) -> Self {
        Self::single(FieldIndex::meta(index))
    }
}

impl From<ColorParam> for FieldMask {
    fn from(param: ColorParam) -> Self {
        Self::single(FieldIndex::color(param))
    }
}

/// A set of appearance indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AppearanceMask(u32);

impl AppearanceMask {
    pub const EMPTY: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX >> (32 - AppearanceIndex::COUNT));

    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw & Self::ALL.0)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn single(index: AppearanceIndex) -> Self {
        Self(1 << index as u32)
    }

    #[must_use]
    pub const fn contains(self, index: AppearanceIndex) -> bool {
        self.0 & (1 << index as u32) != 0
    }

    pub fn insert(&mut self, index: AppearanceIndex) {
        self.0 |= 1 << index as u32;
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns `true` if any contained index needs a full model rebuild.
    #[must_use]
    pub fn requires_rebuild(self) -> bool {
        self.iter().any(AppearanceIndex::requires_rebuild)
    }

    /// Returns `true` if any identity index is contained.
    #[must_use]
    pub fn touches_identity(self) -> bool {
        self.iter().any(AppearanceIndex::is_identity)
    }

    pub fn iter(self) -> impl Iterator<Item = AppearanceIndex> {
        AppearanceIndex::ALL
            .into_iter()
            .filter(move |index| self.contains(*index))
    }
}

impl BitOr for AppearanceMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AppearanceMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for AppearanceMask {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl FromIterator<AppearanceIndex> for AppearanceMask {
    fn from_iter<I: IntoIterator<Item = AppearanceIndex>>(iter: I) -> Self {
        let mut mask = Self::EMPTY;
        for index in iter {
            mask.insert(index);
        }
        mask
    }
}
