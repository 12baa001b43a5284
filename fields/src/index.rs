//! The static flat field index.
//!
//! Every trackable field owns one slot in `[0, FieldIndex::COUNT)`. The ranges are
//! fixed at compile time so per-field tables can be plain arrays.

use std::fmt;

use crate::error::FieldError;
use crate::{AppearanceIndex, ColorParam, CrestSlot, EquipSlot, MetaIndex};

/// A flat index addressing one trackable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "u8", into = "u8")
)]
pub struct FieldIndex(u8);

impl FieldIndex {
    pub const EQUIP_START: u8 = 0;
    pub const STAIN_START: u8 = Self::EQUIP_START + EquipSlot::COUNT as u8;
    pub const APPEARANCE_START: u8 = Self::STAIN_START + EquipSlot::COUNT as u8;
    pub const CREST_START: u8 = Self::APPEARANCE_START + AppearanceIndex::COUNT as u8;
    pub const META_START: u8 = Self::CREST_START + CrestSlot::COUNT as u8;
    pub const COLOR_START: u8 = Self::META_START + MetaIndex::COUNT as u8;

    /// Total number of field slots.
    pub const COUNT: usize = Self::COLOR_START as usize + ColorParam::COUNT;

    /// The model identity field.
    pub const MODEL_ID: Self = Self::meta(MetaIndex::ModelId);

    /// Creates a field index from its raw value.
    #[must_use]
    pub const fn new(raw: u8) -> Option<Self> {
        if (raw as usize) < Self::COUNT {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Returns the raw index value.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Returns the index as a `usize` for table addressing.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0 as usize
    }

    /// Index of an equipment slot's item, or its stain when `stain` is set.
    #[must_use]
    pub const fn equipment(slot: EquipSlot, stain: bool) -> Self {
        if stain {
            Self::stain(slot)
        } else {
            Self::equip(slot)
        }
    }

    #[must_use]
    pub const fn equip(slot: EquipSlot) -> Self {
        Self(Self::EQUIP_START + slot as u8)
    }

    #[must_use]
    pub const fn stain(slot: EquipSlot) -> Self {
        Self(Self::STAIN_START + slot as u8)
    }

    #[must_use]
    pub const fn appearance(index: AppearanceIndex) -> Self {
        Self(Self::APPEARANCE_START + index as u8)
    }

    #[must_use]
    pub const fn crest(slot: CrestSlot) -> Self {
        Self(Self::CREST_START + slot as u8)
    }

    #[must_use]
    pub const fn meta(index: MetaIndex) -> Self {
        Self(Self::META_START + index as u8)
    }

    #[must_use]
    pub const fn color(param: ColorParam) -> Self {
        Self(Self::COLOR_START + param as u8)
    }

    /// Resolves this index back to the field it addresses.
    #[must_use]
    pub fn field(self) -> Field {
        let raw = self.0;
        let (field, offset) = if raw >= Self::COLOR_START {
            (FieldKind::Color, raw - Self::COLOR_START)
        } else if raw >= Self::META_START {
            (FieldKind::Meta, raw - Self::META_START)
        } else if raw >= Self::CREST_START {
            (FieldKind::Crest, raw - Self::CREST_START)
        } else if raw >= Self::APPEARANCE_START {
            (FieldKind::Appearance, raw - Self::APPEARANCE_START)
        } else if raw >= Self::STAIN_START {
            (FieldKind::Stain, raw - Self::STAIN_START)
        } else {
            (FieldKind::Equip, raw)
        };
        let offset = usize::from(offset);
        // Ranges are contiguous and construction is checked, so every lookup hits.
        match field {
            FieldKind::Equip => Field::Equip(EquipSlot::ALL[offset]),
            FieldKind::Stain => Field::Stain(EquipSlot::ALL[offset]),
            FieldKind::Appearance => Field::Appearance(AppearanceIndex::ALL[offset]),
            FieldKind::Crest => Field::Crest(CrestSlot::ALL[offset]),
            FieldKind::Meta => Field::Meta(MetaIndex::ALL[offset]),
            FieldKind::Color => Field::Color(ColorParam::ALL[offset]),
        }
    }

    /// Returns the kind of field this index addresses.
    #[must_use]
    pub fn kind(self) -> FieldKind {
        self.field().kind()
    }

    /// Iterates all field indices in order.
    pub fn all() -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        (0..Self::COUNT as u8).map(Self)
    }
}

impl TryFrom<u8> for FieldIndex {
    type Error = FieldError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(FieldError::IndexOutOfRange {
            raw,
            count: Self::COUNT,
        })
    }
}

impl From<FieldIndex> for u8 {
    fn from(index: FieldIndex) -> Self {
        index.0
    }
}

impl From<Field> for FieldIndex {
    fn from(field: Field) -> Self {
        field.index()
    }
}

impl fmt::Display for FieldIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.field())
    }
}

/// Coarse field category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Equip,
    Stain,
    Appearance,
    Crest,
    Meta,
    Color,
}

/// A typed view of one field slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Field {
    Equip(EquipSlot),
    Stain(EquipSlot),
    Appearance(AppearanceIndex),
    Crest(CrestSlot),
    Meta(MetaIndex),
    Color(ColorParam),
}

impl Field {
    /// Returns the flat index of this field.
    #[must_use]
    pub const fn index(self) -> FieldIndex {
        match self {
            Self::Equip(slot) => FieldIndex::equip(slot),
            Self::Stain(slot) => FieldIndex::stain(slot),
            Self::Appearance(index) => FieldIndex::appearance(index),
            Self::Crest(slot) => FieldIndex::crest(slot),
            Self::Meta(index) => FieldIndex::meta(index),
            Self::Color(param) => FieldIndex::color(param),
        }
    }

    #[must_use]
    pub const fn kind(self) -> FieldKind {
        match self {
            Self::Equip(_) => FieldKind::Equip,
            Self::Stain(_) => FieldKind::Stain,
            Self::Appearance(_) => FieldKind::Appearance,
            Self::Crest(_) => FieldKind::Crest,
            Self::Meta(_) => FieldKind::Meta,
            Self::Color(_) => FieldKind::Color,
        }
    }

    /// Parses a field from its display name, e.g. `equip:head` or `appearance:hair-color`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let (kind, rest) = name.split_once(':')?;
        match kind {
            "equip" => EquipSlot::ALL
                .into_iter()
                .find(|slot| slot.name() == rest)
                .map(Self::Equip),
            "stain" => EquipSlot::ALL
                .into_iter()
                .find(|slot| slot.name() == rest)
                .map(Self::Stain),
            "appearance" => AppearanceIndex::ALL
                .into_iter()
                .find(|index| index.name() == rest)
                .map(Self::Appearance),
            "crest" => CrestSlot::ALL
                .into_iter()
                .find(|slot| slot.name() == rest)
                .map(Self::Crest),
            "meta" => MetaIndex::ALL
                .into_iter()
                .find(|index| index.name() == rest)
                .map(Self::Meta),
            "color" => ColorParam::ALL
                .into_iter()
                .find(|param| param.name() == rest)
                .map(Self::Color),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equip(slot) => write!(f, "equip:{}", slot.name()),
            Self::Stain(slot) => write!(f, "stain:{}", slot.name()),
            Self::Appearance(index) => write!(f, "appearance:{}", index.name()),
            Self::Crest(slot) => write!(f, "crest:{}", slot.name()),
            Self::Meta(index) => write!(f, "meta:{}", index.name()),
            Self::Color(param) => write!(f, "color:{}", param.name()),
        }
    }
}
