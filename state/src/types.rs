//! Core value types for tracked actors.

use std::fmt;

/// A stable actor identity.
///
/// Survives the host destroying and recreating the object that displays the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActorId(u64);

impl ActorId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for ActorId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// A live host object currently displaying an actor.
///
/// Handles change whenever the host recreates the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectHandle(u32);

impl ObjectHandle {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Opaque key guarding a locked actor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LockKey(u64);

impl LockKey {
    /// The key presented by callers that hold no lock.
    pub const NONE: Self = Self(0);

    #[must_use]
    pub const fn new(key: u64) -> Self {
        Self(key)
    }
}

/// A catalog item identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemId(pub u32);

/// A dye identifier. `0` means undyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StainId(pub u8);

/// The model identity of an actor. `0` is the default humanoid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelId(pub u32);

impl ModelId {
    pub const HUMAN: Self = Self(0);

    #[must_use]
    pub const fn is_human(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model#{}", self.0)
    }
}

/// Catalog weapon family. Armor and empty slots use [`WeaponFamily::NONE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeaponFamily(pub u16);

impl WeaponFamily {
    pub const NONE: Self = Self(0);
}

impl fmt::Display for WeaponFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "family#{}", self.0)
    }
}

/// An opaque advanced color parameter blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColorValue(pub [u8; 16]);

impl ColorValue {
    pub const ZERO: Self = Self([0; 16]);
}

/// Raw armor data as the host writes it into a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Armor {
    pub set: u16,
    pub variant: u8,
    pub stain: StainId,
}

impl Armor {
    /// Nothing equipped.
    pub const EMPTY: Self = Self {
        set: 0,
        variant: 0,
        stain: StainId(0),
    };

    #[must_use]
    pub const fn new(set: u16, variant: u8, stain: StainId) -> Self {
        Self {
            set,
            variant,
            stain,
        }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.set == 0 && self.variant == 0
    }
}

/// Raw weapon data as the host writes it into a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Weapon {
    pub skeleton: u16,
    pub weapon: u16,
    pub variant: u16,
    pub stain: StainId,
}

impl Weapon {
    pub const EMPTY: Self = Self {
        skeleton: 0,
        weapon: 0,
        variant: 0,
        stain: StainId(0),
    };

    #[must_use]
    pub const fn new(skeleton: u16, weapon: u16, variant: u16, stain: StainId) -> Self {
        Self {
            skeleton,
            weapon,
            variant,
            stain,
        }
    }
}

/// A resolved catalog item.
///
/// Items keep their model triple so converting back to raw host data needs no
/// catalog lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EquipItem {
    pub id: ItemId,
    pub primary: u16,
    pub secondary: u16,
    pub variant: u16,
    pub family: WeaponFamily,
}

impl EquipItem {
    /// The empty item.
    pub const NOTHING: Self = Self {
        id: ItemId(0),
        primary: 0,
        secondary: 0,
        variant: 0,
        family: WeaponFamily::NONE,
    };

    #[must_use]
    pub const fn is_nothing(&self) -> bool {
        self.id.0 == 0 && self.primary == 0
    }

    /// Raw armor for this item. Armor variants fit in a byte.
    #[must_use]
    pub const fn armor(&self, stain: StainId) -> Armor {
        Armor {
            set: self.primary,
            variant: self.variant as u8,
            stain,
        }
    }

    /// Raw weapon data for this item.
    #[must_use]
    pub const fn weapon(&self, stain: StainId) -> Weapon {
        Weapon {
            skeleton: self.primary,
            weapon: self.secondary,
            variant: self.variant,
            stain,
        }
    }
}
