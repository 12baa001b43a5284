//! Rule-based catalog.

use std::collections::BTreeSet;

use engine::Catalog;
use fields::EquipSlot;
use state::{
    AppearanceRules, Armor, EquipItem, ItemId, Snapshot, StandardRules, Weapon, WeaponFamily,
    GENDER_FEMALE,
};

/// Armor set shown in place of restricted gear.
pub const RESTRICTED_SUBSTITUTE: u16 = 9903;

/// A catalog where every raw value is its own item.
///
/// Weapon families are the skeleton divided by 100, so skeletons 201 and 250
/// share family 2.
#[derive(Debug, Clone, Default)]
pub struct SimCatalog {
    paired: BTreeSet<WeaponFamily>,
    restricted: BTreeSet<(EquipSlot, u16)>,
    defaults: Snapshot,
}

impl SimCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Main-hand weapons of `family` drag their off-hand along.
    #[must_use]
    pub fn with_paired(mut self, family: WeaponFamily) -> Self {
        self.paired.insert(family);
        self
    }

    /// Armor `set` in `slot` may not be displayed on female actors.
    #[must_use]
    pub fn with_restricted(mut self, slot: EquipSlot, set: u16) -> Self {
        self.restricted.insert((slot, set));
        self
    }

    /// Snapshot used when an actor becomes non-humanoid.
    #[must_use]
    pub fn with_defaults(mut self, defaults: Snapshot) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub const fn family(skeleton: u16) -> WeaponFamily {
        WeaponFamily(skeleton / 100)
    }
}

impl Catalog for SimCatalog {
    fn resolve_armor(&self, _slot: EquipSlot, armor: Armor) -> EquipItem {
        if armor.is_empty() {
            return EquipItem::NOTHING;
        }
        EquipItem {
            id: ItemId(u32::from(armor.set) * 1000 + u32::from(armor.variant)),
            primary: armor.set,
            secondary: 0,
            variant: u16::from(armor.variant),
            family: WeaponFamily::NONE,
        }
    }

    fn resolve_weapon(&self, _slot: EquipSlot, weapon: Weapon, _main: WeaponFamily) -> EquipItem {
        if weapon.skeleton == 0 && weapon.weapon == 0 {
            return EquipItem::NOTHING;
        }
        EquipItem {
            id: ItemId((u32::from(weapon.skeleton) << 16) | u32::from(weapon.weapon)),
            primary: weapon.skeleton,
            secondary: weapon.weapon,
            variant: weapon.variant,
            family: Self::family(weapon.skeleton),
        }
    }

    fn offhand_family(&self, main: WeaponFamily) -> Option<WeaponFamily> {
        self.paired.contains(&main).then_some(main)
    }

    fn defaults(&self) -> Snapshot {
        self.defaults.clone()
    }

    fn rules(&self) -> &dyn AppearanceRules {
        &StandardRules
    }

    fn restrict(&self, slot: EquipSlot, armor: Armor, _race: u8, gender: u8) -> Armor {
        if gender == GENDER_FEMALE && self.restricted.contains(&(slot, armor.set)) {
            Armor::new(RESTRICTED_SUBSTITUTE, 1, armor.stain)
        } else {
            armor
        }
    }
}
