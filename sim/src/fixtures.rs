//! Sample builders.

use engine::HostSample;
use fields::{ColorParam, CrestSlot, EquipSlot};
use state::{Appearance, Armor, ColorValue, MetaFlags, ModelId, StainId, Weapon};

#[must_use]
pub const fn armor(set: u16, stain: u8) -> Armor {
    Armor::new(set, 1, StainId(stain))
}

/// A weapon of `family` with a per-family model number.
#[must_use]
pub const fn weapon(family: u16, model: u16, stain: u8) -> Weapon {
    Weapon::new(family * 100 + 1, model, 1, StainId(stain))
}

/// A dressed default humanoid wielding a family 2 weapon.
#[must_use]
pub fn human_sample() -> HostSample {
    let mut gear = [Armor::EMPTY; EquipSlot::ARMOR.len()];
    gear[EquipSlot::Head.index()] = armor(5, 2);
    gear[EquipSlot::Body.index()] = armor(10, 0);
    gear[EquipSlot::Hands.index()] = armor(11, 0);
    gear[EquipSlot::Legs.index()] = armor(12, 0);
    gear[EquipSlot::Feet.index()] = armor(13, 0);
    HostSample {
        armor: gear,
        weapons: [weapon(2, 1, 0), Weapon::EMPTY],
        appearance: Appearance::DEFAULT,
        model_id: ModelId::HUMAN,
        meta: MetaFlags::DEFAULT,
        crests: [false; CrestSlot::COUNT],
        colors: [ColorValue::ZERO; ColorParam::COUNT],
    }
}
