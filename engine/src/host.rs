//! The host and catalog adapters the engine is driven by.

use fields::{AppearanceMask, ColorParam, CrestSlot, EquipSlot, MetaIndex};
use state::{
    ActorId, Appearance, AppearanceRules, Armor, ColorValue, EquipItem, MetaFlags, ModelId,
    ObjectHandle, Snapshot, Weapon, WeaponFamily,
};

/// Everything the host reports about one live object, independent of what the
/// display pipeline is about to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSample {
    pub armor: [Armor; EquipSlot::ARMOR.len()],
    pub weapons: [Weapon; EquipSlot::WEAPONS.len()],
    pub appearance: Appearance,
    pub model_id: ModelId,
    pub meta: MetaFlags,
    pub crests: [bool; CrestSlot::COUNT],
    pub colors: [ColorValue; ColorParam::COUNT],
}

impl HostSample {
    /// Raw armor for an armor slot, `None` for weapon slots.
    #[must_use]
    pub fn armor(&self, slot: EquipSlot) -> Option<Armor> {
        self.armor.get(slot.index()).copied()
    }

    /// Raw weapon for a weapon slot, `None` for armor slots.
    #[must_use]
    pub fn weapon(&self, slot: EquipSlot) -> Option<Weapon> {
        match slot {
            EquipSlot::MainHand => Some(self.weapons[0]),
            EquipSlot::OffHand => Some(self.weapons[1]),
            _ => None,
        }
    }

    /// Resolves the sample into a snapshot through `catalog`.
    #[must_use]
    pub fn to_snapshot(&self, catalog: &impl Catalog) -> Snapshot {
        let mut snapshot = Snapshot::new();
        for (slot, armor) in EquipSlot::ARMOR.into_iter().zip(self.armor) {
            snapshot.set_item(slot, catalog.resolve_armor(slot, armor));
            snapshot.set_stain(slot, armor.stain);
        }
        let [main, off] = self.weapons;
        let main_item = catalog.resolve_weapon(EquipSlot::MainHand, main, WeaponFamily::NONE);
        let off_item = catalog.resolve_weapon(EquipSlot::OffHand, off, main_item.family);
        snapshot.set_item(EquipSlot::MainHand, main_item);
        snapshot.set_stain(EquipSlot::MainHand, main.stain);
        snapshot.set_item(EquipSlot::OffHand, off_item);
        snapshot.set_stain(EquipSlot::OffHand, off.stain);
        for slot in CrestSlot::ALL {
            snapshot.set_crest(slot, self.crests[slot.index()]);
        }
        for flag in MetaIndex::FLAGS {
            snapshot.set_meta(flag, self.meta.get(flag));
        }
        for param in ColorParam::ALL {
            snapshot.set_color(param, self.colors[param.index()]);
        }
        snapshot.set_appearance(self.appearance);
        snapshot.set_model_id(self.model_id);
        snapshot
    }
}

/// The live host, as seen by the engine.
///
/// Query methods never mutate host state. Effect methods are only called by the
/// applier and are expected to take effect on the object's next update.
pub trait Host {
    /// The actor a live object currently displays.
    fn actor_of(&self, object: ObjectHandle) -> Option<ActorId>;

    /// Every live object displaying `actor`.
    fn objects(&self, actor: ActorId) -> Vec<ObjectHandle>;

    /// The host's own record of an object's composition.
    fn sample(&self, object: ObjectHandle) -> Option<HostSample>;

    /// Whether the host is mid-transformation for this object.
    fn is_transformed(&self, object: ObjectHandle) -> bool;

    /// Whether this object is a cutscene or pose copy of its actor.
    fn is_pose_copy(&self, object: ObjectHandle) -> bool;

    /// Whether this object is an NPC standing in for a player.
    fn is_player_npc(&self, object: ObjectHandle) -> bool;

    /// Whether `actor` is inside a sanctioned free transformation window.
    fn in_free_transform_window(&self, actor: ActorId) -> bool;

    /// Whether the object's model has finished drawing.
    fn is_drawn(&self, object: ObjectHandle) -> bool;

    fn write_armor(&mut self, object: ObjectHandle, slot: EquipSlot, armor: Armor);

    /// Updates appearance values in place, without a rebuild.
    fn write_appearance(
        &mut self,
        object: ObjectHandle,
        appearance: &Appearance,
        changed: AppearanceMask,
    );

    /// Requests a full model rebuild.
    fn redraw(&mut self, object: ObjectHandle);

    /// Reloads a weapon. `offhand` is set when both hands must change together.
    fn reload_weapon(
        &mut self,
        object: ObjectHandle,
        slot: EquipSlot,
        weapon: Weapon,
        offhand: Option<Weapon>,
    );

    fn set_meta_flag(&mut self, object: ObjectHandle, flag: MetaIndex, value: bool);

    fn set_crest(&mut self, object: ObjectHandle, slot: CrestSlot, visible: bool);

    fn write_colors(&mut self, object: ObjectHandle, colors: &[ColorValue; ColorParam::COUNT]);
}

/// Resolves raw host gear into catalog items.
///
/// Implementations must be pure: the same input always yields the same item.
pub trait Catalog {
    fn resolve_armor(&self, slot: EquipSlot, armor: Armor) -> EquipItem;

    /// Resolves a weapon. Off-hands resolve against the main-hand family.
    fn resolve_weapon(&self, slot: EquipSlot, weapon: Weapon, main: WeaponFamily) -> EquipItem;

    /// The off-hand family that has to change together with `main`, if any.
    fn offhand_family(&self, main: WeaponFamily) -> Option<WeaponFamily>;

    /// Canonical snapshot used when an actor becomes non-humanoid.
    fn defaults(&self) -> Snapshot;

    /// Appearance legality rules.
    fn rules(&self) -> &dyn AppearanceRules;

    /// Substitutes gear the given race and gender may not display.
    fn restrict(&self, _slot: EquipSlot, armor: Armor, _race: u8, _gender: u8) -> Armor {
        armor
    }
}
