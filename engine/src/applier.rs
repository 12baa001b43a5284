//! Pushes model snapshot fields to live host objects.

use fields::{AppearanceMask, CrestSlot, EquipSlot, Field, FieldIndex, FieldMask, MetaIndex};
use log::debug;
use state::{Armor, ObjectHandle, Snapshot};

use crate::config::EngineConfig;
use crate::host::{Catalog, Host};

/// Stateless translation from model fields to host effects.
///
/// Each method picks the cheapest effect that makes the host display the model:
/// in-place writes wherever possible, a rebuild only for identity and face changes.
pub struct StateApplier<'a, C> {
    catalog: &'a C,
    config: &'a EngineConfig,
}

impl<'a, C: Catalog> StateApplier<'a, C> {
    #[must_use]
    pub const fn new(catalog: &'a C, config: &'a EngineConfig) -> Self {
        Self { catalog, config }
    }

    /// The armor the host should display for `slot`, or `None` while the head is hidden.
    #[must_use]
    pub fn displayed_armor(&self, model: &Snapshot, slot: EquipSlot) -> Option<Armor> {
        if slot == EquipSlot::Head && !model.meta().hat_visible {
            return None;
        }
        Some(self.restrict(model, slot, model.armor(slot)))
    }

    /// Applies restricted-gear substitution when enabled.
    #[must_use]
    pub fn restrict(&self, model: &Snapshot, slot: EquipSlot, armor: Armor) -> Armor {
        if self.config.restricted_gear_protection {
            let appearance = model.appearance();
            self.catalog
                .restrict(slot, armor, appearance.race(), appearance.gender())
        } else {
            armor
        }
    }

    pub fn apply_armor(
        &self,
        host: &mut impl Host,
        objects: &[ObjectHandle],
        model: &Snapshot,
        slot: EquipSlot,
    ) {
        let Some(armor) = self.displayed_armor(model, slot) else {
            debug!("head hidden, withholding {slot:?} write");
            return;
        };
        for &object in objects {
            host.write_armor(object, slot, armor);
        }
    }

    /// Reloads a weapon slot, and the off-hand with it when the main-hand
    /// family drags a dependent off-hand along.
    pub fn apply_weapon(
        &self,
        host: &mut impl Host,
        objects: &[ObjectHandle],
        model: &Snapshot,
        slot: EquipSlot,
    ) {
        let weapon = model.weapon(slot);
        let offhand = (slot == EquipSlot::MainHand)
            .then(|| self.catalog.offhand_family(model.item(slot).family))
            .flatten()
            .map(|_| model.weapon(EquipSlot::OffHand));
        for &object in objects {
            host.reload_weapon(object, slot, weapon, offhand);
        }
    }

    /// Applies changed appearance values.
    ///
    /// Identity and face changes need a rebuild. When exactly one of several
    /// live objects is a pose copy, only that copy is rebuilt and the others are
    /// updated in place.
    pub fn apply_appearance(
        &self,
        host: &mut impl Host,
        objects: &[ObjectHandle],
        model: &Snapshot,
        changed: AppearanceMask,
    ) {
        if changed.is_empty() {
            return;
        }
        let appearance = model.appearance();
        if !changed.requires_rebuild() {
            for &object in objects {
                host.write_appearance(object, appearance, changed);
            }
            return;
        }
        let poses = objects.iter().filter(|o| host.is_pose_copy(**o)).count();
        if objects.len() > 1 && poses == 1 {
            for &object in objects {
                if host.is_pose_copy(object) {
                    host.redraw(object);
                } else {
                    host.write_appearance(object, appearance, changed);
                }
            }
            debug!("rebuilt pose copy only, {} objects updated in place", objects.len() - 1);
            return;
        }
        for &object in objects {
            host.redraw(object);
        }
        debug!("rebuilt {} objects for appearance change", objects.len());
    }

    pub fn apply_meta(
        &self,
        host: &mut impl Host,
        objects: &[ObjectHandle],
        model: &Snapshot,
        flag: MetaIndex,
    ) {
        if flag == MetaIndex::ModelId {
            for &object in objects {
                host.redraw(object);
            }
            return;
        }
        let value = model.meta().get(flag);
        for &object in objects {
            host.set_meta_flag(object, flag, value);
        }
        if flag == MetaIndex::HatVisible && value {
            self.apply_armor(host, objects, model, EquipSlot::Head);
        }
    }

    pub fn apply_crest(
        &self,
        host: &mut impl Host,
        objects: &[ObjectHandle],
        model: &Snapshot,
        slot: CrestSlot,
    ) {
        let visible = model.crest(slot);
        for &object in objects {
            host.set_crest(object, slot, visible);
        }
    }

    /// Writes colors to every drawn object. Returns `false` if none was drawn yet.
    pub fn apply_colors(
        &self,
        host: &mut impl Host,
        objects: &[ObjectHandle],
        model: &Snapshot,
    ) -> bool {
        let mut applied = false;
        for &object in objects {
            if host.is_drawn(object) {
                host.write_colors(object, model.colors());
                applied = true;
            }
        }
        applied
    }

    /// Applies every field in `fields`, grouping work so each slot, the
    /// appearance and the colors are pushed at most once.
    ///
    /// Returns `false` if colors were requested but no object was drawn.
    pub fn apply_fields(
        &self,
        host: &mut impl Host,
        objects: &[ObjectHandle],
        model: &Snapshot,
        fields: FieldMask,
    ) -> bool {
        let wants_colors = !(fields & FieldMask::colors()).is_empty();
        if objects.is_empty() {
            return !wants_colors;
        }
        if fields.contains(FieldIndex::MODEL_ID) {
            // A rebuild picks up everything else.
            self.apply_meta(host, objects, model, MetaIndex::ModelId);
            return !wants_colors || self.apply_colors(host, objects, model);
        }
        let mut slots = [false; EquipSlot::COUNT];
        for field in fields.iter() {
            match field.field() {
                Field::Equip(slot) | Field::Stain(slot) => slots[slot.index()] = true,
                Field::Crest(slot) => self.apply_crest(host, objects, model, slot),
                Field::Meta(flag) => self.apply_meta(host, objects, model, flag),
                Field::Appearance(_) | Field::Color(_) => {}
            }
        }
        for slot in EquipSlot::ALL.into_iter().filter(|slot| slots[slot.index()]) {
            if slot.is_weapon() {
                self.apply_weapon(host, objects, model, slot);
            } else {
                self.apply_armor(host, objects, model, slot);
            }
        }
        self.apply_appearance(host, objects, model, fields.appearance_mask());
        !wants_colors || self.apply_colors(host, objects, model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use state::{
        AppearanceRules, EquipItem, ItemId, StainId, StandardRules, Weapon, WeaponFamily,
        GENDER_FEMALE,
    };

    struct NoHats;

    impl Catalog for NoHats {
        fn resolve_armor(&self, _slot: EquipSlot, _armor: Armor) -> EquipItem {
            EquipItem::NOTHING
        }

        fn resolve_weapon(&self, _slot: EquipSlot, _weapon: Weapon, _main: WeaponFamily) -> EquipItem {
            EquipItem::NOTHING
        }

        fn offhand_family(&self, _main: WeaponFamily) -> Option<WeaponFamily> {
            None
        }

        fn defaults(&self) -> Snapshot {
            Snapshot::new()
        }

        fn rules(&self) -> &dyn AppearanceRules {
            &StandardRules
        }

        fn restrict(&self, slot: EquipSlot, armor: Armor, _race: u8, gender: u8) -> Armor {
            if slot == EquipSlot::Head && gender == GENDER_FEMALE {
                Armor::EMPTY
            } else {
                armor
            }
        }
    }

    fn model_with_hat() -> Snapshot {
        let mut model = Snapshot::new();
        model.set_item(
            EquipSlot::Head,
            EquipItem {
                id: ItemId(5),
                primary: 5,
                variant: 1,
                ..EquipItem::NOTHING
            },
        );
        model.set_stain(EquipSlot::Head, StainId(2));
        model
    }

    #[test]
    fn hidden_head_is_withheld() {
        let config = EngineConfig::default();
        let applier = StateApplier::new(&NoHats, &config);
        let mut model = model_with_hat();
        assert_eq!(
            applier.displayed_armor(&model, EquipSlot::Head),
            Some(Armor::new(5, 1, StainId(2)))
        );
        model.set_meta(MetaIndex::HatVisible, false);
        assert_eq!(applier.displayed_armor(&model, EquipSlot::Head), None);
    }

    #[test]
    fn restriction_follows_config() {
        let mut model = model_with_hat();
        let mut appearance = *model.appearance();
        appearance.set(fields::AppearanceIndex::Gender, GENDER_FEMALE);
        model.set_appearance(appearance);

        let config = EngineConfig::default();
        let applier = StateApplier::new(&NoHats, &config);
        assert_eq!(applier.displayed_armor(&model, EquipSlot::Head), Some(Armor::EMPTY));

        let config = EngineConfig {
            restricted_gear_protection: false,
            ..EngineConfig::default()
        };
        let applier = StateApplier::new(&NoHats, &config);
        assert_eq!(
            applier.displayed_armor(&model, EquipSlot::Head),
            Some(Armor::new(5, 1, StainId(2)))
        );
    }
}
