//! Full actor snapshots.

use fields::{ColorParam, CrestSlot, EquipSlot, Field, FieldIndex, FieldMask, MetaIndex};

use crate::appearance::Appearance;
use crate::error::{StateError, StateResult};
use crate::types::{Armor, ColorValue, EquipItem, ModelId, StainId, Weapon};

/// Boolean display flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetaFlags {
    pub hat_visible: bool,
    pub weapon_visible: bool,
    pub visor_toggled: bool,
    pub wet: bool,
}

impl MetaFlags {
    /// Canonical default visibility.
    pub const DEFAULT: Self = Self {
        hat_visible: true,
        weapon_visible: true,
        visor_toggled: false,
        wet: false,
    };

    /// Returns a flag. The model identity is not a flag and reads as `false`.
    #[must_use]
    pub const fn get(&self, flag: MetaIndex) -> bool {
        match flag {
            MetaIndex::ModelId => false,
            MetaIndex::HatVisible => self.hat_visible,
            MetaIndex::WeaponVisible => self.weapon_visible,
            MetaIndex::VisorToggled => self.visor_toggled,
            MetaIndex::Wetness => self.wet,
        }
    }

    /// Sets a flag and returns the previous value. Ignores the model identity.
    pub fn set(&mut self, flag: MetaIndex, value: bool) -> bool {
        let slot = match flag {
            MetaIndex::ModelId => return false,
            MetaIndex::HatVisible => &mut self.hat_visible,
            MetaIndex::WeaponVisible => &mut self.weapon_visible,
            MetaIndex::VisorToggled => &mut self.visor_toggled,
            MetaIndex::Wetness => &mut self.wet,
        };
        std::mem::replace(slot, value)
    }
}

impl Default for MetaFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The value stored in one field slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldValue {
    Item(EquipItem),
    Stain(StainId),
    Appearance(u8),
    Crest(bool),
    Flag(bool),
    Model(ModelId),
    Color(ColorValue),
}

impl FieldValue {
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Item(_) => "item",
            Self::Stain(_) => "stain",
            Self::Appearance(_) => "appearance",
            Self::Crest(_) => "crest",
            Self::Flag(_) => "flag",
            Self::Model(_) => "model",
            Self::Color(_) => "color",
        }
    }
}

/// An actor's full visual composition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    equipment: [EquipItem; EquipSlot::COUNT],
    stains: [StainId; EquipSlot::COUNT],
    crests: [bool; CrestSlot::COUNT],
    appearance: Appearance,
    meta: MetaFlags,
    model_id: ModelId,
    colors: [ColorValue; ColorParam::COUNT],
}

impl Snapshot {
    /// A humanoid snapshot with nothing equipped and default appearance.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            equipment: [EquipItem::NOTHING; EquipSlot::COUNT],
            stains: [StainId(0); EquipSlot::COUNT],
            crests: [false; CrestSlot::COUNT],
            appearance: Appearance::DEFAULT,
            meta: MetaFlags::DEFAULT,
            model_id: ModelId::HUMAN,
            colors: [ColorValue::ZERO; ColorParam::COUNT],
        }
    }

    /// A humanoid snapshot wearing the given canonical equipment.
    #[must_use]
    pub fn canonical(equipment: [EquipItem; EquipSlot::COUNT]) -> Self {
        Self {
            equipment,
            ..Self::new()
        }
    }

    #[must_use]
    pub const fn item(&self, slot: EquipSlot) -> &EquipItem {
        &self.equipment[slot as usize]
    }

    pub fn set_item(&mut self, slot: EquipSlot, item: EquipItem) -> EquipItem {
        std::mem::replace(&mut self.equipment[slot.index()], item)
    }

    #[must_use]
    pub const fn stain(&self, slot: EquipSlot) -> StainId {
        self.stains[slot as usize]
    }

    pub fn set_stain(&mut self, slot: EquipSlot, stain: StainId) -> StainId {
        std::mem::replace(&mut self.stains[slot.index()], stain)
    }

    #[must_use]
    pub const fn crest(&self, slot: CrestSlot) -> bool {
        self.crests[slot as usize]
    }

    pub fn set_crest(&mut self, slot: CrestSlot, visible: bool) -> bool {
        std::mem::replace(&mut self.crests[slot.index()], visible)
    }

    #[must_use]
    pub const fn appearance(&self) -> &Appearance {
        &self.appearance
    }

    pub fn set_appearance(&mut self, appearance: Appearance) -> Appearance {
        std::mem::replace(&mut self.appearance, appearance)
    }

    #[must_use]
    pub const fn meta(&self) -> &MetaFlags {
        &self.meta
    }

    pub fn set_meta(&mut self, flag: MetaIndex, value: bool) -> bool {
        self.meta.set(flag, value)
    }

    #[must_use]
    pub const fn model_id(&self) -> ModelId {
        self.model_id
    }

    pub fn set_model_id(&mut self, model_id: ModelId) -> ModelId {
        std::mem::replace(&mut self.model_id, model_id)
    }

    #[must_use]
    pub const fn is_human(&self) -> bool {
        self.model_id.is_human()
    }

    #[must_use]
    pub const fn color(&self, param: ColorParam) -> ColorValue {
        self.colors[param as usize]
    }

    #[must_use]
    pub const fn colors(&self) -> &[ColorValue; ColorParam::COUNT] {
        &self.colors
    }

    pub fn set_color(&mut self, param: ColorParam, value: ColorValue) -> ColorValue {
        std::mem::replace(&mut self.colors[param.index()], value)
    }

    /// Raw armor for an armor slot.
    #[must_use]
    pub const fn armor(&self, slot: EquipSlot) -> Armor {
        self.item(slot).armor(self.stain(slot))
    }

    /// Raw armor as displayed, honoring the hat visibility flag.
    #[must_use]
    pub const fn visible_armor(&self, slot: EquipSlot) -> Armor {
        if matches!(slot, EquipSlot::Head) && !self.meta.hat_visible {
            Armor::EMPTY
        } else {
            self.armor(slot)
        }
    }

    /// Raw weapon data for a weapon slot.
    #[must_use]
    pub const fn weapon(&self, slot: EquipSlot) -> Weapon {
        self.item(slot).weapon(self.stain(slot))
    }

    /// Reads a field as a [`FieldValue`].
    #[must_use]
    pub fn value(&self, field: FieldIndex) -> FieldValue {
        match field.field() {
            Field::Equip(slot) => FieldValue::Item(*self.item(slot)),
            Field::Stain(slot) => FieldValue::Stain(self.stain(slot)),
            Field::Appearance(index) => FieldValue::Appearance(self.appearance.get(index)),
            Field::Crest(slot) => FieldValue::Crest(self.crest(slot)),
            Field::Meta(MetaIndex::ModelId) => FieldValue::Model(self.model_id),
            Field::Meta(flag) => FieldValue::Flag(self.meta.get(flag)),
            Field::Color(param) => FieldValue::Color(self.color(param)),
        }
    }

    /// Writes a field, returning the previous value.
    ///
    /// Fails without writing if `value` is the wrong kind for `field`.
    pub fn set_value(&mut self, field: FieldIndex, value: FieldValue) -> StateResult<FieldValue> {
        let old = self.value(field);
        match (field.field(), value) {
            (Field::Equip(slot), FieldValue::Item(item)) => {
                self.set_item(slot, item);
            }
            (Field::Stain(slot), FieldValue::Stain(stain)) => {
                self.set_stain(slot, stain);
            }
            (Field::Appearance(index), FieldValue::Appearance(raw)) => {
                self.appearance.set(index, raw);
            }
            (Field::Crest(slot), FieldValue::Crest(visible)) => {
                self.set_crest(slot, visible);
            }
            (Field::Meta(MetaIndex::ModelId), FieldValue::Model(model_id)) => {
                self.model_id = model_id;
            }
            (Field::Meta(flag), FieldValue::Flag(on)) if flag.is_flag() => {
                self.meta.set(flag, on);
            }
            (Field::Color(param), FieldValue::Color(color)) => {
                self.set_color(param, color);
            }
            _ => {
                return Err(StateError::ValueKindMismatch {
                    field,
                    found: value.kind_name(),
                })
            }
        }
        Ok(old)
    }

    /// Copies one field from `other`. Returns `true` if the value changed.
    pub fn copy_field(&mut self, other: &Self, field: FieldIndex) -> bool {
        if self.same(other, field) {
            return false;
        }
        match field.field() {
            Field::Equip(slot) => {
                self.set_item(slot, *other.item(slot));
            }
            Field::Stain(slot) => {
                self.set_stain(slot, other.stain(slot));
            }
            Field::Appearance(index) => {
                self.appearance.set(index, other.appearance.get(index));
            }
            Field::Crest(slot) => {
                self.set_crest(slot, other.crest(slot));
            }
            Field::Meta(MetaIndex::ModelId) => {
                self.model_id = other.model_id;
            }
            Field::Meta(flag) => {
                self.meta.set(flag, other.meta.get(flag));
            }
            Field::Color(param) => {
                self.set_color(param, other.color(param));
            }
        }
        true
    }

    /// Returns `true` if both snapshots hold the same value for `field`.
    #[must_use]
    pub fn same(&self, other: &Self, field: FieldIndex) -> bool {
        match field.field() {
            Field::Equip(slot) => self.item(slot) == other.item(slot),
            Field::Stain(slot) => self.stain(slot) == other.stain(slot),
            Field::Appearance(index) => self.appearance.get(index) == other.appearance.get(index),
            Field::Crest(slot) => self.crest(slot) == other.crest(slot),
            Field::Meta(MetaIndex::ModelId) => self.model_id == other.model_id,
            Field::Meta(flag) => self.meta.get(flag) == other.meta.get(flag),
            Field::Color(param) => self.color(param) == other.color(param),
        }
    }

    /// Returns every field whose value differs from `other`.
    #[must_use]
    pub fn diff(&self, other: &Self) -> FieldMask {
        FieldIndex::all()
            .filter(|field| !self.same(other, *field))
            .collect()
    }

    /// Copies the appearance, equipment and meta flags of `other`.
    ///
    /// This is the part of a snapshot that depends on the model identity.
    pub(crate) fn copy_body(&mut self, other: &Self) {
        self.appearance = other.appearance;
        self.equipment = other.equipment;
        self.stains = other.stains;
        self.meta = other.meta;
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Fields rewritten when an actor changes between humanoid and non-humanoid.
#[must_use]
pub fn body_fields() -> FieldMask {
    FieldMask::appearance() | FieldMask::equipment() | FieldMask::meta()
}
