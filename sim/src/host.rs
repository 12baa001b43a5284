//! In-memory host.

use std::collections::{BTreeMap, BTreeSet};

use engine::{Host, HostSample};
use fields::{AppearanceMask, ColorParam, CrestSlot, EquipSlot, MetaIndex};
use log::trace;
use state::{ActorId, Appearance, Armor, ColorValue, ObjectHandle, Weapon};

/// A host effect, as recorded by [`SimHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Armor {
        object: ObjectHandle,
        slot: EquipSlot,
        armor: Armor,
    },
    Appearance {
        object: ObjectHandle,
        changed: AppearanceMask,
    },
    Redraw {
        object: ObjectHandle,
    },
    Weapon {
        object: ObjectHandle,
        slot: EquipSlot,
        weapon: Weapon,
        offhand: Option<Weapon>,
    },
    Meta {
        object: ObjectHandle,
        flag: MetaIndex,
        value: bool,
    },
    Crest {
        object: ObjectHandle,
        slot: CrestSlot,
        visible: bool,
    },
    Colors {
        object: ObjectHandle,
    },
}

impl Effect {
    #[must_use]
    pub const fn object(&self) -> ObjectHandle {
        match self {
            Self::Armor { object, .. }
            | Self::Appearance { object, .. }
            | Self::Redraw { object }
            | Self::Weapon { object, .. }
            | Self::Meta { object, .. }
            | Self::Crest { object, .. }
            | Self::Colors { object } => *object,
        }
    }
}

/// One live object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimObject {
    pub actor: ActorId,
    /// The host's own record of the object, as returned by [`Host::sample`].
    pub record: HostSample,
    /// What is currently on screen.
    pub shown: HostSample,
    pub transformed: bool,
    pub pose_copy: bool,
    pub player_npc: bool,
    pub drawn: bool,
}

/// A host whose objects live in memory and whose effects are logged.
#[derive(Debug, Clone, Default)]
pub struct SimHost {
    objects: BTreeMap<ObjectHandle, SimObject>,
    windows: BTreeSet<ActorId>,
    effects: Vec<Effect>,
    next_handle: u32,
}

impl SimHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a drawn object displaying `actor`.
    pub fn spawn(&mut self, actor: ActorId, record: HostSample) -> ObjectHandle {
        self.insert(actor, record, false)
    }

    /// Adds a pose copy of `actor`.
    pub fn spawn_pose_copy(&mut self, actor: ActorId, record: HostSample) -> ObjectHandle {
        self.insert(actor, record, true)
    }

    fn insert(&mut self, actor: ActorId, record: HostSample, pose_copy: bool) -> ObjectHandle {
        self.next_handle += 1;
        let handle = ObjectHandle::new(self.next_handle);
        self.objects.insert(
            handle,
            SimObject {
                actor,
                shown: record.clone(),
                record,
                transformed: false,
                pose_copy,
                player_npc: false,
                drawn: true,
            },
        );
        handle
    }

    pub fn despawn(&mut self, object: ObjectHandle) -> Option<SimObject> {
        self.objects.remove(&object)
    }

    #[must_use]
    pub fn object(&self, object: ObjectHandle) -> Option<&SimObject> {
        self.objects.get(&object)
    }

    pub fn object_mut(&mut self, object: ObjectHandle) -> Option<&mut SimObject> {
        self.objects.get_mut(&object)
    }

    /// What `object` currently shows.
    #[must_use]
    pub fn shown(&self, object: ObjectHandle) -> Option<&HostSample> {
        self.objects.get(&object).map(|o| &o.shown)
    }

    pub fn set_transformed(&mut self, object: ObjectHandle, transformed: bool) {
        if let Some(o) = self.objects.get_mut(&object) {
            o.transformed = transformed;
        }
    }

    pub fn set_player_npc(&mut self, object: ObjectHandle, player_npc: bool) {
        if let Some(o) = self.objects.get_mut(&object) {
            o.player_npc = player_npc;
        }
    }

    pub fn set_drawn(&mut self, object: ObjectHandle, drawn: bool) {
        if let Some(o) = self.objects.get_mut(&object) {
            o.drawn = drawn;
        }
    }

    pub fn open_window(&mut self, actor: ActorId) {
        self.windows.insert(actor);
    }

    pub fn close_window(&mut self, actor: ActorId) -> bool {
        self.windows.remove(&actor)
    }

    #[must_use]
    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Number of rebuilds requested for `object`.
    #[must_use]
    pub fn redraws(&self, object: ObjectHandle) -> usize {
        self.effects
            .iter()
            .filter(|effect| **effect == Effect::Redraw { object })
            .count()
    }

    fn record(&mut self, effect: Effect) {
        trace!("host effect {effect:?}");
        self.effects.push(effect);
    }

    fn shown_mut(&mut self, object: ObjectHandle) -> Option<&mut HostSample> {
        self.objects.get_mut(&object).map(|o| &mut o.shown)
    }
}

impl Host for SimHost {
    fn actor_of(&self, object: ObjectHandle) -> Option<ActorId> {
        self.objects.get(&object).map(|o| o.actor)
    }

    fn objects(&self, actor: ActorId) -> Vec<ObjectHandle> {
        self.objects
            .iter()
            .filter(|(_, o)| o.actor == actor)
            .map(|(handle, _)| *handle)
            .collect()
    }

    fn sample(&self, object: ObjectHandle) -> Option<HostSample> {
        self.objects.get(&object).map(|o| o.record.clone())
    }

    fn is_transformed(&self, object: ObjectHandle) -> bool {
        self.objects.get(&object).is_some_and(|o| o.transformed)
    }

    fn is_pose_copy(&self, object: ObjectHandle) -> bool {
        self.objects.get(&object).is_some_and(|o| o.pose_copy)
    }

    fn is_player_npc(&self, object: ObjectHandle) -> bool {
        self.objects.get(&object).is_some_and(|o| o.player_npc)
    }

    fn in_free_transform_window(&self, actor: ActorId) -> bool {
        self.windows.contains(&actor)
    }

    fn is_drawn(&self, object: ObjectHandle) -> bool {
        self.objects.get(&object).is_some_and(|o| o.drawn)
    }

    fn write_armor(&mut self, object: ObjectHandle, slot: EquipSlot, armor: Armor) {
        if let Some(shown) = self.shown_mut(object) {
            if let Some(cell) = shown.armor.get_mut(slot.index()) {
                *cell = armor;
            }
        }
        self.record(Effect::Armor {
            object,
            slot,
            armor,
        });
    }

    fn write_appearance(
        &mut self,
        object: ObjectHandle,
        appearance: &Appearance,
        changed: AppearanceMask,
    ) {
        if let Some(shown) = self.shown_mut(object) {
            shown.appearance.copy_from(appearance, changed);
        }
        self.record(Effect::Appearance { object, changed });
    }

    fn redraw(&mut self, object: ObjectHandle) {
        self.record(Effect::Redraw { object });
    }

    fn reload_weapon(
        &mut self,
        object: ObjectHandle,
        slot: EquipSlot,
        weapon: Weapon,
        offhand: Option<Weapon>,
    ) {
        if let Some(shown) = self.shown_mut(object) {
            match slot {
                EquipSlot::MainHand => shown.weapons[0] = weapon,
                EquipSlot::OffHand => shown.weapons[1] = weapon,
                _ => {}
            }
            if let Some(off) = offhand {
                shown.weapons[1] = off;
            }
        }
        self.record(Effect::Weapon {
            object,
            slot,
            weapon,
            offhand,
        });
    }

    fn set_meta_flag(&mut self, object: ObjectHandle, flag: MetaIndex, value: bool) {
        if let Some(shown) = self.shown_mut(object) {
            shown.meta.set(flag, value);
        }
        self.record(Effect::Meta {
            object,
            flag,
            value,
        });
    }

    fn set_crest(&mut self, object: ObjectHandle, slot: CrestSlot, visible: bool) {
        if let Some(shown) = self.shown_mut(object) {
            shown.crests[slot.index()] = visible;
        }
        self.record(Effect::Crest {
            object,
            slot,
            visible,
        });
    }

    fn write_colors(&mut self, object: ObjectHandle, colors: &[ColorValue; ColorParam::COUNT]) {
        if let Some(shown) = self.shown_mut(object) {
            shown.colors = *colors;
        }
        self.record(Effect::Colors { object });
    }
}
