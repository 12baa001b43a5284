//! Creation passes.

use engine::{Catalog, Created, HostSample, StateListener, StateManager};
use fields::{CrestSlot, EquipSlot, MetaIndex};
use log::debug;
use state::ObjectHandle;

use crate::host::SimHost;

/// Runs one creation pass for `object`.
///
/// Every value in `proposed` goes through the listener in display-pipeline
/// order: identity, appearance, armor, weapons, flags, crests. What the listener
/// resolves becomes what the object shows, and the pass ends with
/// [`StateListener::on_created`].
pub fn display<C: Catalog>(
    manager: &mut StateManager<C>,
    listener: &mut StateListener,
    host: &mut SimHost,
    object: ObjectHandle,
    proposed: &HostSample,
) -> Option<Created> {
    let mut shown = proposed.clone();
    shown.model_id = listener
        .on_creating(manager, host, object, proposed.model_id)
        .resolve(proposed.model_id);
    shown.appearance = listener
        .on_appearance(manager, host, object, &proposed.appearance)
        .resolve(proposed.appearance);
    for slot in EquipSlot::ARMOR {
        let armor = proposed.armor[slot.index()];
        shown.armor[slot.index()] = listener
            .on_equip(manager, host, object, slot, armor)
            .resolve(armor);
    }
    for (i, slot) in EquipSlot::WEAPONS.into_iter().enumerate() {
        let weapon = proposed.weapons[i];
        shown.weapons[i] = listener
            .on_weapon(manager, host, object, slot, weapon)
            .resolve(weapon);
    }
    for flag in MetaIndex::FLAGS {
        let value = proposed.meta.get(flag);
        shown.meta.set(
            flag,
            listener.on_meta(manager, host, object, flag, value).resolve(value),
        );
    }
    for slot in CrestSlot::ALL {
        let visible = proposed.crests[slot.index()];
        shown.crests[slot.index()] = listener
            .on_crest(manager, host, object, slot, visible)
            .resolve(visible);
    }
    if shown != *proposed {
        debug!("pass for {object:?} rewrote proposed values");
    }
    let o = host.object_mut(object)?;
    o.shown = shown;
    o.drawn = true;
    listener.on_created(manager, host, object)
}
