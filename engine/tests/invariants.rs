//! Random interleavings of user edits and host callbacks.

use engine::{EngineConfig, Host, StateListener, StateManager};
use fields::{EquipSlot, FieldIndex, MetaIndex, StateSource};
use proptest::prelude::*;
use sim::{armor, display, human_sample, weapon, SimCatalog, SimHost};
use state::{ActorId, Armor, EditContext, LockKey, ModelId, ObjectHandle, StainId, Weapon};

#[derive(Debug, Clone)]
enum Op {
    Stain(usize, u8, StateSource),
    Meta(usize, bool, StateSource),
    Model(u32, StateSource),
    HostWears(usize, u16, u8),
    Disguise(usize, u16, u8),
    BlankHead,
    Transform(bool),
    JobChange(u16),
    Pass,
    Reset(usize),
    ResetAll,
    RemoveFixed,
}

fn source_strategy() -> impl Strategy<Value = StateSource> {
    prop_oneof![
        Just(StateSource::Game),
        Just(StateSource::Manual),
        Just(StateSource::Fixed),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let slots = EquipSlot::ARMOR.len();
    prop_oneof![
        (0..slots, 0u8..8, source_strategy()).prop_map(|(s, v, src)| Op::Stain(s, v, src)),
        (0..MetaIndex::FLAGS.len(), any::<bool>(), source_strategy())
            .prop_map(|(f, v, src)| Op::Meta(f, v, src)),
        (0u32..3, source_strategy()).prop_map(|(m, src)| Op::Model(m, src)),
        (0..slots, 0u16..6, 0u8..4).prop_map(|(s, set, st)| Op::HostWears(s, set, st)),
        (0..slots, 0u16..6, 0u8..4).prop_map(|(s, set, st)| Op::Disguise(s, set, st)),
        Just(Op::BlankHead),
        any::<bool>().prop_map(Op::Transform),
        (1u16..4).prop_map(Op::JobChange),
        Just(Op::Pass),
        (0..slots).prop_map(Op::Reset),
        Just(Op::ResetAll),
        Just(Op::RemoveFixed),
    ]
}

struct World {
    manager: StateManager<SimCatalog>,
    listener: StateListener,
    host: SimHost,
    actor: ActorId,
    object: ObjectHandle,
}

impl World {
    fn new() -> Self {
        let mut host = SimHost::new();
        let actor = ActorId::new(1);
        let object = host.spawn(actor, human_sample());
        let mut manager = StateManager::new(EngineConfig::for_testing(), SimCatalog::new());
        manager.get_or_create(&host, actor).unwrap();
        Self {
            manager,
            listener: StateListener::new(),
            host,
            actor,
            object,
        }
    }

    fn pass(&mut self) {
        let proposed = self.host.sample(self.object).unwrap();
        display(&mut self.manager, &mut self.listener, &mut self.host, self.object, &proposed);
    }

    fn run(&mut self, op: &Op) {
        if matches!(op, Op::Pass) {
            self.pass();
            return;
        }
        let (manager, host) = (&mut self.manager, &mut self.host);
        let (actor, object) = (self.actor, self.object);
        // Rejections are part of the input space; only the invariant matters.
        match *op {
            Op::Stain(slot, stain, source) => {
                let ctx = EditContext::new(source);
                let _ = manager.change_stain(host, actor, EquipSlot::ARMOR[slot], StainId(stain), ctx);
            }
            Op::Meta(flag, value, source) => {
                let ctx = EditContext::new(source);
                let _ = manager.change_meta(host, actor, MetaIndex::FLAGS[flag], value, ctx);
            }
            Op::Model(id, source) => {
                let _ = manager.change_model_id(host, actor, ModelId(id), EditContext::new(source));
            }
            Op::HostWears(slot, set, stain) => {
                let gear = armor(set, stain);
                if let Some(o) = host.object_mut(object) {
                    o.record.armor[slot] = gear;
                }
                self.listener.on_equip(manager, host, object, EquipSlot::ARMOR[slot], gear);
            }
            Op::Disguise(slot, set, stain) => {
                let disguise = armor(set + 100, stain);
                self.listener.on_equip(manager, host, object, EquipSlot::ARMOR[slot], disguise);
            }
            Op::BlankHead => {
                self.listener.on_equip(manager, host, object, EquipSlot::Head, Armor::EMPTY);
            }
            Op::Transform(on) => host.set_transformed(object, on),
            Op::JobChange(family) => {
                let main = weapon(family, 1, 0);
                if let Some(o) = host.object_mut(object) {
                    o.record.weapons = [main, Weapon::EMPTY];
                }
                self.listener.on_job_change(manager, host, object, main, Weapon::EMPTY);
            }
            Op::Pass => {}
            Op::Reset(slot) => {
                let field = FieldIndex::stain(EquipSlot::ARMOR[slot]);
                let _ = manager.reset_field(host, actor, field, LockKey::NONE);
            }
            Op::ResetAll => {
                let _ = manager.reset_all(host, actor, LockKey::NONE);
            }
            Op::RemoveFixed => {
                let _ = manager.remove_fixed(actor, LockKey::NONE);
            }
        }
    }
}

proptest! {
    #[test]
    fn game_fields_never_diverge(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut world = World::new();
        for op in &ops {
            world.run(op);
            let state = world.manager.get(world.actor).unwrap();
            prop_assert!(
                state.is_consistent(),
                "after {:?}: {:?}",
                op,
                state.inconsistent_fields()
            );
        }
    }

    #[test]
    fn repeated_pass_changes_nothing(ops in prop::collection::vec(op_strategy(), 0..30)) {
        let mut world = World::new();
        for op in &ops {
            world.run(op);
        }
        world.pass();
        let state = world.manager.get(world.actor).unwrap().clone();
        let shown = world.host.shown(world.object).cloned();

        world.pass();
        prop_assert_eq!(world.manager.get(world.actor).unwrap(), &state);
        prop_assert_eq!(world.host.shown(world.object).cloned(), shown);
    }
}
