//! Reconciles values the host is about to display with tracked state.
//!
//! The host calls into [`StateListener`] from its display pipeline, once per
//! value, before the value takes effect. Each callback classifies the proposal
//! against base and the host's own record, folds genuine host changes into base,
//! and answers with the value the host should display instead, if any.

use std::collections::BTreeSet;

use fields::{AppearanceIndex, CrestSlot, EquipSlot, FieldIndex, MetaIndex};
use log::{debug, trace, warn};
use state::{
    ActorId, ActorState, Appearance, Armor, FieldValue, ModelId, ObjectHandle, Snapshot, Weapon,
    WeaponFamily,
};

use crate::deferred::DeferredAction;
use crate::host::{Catalog, Host};
use crate::manager::StateManager;

/// How a proposed host value relates to tracked state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateState {
    /// The proposal equals base; the model wins.
    NoChange,
    /// The proposal is a transient host disguise; leave it alone.
    Transformed,
    /// The host genuinely changed the actor; base absorbs the value.
    Change,
    /// The host blanks the head to hide the hat; the real head comes from the
    /// host's own record.
    HatHack,
}

/// The listener's answer to one proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<T> {
    /// Display the proposal unchanged.
    Keep,
    /// Display this value instead.
    Rewrite(T),
}

impl<T: PartialEq> Resolution<T> {
    fn between(proposed: &T, wanted: T) -> Self {
        if *proposed == wanted {
            Self::Keep
        } else {
            Self::Rewrite(wanted)
        }
    }

    /// The value the host ends up displaying.
    pub fn resolve(self, proposed: T) -> T {
        match self {
            Self::Keep => proposed,
            Self::Rewrite(value) => value,
        }
    }

    #[must_use]
    pub const fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }
}

/// Reported once an object finished creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Created {
    pub actor: ActorId,
    pub object: ObjectHandle,
    /// Whether the actor is already tracked.
    pub tracked: bool,
    /// Whether the automation layer should apply its designs now.
    pub automation: bool,
}

/// Counters of classification outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    pub no_change: u64,
    pub transformed: u64,
    pub change: u64,
    pub hat_hack: u64,
    pub rewrites: u64,
}

impl ListenerStats {
    fn record(&mut self, outcome: UpdateState) {
        match outcome {
            UpdateState::NoChange => self.no_change += 1,
            UpdateState::Transformed => self.transformed += 1,
            UpdateState::Change => self.change += 1,
            UpdateState::HatHack => self.hat_hack += 1,
        }
    }

    fn rewrite<T>(&mut self, resolution: Resolution<T>) -> Resolution<T> {
        if matches!(resolution, Resolution::Rewrite(_)) {
            self.rewrites += 1;
        }
        resolution
    }
}

/// Classifies a proposed value.
///
/// `authoritative` is the host's own record of the value, `None` if the host
/// has none. A proposal that disagrees with it is a disguise, not a change.
#[must_use]
pub fn classify<T: PartialEq>(
    base: &T,
    proposed: &T,
    authoritative: Option<&T>,
    transformed: bool,
    player_npc: bool,
) -> UpdateState {
    if transformed {
        UpdateState::Transformed
    } else if proposed == base {
        UpdateState::NoChange
    } else if authoritative != Some(proposed) || player_npc {
        UpdateState::Transformed
    } else {
        UpdateState::Change
    }
}

/// Per-object reconciliation state carried across one creation pass.
#[derive(Debug, Default)]
pub struct StateListener {
    /// Objects whose model identity was disguised in the current pass.
    transformed: BTreeSet<ObjectHandle>,
    stats: ListenerStats,
}

/// One field's proposal, ready to classify.
struct Proposal {
    field: FieldIndex,
    value: FieldValue,
    authoritative: Option<FieldValue>,
}

impl StateListener {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn stats(&self) -> &ListenerStats {
        &self.stats
    }

    /// Whether the object's model identity is disguised in the current pass.
    #[must_use]
    pub fn is_transformed(&self, object: ObjectHandle) -> bool {
        self.transformed.contains(&object)
    }

    /// The model identity is about to be set; starts a creation pass.
    pub fn on_creating<C: Catalog>(
        &mut self,
        manager: &mut StateManager<C>,
        host: &impl Host,
        object: ObjectHandle,
        proposed: ModelId,
    ) -> Resolution<ModelId> {
        self.transformed.remove(&object);
        let Some(actor) = tracked(manager, host, object) else {
            return Resolution::Keep;
        };
        let authoritative = host.sample(object).map(|sample| sample.model_id);
        // A disguise may propose the base identity itself, so it is caught
        // before the base comparison.
        if authoritative.is_some_and(|real| real != proposed) || host.is_transformed(object) {
            self.stats.record(UpdateState::Transformed);
            debug!("{actor} disguised as model {}, keeping", proposed.0);
            self.transformed.insert(object);
            return Resolution::Keep;
        }
        let Some(base) = base_of(manager, actor).map(Snapshot::model_id) else {
            return Resolution::Keep;
        };
        let outcome = classify(
            &base,
            &proposed,
            authoritative.as_ref(),
            host.is_transformed(object),
            host.is_player_npc(object),
        );
        self.stats.record(outcome);
        trace!("{actor} model id {}: {outcome:?}", proposed.0);
        match outcome {
            UpdateState::Transformed => {
                debug!("{actor} disguised as model {}, keeping", proposed.0);
                self.transformed.insert(object);
                return Resolution::Keep;
            }
            UpdateState::Change if !proposed.is_human() => {
                debug!("{actor} became model {}, rebuilding base", proposed.0);
                if let Err(err) = manager.rebuild_base(host, actor, object) {
                    warn!("rebuilding base of {actor} failed: {err}");
                }
                absorb_model_id(manager, host, actor, proposed);
            }
            UpdateState::Change => {
                debug!("{actor} returned to model {}", proposed.0);
                absorb_model_id(manager, host, actor, proposed);
            }
            UpdateState::NoChange | UpdateState::HatHack => {}
        }
        let wanted = model_of(manager, actor).map_or(proposed, Snapshot::model_id);
        self.stats.rewrite(Resolution::between(&proposed, wanted))
    }

    /// An armor slot is about to be displayed.
    pub fn on_equip<C: Catalog>(
        &mut self,
        manager: &mut StateManager<C>,
        host: &impl Host,
        object: ObjectHandle,
        slot: EquipSlot,
        proposed: Armor,
    ) -> Resolution<Armor> {
        if slot.is_weapon() {
            return Resolution::Keep;
        }
        let Some(actor) = tracked(manager, host, object) else {
            return Resolution::Keep;
        };
        let forced = self.forced(host, object);
        let authoritative = host.sample(object).and_then(|sample| sample.armor(slot));

        if slot == EquipSlot::Head && proposed.is_empty() && !forced {
            self.stats.record(UpdateState::HatHack);
            trace!("{actor} head blanked by host");
            if let Some(real) = authoritative {
                let item = FieldValue::Item(manager.catalog().resolve_armor(slot, real));
                let updates = [
                    (FieldIndex::equip(slot), item),
                    (FieldIndex::stain(slot), FieldValue::Stain(real.stain)),
                ];
                for (field, value) in updates {
                    let differs =
                        base_of(manager, actor).is_some_and(|base| base.value(field) != value);
                    if differs {
                        manager.absorb(host, actor, field, value, fixed(field));
                    }
                }
            }
        } else {
            let catalog = manager.catalog();
            let proposals = [
                Proposal {
                    field: FieldIndex::equip(slot),
                    value: FieldValue::Item(catalog.resolve_armor(slot, proposed)),
                    authoritative: authoritative
                        .map(|real| FieldValue::Item(catalog.resolve_armor(slot, real))),
                },
                Proposal {
                    field: FieldIndex::stain(slot),
                    value: FieldValue::Stain(proposed.stain),
                    authoritative: authoritative.map(|real| FieldValue::Stain(real.stain)),
                },
            ];
            if !self.settle(manager, host, object, actor, forced, &proposals) {
                return Resolution::Keep;
            }
        }
        let applier = manager.applier();
        let wanted = model_of(manager, actor)
            .and_then(|model| applier.displayed_armor(model, slot))
            .unwrap_or(Armor::EMPTY);
        self.stats.rewrite(Resolution::between(&proposed, wanted))
    }

    /// A weapon slot is about to be displayed.
    ///
    /// A weapon of a foreign family only changes base inside a free
    /// transformation window; there the host keeps its weapon and the model one
    /// is pushed again once the window closes. Outside, the model weapon wins.
    pub fn on_weapon<C: Catalog>(
        &mut self,
        manager: &mut StateManager<C>,
        host: &impl Host,
        object: ObjectHandle,
        slot: EquipSlot,
        proposed: Weapon,
    ) -> Resolution<Weapon> {
        if !slot.is_weapon() {
            return Resolution::Keep;
        }
        let Some(actor) = tracked(manager, host, object) else {
            return Resolution::Keep;
        };
        let forced = self.forced(host, object);
        let authoritative = host.sample(object).and_then(|sample| sample.weapon(slot));
        let Some(base) = base_of(manager, actor) else {
            return Resolution::Keep;
        };
        let main = base.item(EquipSlot::MainHand).family;
        let base_family = base.item(slot).family;
        let item = manager.catalog().resolve_weapon(slot, proposed, main);

        let family_changes = item.family != base_family
            && authoritative.is_some_and(|real| real == proposed)
            && !forced
            && !host.is_player_npc(object);
        if family_changes {
            if host.in_free_transform_window(actor) {
                debug!("{actor} {slot:?} switched weapon family inside window, deferring");
                self.stats.record(UpdateState::Transformed);
                manager.defer(actor, DeferredAction::ReassertWeapon { slot });
                return Resolution::Keep;
            }
            warn!(
                "{actor} {slot:?}: weapon family {} does not fit {}, keeping model weapon",
                item.family.0, base_family.0
            );
            let wanted = model_of(manager, actor).map_or(proposed, |model| model.weapon(slot));
            return self.stats.rewrite(Resolution::between(&proposed, wanted));
        }

        let catalog = manager.catalog();
        let proposals = [
            Proposal {
                field: FieldIndex::equip(slot),
                value: FieldValue::Item(item),
                authoritative: authoritative
                    .map(|real| FieldValue::Item(catalog.resolve_weapon(slot, real, main))),
            },
            Proposal {
                field: FieldIndex::stain(slot),
                value: FieldValue::Stain(proposed.stain),
                authoritative: authoritative.map(|real| FieldValue::Stain(real.stain)),
            },
        ];
        if !self.settle(manager, host, object, actor, forced, &proposals) {
            return Resolution::Keep;
        }
        let wanted = model_of(manager, actor).map_or(proposed, |model| model.weapon(slot));
        self.stats.rewrite(Resolution::between(&proposed, wanted))
    }

    /// The whole appearance is about to be displayed.
    ///
    /// A disguise on any single value keeps the whole proposal.
    pub fn on_appearance<C: Catalog>(
        &mut self,
        manager: &mut StateManager<C>,
        host: &impl Host,
        object: ObjectHandle,
        proposed: &Appearance,
    ) -> Resolution<Appearance> {
        let Some(actor) = tracked(manager, host, object) else {
            return Resolution::Keep;
        };
        let forced = self.forced(host, object);
        let authoritative = host.sample(object).map(|sample| sample.appearance);
        let proposals: [Proposal; AppearanceIndex::COUNT] =
            AppearanceIndex::ALL.map(|index| Proposal {
                field: FieldIndex::appearance(index),
                value: FieldValue::Appearance(proposed.get(index)),
                authoritative: authoritative
                    .as_ref()
                    .map(|real| FieldValue::Appearance(real.get(index))),
            });
        if !self.settle(manager, host, object, actor, forced, &proposals) {
            return Resolution::Keep;
        }
        let wanted = model_of(manager, actor).map_or(*proposed, |model| *model.appearance());
        self.stats.rewrite(Resolution::between(proposed, wanted))
    }

    /// A single appearance value is about to change in place.
    pub fn on_appearance_value<C: Catalog>(
        &mut self,
        manager: &mut StateManager<C>,
        host: &impl Host,
        object: ObjectHandle,
        index: AppearanceIndex,
        proposed: u8,
    ) -> Resolution<u8> {
        let authoritative = host
            .sample(object)
            .map(|sample| FieldValue::Appearance(sample.appearance.get(index)));
        let field = FieldIndex::appearance(index);
        let value = FieldValue::Appearance(proposed);
        match self.single(manager, host, object, field, value, authoritative) {
            Some(FieldValue::Appearance(wanted)) => {
                self.stats.rewrite(Resolution::between(&proposed, wanted))
            }
            _ => Resolution::Keep,
        }
    }

    pub fn on_crest<C: Catalog>(
        &mut self,
        manager: &mut StateManager<C>,
        host: &impl Host,
        object: ObjectHandle,
        slot: CrestSlot,
        proposed: bool,
    ) -> Resolution<bool> {
        let authoritative = host
            .sample(object)
            .map(|sample| FieldValue::Crest(sample.crests[slot.index()]));
        let field = FieldIndex::crest(slot);
        let value = FieldValue::Crest(proposed);
        match self.single(manager, host, object, field, value, authoritative) {
            Some(FieldValue::Crest(wanted)) => {
                self.stats.rewrite(Resolution::between(&proposed, wanted))
            }
            _ => Resolution::Keep,
        }
    }

    /// A meta flag is about to be displayed. The model identity goes through
    /// [`StateListener::on_creating`] instead.
    pub fn on_meta<C: Catalog>(
        &mut self,
        manager: &mut StateManager<C>,
        host: &impl Host,
        object: ObjectHandle,
        flag: MetaIndex,
        proposed: bool,
    ) -> Resolution<bool> {
        if !flag.is_flag() {
            return Resolution::Keep;
        }
        let authoritative = host
            .sample(object)
            .map(|sample| FieldValue::Flag(sample.meta.get(flag)));
        let field = FieldIndex::meta(flag);
        let value = FieldValue::Flag(proposed);
        match self.single(manager, host, object, field, value, authoritative) {
            Some(FieldValue::Flag(wanted)) => {
                self.stats.rewrite(Resolution::between(&proposed, wanted))
            }
            _ => Resolution::Keep,
        }
    }

    pub fn on_visor<C: Catalog>(
        &mut self,
        manager: &mut StateManager<C>,
        host: &impl Host,
        object: ObjectHandle,
        proposed: bool,
    ) -> Resolution<bool> {
        self.on_meta(manager, host, object, MetaIndex::VisorToggled, proposed)
    }

    pub fn on_hat_visibility<C: Catalog>(
        &mut self,
        manager: &mut StateManager<C>,
        host: &impl Host,
        object: ObjectHandle,
        proposed: bool,
    ) -> Resolution<bool> {
        self.on_meta(manager, host, object, MetaIndex::HatVisible, proposed)
    }

    pub fn on_weapon_visibility<C: Catalog>(
        &mut self,
        manager: &mut StateManager<C>,
        host: &impl Host,
        object: ObjectHandle,
        proposed: bool,
    ) -> Resolution<bool> {
        self.on_meta(manager, host, object, MetaIndex::WeaponVisible, proposed)
    }

    pub fn on_wetness<C: Catalog>(
        &mut self,
        manager: &mut StateManager<C>,
        host: &impl Host,
        object: ObjectHandle,
        proposed: bool,
    ) -> Resolution<bool> {
        self.on_meta(manager, host, object, MetaIndex::Wetness, proposed)
    }

    /// The actor switched jobs, which is the one host change allowed to move
    /// base onto a new weapon family.
    ///
    /// Model weapons follow unless they are overrides that still fit the new
    /// family.
    pub fn on_job_change<C: Catalog>(
        &mut self,
        manager: &mut StateManager<C>,
        host: &impl Host,
        object: ObjectHandle,
        main: Weapon,
        off: Weapon,
    ) -> [Resolution<Weapon>; 2] {
        let keep = [Resolution::Keep, Resolution::Keep];
        let Some(actor) = tracked(manager, host, object) else {
            return keep;
        };
        if self.forced(host, object) {
            return keep;
        }
        let catalog = manager.catalog();
        let main_item = catalog.resolve_weapon(EquipSlot::MainHand, main, WeaponFamily::NONE);
        let off_item = catalog.resolve_weapon(EquipSlot::OffHand, off, main_item.family);
        debug!("{actor} changed job, weapon family {}", main_item.family.0);
        self.stats.record(UpdateState::Change);

        let updates = [
            (EquipSlot::MainHand, main_item, main),
            (EquipSlot::OffHand, off_item, off),
        ];
        for (slot, item, raw) in updates {
            let fits = move |state: &ActorState| {
                state.model().item(slot).family == state.base().item(slot).family
            };
            let field = FieldIndex::equip(slot);
            manager.absorb(host, actor, field, FieldValue::Item(item), move |state| {
                !state.source(field).is_game() && fits(state)
            });
            let stain = FieldIndex::stain(slot);
            manager.absorb(host, actor, stain, FieldValue::Stain(raw.stain), move |state| {
                !state.source(stain).is_game() && fits(state)
            });
        }
        let Some(model) = model_of(manager, actor) else {
            return keep;
        };
        let resolved = [
            Resolution::between(&main, model.weapon(EquipSlot::MainHand)),
            Resolution::between(&off, model.weapon(EquipSlot::OffHand)),
        ];
        resolved.map(|resolution| self.stats.rewrite(resolution))
    }

    /// Creation finished; ends the pass and pushes colors that waited for a
    /// drawn model.
    pub fn on_created<C: Catalog>(
        &mut self,
        manager: &mut StateManager<C>,
        host: &mut impl Host,
        object: ObjectHandle,
    ) -> Option<Created> {
        self.transformed.remove(&object);
        let actor = host.actor_of(object)?;
        let tracked = manager.contains(actor);
        if tracked {
            manager.apply_pending_colors(host, actor);
        }
        Some(Created {
            actor,
            object,
            tracked,
            automation: manager.config().automation_enabled,
        })
    }

    /// The actor's free transformation window closed; runs deferred actions.
    pub fn on_window_closed<C: Catalog>(
        &mut self,
        manager: &mut StateManager<C>,
        host: &mut impl Host,
        actor: ActorId,
    ) -> usize {
        manager.close_transform_window(host, actor)
    }

    /// An object was destroyed. Deferred actions die with the actor's last object.
    pub fn on_destroyed<C: Catalog>(
        &mut self,
        manager: &mut StateManager<C>,
        host: &impl Host,
        actor: ActorId,
        object: ObjectHandle,
    ) {
        self.transformed.remove(&object);
        if host.objects(actor).is_empty() {
            let dropped = manager.discard_deferred(actor);
            if dropped > 0 {
                debug!("{actor} gone, dropped {dropped} deferred actions");
            }
        }
    }

    // Internals

    fn forced(&self, host: &impl Host, object: ObjectHandle) -> bool {
        self.transformed.contains(&object) || host.is_transformed(object)
    }

    /// Classifies every proposal, then absorbs the genuine changes.
    ///
    /// Returns `false` if any proposal is a disguise, in which case nothing is
    /// absorbed and the host keeps its values. Proposals name distinct fields,
    /// so absorbing one leaves the others' base values untouched.
    fn settle<C: Catalog>(
        &mut self,
        manager: &mut StateManager<C>,
        host: &impl Host,
        object: ObjectHandle,
        actor: ActorId,
        forced: bool,
        proposals: &[Proposal],
    ) -> bool {
        let player_npc = host.is_player_npc(object);
        let outcome_of = |manager: &StateManager<C>, proposal: &Proposal| {
            base_of(manager, actor).map(|base| {
                classify(
                    &base.value(proposal.field),
                    &proposal.value,
                    proposal.authoritative.as_ref(),
                    forced,
                    player_npc,
                )
            })
        };
        let mut disguised = false;
        for proposal in proposals {
            match outcome_of(&*manager, proposal) {
                None => return false,
                Some(UpdateState::Transformed) => disguised = true,
                Some(_) => {}
            }
        }
        if disguised {
            self.stats.record(UpdateState::Transformed);
            trace!("{actor} disguised, keeping host values");
            return false;
        }
        for proposal in proposals {
            let Some(outcome) = outcome_of(&*manager, proposal) else {
                return false;
            };
            self.stats.record(outcome);
            if outcome == UpdateState::Change {
                debug!("{actor} {}: host changed base", proposal.field);
                manager.absorb(host, actor, proposal.field, proposal.value, fixed(proposal.field));
            }
        }
        true
    }

    /// Reconciles a single field. Returns the value the host should display,
    /// `None` if the host keeps its own.
    fn single<C: Catalog>(
        &mut self,
        manager: &mut StateManager<C>,
        host: &impl Host,
        object: ObjectHandle,
        field: FieldIndex,
        value: FieldValue,
        authoritative: Option<FieldValue>,
    ) -> Option<FieldValue> {
        let actor = tracked(manager, host, object)?;
        let forced = self.forced(host, object);
        let proposal = Proposal {
            field,
            value,
            authoritative,
        };
        if !self.settle(manager, host, object, actor, forced, &[proposal]) {
            return None;
        }
        model_of(manager, actor).map(|model| model.value(field))
    }
}

/// The tracked actor behind `object`. Untracked actors are left to the host.
fn tracked<C: Catalog>(
    manager: &StateManager<C>,
    host: &impl Host,
    object: ObjectHandle,
) -> Option<ActorId> {
    host.actor_of(object).filter(|actor| manager.contains(*actor))
}

fn base_of<C: Catalog>(manager: &StateManager<C>, actor: ActorId) -> Option<&Snapshot> {
    manager.get(actor).map(ActorState::base)
}

fn model_of<C: Catalog>(manager: &StateManager<C>, actor: ActorId) -> Option<&Snapshot> {
    manager.get(actor).map(ActorState::model)
}

fn absorb_model_id<C: Catalog>(
    manager: &mut StateManager<C>,
    host: &impl Host,
    actor: ActorId,
    model_id: ModelId,
) {
    let field = FieldIndex::MODEL_ID;
    manager.absorb(host, actor, field, FieldValue::Model(model_id), fixed(field));
}

/// Keep predicate for host changes: only fixed overrides survive.
fn fixed(field: FieldIndex) -> impl FnOnce(&ActorState) -> bool {
    move |state| state.source(field).is_fixed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_orders_checks() {
        assert_eq!(classify(&1, &2, Some(&2), true, false), UpdateState::Transformed);
        assert_eq!(classify(&1, &1, Some(&2), false, true), UpdateState::NoChange);
        assert_eq!(classify(&1, &2, Some(&3), false, false), UpdateState::Transformed);
        assert_eq!(classify(&1, &2, None, false, false), UpdateState::Transformed);
        assert_eq!(classify(&1, &2, Some(&2), false, true), UpdateState::Transformed);
        assert_eq!(classify(&1, &2, Some(&2), false, false), UpdateState::Change);
    }

    #[test]
    fn resolution_between_keeps_equal_values() {
        assert!(Resolution::between(&3, 3).is_keep());
        assert_eq!(Resolution::between(&3, 4), Resolution::Rewrite(4));
        assert_eq!(Resolution::Rewrite(4).resolve(3), 4);
        assert_eq!(Resolution::<u8>::Keep.resolve(3), 3);
    }

    #[test]
    fn stats_count_rewrites() {
        let mut stats = ListenerStats::default();
        stats.record(UpdateState::Change);
        stats.rewrite(Resolution::Rewrite(1));
        stats.rewrite(Resolution::<u8>::Keep);
        assert_eq!(stats.change, 1);
        assert_eq!(stats.rewrites, 1);
    }
}
