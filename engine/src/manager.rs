//! The actor state registry and the semantic write API.

use std::collections::BTreeMap;

use fields::{
    AppearanceIndex, AppearanceMask, ColorParam, CrestSlot, EquipSlot, Field, FieldIndex,
    FieldMask, MetaIndex, StateSource,
};
use log::{debug, warn};
use state::{
    ActorId, ActorState, Appearance, AppearanceChange, ColorValue, EditContext, EquipItem,
    FieldValue, LockKey, ModelId, ObjectHandle, Snapshot, StainId, StateEditor, StateError, StateResult,
};

use crate::applier::StateApplier;
use crate::config::EngineConfig;
use crate::deferred::{DeferredAction, DeferredQueue};
use crate::design::Design;
use crate::events::{ChangeKind, EventBus, StateEvent, SubscriptionId};
use crate::host::{Catalog, Host};

/// Owns every tracked [`ActorState`] and routes edits through the editor, the
/// applier and the event bus.
///
/// Edits with a non-game source are pushed to the host immediately; game-sourced
/// edits only update tracked state.
pub struct StateManager<C> {
    config: EngineConfig,
    catalog: C,
    states: BTreeMap<ActorId, ActorState>,
    deferred: DeferredQueue,
    events: EventBus,
}

impl<C: Catalog> StateManager<C> {
    #[must_use]
    pub fn new(config: EngineConfig, catalog: C) -> Self {
        Self {
            config,
            catalog,
            states: BTreeMap::new(),
            deferred: DeferredQueue::new(),
            events: EventBus::new(),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    #[must_use]
    pub fn applier(&self) -> StateApplier<'_, C> {
        StateApplier::new(&self.catalog, &self.config)
    }

    // Registry

    #[must_use]
    pub fn get(&self, actor: ActorId) -> Option<&ActorState> {
        self.states.get(&actor)
    }

    #[must_use]
    pub fn contains(&self, actor: ActorId) -> bool {
        self.states.contains_key(&actor)
    }

    /// Iterates tracked states in actor order.
    pub fn iter(&self) -> impl Iterator<Item = &ActorState> {
        self.states.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Returns the state for `actor`, deriving it from the host on first use.
    pub fn get_or_create(&mut self, host: &impl Host, actor: ActorId) -> StateResult<&ActorState> {
        if !self.states.contains_key(&actor) {
            let state = self.derive(host, actor)?;
            self.states.insert(actor, state);
        }
        self.states
            .get(&actor)
            .ok_or(StateError::UnknownActor { actor })
    }

    fn derive(&self, host: &impl Host, actor: ActorId) -> StateResult<ActorState> {
        if self.states.len() >= self.config.max_actors {
            warn!("registry full, not tracking {actor}");
            return Err(StateError::RegistryFull {
                max: self.config.max_actors,
            });
        }
        let sample = host
            .objects(actor)
            .into_iter()
            .find_map(|object| host.sample(object))
            .ok_or(StateError::ActorUnavailable { actor })?;
        debug!("tracking {actor}");
        Ok(ActorState::new(actor, sample.to_snapshot(&self.catalog)))
    }

    /// Stops tracking `actor`, dropping its deferred actions.
    pub fn release(&mut self, actor: ActorId) -> bool {
        let dropped = self.deferred.discard(actor);
        let removed = self.states.remove(&actor).is_some();
        if removed {
            debug!("released {actor}, dropped {dropped} deferred actions");
        }
        removed
    }

    pub fn lock(&mut self, actor: ActorId, key: LockKey) -> StateResult<bool> {
        Ok(self.state_mut(actor)?.lock(key))
    }

    pub fn unlock(&mut self, actor: ActorId, key: LockKey) -> StateResult<bool> {
        Ok(self.state_mut(actor)?.unlock(key))
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&StateEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Number of deferred actions waiting for `actor`'s window to close.
    #[must_use]
    pub fn pending_actions(&self, actor: ActorId) -> usize {
        self.deferred.pending(actor)
    }

    pub(crate) fn state_mut(&mut self, actor: ActorId) -> StateResult<&mut ActorState> {
        self.states
            .get_mut(&actor)
            .ok_or(StateError::UnknownActor { actor })
    }

    pub(crate) fn defer(&mut self, actor: ActorId, action: DeferredAction) {
        debug!("deferring {action:?} for {actor}");
        self.deferred.push(actor, action);
    }

    pub(crate) fn discard_deferred(&mut self, actor: ActorId) -> usize {
        self.deferred.discard(actor)
    }

    // Writes

    pub fn change_item(
        &mut self,
        host: &mut impl Host,
        actor: ActorId,
        slot: EquipSlot,
        item: EquipItem,
        ctx: EditContext,
    ) -> StateResult<EquipItem> {
        let ctx = Self::window(host, actor, ctx);
        let touched = FieldMask::single(FieldIndex::equip(slot));
        let old = self.edit(host, actor, ctx, touched, |state| {
            StateEditor::change_item(state, slot, item, ctx)
        })?;
        self.defer_revert(actor, slot);
        Ok(old)
    }

    pub fn change_stain(
        &mut self,
        host: &mut impl Host,
        actor: ActorId,
        slot: EquipSlot,
        stain: StainId,
        ctx: EditContext,
    ) -> StateResult<StainId> {
        let touched = FieldMask::single(FieldIndex::stain(slot));
        self.edit(host, actor, ctx, touched, |state| {
            StateEditor::change_stain(state, slot, stain, ctx)
        })
    }

    /// Changes an item and its stain together.
    pub fn change_equip(
        &mut self,
        host: &mut impl Host,
        actor: ActorId,
        slot: EquipSlot,
        item: EquipItem,
        stain: StainId,
        ctx: EditContext,
    ) -> StateResult<(EquipItem, StainId)> {
        let ctx = Self::window(host, actor, ctx);
        let old = self.edit(host, actor, ctx, FieldMask::from(slot), |state| {
            StateEditor::change_equip(state, slot, item, stain, ctx)
        })?;
        self.defer_revert(actor, slot);
        Ok(old)
    }

    pub fn change_appearance(
        &mut self,
        host: &mut impl Host,
        actor: ActorId,
        index: AppearanceIndex,
        value: u8,
        ctx: EditContext,
    ) -> StateResult<AppearanceChange> {
        let rules = self.catalog.rules();
        let state = self
            .states
            .get_mut(&actor)
            .ok_or(StateError::UnknownActor { actor })?;
        let before = state.model().clone();
        let change = StateEditor::change_appearance(state, index, value, rules, ctx)
            .map_err(|err| rejected(actor, err))?;
        let touched =
            FieldMask::from(change.changed) | FieldMask::single(FieldIndex::appearance(index));
        self.finish(host, actor, ctx.source, ChangeKind::Edit, &before, touched);
        Ok(change)
    }

    /// Changes every appearance value selected by `mask`.
    pub fn change_appearance_all(
        &mut self,
        host: &mut impl Host,
        actor: ActorId,
        appearance: &Appearance,
        mask: AppearanceMask,
        ctx: EditContext,
    ) -> StateResult<AppearanceChange> {
        let rules = self.catalog.rules();
        let state = self
            .states
            .get_mut(&actor)
            .ok_or(StateError::UnknownActor { actor })?;
        let before = state.model().clone();
        let change = StateEditor::change_appearance_all(state, appearance, mask, rules, ctx)
            .map_err(|err| rejected(actor, err))?;
        self.finish(
            host,
            actor,
            ctx.source,
            ChangeKind::Edit,
            &before,
            FieldMask::from(change.changed),
        );
        Ok(change)
    }

    pub fn change_meta(
        &mut self,
        host: &mut impl Host,
        actor: ActorId,
        flag: MetaIndex,
        value: bool,
        ctx: EditContext,
    ) -> StateResult<bool> {
        self.edit(host, actor, ctx, FieldMask::from(flag), |state| {
            StateEditor::change_meta(state, flag, value, ctx)
        })
    }

    pub fn change_crest(
        &mut self,
        host: &mut impl Host,
        actor: ActorId,
        slot: CrestSlot,
        visible: bool,
        ctx: EditContext,
    ) -> StateResult<bool> {
        self.edit(host, actor, ctx, FieldMask::from(slot), |state| {
            StateEditor::change_crest(state, slot, visible, ctx)
        })
    }

    /// Changes one advanced color. Lands as pending while no object is drawn.
    pub fn change_color(
        &mut self,
        host: &mut impl Host,
        actor: ActorId,
        param: ColorParam,
        value: ColorValue,
        ctx: EditContext,
    ) -> StateResult<ColorValue> {
        self.edit(host, actor, ctx, FieldMask::from(param), |state| {
            StateEditor::change_color(state, param, value, ctx)
        })
    }

    /// Changes the model identity, cascading into the body when crossing
    /// between humanoid and non-humanoid.
    pub fn change_model_id(
        &mut self,
        host: &mut impl Host,
        actor: ActorId,
        model_id: ModelId,
        ctx: EditContext,
    ) -> StateResult<FieldMask> {
        let defaults = self.catalog.defaults();
        self.edit(host, actor, ctx, FieldMask::single(FieldIndex::MODEL_ID), |state| {
            StateEditor::change_model_id(state, model_id, &defaults, ctx)
        })
    }

    /// Applies the fields of `design` that are also in `wanted`.
    ///
    /// The model identity goes first, then appearance, then everything else.
    /// Weapons of a foreign family are skipped outside a transformation window.
    /// Returns the fields whose model value changed.
    pub fn apply_design(
        &mut self,
        host: &mut impl Host,
        actor: ActorId,
        design: &Design,
        wanted: FieldMask,
        ctx: EditContext,
    ) -> StateResult<FieldMask> {
        let ctx = Self::window(host, actor, ctx);
        let fields = design.fields(wanted);
        let defaults = self.catalog.defaults();
        let rules = self.catalog.rules();
        let state = self
            .states
            .get_mut(&actor)
            .ok_or(StateError::UnknownActor { actor })?;
        if !state.can_edit(ctx.key) {
            warn!("design for {actor} rejected: locked");
            return Err(StateError::Locked { actor });
        }
        let data = &design.data;
        let before = state.model().clone();

        if fields.contains(FieldIndex::MODEL_ID) {
            StateEditor::change_model_id(state, data.model_id(), &defaults, ctx)?;
        }
        let appearance = fields.appearance_mask();
        if !appearance.is_empty() {
            if let Err(err) =
                StateEditor::change_appearance_all(state, data.appearance(), appearance, rules, ctx)
            {
                debug!("design appearance for {actor} skipped: {err}");
            }
        }
        for field in (fields & !FieldMask::appearance()).iter() {
            let result = match field.field() {
                Field::Equip(slot) => {
                    StateEditor::change_item(state, slot, *data.item(slot), ctx).map(drop)
                }
                Field::Stain(slot) => {
                    StateEditor::change_stain(state, slot, data.stain(slot), ctx).map(drop)
                }
                Field::Crest(slot) => {
                    StateEditor::change_crest(state, slot, data.crest(slot), ctx).map(drop)
                }
                Field::Meta(MetaIndex::ModelId) | Field::Appearance(_) => Ok(()),
                Field::Meta(flag) => {
                    StateEditor::change_meta(state, flag, data.meta().get(flag), ctx).map(drop)
                }
                Field::Color(param) => {
                    StateEditor::change_color(state, param, data.color(param), ctx).map(drop)
                }
            };
            if let Err(err) = result {
                debug!("design field {field} for {actor} skipped: {err}");
            }
        }
        let changed = before.diff(state.model());
        self.finish(host, actor, ctx.source, ChangeKind::Design, &before, changed);
        for slot in EquipSlot::WEAPONS {
            self.defer_revert(actor, slot);
        }
        Ok(changed)
    }

    /// Resets one field (with its cascade, for the model identity) back to base.
    pub fn reset_field(
        &mut self,
        host: &mut impl Host,
        actor: ActorId,
        field: FieldIndex,
        key: LockKey,
    ) -> StateResult<FieldMask> {
        let state = self.state_mut(actor)?;
        let before = state.model().clone();
        let changed = StateEditor::reset_field(state, field, key)
            .map_err(|err| rejected(actor, err))?;
        self.finish_reset(host, actor, &before, changed | FieldMask::single(field));
        Ok(changed)
    }

    /// Resets the whole model back to base.
    pub fn reset_all(
        &mut self,
        host: &mut impl Host,
        actor: ActorId,
        key: LockKey,
    ) -> StateResult<FieldMask> {
        let state = self.state_mut(actor)?;
        let before = state.model().clone();
        let changed = StateEditor::reset_all(state, key)
            .map_err(|err| rejected(actor, err))?;
        self.finish_reset(host, actor, &before, changed);
        Ok(changed)
    }

    /// Demotes fixed fields to manual once a fixed design stops applying.
    pub fn remove_fixed(&mut self, actor: ActorId, key: LockKey) -> StateResult<usize> {
        let demoted = StateEditor::remove_fixed(self.state_mut(actor)?, key)?;
        debug!("demoted {demoted} fixed fields on {actor}");
        Ok(demoted)
    }

    /// Replaces the base snapshot from a fresh host sample of `object`.
    ///
    /// Returns the base fields that changed.
    pub fn rebuild_base(
        &mut self,
        host: &impl Host,
        actor: ActorId,
        object: ObjectHandle,
    ) -> StateResult<FieldMask> {
        let sample = host
            .sample(object)
            .ok_or(StateError::ActorUnavailable { actor })?;
        let base = sample.to_snapshot(&self.catalog);
        let state = self
            .states
            .get_mut(&actor)
            .ok_or(StateError::UnknownActor { actor })?;
        let before = state.model().clone();
        let changed = StateEditor::rebuild_base(state, base);
        debug!("rebuilt base of {actor}, {} fields changed", changed.len());
        let followed = before.diff(state.model());
        let objects = host.objects(actor);
        emit_changes(&mut self.events, state, ChangeKind::Host, &before, followed, &objects);
        Ok(changed)
    }

    /// Pushes colors recorded while no object was drawn and marks them applied.
    ///
    /// Returns the number of fields that were pending.
    pub fn apply_pending_colors(&mut self, host: &mut impl Host, actor: ActorId) -> usize {
        let Some(state) = self.states.get_mut(&actor) else {
            return 0;
        };
        let pending: FieldMask = state
            .sources()
            .iter()
            .filter(|(_, source)| source.is_pending())
            .map(|(field, _)| field)
            .collect();
        if pending.is_empty() {
            return 0;
        }
        let objects = host.objects(actor);
        let applier = StateApplier::new(&self.catalog, &self.config);
        if !applier.apply_colors(host, &objects, state.model()) {
            return 0;
        }
        for field in pending.iter() {
            StateEditor::collapse_pending(state, field);
        }
        debug!("applied {} pending colors on {actor}", pending.len());
        pending.len()
    }

    /// Runs every action deferred while `actor`'s transformation window was open.
    ///
    /// Returns the number of actions run.
    pub fn close_transform_window(&mut self, host: &mut impl Host, actor: ActorId) -> usize {
        let actions = self.deferred.take(actor);
        let Some(state) = self.states.get_mut(&actor) else {
            return 0;
        };
        let objects = host.objects(actor);
        let applier = StateApplier::new(&self.catalog, &self.config);
        for action in &actions {
            debug!("running {action:?} for {actor}");
            match *action {
                DeferredAction::RevertWeapon { slot } => {
                    let family = state.model().item(slot).family;
                    if family == state.base().item(slot).family {
                        continue;
                    }
                    let before = state.model().clone();
                    let field = FieldIndex::equip(slot);
                    StateEditor::follow_base(state, field);
                    applier.apply_weapon(host, &objects, state.model(), slot);
                    emit_changes(
                        &mut self.events,
                        state,
                        ChangeKind::Deferred,
                        &before,
                        FieldMask::single(field),
                        &objects,
                    );
                }
                DeferredAction::ReassertWeapon { slot } => {
                    applier.apply_weapon(host, &objects, state.model(), slot);
                }
            }
        }
        actions.len()
    }

    // Internals

    /// Widens `ctx` with the host's transformation window.
    fn window(host: &impl Host, actor: ActorId, ctx: EditContext) -> EditContext {
        ctx.in_free_transform(ctx.free_transform || host.in_free_transform_window(actor))
    }

    /// Queues a revert if a weapon edit left the model off the base family.
    fn defer_revert(&mut self, actor: ActorId, slot: EquipSlot) {
        let Some(state) = self.states.get(&actor) else {
            return;
        };
        if slot.is_weapon() && state.model().item(slot).family != state.base().item(slot).family {
            self.defer(actor, DeferredAction::RevertWeapon { slot });
        }
    }

    /// Runs a single editor call, then pushes and notifies.
    fn edit<T>(
        &mut self,
        host: &mut impl Host,
        actor: ActorId,
        ctx: EditContext,
        touched: FieldMask,
        op: impl FnOnce(&mut ActorState) -> StateResult<T>,
    ) -> StateResult<T> {
        let state = self.state_mut(actor)?;
        let before = state.model().clone();
        let old = op(state).map_err(|err| rejected(actor, err))?;
        let changed = before.diff(state.model());
        self.finish(host, actor, ctx.source, ChangeKind::Edit, &before, changed | touched);
        Ok(old)
    }

    /// Pushes `touched` to the host for non-game sources and emits one event per field.
    fn finish(
        &mut self,
        host: &mut impl Host,
        actor: ActorId,
        source: StateSource,
        kind: ChangeKind,
        before: &Snapshot,
        touched: FieldMask,
    ) {
        let Some(state) = self.states.get_mut(&actor) else {
            return;
        };
        let objects = host.objects(actor);
        if !source.is_game() {
            let applier = StateApplier::new(&self.catalog, &self.config);
            let changed = before.diff(state.model()) & touched;
            if !applier.apply_fields(host, &objects, state.model(), changed) {
                for field in (changed & FieldMask::colors()).iter() {
                    StateEditor::mark_pending(state, field);
                }
                debug!("colors of {actor} pending until drawn");
            }
        }
        emit_changes(&mut self.events, state, kind, before, touched, &objects);
    }

    fn finish_reset(
        &mut self,
        host: &mut impl Host,
        actor: ActorId,
        before: &Snapshot,
        touched: FieldMask,
    ) {
        let Some(state) = self.states.get(&actor) else {
            return;
        };
        let objects = host.objects(actor);
        let changed = before.diff(state.model()) & touched;
        StateApplier::new(&self.catalog, &self.config).apply_fields(
            host,
            &objects,
            state.model(),
            changed,
        );
        emit_changes(&mut self.events, state, ChangeKind::Reset, before, touched, &objects);
    }

    /// Records a host-driven change in base, then lets the model follow unless
    /// `keep` says the override survives. `keep` sees the state after the base
    /// write.
    ///
    /// Returns the model value afterwards.
    pub(crate) fn absorb(
        &mut self,
        host: &impl Host,
        actor: ActorId,
        field: FieldIndex,
        value: FieldValue,
        keep: impl FnOnce(&ActorState) -> bool,
    ) -> Option<FieldValue> {
        let state = self.states.get_mut(&actor)?;
        let before = state.model().clone();
        StateEditor::commit_base(state, field, value).ok()?;
        if !keep(state) {
            StateEditor::follow_base(state, field);
        }
        if !before.same(state.model(), field) {
            let objects = host.objects(actor);
            emit_changes(
                &mut self.events,
                state,
                ChangeKind::Host,
                &before,
                FieldMask::single(field),
                &objects,
            );
        }
        Some(state.model().value(field))
    }
}

/// Logs a rejected edit and passes the error on.
fn rejected(actor: ActorId, err: StateError) -> StateError {
    warn!("edit on {actor} rejected: {err}");
    err
}

/// Emits one event per field of `touched` whose model value differs from
/// `before`. Writes that land on the current value stay silent.
fn emit_changes(
    events: &mut EventBus,
    state: &ActorState,
    kind: ChangeKind,
    before: &Snapshot,
    touched: FieldMask,
    objects: &[ObjectHandle],
) {
    if events.is_empty() {
        return;
    }
    for field in touched.iter().filter(|field| !before.same(state.model(), *field)) {
        events.emit(&StateEvent {
            actor: state.id(),
            kind,
            field,
            old: before.value(field),
            new: state.model().value(field),
            source: state.source(field),
            objects: objects.to_vec(),
        });
    }
}
