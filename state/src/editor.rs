//! Mutation primitives over a single [`ActorState`].
//!
//! Every write checks the edit lock first and fails without touching the state.
//! Writes with a game source land in both snapshots, so a field sourced from the
//! game never diverges from base.

use fields::{
    AppearanceIndex, AppearanceMask, ColorParam, CrestSlot, EquipSlot, Field, FieldIndex,
    FieldMask, MetaIndex, StateSource,
};

use crate::actor::ActorState;
use crate::appearance::{Appearance, AppearanceRules};
use crate::error::{StateError, StateResult};
use crate::snapshot::{body_fields, FieldValue, Snapshot};
use crate::types::{ColorValue, EquipItem, LockKey, ModelId, StainId};

/// Who is writing and under which lock key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditContext {
    pub source: StateSource,
    pub key: LockKey,
    /// Set while the actor is inside a free transformation window, which lifts
    /// the weapon-family check.
    pub free_transform: bool,
}

impl EditContext {
    #[must_use]
    pub const fn new(source: StateSource) -> Self {
        Self {
            source,
            key: LockKey::NONE,
            free_transform: false,
        }
    }

    #[must_use]
    pub const fn manual() -> Self {
        Self::new(StateSource::Manual)
    }

    #[must_use]
    pub const fn fixed() -> Self {
        Self::new(StateSource::Fixed)
    }

    #[must_use]
    pub const fn game() -> Self {
        Self::new(StateSource::Game)
    }

    #[must_use]
    pub const fn with_key(mut self, key: LockKey) -> Self {
        self.key = key;
        self
    }

    #[must_use]
    pub const fn in_free_transform(mut self, free: bool) -> Self {
        self.free_transform = free;
        self
    }
}

impl Default for EditContext {
    fn default() -> Self {
        Self::manual()
    }
}

/// Result of an appearance edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppearanceChange {
    /// The model appearance before the edit.
    pub old: Appearance,
    /// Indices whose model value changed, including clamped dependents.
    pub changed: AppearanceMask,
}

impl AppearanceChange {
    #[must_use]
    pub fn requires_rebuild(&self) -> bool {
        self.changed.requires_rebuild()
    }
}

/// Host-agnostic edit operations.
pub struct StateEditor;

impl StateEditor {
    fn check(state: &ActorState, ctx: EditContext) -> StateResult<()> {
        if state.can_edit(ctx.key) {
            Ok(())
        } else {
            Err(StateError::Locked { actor: state.id })
        }
    }

    /// Records `source` for every field in `fields`, committing game writes to base.
    fn settle(state: &mut ActorState, fields: FieldMask, source: StateSource) {
        for field in fields.iter() {
            state.sources.set(field, source);
            if source.is_game() {
                state.base.copy_field(&state.model, field);
            }
        }
    }

    fn check_family(
        state: &ActorState,
        slot: EquipSlot,
        item: &EquipItem,
        ctx: EditContext,
    ) -> StateResult<()> {
        if !slot.is_weapon() || ctx.free_transform {
            return Ok(());
        }
        let expected = state.base.item(slot).family;
        if item.family == expected {
            Ok(())
        } else {
            Err(StateError::WeaponFamilyMismatch {
                slot,
                expected,
                found: item.family,
            })
        }
    }

    /// Changes one equipment item, returning the previous model item.
    pub fn change_item(
        state: &mut ActorState,
        slot: EquipSlot,
        item: EquipItem,
        ctx: EditContext,
    ) -> StateResult<EquipItem> {
        Self::check(state, ctx)?;
        Self::check_family(state, slot, &item, ctx)?;
        let old = state.model.set_item(slot, item);
        Self::settle(state, FieldMask::single(FieldIndex::equip(slot)), ctx.source);
        Ok(old)
    }

    /// Changes one stain, returning the previous model stain.
    pub fn change_stain(
        state: &mut ActorState,
        slot: EquipSlot,
        stain: StainId,
        ctx: EditContext,
    ) -> StateResult<StainId> {
        Self::check(state, ctx)?;
        let old = state.model.set_stain(slot, stain);
        Self::settle(state, FieldMask::single(FieldIndex::stain(slot)), ctx.source);
        Ok(old)
    }

    /// Changes an item and its stain together. Either both are written or neither.
    pub fn change_equip(
        state: &mut ActorState,
        slot: EquipSlot,
        item: EquipItem,
        stain: StainId,
        ctx: EditContext,
    ) -> StateResult<(EquipItem, StainId)> {
        Self::check(state, ctx)?;
        Self::check_family(state, slot, &item, ctx)?;
        let old_item = state.model.set_item(slot, item);
        let old_stain = state.model.set_stain(slot, stain);
        Self::settle(state, FieldMask::from(slot), ctx.source);
        Ok((old_item, old_stain))
    }

    /// Changes one appearance value.
    ///
    /// Identity changes re-validate every other value, so the returned mask may
    /// contain more than `index`.
    pub fn change_appearance(
        state: &mut ActorState,
        index: AppearanceIndex,
        value: u8,
        rules: &dyn AppearanceRules,
        ctx: EditContext,
    ) -> StateResult<AppearanceChange> {
        Self::check(state, ctx)?;
        let old = *state.model.appearance();
        let mut next = old;
        next.set(index, value);
        if !rules.is_valid(&next, index, value) {
            return Err(StateError::InvalidAppearance { index, value });
        }
        if index.is_identity() {
            rules.fix(&mut next);
        }
        Ok(Self::commit_appearance(state, old, next, ctx.source))
    }

    /// Changes every appearance value selected by `mask`.
    ///
    /// The identity part of `mask` is applied first and must be legal as a whole.
    /// Remaining values are filtered through `rules`; illegal ones are skipped.
    pub fn change_appearance_all(
        state: &mut ActorState,
        appearance: &Appearance,
        mask: AppearanceMask,
        rules: &dyn AppearanceRules,
        ctx: EditContext,
    ) -> StateResult<AppearanceChange> {
        Self::check(state, ctx)?;
        let old = *state.model.appearance();
        let mut next = old;
        let identity: AppearanceMask = AppearanceIndex::IDENTITY.into_iter().collect();
        let identity = identity & mask;
        if !identity.is_empty() {
            next.copy_from(appearance, identity);
            if !rules.identity_valid(&next) {
                return Err(StateError::InvalidIdentity);
            }
        }
        for index in mask.iter().filter(|index| !index.is_identity()) {
            let value = appearance.get(index);
            if rules.is_valid(&next, index, value) {
                next.set(index, value);
            }
        }
        rules.fix(&mut next);
        Ok(Self::commit_appearance(state, old, next, ctx.source))
    }

    fn commit_appearance(
        state: &mut ActorState,
        old: Appearance,
        next: Appearance,
        source: StateSource,
    ) -> AppearanceChange {
        let changed = old.diff(&next);
        state.model.set_appearance(next);
        Self::settle(state, FieldMask::from(changed), source);
        AppearanceChange { old, changed }
    }

    pub fn change_crest(
        state: &mut ActorState,
        slot: CrestSlot,
        visible: bool,
        ctx: EditContext,
    ) -> StateResult<bool> {
        Self::check(state, ctx)?;
        let old = state.model.set_crest(slot, visible);
        Self::settle(state, FieldMask::from(slot), ctx.source);
        Ok(old)
    }

    /// Changes a boolean meta flag. The model identity goes through
    /// [`StateEditor::change_model_id`].
    pub fn change_meta(
        state: &mut ActorState,
        flag: MetaIndex,
        value: bool,
        ctx: EditContext,
    ) -> StateResult<bool> {
        if !flag.is_flag() {
            return Err(StateError::ValueKindMismatch {
                field: FieldIndex::meta(flag),
                found: "flag",
            });
        }
        Self::check(state, ctx)?;
        let old = state.model.set_meta(flag, value);
        Self::settle(state, FieldMask::from(flag), ctx.source);
        Ok(old)
    }

    pub fn change_color(
        state: &mut ActorState,
        param: ColorParam,
        value: ColorValue,
        ctx: EditContext,
    ) -> StateResult<ColorValue> {
        Self::check(state, ctx)?;
        let old = state.model.set_color(param, value);
        Self::settle(state, FieldMask::from(param), ctx.source);
        Ok(old)
    }

    /// Changes the model identity.
    ///
    /// Crossing between humanoid and non-humanoid replaces appearance, equipment
    /// and meta flags in one step: from `defaults` when becoming non-humanoid,
    /// from base (or `defaults` if base is not humanoid) when returning. Every
    /// replaced field takes the edit's source. Returns the fields that were
    /// assigned.
    pub fn change_model_id(
        state: &mut ActorState,
        model_id: ModelId,
        defaults: &Snapshot,
        ctx: EditContext,
    ) -> StateResult<FieldMask> {
        Self::check(state, ctx)?;
        let was_human = state.model.is_human();
        let mut next = state.model.clone();
        next.set_model_id(model_id);
        let assigned = match (was_human, model_id.is_human()) {
            (true, false) => {
                next.copy_body(defaults);
                body_fields()
            }
            (false, true) => {
                let source = if state.base.is_human() {
                    &state.base
                } else {
                    defaults
                };
                next.copy_body(source);
                body_fields()
            }
            _ => FieldMask::single(FieldIndex::MODEL_ID),
        };
        state.model = next;
        Self::settle(state, assigned, ctx.source);
        Ok(assigned)
    }

    /// Writes any field from a [`FieldValue`].
    ///
    /// Model identities are routed through [`StateEditor::change_model_id`] with
    /// the current model as defaults, so no cascade happens.
    pub fn change_value(
        state: &mut ActorState,
        field: FieldIndex,
        value: FieldValue,
        ctx: EditContext,
    ) -> StateResult<FieldValue> {
        Self::check(state, ctx)?;
        if let FieldValue::Item(item) = &value {
            if let Field::Equip(slot) = field.field() {
                Self::check_family(state, slot, item, ctx)?;
            }
        }
        let old = state.model.set_value(field, value)?;
        Self::settle(state, FieldMask::single(field), ctx.source);
        Ok(old)
    }

    /// Copies one base field back into the model with a game source.
    ///
    /// Resetting the model identity also resets everything it cascades into.
    /// Returns the fields whose model value changed.
    pub fn reset_field(
        state: &mut ActorState,
        field: FieldIndex,
        key: LockKey,
    ) -> StateResult<FieldMask> {
        Self::check(state, EditContext::game().with_key(key))?;
        let fields = if field == FieldIndex::MODEL_ID {
            body_fields()
        } else {
            FieldMask::single(field)
        };
        let mut changed = FieldMask::EMPTY;
        for field in fields.iter() {
            if state.model.copy_field(&state.base, field) {
                changed.insert(field);
            }
            state.sources.set(field, StateSource::Game);
        }
        Ok(changed)
    }

    /// Resets the whole model to base. Returns the fields whose model value changed.
    pub fn reset_all(state: &mut ActorState, key: LockKey) -> StateResult<FieldMask> {
        Self::check(state, EditContext::game().with_key(key))?;
        let changed = state.model.diff(&state.base);
        state.model = state.base.clone();
        state.sources.set_all(StateSource::Game);
        Ok(changed)
    }

    /// Records a value the unmodified host now displays.
    ///
    /// Mirrors host state, so the edit lock does not apply. Game-sourced model
    /// fields follow immediately. Returns the previous base value.
    pub fn commit_base(
        state: &mut ActorState,
        field: FieldIndex,
        value: FieldValue,
    ) -> StateResult<FieldValue> {
        let old = state.base.set_value(field, value)?;
        if state.sources.get(field).is_game() {
            state.model.copy_field(&state.base, field);
        }
        Ok(old)
    }

    /// Replaces the whole base snapshot, e.g. after the host rebuilt the actor.
    ///
    /// Returns the base fields that changed.
    pub fn rebuild_base(state: &mut ActorState, base: Snapshot) -> FieldMask {
        let changed = state.base.diff(&base);
        state.base = base;
        for (field, source) in state.sources.iter() {
            if source.is_game() {
                state.model.copy_field(&state.base, field);
            }
        }
        changed
    }

    /// Lets the model follow base for one field, dropping any override.
    ///
    /// Returns `true` if the model value changed.
    pub fn follow_base(state: &mut ActorState, field: FieldIndex) -> bool {
        state.sources.set(field, StateSource::Game);
        state.model.copy_field(&state.base, field)
    }

    /// Demotes every fixed source to manual. Returns the number of fields touched.
    pub fn remove_fixed(state: &mut ActorState, key: LockKey) -> StateResult<usize> {
        Self::check(state, EditContext::game().with_key(key))?;
        Ok(state.sources.remove_fixed())
    }

    /// Marks a pending field as applied.
    pub fn collapse_pending(state: &mut ActorState, field: FieldIndex) -> bool {
        state.sources.collapse_pending(field)
    }

    /// Overrides the source of one field without touching values.
    ///
    /// Used to mark writes that the host has not applied yet as pending.
    pub fn mark_pending(state: &mut ActorState, field: FieldIndex) -> StateSource {
        let source = state.sources.get(field);
        state.sources.set(field, source.to_pending());
        source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appearance::{StandardRules, RACE_MIQOTE};
    use crate::types::{ActorId, ItemId, WeaponFamily};

    fn sword(id: u32) -> EquipItem {
        EquipItem {
            id: ItemId(id),
            primary: 201,
            secondary: 1,
            variant: 1,
            family: WeaponFamily(2),
        }
    }

    fn staff() -> EquipItem {
        EquipItem {
            id: ItemId(900),
            primary: 801,
            secondary: 1,
            variant: 1,
            family: WeaponFamily(8),
        }
    }

    fn state() -> ActorState {
        let mut base = Snapshot::new();
        base.set_item(EquipSlot::MainHand, sword(1));
        ActorState::new(ActorId::new(1), base)
    }

    #[test]
    fn manual_item_edit_sets_source() {
        let mut state = state();
        let hat = EquipItem {
            id: ItemId(5),
            primary: 5,
            ..EquipItem::NOTHING
        };
        let old = StateEditor::change_item(&mut state, EquipSlot::Head, hat, EditContext::manual())
            .unwrap();
        assert_eq!(old, EquipItem::NOTHING);
        let field = FieldIndex::equip(EquipSlot::Head);
        assert_eq!(state.source(field), StateSource::Manual);
        assert_eq!(*state.model().item(EquipSlot::Head), hat);
        assert_eq!(*state.base().item(EquipSlot::Head), EquipItem::NOTHING);
        assert!(state.is_consistent());
    }

    #[test]
    fn locked_state_rejects_other_keys() {
        let mut state = state();
        assert!(state.lock(LockKey::new(9)));
        let err = StateEditor::change_stain(
            &mut state,
            EquipSlot::Body,
            StainId(4),
            EditContext::manual(),
        )
        .unwrap_err();
        assert!(err.is_locked());
        assert_eq!(state.model().stain(EquipSlot::Body), StainId(0));

        let ctx = EditContext::manual().with_key(LockKey::new(9));
        StateEditor::change_stain(&mut state, EquipSlot::Body, StainId(4), ctx).unwrap();
        assert_eq!(state.model().stain(EquipSlot::Body), StainId(4));
    }

    #[test]
    fn weapon_family_is_enforced() {
        let mut state = state();
        let err = StateEditor::change_item(
            &mut state,
            EquipSlot::MainHand,
            staff(),
            EditContext::manual(),
        )
        .unwrap_err();
        assert!(matches!(err, StateError::WeaponFamilyMismatch { .. }));

        StateEditor::change_item(&mut state, EquipSlot::MainHand, sword(2), EditContext::manual())
            .unwrap();
        let ctx = EditContext::manual().in_free_transform(true);
        StateEditor::change_item(&mut state, EquipSlot::MainHand, staff(), ctx).unwrap();
        assert_eq!(state.model().item(EquipSlot::MainHand).family, WeaponFamily(8));
        assert_eq!(state.base().item(EquipSlot::MainHand).family, WeaponFamily(2));
    }

    #[test]
    fn change_equip_is_all_or_nothing() {
        let mut state = state();
        let err = StateEditor::change_equip(
            &mut state,
            EquipSlot::MainHand,
            staff(),
            StainId(3),
            EditContext::manual(),
        );
        assert!(err.is_err());
        assert_eq!(state.model().stain(EquipSlot::MainHand), StainId(0));
    }

    #[test]
    fn invalid_appearance_is_rejected_before_write() {
        let mut state = state();
        let err = StateEditor::change_appearance(
            &mut state,
            AppearanceIndex::Face,
            9,
            &StandardRules,
            EditContext::manual(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            StateError::InvalidAppearance {
                index: AppearanceIndex::Face,
                value: 9
            }
        );
        assert_eq!(state.model(), state.base());
    }

    #[test]
    fn race_change_clamps_dependents() {
        let mut state = state();
        let change = StateEditor::change_appearance(
            &mut state,
            AppearanceIndex::Race,
            RACE_MIQOTE,
            &StandardRules,
            EditContext::manual(),
        )
        .unwrap();
        assert!(change.changed.contains(AppearanceIndex::Race));
        assert!(change.changed.contains(AppearanceIndex::Clan));
        assert!(change.changed.contains(AppearanceIndex::TailShape));
        assert!(change.requires_rebuild());
        assert_eq!(state.model().appearance().clan(), 7);
        let clan = FieldIndex::appearance(AppearanceIndex::Clan);
        assert_eq!(state.source(clan), StateSource::Manual);
        assert!(state.is_consistent());
    }

    #[test]
    fn appearance_all_only_marks_changed_fields() {
        let mut state = state();
        let mut wanted = *state.model().appearance();
        wanted.set(AppearanceIndex::HairColor, 40);
        wanted.set(AppearanceIndex::Eyebrows, 200);
        let mask = AppearanceMask::single(AppearanceIndex::HairColor)
            | AppearanceMask::single(AppearanceIndex::Eyebrows)
            | AppearanceMask::single(AppearanceIndex::Height);
        let change = StateEditor::change_appearance_all(
            &mut state,
            &wanted,
            mask,
            &StandardRules,
            EditContext::fixed(),
        )
        .unwrap();
        assert_eq!(change.changed, AppearanceMask::single(AppearanceIndex::HairColor));
        let height = FieldIndex::appearance(AppearanceIndex::Height);
        assert_eq!(state.source(height), StateSource::Game);
        let hair = FieldIndex::appearance(AppearanceIndex::HairColor);
        assert_eq!(state.source(hair), StateSource::Fixed);
    }

    #[test]
    fn appearance_all_rejects_illegal_identity() {
        let mut state = state();
        let mut wanted = *state.model().appearance();
        wanted.set(AppearanceIndex::Race, RACE_MIQOTE);
        let err = StateEditor::change_appearance_all(
            &mut state,
            &wanted,
            AppearanceMask::ALL,
            &StandardRules,
            EditContext::manual(),
        )
        .unwrap_err();
        assert_eq!(err, StateError::InvalidIdentity);
        assert_eq!(state.model(), state.base());
    }

    #[test]
    fn meta_rejects_model_identity() {
        let mut state = state();
        let err =
            StateEditor::change_meta(&mut state, MetaIndex::ModelId, true, EditContext::manual())
                .unwrap_err();
        assert!(matches!(err, StateError::ValueKindMismatch { .. }));
    }

    #[test]
    fn game_source_writes_both_snapshots() {
        let mut state = state();
        StateEditor::change_crest(&mut state, CrestSlot::Body, true, EditContext::game()).unwrap();
        assert!(state.base().crest(CrestSlot::Body));
        assert!(state.model().crest(CrestSlot::Body));
        assert!(state.is_consistent());
    }

    #[test]
    fn becoming_non_human_cascades() {
        let mut state = state();
        let mut defaults = Snapshot::new();
        defaults.set_meta(MetaIndex::HatVisible, true);
        let assigned = StateEditor::change_model_id(
            &mut state,
            ModelId(1234),
            &defaults,
            EditContext::manual(),
        )
        .unwrap();
        assert_eq!(assigned, body_fields());
        assert_eq!(state.model().model_id(), ModelId(1234));
        assert_eq!(
            *state.model().item(EquipSlot::MainHand),
            EquipItem::NOTHING
        );
        for field in body_fields().iter() {
            assert_eq!(state.source(field), StateSource::Manual, "{field}");
        }
        assert!(state.is_consistent());

        let assigned =
            StateEditor::change_model_id(&mut state, ModelId::HUMAN, &defaults, EditContext::manual())
                .unwrap();
        assert_eq!(assigned, body_fields());
        assert_eq!(*state.model().item(EquipSlot::MainHand), sword(1));
    }

    #[test]
    fn reset_restores_base() {
        let mut state = state();
        StateEditor::change_stain(&mut state, EquipSlot::Legs, StainId(7), EditContext::fixed())
            .unwrap();
        StateEditor::change_meta(&mut state, MetaIndex::Wetness, true, EditContext::manual())
            .unwrap();

        let changed =
            StateEditor::reset_field(&mut state, FieldIndex::stain(EquipSlot::Legs), LockKey::NONE)
                .unwrap();
        assert_eq!(changed.len(), 1);
        assert_eq!(state.model().stain(EquipSlot::Legs), StainId(0));

        let changed = StateEditor::reset_all(&mut state, LockKey::NONE).unwrap();
        assert_eq!(changed, FieldMask::from(MetaIndex::Wetness));
        assert_eq!(state.model(), state.base());
        assert_eq!(state.sources().count(StateSource::is_game), FieldIndex::COUNT);
    }

    #[test]
    fn commit_base_drags_game_fields_only() {
        let mut state = state();
        StateEditor::change_stain(&mut state, EquipSlot::Feet, StainId(3), EditContext::manual())
            .unwrap();
        let feet = FieldIndex::stain(EquipSlot::Feet);
        let hands = FieldIndex::stain(EquipSlot::Hands);

        StateEditor::commit_base(&mut state, feet, FieldValue::Stain(StainId(9))).unwrap();
        StateEditor::commit_base(&mut state, hands, FieldValue::Stain(StainId(9))).unwrap();

        assert_eq!(state.model().stain(EquipSlot::Feet), StainId(3));
        assert_eq!(state.model().stain(EquipSlot::Hands), StainId(9));
        assert!(StateEditor::follow_base(&mut state, feet));
        assert_eq!(state.source(feet), StateSource::Game);
        assert!(state.is_consistent());
    }

    #[test]
    fn rebuild_base_keeps_overrides() {
        let mut state = state();
        StateEditor::change_meta(&mut state, MetaIndex::VisorToggled, true, EditContext::manual())
            .unwrap();
        let mut fresh = Snapshot::new();
        fresh.set_stain(EquipSlot::Body, StainId(2));
        let changed = StateEditor::rebuild_base(&mut state, fresh);
        assert!(changed.contains(FieldIndex::stain(EquipSlot::Body)));
        assert!(state.model().meta().visor_toggled);
        assert_eq!(state.model().stain(EquipSlot::Body), StainId(2));
        assert!(state.is_consistent());
    }

    #[test]
    fn pending_marks_collapse() {
        let mut state = state();
        let field = FieldIndex::color(ColorParam::HairDiffuse);
        StateEditor::change_color(
            &mut state,
            ColorParam::HairDiffuse,
            ColorValue([1; 16]),
            EditContext::manual(),
        )
        .unwrap();
        assert_eq!(StateEditor::mark_pending(&mut state, field), StateSource::Manual);
        assert_eq!(state.source(field), StateSource::ManualPending);
        assert!(StateEditor::collapse_pending(&mut state, field));
        assert_eq!(state.source(field), StateSource::Manual);
    }

    #[test]
    fn remove_fixed_demotes() {
        let mut state = state();
        StateEditor::change_crest(&mut state, CrestSlot::Head, true, EditContext::fixed()).unwrap();
        assert_eq!(StateEditor::remove_fixed(&mut state, LockKey::NONE).unwrap(), 1);
        assert_eq!(
            state.source(FieldIndex::crest(CrestSlot::Head)),
            StateSource::Manual
        );
    }
}
