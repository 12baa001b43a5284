//! Scripted scenarios replayed against the in-memory host.
//!
//! A scenario is a JSON document with an optional engine configuration and a
//! list of steps. Objects are addressed by the handle the host hands out, which
//! counts up from 1 in spawn order.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use engine::{EngineConfig, Host, StateEvent, StateListener, StateManager};
use fields::{AppearanceIndex, EquipSlot, Field, MetaIndex, StateSource};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sim::{armor, display, human_sample, weapon, SimCatalog, SimHost};
use state::{ActorId, EditContext, LockKey, ModelId, ObjectHandle, StainId, StateResult, Weapon};

use crate::dump::StateDump;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub config: EngineConfig,
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("parse scenario json")
    }
}

const fn manual() -> StateSource {
    StateSource::Manual
}

/// One scripted action.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Step {
    Spawn {
        actor: u64,
        #[serde(default)]
        pose_copy: bool,
    },
    Despawn {
        object: u32,
    },
    Track {
        actor: u64,
    },
    Release {
        actor: u64,
    },
    Lock {
        actor: u64,
        key: u64,
    },
    Unlock {
        actor: u64,
        key: u64,
    },
    Stain {
        actor: u64,
        slot: EquipSlot,
        stain: u8,
        #[serde(default = "manual")]
        source: StateSource,
        #[serde(default)]
        key: u64,
    },
    Appearance {
        actor: u64,
        index: AppearanceIndex,
        value: u8,
        #[serde(default = "manual")]
        source: StateSource,
        #[serde(default)]
        key: u64,
    },
    Meta {
        actor: u64,
        flag: MetaIndex,
        value: bool,
        #[serde(default = "manual")]
        source: StateSource,
        #[serde(default)]
        key: u64,
    },
    Model {
        actor: u64,
        id: u32,
        #[serde(default = "manual")]
        source: StateSource,
        #[serde(default)]
        key: u64,
    },
    /// Resets one field, named as in state dumps (`stain:body`).
    Reset {
        actor: u64,
        field: String,
        #[serde(default)]
        key: u64,
    },
    ResetAll {
        actor: u64,
        #[serde(default)]
        key: u64,
    },
    RemoveFixed {
        actor: u64,
        #[serde(default)]
        key: u64,
    },
    /// The host's own record changes, as when the player swaps gear in game.
    HostWears {
        object: u32,
        slot: EquipSlot,
        set: u16,
        #[serde(default)]
        stain: u8,
    },
    JobChange {
        object: u32,
        family: u16,
    },
    Transform {
        object: u32,
        on: bool,
    },
    PlayerNpc {
        object: u32,
        on: bool,
    },
    OpenWindow {
        actor: u64,
    },
    CloseWindow {
        actor: u64,
    },
    /// Runs a full creation pass for the object.
    Pass {
        object: u32,
    },
}

impl Step {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "spawn",
            Self::Despawn { .. } => "despawn",
            Self::Track { .. } => "track",
            Self::Release { .. } => "release",
            Self::Lock { .. } => "lock",
            Self::Unlock { .. } => "unlock",
            Self::Stain { .. } => "stain",
            Self::Appearance { .. } => "appearance",
            Self::Meta { .. } => "meta",
            Self::Model { .. } => "model",
            Self::Reset { .. } => "reset",
            Self::ResetAll { .. } => "reset-all",
            Self::RemoveFixed { .. } => "remove-fixed",
            Self::HostWears { .. } => "host-wears",
            Self::JobChange { .. } => "job-change",
            Self::Transform { .. } => "transform",
            Self::PlayerNpc { .. } => "player-npc",
            Self::OpenWindow { .. } => "open-window",
            Self::CloseWindow { .. } => "close-window",
            Self::Pass { .. } => "pass",
        }
    }
}

/// What one step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub op: &'static str,
    /// `None` when the step succeeded, otherwise the rejection.
    pub error: Option<String>,
    pub effects: usize,
    pub events: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepReport>,
    pub events: Vec<StateEvent>,
    pub rewrites: u64,
    pub dump: StateDump,
}

impl ReplayReport {
    pub fn rejected(&self) -> usize {
        self.steps.iter().filter(|step| step.error.is_some()).count()
    }
}

struct Replay {
    manager: StateManager<SimCatalog>,
    listener: StateListener,
    host: SimHost,
}

/// Replays `scenario` from an empty world.
///
/// Engine rejections are recorded in the step report and replay continues.
/// Malformed steps, such as a pass over an object that does not exist, abort
/// the replay.
pub fn run_scenario(scenario: &Scenario) -> Result<ReplayReport> {
    let mut replay = Replay {
        manager: StateManager::new(scenario.config, SimCatalog::new()),
        listener: StateListener::new(),
        host: SimHost::new(),
    };
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    replay
        .manager
        .subscribe(move |event: &StateEvent| sink.borrow_mut().push(event.clone()));

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let before = events.borrow().len();
        let outcome = replay
            .step(step)
            .with_context(|| format!("step {index} ({})", step.name()))?;
        let error = outcome.err().map(|err| {
            warn!("step {index} ({}) rejected: {err}", step.name());
            err.to_string()
        });
        let effects = replay.host.take_effects().len();
        let emitted = events.borrow().len() - before;
        debug!(
            "step {index} ({}): {effects} effects, {emitted} events",
            step.name()
        );
        steps.push(StepReport {
            index,
            op: step.name(),
            error,
            effects,
            events: emitted,
        });
    }

    let report = ReplayReport {
        steps,
        events: events.borrow().clone(),
        rewrites: replay.listener.stats().rewrites,
        dump: StateDump::capture(&replay.manager),
    };
    info!(
        "replayed {} steps, {} rejected, {} events",
        report.steps.len(),
        report.rejected(),
        report.events.len()
    );
    Ok(report)
}

fn ctx(source: StateSource, key: u64) -> EditContext {
    EditContext {
        key: LockKey::new(key),
        ..EditContext::new(source)
    }
}

impl Replay {
    /// The outer error aborts the replay; the inner one is an engine rejection.
    fn step(&mut self, step: &Step) -> Result<StateResult<()>> {
        let (manager, host) = (&mut self.manager, &mut self.host);
        let outcome = match *step {
            Step::Spawn { actor, pose_copy } => {
                let actor = ActorId::new(actor);
                let object = if pose_copy {
                    host.spawn_pose_copy(actor, human_sample())
                } else {
                    host.spawn(actor, human_sample())
                };
                debug!("spawned {object:?} for {actor}");
                Ok(())
            }
            Step::Despawn { object } => {
                let object = ObjectHandle::new(object);
                let removed = host
                    .despawn(object)
                    .ok_or_else(|| anyhow!("no object {object:?}"))?;
                self.listener
                    .on_destroyed(manager, host, removed.actor, object);
                Ok(())
            }
            Step::Track { actor } => manager.get_or_create(host, ActorId::new(actor)).map(drop),
            Step::Release { actor } => {
                manager.release(ActorId::new(actor));
                Ok(())
            }
            Step::Lock { actor, key } => manager
                .lock(ActorId::new(actor), LockKey::new(key))
                .map(drop),
            Step::Unlock { actor, key } => manager
                .unlock(ActorId::new(actor), LockKey::new(key))
                .map(drop),
            Step::Stain {
                actor,
                slot,
                stain,
                source,
                key,
            } => manager
                .change_stain(host, ActorId::new(actor), slot, StainId(stain), ctx(source, key))
                .map(drop),
            Step::Appearance {
                actor,
                index,
                value,
                source,
                key,
            } => manager
                .change_appearance(host, ActorId::new(actor), index, value, ctx(source, key))
                .map(drop),
            Step::Meta {
                actor,
                flag,
                value,
                source,
                key,
            } => manager
                .change_meta(host, ActorId::new(actor), flag, value, ctx(source, key))
                .map(drop),
            Step::Model {
                actor,
                id,
                source,
                key,
            } => manager
                .change_model_id(host, ActorId::new(actor), ModelId(id), ctx(source, key))
                .map(drop),
            Step::Reset {
                actor,
                ref field,
                key,
            } => {
                let field = Field::parse(field).ok_or_else(|| anyhow!("unknown field {field}"))?;
                manager
                    .reset_field(host, ActorId::new(actor), field.index(), LockKey::new(key))
                    .map(drop)
            }
            Step::ResetAll { actor, key } => manager
                .reset_all(host, ActorId::new(actor), LockKey::new(key))
                .map(drop),
            Step::RemoveFixed { actor, key } => manager
                .remove_fixed(ActorId::new(actor), LockKey::new(key))
                .map(drop),
            Step::HostWears {
                object,
                slot,
                set,
                stain,
            } => {
                let object = ObjectHandle::new(object);
                let gear = armor(set, stain);
                let cell = host
                    .object_mut(object)
                    .and_then(|o| o.record.armor.get_mut(slot.index()))
                    .ok_or_else(|| anyhow!("{object:?} cannot wear {slot:?}"))?;
                *cell = gear;
                let shown = self
                    .listener
                    .on_equip(manager, host, object, slot, gear)
                    .resolve(gear);
                if let Some(cell) = host
                    .object_mut(object)
                    .and_then(|o| o.shown.armor.get_mut(slot.index()))
                {
                    *cell = shown;
                }
                Ok(())
            }
            Step::JobChange { object, family } => {
                let object = ObjectHandle::new(object);
                let main = weapon(family, 1, 0);
                host.object_mut(object)
                    .ok_or_else(|| anyhow!("no object {object:?}"))?
                    .record
                    .weapons = [main, Weapon::EMPTY];
                let [main_shown, off_shown] =
                    self.listener
                        .on_job_change(manager, host, object, main, Weapon::EMPTY);
                if let Some(o) = host.object_mut(object) {
                    o.shown.weapons = [main_shown.resolve(main), off_shown.resolve(Weapon::EMPTY)];
                }
                Ok(())
            }
            Step::Transform { object, on } => {
                host.set_transformed(ObjectHandle::new(object), on);
                Ok(())
            }
            Step::PlayerNpc { object, on } => {
                host.set_player_npc(ObjectHandle::new(object), on);
                Ok(())
            }
            Step::OpenWindow { actor } => {
                host.open_window(ActorId::new(actor));
                Ok(())
            }
            Step::CloseWindow { actor } => {
                let actor = ActorId::new(actor);
                if host.close_window(actor) {
                    let ran = self.listener.on_window_closed(manager, host, actor);
                    debug!("window for {actor} closed, {ran} deferred actions ran");
                }
                Ok(())
            }
            Step::Pass { object } => {
                let object = ObjectHandle::new(object);
                let proposed = host
                    .sample(object)
                    .ok_or_else(|| anyhow!("no object {object:?}"))?;
                display(manager, &mut self.listener, host, object, &proposed);
                Ok(())
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fields::FieldIndex;

    fn replay(json: &str) -> ReplayReport {
        let scenario = Scenario::from_json(json).unwrap();
        run_scenario(&scenario).unwrap()
    }

    #[test]
    fn parses_tagged_steps() {
        let scenario = Scenario::from_json(
            r#"{"steps": [
                {"op": "spawn", "actor": 1},
                {"op": "stain", "actor": 1, "slot": "Body", "stain": 9, "source": "Fixed"},
                {"op": "host-wears", "object": 1, "slot": "Head", "set": 7}
            ]}"#,
        )
        .unwrap();
        assert_eq!(scenario.config, EngineConfig::default());
        assert_eq!(scenario.steps.len(), 3);
        assert!(matches!(
            scenario.steps[1],
            Step::Stain {
                source: StateSource::Fixed,
                key: 0,
                ..
            }
        ));
        assert!(matches!(scenario.steps[2], Step::HostWears { stain: 0, .. }));
    }

    #[test]
    fn override_survives_host_reassertion() {
        let report = replay(
            r#"{"steps": [
                {"op": "spawn", "actor": 1},
                {"op": "track", "actor": 1},
                {"op": "stain", "actor": 1, "slot": "Body", "stain": 9},
                {"op": "pass", "object": 1},
                {"op": "pass", "object": 1}
            ]}"#,
        );
        assert_eq!(report.rejected(), 0);
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].field, FieldIndex::stain(EquipSlot::Body));

        let actor = &report.dump.actors[0];
        assert!(actor.consistent);
        assert_eq!(actor.overrides.len(), 1);
        assert_eq!(actor.overrides[0].field, "stain:body");
        assert_eq!(actor.overrides[0].source, StateSource::Manual);
    }

    #[test]
    fn rejections_are_reported_not_fatal() {
        let report = replay(
            r#"{"steps": [
                {"op": "spawn", "actor": 1},
                {"op": "track", "actor": 1},
                {"op": "lock", "actor": 1, "key": 5},
                {"op": "stain", "actor": 1, "slot": "Body", "stain": 9},
                {"op": "stain", "actor": 1, "slot": "Body", "stain": 9, "key": 5}
            ]}"#,
        );
        assert_eq!(report.rejected(), 1);
        assert!(report.steps[3].error.is_some());
        assert_eq!(report.steps[4].error, None);
        assert!(report.dump.actors[0].locked);
    }

    #[test]
    fn malformed_steps_abort() {
        let scenario = Scenario::from_json(r#"{"steps": [{"op": "pass", "object": 4}]}"#).unwrap();
        let err = run_scenario(&scenario).unwrap_err();
        assert!(format!("{err:#}").contains("step 0 (pass)"));

        let scenario = Scenario::from_json(
            r#"{"steps": [
                {"op": "spawn", "actor": 1},
                {"op": "track", "actor": 1},
                {"op": "reset", "actor": 1, "field": "stain:elbow"}
            ]}"#,
        )
        .unwrap();
        assert!(run_scenario(&scenario).is_err());
    }

    #[test]
    fn host_gear_change_is_followed() {
        let report = replay(
            r#"{"steps": [
                {"op": "spawn", "actor": 1},
                {"op": "track", "actor": 1},
                {"op": "host-wears", "object": 1, "slot": "Legs", "set": 40, "stain": 3}
            ]}"#,
        );
        let actor = &report.dump.actors[0];
        assert!(actor.consistent);
        assert!(actor.overrides.is_empty());
        assert_eq!(report.events.len(), 2);
    }
}
