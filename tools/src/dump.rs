//! Serializable snapshots of the actor registry.

use std::fmt::Write as _;

use anyhow::{bail, Context, Result};
use engine::{Catalog, StateManager};
use fields::{layout_hash, Field, FieldIndex, StateSource};
use serde::{Deserialize, Serialize};
use state::{ActorState, FieldValue};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDump {
    /// [`fields::layout_hash`] of the writer.
    pub layout_hash: u64,
    pub actors: Vec<ActorDump>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorDump {
    pub actor: u64,
    pub locked: bool,
    /// Every game-sourced field matches its base value.
    pub consistent: bool,
    pub overrides: Vec<FieldDump>,
}

/// A field whose source is not the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDump {
    pub field: String,
    pub source: StateSource,
    pub model: FieldValue,
    pub base: FieldValue,
}

impl StateDump {
    pub fn capture<C: Catalog>(manager: &StateManager<C>) -> Self {
        let mut actors: Vec<_> = manager.iter().map(ActorDump::capture).collect();
        actors.sort_by_key(|actor| actor.actor);
        Self {
            layout_hash: layout_hash(),
            actors,
        }
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let dump: Self = serde_json::from_str(contents).context("parse state dump json")?;
        if dump.layout_hash != layout_hash() {
            bail!(
                "dump layout 0x{:016x} does not match this build (0x{:016x})",
                dump.layout_hash,
                layout_hash()
            );
        }
        for actor in &dump.actors {
            for field in &actor.overrides {
                if Field::parse(&field.field).is_none() {
                    bail!("actor {} has unknown field {}", actor.actor, field.field);
                }
            }
        }
        Ok(dump)
    }
}

impl ActorDump {
    fn capture(state: &ActorState) -> Self {
        let overrides = FieldIndex::all()
            .filter(|field| !state.source(*field).is_game())
            .map(|field| FieldDump {
                field: field.to_string(),
                source: state.source(field),
                model: state.model().value(field),
                base: state.base().value(field),
            })
            .collect();
        Self {
            actor: state.id().raw(),
            locked: state.is_locked(),
            consistent: state.is_consistent(),
            overrides,
        }
    }
}

/// Renders a dump for humans, one line per overridden field.
pub fn format_dump_pretty(dump: &StateDump) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "layout: 0x{:016x} actors: {}",
        dump.layout_hash,
        dump.actors.len()
    );
    for actor in &dump.actors {
        let mut flags = Vec::new();
        if actor.locked {
            flags.push("locked");
        }
        if !actor.consistent {
            flags.push("INCONSISTENT");
        }
        let _ = writeln!(
            out,
            "actor {} overrides: {} {}",
            actor.actor,
            actor.overrides.len(),
            flags.join(" ")
        );
        for field in &actor.overrides {
            let _ = writeln!(
                out,
                "  {:<28} {:<16} {:?} (base {:?})",
                field.field,
                field.source.name(),
                field.model,
                field.base
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::EngineConfig;
    use fields::EquipSlot;
    use sim::{human_sample, SimCatalog, SimHost};
    use state::{ActorId, EditContext, StainId};

    fn dump_with_override() -> StateDump {
        let mut host = SimHost::new();
        let actor = ActorId::new(3);
        host.spawn(actor, human_sample());
        let mut manager = StateManager::new(EngineConfig::for_testing(), SimCatalog::new());
        manager.get_or_create(&host, actor).unwrap();
        manager
            .change_stain(&mut host, actor, EquipSlot::Feet, StainId(6), EditContext::fixed())
            .unwrap();
        StateDump::capture(&manager)
    }

    #[test]
    fn captures_only_overridden_fields() {
        let dump = dump_with_override();
        assert_eq!(dump.layout_hash, layout_hash());
        let actor = &dump.actors[0];
        assert_eq!(actor.actor, 3);
        assert_eq!(actor.overrides.len(), 1);
        let field = &actor.overrides[0];
        assert_eq!(field.field, "stain:feet");
        assert_eq!(field.source, StateSource::Fixed);
        assert_eq!(field.model, FieldValue::Stain(StainId(6)));
        assert_eq!(field.base, FieldValue::Stain(StainId(0)));
    }

    #[test]
    fn rejects_foreign_layouts() {
        let mut dump = dump_with_override();
        let json = serde_json::to_string(&dump).unwrap();
        assert_eq!(StateDump::from_json(&json).unwrap(), dump);

        dump.layout_hash ^= 1;
        let json = serde_json::to_string(&dump).unwrap();
        let err = StateDump::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn pretty_output_lists_fields() {
        let text = format_dump_pretty(&dump_with_override());
        assert!(text.contains("actor 3 overrides: 1"));
        assert!(text.contains("stain:feet"));
        assert!(text.contains("Fixed") || text.contains("fixed"));
    }
}
