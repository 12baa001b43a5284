//! Whole-actor designs supplied by the automation layer.

use fields::FieldMask;
use state::{ActorState, Snapshot};

/// A snapshot plus the fields it wants applied.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Design {
    pub data: Snapshot,
    #[cfg_attr(feature = "serde", serde(with = "mask_names"))]
    pub apply: FieldMask,
}

impl Design {
    #[must_use]
    pub const fn new(data: Snapshot, apply: FieldMask) -> Self {
        Self { data, apply }
    }

    /// Captures an actor's model snapshot with every field selected.
    #[must_use]
    pub fn from_model(state: &ActorState) -> Self {
        Self::new(state.model().clone(), FieldMask::ALL)
    }

    /// Captures only the fields where the model overrides base.
    #[must_use]
    pub fn from_overrides(state: &ActorState) -> Self {
        Self::new(state.model().clone(), state.overrides())
    }

    /// The fields this design applies when the caller wants `wanted`.
    #[must_use]
    pub fn fields(&self, wanted: FieldMask) -> FieldMask {
        self.apply & wanted
    }
}

/// Serializes a [`FieldMask`] as a list of field names.
#[cfg(feature = "serde")]
pub mod mask_names {
    use fields::{Field, FieldMask};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(mask: &FieldMask, serializer: S) -> Result<S::Ok, S::Error> {
        let names: Vec<String> = mask.iter().map(|field| field.to_string()).collect();
        names.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FieldMask, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        names
            .iter()
            .map(|name| {
                Field::parse(name)
                    .map(Field::index)
                    .ok_or_else(|| D::Error::custom(format!("unknown field `{name}`")))
            })
            .collect()
    }
}
