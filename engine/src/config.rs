//! Engine configuration.

/// Runtime toggles and safety caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Pass equipment through [`crate::Catalog::restrict`] before it reaches the host.
    pub restricted_gear_protection: bool,
    /// Report newly created actors to the automation layer.
    pub automation_enabled: bool,
    /// Maximum number of tracked actors (hard safety cap).
    pub max_actors: usize,
}

impl EngineConfig {
    /// Small limits for tests.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            restricted_gear_protection: true,
            automation_enabled: true,
            max_actors: 8,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            restricted_gear_protection: true,
            automation_enabled: true,
            max_actors: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_everything() {
        let config = EngineConfig::default();
        assert!(config.restricted_gear_protection);
        assert!(config.automation_enabled);
        assert_eq!(config.max_actors, 1024);
        assert!(EngineConfig::for_testing().max_actors < config.max_actors);
    }
}
