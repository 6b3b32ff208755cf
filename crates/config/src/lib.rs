//! Engine-default configuration.
//!
//! The engine needs very few knobs: the default per-node execution cap
//! (§7's limit-resolution policy falls back to this when neither the node
//! nor the workflow overrides it) and the buffer capacity for the secondary
//! event stream. Both have sensible defaults and can be overridden from the
//! environment, the same layered-default shape the rest of the workspace
//! uses for its richer configuration surfaces.

use serde::{Deserialize, Serialize};

/// Engine-wide defaults, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineDefaults {
    /// Per-node execution cap used when neither the node nor the workflow
    /// overrides it. See spec §7 effective-limit resolution.
    pub default_execution_limit: u32,
    /// Capacity of the `SubscribeStream` broadcast channel (§4.4).
    pub stream_channel_capacity: usize,
}

impl Default for EngineDefaults {
    fn default() -> Self {
        Self {
            default_execution_limit: 1000,
            stream_channel_capacity: 1024,
        }
    }
}

impl EngineDefaults {
    /// Start from [`Default`] and apply `ENGINE_DEFAULT_EXECUTION_LIMIT` /
    /// `ENGINE_STREAM_CHANNEL_CAPACITY` environment overrides when present
    /// and parseable. Malformed values are ignored, keeping the default.
    #[must_use]
    pub fn from_env() -> Self {
        let mut defaults = Self::default();

        if let Ok(raw) = std::env::var("ENGINE_DEFAULT_EXECUTION_LIMIT")
            && let Ok(parsed) = raw.parse()
        {
            defaults.default_execution_limit = parsed;
        }

        if let Ok(raw) = std::env::var("ENGINE_STREAM_CHANNEL_CAPACITY")
            && let Ok(parsed) = raw.parse()
        {
            defaults.stream_channel_capacity = parsed;
        }

        defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_execution_limit_matches_spec() {
        assert_eq!(EngineDefaults::default().default_execution_limit, 1000);
    }

    #[test]
    fn from_env_falls_back_to_default_when_unset() {
        // SAFETY-equivalent: tests run single-threaded per process for env vars
        // that no other test touches.
        unsafe {
            std::env::remove_var("ENGINE_DEFAULT_EXECUTION_LIMIT");
        }
        assert_eq!(EngineDefaults::from_env(), EngineDefaults::default());
    }
}
