//! Engine configuration.
//!
//! [`CollisionConfig`] is plain data with serde support so a game can keep it
//! next to the rest of its settings. Missing JSON fields take the defaults.
//!
//! ```
//! use lattice_collide::config::CollisionConfig;
//!
//! let config = CollisionConfig::from_json_str(r#"{ "grid_len": 32 }"#).unwrap();
//! assert_eq!(config.grid_len, 32);
//! assert_eq!(config.arena_slots_per_class, CollisionConfig::default().arena_slots_per_class);
//! ```

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Configuration for a [`CollisionEngine`](crate::detector::CollisionEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Cells per grid axis. Must be at least 1.
    pub grid_len: usize,
    /// Pool threads in addition to the calling thread. `None` sizes the pool
    /// to the hardware concurrency minus one.
    pub worker_threads: Option<usize>,
    /// Live polygon capacity of each arena size class. Must be at least 1.
    pub arena_slots_per_class: usize,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            grid_len: 64,
            worker_threads: None,
            arena_slots_per_class: 4096,
        }
    }
}

impl CollisionConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the engine cannot run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.grid_len == 0 {
            return Err(EngineError::InvalidConfig(
                "grid_len must be at least 1".to_owned(),
            ));
        }
        if self.arena_slots_per_class == 0 {
            return Err(EngineError::InvalidConfig(
                "arena_slots_per_class must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    /// Number of pool threads the engine will spawn.
    pub fn resolved_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .saturating_sub(1)
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(CollisionConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_grid_len_is_rejected() {
        let config = CollisionConfig {
            grid_len: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_arena_slots_is_rejected() {
        let err = CollisionConfig::from_json_str(r#"{ "arena_slots_per_class": 0 }"#).unwrap_err();
        assert!(err.to_string().contains("arena_slots_per_class"));
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = CollisionConfig::from_json_str(r#"{ "worker_threads": 3 }"#).unwrap();
        assert_eq!(config.worker_threads, Some(3));
        assert_eq!(config.grid_len, 64);
        assert_eq!(config.resolved_worker_threads(), 3);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = CollisionConfig::from_json_str("{ grid_len: }").unwrap_err();
        assert!(matches!(err, EngineError::ConfigParse(_)));
    }

    #[test]
    fn serde_roundtrip() {
        let config = CollisionConfig {
            grid_len: 16,
            worker_threads: Some(0),
            arena_slots_per_class: 8,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(CollisionConfig::from_json_str(&json).unwrap(), config);
    }
}
