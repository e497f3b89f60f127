//! Chunk tree tuning parameters

use super::{Config, ConfigError};
use serde::{Deserialize, Serialize};

/// Configuration for chunk tree behavior
///
/// Stored as `world.toml` or `world.ron` next to the map data:
///
/// ```toml
/// min_chunk_extent = 16
/// max_entries_per_chunk = 8
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Smallest per-axis size a chunk may be split into
    ///
    /// An axis is only divided while both halves stay at least this long,
    /// which bounds the depth of the tree.
    pub min_chunk_extent: i32,

    /// Entries a leaf holds before it tries to split
    pub max_entries_per_chunk: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            min_chunk_extent: 16,
            max_entries_per_chunk: 8,
        }
    }
}

impl WorldConfig {
    /// Set the minimum chunk extent
    pub fn with_min_chunk_extent(mut self, extent: i32) -> Self {
        self.min_chunk_extent = extent;
        self
    }

    /// Set the split threshold
    pub fn with_max_entries_per_chunk(mut self, entries: usize) -> Self {
        self.max_entries_per_chunk = entries;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_chunk_extent < 1 {
            return Err(ConfigError::Invalid(format!(
                "min_chunk_extent must be at least 1, got {}",
                self.min_chunk_extent
            )));
        }

        if self.max_entries_per_chunk == 0 {
            return Err(ConfigError::Invalid(
                "max_entries_per_chunk must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Raise out-of-range limits to their smallest usable value
    ///
    /// A chunk tree built with `min_chunk_extent < 1` could split forever on
    /// coincident entries.
    #[must_use]
    pub fn clamped(self) -> Self {
        if self.validate().is_ok() {
            return self;
        }
        log::warn!(
            "Clamping chunk limits (min_chunk_extent {}, max_entries_per_chunk {})",
            self.min_chunk_extent,
            self.max_entries_per_chunk
        );
        Self {
            min_chunk_extent: self.min_chunk_extent.max(1),
            max_entries_per_chunk: self.max_entries_per_chunk.max(1),
        }
    }
}

impl Config for WorldConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(WorldConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_degenerate_values() {
        let config = WorldConfig::default().with_min_chunk_extent(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = WorldConfig::default().with_max_entries_per_chunk(0);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_clamped_raises_degenerate_values() {
        let config = WorldConfig::default().with_min_chunk_extent(-3).clamped();
        assert_eq!(config.min_chunk_extent, 1);
        assert_eq!(config.max_entries_per_chunk, WorldConfig::default().max_entries_per_chunk);
        assert!(config.validate().is_ok());

        let tuned = WorldConfig::default().with_min_chunk_extent(32);
        assert_eq!(tuned.clamped(), tuned);
    }

    #[test]
    fn test_toml_and_ron_files_round_trip() {
        let dir = std::env::temp_dir();
        let config = WorldConfig::default()
            .with_min_chunk_extent(4)
            .with_max_entries_per_chunk(2);

        for name in ["chunk_world_test.toml", "chunk_world_test.ron"] {
            let path = dir.join(name);
            config.save_to_file(&path).expect("save config");
            let loaded = WorldConfig::load_from_file(&path).expect("load config");
            assert_eq!(loaded, config);
            let _ = std::fs::remove_file(&path);
        }
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let config: WorldConfig = toml::from_str("min_chunk_extent = 32").expect("parse");
        assert_eq!(config.min_chunk_extent, 32);
        assert_eq!(config.max_entries_per_chunk, 8);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = WorldConfig::default().save_to_file("world.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
