//! Configuration for the index engine.
//!
//! Usually embedded in the host's `memz.toml`; every field has a default so
//! an empty table is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::index::range::DEFAULT_DEGREE;

/// Construction-time options for an [`IndexCoordinator`](crate::IndexCoordinator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Capacity of the id cache.  Must be positive.
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
    /// Whether `get_by_id` goes through the cache.
    #[serde(default = "default_true")]
    pub enable_cache: bool,
    /// Fan-out of the time index.  Must be at least 2.
    #[serde(default = "default_degree")]
    pub range_degree: usize,
    /// Whether to pre-load high-importance records right after a build.
    #[serde(default = "default_true")]
    pub warm_on_build: bool,
    /// Defaults for warm-up selection.
    #[serde(default)]
    pub warm_up: WarmUpConfig,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            cache_size: 256,
            enable_cache: true,
            range_degree: DEFAULT_DEGREE,
            warm_on_build: true,
            warm_up: WarmUpConfig::default(),
        }
    }
}

impl IndexConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `IndexError::Config` if the TOML is invalid, or
    /// `IndexError::InvalidConfiguration` if a value is out of range.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| IndexError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Reject out-of-range values.
    ///
    /// # Errors
    /// Returns `IndexError::InvalidConfiguration` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.cache_size == 0 {
            return Err(IndexError::zero_capacity());
        }
        if self.range_degree < 2 {
            return Err(IndexError::InvalidConfiguration {
                field: "range_degree",
                reason: format!("must be at least 2 (got {})", self.range_degree),
            });
        }
        Ok(())
    }

    /// A configuration with the cache switched off.
    #[must_use]
    pub fn without_cache() -> Self {
        Self {
            enable_cache: false,
            ..Self::default()
        }
    }
}

/// Warm-up selection defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarmUpConfig {
    /// Only records at or above this importance are warmed.
    #[serde(default = "default_importance_threshold")]
    pub importance_threshold: f64,
    /// At most this many records are warmed.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for WarmUpConfig {
    fn default() -> Self {
        Self {
            importance_threshold: 8.0,
            max_entries: 128,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}
fn default_cache_size() -> usize {
    256
}
fn default_degree() -> usize {
    DEFAULT_DEGREE
}
fn default_importance_threshold() -> f64 {
    8.0
}
fn default_max_entries() -> usize {
    128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = IndexConfig::from_toml("").unwrap();
        assert_eq!(config, IndexConfig::default());
        assert_eq!(config.cache_size, 256);
        assert!(config.enable_cache);
        assert_eq!(config.range_degree, 32);
    }

    #[test]
    fn partial_toml_overrides() {
        let config = IndexConfig::from_toml(
            r"
            cache_size = 64
            warm_on_build = false

            [warm_up]
            max_entries = 10
            ",
        )
        .unwrap();
        assert_eq!(config.cache_size, 64);
        assert!(!config.warm_on_build);
        assert_eq!(config.warm_up.max_entries, 10);
        assert_eq!(config.warm_up.importance_threshold, 8.0);
    }

    #[test]
    fn zero_cache_size_rejected() {
        let err = IndexConfig::from_toml("cache_size = 0").unwrap_err();
        assert!(matches!(err, IndexError::InvalidConfiguration { field: "cache_size", .. }));
    }

    #[test]
    fn small_degree_rejected() {
        let config = IndexConfig {
            range_degree: 1,
            ..IndexConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = IndexConfig::from_toml("cache_size = \"big\"").unwrap_err();
        assert!(matches!(err, IndexError::Config(_)));
    }

    #[test]
    fn file_loading() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("index.toml");
        std::fs::write(&path, "cache_size = 32\nrange_degree = 8\n").unwrap();

        let config = IndexConfig::from_file(&path).unwrap();
        assert_eq!(config.cache_size, 32);
        assert_eq!(config.range_degree, 8);

        let missing = IndexConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, IndexError::Io(_)));
    }
}
