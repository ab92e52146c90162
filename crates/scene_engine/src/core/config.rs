//! Configuration system
//!
//! Serde-backed configuration types for the scene runtime, loadable from
//! TOML or RON files through the [`Config`] trait.

use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Scene runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Capacity hint for the tree node arena
    pub expected_node_count: usize,

    /// Capacity reserved for the per-frame dirty transform list
    pub dirty_capacity: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            expected_node_count: 256,
            dirty_capacity: 64,
        }
    }
}

impl Config for SceneConfig {}

/// Resource registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Fixed number of named resources the registry can hold
    pub capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { capacity: 128 }
    }
}

impl Config for RegistryConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_config_toml_round_trip() {
        let config = SceneConfig {
            expected_node_count: 32,
            dirty_capacity: 8,
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: SceneConfig = toml::from_str(&text).unwrap();

        assert_eq!(parsed.expected_node_count, 32);
        assert_eq!(parsed.dirty_capacity, 8);
    }

    #[test]
    fn test_unsupported_config_format() {
        let result = SceneConfig::default().save_to_file("scene.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
