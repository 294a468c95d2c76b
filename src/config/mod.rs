//! Registry configuration

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Tunables for a [`crate::ecs::Registry`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub removal: RemovalPolicy,
    #[serde(default)]
    pub transform: TransformConfig,
}

/// What `remove` does with the component value it detaches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Only drop the entity from the type's validity index. The value stays
    /// in its slot as a tombstone until the slot is overwritten or the
    /// entity is destroyed.
    #[default]
    Deferred,
    /// Drop the value immediately.
    Eager,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Worker threads for `transform`. `None` uses rayon's global pool.
    #[serde(default)]
    pub threads: Option<usize>,
    /// Smallest number of tuples handed to one worker at a time.
    #[serde(default = "default_min_batch")]
    pub min_batch: usize,
}

fn default_min_batch() -> usize {
    1
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            threads: None,
            min_batch: default_min_batch(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl RegistryConfig {
    /// Load configuration from YAML file
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Save configuration to YAML file
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn with_removal(mut self, removal: RemovalPolicy) -> Self {
        self.removal = removal;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.transform.threads = Some(threads);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::default();

        assert_eq!(config.removal, RemovalPolicy::Deferred);
        assert_eq!(config.transform.threads, None);
        assert_eq!(config.transform.min_batch, 1);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = RegistryConfig::from_yaml_str("removal: eager\n").unwrap();
        assert_eq!(config.removal, RemovalPolicy::Eager);
        assert_eq!(config.transform, TransformConfig::default());

        let config = RegistryConfig::from_yaml_str("transform:\n  threads: 2\n").unwrap();
        assert_eq!(config.removal, RemovalPolicy::Deferred);
        assert_eq!(config.transform.threads, Some(2));
        assert_eq!(config.transform.min_batch, 1);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let err = RegistryConfig::from_yaml_str("removal: sometimes\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_config_serialization() {
        let config = RegistryConfig::default()
            .with_removal(RemovalPolicy::Eager)
            .with_threads(4);

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("registry.yaml");
        config.to_yaml(&path).unwrap();

        let loaded = RegistryConfig::from_yaml(&path).unwrap();
        assert_eq!(config, loaded);
    }
}
