//! Engine configuration

use edgecmd_shared::defaults;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Device command settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DeviceConfig {
    /// Maximum resource operations a command may expand to
    pub max_cmd_ops: usize,
    /// Apply read/write transforms declared on device resources
    pub data_transform: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            max_cmd_ops: defaults::MAX_CMD_OPS,
            data_transform: true,
        }
    }
}

/// Top-level configuration for the command engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EngineConfig {
    pub device: DeviceConfig,
}

impl EngineConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.device.max_cmd_ops == 0 {
            return Err(ConfigError::Invalid("Device.MaxCmdOps must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.device.max_cmd_ops, 128);
        assert!(config.device.data_transform);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = EngineConfig::from_toml_str("[Device]\nMaxCmdOps = 4\n").expect("valid config");
        assert_eq!(config.device.max_cmd_ops, 4);
        assert!(config.device.data_transform);

        let config = EngineConfig::from_toml_str("").expect("empty config");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_reject_zero_max_ops() {
        let result = EngineConfig::from_toml_str("[Device]\nMaxCmdOps = 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_reject_malformed_toml() {
        let result = EngineConfig::from_toml_str("[Device\nMaxCmdOps = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
