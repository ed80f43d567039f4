//! Typed access to configuration values by `section.key` name.

use std::str::FromStr;

use thiserror::Error;

use super::parser::{
    expand_tilde, optional_string, parse_dispatch_address, parse_refetch, parse_tile_size,
    parse_window_ms,
};
use super::settings::ConfigFile;
use super::writer::path_to_string;

/// Errors getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    CoordinatorTileSize,
    CoordinatorRefetch,

    SessionDispatchAddress,
    SessionApiKey,

    ReporterFloodWindowMs,

    LoggingFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|key| key.name() == s.to_lowercase())
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Canonical name, e.g. `coordinator.tile_size`.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::CoordinatorTileSize => "coordinator.tile_size",
            ConfigKey::CoordinatorRefetch => "coordinator.refetch",
            ConfigKey::SessionDispatchAddress => "session.dispatch_address",
            ConfigKey::SessionApiKey => "session.api_key",
            ConfigKey::ReporterFloodWindowMs => "reporter.flood_window_ms",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or(self.name())
    }

    /// Current value as a string.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::CoordinatorTileSize => config.coordinator.tile_size.to_string(),
            ConfigKey::CoordinatorRefetch => config.coordinator.refetch.to_string(),
            ConfigKey::SessionDispatchAddress => config.session.dispatch_address.clone(),
            ConfigKey::SessionApiKey => config.session.api_key.clone().unwrap_or_default(),
            ConfigKey::ReporterFloodWindowMs => config.reporter.flood_window_ms.to_string(),
            ConfigKey::LoggingFile => path_to_string(&config.logging.file),
        }
    }

    /// Validate `value` and store it.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        let failed = |reason: &str| ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason: reason.to_string(),
        };

        match self {
            ConfigKey::CoordinatorTileSize => {
                config.coordinator.tile_size = parse_tile_size(value).map_err(failed)?;
            }
            ConfigKey::CoordinatorRefetch => {
                config.coordinator.refetch = parse_refetch(value).map_err(failed)?;
            }
            ConfigKey::SessionDispatchAddress => {
                config.session.dispatch_address = parse_dispatch_address(value).map_err(failed)?;
            }
            ConfigKey::SessionApiKey => {
                config.session.api_key = optional_string(value);
            }
            ConfigKey::ReporterFloodWindowMs => {
                config.reporter.flood_window_ms = parse_window_ms(value).map_err(failed)?;
            }
            ConfigKey::LoggingFile => {
                let value = value.trim();
                if value.is_empty() {
                    return Err(failed("must not be empty"));
                }
                config.logging.file = expand_tilde(value);
            }
        }
        Ok(())
    }

    /// Whether `get` should mask the value when listing.
    pub fn is_secret(&self) -> bool {
        matches!(self, ConfigKey::SessionApiKey)
    }

    /// All supported keys, in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::CoordinatorTileSize,
            ConfigKey::CoordinatorRefetch,
            ConfigKey::SessionDispatchAddress,
            ConfigKey::SessionApiKey,
            ConfigKey::ReporterFloodWindowMs,
            ConfigKey::LoggingFile,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::RefetchPolicy;

    #[test]
    fn test_config_key_parsing() {
        assert_eq!(
            "coordinator.tile_size".parse::<ConfigKey>().unwrap(),
            ConfigKey::CoordinatorTileSize
        );
        assert_eq!(
            "Session.API_KEY".parse::<ConfigKey>().unwrap(),
            ConfigKey::SessionApiKey
        );
        assert!(matches!(
            "cache.size".parse::<ConfigKey>(),
            Err(ConfigKeyError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_key_name_parts() {
        let key = ConfigKey::ReporterFloodWindowMs;
        assert_eq!(key.section(), "reporter");
        assert_eq!(key.key_name(), "flood_window_ms");
    }

    #[test]
    fn test_get_and_set() {
        let mut config = ConfigFile::default();

        ConfigKey::CoordinatorRefetch
            .set(&mut config, "resolved")
            .unwrap();
        assert_eq!(config.coordinator.refetch, RefetchPolicy::RefreshResolved);
        assert_eq!(ConfigKey::CoordinatorRefetch.get(&config), "resolved");

        ConfigKey::SessionApiKey.set(&mut config, "rwk_1").unwrap();
        assert_eq!(ConfigKey::SessionApiKey.get(&config), "rwk_1");
        ConfigKey::SessionApiKey.set(&mut config, "").unwrap();
        assert!(config.session.api_key.is_none());
    }

    #[test]
    fn test_set_invalid_value_fails() {
        let mut config = ConfigFile::default();
        let err = ConfigKey::CoordinatorTileSize
            .set(&mut config, "zero")
            .unwrap_err();
        assert!(err.to_string().contains("coordinator.tile_size"));
        assert_eq!(config.coordinator.tile_size, 4);

        assert!(ConfigKey::LoggingFile.set(&mut config, "  ").is_err());
    }

    #[test]
    fn test_all_keys_round_trip_names() {
        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), *key);
        }
    }
}
