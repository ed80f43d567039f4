//! Settings structs, one per `[section]` of the INI file.

use std::path::PathBuf;
use std::time::Duration;

use super::file::config_directory;
use crate::coordinator::{CoordinatorConfig, RefetchPolicy};
use crate::session::{SessionConfig, DEFAULT_DISPATCH_ADDRESS};
use crate::tile::DEFAULT_TILE_SIZE;

/// Default flood-gate window in milliseconds.
pub const DEFAULT_FLOOD_WINDOW_MS: u64 = 2000;

/// Default log file name inside the config directory.
pub const DEFAULT_LOG_FILE: &str = "linetiles.log";

/// `~/.linetiles/linetiles.log`
pub fn default_log_file() -> PathBuf {
    config_directory().join(DEFAULT_LOG_FILE)
}

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigFile {
    pub coordinator: CoordinatorSettings,
    pub session: SessionSettings,
    pub reporter: ReporterSettings,
    pub logging: LoggingSettings,
}

/// `[coordinator]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorSettings {
    /// Lines per tile
    pub tile_size: u32,
    /// Refetch policy for resolved tiles
    pub refetch: RefetchPolicy,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            refetch: RefetchPolicy::default(),
        }
    }
}

/// `[session]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Replay service dispatcher
    pub dispatch_address: String,
    /// API key; the environment is consulted when unset
    pub api_key: Option<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            dispatch_address: DEFAULT_DISPATCH_ADDRESS.to_string(),
            api_key: None,
        }
    }
}

/// `[reporter]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReporterSettings {
    /// Reports closer together than this close the flood gate
    pub flood_window_ms: u64,
}

impl Default for ReporterSettings {
    fn default() -> Self {
        Self {
            flood_window_ms: DEFAULT_FLOOD_WINDOW_MS,
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub file: PathBuf,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

impl ConfigFile {
    /// Coordinator configuration from `[coordinator]`.
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig::default()
            .with_tile_size(self.coordinator.tile_size)
            .with_refetch(self.coordinator.refetch)
    }

    /// Session configuration from `[session]`.
    pub fn session_config(&self) -> SessionConfig {
        let config =
            SessionConfig::default().with_dispatch_address(self.session.dispatch_address.clone());
        match &self.session.api_key {
            Some(key) => config.with_api_key(key.clone()),
            None => config,
        }
    }

    pub fn flood_window(&self) -> Duration {
        Duration::from_millis(self.reporter.flood_window_ms)
    }
}
