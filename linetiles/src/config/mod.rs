//! User configuration for `~/.linetiles/config.ini`.
//!
//! - [`ConfigFile`]: settings for every section, with defaults
//! - [`ConfigKey`]: typed get/set by `section.key` name
//!
//! ```
//! use linetiles::config::{ConfigFile, ConfigKey};
//!
//! let mut config = ConfigFile::default();
//! let key: ConfigKey = "coordinator.tile_size".parse().unwrap();
//! key.set(&mut config, "100").unwrap();
//! assert_eq!(config.coordinator_config().tile_size, 100);
//! ```

mod file;
mod keys;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{
    default_log_file, ConfigFile, CoordinatorSettings, LoggingSettings, ReporterSettings,
    SessionSettings, DEFAULT_FLOOD_WINDOW_MS, DEFAULT_LOG_FILE,
};
