//! CLI runner: config loading, logging and runtime setup shared by commands.

use tokio::runtime::Runtime;
use tracing::info;

use linetiles::config::ConfigFile;
use linetiles::logging::{init_logging, LoggingGuard};

use crate::error::CliError;

/// Keeps logging alive for the duration of a command.
pub struct CliRunner {
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load config and initialize logging.
    ///
    /// Console logging goes to stderr and is only enabled with `debug`, so
    /// command output on stdout stays clean.
    pub fn with_debug(debug_mode: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let logging_guard = init_logging(&config.logging.file, debug_mode, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!("linetiles v{}", linetiles::VERSION);
        info!("linetiles CLI: {} command", command);
    }

    /// Multi-threaded Tokio runtime for async commands.
    pub fn runtime(&self) -> Result<Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("linetiles")
            .build()
            .map_err(CliError::Runtime)
    }
}
