//! CLI error handling with user-friendly messages.

use std::fmt;
use std::process;

use linetiles::config::ConfigFileError;
use linetiles::session::{SessionError, API_KEY_ENV_VAR};
use linetiles::source::DumpError;
use linetiles::tile::TileError;

/// CLI errors.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to load the recording dump
    Dump(DumpError),
    /// The dump has no such source
    UnknownSource(String),
    /// Invalid line arguments
    Lines(TileError),
    /// Failed to start or run the sync session
    Session(SessionError),
    /// Failed to read a file
    FileRead { path: String, error: std::io::Error },
    /// Failed to create the async runtime
    Runtime(std::io::Error),
}

impl CliError {
    /// Print the error and exit with status 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Session(SessionError::MissingApiKey) => {
                eprintln!();
                eprintln!("Set an API key with one of:");
                eprintln!("  linetiles config set session.api_key <key>");
                eprintln!("  export {}=<key>", API_KEY_ENV_VAR);
            }
            CliError::UnknownSource(_) => {
                eprintln!();
                eprintln!("Use 'linetiles sources --dump <file> --all' to list source ids.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Dump(e) => write!(f, "Failed to load recording: {}", e),
            CliError::UnknownSource(id) => write!(f, "Recording has no source '{}'", id),
            CliError::Lines(e) => write!(f, "Invalid lines: {}", e),
            CliError::Session(e) => write!(f, "Sync session failed: {}", e),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read file '{}': {}", path, error)
            }
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Dump(e) => Some(e),
            CliError::Lines(e) => Some(e),
            CliError::Session(e) => Some(e),
            CliError::FileRead { error, .. } => Some(error),
            CliError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<DumpError> for CliError {
    fn from(e: DumpError) -> Self {
        CliError::Dump(e)
    }
}

impl From<SessionError> for CliError {
    fn from(e: SessionError) -> Self {
        CliError::Session(e)
    }
}

impl From<TileError> for CliError {
    fn from(e: TileError) -> Self {
        CliError::Lines(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = CliError::UnknownSource("42".to_string());
        assert_eq!(err.to_string(), "Recording has no source '42'");

        let err: CliError = TileError::InvalidLine(0).into();
        assert!(err.to_string().starts_with("Invalid lines:"));
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;

        let err: CliError = SessionError::MissingApiKey.into();
        assert!(err.source().is_some());
        assert!(CliError::Config("x".to_string()).source().is_none());
    }
}
