//! Session configuration.

/// Default address of the replay service dispatcher.
pub const DEFAULT_DISPATCH_ADDRESS: &str = "wss://dispatch.replay.io";

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV_VAR: &str = "RECORD_REPLAY_API_KEY";

/// Configuration for sync sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Dispatcher address handed to protocol clients.
    pub dispatch_address: String,

    /// API key. Falls back to [`API_KEY_ENV_VAR`] when unset.
    pub api_key: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dispatch_address: DEFAULT_DISPATCH_ADDRESS.to_string(),
            api_key: None,
        }
    }
}

impl SessionConfig {
    /// Set the dispatcher address.
    pub fn with_dispatch_address(mut self, address: impl Into<String>) -> Self {
        self.dispatch_address = address.into();
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Resolve the API key: configured value first, then the environment.
    ///
    /// Blank values count as unset.
    pub fn resolve_api_key(&self) -> Option<String> {
        fn non_blank(key: &String) -> bool {
            !key.trim().is_empty()
        }

        self.api_key
            .clone()
            .filter(non_blank)
            .or_else(|| std::env::var(API_KEY_ENV_VAR).ok().filter(non_blank))
    }
}
