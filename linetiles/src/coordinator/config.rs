//! Coordinator configuration.

use std::fmt;

use thiserror::Error;

use crate::tile::DEFAULT_TILE_SIZE;

/// What to do when the status tracker reports a tile as already resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefetchPolicy {
    /// Fetch only tiles this coordinator holds no data for. A tile fetched
    /// here is not fetched again until it is invalidated or reset.
    #[default]
    MissingOnly,
    /// Fetch resolved tiles again on every request that is not coalesced.
    RefreshResolved,
}

/// Unrecognised refetch policy name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown refetch policy '{0}' (expected 'missing' or 'resolved')")]
pub struct UnknownPolicy(pub String);

impl std::str::FromStr for RefetchPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "missing" | "missing-only" => Ok(Self::MissingOnly),
            "resolved" | "refresh" | "refresh-resolved" => Ok(Self::RefreshResolved),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for RefetchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingOnly => f.write_str("missing"),
            Self::RefreshResolved => f.write_str("resolved"),
        }
    }
}

/// Configuration for a [`FetchCoordinator`](super::FetchCoordinator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Lines per tile.
    pub tile_size: u32,

    /// Handling of tiles the tracker reports as resolved.
    pub refetch: RefetchPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            refetch: RefetchPolicy::default(),
        }
    }
}

impl CoordinatorConfig {
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_refetch(mut self, refetch: RefetchPolicy) -> Self {
        self.refetch = refetch;
        self
    }
}
