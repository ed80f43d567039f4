//! CLI command implementations.
//!
//! - [`annotate`] - Fetch and print gutter marks for a source
//! - [`config`] - Configuration management (get, set, list, path)
//! - [`sources`] - List the sources of a recording

pub mod annotate;
pub mod config;
pub mod sources;
