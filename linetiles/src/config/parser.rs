//! INI parsing: `Ini` -> `ConfigFile`.
//!
//! The single place where INI key names map to struct fields. Value parsers
//! are shared with [`super::keys`].

use std::path::PathBuf;

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coordinator::RefetchPolicy;

/// Overlay the values found in `ini` onto `ConfigFile::default()`.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [coordinator]
    if let Some(section) = ini.section(Some("coordinator")) {
        if let Some(v) = section.get("tile_size") {
            config.coordinator.tile_size =
                parse_tile_size(v).map_err(|reason| invalid("coordinator", "tile_size", v, reason))?;
        }
        if let Some(v) = section.get("refetch") {
            config.coordinator.refetch =
                parse_refetch(v).map_err(|reason| invalid("coordinator", "refetch", v, reason))?;
        }
    }

    // [session]
    if let Some(section) = ini.section(Some("session")) {
        if let Some(v) = section.get("dispatch_address") {
            config.session.dispatch_address = parse_dispatch_address(v)
                .map_err(|reason| invalid("session", "dispatch_address", v, reason))?;
        }
        if let Some(v) = section.get("api_key") {
            config.session.api_key = optional_string(v);
        }
    }

    // [reporter]
    if let Some(section) = ini.section(Some("reporter")) {
        if let Some(v) = section.get("flood_window_ms") {
            config.reporter.flood_window_ms = parse_window_ms(v)
                .map_err(|reason| invalid("reporter", "flood_window_ms", v, reason))?;
        }
    }

    // [logging]
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

pub(super) fn parse_tile_size(value: &str) -> Result<u32, &'static str> {
    match value.trim().parse::<u32>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err("must be a positive integer (lines per tile)"),
    }
}

pub(super) fn parse_refetch(value: &str) -> Result<RefetchPolicy, &'static str> {
    value
        .parse()
        .map_err(|_| "must be 'missing' or 'resolved'")
}

pub(super) fn parse_dispatch_address(value: &str) -> Result<String, &'static str> {
    let value = value.trim();
    if value.is_empty() {
        return Err("must not be empty");
    }
    url::Url::parse(value)
        .map(|_| value.to_string())
        .map_err(|_| "must be a URL such as wss://dispatch.replay.io")
}

pub(super) fn parse_window_ms(value: &str) -> Result<u64, &'static str> {
    value
        .trim()
        .parse()
        .map_err(|_| "must be a non-negative integer (milliseconds)")
}

pub(super) fn optional_string(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let ini = Ini::load_from_str(content).unwrap();
        parse_ini(&ini)
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_parse_all_sections() {
        let config = parse(
            "[coordinator]\n\
             tile_size = 100\n\
             refetch = resolved\n\
             [session]\n\
             dispatch_address = wss://localhost:8000\n\
             api_key = rwk_abc\n\
             [reporter]\n\
             flood_window_ms = 250\n\
             [logging]\n\
             file = /var/log/linetiles.log\n",
        )
        .unwrap();

        assert_eq!(config.coordinator.tile_size, 100);
        assert_eq!(config.coordinator.refetch, RefetchPolicy::RefreshResolved);
        assert_eq!(config.session.dispatch_address, "wss://localhost:8000");
        assert_eq!(config.session.api_key.as_deref(), Some("rwk_abc"));
        assert_eq!(config.reporter.flood_window_ms, 250);
        assert_eq!(config.logging.file, PathBuf::from("/var/log/linetiles.log"));
    }

    #[test]
    fn test_blank_api_key_is_none() {
        let config = parse("[session]\napi_key =\n").unwrap();
        assert!(config.session.api_key.is_none());
    }

    #[test]
    fn test_invalid_refetch() {
        let err = parse("[coordinator]\nrefetch = sometimes\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue {
                section,
                key,
                value,
                ..
            } => {
                assert_eq!(section, "coordinator");
                assert_eq!(key, "refetch");
                assert_eq!(value, "sometimes");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_window() {
        assert!(parse("[reporter]\nflood_window_ms = soon\n").is_err());
    }

    #[test]
    fn test_invalid_dispatch_address() {
        assert!(parse("[session]\ndispatch_address = not a url\n").is_err());
    }

    #[test]
    fn test_expand_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/x.log"), home.join("x.log"));
        }
        assert_eq!(expand_tilde("/abs/x.log"), PathBuf::from("/abs/x.log"));
    }
}
