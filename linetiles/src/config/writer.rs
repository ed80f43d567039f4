//! INI serialization: `ConfigFile` -> commented INI string.

use std::path::Path;

use super::settings::ConfigFile;

/// Commented INI text for `config.ini`.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let api_key = config.session.api_key.as_deref().unwrap_or("");

    format!(
        r#"[coordinator]
; Lines fetched per request (default: 4). Larger tiles mean fewer,
; bigger requests when scrolling.
tile_size = {}
; What to do with tiles the replay service already resolved:
;   missing  - only fetch tiles with no data here (default)
;   resolved - fetch them again on every request
refetch = {}

[session]
; Replay service dispatcher
dispatch_address = {}
; API key. If empty, RECORD_REPLAY_API_KEY is used.
api_key = {}

[reporter]
; Errors reported less than this many milliseconds apart are treated as a
; flood and muted for one window (default: 2000)
flood_window_ms = {}

[logging]
; Log file location
file = {}
"#,
        config.coordinator.tile_size,
        config.coordinator.refetch,
        config.session.dispatch_address,
        api_key,
        config.reporter.flood_window_ms,
        path_to_string(&config.logging.file),
    )
}

/// Display a path, abbreviating the home directory to `~`.
pub(super) fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_every_section() {
        let content = to_config_string(&ConfigFile::default());
        for section in ["[coordinator]", "[session]", "[reporter]", "[logging]"] {
            assert!(content.contains(section), "missing {section}");
        }
        assert!(content.contains("tile_size = 4"));
        assert!(content.contains("refetch = missing"));
        assert!(content.contains("flood_window_ms = 2000"));
    }

    #[test]
    fn test_home_abbreviated() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path_to_string(&home.join("a.log")), "~/a.log");
        }
    }
}
