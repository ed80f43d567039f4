//! Source descriptors and editor path mapping.

use url::Url;

use super::SourceId;

/// URL prefix of sources generated by the recorder itself.
///
/// These never correspond to a file in the user's workspace.
pub const INTERNAL_URL_PREFIX: &str = "record-replay";

/// A source file known to a recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Recording-scoped source id
    pub id: SourceId,
    /// URL the recorded program loaded the source from, if any
    pub url: Option<String>,
}

impl SourceDescriptor {
    pub fn new(id: impl Into<SourceId>, url: Option<String>) -> Self {
        Self {
            id: id.into(),
            url,
        }
    }

    /// Returns true for recorder-internal sources.
    pub fn is_internal(&self) -> bool {
        self.url
            .as_deref()
            .is_some_and(|url| url.starts_with(INTERNAL_URL_PREFIX))
    }

    /// Path used to match the source against files open in an editor.
    ///
    /// This is the path component of the source URL. Returns `None` when
    /// the source has no URL or the URL does not parse.
    pub fn relative_path(&self) -> Option<String> {
        let url = self.url.as_deref()?;
        Url::parse(url).ok().map(|parsed| parsed.path().to_string())
    }

    /// Returns true if the source can be shown next to an editor file.
    pub fn is_editor_candidate(&self) -> bool {
        !self.is_internal() && self.relative_path().is_some()
    }
}

/// Filters a source list down to the ones an editor can display.
pub fn editor_sources<'a, I>(sources: I) -> impl Iterator<Item = &'a SourceDescriptor>
where
    I: IntoIterator<Item = &'a SourceDescriptor>,
{
    sources
        .into_iter()
        .filter(|source| source.is_editor_candidate())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(url: Option<&str>) -> SourceDescriptor {
        SourceDescriptor::new("1", url.map(String::from))
    }

    #[test]
    fn test_relative_path_from_http_url() {
        let source = descriptor(Some("https://app.example.com/static/js/main.js?v=3"));
        assert_eq!(source.relative_path().as_deref(), Some("/static/js/main.js"));
        assert!(source.is_editor_candidate());
    }

    #[test]
    fn test_relative_path_from_webpack_url() {
        let source = descriptor(Some("webpack:///src/App.tsx"));
        assert_eq!(source.relative_path().as_deref(), Some("/src/App.tsx"));
    }

    #[test]
    fn test_internal_sources_are_hidden() {
        let source = descriptor(Some("record-replay-internal://builtins.js"));
        assert!(source.is_internal());
        assert!(!source.is_editor_candidate());
    }

    #[test]
    fn test_source_without_url() {
        let source = descriptor(None);
        assert!(!source.is_internal());
        assert_eq!(source.relative_path(), None);
        assert!(!source.is_editor_candidate());
    }

    #[test]
    fn test_unparseable_url() {
        let source = descriptor(Some("not a url"));
        assert_eq!(source.relative_path(), None);
    }

    #[test]
    fn test_editor_sources_filter() {
        let sources = vec![
            descriptor(Some("https://example.com/a.js")),
            descriptor(Some("record-replay-internal://x.js")),
            descriptor(None),
        ];
        let visible: Vec<_> = editor_sources(&sources).collect();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].url.as_deref(), Some("https://example.com/a.js"));
    }
}
