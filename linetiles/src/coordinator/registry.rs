//! In-flight fetch registry.
//!
//! Records which `(source, span)` pairs have a fetch running and for which
//! generation of the source. Lives inside the coordinator's state lock, so
//! it needs no synchronisation of its own.

use std::collections::HashMap;

use crate::source::SourceId;
use crate::tile::LineSpan;

#[derive(Debug, Default)]
pub(crate) struct InFlightRegistry {
    fetches: HashMap<SourceId, HashMap<LineSpan, u64>>,
}

impl InFlightRegistry {
    /// Mark `span` in flight. Returns false if it already is.
    pub(crate) fn register(&mut self, source: &SourceId, span: LineSpan, generation: u64) -> bool {
        let spans = self.fetches.entry(source.clone()).or_default();
        if spans.contains_key(&span) {
            return false;
        }
        spans.insert(span, generation);
        true
    }

    pub(crate) fn contains(&self, source: &SourceId, span: LineSpan) -> bool {
        self.fetches
            .get(source)
            .is_some_and(|spans| spans.contains_key(&span))
    }

    /// Whether any in-flight span of `source` contains `line`.
    pub(crate) fn covers_line(&self, source: &SourceId, line: u32) -> bool {
        self.fetches
            .get(source)
            .is_some_and(|spans| spans.keys().any(|span| span.contains(line)))
    }

    /// Clear the mark if it belongs to `generation`.
    ///
    /// Returns false when the mark was already dropped or re-registered by a
    /// newer generation.
    pub(crate) fn complete(&mut self, source: &SourceId, span: LineSpan, generation: u64) -> bool {
        let Some(spans) = self.fetches.get_mut(source) else {
            return false;
        };
        if spans.get(&span) != Some(&generation) {
            return false;
        }
        spans.remove(&span);
        if spans.is_empty() {
            self.fetches.remove(source);
        }
        true
    }

    /// Drop every mark of `source`. Returns the dropped spans.
    pub(crate) fn drop_source(&mut self, source: &SourceId) -> Vec<LineSpan> {
        self.fetches
            .remove(source)
            .map(|spans| spans.into_keys().collect())
            .unwrap_or_default()
    }

    /// Drop every mark. Returns the dropped spans per source.
    pub(crate) fn clear(&mut self) -> HashMap<SourceId, Vec<LineSpan>> {
        self.fetches
            .drain()
            .map(|(source, spans)| (source, spans.into_keys().collect()))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.fetches.values().map(HashMap::len).sum()
    }
}
