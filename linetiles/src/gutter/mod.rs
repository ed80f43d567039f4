//! Gutter annotation model.
//!
//! Bridges editor coordinates and coordinator state:
//!
//! 1. visible editor ranges (0-based) become breakable replay spans
//!    (1-based, clamped to the source's highest breakable line)
//! 2. those spans are requested from the [`FetchCoordinator`]
//! 3. each line of the spans gets a [`GutterMark`]: pending while its tile
//!    is being fetched, otherwise its hit count, otherwise no data
//!
//! Rendering is left to the caller. [`group_by_mark`] collects the editor
//! lines of each mark so one decoration set can be applied per mark.

mod mark;
mod range;

pub use mark::{GutterMark, HitCounted, LineAnnotation};
pub use range::{breakable_spans, editor_to_line, line_to_editor, EditorRange};

use std::collections::BTreeMap;

use crate::coordinator::FetchCoordinator;
use crate::source::{MetadataSource, SourceId};
use crate::tile::{LineSpan, TileError};

/// Request every breakable line of the visible ranges.
///
/// Returns the spans that were requested.
pub fn request_visible<S: MetadataSource>(
    coordinator: &FetchCoordinator<S>,
    source: &SourceId,
    visible: &[EditorRange],
    max_line: Option<u32>,
) -> Result<Vec<LineSpan>, TileError> {
    let spans = breakable_spans(visible, max_line);
    for span in &spans {
        coordinator.request_range(source, span.start, span.end)?;
    }
    Ok(spans)
}

/// Current mark of every line in `spans`, in span order.
pub fn annotate<S>(
    coordinator: &FetchCoordinator<S>,
    source: &SourceId,
    spans: &[LineSpan],
) -> Vec<LineAnnotation>
where
    S: MetadataSource,
    S::Metadata: HitCounted,
{
    spans
        .iter()
        .flat_map(|span| span.lines())
        .map(|line| {
            let mark = if coordinator.is_pending(source, line) {
                GutterMark::Pending
            } else {
                coordinator
                    .get_metadata(source, line)
                    .map_or(GutterMark::NoData, |metadata| {
                        GutterMark::Hits(metadata.hit_count())
                    })
            };
            LineAnnotation {
                line,
                editor_line: line_to_editor(line),
                mark,
            }
        })
        .collect()
}

/// Every visible line marked pending.
///
/// Shown while a session is starting and nothing can be fetched yet.
pub fn pending_annotations(visible: &[EditorRange]) -> Vec<LineAnnotation> {
    let mut editor_lines: Vec<u32> = visible
        .iter()
        .flat_map(|range| range.start..=range.end)
        .collect();
    editor_lines.sort_unstable();
    editor_lines.dedup();

    editor_lines
        .into_iter()
        .map(|editor_line| LineAnnotation {
            line: editor_to_line(editor_line),
            editor_line,
            mark: GutterMark::Pending,
        })
        .collect()
}

/// Editor lines per mark.
pub fn group_by_mark(annotations: &[LineAnnotation]) -> BTreeMap<GutterMark, Vec<u32>> {
    let mut groups: BTreeMap<GutterMark, Vec<u32>> = BTreeMap::new();
    for annotation in annotations {
        groups
            .entry(annotation.mark)
            .or_default()
            .push(annotation.editor_line);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::CoordinatorConfig;
    use crate::report::NoOpReporter;
    use crate::source::{BoxFuture, FetchError, FetchStatus, HitCount, LineEntries};
    use std::sync::Arc;

    /// Every odd line was hit `line` times.
    struct OddLines;

    impl MetadataSource for OddLines {
        type Metadata = HitCount;

        fn status(&self, _source: &SourceId, _span: LineSpan) -> FetchStatus {
            FetchStatus::NotFound
        }

        fn fetch(
            &self,
            _source: &SourceId,
            span: LineSpan,
        ) -> BoxFuture<'_, Result<LineEntries<HitCount>, FetchError>> {
            Box::pin(async move {
                Ok(span
                    .lines()
                    .filter(|line| line % 2 == 1)
                    .map(|line| (line, HitCount::new(line as u64)))
                    .collect())
            })
        }
    }

    fn coordinator() -> FetchCoordinator<OddLines> {
        FetchCoordinator::new(
            CoordinatorConfig::default(),
            Arc::new(OddLines),
            Arc::new(NoOpReporter),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_annotate_after_settle() {
        let coordinator = coordinator();
        let source = SourceId::new("1");
        let visible = [EditorRange::new(0, 3).unwrap()];

        let spans = request_visible(&coordinator, &source, &visible, Some(3)).unwrap();
        assert_eq!(spans, vec![LineSpan::new(1, 3).unwrap()]);
        coordinator.wait_until_settled().await;

        let marks: Vec<_> = annotate(&coordinator, &source, &spans)
            .into_iter()
            .map(|a| (a.editor_line, a.mark))
            .collect();
        assert_eq!(
            marks,
            vec![
                (0, GutterMark::Hits(1)),
                (1, GutterMark::NoData),
                (2, GutterMark::Hits(3)),
            ]
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_annotate_while_in_flight() {
        let coordinator = coordinator();
        let source = SourceId::new("1");
        let visible = [EditorRange::new(0, 1).unwrap()];

        // The spawned fetch cannot run before this task yields.
        let spans = request_visible(&coordinator, &source, &visible, None).unwrap();
        let annotations = annotate(&coordinator, &source, &spans);
        assert!(annotations.iter().all(|a| a.mark == GutterMark::Pending));
    }

    #[test]
    fn test_pending_annotations_dedup() {
        let visible = [
            EditorRange::new(0, 2).unwrap(),
            EditorRange::new(2, 3).unwrap(),
        ];
        let annotations = pending_annotations(&visible);
        let lines: Vec<_> = annotations.iter().map(|a| a.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_group_by_mark() {
        let annotations = [
            LineAnnotation {
                line: 1,
                editor_line: 0,
                mark: GutterMark::Hits(2),
            },
            LineAnnotation {
                line: 2,
                editor_line: 1,
                mark: GutterMark::Pending,
            },
            LineAnnotation {
                line: 3,
                editor_line: 2,
                mark: GutterMark::Hits(2),
            },
        ];
        let groups = group_by_mark(&annotations);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&GutterMark::Hits(2)], vec![0, 2]);
        assert_eq!(groups[&GutterMark::Pending], vec![1]);
    }
}
