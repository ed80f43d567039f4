//! Editor line ranges and conversion to breakable replay lines.

use std::fmt;

use crate::tile::{LineSpan, TileError};

/// Editor line (0-based) to replay line (1-based).
#[inline]
pub fn editor_to_line(editor_line: u32) -> u32 {
    editor_line.saturating_add(1)
}

/// Replay line (1-based) to editor line (0-based).
#[inline]
pub fn line_to_editor(line: u32) -> u32 {
    line.saturating_sub(1)
}

/// A visible range of an editor, in 0-based inclusive editor lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EditorRange {
    pub start: u32,
    pub end: u32,
}

impl EditorRange {
    /// # Errors
    ///
    /// `TileError::InvalidRange` if `end < start`.
    pub fn new(start: u32, end: u32) -> Result<Self, TileError> {
        if end < start {
            return Err(TileError::InvalidRange {
                from: start,
                to: end,
            });
        }
        Ok(Self { start, end })
    }

    /// The same lines as a 1-based span.
    pub fn to_span(self) -> LineSpan {
        LineSpan {
            start: editor_to_line(self.start),
            end: editor_to_line(self.end),
        }
    }
}

impl fmt::Display for EditorRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// Replay spans for the visible ranges, limited to breakable lines.
///
/// Ranges starting past `max_line` are dropped and the rest are clamped to
/// it. `None` means the limit is unknown and nothing is clamped.
pub fn breakable_spans(visible: &[EditorRange], max_line: Option<u32>) -> Vec<LineSpan> {
    visible
        .iter()
        .filter_map(|range| {
            let span = range.to_span();
            match max_line {
                Some(max) if span.start > max => None,
                Some(max) => Some(LineSpan {
                    start: span.start,
                    end: span.end.min(max),
                }),
                None => Some(span),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: u32, end: u32) -> EditorRange {
        EditorRange::new(start, end).unwrap()
    }

    #[test]
    fn test_line_conversion() {
        assert_eq!(editor_to_line(0), 1);
        assert_eq!(line_to_editor(1), 0);
        assert_eq!(line_to_editor(editor_to_line(41)), 41);
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert_eq!(
            EditorRange::new(5, 2),
            Err(TileError::InvalidRange { from: 5, to: 2 })
        );
    }

    #[test]
    fn test_breakable_spans_unbounded() {
        let spans = breakable_spans(&[range(0, 9)], None);
        assert_eq!(spans, vec![LineSpan::new(1, 10).unwrap()]);
    }

    #[test]
    fn test_breakable_spans_clamped() {
        let spans = breakable_spans(&[range(0, 9), range(20, 30), range(5, 5)], Some(8));
        assert_eq!(
            spans,
            vec![LineSpan::new(1, 8).unwrap(), LineSpan::new(6, 6).unwrap()]
        );
    }

    #[test]
    fn test_range_starting_at_max_line_kept() {
        let spans = breakable_spans(&[range(7, 12)], Some(8));
        assert_eq!(spans, vec![LineSpan::new(8, 8).unwrap()]);
    }
}
