//! Line span and tile types.

use std::fmt;

use thiserror::Error;

/// Tile size used by the editor integration.
pub const DEFAULT_TILE_SIZE: u32 = 4;

/// Larger tile size for bulk reads (whole files, CLI dumps).
pub const WIDE_TILE_SIZE: u32 = 100;

/// Errors raised for malformed line arguments.
///
/// All variants belong to the "invalid argument" kind: they are reported
/// synchronously to the caller and never reach the fetch path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TileError {
    /// Line numbers are 1-based, so zero is never a valid line.
    #[error("Invalid line {0}: lines start at 1")]
    InvalidLine(u32),

    /// The end of a range lies before its start.
    #[error("Invalid line range {from}-{to}: end must not precede start")]
    InvalidRange { from: u32, to: u32 },

    /// A tiler needs at least one line per tile.
    #[error("Invalid tile size {0}: must be at least 1")]
    InvalidTileSize(u32),
}

impl TileError {
    /// Every tile error is an invalid-argument error.
    pub fn is_invalid_argument(&self) -> bool {
        true
    }
}

/// An inclusive range of 1-based lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineSpan {
    /// First line (inclusive, >= 1)
    pub start: u32,
    /// Last line (inclusive, >= start)
    pub end: u32,
}

impl LineSpan {
    /// Creates a span, validating `1 <= start <= end`.
    pub fn new(start: u32, end: u32) -> Result<Self, TileError> {
        if start < 1 {
            return Err(TileError::InvalidLine(start));
        }
        if end < start {
            return Err(TileError::InvalidRange {
                from: start,
                to: end,
            });
        }
        Ok(Self { start, end })
    }

    /// Creates a span covering a single line.
    pub fn single(line: u32) -> Result<Self, TileError> {
        Self::new(line, line)
    }

    /// Number of lines in the span.
    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }

    /// A valid span always holds at least one line.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns true if `line` falls inside the span.
    pub fn contains(&self, line: u32) -> bool {
        (self.start..=self.end).contains(&line)
    }

    /// Returns true if `other` lies entirely inside this span.
    pub fn covers(&self, other: &LineSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Iterates every line of the span in ascending order.
    pub fn lines(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.end
    }
}

impl fmt::Display for LineSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Iterator over the tiles covering a line range.
///
/// Yields `(tile_index, span)` pairs in ascending order.
#[derive(Debug, Clone)]
pub struct TileSpans {
    pub(super) tile_size: u32,
    pub(super) next: u32,
    pub(super) last: u32,
    pub(super) done: bool,
}

impl Iterator for TileSpans {
    type Item = (u32, LineSpan);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let index = self.next;
        let span = LineSpan {
            start: index * self.tile_size + 1,
            end: (index + 1).saturating_mul(self.tile_size),
        };

        if index == self.last {
            self.done = true;
        } else {
            self.next += 1;
        }

        Some((index, span))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.done {
            0
        } else {
            (self.last - self.next) as usize + 1
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileSpans {}
