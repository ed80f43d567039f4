//! Line/tile arithmetic.
//!
//! Per-line data is fetched in fixed-size tiles so that scrolling through a
//! file issues a handful of batched requests instead of one per line. Tile
//! boundaries are a pure function of the tile size:
//!
//! ```text
//! tile size 4:   lines 1-4 | 5-8 | 9-12 | ...
//!                tile  0   |  1  |  2   | ...
//! ```
//!
//! # Example
//!
//! ```
//! use linetiles::tile::RangeTiler;
//!
//! let tiler = RangeTiler::new(4).unwrap();
//! let tiles: Vec<_> = tiler
//!     .tiles_covering(1, 10)
//!     .unwrap()
//!     .map(|(_, span)| (span.start, span.end))
//!     .collect();
//! assert_eq!(tiles, vec![(1, 4), (5, 8), (9, 12)]);
//! ```

mod types;

pub use types::{LineSpan, TileError, TileSpans, DEFAULT_TILE_SIZE, WIDE_TILE_SIZE};

/// Maps 1-based line numbers to tile indices and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeTiler {
    tile_size: u32,
}

impl RangeTiler {
    /// Creates a tiler with the given number of lines per tile.
    ///
    /// # Errors
    ///
    /// Returns `TileError::InvalidTileSize` if `tile_size` is zero.
    pub fn new(tile_size: u32) -> Result<Self, TileError> {
        if tile_size == 0 {
            return Err(TileError::InvalidTileSize(tile_size));
        }
        Ok(Self { tile_size })
    }

    /// Lines per tile.
    #[inline]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Returns the index of the tile containing `line`.
    ///
    /// # Errors
    ///
    /// Returns `TileError::InvalidLine` if `line < 1`.
    #[inline]
    pub fn tile_of(&self, line: u32) -> Result<u32, TileError> {
        if line < 1 {
            return Err(TileError::InvalidLine(line));
        }
        Ok((line - 1) / self.tile_size)
    }

    /// First line of the tile.
    #[inline]
    pub fn tile_start(&self, tile: u32) -> u32 {
        tile * self.tile_size + 1
    }

    /// Last line of the tile (inclusive).
    #[inline]
    pub fn tile_end(&self, tile: u32) -> u32 {
        (tile + 1).saturating_mul(self.tile_size)
    }

    /// The full line span of a tile.
    pub fn tile_span(&self, tile: u32) -> LineSpan {
        LineSpan {
            start: self.tile_start(tile),
            end: self.tile_end(tile),
        }
    }

    /// Returns the tiles covering `[from, to]`, in ascending order.
    ///
    /// # Errors
    ///
    /// Returns `TileError::InvalidLine` if `from < 1` and
    /// `TileError::InvalidRange` if `to < from`.
    pub fn tiles_covering(&self, from: u32, to: u32) -> Result<TileSpans, TileError> {
        let span = LineSpan::new(from, to)?;
        Ok(TileSpans {
            tile_size: self.tile_size,
            next: self.tile_of(span.start)?,
            last: self.tile_of(span.end)?,
            done: false,
        })
    }
}

impl Default for RangeTiler {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_of_default_size() {
        let tiler = RangeTiler::default();
        assert_eq!(tiler.tile_of(1).unwrap(), 0);
        assert_eq!(tiler.tile_of(4).unwrap(), 0);
        assert_eq!(tiler.tile_of(5).unwrap(), 1);
        assert_eq!(tiler.tile_of(12).unwrap(), 2);
    }

    #[test]
    fn test_tile_bounds() {
        let tiler = RangeTiler::new(4).unwrap();
        assert_eq!(tiler.tile_start(0), 1);
        assert_eq!(tiler.tile_end(0), 4);
        assert_eq!(tiler.tile_start(2), 9);
        assert_eq!(tiler.tile_end(2), 12);
    }

    #[test]
    fn test_wide_tiles() {
        let tiler = RangeTiler::new(WIDE_TILE_SIZE).unwrap();
        assert_eq!(tiler.tile_of(100).unwrap(), 0);
        assert_eq!(tiler.tile_of(101).unwrap(), 1);
        assert_eq!(tiler.tile_span(1), LineSpan::new(101, 200).unwrap());
    }

    #[test]
    fn test_line_zero_is_invalid() {
        let tiler = RangeTiler::default();
        let err = tiler.tile_of(0).unwrap_err();
        assert_eq!(err, TileError::InvalidLine(0));
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_zero_tile_size_is_invalid() {
        assert_eq!(
            RangeTiler::new(0).unwrap_err(),
            TileError::InvalidTileSize(0)
        );
    }

    #[test]
    fn test_tiles_covering_one_to_ten() {
        let tiler = RangeTiler::new(4).unwrap();
        let tiles: Vec<_> = tiler.tiles_covering(1, 10).unwrap().collect();

        assert_eq!(tiles.len(), 3);
        assert_eq!(tiles[0], (0, LineSpan::new(1, 4).unwrap()));
        assert_eq!(tiles[1], (1, LineSpan::new(5, 8).unwrap()));
        assert_eq!(tiles[2], (2, LineSpan::new(9, 12).unwrap()));
    }

    #[test]
    fn test_tiles_covering_single_line() {
        let tiler = RangeTiler::new(4).unwrap();
        let tiles: Vec<_> = tiler.tiles_covering(5, 5).unwrap().collect();
        assert_eq!(tiles, vec![(1, LineSpan::new(5, 8).unwrap())]);
    }

    #[test]
    fn test_tiles_covering_reports_exact_size() {
        let tiler = RangeTiler::new(4).unwrap();
        let mut tiles = tiler.tiles_covering(3, 17).unwrap();
        assert_eq!(tiles.len(), 5);
        tiles.next();
        assert_eq!(tiles.len(), 4);
    }

    #[test]
    fn test_tiles_covering_rejects_bad_ranges() {
        let tiler = RangeTiler::default();
        assert_eq!(
            tiler.tiles_covering(0, 4).unwrap_err(),
            TileError::InvalidLine(0)
        );
        assert_eq!(
            tiler.tiles_covering(9, 3).unwrap_err(),
            TileError::InvalidRange { from: 9, to: 3 }
        );
    }

    #[test]
    fn test_line_span_helpers() {
        let span = LineSpan::new(5, 8).unwrap();
        assert_eq!(span.len(), 4);
        assert!(span.contains(5));
        assert!(span.contains(8));
        assert!(!span.contains(9));
        assert!(span.covers(&LineSpan::single(6).unwrap()));
        assert!(!span.covers(&LineSpan::new(7, 9).unwrap()));
        assert_eq!(span.lines().collect::<Vec<_>>(), vec![5, 6, 7, 8]);
        assert_eq!(span.to_string(), "5-8");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_line_within_its_tile(
                tile_size in 1u32..=512,
                line in 1u32..=10_000_000
            ) {
                let tiler = RangeTiler::new(tile_size)?;
                let tile = tiler.tile_of(line)?;
                prop_assert!(tiler.tile_start(tile) <= line);
                prop_assert!(line <= tiler.tile_end(tile));
            }

            #[test]
            fn test_covering_tiles_are_contiguous(
                tile_size in 1u32..=128,
                from in 1u32..=100_000,
                extra in 0u32..=2_000
            ) {
                let tiler = RangeTiler::new(tile_size)?;
                let to = from + extra;
                let tiles: Vec<_> = tiler.tiles_covering(from, to)?.collect();

                prop_assert!(!tiles.is_empty());
                prop_assert!(tiles[0].1.contains(from));
                prop_assert!(tiles[tiles.len() - 1].1.contains(to));
                for pair in tiles.windows(2) {
                    prop_assert_eq!(pair[0].0 + 1, pair[1].0);
                    prop_assert_eq!(pair[0].1.end + 1, pair[1].1.start);
                }
            }

            #[test]
            fn test_tile_bounds_ignore_history(
                tile_size in 1u32..=256,
                lines in proptest::collection::vec(1u32..=50_000, 1..20)
            ) {
                let tiler = RangeTiler::new(tile_size)?;
                let first: Vec<_> = lines.iter().map(|l| tiler.tile_of(*l)).collect();
                let second: Vec<_> = lines.iter().rev().map(|l| tiler.tile_of(*l)).collect();
                let reversed: Vec<_> = second.into_iter().rev().collect();
                prop_assert_eq!(first, reversed);
            }
        }
    }
}
