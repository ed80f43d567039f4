//! Per-line gutter marks.

use std::fmt;

use crate::source::HitCount;

/// Metadata that carries a hit count.
pub trait HitCounted {
    fn hit_count(&self) -> u64;
}

impl HitCounted for HitCount {
    fn hit_count(&self) -> u64 {
        self.count
    }
}

impl HitCounted for u64 {
    fn hit_count(&self) -> u64 {
        *self
    }
}

/// What the gutter shows next to one line.
///
/// Each variant maps to one decoration kind; lines sharing a mark share a
/// decoration set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GutterMark {
    /// Data for the line is being fetched.
    Pending,
    /// The line executed this many times.
    Hits(u64),
    /// Nothing is known about the line.
    NoData,
}

impl GutterMark {
    /// Short gutter label.
    pub fn label(&self) -> String {
        match self {
            Self::Pending => "?".to_string(),
            Self::Hits(count) => count.to_string(),
            Self::NoData => "·".to_string(),
        }
    }

    /// Hover text.
    pub fn hover(&self) -> String {
        match self {
            Self::Pending => "pending...".to_string(),
            Self::Hits(1) => "1 hit".to_string(),
            Self::Hits(count) => format!("{} hits", count),
            Self::NoData => "no data".to_string(),
        }
    }
}

impl fmt::Display for GutterMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// A gutter mark placed on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineAnnotation {
    /// Replay line (1-based)
    pub line: u32,
    /// Editor line (0-based)
    pub editor_line: u32,
    pub mark: GutterMark,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(GutterMark::Pending.label(), "?");
        assert_eq!(GutterMark::Hits(12).label(), "12");
        assert_eq!(GutterMark::Hits(0).to_string(), "0");
    }

    #[test]
    fn test_hover() {
        assert_eq!(GutterMark::Pending.hover(), "pending...");
        assert_eq!(GutterMark::Hits(1).hover(), "1 hit");
        assert_eq!(GutterMark::Hits(3).hover(), "3 hits");
        assert_eq!(GutterMark::NoData.hover(), "no data");
    }

    #[test]
    fn test_hit_counted() {
        assert_eq!(HitCount::new(7).hit_count(), 7);
        assert_eq!(9u64.hit_count(), 9);
    }
}
