//! Source location tracking for error reporting.
//!
//! Provides [`Span`], a half-open byte range into the source text together
//! with the line the range starts on.

use std::fmt;
use std::ops::Range;

/// A span of source code.
///
/// Offsets are byte-based and half-open (`start..end`). The line is 1-indexed
/// and refers to the line containing `start`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset of the first character.
    pub start: u32,
    /// Byte offset one past the last character.
    pub end: u32,
    /// Line number (1-indexed) of `start`.
    pub line: u32,
}

impl Span {
    /// Create a new span from a byte range and the line it starts on.
    #[inline]
    pub fn new(start: u32, end: u32, line: u32) -> Self {
        Self { start, end, line }
    }

    /// Create a zero-length span at a position.
    #[inline]
    pub fn point(offset: u32, line: u32) -> Self {
        Self {
            start: offset,
            end: offset,
            line,
        }
    }

    /// Whether this span is empty (zero length).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The length of this span in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// The span as a `usize` range, for slicing the source.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// Merge two spans into one covering both.
    ///
    /// The line of the merged span is the line of whichever span starts first.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        let (first, _) = if self.start <= other.start {
            (self, other)
        } else {
            (other, self)
        };
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line: first.line,
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}..{}", self.line, self.start, self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}", self.line)
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.range()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_basics() {
        let span = Span::new(5, 15, 1);
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());
        assert_eq!(span.range(), 5..15);

        let empty = Span::point(5, 1);
        assert!(empty.is_empty());
    }

    #[test]
    fn span_display() {
        let span = Span::new(30, 35, 3);
        assert_eq!(format!("{}", span), "line 3");
        assert_eq!(format!("{:?}", span), "3:30..35");
    }

    #[test]
    fn span_merge_disjoint() {
        let foo = Span::new(4, 7, 1);
        let bar = Span::new(9, 12, 1);
        let merged = foo.merge(bar);

        assert_eq!(merged, Span::new(4, 12, 1));
    }

    #[test]
    fn span_merge_reverse_order() {
        let later = Span::new(20, 23, 2);
        let earlier = Span::new(4, 7, 1);
        let merged = later.merge(earlier);

        // The earlier span decides the line
        assert_eq!(merged, Span::new(4, 23, 1));
    }

    #[test]
    fn span_merge_with_point_span() {
        let span = Span::new(5, 15, 1);
        let merged = span.merge(Span::point(8, 1));

        assert_eq!(merged, span);
    }
}
