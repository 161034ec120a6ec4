//! Source location tracking for tokens and errors.
//!
//! Provides [`Span`] to track where tokens and errors occur in source code.

use std::fmt;

/// A span of source code.
///
/// Tracks the byte offset where a token starts together with the
/// line:column position used for error reporting.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset from the start of the translation unit.
    pub offset: u32,
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    /// Create a new span from an offset, line, column, and length.
    #[inline]
    pub fn new(offset: u32, line: u32, col: u32, len: u32) -> Self {
        Self {
            offset,
            line,
            col,
            len,
        }
    }

    /// Create a zero-length span at a position.
    #[inline]
    pub fn point(offset: u32, line: u32, col: u32) -> Self {
        Self {
            offset,
            line,
            col,
            len: 0,
        }
    }

    /// Whether this span is empty (zero length).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The length of this span in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Byte offset one past the last byte of this span.
    #[inline]
    pub fn end(&self) -> u32 {
        self.offset + self.len
    }

    /// Merge two spans into one covering both.
    ///
    /// The result starts at whichever span comes first in the source and
    /// ends where the later one ends.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        let first = if self.offset <= other.offset { self } else { other };
        let end = self.end().max(other.end());
        Span {
            offset: first.offset,
            line: first.line,
            col: first.col,
            len: end - first.offset,
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.line, self.col, self.offset)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_basics() {
        let span = Span::new(4, 1, 5, 10);
        assert_eq!(span.len(), 10);
        assert_eq!(span.end(), 14);
        assert!(!span.is_empty());

        let empty = Span::point(4, 1, 5);
        assert!(empty.is_empty());
    }

    #[test]
    fn span_display() {
        let span = Span::new(40, 3, 15, 5);
        assert_eq!(format!("{}", span), "3:15");
    }

    #[test]
    fn span_merge_in_order() {
        let a = Span::new(4, 1, 5, 3);
        let b = Span::new(9, 1, 10, 3);
        let merged = a.merge(b);

        assert_eq!(merged.offset, 4);
        assert_eq!(merged.col, 5);
        assert_eq!(merged.len, 8);
    }

    #[test]
    fn span_merge_reverse_order() {
        let a = Span::new(9, 1, 10, 3);
        let b = Span::new(4, 1, 5, 3);
        let merged = a.merge(b);

        assert_eq!(merged.offset, 4);
        assert_eq!(merged.len, 8);
    }

    #[test]
    fn span_merge_across_lines() {
        let a = Span::new(0, 1, 1, 8);
        let b = Span::new(20, 3, 2, 1);
        let merged = a.merge(b);

        assert_eq!(merged.line, 1);
        assert_eq!(merged.end(), 21);
    }

    #[test]
    fn span_merge_with_contained_span() {
        let span = Span::new(4, 1, 5, 10);
        let point = Span::point(7, 1, 8);
        let merged = span.merge(point);

        assert_eq!(merged.offset, 4);
        assert_eq!(merged.len, 10);
    }
}
