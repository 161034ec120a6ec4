//! Offset tracking for syntactic elements.
//!
//! Every AST node carries an [`Offsets`] value recording where it starts and
//! ends in the translation unit, both as byte offsets and as line numbers.

use crate::Span;

/// Start/end byte offsets and line numbers of a syntactic element.
///
/// The ending position never precedes the starting position: setting an
/// end before the start clamps it to the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Offsets {
    starting_offset: u32,
    ending_offset: u32,
    starting_line: u32,
    ending_line: u32,
    sealed: bool,
}

impl Offsets {
    /// Create offsets covering a single span.
    pub fn from_span(span: Span) -> Self {
        let mut offsets = Self::default();
        offsets.set_starting_offset_and_line(span.offset, span.line);
        offsets.set_ending_offset_and_line(span.end(), span.line);
        offsets
    }

    /// Record where the element starts.
    pub fn set_starting_offset_and_line(&mut self, offset: u32, line: u32) {
        debug_assert!(!self.sealed, "offsets modified after sealing");
        self.starting_offset = offset;
        self.starting_line = line;
        self.ending_offset = self.ending_offset.max(offset);
        self.ending_line = self.ending_line.max(line);
    }

    /// Record where the element ends.
    pub fn set_ending_offset_and_line(&mut self, offset: u32, line: u32) {
        debug_assert!(!self.sealed, "offsets modified after sealing");
        self.ending_offset = offset.max(self.starting_offset);
        self.ending_line = line.max(self.starting_line);
    }

    /// Freeze the offsets. Further updates are a logic error.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Whether [`seal`](Self::seal) has been called.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn starting_offset(&self) -> u32 {
        self.starting_offset
    }

    pub fn ending_offset(&self) -> u32 {
        self.ending_offset
    }

    pub fn starting_line(&self) -> u32 {
        self.starting_line
    }

    pub fn ending_line(&self) -> u32 {
        self.ending_line
    }

    /// Number of bytes covered.
    pub fn length(&self) -> u32 {
        self.ending_offset - self.starting_offset
    }

    /// Whether `offset` falls inside `[start, end)`.
    pub fn contains(&self, offset: u32) -> bool {
        offset >= self.starting_offset && offset < self.ending_offset
    }
}
