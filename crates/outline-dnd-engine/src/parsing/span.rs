/// A byte range `[start, end)` into the document text.
///
/// Slicing the text with any node span reproduces the exact source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    /// Inclusive start byte offset.
    pub start: usize,
    /// Exclusive end byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length in bytes. Uses saturating subtraction for safety.
    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the span is empty (start >= end).
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// True if `other` lies entirely within this span
    #[must_use]
    pub fn contains(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// A line/offset pair. Lines are 1-based, offsets 0-based bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub offset: usize,
}

/// Where a structural node sits in its document.
///
/// `start` is the node's first byte, `end.offset` is exclusive and
/// `end.line` is the line holding the node's last byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSpan {
    pub start: Position,
    pub end: Position,
}

impl NodeSpan {
    pub fn offsets(&self) -> Span {
        Span::new(self.start.offset, self.end.offset)
    }

    /// Number of lines spanned minus one; the locator's specificity measure
    pub fn height(&self) -> usize {
        self.end.line - self.start.line
    }

    pub fn contains_line(&self, line: usize) -> bool {
        self.start.line <= line && line <= self.end.line
    }
}
