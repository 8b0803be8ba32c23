use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DndError {
    /// A mapped position no longer falls inside the live buffer,
    /// usually because the document changed mid-drag
    #[error("Position {offset} is outside of document (length {len})")]
    PositionOutsideDocument { offset: usize, len: usize },

    #[error("Line {line} is outside of document ({line_count} lines)")]
    LineOutOfRange { line: usize, line_count: usize },

    #[error("Invalid edit range {from}..{to}")]
    InvalidRange { from: usize, to: usize },

    #[error("Edit at {at} overlaps a deleted range {from}..{to}")]
    OverlappingEdits { at: usize, from: usize, to: usize },

    #[error("Unknown document: {0}")]
    UnknownDocument(String),

    #[error("Unknown pane: {0}")]
    UnknownPane(usize),
}

impl DndError {
    /// True for the stale-coordinate failures that abort a drag silently
    pub fn is_position_outside_document(&self) -> bool {
        matches!(
            self,
            DndError::PositionOutsideDocument { .. } | DndError::LineOutOfRange { .. }
        )
    }
}
