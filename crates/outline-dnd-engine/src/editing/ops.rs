use xi_rope::delta::Builder;
use xi_rope::{Delta, Rope, RopeInfo};

use crate::error::DndError;

/// A single text edit, expressed in the pre-edit coordinate space
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOperation {
    /// Remove the half-open byte range `from..to`
    Delete { from: usize, to: usize },
    /// Insert `text` at `from`
    Insert { from: usize, text: String },
}

impl EditOperation {
    pub fn offset(&self) -> usize {
        match self {
            EditOperation::Delete { from, .. } | EditOperation::Insert { from, .. } => *from,
        }
    }

    fn is_delete(&self) -> bool {
        matches!(self, EditOperation::Delete { .. })
    }
}

/// Edits for the document a block is dragged from and the one it lands in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub source_ops: Vec<EditOperation>,
    pub target_ops: Vec<EditOperation>,
}

impl Plan {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.source_ops.is_empty() && self.target_ops.is_empty()
    }

    /// Both lists as one, for a drop within a single document
    pub fn merged(&self) -> Vec<EditOperation> {
        self.source_ops
            .iter()
            .chain(self.target_ops.iter())
            .cloned()
            .collect()
    }
}

/// Sort and check an edit list against a document of `len` bytes.
///
/// Insertions at an offset go before a deletion starting there; edits at the
/// same offset otherwise keep their relative order. Rejects out-of-bounds
/// edits, overlapping deletions and insertions strictly inside a deletion.
pub fn normalize(ops: &[EditOperation], len: usize) -> Result<Vec<EditOperation>, DndError> {
    for op in ops {
        match op {
            EditOperation::Delete { from, to } => {
                if from > to {
                    return Err(DndError::InvalidRange {
                        from: *from,
                        to: *to,
                    });
                }
                if *to > len {
                    return Err(DndError::PositionOutsideDocument { offset: *to, len });
                }
            }
            EditOperation::Insert { from, .. } => {
                if *from > len {
                    return Err(DndError::PositionOutsideDocument { offset: *from, len });
                }
            }
        }
    }

    let mut sorted = ops.to_vec();
    sorted.sort_by_key(|op| (op.offset(), op.is_delete()));

    let mut deleted_until = 0;
    let mut last_delete = 0..0;
    for op in &sorted {
        match op {
            EditOperation::Delete { from, to } => {
                if *from < deleted_until {
                    return Err(DndError::OverlappingEdits {
                        at: *from,
                        from: last_delete.start,
                        to: last_delete.end,
                    });
                }
                deleted_until = *to;
                last_delete = *from..*to;
            }
            EditOperation::Insert { from, .. } => {
                if *from < deleted_until && *from > last_delete.start {
                    return Err(DndError::OverlappingEdits {
                        at: *from,
                        from: last_delete.start,
                        to: last_delete.end,
                    });
                }
            }
        }
    }

    Ok(sorted)
}

/// Compile a normalized edit list into a delta over a document of `len` bytes
pub(crate) fn build_delta(sorted: &[EditOperation], len: usize) -> Delta<RopeInfo> {
    let mut builder = Builder::new(len);
    for op in sorted {
        match op {
            EditOperation::Delete { from, to } => builder.delete(*from..*to),
            EditOperation::Insert { from, text } => {
                builder.replace(*from..*from, Rope::from(text.as_str()))
            }
        }
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn insert(from: usize, text: &str) -> EditOperation {
        EditOperation::Insert {
            from,
            text: text.to_string(),
        }
    }

    fn delete(from: usize, to: usize) -> EditOperation {
        EditOperation::Delete { from, to }
    }

    #[test]
    fn insert_sorts_before_delete_at_same_offset() {
        let sorted = normalize(&[delete(3, 8), insert(3, "x")], 10).unwrap();
        assert_eq!(sorted, vec![insert(3, "x"), delete(3, 8)]);
    }

    #[test]
    fn inserts_at_same_offset_keep_order() {
        let sorted = normalize(&[insert(4, "a"), insert(4, "b")], 10).unwrap();
        assert_eq!(sorted, vec![insert(4, "a"), insert(4, "b")]);
    }

    #[test]
    fn insert_at_delete_end_is_allowed() {
        let sorted = normalize(&[insert(8, "x"), delete(3, 8)], 10).unwrap();
        assert_eq!(sorted, vec![delete(3, 8), insert(8, "x")]);
    }

    #[test]
    fn insert_inside_delete_is_rejected() {
        let result = normalize(&[delete(3, 8), insert(5, "x")], 10);
        assert_eq!(
            result,
            Err(DndError::OverlappingEdits {
                at: 5,
                from: 3,
                to: 8
            })
        );
    }

    #[test]
    fn overlapping_deletes_are_rejected() {
        let result = normalize(&[delete(3, 8), delete(6, 9)], 10);
        assert!(matches!(result, Err(DndError::OverlappingEdits { .. })));
    }

    #[test]
    fn out_of_bounds_edit_is_rejected() {
        assert_eq!(
            normalize(&[insert(11, "x")], 10),
            Err(DndError::PositionOutsideDocument { offset: 11, len: 10 })
        );
        assert_eq!(
            normalize(&[delete(2, 1)], 10),
            Err(DndError::InvalidRange { from: 2, to: 1 })
        );
    }

    #[test]
    fn delta_applies_all_edits_in_original_coordinates() {
        let text = "- a\n\t- b\n- c\n";
        let ops = normalize(&[delete(3, 8), insert(12, "\n\t- b")], text.len()).unwrap();
        let delta = build_delta(&ops, text.len());

        let result = delta.apply(&Rope::from(text));

        assert_eq!(result.to_string(), "- a\n- c\n\t- b\n");
    }

    #[test]
    fn plan_merges_source_before_target() {
        let plan = Plan {
            source_ops: vec![insert(3, " ^id")],
            target_ops: vec![insert(3, " ![[doc#^id]]")],
        };
        assert_eq!(
            plan.merged(),
            vec![insert(3, " ^id"), insert(3, " ![[doc#^id]]")]
        );
        assert!(!plan.is_empty());
        assert!(Plan::empty().is_empty());
    }
}
