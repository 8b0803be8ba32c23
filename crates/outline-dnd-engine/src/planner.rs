//! Turns a resolved drop into edit lists for the source and target documents.

use outline_dnd_config::OperationKind;

use crate::editing::{EditOperation, Plan};
use crate::error::DndError;
use crate::identity::{IdGenerator, ensure_id};
use crate::indent::{indent_of, reindent};
use crate::locate::find_enclosing;
use crate::parsing::{NodeKind, StructuralNode, Tree};

/// Where a drop lands relative to the hovered block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightMode {
    /// Insert as the first child of the hovered block
    Current,
    /// Insert as the next sibling of the hovered block, under its parent
    Parent,
}

impl HighlightMode {
    pub fn nesting_delta(self) -> usize {
        match self {
            HighlightMode::Current => 1,
            HighlightMode::Parent => 0,
        }
    }
}

/// One side of a drop: a document snapshot and a line in it
#[derive(Debug, Clone, Copy)]
pub struct DropSite<'a> {
    /// Document name used in transclusion links
    pub name: &'a str,
    pub tree: &'a Tree,
    pub line: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct DropRequest<'a> {
    pub kind: OperationKind,
    pub source: DropSite<'a>,
    pub target: DropSite<'a>,
    pub mode: HighlightMode,
    /// Source and target are the same document (not merely the same pane)
    pub same_document: bool,
}

/// The resolved place new text goes in the target document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionPoint {
    pub offset: usize,
    /// Line holding `offset`
    pub line: usize,
    /// Depth of the block the insertion is relative to
    pub indent: usize,
}

/// Resolve the insertion point for a drop on `line`.
///
/// In [`HighlightMode::Current`] text goes after the paragraph at the line, so
/// a multi-line paragraph is never split. In [`HighlightMode::Parent`] it goes
/// after the hovered item's whole subtree. Without a paragraph or item the
/// raw end of the line is used.
pub fn insertion_point(
    tree: &Tree,
    line: usize,
    mode: HighlightMode,
) -> Result<InsertionPoint, DndError> {
    let raw_line = tree.line(line)?;
    let item = find_enclosing(tree, line, Some(NodeKind::ListItem));

    let subtree_end = match mode {
        HighlightMode::Parent => item.map(|item| item.span.end.offset),
        HighlightMode::Current => None,
    };
    let paragraph_end =
        || find_enclosing(tree, line, Some(NodeKind::Paragraph)).map(|p| p.span.end.offset);
    let offset = match subtree_end.or_else(paragraph_end) {
        Some(end) => end,
        None => raw_line.from + tree.line_text(line)?.len(),
    };

    let indent_line = item.map_or(line, |item| item.span.start.line);
    let indent = indent_of(tree.line_text(indent_line)?);

    Ok(InsertionPoint {
        offset,
        line: tree.lines().line_of_offset(offset)?,
        indent,
    })
}

/// Compute the edits for a drop.
///
/// Returns an empty plan for the silent no-ops: operation `none`, no list
/// item at the source line, no block at the target line, or a drop inside
/// the dragged block's own lines within the same document.
pub fn plan(request: &DropRequest<'_>, ids: &mut dyn IdGenerator) -> Result<Plan, DndError> {
    if request.kind == OperationKind::None {
        return Ok(Plan::empty());
    }

    let source_tree = request.source.tree;
    let Some(item) = find_enclosing(source_tree, request.source.line, Some(NodeKind::ListItem))
    else {
        log::debug!("No list item at source line {}", request.source.line);
        return Ok(Plan::empty());
    };

    let target_line = request.target.line;
    if request.same_document && item.span.contains_line(target_line) {
        log::debug!("Moved inside same block - do nothing");
        return Ok(Plan::empty());
    }

    let target_tree = request.target.tree;
    target_tree.line(target_line)?;
    if find_enclosing(target_tree, target_line, None).is_none() {
        log::debug!("No block at target line {target_line}");
        return Ok(Plan::empty());
    }
    let target = insertion_point(target_tree, target_line, request.mode)?;

    let plan = match request.kind {
        OperationKind::Move | OperationKind::Copy => {
            let moved = relocated_text(
                source_tree,
                item,
                &target,
                request.mode,
                line_ending(target_tree.text()),
            )?;
            let insert = EditOperation::Insert {
                from: target.offset,
                text: moved,
            };
            let source_ops = if request.kind == OperationKind::Move {
                vec![removal(source_tree, item)?]
            } else {
                Vec::new()
            };
            Plan {
                source_ops,
                target_ops: vec![insert],
            }
        }
        OperationKind::Embed => {
            let identity = ensure_id(item, ids);
            let link = EditOperation::Insert {
                from: target.offset,
                text: format!(" {}", transclusion(request.source.name, &identity.id)),
            };
            Plan {
                source_ops: identity.edits,
                target_ops: vec![link],
            }
        }
        OperationKind::None => Plan::empty(),
    };

    log::info!("Move item {} {:?}", request.kind, plan);
    Ok(plan)
}

/// `![[name#^id]]`
pub fn transclusion(document_name: &str, id: &str) -> String {
    format!("![[{document_name}#^{id}]]")
}

/// The line break style of a document, taken from its first line break
fn line_ending(text: &str) -> &'static str {
    match text.find('\n') {
        Some(at) if text[..at].ends_with('\r') => "\r\n",
        _ => "\n",
    }
}

/// The dragged block from the start of its first line, with a leading line
/// break, shifted to its new depth and written with the target's line breaks
fn relocated_text(
    tree: &Tree,
    item: &StructuralNode,
    target: &InsertionPoint,
    mode: HighlightMode,
    newline: &str,
) -> Result<String, DndError> {
    let first_line = tree.lines().line_at_offset(item.span.start.offset)?;
    let block = tree.text()[first_line.from..item.span.end.offset].replace("\r\n", "\n");
    let source_indent = indent_of(&block);

    let moved = reindent(
        &format!("\n{block}"),
        source_indent,
        target.indent,
        mode.nesting_delta(),
    );
    Ok(if newline == "\n" {
        moved
    } else {
        moved.replace('\n', newline)
    })
}

/// Delete the block's lines together with the line break before them. A block
/// at the very start of the document takes the line break after it instead.
fn removal(tree: &Tree, item: &StructuralNode) -> Result<EditOperation, DndError> {
    let text = tree.text();
    let first_line = tree.lines().line_at_offset(item.span.start.offset)?;
    let to = item.span.end.offset;

    if first_line.from > 0 {
        let before = &text[..first_line.from];
        let break_len = if before.ends_with("\r\n") { 2 } else { 1 };
        return Ok(EditOperation::Delete {
            from: first_line.from - break_len,
            to,
        });
    }

    let rest = &text[to..];
    let trailing_break = if rest.starts_with("\r\n") {
        2
    } else {
        usize::from(rest.starts_with('\n'))
    };
    Ok(EditOperation::Delete {
        from: 0,
        to: to + trailing_break,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{build_delta, normalize};
    use crate::parsing::parse;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use xi_rope::Rope;

    fn apply(text: &str, ops: &[EditOperation]) -> String {
        let sorted = normalize(ops, text.len()).unwrap();
        build_delta(&sorted, text.len())
            .apply(&Rope::from(text))
            .to_string()
    }

    fn same_doc(
        kind: OperationKind,
        tree: &Tree,
        source_line: usize,
        target_line: usize,
        mode: HighlightMode,
    ) -> Plan {
        let request = DropRequest {
            kind,
            source: DropSite {
                name: "notes",
                tree,
                line: source_line,
            },
            target: DropSite {
                name: "notes",
                tree,
                line: target_line,
            },
            mode,
            same_document: true,
        };
        let mut ids = || "abc123".to_string();
        plan(&request, &mut ids).unwrap()
    }

    fn move_within(
        text: &str,
        source_line: usize,
        target_line: usize,
        mode: HighlightMode,
    ) -> String {
        let tree = parse(text);
        let plan = same_doc(OperationKind::Move, &tree, source_line, target_line, mode);
        apply(text, &plan.merged())
    }

    #[rstest]
    #[case(HighlightMode::Current, "- a\n- c\n\t- b\n")]
    #[case(HighlightMode::Parent, "- a\n- c\n- b\n")]
    fn move_child_onto_following_item(#[case] mode: HighlightMode, #[case] expected: &str) {
        assert_eq!(move_within("- a\n\t- b\n- c\n", 2, 3, mode), expected);
    }

    #[test]
    fn move_carries_children_along() {
        let text = "- a\n\t- b\n\t\t- b1\n- c\n";
        assert_eq!(
            move_within(text, 2, 4, HighlightMode::Parent),
            "- a\n- c\n- b\n\t- b1\n"
        );
    }

    #[test]
    fn move_deep_block_to_top_level_outdents_whole_subtree() {
        let text = "- a\n\t- b\n\t\t- c\n\t\t\t- d\n- e\n";
        assert_eq!(
            move_within(text, 3, 5, HighlightMode::Parent),
            "- a\n\t- b\n- e\n- c\n\t- d\n"
        );
    }

    #[test]
    fn move_up_as_first_child() {
        let text = "- a\n- b\n- c\n";
        assert_eq!(
            move_within(text, 3, 1, HighlightMode::Current),
            "- a\n\t- c\n- b\n"
        );
    }

    #[test]
    fn parent_mode_inserts_after_hovered_subtree() {
        let text = "- a\n\t- a1\n- b\n";
        assert_eq!(
            move_within(text, 3, 1, HighlightMode::Parent),
            "- a\n\t- a1\n- b\n"
        );
        assert_eq!(
            move_within("- x\n- a\n\t- a1\n", 1, 2, HighlightMode::Parent),
            "- a\n\t- a1\n- x\n"
        );
    }

    #[test]
    fn move_first_item_does_not_leave_blank_line() {
        assert_eq!(
            move_within("- a\n- b\n", 1, 2, HighlightMode::Parent),
            "- b\n- a\n"
        );
    }

    #[test]
    fn move_onto_multi_line_paragraph_appends_after_it() {
        let text = "- a\n- first line\n  continued\n- b\n";
        assert_eq!(
            move_within(text, 4, 3, HighlightMode::Current),
            "- a\n- first line\n  continued\n\t- b\n"
        );
    }

    #[test]
    fn move_then_move_back_restores_text() {
        let original = "- a\n\t- b\n\t\t- b1\n- c\n";
        let moved = move_within(original, 2, 4, HighlightMode::Parent);
        assert_eq!(moved, "- a\n- c\n- b\n\t- b1\n");

        // b now sits at line 3; drop it back as the first child of a
        let restored = move_within(&moved, 3, 1, HighlightMode::Current);
        assert_eq!(restored, original);
    }

    #[rstest]
    #[case(2)]
    #[case(3)]
    fn drop_inside_own_block_is_a_no_op(#[case] target_line: usize) {
        let tree = parse("- a\n\t- b\n\t\t- c\n- d\n");
        for kind in [OperationKind::Move, OperationKind::Copy, OperationKind::Embed] {
            let plan = same_doc(kind, &tree, 2, target_line, HighlightMode::Current);
            assert!(plan.is_empty());
        }
    }

    #[test]
    fn none_produces_no_edits() {
        let tree = parse("- a\n- b\n");
        assert!(same_doc(OperationKind::None, &tree, 1, 2, HighlightMode::Current).is_empty());
    }

    #[test]
    fn source_without_list_item_produces_no_edits() {
        let tree = parse("plain\n\n- b\n");
        assert!(same_doc(OperationKind::Move, &tree, 1, 3, HighlightMode::Current).is_empty());
    }

    #[test]
    fn drop_between_blocks_produces_no_edits() {
        let tree = parse("- a\n- b\n\nplain\n");
        assert!(same_doc(OperationKind::Move, &tree, 1, 3, HighlightMode::Current).is_empty());
    }

    #[test]
    fn drop_onto_heading_appends_at_line_end() {
        let text = "# Title\n\n- a\n";
        assert_eq!(
            move_within(text, 3, 1, HighlightMode::Parent),
            "# Title\n- a\n\n"
        );
    }

    #[test]
    fn target_line_outside_document_is_an_error() {
        let tree = parse("- a\n- b\n");
        let request = DropRequest {
            kind: OperationKind::Move,
            source: DropSite {
                name: "notes",
                tree: &tree,
                line: 1,
            },
            target: DropSite {
                name: "notes",
                tree: &tree,
                line: 9,
            },
            mode: HighlightMode::Current,
            same_document: true,
        };
        let mut ids = || "abc123".to_string();

        assert!(matches!(
            plan(&request, &mut ids),
            Err(DndError::LineOutOfRange { line: 9, .. })
        ));
    }

    #[test]
    fn copy_leaves_source_intact() {
        let text = "- a\n\t- b\n- c\n";
        let tree = parse(text);
        let plan = same_doc(OperationKind::Copy, &tree, 2, 3, HighlightMode::Parent);

        assert!(plan.source_ops.is_empty());
        assert_eq!(apply(text, &plan.merged()), "- a\n\t- b\n- c\n- b\n");
    }

    #[test]
    fn embed_anchors_source_and_links_target() {
        let text = "- a\n- b\n- c\n";
        let tree = parse(text);
        let plan = same_doc(OperationKind::Embed, &tree, 2, 3, HighlightMode::Current);

        assert_eq!(
            plan.source_ops,
            vec![EditOperation::Insert {
                from: 7,
                text: " ^abc123".to_string()
            }]
        );
        assert_eq!(
            plan.target_ops,
            vec![EditOperation::Insert {
                from: 11,
                text: " ![[notes#^abc123]]".to_string()
            }]
        );
        assert_eq!(
            apply(text, &plan.merged()),
            "- a\n- b ^abc123\n- c ![[notes#^abc123]]\n"
        );
    }

    #[test]
    fn embed_reuses_existing_anchor() {
        let text = "- a\n- b ^abc123\n- c\n";
        let tree = parse(text);
        let plan = same_doc(OperationKind::Embed, &tree, 2, 3, HighlightMode::Current);

        assert!(plan.source_ops.is_empty());
        assert_eq!(plan.target_ops.len(), 1);
    }

    #[test]
    fn cross_document_move_splits_edits() {
        let source_text = "- a\n\t- b\n";
        let target_text = "- x\n";
        let source = parse(source_text);
        let target = parse(target_text);
        let request = DropRequest {
            kind: OperationKind::Move,
            source: DropSite {
                name: "source",
                tree: &source,
                line: 2,
            },
            target: DropSite {
                name: "target",
                tree: &target,
                line: 1,
            },
            mode: HighlightMode::Parent,
            same_document: false,
        };
        let mut ids = || "abc123".to_string();
        let plan = plan(&request, &mut ids).unwrap();

        assert_eq!(apply(source_text, &plan.source_ops), "- a\n");
        assert_eq!(apply(target_text, &plan.target_ops), "- x\n- b\n");
    }

    #[test]
    fn self_drop_guard_only_applies_within_one_document() {
        let text = "- a\n\t- b\n";
        let source = parse(text);
        let target = parse(text);
        let request = DropRequest {
            kind: OperationKind::Copy,
            source: DropSite {
                name: "notes",
                tree: &source,
                line: 1,
            },
            target: DropSite {
                name: "notes copy",
                tree: &target,
                line: 2,
            },
            mode: HighlightMode::Current,
            same_document: false,
        };
        let mut ids = || "abc123".to_string();
        let plan = plan(&request, &mut ids).unwrap();

        assert_eq!(apply(text, &plan.target_ops), "- a\n\t- b\n\t\t- a\n\t\t\t- b\n");
    }

    #[rstest]
    #[case::parent(HighlightMode::Parent, "- a\r\n- c\r\n- b\r\n")]
    #[case::current(HighlightMode::Current, "- a\r\n- c\r\n\t- b\r\n")]
    fn move_keeps_crlf_line_endings(#[case] mode: HighlightMode, #[case] expected: &str) {
        assert_eq!(move_within("- a\r\n\t- b\r\n- c\r\n", 2, 3, mode), expected);
    }

    #[test]
    fn move_first_crlf_item_takes_both_break_bytes() {
        assert_eq!(
            move_within("- a\r\n- b\r\n", 1, 2, HighlightMode::Parent),
            "- b\r\n- a\r\n"
        );
    }

    #[test]
    fn cross_document_move_adopts_target_line_endings() {
        let source_text = "- a\n\t- b\n\t\t- c\n";
        let target_text = "- x\r\n";
        let source = parse(source_text);
        let target = parse(target_text);
        let request = DropRequest {
            kind: OperationKind::Move,
            source: DropSite {
                name: "source",
                tree: &source,
                line: 2,
            },
            target: DropSite {
                name: "target",
                tree: &target,
                line: 1,
            },
            mode: HighlightMode::Parent,
            same_document: false,
        };
        let mut ids = || "abc123".to_string();
        let plan = plan(&request, &mut ids).unwrap();

        assert_eq!(
            apply(target_text, &plan.target_ops),
            "- x\r\n- b\r\n\t- c\r\n"
        );
    }

    #[test]
    fn insertion_point_falls_back_to_line_end() {
        let tree = parse("# Heading\n");
        let point = insertion_point(&tree, 1, HighlightMode::Current).unwrap();
        assert_eq!(point.offset, 9);
        assert_eq!(point.line, 1);
        assert_eq!(point.indent, 0);

        let tree = parse("# Heading\r\n");
        let point = insertion_point(&tree, 1, HighlightMode::Current).unwrap();
        assert_eq!(point.offset, 9);
    }
}
