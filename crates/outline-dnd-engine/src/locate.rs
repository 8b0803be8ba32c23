//! Block location over a tree snapshot: the innermost block at a line, and
//! the full subtree of a block rebuilt from parent pointers.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use crate::editing::EditOperation;
use crate::identity::{IdGenerator, ensure_id};
use crate::parsing::{NodeKind, StructuralNode, Tree};

/// The innermost node whose span contains `line`, optionally restricted to
/// one kind.
///
/// "Innermost" is the smallest `end.line - start.line`; ties go to the node
/// that comes first in document order.
pub fn find_enclosing(tree: &Tree, line: usize, kind: Option<NodeKind>) -> Option<&StructuralNode> {
    tree.nodes()
        .iter()
        .filter(|node| kind.is_none_or(|kind| node.kind == kind))
        .filter(|node| node.span.contains_line(line))
        .fold(None, |best: Option<&StructuralNode>, node| match best {
            Some(best) if best.span.height() <= node.span.height() => Some(best),
            _ => Some(node),
        })
}

/// A node plus all of its descendants, parents before children.
///
/// Descendants are found by repeatedly collecting every node whose
/// `parent_line` is the start line of a node already collected. Candidates
/// must also lie inside the root's span, so a sibling that happens to share a
/// start line with a collected node is never captured.
pub fn closure<'t>(node: &StructuralNode, all: &'t [StructuralNode]) -> Vec<&'t StructuralNode> {
    let Some(root) = all.iter().find(|candidate| candidate.id == node.id) else {
        return Vec::new();
    };
    let root_span = root.span.offsets();

    let mut included = HashSet::from([root.id]);
    let mut result = vec![root];
    let mut frontier: HashSet<usize> = HashSet::from([root.span.start.line]);

    while !frontier.is_empty() {
        let level: Vec<&StructuralNode> = all
            .iter()
            .filter(|candidate| !included.contains(&candidate.id))
            .filter(|candidate| {
                candidate
                    .parent_line
                    .is_some_and(|parent| frontier.contains(&parent))
            })
            .filter(|candidate| root_span.contains(candidate.span.offsets()))
            .collect();

        frontier = level.iter().map(|n| n.span.start.line).collect();
        for candidate in level {
            included.insert(candidate.id);
            result.push(candidate);
        }
    }

    result
}

/// The lines a block and its descendants occupy. Building one never mints
/// an anchor, so hover feedback can use it freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockExtent {
    pub node: StructuralNode,
    /// The node and its descendants, parents first, without duplicates
    pub closure: Vec<StructuralNode>,
    pub from_line: usize,
    pub to_line: usize,
}

impl BlockExtent {
    pub fn lines(&self) -> RangeInclusive<usize> {
        self.from_line..=self.to_line
    }
}

pub fn block_extent(tree: &Tree, node: &StructuralNode) -> BlockExtent {
    let members = closure(node, tree.nodes());
    let lines = closure_lines(node, &members);
    BlockExtent {
        node: node.clone(),
        closure: members.into_iter().cloned().collect(),
        from_line: *lines.start(),
        to_line: *lines.end(),
    }
}

/// A located block with everything a drag needs to know about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSelection {
    pub node: StructuralNode,
    /// The node and its descendants, parents first, without duplicates
    pub closure: Vec<StructuralNode>,
    /// First line of the closure
    pub from_line: usize,
    /// Last line of the closure
    pub to_line: usize,
    /// Existing anchor, or a freshly minted one
    pub id: String,
    /// Edits that persist a freshly minted anchor; empty when it already existed
    pub id_edits: Vec<EditOperation>,
}

impl BlockSelection {
    pub fn lines(&self) -> RangeInclusive<usize> {
        self.from_line..=self.to_line
    }
}

/// Resolve the list item at `line` into a full selection.
pub fn select_block(
    tree: &Tree,
    line: usize,
    ids: &mut dyn IdGenerator,
) -> Option<BlockSelection> {
    let node = find_enclosing(tree, line, Some(NodeKind::ListItem))?;
    Some(selection_for(tree, node, ids))
}

/// Build a selection around an already located node
pub fn selection_for(
    tree: &Tree,
    node: &StructuralNode,
    ids: &mut dyn IdGenerator,
) -> BlockSelection {
    let extent = block_extent(tree, node);
    let identity = ensure_id(node, ids);

    BlockSelection {
        node: extent.node,
        closure: extent.closure,
        from_line: extent.from_line,
        to_line: extent.to_line,
        id: identity.id,
        id_edits: identity.edits,
    }
}

/// The minimal line range covering a node and all of its descendants
pub fn block_lines(tree: &Tree, node: &StructuralNode) -> RangeInclusive<usize> {
    closure_lines(node, &closure(node, tree.nodes()))
}

fn closure_lines(node: &StructuralNode, members: &[&StructuralNode]) -> RangeInclusive<usize> {
    let from_line = members
        .iter()
        .map(|n| n.span.start.line)
        .min()
        .unwrap_or(node.span.start.line);
    let to_line = members
        .iter()
        .map(|n| n.span.end.line)
        .max()
        .unwrap_or(node.span.end.line);
    from_line..=to_line
}

/// Lines that carry a drag handle: non-empty lines inside a list item
pub fn drag_handle_lines(tree: &Tree) -> Vec<usize> {
    (1..=tree.lines().line_count())
        .filter(|&line| is_draggable(tree, line))
        .collect()
}

pub fn is_draggable(tree: &Tree, line: usize) -> bool {
    let non_empty = tree
        .line_text(line)
        .is_ok_and(|text| !text.trim().is_empty());
    non_empty && find_enclosing(tree, line, Some(NodeKind::ListItem)).is_some()
}
