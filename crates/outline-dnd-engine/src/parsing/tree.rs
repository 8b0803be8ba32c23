use std::fmt::Write;

use super::lines::{LineIndex, LineRef};
use super::span::NodeSpan;
use crate::error::DndError;

/// The kind of a structural block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    ListItem,
    Paragraph,
    Heading,
    BlockQuote,
    Code,
    Table,
    Comment,
    FootnoteDefinition,
    /// Thematic breaks, raw HTML and anything else without a dedicated kind
    Section,
}

impl NodeKind {
    /// Kinds that would swallow a trailing ` ^id` into their own content.
    ///
    /// Their anchor goes on its own paragraph after a blank line.
    pub fn needs_blank_line_anchor(self) -> bool {
        match self {
            NodeKind::BlockQuote
            | NodeKind::Code
            | NodeKind::Table
            | NodeKind::Comment
            | NodeKind::FootnoteDefinition => true,
            NodeKind::ListItem | NodeKind::Paragraph | NodeKind::Heading | NodeKind::Section => {
                false
            }
        }
    }
}

/// Index of a node within its tree snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// One markdown block with its position and parent pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralNode {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Full extent, including nested child blocks
    pub span: NodeSpan,
    /// End offset of the node's own content, before any nested list item.
    /// Equal to `span.end.offset` for nodes without nested items.
    pub own_end: usize,
    /// Start line of the enclosing node, `None` at top level
    pub parent_line: Option<usize>,
    /// Nesting depth, 0 at top level
    pub depth: usize,
    /// Previously persisted anchor (`^id`) attached to this block
    pub block_id: Option<String>,
}

/// All structural nodes of one document state, in document order
/// (parents before children).
///
/// A tree is a snapshot: it is never updated, only rebuilt from fresh text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tree {
    pub(crate) text: String,
    pub(crate) lines: LineIndex,
    pub(crate) nodes: Vec<StructuralNode>,
}

impl Tree {
    pub fn nodes(&self) -> &[StructuralNode] {
        &self.nodes
    }

    pub fn get(&self, id: NodeId) -> Option<&StructuralNode> {
        self.nodes.get(id.0)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }

    pub fn line(&self, number: usize) -> Result<LineRef, DndError> {
        self.lines.line(number)
    }

    /// Text of a line without its line break, `\r\n` included
    pub fn line_text(&self, number: usize) -> Result<&str, DndError> {
        let line = self.lines.line(number)?;
        let text = &self.text[line.from..line.to];
        Ok(text.strip_suffix('\r').unwrap_or(text))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Render a tree as an indented outline, one node per line.
pub fn format_tree(tree: &Tree) -> String {
    let mut out = String::new();
    for node in tree.nodes() {
        let _ = write!(
            out,
            "{}{:?} L{}-{} [{}..{})",
            "  ".repeat(node.depth),
            node.kind,
            node.span.start.line,
            node.span.end.line,
            node.span.start.offset,
            node.span.end.offset,
        );
        if node.own_end != node.span.end.offset {
            let _ = write!(out, " own..{}", node.own_end);
        }
        if let Some(parent) = node.parent_line {
            let _ = write!(out, " parent=L{parent}");
        }
        if let Some(id) = &node.block_id {
            let _ = write!(out, " ^{id}");
        }
        out.push('\n');
    }
    out
}
