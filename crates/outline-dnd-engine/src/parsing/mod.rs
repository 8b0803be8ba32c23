//! Structural parsing: raw markdown text to a flat, position-annotated tree
//! of block nodes.
//!
//! The tokenizer is pulldown-cmark; this module only turns its offset events
//! into [`StructuralNode`]s with 1-based lines, byte offsets and parent
//! pointers. Parsing never fails: malformed markdown yields a best-effort tree.
//!
//! # Pulldown-cmark events for tight lists
//!
//! ```markdown
//! - a
//! 	- b
//! ```
//!
//! Tight list items carry no `Paragraph` tags; their text arrives directly
//! inside `Start(Item)`:
//!
//! 1. `Start(List)`, `Start(Item)`, `Text("a")`
//! 2. `Start(List)`, `Start(Item)`, `Text("b")`, `End(Item)`, `End(List)`
//! 3. `End(Item)`, `End(List)`
//!
//! The builder synthesises a paragraph node around such bare inline runs so
//! that every item has a paragraph to drop onto, tight or loose.

pub mod lines;
pub mod span;
pub mod tree;

use std::ops::Range;
use std::sync::OnceLock;

use pulldown_cmark::{Event, Options, Parser, Tag};
use regex::Regex;

pub use lines::{LineIndex, LineRef};
pub use span::{NodeSpan, Position, Span};
pub use tree::{NodeId, NodeKind, StructuralNode, Tree, format_tree};

/// Parse markdown text into a tree snapshot.
pub fn parse(text: &str) -> Tree {
    let mut builder = TreeBuilder::new(text);
    for (event, range) in Parser::new_ext(text, parser_options()).into_offset_iter() {
        builder.push(event, range);
    }
    builder.finish()
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
}

/// What an open `Start` tag turned into
#[derive(Debug, Clone, Copy)]
enum Frame {
    Node(usize),
    /// A list container; not a node itself
    Container,
    /// Inline markup or table internals
    Inline,
}

#[derive(Debug)]
struct RawNode {
    kind: NodeKind,
    start: usize,
    end: usize,
    parent: Option<usize>,
    /// Line-start offset of the first nested list item
    first_child_item: Option<usize>,
}

struct TreeBuilder<'a> {
    text: &'a str,
    lines: LineIndex,
    nodes: Vec<RawNode>,
    stack: Vec<Frame>,
    /// Synthetic paragraph collecting the bare inline run of a tight item
    implicit: Option<usize>,
}

impl<'a> TreeBuilder<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            lines: LineIndex::new(text),
            nodes: Vec::new(),
            stack: Vec::new(),
            implicit: None,
        }
    }

    fn push(&mut self, event: Event<'_>, range: Range<usize>) {
        match event {
            Event::Start(tag) => self.start(&tag, range),
            Event::End(_) => self.end(range),
            Event::Rule => {
                self.close_implicit();
                self.open_node(NodeKind::Section, range);
            }
            // Raw lines of an HTML block; the block itself is the node
            Event::Html(_) => {}
            _ => self.inline(range),
        }
    }

    fn start(&mut self, tag: &Tag<'_>, range: Range<usize>) {
        let kind = match tag {
            Tag::Paragraph => {
                if self.text[range.clone()].starts_with("%%") {
                    NodeKind::Comment
                } else {
                    NodeKind::Paragraph
                }
            }
            Tag::Heading { .. } => NodeKind::Heading,
            Tag::BlockQuote(_) => NodeKind::BlockQuote,
            Tag::CodeBlock(_) => NodeKind::Code,
            Tag::HtmlBlock => {
                if self.text[range.clone()].trim_start().starts_with("<!--") {
                    NodeKind::Comment
                } else {
                    NodeKind::Section
                }
            }
            Tag::Item => NodeKind::ListItem,
            Tag::FootnoteDefinition(_) => NodeKind::FootnoteDefinition,
            Tag::Table(_) => NodeKind::Table,
            Tag::List(_) => {
                self.close_implicit();
                self.stack.push(Frame::Container);
                return;
            }
            _ => {
                self.inline(range);
                self.stack.push(Frame::Inline);
                return;
            }
        };

        self.close_implicit();
        let index = self.open_node(kind, range);
        self.stack.push(Frame::Node(index));
    }

    fn end(&mut self, range: Range<usize>) {
        match self.stack.pop() {
            Some(Frame::Node(index)) => {
                self.close_implicit();
                let node = &mut self.nodes[index];
                node.end = node.end.max(range.end);
            }
            Some(Frame::Container) => self.close_implicit(),
            Some(Frame::Inline) => self.inline(range),
            None => {}
        }
    }

    /// Record a leaf or container node and return its index
    fn open_node(&mut self, kind: NodeKind, range: Range<usize>) -> usize {
        let parent = self.enclosing_node();
        let index = self.nodes.len();
        // Nested item ranges begin at the line break ending the parent's line
        let start = self.trimmed_start(range.start, range.end);

        if kind == NodeKind::ListItem
            && let Some(parent) = parent
        {
            let line_start = self.line_start_of(start);
            let parent_node = &mut self.nodes[parent];
            if parent_node.kind == NodeKind::ListItem && parent_node.first_child_item.is_none() {
                parent_node.first_child_item = Some(line_start);
            }
        }

        self.nodes.push(RawNode {
            kind,
            start,
            end: range.end,
            parent,
            first_child_item: None,
        });
        index
    }

    /// Inline content: extend the open synthetic paragraph, or start one when
    /// the content sits directly inside a list item.
    fn inline(&mut self, range: Range<usize>) {
        if let Some(index) = self.implicit {
            let node = &mut self.nodes[index];
            node.end = node.end.max(range.end);
            return;
        }

        let direct_parent = self
            .stack
            .iter()
            .rev()
            .find(|frame| !matches!(frame, Frame::Inline));
        if let Some(Frame::Node(parent)) = direct_parent
            && self.nodes[*parent].kind == NodeKind::ListItem
        {
            let index = self.open_node(NodeKind::Paragraph, range);
            self.implicit = Some(index);
        }
    }

    fn close_implicit(&mut self) {
        self.implicit = None;
    }

    fn enclosing_node(&self) -> Option<usize> {
        self.stack.iter().rev().find_map(|frame| match frame {
            Frame::Node(index) => Some(*index),
            Frame::Container | Frame::Inline => None,
        })
    }

    fn line_start_of(&self, offset: usize) -> usize {
        self.lines
            .line_at_offset(offset)
            .map(|line| line.from)
            .unwrap_or(offset)
    }

    /// Offset of the first non-whitespace byte of `start..end`, or `start`
    /// when the range is blank
    fn trimmed_start(&self, start: usize, end: usize) -> usize {
        let end = end.min(self.text.len()).max(start);
        let slice = &self.text[start..end];
        let rest = slice.trim_start();
        if rest.is_empty() {
            start
        } else {
            start + (slice.len() - rest.len())
        }
    }

    /// Offset just past the last non-whitespace byte of `start..end`
    fn trimmed_end(&self, start: usize, end: usize) -> usize {
        let end = end.min(self.text.len()).max(start);
        start + self.text[start..end].trim_end().len()
    }

    fn position(&self, offset: usize) -> Position {
        Position {
            line: self.lines.line_of_offset(offset).unwrap_or(1),
            offset,
        }
    }

    fn finish(self) -> Tree {
        let mut nodes: Vec<StructuralNode> = Vec::with_capacity(self.nodes.len());

        for (index, raw) in self.nodes.iter().enumerate() {
            let start = raw.start;
            let end = self.trimmed_end(start, raw.end);
            let own_end = match raw.first_child_item {
                Some(child_start) if child_start > start => {
                    self.trimmed_end(start, child_start.min(end))
                }
                _ => end,
            };
            // End line is the line of the last byte
            let end_line = self
                .lines
                .line_of_offset(end.saturating_sub(1).max(start))
                .unwrap_or(1);

            let (parent_line, depth) = match raw.parent {
                Some(parent) => (
                    Some(nodes[parent].span.start.line),
                    nodes[parent].depth + 1,
                ),
                None => (None, 0),
            };

            let block_id = detect_block_id(self.text, raw.kind, start, own_end, end);

            nodes.push(StructuralNode {
                id: NodeId(index),
                kind: raw.kind,
                span: NodeSpan {
                    start: self.position(start),
                    end: Position {
                        line: end_line,
                        offset: end,
                    },
                },
                own_end,
                parent_line,
                depth,
                block_id,
            });
        }

        Tree {
            text: self.text.to_string(),
            lines: self.lines,
            nodes,
        }
    }
}

fn trailing_anchor_regex() -> &'static Regex {
    static TRAILING_ANCHOR: OnceLock<Regex> = OnceLock::new();
    TRAILING_ANCHOR.get_or_init(|| {
        Regex::new(r"(?:^|\s)\^([A-Za-z0-9-]+)$").expect("Invalid trailing anchor regex")
    })
}

fn detached_anchor_regex() -> &'static Regex {
    static DETACHED_ANCHOR: OnceLock<Regex> = OnceLock::new();
    DETACHED_ANCHOR.get_or_init(|| {
        Regex::new(r"^[ \t]*\r?\n[ \t]*\r?\n\^([A-Za-z0-9-]+)[ \t]*(?:\r?\n|$)")
            .expect("Invalid detached anchor regex")
    })
}

/// Find an anchor already attached to a block.
///
/// Inline kinds carry it at the end of their own last line; blank-line kinds
/// carry it as a separate `^id` paragraph right after the block.
fn detect_block_id(
    text: &str,
    kind: NodeKind,
    start: usize,
    own_end: usize,
    end: usize,
) -> Option<String> {
    let captures = if kind.needs_blank_line_anchor() {
        detached_anchor_regex().captures(&text[end..])
    } else {
        let own = &text[start..own_end];
        let last_line = own.rsplit('\n').next().unwrap_or(own).trim_end();
        trailing_anchor_regex().captures(last_line)
    };
    captures.map(|c| c[1].to_string())
}
