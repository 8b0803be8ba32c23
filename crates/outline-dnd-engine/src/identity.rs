use uuid::Uuid;

use crate::editing::EditOperation;
use crate::parsing::{NodeKind, StructuralNode};

/// Length of a minted anchor id
pub const ID_LEN: usize = 6;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Source of fresh anchor ids
pub trait IdGenerator {
    fn generate(&mut self) -> String;
}

impl<F: FnMut() -> String> IdGenerator for F {
    fn generate(&mut self) -> String {
        self()
    }
}

/// Random base-36 ids, 36^6 (about 2.2 billion) possibilities.
///
/// Collisions are not detected.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn generate(&mut self) -> String {
        let mut bits = Uuid::new_v4().as_u128();
        (0..ID_LEN)
            .map(|_| {
                let digit = (bits % 36) as usize;
                bits /= 36;
                ALPHABET[digit] as char
            })
            .collect()
    }
}

/// A block's anchor id and the edits (if any) needed to write it down
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockIdentity {
    pub id: String,
    pub edits: Vec<EditOperation>,
}

/// Return the block's existing anchor, or mint one together with the
/// insertion that persists it.
pub fn ensure_id(node: &StructuralNode, ids: &mut dyn IdGenerator) -> BlockIdentity {
    if let Some(id) = &node.block_id {
        return BlockIdentity {
            id: id.clone(),
            edits: Vec::new(),
        };
    }

    let id = ids.generate();
    let edit = EditOperation::Insert {
        from: anchor_offset(node),
        text: format!("{}{}", anchor_separator(node.kind), anchor_token(&id)),
    };
    BlockIdentity {
        id,
        edits: vec![edit],
    }
}

pub fn anchor_token(id: &str) -> String {
    format!("^{id}")
}

/// What goes between a block and its anchor
pub fn anchor_separator(kind: NodeKind) -> &'static str {
    if kind.needs_blank_line_anchor() {
        "\n\n"
    } else {
        " "
    }
}

/// Anchors of list items go on the item's own line(s), ahead of its children
fn anchor_offset(node: &StructuralNode) -> usize {
    match node.kind {
        NodeKind::ListItem => node.own_end,
        _ => node.span.end.offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::find_enclosing;
    use crate::parsing::parse;
    use rstest::rstest;

    #[test]
    fn random_ids_are_short_base36() {
        let mut ids = RandomIds;
        for _ in 0..50 {
            let id = ids.generate();
            assert_eq!(id.len(), ID_LEN);
            assert!(id.bytes().all(|b| ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn random_ids_differ() {
        let mut ids = RandomIds;
        assert_ne!(ids.generate(), ids.generate());
    }

    #[test]
    fn existing_anchor_is_reused_without_edits() {
        let tree = parse("- a ^abc123\n");
        let node = find_enclosing(&tree, 1, Some(NodeKind::ListItem)).unwrap();
        let mut ids = || "unused".to_string();

        let identity = ensure_id(node, &mut ids);

        assert_eq!(identity.id, "abc123");
        assert!(identity.edits.is_empty());
    }

    #[test]
    fn list_item_anchor_goes_before_children() {
        let text = "- a\n\t- b\n";
        let tree = parse(text);
        let node = find_enclosing(&tree, 1, Some(NodeKind::ListItem)).unwrap();
        let mut ids = || "new001".to_string();

        let identity = ensure_id(node, &mut ids);

        assert_eq!(
            identity.edits,
            vec![EditOperation::Insert {
                from: 3,
                text: " ^new001".to_string()
            }]
        );
    }

    #[rstest]
    #[case("> quote\n", NodeKind::BlockQuote)]
    #[case("```\ncode\n```\n", NodeKind::Code)]
    #[case("| a |\n|---|\n| 1 |\n", NodeKind::Table)]
    #[case("<!-- c -->\n", NodeKind::Comment)]
    #[case("[^1]: note\n", NodeKind::FootnoteDefinition)]
    fn blank_line_kinds_get_detached_anchor(#[case] text: &str, #[case] kind: NodeKind) {
        let tree = parse(text);
        let node = find_enclosing(&tree, 1, Some(kind)).unwrap();
        let mut ids = || "zz9900".to_string();

        let identity = ensure_id(node, &mut ids);

        assert_eq!(
            identity.edits,
            vec![EditOperation::Insert {
                from: node.span.end.offset,
                text: "\n\n^zz9900".to_string()
            }]
        );
    }

    #[rstest]
    #[case(NodeKind::ListItem, " ")]
    #[case(NodeKind::Paragraph, " ")]
    #[case(NodeKind::Heading, " ")]
    #[case(NodeKind::Section, " ")]
    #[case(NodeKind::BlockQuote, "\n\n")]
    #[case(NodeKind::FootnoteDefinition, "\n\n")]
    fn separator_by_kind(#[case] kind: NodeKind, #[case] expected: &str) {
        assert_eq!(anchor_separator(kind), expected);
    }
}
