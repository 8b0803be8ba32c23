use xi_rope::Rope;
use xi_rope::delta::DeltaElement;

use crate::editing::{EditOperation, Patch, build_delta, normalize};
use crate::error::DndError;
use crate::models::DocumentRef;
use crate::parsing::{Tree, parse};

/// An open markdown document.
///
/// The xi-rope buffer is the single source of truth. Structural trees are
/// derived snapshots: call [`Document::parse`] after each edit rather than
/// holding a tree across one.
#[derive(Debug, Clone)]
pub struct Document {
    reference: DocumentRef,
    buffer: Rope,
    /// Incremented on each applied edit list
    version: u64,
}

impl Document {
    pub fn new(reference: DocumentRef, text: &str) -> Self {
        Self {
            reference,
            buffer: Rope::from(text),
            version: 0,
        }
    }

    pub fn reference(&self) -> &DocumentRef {
        &self.reference
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Structural snapshot of the current text
    pub fn parse(&self) -> Tree {
        parse(&self.text())
    }

    /// Apply an edit list as one atomic change.
    ///
    /// All offsets refer to the text before any of the edits. An invalid list
    /// leaves the document untouched.
    pub fn apply(&mut self, ops: &[EditOperation]) -> Result<Patch, DndError> {
        let sorted = normalize(ops, self.len())?;
        let delta = build_delta(&sorted, self.len());

        let mut changed = Vec::new();
        let mut cursor = 0;
        for element in &delta.els {
            match element {
                DeltaElement::Copy(from, to) => cursor += to - from,
                DeltaElement::Insert(inserted) => {
                    changed.push(cursor..cursor + inserted.len());
                    cursor += inserted.len();
                }
            }
        }

        self.buffer = delta.apply(&self.buffer);
        self.version += 1;
        log::debug!(
            "Applied {} edits to {} (version {})",
            sorted.len(),
            self.reference,
            self.version
        );

        Ok(Patch {
            changed,
            version: self.version,
        })
    }
}
