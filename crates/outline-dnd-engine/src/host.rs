//! The narrow surface the engine needs from an editor: documents behind
//! panes, atomic edit dispatch, and screen coordinate mapping.

use crate::editing::{Document, EditOperation, Patch};
use crate::error::DndError;
use crate::models::DocumentRef;
use crate::parsing::Tree;

/// One editor view. Several panes may show the same document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PaneId(pub usize);

/// Pointer position in pane-local pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

pub trait EditorHost {
    /// The document shown in `pane`
    fn pane_document(&self, pane: PaneId) -> Result<DocumentRef, DndError>;

    fn document(&self, reference: &DocumentRef) -> Result<&Document, DndError>;

    /// A precomputed structural index for the document's current text, if
    /// the host keeps one. Must never be stale.
    fn structural_index(&self, _reference: &DocumentRef) -> Option<Tree> {
        None
    }

    /// Apply `ops` to one document as a single undoable change
    fn dispatch(
        &mut self,
        reference: &DocumentRef,
        ops: Vec<EditOperation>,
    ) -> Result<Patch, DndError>;

    /// Tree for the document's current text: the host's index when it has
    /// one, a live parse otherwise
    fn tree(&self, reference: &DocumentRef) -> Result<Tree, DndError> {
        match self.structural_index(reference) {
            Some(tree) => Ok(tree),
            None => Ok(self.document(reference)?.parse()),
        }
    }
}

/// Rendered-view coordinates to buffer positions
pub trait ScreenMapper {
    /// Byte offset under the pointer. Fails with
    /// [`DndError::PositionOutsideDocument`] when the point no longer maps
    /// into the live buffer.
    fn position_at_screen_point(&self, pane: PaneId, point: ScreenPoint) -> Result<usize, DndError>;

    /// Horizontal pixel position of the indentation guide of `line`
    fn indent_guide_x(&self, pane: PaneId, line: usize) -> Result<f32, DndError>;
}
