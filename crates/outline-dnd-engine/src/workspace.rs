//! In-memory editor host: open documents, panes over them, and a monospace
//! grid mapping pixels to buffer positions.

use std::collections::HashMap;

use crate::editing::{Document, EditOperation, Patch};
use crate::error::DndError;
use crate::host::{EditorHost, PaneId, ScreenMapper, ScreenPoint};
use crate::indent::indent_of;
use crate::models::DocumentRef;
use crate::parsing::{LineIndex, Tree};
use crate::planner::HighlightMode;

/// Pixel metrics of a pane's text grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaneGeometry {
    pub line_height: f32,
    pub char_width: f32,
    /// Rendered width of one tab, i.e. one indentation level
    pub tab_width: f32,
}

impl Default for PaneGeometry {
    fn default() -> Self {
        Self {
            line_height: 20.0,
            char_width: 8.0,
            tab_width: 32.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Pane {
    document: DocumentRef,
    geometry: PaneGeometry,
}

#[derive(Debug, Default)]
pub struct Workspace {
    documents: HashMap<DocumentRef, Document>,
    panes: Vec<Pane>,
    /// Structural index per document, tagged with the version it was built from
    index: Option<HashMap<DocumentRef, (u64, Tree)>>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a structural index per document instead of parsing on each query
    pub fn with_structural_index(mut self) -> Self {
        let mut index = HashMap::new();
        for (reference, document) in &self.documents {
            index.insert(reference.clone(), (document.version(), document.parse()));
        }
        self.index = Some(index);
        self
    }

    /// Add (or replace) a document and return its ref
    pub fn insert_document(&mut self, document: Document) -> DocumentRef {
        let reference = document.reference().clone();
        self.documents.insert(reference.clone(), document);
        self.refresh_index(&reference);
        reference
    }

    /// Open a new pane on an already inserted document
    pub fn open(&mut self, reference: &DocumentRef) -> Result<PaneId, DndError> {
        self.open_with_geometry(reference, PaneGeometry::default())
    }

    pub fn open_with_geometry(
        &mut self,
        reference: &DocumentRef,
        geometry: PaneGeometry,
    ) -> Result<PaneId, DndError> {
        if !self.documents.contains_key(reference) {
            return Err(DndError::UnknownDocument(reference.to_string()));
        }
        self.panes.push(Pane {
            document: reference.clone(),
            geometry,
        });
        Ok(PaneId(self.panes.len() - 1))
    }

    /// Insert a document from text and open a pane on it
    pub fn open_text(&mut self, path: &str, text: &str) -> PaneId {
        let reference = self.insert_document(Document::new(DocumentRef::from(path), text));
        self.panes.push(Pane {
            document: reference,
            geometry: PaneGeometry::default(),
        });
        PaneId(self.panes.len() - 1)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    pub fn text(&self, reference: &DocumentRef) -> Result<String, DndError> {
        Ok(self.document(reference)?.text())
    }

    pub fn pane_text(&self, pane: PaneId) -> Result<String, DndError> {
        self.text(&self.pane_document(pane)?)
    }

    /// A point on `line` whose horizontal position selects `mode`
    pub fn point_at_line(
        &self,
        pane: PaneId,
        line: usize,
        mode: HighlightMode,
    ) -> Result<ScreenPoint, DndError> {
        let geometry = self.pane(pane)?.geometry;
        let guide = self.indent_guide_x(pane, line)?;
        let x = match mode {
            HighlightMode::Parent => guide,
            HighlightMode::Current => guide + geometry.tab_width,
        };
        let y = (line as f32 - 0.5) * geometry.line_height;
        Ok(ScreenPoint::new(x, y))
    }

    fn pane(&self, pane: PaneId) -> Result<&Pane, DndError> {
        self.panes.get(pane.0).ok_or(DndError::UnknownPane(pane.0))
    }

    fn refresh_index(&mut self, reference: &DocumentRef) {
        if let Some(index) = self.index.as_mut()
            && let Some(document) = self.documents.get(reference)
        {
            index.insert(reference.clone(), (document.version(), document.parse()));
        }
    }
}

impl EditorHost for Workspace {
    fn pane_document(&self, pane: PaneId) -> Result<DocumentRef, DndError> {
        Ok(self.pane(pane)?.document.clone())
    }

    fn document(&self, reference: &DocumentRef) -> Result<&Document, DndError> {
        self.documents
            .get(reference)
            .ok_or_else(|| DndError::UnknownDocument(reference.to_string()))
    }

    fn structural_index(&self, reference: &DocumentRef) -> Option<Tree> {
        let (version, tree) = self.index.as_ref()?.get(reference)?;
        let current = self.documents.get(reference)?.version();
        (*version == current).then(|| tree.clone())
    }

    fn dispatch(
        &mut self,
        reference: &DocumentRef,
        ops: Vec<EditOperation>,
    ) -> Result<Patch, DndError> {
        let document = self
            .documents
            .get_mut(reference)
            .ok_or_else(|| DndError::UnknownDocument(reference.to_string()))?;
        let patch = document.apply(&ops)?;
        self.refresh_index(reference);
        Ok(patch)
    }
}

impl ScreenMapper for Workspace {
    fn position_at_screen_point(&self, pane: PaneId, point: ScreenPoint) -> Result<usize, DndError> {
        let pane_state = self.pane(pane)?;
        let document = self.document(&pane_state.document)?;
        let geometry = pane_state.geometry;
        let text = document.text();
        let lines = LineIndex::new(&text);

        if point.y < 0.0 {
            return Err(DndError::LineOutOfRange {
                line: 0,
                line_count: lines.line_count(),
            });
        }
        let line = lines.line((point.y / geometry.line_height) as usize + 1)?;

        let mut x = 0.0;
        for (index, ch) in text[line.from..line.to].char_indices() {
            x += match ch {
                '\t' => geometry.tab_width,
                _ => geometry.char_width,
            };
            if point.x < x {
                return Ok(line.from + index);
            }
        }
        Ok(line.to)
    }

    fn indent_guide_x(&self, pane: PaneId, line: usize) -> Result<f32, DndError> {
        let pane_state = self.pane(pane)?;
        let text = self.document(&pane_state.document)?.text();
        let line = LineIndex::new(&text).line(line)?;
        let depth = indent_of(&text[line.from..line.to]);
        Ok(depth as f32 * pane_state.geometry.tab_width)
    }
}
