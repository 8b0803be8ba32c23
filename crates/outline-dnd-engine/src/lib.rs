//! Drag-and-drop relocation of blocks in markdown outlines: resolve the
//! dragged list item and the drop site, then move, copy or embed it with
//! edits applied atomically per document.

pub mod editing;
pub mod error;
pub mod host;
pub mod identity;
pub mod indent;
pub mod io;
pub mod locate;
pub mod models;
pub mod parsing;
pub mod planner;
pub mod session;
pub mod workspace;

// Re-export key types for easier usage
pub use editing::{Document, EditOperation, Patch, Plan};
pub use error::DndError;
pub use host::{EditorHost, PaneId, ScreenMapper, ScreenPoint};
pub use identity::{BlockIdentity, IdGenerator, RandomIds, ensure_id};
pub use indent::{indent_of, reindent};
pub use io::*;
pub use locate::{
    BlockExtent, BlockSelection, block_extent, closure, drag_handle_lines, find_enclosing,
    select_block,
};
pub use models::DocumentRef;
pub use outline_dnd_config::{DragSettings, Modifiers, OperationKind, PaneRelation, SettingSlot};
pub use parsing::{NodeKind, StructuralNode, Tree, parse};
pub use planner::{DropRequest, DropSite, HighlightMode, InsertionPoint, insertion_point, plan};
pub use session::{DragController, DragSession, DropOutcome, Highlight, LineHighlight};
pub use workspace::{PaneGeometry, Workspace};
