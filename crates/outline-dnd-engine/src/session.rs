//! Drag Session Controller: the `idle -> dragging -> idle` state machine
//! driven by drag-start, drag-over, drag-leave and drop events.

use std::time::{Duration, Instant};

use outline_dnd_config::{DragSettings, Modifiers, OperationKind, PaneRelation};

use crate::editing::{Plan, normalize};
use crate::error::DndError;
use crate::host::{EditorHost, PaneId, ScreenMapper, ScreenPoint};
use crate::identity::{IdGenerator, RandomIds};
use crate::locate::{BlockExtent, block_extent, block_lines, find_enclosing, is_draggable};
use crate::models::DocumentRef;
use crate::parsing::{NodeKind, Tree};
use crate::planner::{self, DropRequest, DropSite, HighlightMode, InsertionPoint, insertion_point};

/// Default rate limit for hover recomputation
pub const DEFAULT_HOVER_INTERVAL: Duration = Duration::from_millis(10);

/// A pointer this close to a line's indentation guide (in pixels) targets
/// the parent level
pub const PARENT_MODE_TOLERANCE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineHighlight {
    pub line: usize,
    pub drag_over: bool,
    /// The line the dropped text will land after
    pub drag_last: bool,
}

/// What the hovered pane should render while dragging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub pane: PaneId,
    pub document: DocumentRef,
    pub mode: HighlightMode,
    /// The hovered list item and its subtree
    pub hovered: BlockExtent,
    pub insertion: InsertionPoint,
    pub lines: Vec<LineHighlight>,
}

/// Transient state of one drag gesture
#[derive(Debug, Clone)]
pub struct DragSession {
    pub source_pane: PaneId,
    pub source_document: DocumentRef,
    pub source_line: usize,
    /// Text of every line of the dragged block, shown under the pointer
    pub ghost: Vec<String>,
    pub highlight: Option<Highlight>,
    /// Latest hover skipped by the throttle
    pending: Option<(PaneId, ScreenPoint)>,
}

/// Leading-edge rate limiter for hover events
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_run: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    /// True when a run is allowed at `now`; records the run
    pub fn ready(&mut self, now: Instant) -> bool {
        let ready = self
            .last_run
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval);
        if ready {
            self.last_run = Some(now);
        }
        ready
    }

    pub fn cancel(&mut self) {
        self.last_run = None;
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_HOVER_INTERVAL)
    }
}

/// Result of a drop event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Edits were dispatched
    Applied { kind: OperationKind, plan: Plan },
    /// Nothing to do: no drag in progress, operation `none`, no block at the
    /// source, or a drop inside the dragged block
    NoOp,
    /// The drop position no longer maps into the live document
    Aborted,
}

pub struct DragController {
    settings: DragSettings,
    throttle: Throttle,
    ids: Box<dyn IdGenerator>,
    session: Option<DragSession>,
}

impl DragController {
    pub fn new(settings: DragSettings) -> Self {
        Self::with_ids(settings, RandomIds)
    }

    pub fn with_ids(settings: DragSettings, ids: impl IdGenerator + 'static) -> Self {
        Self {
            settings,
            throttle: Throttle::default(),
            ids: Box::new(ids),
            session: None,
        }
    }

    pub fn with_hover_interval(mut self, interval: Duration) -> Self {
        self.throttle = Throttle::new(interval);
        self
    }

    pub fn settings(&self) -> &DragSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut DragSettings {
        &mut self.settings
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn highlight(&self) -> Option<&Highlight> {
        self.session.as_ref()?.highlight.as_ref()
    }

    /// Start dragging the block at `line`. Returns false, staying idle, when
    /// the line carries no drag handle.
    pub fn drag_start<H: EditorHost>(
        &mut self,
        host: &H,
        pane: PaneId,
        line: usize,
    ) -> Result<bool, DndError> {
        let document = host.pane_document(pane)?;
        let tree = host.tree(&document)?;
        if !is_draggable(&tree, line) {
            log::debug!("No drag handle at {document}:{line}");
            return Ok(false);
        }
        let Some(item) = find_enclosing(&tree, line, Some(NodeKind::ListItem)) else {
            return Ok(false);
        };

        let ghost = block_lines(&tree, item)
            .map(|number| tree.line_text(number).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("Drag start at {document}:{line}");
        self.throttle.cancel();
        self.session = Some(DragSession {
            source_pane: pane,
            source_document: document,
            source_line: line,
            ghost,
            highlight: None,
            pending: None,
        });
        Ok(true)
    }

    /// Pointer moved over `pane`. Recomputes the highlight unless throttled;
    /// a throttled event is kept and replayed by [`Self::flush_pending`].
    pub fn drag_over<H: EditorHost + ScreenMapper>(
        &mut self,
        host: &H,
        pane: PaneId,
        point: ScreenPoint,
        now: Instant,
    ) -> Result<Option<&Highlight>, DndError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };
        if !self.throttle.ready(now) {
            log::debug!("Hover throttled");
            session.pending = Some((pane, point));
            return Ok(session.highlight.as_ref());
        }
        session.pending = None;
        refresh_highlight(host, session, pane, point)?;
        Ok(session.highlight.as_ref())
    }

    /// Replay the last throttled hover once the window has passed
    pub fn flush_pending<H: EditorHost + ScreenMapper>(
        &mut self,
        host: &H,
        now: Instant,
    ) -> Result<Option<&Highlight>, DndError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };
        if let Some((pane, point)) = session.pending
            && self.throttle.ready(now)
        {
            session.pending = None;
            refresh_highlight(host, session, pane, point)?;
        }
        Ok(session.highlight.as_ref())
    }

    /// Pointer left the editor: clear the highlight and go idle
    pub fn drag_leave(&mut self) {
        self.cancel();
    }

    pub fn cancel(&mut self) {
        self.throttle.cancel();
        if self.session.take().is_some() {
            log::debug!("Drag cancelled");
        }
    }

    /// Drop at `point` in `pane`.
    ///
    /// Resolves the target from the drop event itself, never from a
    /// throttled hover. Ends the session whatever the outcome.
    pub fn drop<H: EditorHost + ScreenMapper>(
        &mut self,
        host: &mut H,
        pane: PaneId,
        point: ScreenPoint,
        modifiers: Modifiers,
    ) -> Result<DropOutcome, DndError> {
        self.throttle.cancel();
        let Some(session) = self.session.take() else {
            return Ok(DropOutcome::NoOp);
        };

        match self.execute_drop(host, &session, pane, point, modifiers) {
            Err(err) if err.is_position_outside_document() => {
                log::debug!("Drop aborted: {err}");
                Ok(DropOutcome::Aborted)
            }
            result => result,
        }
    }

    fn execute_drop<H: EditorHost + ScreenMapper>(
        &mut self,
        host: &mut H,
        session: &DragSession,
        pane: PaneId,
        point: ScreenPoint,
        modifiers: Modifiers,
    ) -> Result<DropOutcome, DndError> {
        let relation = if pane == session.source_pane {
            PaneRelation::Same
        } else {
            PaneRelation::Different
        };
        let kind = self.settings.resolve(modifiers, relation);
        if kind == OperationKind::None {
            return Ok(DropOutcome::NoOp);
        }

        let source_document = &session.source_document;
        let target_document = host.pane_document(pane)?;
        let same_document = *source_document == target_document;

        let source_tree = host.tree(source_document)?;
        let target_tree = if same_document {
            source_tree.clone()
        } else {
            host.tree(&target_document)?
        };
        let (target_line, mode) = hover_target(host, &target_tree, pane, point)?;

        let request = DropRequest {
            kind,
            source: DropSite {
                name: source_document.name(),
                tree: &source_tree,
                line: session.source_line,
            },
            target: DropSite {
                name: target_document.name(),
                tree: &target_tree,
                line: target_line,
            },
            mode,
            same_document,
        };
        let plan = planner::plan(&request, self.ids.as_mut())?;
        if plan.is_empty() {
            return Ok(DropOutcome::NoOp);
        }

        if same_document {
            host.dispatch(&target_document, plan.merged())?;
        } else {
            // Validate both sides first so a rejected list never leaves the
            // other document edited
            normalize(&plan.source_ops, source_tree.text().len())?;
            normalize(&plan.target_ops, target_tree.text().len())?;
            if !plan.source_ops.is_empty() {
                host.dispatch(source_document, plan.source_ops.clone())?;
            }
            host.dispatch(&target_document, plan.target_ops.clone())?;
        }

        Ok(DropOutcome::Applied { kind, plan })
    }
}

/// Target line and highlight mode under the pointer
fn hover_target<H: EditorHost + ScreenMapper>(
    host: &H,
    tree: &Tree,
    pane: PaneId,
    point: ScreenPoint,
) -> Result<(usize, HighlightMode), DndError> {
    let offset = host.position_at_screen_point(pane, point)?;
    let line = tree.lines().line_of_offset(offset)?;
    let guide = host.indent_guide_x(pane, line)?;
    let mode = if point.x <= guide + PARENT_MODE_TOLERANCE {
        HighlightMode::Parent
    } else {
        HighlightMode::Current
    };
    Ok((line, mode))
}

fn refresh_highlight<H: EditorHost + ScreenMapper>(
    host: &H,
    session: &mut DragSession,
    pane: PaneId,
    point: ScreenPoint,
) -> Result<(), DndError> {
    match resolve_highlight(host, pane, point) {
        Ok(highlight) => {
            session.highlight = highlight;
            Ok(())
        }
        Err(err) if err.is_position_outside_document() => {
            log::debug!("Hover outside document: {err}");
            session.highlight = None;
            Ok(())
        }
        Err(err) => Err(err),
    }
}

fn resolve_highlight<H: EditorHost + ScreenMapper>(
    host: &H,
    pane: PaneId,
    point: ScreenPoint,
) -> Result<Option<Highlight>, DndError> {
    let document = host.pane_document(pane)?;
    let tree = host.tree(&document)?;
    let (line, mode) = hover_target(host, &tree, pane, point)?;

    let Some(item) = find_enclosing(&tree, line, Some(NodeKind::ListItem)) else {
        log::debug!("No block under pointer at {document}:{line}");
        return Ok(None);
    };
    let hovered = block_extent(&tree, item);
    let insertion = insertion_point(&tree, line, mode)?;

    let lines = hovered
        .lines()
        .map(|number| LineHighlight {
            line: number,
            drag_over: true,
            drag_last: number == insertion.line,
        })
        .collect();
    log::debug!("Hover {document}:{line} {mode:?}");

    Ok(Some(Highlight {
        pane,
        document,
        mode,
        hovered,
        insertion,
        lines,
    }))
}
