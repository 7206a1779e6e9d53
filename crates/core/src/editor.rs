//! Editor mode controller
//!
//! Small state machine toggling between browsing the page collection and
//! editing a single page's annotations. While editing, the annotation
//! session owns the drawing surface and page-level keyboard shortcuts are
//! suppressed in favor of shape-level ones. Also carries the workspace
//! toggles (zoom, grid snap) that outlive any single session.

use crate::page::{Page, PageId};
use crate::session::{AnnotationSession, DEFAULT_GRID_SIZE};

pub const MIN_ZOOM: f32 = 0.25;
pub const MAX_ZOOM: f32 = 4.0;
pub const DEFAULT_ZOOM: f32 = 1.0;
pub const ZOOM_STEP: f32 = 0.1;

/// Current editor mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    /// Browsing the page collection (default)
    Browsing,

    /// Editing one page's annotations
    Editing(PageId),
}

/// Editor mode state machine and workspace settings
#[derive(Debug)]
pub struct EditorController {
    session: Option<AnnotationSession>,
    zoom: f32,
    grid_snap: bool,
    grid_size: f32,
}

impl EditorController {
    pub fn new() -> Self {
        Self {
            session: None,
            zoom: DEFAULT_ZOOM,
            grid_snap: false,
            grid_size: DEFAULT_GRID_SIZE,
        }
    }

    pub fn mode(&self) -> EditorMode {
        match &self.session {
            Some(session) => EditorMode::Editing(session.page_id()),
            None => EditorMode::Browsing,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.session.is_some()
    }

    /// The live annotation session, present only while editing
    pub fn session(&self) -> Option<&AnnotationSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut AnnotationSession> {
        self.session.as_mut()
    }

    /// Enter edit mode for a page
    ///
    /// Only valid from browsing; returns false (and changes nothing) when a
    /// session is already active. The session starts from the page's stored
    /// annotation snapshot, degrading to empty if it fails to parse.
    pub fn enter_edit(&mut self, page: &Page) -> bool {
        if self.session.is_some() {
            return false;
        }
        let mut session = AnnotationSession::new(page.id, page.annotations.as_deref());
        session.set_grid(self.grid_snap, self.grid_size);
        tracing::debug!(page = %page.id, "entering edit mode");
        self.session = Some(session);
        true
    }

    /// Leave edit mode, tearing the session down
    ///
    /// Returns the page id and its final annotation snapshot when settled
    /// edits were still pending, so the host can dispatch the update.
    pub fn exit_edit(&mut self) -> Option<(PageId, String)> {
        let mut session = self.session.take()?;
        tracing::debug!(page = %session.page_id(), "exiting edit mode");
        let page_id = session.page_id();
        session.flush().map(|snapshot| (page_id, snapshot))
    }

    /// Escape: always exits edit mode, even mid-gesture
    ///
    /// An in-progress draw is abandoned, not committed; edits settled
    /// before the gesture still flush.
    pub fn escape(&mut self) -> Option<(PageId, String)> {
        if let Some(session) = self.session.as_mut() {
            session.cancel_gesture();
        }
        self.exit_edit()
    }

    /// Whether page-collection shortcuts (select-all, delete pages) apply
    pub fn page_shortcuts_active(&self) -> bool {
        self.session.is_none()
    }

    /// Whether annotation-surface shortcuts (delete shape) apply
    pub fn shape_shortcuts_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - ZOOM_STEP);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = DEFAULT_ZOOM;
    }

    pub fn grid_snap(&self) -> bool {
        self.grid_snap
    }

    pub fn toggle_grid_snap(&mut self) {
        self.grid_snap = !self.grid_snap;
        if let Some(session) = self.session.as_mut() {
            session.set_grid(self.grid_snap, self.grid_size);
        }
    }

    pub fn set_grid_size(&mut self, size: f32) {
        if size <= 0.0 {
            return;
        }
        self.grid_size = size;
        if let Some(session) = self.session.as_mut() {
            session.set_grid(self.grid_snap, self.grid_size);
        }
    }
}

impl Default for EditorController {
    fn default() -> Self {
        Self::new()
    }
}
