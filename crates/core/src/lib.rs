//! Page Desk Core Library
//!
//! Document state model, undo history, and annotation tooling for the
//! page assembly editor.

pub mod document;
pub mod editor;
pub mod export;
pub mod history;
pub mod loader;
pub mod page;
pub mod session;
pub mod shape;

pub use document::{reduce, DocumentAction, DocumentState, ViewMode};
pub use editor::{EditorController, EditorMode, DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM, ZOOM_STEP};
pub use export::{export_pages, ExportContent, ExportError, ExportPage};
pub use history::{DocumentStore, MAX_UNDO_DEPTH};
pub use loader::{
    ConvertError, ExtractedPage, PageConverter, PageLoader, RasterJob, RasterKind,
    PREVIEW_SCALE, THUMBNAIL_SCALE,
};
pub use page::{normalize_rotation, Page, PageId, PageSource, RasterImage, SourceGroupId};
pub use session::{AnnotationSession, PropertySnapshot, Tool, DEFAULT_GRID_SIZE};
pub use shape::{
    arrow_head, Color, Point, Shape, ShapeGeometry, ShapeId, ShapeSet, ShapeStyle,
    ARROW_HEAD_LENGTH, DEFAULT_FONT_SIZE, DEFAULT_STROKE_WIDTH, DEFAULT_TEXT_WIDTH,
};
