//! Page entity model
//!
//! Defines the page record that the document reducer operates on, plus
//! rotation normalization. Pages are pure data; all mutation goes through
//! the reducer.

use std::sync::Arc;

/// Unique identifier for a page
///
/// Stable for the page's lifetime. Generated using UUID v4.
pub type PageId = uuid::Uuid;

/// Identifier shared by all pages extracted from the same originating file
///
/// Used to cluster pages for group-oriented views.
pub type SourceGroupId = uuid::Uuid;

/// Origin of a page's content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSource {
    /// Extracted from a PDF document
    Pdf,

    /// Converted from a raster image (paste/drop)
    Image,
}

/// Cached raster of a page at some scale
///
/// Pixel data is RGBA8, shared via `Arc` so cloning document state for the
/// undo history never copies pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// RGBA8 pixel data, `width * height * 4` bytes
    pub pixels: Arc<[u8]>,
}

impl RasterImage {
    /// Create a raster image from RGBA8 pixel data
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }
}

/// One page in the working document
///
/// Holds the extracted single-page content, lazily filled raster caches and
/// the opaque annotation snapshot. Order within the document is owned by
/// `DocumentState`, not by the page itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Stable unique identifier
    pub id: PageId,

    /// Origin of the page content
    pub source: PageSource,

    /// Display name of the originating file
    pub source_label: String,

    /// Shared by all pages extracted from the same file
    pub source_group: SourceGroupId,

    /// Single-page encoded document bytes (present once extracted)
    pub content_bytes: Option<Arc<[u8]>>,

    /// Full-resolution raster cache, lazily populated
    pub preview: Option<RasterImage>,

    /// Low-resolution raster cache, lazily populated
    ///
    /// Independent lifecycle from `preview`.
    pub thumbnail: Option<RasterImage>,

    /// Serialized snapshot of user-drawn shapes, `None` = no annotations yet
    ///
    /// Opaque to the reducer; stored and handed back verbatim.
    pub annotations: Option<String>,

    /// Display rotation in degrees, always one of {0, 90, 180, 270}
    pub rotation: u16,

    /// Intrinsic width in the source's native unit, fixed at creation
    pub width: f32,

    /// Intrinsic height in the source's native unit, fixed at creation
    pub height: f32,
}

impl Page {
    /// Create a page with a fresh id and empty caches
    pub fn new(
        source: PageSource,
        source_label: impl Into<String>,
        source_group: SourceGroupId,
        content_bytes: Vec<u8>,
        width: f32,
        height: f32,
    ) -> Self {
        Self {
            id: PageId::new_v4(),
            source,
            source_label: source_label.into(),
            source_group,
            content_bytes: Some(content_bytes.into()),
            preview: None,
            thumbnail: None,
            annotations: None,
            rotation: 0,
            width,
            height,
        }
    }

    /// Create a deep copy with a freshly generated id
    ///
    /// Annotations are not carried to the duplicate; static content and the
    /// cached thumbnail are preserved.
    pub fn duplicate(&self) -> Self {
        Self {
            id: PageId::new_v4(),
            annotations: None,
            ..self.clone()
        }
    }
}

/// Normalize a rotation after applying a delta
///
/// Computes `((current + delta) % 360 + 360) % 360`. For in-contract inputs
/// (current canonical, delta a multiple of 90) the result is always one of
/// {0, 90, 180, 270}.
pub fn normalize_rotation(current: u16, delta: i32) -> u16 {
    (((current as i32 + delta) % 360 + 360) % 360) as u16
}
