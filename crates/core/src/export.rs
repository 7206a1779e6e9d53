//! Export assembly
//!
//! Classifies each page into the cheapest faithful representation for the
//! output document: unannotated pages pass their single-page content
//! through verbatim, anything annotated falls back to its flattened
//! raster. Encoding the final PDF is the engine crate's job; this module
//! only decides what goes in.

use std::sync::Arc;

use crate::page::{Page, PageId, RasterImage};
use crate::shape::ShapeSet;

/// What an exported page is built from
#[derive(Debug, Clone)]
pub enum ExportContent {
    /// Untouched single-page document bytes, copied verbatim
    Original(Arc<[u8]>),

    /// A pre-rendered raster with annotations burned in
    Flattened(RasterImage),
}

/// One page of the output document
#[derive(Debug, Clone)]
pub struct ExportPage {
    pub content: ExportContent,

    /// Display rotation to bake into the output page
    pub rotation: u16,

    /// Output page width in the source's native unit
    pub width: f32,

    /// Output page height in the source's native unit
    pub height: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("nothing to export")]
    Empty,

    #[error("page {0} has no exportable content")]
    MissingContent(PageId),

    #[error("page {0} is annotated but has no flattened raster")]
    MissingPreview(PageId),
}

/// Decide the output representation for every page, in collection order
pub fn export_pages(pages: &[Page]) -> Result<Vec<ExportPage>, ExportError> {
    if pages.is_empty() {
        return Err(ExportError::Empty);
    }
    pages.iter().map(classify).collect()
}

fn classify(page: &Page) -> Result<ExportPage, ExportError> {
    let content = if has_annotations(page) {
        // Shapes only exist in the flattened raster; the host must render
        // one before exporting an annotated page.
        match &page.preview {
            Some(raster) => ExportContent::Flattened(raster.clone()),
            None => return Err(ExportError::MissingPreview(page.id)),
        }
    } else {
        match (&page.content_bytes, &page.preview) {
            (Some(bytes), _) => ExportContent::Original(bytes.clone()),
            (None, Some(raster)) => ExportContent::Flattened(raster.clone()),
            (None, None) => return Err(ExportError::MissingContent(page.id)),
        }
    };
    Ok(ExportPage {
        content,
        rotation: page.rotation,
        width: page.width,
        height: page.height,
    })
}

/// Whether the page's stored snapshot actually contains shapes
///
/// An empty or unparseable snapshot counts as unannotated, so a page whose
/// shapes were all deleted still exports losslessly.
fn has_annotations(page: &Page) -> bool {
    page.annotations
        .as_deref()
        .is_some_and(|s| !ShapeSet::parse(s).is_empty())
}
