//! Page ingestion and deferred rasterization
//!
//! Turns source files into page batches and queues the raster work that
//! fills each page's thumbnail and preview caches. Conversion itself is
//! behind the [`PageConverter`] trait so the engine crate can plug in the
//! actual PDF backend while tests run against a stub.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::document::DocumentAction;
use crate::page::{Page, PageId, PageSource, SourceGroupId};
use crate::page::RasterImage;

/// Scale factor for full-resolution editing previews
pub const PREVIEW_SCALE: f32 = 2.0;

/// Scale factor for desk thumbnails
pub const THUMBNAIL_SCALE: f32 = 0.3;

/// Conversion failures surfaced while ingesting or rasterizing
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("document could not be parsed: {0}")]
    Malformed(String),

    #[error("document contains no pages")]
    Empty,

    #[error("rasterization failed: {0}")]
    Render(String),
}

/// One page pulled out of a source file, standalone and render-ready
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    /// Self-contained single-page document bytes
    pub content: Vec<u8>,

    /// Intrinsic width in the source's native unit
    pub width: f32,

    /// Intrinsic height in the source's native unit
    pub height: f32,
}

/// Backend that splits source files into pages and rasterizes them
pub trait PageConverter {
    /// Split a multi-page document into standalone single-page documents
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<ExtractedPage>, ConvertError>;

    /// Rasterize a single-page document at a scale factor
    ///
    /// Always renders unrotated: display rotation is a presentation
    /// transform applied at display and export time, never baked into a
    /// cached raster.
    fn rasterize(&self, content: &[u8], scale: f32) -> Result<RasterImage, ConvertError>;

    /// Convert a raster image file into a self-contained single-page
    /// document
    ///
    /// The returned content must be accepted by `rasterize`, same as an
    /// extracted page.
    fn page_from_image(&self, bytes: &[u8]) -> Result<ExtractedPage, ConvertError>;
}

/// Which page cache a raster job fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterKind {
    Preview,
    Thumbnail,
}

impl RasterKind {
    pub fn scale(self) -> f32 {
        match self {
            RasterKind::Preview => PREVIEW_SCALE,
            RasterKind::Thumbnail => THUMBNAIL_SCALE,
        }
    }
}

/// A deferred rasterization of one page into one cache slot
///
/// Carries its own copy of the page content so it can outlive edits to the
/// page collection; a completion for a since-deleted page reduces to a
/// no-op when dispatched.
#[derive(Debug, Clone)]
pub struct RasterJob {
    pub page_id: PageId,
    pub kind: RasterKind,
    content: Arc<[u8]>,
}

impl RasterJob {
    /// Run the job against a converter, yielding the cache-fill action
    pub fn render<C: PageConverter>(&self, converter: &C) -> Result<DocumentAction, ConvertError> {
        let image = converter.rasterize(&self.content, self.kind.scale())?;
        Ok(match self.kind {
            RasterKind::Preview => DocumentAction::SetPreview {
                id: self.page_id,
                image,
            },
            RasterKind::Thumbnail => DocumentAction::SetThumbnail {
                id: self.page_id,
                image,
            },
        })
    }
}

/// Builds page batches from files and queues their raster work
#[derive(Debug)]
pub struct PageLoader<C> {
    converter: C,
    jobs: VecDeque<RasterJob>,
}

impl<C: PageConverter> PageLoader<C> {
    pub fn new(converter: C) -> Self {
        Self {
            converter,
            jobs: VecDeque::new(),
        }
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// Ingest one file into a page batch
    ///
    /// Every page produced from the same file shares a source group, so
    /// grouped view can cluster them later. Thumbnail jobs are queued for
    /// each page; previews are requested separately when a page is opened
    /// for editing.
    pub fn load_file(&mut self, file_name: &str, bytes: &[u8]) -> Result<Vec<Page>, ConvertError> {
        let extension = extension_of(file_name).map(|e| e.to_ascii_lowercase());
        let (source, extracted) = match extension.as_deref() {
            Some("pdf") => (PageSource::Pdf, self.converter.extract_pages(bytes)?),
            Some("png" | "jpg" | "jpeg") => {
                (PageSource::Image, vec![self.converter.page_from_image(bytes)?])
            }
            _ => return Err(ConvertError::UnsupportedType(file_name.to_string())),
        };
        if extracted.is_empty() {
            return Err(ConvertError::Empty);
        }

        let group = SourceGroupId::new_v4();
        let pages: Vec<Page> = extracted
            .into_iter()
            .map(|p| Page::new(source, file_name, group, p.content, p.width, p.height))
            .collect();
        tracing::info!(file = file_name, pages = pages.len(), "loaded source file");

        for page in &pages {
            self.request_raster(page, RasterKind::Thumbnail);
        }
        Ok(pages)
    }

    /// Queue a raster job for one page's cache slot
    ///
    /// Skipped (with a log line) when the page's content bytes are gone.
    pub fn request_raster(&mut self, page: &Page, kind: RasterKind) {
        let Some(content) = page.content_bytes.clone() else {
            tracing::warn!(page = %page.id, "raster requested for page without content");
            return;
        };
        self.jobs.push_back(RasterJob {
            page_id: page.id,
            kind,
            content,
        });
    }

    pub fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }

    pub fn next_job(&mut self) -> Option<RasterJob> {
        self.jobs.pop_front()
    }

    /// Pop and run the next queued job, yielding its cache-fill action
    pub fn run_next(&mut self) -> Option<Result<DocumentAction, ConvertError>> {
        let job = self.jobs.pop_front()?;
        Some(job.render(&self.converter))
    }
}

fn extension_of(file_name: &str) -> Option<&str> {
    file_name.rsplit_once('.').map(|(_, ext)| ext)
}
