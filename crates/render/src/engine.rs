//! PDFium-backed page conversion
//!
//! Implements the core crate's [`PageConverter`] on top of PDFium: splits
//! source PDFs into standalone single-page documents, rasterizes them for
//! the thumbnail and preview caches, and wraps raster image files as pages.

use image::DynamicImage;
use pdfium_render::prelude::*;

use pagedesk_core::{ConvertError, ExtractedPage, PageConverter, RasterImage};

/// Errors from the PDFium rendering backend
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("PDFium initialization error: {0}")]
    Initialization(String),

    #[error("PDF load error: {0}")]
    Load(String),

    #[error("invalid page index: {0}")]
    InvalidPageIndex(u16),

    #[error("PDF encode error: {0}")]
    Encode(String),

    #[error("image error: {0}")]
    Image(String),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Map a display rotation in degrees onto PDFium's rotation enum
///
/// Rotations are already normalized to quarter turns upstream; anything
/// else falls back to unrotated.
pub fn render_rotation(degrees: u16) -> PdfPageRenderRotation {
    match degrees {
        90 => PdfPageRenderRotation::Degrees90,
        180 => PdfPageRenderRotation::Degrees180,
        270 => PdfPageRenderRotation::Degrees270,
        _ => PdfPageRenderRotation::None,
    }
}

/// PDFium engine handle
///
/// Owns a leaked PDFium binding so loaded documents can carry a `'static`
/// library lifetime; the engine is created once per process.
pub struct PdfEngine {
    pub(crate) pdfium: &'static Pdfium,
}

impl PdfEngine {
    /// Initialize PDFium
    ///
    /// Search order:
    /// 1. Executable's directory (for app bundles)
    /// 2. Current working directory
    /// 3. System library paths
    pub fn new() -> RenderResult<Self> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()));

        if let Some(ref dir) = exe_dir {
            if let Ok(bindings) =
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            {
                return Ok(Self {
                    pdfium: Box::leak(Box::new(Pdfium::new(bindings))),
                });
            }
        }

        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| RenderError::Initialization(e.to_string()))?;
        Ok(Self {
            pdfium: Box::leak(Box::new(Pdfium::new(bindings))),
        })
    }
}

impl PageConverter for PdfEngine {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<ExtractedPage>, ConvertError> {
        let source = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| ConvertError::Malformed(e.to_string()))?;

        let count = source.pages().len();
        let mut extracted = Vec::with_capacity(count as usize);
        for index in 0..count {
            let page = source
                .pages()
                .get(index)
                .map_err(|e| ConvertError::Malformed(e.to_string()))?;
            let width = page.width().value;
            let height = page.height().value;

            // Each page becomes its own single-page document, so it can be
            // rendered, reordered, and exported independently.
            let mut single = self
                .pdfium
                .create_new_pdf()
                .map_err(|e| ConvertError::Malformed(e.to_string()))?;
            single
                .pages_mut()
                .copy_page_from_document(&source, index, 0)
                .map_err(|e| ConvertError::Malformed(e.to_string()))?;
            let content = single
                .save_to_bytes()
                .map_err(|e| ConvertError::Malformed(e.to_string()))?;

            extracted.push(ExtractedPage {
                content,
                width,
                height,
            });
        }
        tracing::debug!(pages = extracted.len(), "extracted pages from source");
        Ok(extracted)
    }

    fn rasterize(&self, content: &[u8], scale: f32) -> Result<RasterImage, ConvertError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(content, None)
            .map_err(|e| ConvertError::Malformed(e.to_string()))?;
        let page = document
            .pages()
            .get(0)
            .map_err(|e| ConvertError::Malformed(e.to_string()))?;

        let target_width = ((page.width().value * scale).round() as i32).max(1);
        let config = PdfRenderConfig::new().set_target_width(target_width);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| ConvertError::Render(e.to_string()))?;

        Ok(RasterImage::new(
            bitmap.width() as u32,
            bitmap.height() as u32,
            bitmap.as_rgba_bytes().to_vec(),
        ))
    }

    fn page_from_image(&self, bytes: &[u8]) -> Result<ExtractedPage, ConvertError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| ConvertError::Malformed(e.to_string()))?;
        let width = decoded.width() as f32;
        let height = decoded.height() as f32;

        // The page's content must be a document the rasterizer accepts, so
        // the image is wrapped in a single-page PDF at its pixel size.
        let mut document = self
            .pdfium
            .create_new_pdf()
            .map_err(|e| ConvertError::Render(e.to_string()))?;
        self.embed_image(&mut document, &decoded, width, height)
            .map_err(|e| ConvertError::Render(e.to_string()))?;
        let content = document
            .save_to_bytes()
            .map_err(|e| ConvertError::Render(e.to_string()))?;

        Ok(ExtractedPage {
            content,
            width,
            height,
        })
    }
}

impl PdfEngine {
    /// Append a page sized to the source and fill it with the image
    pub(crate) fn embed_image(
        &self,
        output: &mut PdfDocument<'static>,
        image: &DynamicImage,
        width: f32,
        height: f32,
    ) -> RenderResult<()> {
        let paper = PdfPagePaperSize::Custom(PdfPoints::new(width), PdfPoints::new(height));
        let mut page = output
            .pages_mut()
            .create_page_at_end(paper)
            .map_err(|e| RenderError::Encode(e.to_string()))?;

        let object = PdfPageImageObject::new_with_width(output, image, PdfPoints::new(width))
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        page.objects_mut()
            .add_image_object(object)
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_mapping_covers_quarter_turns() {
        assert!(matches!(render_rotation(0), PdfPageRenderRotation::None));
        assert!(matches!(
            render_rotation(90),
            PdfPageRenderRotation::Degrees90
        ));
        assert!(matches!(
            render_rotation(180),
            PdfPageRenderRotation::Degrees180
        ));
        assert!(matches!(
            render_rotation(270),
            PdfPageRenderRotation::Degrees270
        ));
        // Unnormalized input degrades to unrotated rather than panicking.
        assert!(matches!(render_rotation(45), PdfPageRenderRotation::None));
    }

    #[test]
    fn test_render_error_display() {
        let err = RenderError::InvalidPageIndex(5);
        assert_eq!(err.to_string(), "invalid page index: 5");

        let err = RenderError::Load("file not found".to_string());
        assert!(err.to_string().contains("file not found"));
    }
}
