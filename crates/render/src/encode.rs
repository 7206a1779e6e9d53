//! Export document assembly
//!
//! Encodes the page classifications produced by the core crate's export
//! module into a single output PDF: original pages are copied verbatim,
//! flattened pages are embedded as full-page image objects. Display
//! rotation is applied as a page-level transform in every branch.

use image::DynamicImage;
use pdfium_render::prelude::*;

use pagedesk_core::{ExportContent, ExportPage};

use crate::engine::{render_rotation, PdfEngine, RenderError, RenderResult};

impl PdfEngine {
    /// Assemble the output PDF from classified pages, in order
    pub fn encode_pdf(&self, pages: &[ExportPage]) -> RenderResult<Vec<u8>> {
        let mut output = self
            .pdfium
            .create_new_pdf()
            .map_err(|e| RenderError::Encode(e.to_string()))?;

        for (index, page) in pages.iter().enumerate() {
            match &page.content {
                ExportContent::Original(bytes) => {
                    let source = self
                        .pdfium
                        .load_pdf_from_byte_slice(bytes, None)
                        .map_err(|e| RenderError::Load(e.to_string()))?;
                    output
                        .pages_mut()
                        .copy_page_from_document(&source, 0, index as u16)
                        .map_err(|e| RenderError::Encode(e.to_string()))?;
                    self.apply_rotation(&output, index as u16, page.rotation)?;
                }

                ExportContent::Flattened(raster) => {
                    // Cached rasters are always unrotated, so the flattened
                    // page takes the same page-level rotation as the others.
                    let buffer = image::RgbaImage::from_raw(
                        raster.width,
                        raster.height,
                        raster.pixels.to_vec(),
                    )
                    .ok_or_else(|| {
                        RenderError::Image("raster buffer does not match its dimensions".into())
                    })?;
                    self.embed_image(
                        &mut output,
                        &DynamicImage::ImageRgba8(buffer),
                        page.width,
                        page.height,
                    )?;
                    self.apply_rotation(&output, index as u16, page.rotation)?;
                }
            }
        }

        tracing::info!(pages = pages.len(), "encoded export document");
        output
            .save_to_bytes()
            .map_err(|e| RenderError::Encode(e.to_string()))
    }

    fn apply_rotation(
        &self,
        output: &PdfDocument<'static>,
        index: u16,
        rotation: u16,
    ) -> RenderResult<()> {
        if rotation == 0 {
            return Ok(());
        }
        let mut page = output
            .pages()
            .get(index)
            .map_err(|_| RenderError::InvalidPageIndex(index))?;
        page.set_rotation(render_rotation(rotation));
        Ok(())
    }
}
