//! Page Desk Render Library
//!
//! PDFium-backed page conversion and export encoding for the page
//! assembly editor.

pub mod encode;
pub mod engine;

pub use engine::{render_rotation, PdfEngine, RenderError, RenderResult};
