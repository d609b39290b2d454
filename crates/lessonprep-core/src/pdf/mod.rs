//! PDF processing module.

#[cfg(feature = "native")]
mod document;
mod rasterizer;

#[cfg(feature = "native")]
pub use document::{PageSize, PdfDocument};
pub use rasterizer::{RasterImage, RasterOptions, Rasterizer, JPEG_MIME};

#[cfg(test)]
pub(crate) use rasterizer::tests::FakeDocument;

use crate::error::PdfError;
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// A loaded document that can render its pages to raster images.
///
/// Page numbers are 1-indexed throughout.
pub trait DocumentRenderer: Send + Sync {
    /// Get the number of pages in the document.
    fn page_count(&self) -> u32;

    /// Render a page into a raster sized to the page viewport times `scale`.
    fn render_page(&self, page: u32, scale: f32) -> Result<DynamicImage>;
}
