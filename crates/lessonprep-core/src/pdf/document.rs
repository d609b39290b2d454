//! PDF page rendering using MuPDF.
//!
//! The document bytes are kept and a fresh MuPDF document is opened for each
//! render, so `PdfDocument` holds no MuPDF handles and can be shared across threads.

use image::{DynamicImage, RgbImage};
use mupdf::{Colorspace, Document, Matrix, Page};
use tracing::{debug, trace};

use super::{DocumentRenderer, Result};
use crate::error::PdfError;

const PDF_MIME: &str = "application/pdf";

/// Largest raster a single page may produce.
const MAX_PAGE_PIXELS: u64 = 64 * 1024 * 1024;

/// Page dimensions in PDF points, after applying the page rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// A parsed PDF document.
pub struct PdfDocument {
    data: Vec<u8>,
    page_count: u32,
}

fn parse_err(e: mupdf::Error) -> PdfError {
    PdfError::Parse(e.to_string())
}

impl PdfDocument {
    /// Parse a PDF from bytes.
    pub fn load(data: &[u8]) -> Result<Self> {
        let document = Document::from_bytes(data, PDF_MIME).map_err(parse_err)?;

        // MuPDF already tries the empty password
        if document.needs_password().map_err(parse_err)? {
            return Err(PdfError::Encrypted);
        }

        let page_count = document.page_count().map_err(parse_err)?;
        let page_count = u32::try_from(page_count).unwrap_or(0);
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        Ok(Self {
            data: data.to_vec(),
            page_count,
        })
    }

    fn with_page<T>(&self, page: u32, f: impl FnOnce(&Page) -> Result<T>) -> Result<T> {
        if page == 0 || page > self.page_count {
            return Err(PdfError::InvalidPage(page));
        }
        let render_err = |e: mupdf::Error| PdfError::Render {
            page,
            reason: e.to_string(),
        };

        let document = Document::from_bytes(&self.data, PDF_MIME).map_err(parse_err)?;
        let index = i32::try_from(page - 1).map_err(|_| PdfError::InvalidPage(page))?;
        let loaded = document.load_page(index).map_err(render_err)?;
        f(&loaded)
    }

    /// Size of a page viewport at scale 1.0.
    pub fn page_size(&self, page: u32) -> Result<PageSize> {
        self.with_page(page, |loaded| {
            let bounds = loaded.bounds().map_err(|e| PdfError::Render {
                page,
                reason: e.to_string(),
            })?;
            Ok(PageSize {
                width: (bounds.x1 - bounds.x0).abs(),
                height: (bounds.y1 - bounds.y0).abs(),
            })
        })
    }
}

impl DocumentRenderer for PdfDocument {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn render_page(&self, page: u32, scale: f32) -> Result<DynamicImage> {
        let render_err = |reason: String| PdfError::Render { page, reason };

        if !scale.is_finite() || scale <= 0.0 {
            return Err(render_err(format!("invalid scale {}", scale)));
        }

        self.with_page(page, |loaded| {
            let bounds = loaded.bounds().map_err(|e| render_err(e.to_string()))?;
            let width = f64::from((bounds.x1 - bounds.x0).abs() * scale).ceil() as u64;
            let height = f64::from((bounds.y1 - bounds.y0).abs() * scale).ceil() as u64;
            if width.saturating_mul(height) > MAX_PAGE_PIXELS {
                return Err(render_err(format!("page too large: {}x{}", width, height)));
            }

            debug!("Rendering page {} at scale {} ({}x{})", page, scale, width, height);
            let matrix = Matrix::new_scale(scale, scale);
            let pixmap = loaded
                .to_pixmap(&matrix, &Colorspace::device_rgb(), false, false)
                .map_err(|e| render_err(e.to_string()))?;

            pixmap_to_image(&pixmap).ok_or_else(|| render_err("unexpected pixmap layout".to_string()))
        })
    }
}

/// Copy an RGB(A) pixmap into an owned image, dropping any alpha channel.
fn pixmap_to_image(pixmap: &mupdf::Pixmap) -> Option<DynamicImage> {
    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let n = pixmap.n() as usize;
    let samples = pixmap.samples();
    trace!("Pixmap {}x{} with {} channels", width, height, n);

    let row_bytes = width.checked_mul(n)?;
    if n < 3 || samples.len() < row_bytes.checked_mul(height)? {
        return None;
    }

    let mut rgb = Vec::with_capacity(width.checked_mul(height)?.checked_mul(3)?);
    for row in samples.chunks_exact(row_bytes).take(height) {
        if n == 3 {
            rgb.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                rgb.extend_from_slice(&px[..3]);
            }
        }
    }

    RgbImage::from_raw(u32::try_from(width).ok()?, u32::try_from(height).ok()?, rgb)
        .map(DynamicImage::ImageRgb8)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::{dictionary, Object, Stream};
    use pretty_assertions::assert_eq;

    /// Build a PDF of 100x200 pages.
    ///
    /// With `with_images` each page paints a red 2x2 RGB image over the whole page;
    /// otherwise each page only carries a line of text in a standard font.
    pub(crate) fn sample_pdf(pages: u32, with_images: bool) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let mut kids: Vec<Object> = Vec::new();

        for _ in 0..pages {
            let mut xobjects = lopdf::Dictionary::new();
            let content = if with_images {
                let image = Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => 2,
                        "Height" => 2,
                        "ColorSpace" => "DeviceRGB",
                        "BitsPerComponent" => 8,
                    },
                    [200u8, 10, 10].repeat(4),
                );
                xobjects.set("Im0", doc.add_object(image));
                b"q 100 0 0 200 0 0 cm /Im0 Do Q".to_vec()
            } else {
                b"BT /F1 24 Tf 10 100 Td (Cells) Tj ET".to_vec()
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => xobjects,
                    "Font" => dictionary! { "F1" => font_id },
                },
            });
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
                "MediaBox" => vec![0.into(), 0.into(), 100.into(), 200.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(PdfDocument::load(b"not a pdf"), Err(PdfError::Parse(_))));
    }

    #[test]
    fn test_page_count_and_inherited_size() {
        let doc = PdfDocument::load(&sample_pdf(3, true)).unwrap();
        assert_eq!(doc.page_count(), 3);
        assert_eq!(
            doc.page_size(2).unwrap(),
            PageSize {
                width: 100.0,
                height: 200.0
            }
        );
    }

    #[test]
    fn test_render_page_scales_to_viewport() {
        let doc = PdfDocument::load(&sample_pdf(1, true)).unwrap();
        let img = doc.render_page(1, 1.5).unwrap();
        assert_eq!((img.width(), img.height()), (150, 300));

        let center = img.to_rgb8().get_pixel(75, 150).0;
        assert!(center[0] > 150 && center[1] < 80, "expected red, got {:?}", center);
    }

    #[test]
    fn test_render_text_only_page() {
        let doc = PdfDocument::load(&sample_pdf(1, false)).unwrap();
        let img = doc.render_page(1, 1.0).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (100, 200));

        // Glyphs leave dark pixels on the white page
        assert!(img.pixels().any(|p| p.0.iter().all(|&c| c < 128)));
        assert!(img.pixels().any(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn test_render_page_out_of_range() {
        let doc = PdfDocument::load(&sample_pdf(2, true)).unwrap();
        assert!(matches!(doc.render_page(3, 1.0), Err(PdfError::InvalidPage(3))));
        assert!(matches!(doc.render_page(0, 1.0), Err(PdfError::InvalidPage(0))));
    }

    #[test]
    fn test_render_rejects_unbounded_scale() {
        let doc = PdfDocument::load(&sample_pdf(1, false)).unwrap();
        assert!(matches!(doc.render_page(1, 100_000.0), Err(PdfError::Render { page: 1, .. })));
        assert!(matches!(doc.render_page(1, f32::NAN), Err(PdfError::Render { page: 1, .. })));
    }
}
