//! Sequential page rasterization to JPEG.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::DocumentRenderer;
use crate::error::{RasterizeError, ValidationError};

/// MIME type of every rasterized page.
pub const JPEG_MIME: &str = "image/jpeg";

/// An encoded page image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterImage {
    /// Always [`JPEG_MIME`].
    pub mime_type: String,
    /// Encoded image bytes (base64 when serialized).
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl RasterImage {
    pub fn jpeg(data: Vec<u8>) -> Self {
        Self {
            mime_type: JPEG_MIME.to_string(),
            data,
        }
    }

    /// Image bytes as standard base64, as sent inline to the generation service.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// Rendering parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Viewport scale factor applied to each page.
    pub scale: f32,
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            jpeg_quality: 92,
        }
    }
}

const DEFAULT_SCALE: f32 = 1.5;

/// Accepted viewport scale range.
pub const SCALE_RANGE: (f32, f32) = (0.1, 4.0);

impl RasterOptions {
    /// Clamp scale and quality into their accepted ranges. A non-finite scale
    /// falls back to the default.
    pub fn sanitized(self) -> Self {
        let scale = if self.scale.is_finite() {
            self.scale.clamp(SCALE_RANGE.0, SCALE_RANGE.1)
        } else {
            DEFAULT_SCALE
        };
        Self {
            scale,
            jpeg_quality: self.jpeg_quality.clamp(1, 100),
        }
    }
}

/// Turns a set of document pages into JPEG images, one page at a time.
#[derive(Debug, Clone, Default)]
pub struct Rasterizer {
    options: RasterOptions,
}

impl Rasterizer {
    pub fn new(options: RasterOptions) -> Self {
        let sanitized = options.sanitized();
        if sanitized != options {
            warn!("Raster options {:?} adjusted to {:?}", options, sanitized);
        }
        Self { options: sanitized }
    }

    pub fn options(&self) -> &RasterOptions {
        &self.options
    }

    /// Check that `pages` is non-empty and lies within `1..=page_count`.
    pub fn validate(pages: &[u32], page_count: u32) -> Result<(), ValidationError> {
        if pages.is_empty() {
            return Err(ValidationError::NoPages);
        }
        if let Some(&page) = pages.iter().find(|&&p| p < 1 || p > page_count) {
            return Err(ValidationError::PageOutOfBounds { page, page_count });
        }
        Ok(())
    }

    /// Render and encode `pages` in the given order.
    ///
    /// All pages are bounds-checked before any rendering starts. Pages are
    /// rendered one at a time, yielding to the runtime between pages; the first
    /// failure aborts the batch and no images are returned.
    pub async fn rasterize<D>(&self, document: &D, pages: &[u32]) -> Result<Vec<RasterImage>, RasterizeError>
    where
        D: DocumentRenderer + ?Sized,
    {
        Self::validate(pages, document.page_count())?;

        let mut images = Vec::with_capacity(pages.len());
        for &page in pages {
            let image = self.rasterize_page(document, page).map_err(|reason| {
                warn!("Rasterization aborted at page {}: {}", page, reason);
                RasterizeError::Processing
            })?;
            images.push(image);
            tokio::task::yield_now().await;
        }

        debug!("Rasterized {} pages", images.len());
        Ok(images)
    }

    fn rasterize_page<D>(&self, document: &D, page: u32) -> Result<RasterImage, String>
    where
        D: DocumentRenderer + ?Sized,
    {
        let rendered = document
            .render_page(page, self.options.scale)
            .map_err(|e| e.to_string())?;

        let mut data = Vec::new();
        let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut data), self.options.jpeg_quality);
        rendered
            .to_rgb8()
            .write_with_encoder(encoder)
            .map_err(|e| e.to_string())?;

        debug!("Encoded page {} ({} bytes)", page, data.len());
        Ok(RasterImage::jpeg(data))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::PdfError;
    #[cfg(feature = "native")]
    use crate::pdf::document::tests::sample_pdf;
    #[cfg(feature = "native")]
    use crate::pdf::PdfDocument;
    use image::DynamicImage;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// In-memory document that records which pages were rendered.
    pub(crate) struct FakeDocument {
        pub pages: u32,
        pub fail_on: Option<u32>,
        pub rendered: Mutex<Vec<u32>>,
        pub render_calls: AtomicU32,
    }

    impl FakeDocument {
        pub fn new(pages: u32) -> Self {
            Self {
                pages,
                fail_on: None,
                rendered: Mutex::new(Vec::new()),
                render_calls: AtomicU32::new(0),
            }
        }
    }

    impl DocumentRenderer for FakeDocument {
        fn page_count(&self) -> u32 {
            self.pages
        }

        fn render_page(&self, page: u32, _scale: f32) -> crate::pdf::Result<DynamicImage> {
            self.render_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(page) {
                return Err(PdfError::Render {
                    page,
                    reason: "boom".to_string(),
                });
            }
            self.rendered.lock().unwrap().push(page);
            Ok(DynamicImage::new_rgb8(4, 4))
        }
    }

    #[tokio::test]
    async fn test_rasterize_preserves_order() {
        let doc = FakeDocument::new(10);
        let images = Rasterizer::default().rasterize(&doc, &[2, 5, 9]).await.unwrap();

        assert_eq!(images.len(), 3);
        assert!(images.iter().all(|img| img.mime_type == JPEG_MIME));
        assert_eq!(*doc.rendered.lock().unwrap(), vec![2, 5, 9]);
    }

    #[tokio::test]
    async fn test_out_of_bounds_renders_nothing() {
        let doc = FakeDocument::new(5);
        let err = Rasterizer::default().rasterize(&doc, &[1, 2, 6]).await.unwrap_err();

        assert!(matches!(
            err,
            RasterizeError::Validation(ValidationError::PageOutOfBounds { page: 6, page_count: 5 })
        ));
        assert_eq!(doc.render_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_page_zero_rejected() {
        let doc = FakeDocument::new(5);
        let err = Rasterizer::default().rasterize(&doc, &[0, 1]).await.unwrap_err();

        assert!(matches!(
            err,
            RasterizeError::Validation(ValidationError::PageOutOfBounds { page: 0, .. })
        ));
        assert_eq!(doc.render_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_page_set_rejected() {
        let doc = FakeDocument::new(5);
        let err = Rasterizer::default().rasterize(&doc, &[]).await.unwrap_err();
        assert!(matches!(err, RasterizeError::Validation(ValidationError::NoPages)));
    }

    #[tokio::test]
    async fn test_render_failure_aborts_batch() {
        let mut doc = FakeDocument::new(5);
        doc.fail_on = Some(3);
        let err = Rasterizer::default().rasterize(&doc, &[1, 3, 4]).await.unwrap_err();

        assert!(matches!(err, RasterizeError::Processing));
        assert_eq!(*doc.rendered.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_options_are_clamped() {
        let huge = Rasterizer::new(RasterOptions {
            scale: 100_000.0,
            jpeg_quality: 0,
        });
        assert_eq!(huge.options().scale, 4.0);
        assert_eq!(huge.options().jpeg_quality, 1);

        let nan = Rasterizer::new(RasterOptions {
            scale: f32::NAN,
            jpeg_quality: 92,
        });
        assert_eq!(nan.options(), &RasterOptions::default());
    }

    #[cfg(feature = "native")]
    #[tokio::test]
    async fn test_oversized_scale_renders_at_maximum() {
        let doc = PdfDocument::load(&sample_pdf(1, false)).unwrap();
        let rasterizer = Rasterizer::new(RasterOptions {
            scale: 100_000.0,
            ..RasterOptions::default()
        });
        let images = rasterizer.rasterize(&doc, &[1]).await.unwrap();

        let decoded = image::load_from_memory(&images[0].data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (400, 800));
    }

    #[cfg(feature = "native")]
    #[tokio::test]
    async fn test_rasterize_text_only_page() {
        let doc = PdfDocument::load(&sample_pdf(2, false)).unwrap();
        let images = Rasterizer::default().rasterize(&doc, &[1, 2]).await.unwrap();

        assert_eq!(images.len(), 2);
        let decoded = image::load_from_memory(&images[0].data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (150, 300));
    }

    #[cfg(feature = "native")]
    #[tokio::test]
    async fn test_rasterize_real_pdf_produces_jpeg() {
        let doc = PdfDocument::load(&sample_pdf(3, true)).unwrap();
        let images = Rasterizer::default().rasterize(&doc, &[1, 3]).await.unwrap();

        assert_eq!(images.len(), 2);
        // JPEG SOI marker
        assert_eq!(&images[0].data[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&images[1].data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (150, 300));
    }

    #[test]
    fn test_raster_image_serializes_base64() {
        let img = RasterImage::jpeg(vec![1, 2, 3]);
        let json = serde_json::to_value(&img).unwrap();
        assert_eq!(json["mimeType"], "image/jpeg");
        assert_eq!(json["data"], "AQID");

        let back: RasterImage = serde_json::from_value(json).unwrap();
        assert_eq!(back, img);
    }
}
