//! Error types for the lessonprep-core library.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pages::to_eastern_digits;

/// Main error type for the lessonprep library.
#[derive(Error, Debug)]
pub enum LessonError {
    /// Page selection or bounds validation failed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// PDF loading or rendering error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Page rasterization error.
    #[error(transparent)]
    Rasterize(#[from] RasterizeError),

    /// Lesson generation error from the AI service.
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    /// Local book store error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl LessonError {
    /// A single human-readable message for display at an interactive retry point.
    pub fn user_message(&self, locale: Locale) -> String {
        match (self, locale) {
            (Self::Validation(e), _) | (Self::Rasterize(RasterizeError::Validation(e)), _) => {
                e.localized(locale)
            }
            (_, Locale::English) => self.to_string(),
            (Self::Rasterize(_) | Self::Pdf(_) | Self::Image(_), Locale::Sorani) => {
                "هەڵەیەک لە کاتی پرۆسێسکردنی فایلی PDF ڕوویدا.".to_string()
            }
            (Self::Generation(e), Locale::Sorani) => format!("نەتوانرا وانە دروست بکرێت: {}", e),
            (Self::Storage(_), Locale::Sorani) => {
                "هەڵەیەک لە خوێندنەوەی فایلی پاشەکەوتکراودا ڕوویدا.".to_string()
            }
            (Self::Io(_) | Self::Config(_), Locale::Sorani) => format!("هەڵەیەک ڕوویدا: {}", self),
        }
    }
}

/// Language used for user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    English,
    /// Central Kurdish, written with Arabic-Indic digits.
    Sorani,
}

/// Input validation failures, reported before any work starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The page input was empty or contained no usable page numbers.
    #[error("no valid page numbers given (example: 25-30 or 41, 43)")]
    NoPages,

    /// A requested page lies outside the document.
    #[error("page numbers must be between 1 and {page_count} (got {page})")]
    PageOutOfBounds { page: u32, page_count: u32 },

    /// No document was selected.
    #[error("no document selected")]
    MissingDocument,
}

impl ValidationError {
    /// Render the message for the given locale.
    pub fn localized(&self, locale: Locale) -> String {
        match locale {
            Locale::English => self.to_string(),
            Locale::Sorani => match self {
                Self::NoPages => {
                    "تکایە ژمارەی لاپەڕەکان بە شێوەیەکی دروست بنووسە (بۆ نموونە: ٢٥-٣٠).".to_string()
                }
                Self::PageOutOfBounds { page_count, .. } => format!(
                    "ژمارەی لاپەڕەکان دەبێت لە نێوان ١ و {} بن.",
                    to_eastern_digits(*page_count)
                ),
                Self::MissingDocument => "تکایە هەموو خانەکان پڕبکەرەوە.".to_string(),
            },
        }
    }
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// The page could not be rendered.
    #[error("failed to render page {page}: {reason}")]
    Render { page: u32, reason: String },
}

/// Errors produced while turning pages into images.
#[derive(Error, Debug)]
pub enum RasterizeError {
    /// Bounds or emptiness check failed; nothing was rendered.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A page failed to render or encode. Details are logged, not reported.
    #[error("failed to process the PDF pages")]
    Processing,
}

/// Errors from the lesson generation service.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The client is missing required configuration (e.g. the API key).
    #[error("generation client not configured: {0}")]
    NotConfigured(String),

    /// Network or transport failure.
    #[error("request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("service returned {status}: {message}")]
    Service { status: u16, message: String },

    /// The service answered but carried no text candidate.
    #[error("service returned an empty response")]
    EmptyResponse,

    /// The response text did not match the expected schema.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The request itself was unusable (e.g. no images).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Errors related to the local book store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Store directory could not be opened or created.
    #[error("failed to open book store at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Identifier contains characters that cannot name a record.
    #[error("invalid book id: {0:?}")]
    InvalidId(String),

    /// Saving a record failed.
    #[error("failed to save file for {id}: {source}")]
    Save {
        id: String,
        #[source]
        source: std::io::Error,
    },

    /// Loading a record failed.
    #[error("failed to load file for {id}: {source}")]
    Load {
        id: String,
        #[source]
        source: std::io::Error,
    },

    /// Deleting a record failed.
    #[error("failed to delete file for {id}: {source}")]
    Delete {
        id: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for the lessonprep library.
pub type Result<T> = std::result::Result<T, LessonError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_bounds_message_names_range() {
        let err = ValidationError::PageOutOfBounds { page: 40, page_count: 32 };
        assert_eq!(err.to_string(), "page numbers must be between 1 and 32 (got 40)");
    }

    #[test]
    fn test_sorani_bounds_message_uses_eastern_digits() {
        let err = ValidationError::PageOutOfBounds { page: 40, page_count: 32 };
        let msg = err.localized(Locale::Sorani);
        assert!(msg.contains("٣٢"));
        assert!(!msg.contains("32"));
    }

    #[test]
    fn test_processing_error_is_generic() {
        let err = LessonError::from(RasterizeError::Processing);
        assert_eq!(err.to_string(), "failed to process the PDF pages");
    }
}
