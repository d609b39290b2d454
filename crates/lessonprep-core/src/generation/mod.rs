//! Lesson generation through an external generative AI service.

pub mod decode;
#[cfg(feature = "native")]
mod gemini;
pub mod schema;

pub use decode::{decode_lesson, decode_quiz, strip_code_fence};
#[cfg(feature = "native")]
pub use gemini::GeminiClient;

use async_trait::async_trait;

use crate::error::GenerationError;
use crate::models::lesson::{LessonContent, QuizItem};
use crate::pdf::RasterImage;

/// Result type for generation operations.
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Inputs for a generation call.
#[derive(Debug, Clone, Copy)]
pub struct GenerationRequest<'a> {
    pub grade_name: &'a str,
    pub book_name: &'a str,
    /// Page images in page order.
    pub images: &'a [RasterImage],
    pub question_count: u32,
}

impl GenerationRequest<'_> {
    /// Reject requests that cannot produce a lesson.
    pub fn check(&self) -> Result<()> {
        if self.images.is_empty() {
            return Err(GenerationError::InvalidRequest("no page images".to_string()));
        }
        if self.question_count == 0 {
            return Err(GenerationError::InvalidRequest(
                "question count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A service that turns page images into lesson content.
#[async_trait]
pub trait LessonGenerator: Send + Sync {
    /// Generate topic, explanations, quiz, and flashcards.
    async fn generate_lesson(&self, request: &GenerationRequest<'_>) -> Result<LessonContent>;

    /// Generate a fresh quiz only, for the same pages.
    async fn regenerate_quiz(&self, request: &GenerationRequest<'_>) -> Result<Vec<QuizItem>>;
}
