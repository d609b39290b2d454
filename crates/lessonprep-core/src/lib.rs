//! Core library for AI-assisted lesson preparation.
//!
//! This crate provides:
//! - Page range resolution for free-form, mixed-script page input
//! - PDF page rendering and sequential JPEG rasterization
//! - Lesson generation (explanations, quiz, flashcards) through the Gemini API
//! - A local per-textbook file store
//! - Session state with stale-result protection for async work

pub mod error;
pub mod generation;
pub mod models;
pub mod pages;
pub mod pdf;
pub mod session;
#[cfg(feature = "native")]
pub mod store;

pub use error::{LessonError, Locale, Result, ValidationError};
pub use generation::{GenerationRequest, LessonGenerator};
#[cfg(feature = "native")]
pub use generation::GeminiClient;
pub use models::catalog::{Book, Grade};
pub use models::lesson::{Explanation, ExplanationLength, Flashcard, LessonContent, QuizItem};
pub use pages::{resolve_pages, PageSet};
pub use pdf::{DocumentRenderer, RasterImage, RasterOptions, Rasterizer};
#[cfg(feature = "native")]
pub use pdf::PdfDocument;
pub use session::{Commit, LessonOrchestrator, LessonSession, View};
#[cfg(feature = "native")]
pub use store::{BookStore, StoredFile};
