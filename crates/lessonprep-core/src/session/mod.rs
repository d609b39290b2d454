//! Screen state for one user working through grade, book, page selection, and lesson.
//!
//! Async work is bracketed by `begin_*` / `complete_*`. Every navigation bumps
//! the session epoch, so a result that arrives after the user moved away is
//! dropped instead of overwriting what is on screen.

mod orchestrator;

pub use orchestrator::LessonOrchestrator;

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{LessonError, Locale, ValidationError};
use crate::models::catalog::{Book, Grade};
use crate::models::lesson::{LessonContent, QuizItem};
use crate::pdf::RasterImage;

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Grades,
    Books,
    LessonPrep,
    Lesson,
}

/// Identifies one in-flight operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationId(u64);

/// What happened to the result of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// The result is now on screen.
    Applied,
    /// The operation failed; the message is in [`LessonSession::error`].
    Failed,
    /// The user navigated away first; the result was discarded.
    Stale,
}

/// Data captured when a generation starts.
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    pub id: OperationId,
    pub grade_name: String,
    pub book_name: String,
}

/// Data captured when a quiz regeneration starts.
#[derive(Debug, Clone)]
pub struct QuizTicket {
    pub id: OperationId,
    pub grade_name: String,
    pub book_name: String,
    /// Images from the generation that produced the current lesson.
    pub images: Arc<Vec<RasterImage>>,
    pub question_count: u32,
}

/// State of one lesson-preparation session.
#[derive(Debug, Default)]
pub struct LessonSession {
    view: View,
    grade: Option<Grade>,
    book: Option<Book>,
    images: Arc<Vec<RasterImage>>,
    content: Option<LessonContent>,
    error: Option<String>,
    epoch: u64,
    locale: Locale,
}

impl LessonSession {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            ..Self::default()
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn grade(&self) -> Option<&Grade> {
        self.grade.as_ref()
    }

    pub fn book(&self) -> Option<&Book> {
        self.book.as_ref()
    }

    pub fn content(&self) -> Option<&LessonContent> {
        self.content.as_ref()
    }

    /// Images the current lesson was generated from.
    pub fn images(&self) -> &[RasterImage] {
        &self.images
    }

    /// Message from the last failed operation.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    fn navigate(&mut self, view: View) {
        self.epoch += 1;
        self.view = view;
        debug!("Navigated to {:?} (epoch {})", view, self.epoch);
    }

    fn current(&self) -> OperationId {
        OperationId(self.epoch)
    }

    fn is_current(&self, id: OperationId) -> bool {
        if id == self.current() {
            true
        } else {
            info!("Discarding stale result from operation {:?}", id);
            false
        }
    }

    pub fn select_grade(&mut self, grade: Grade) {
        self.grade = Some(grade);
        self.navigate(View::Books);
    }

    pub fn select_book(&mut self, book: Book) {
        self.book = Some(book);
        self.navigate(View::LessonPrep);
    }

    /// Return to grade selection, dropping the selected book and images.
    pub fn back_to_grades(&mut self) {
        self.grade = None;
        self.book = None;
        self.images = Arc::default();
        self.navigate(View::Grades);
    }

    /// Return to book selection, dropping the lesson and images.
    pub fn back_to_books(&mut self) {
        self.book = None;
        self.content = None;
        self.images = Arc::default();
        self.navigate(View::Books);
    }

    /// Return to page selection, dropping the lesson.
    pub fn back_to_lesson_prep(&mut self) {
        self.content = None;
        self.error = None;
        self.navigate(View::LessonPrep);
    }

    /// Clear everything and go back to the start.
    pub fn reset(&mut self) {
        self.grade = None;
        self.book = None;
        self.content = None;
        self.error = None;
        self.images = Arc::default();
        self.navigate(View::Grades);
    }

    /// Reopen a previously generated lesson, e.g. one loaded from disk.
    pub fn resume(&mut self, grade: Grade, book: Book, images: Vec<RasterImage>, content: LessonContent) {
        self.grade = Some(grade);
        self.book = Some(book);
        self.images = Arc::new(images);
        self.content = Some(content);
        self.error = None;
        self.navigate(View::Lesson);
    }

    /// Record a failure as a display message.
    pub fn fail(&mut self, error: &LessonError) {
        self.error = Some(error.user_message(self.locale));
    }

    /// Start a lesson generation from the page-selection screen.
    pub fn begin_generation(&mut self) -> Result<GenerationTicket, ValidationError> {
        let (Some(grade), Some(book)) = (&self.grade, &self.book) else {
            return Err(ValidationError::MissingDocument);
        };
        self.error = None;
        Ok(GenerationTicket {
            id: self.current(),
            grade_name: grade.name.clone(),
            book_name: book.name.clone(),
        })
    }

    /// Finish a lesson generation. On success the images are kept for quiz regeneration.
    pub fn complete_generation(
        &mut self,
        id: OperationId,
        images: Vec<RasterImage>,
        result: Result<LessonContent, LessonError>,
    ) -> Commit {
        if !self.is_current(id) {
            return Commit::Stale;
        }
        match result {
            Ok(content) => {
                self.images = Arc::new(images);
                self.content = Some(content);
                self.navigate(View::Lesson);
                Commit::Applied
            }
            Err(e) => {
                self.fail(&e);
                self.view = View::LessonPrep;
                Commit::Failed
            }
        }
    }

    /// Start regenerating the quiz of the current lesson.
    ///
    /// Returns `None` when there is no lesson or no stored images.
    pub fn begin_quiz_regeneration(&mut self) -> Option<QuizTicket> {
        let grade = self.grade.as_ref()?;
        let book = self.book.as_ref()?;
        let content = self.content.as_ref()?;
        if self.images.is_empty() {
            return None;
        }

        let question_count = content.quiz.len().max(1) as u32;
        let ticket = QuizTicket {
            id: self.current(),
            grade_name: grade.name.clone(),
            book_name: book.name.clone(),
            images: Arc::clone(&self.images),
            question_count,
        };
        self.error = None;
        Some(ticket)
    }

    /// Finish a quiz regeneration, replacing only the quiz.
    pub fn complete_quiz_regeneration(
        &mut self,
        id: OperationId,
        result: Result<Vec<QuizItem>, LessonError>,
    ) -> Commit {
        if !self.is_current(id) {
            return Commit::Stale;
        }
        match (result, self.content.take()) {
            (Ok(quiz), Some(content)) => {
                self.content = Some(content.with_quiz(quiz));
                Commit::Applied
            }
            (Err(e), content) => {
                self.content = content;
                self.fail(&e);
                Commit::Failed
            }
            (Ok(_), None) => Commit::Stale,
        }
    }
}
