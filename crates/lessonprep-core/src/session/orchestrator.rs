//! Runs page rasterization and lesson generation against a shared session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use super::{Commit, LessonSession};
use crate::error::{LessonError, ValidationError};
use crate::generation::{GenerationRequest, LessonGenerator};
use crate::pages::{resolve_pages, PageSet};
use crate::pdf::{DocumentRenderer, RasterImage, Rasterizer};

/// Drives generation and quiz regeneration for one [`LessonSession`].
///
/// The session lock is never held across an await, so navigation can happen
/// while a request is in flight.
pub struct LessonOrchestrator<G> {
    generator: G,
    rasterizer: Rasterizer,
    session: Arc<Mutex<LessonSession>>,
}

impl<G: LessonGenerator> LessonOrchestrator<G> {
    pub fn new(generator: G, rasterizer: Rasterizer, session: LessonSession) -> Self {
        Self {
            generator,
            rasterizer,
            session: Arc::new(Mutex::new(session)),
        }
    }

    /// Lock the session for reading or navigation.
    pub fn session(&self) -> MutexGuard<'_, LessonSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve `page_input` and rasterize those pages of `document`.
    pub async fn prepare_images<D>(
        &self,
        document: &D,
        page_input: &str,
    ) -> Result<(PageSet, Vec<RasterImage>), LessonError>
    where
        D: DocumentRenderer + ?Sized,
    {
        let pages = resolve_pages(page_input);
        if pages.is_empty() {
            return Err(ValidationError::NoPages.into());
        }

        debug!("Resolved {:?} to pages {}", page_input, pages);
        let images = self.rasterizer.rasterize(document, &pages).await?;
        Ok((pages, images))
    }

    /// Rasterize the selected pages and generate a lesson from them.
    ///
    /// Failures are recorded on the session as a display message.
    pub async fn generate<D>(&self, document: &D, page_input: &str, question_count: u32) -> Commit
    where
        D: DocumentRenderer + ?Sized,
    {
        let begun = self.session().begin_generation();
        let ticket = match begun {
            Ok(ticket) => ticket,
            Err(e) => {
                self.session().fail(&LessonError::from(e));
                return Commit::Failed;
            }
        };

        let images = match self.prepare_images(document, page_input).await {
            Ok((_, images)) => images,
            Err(e) => return self.session().complete_generation(ticket.id, Vec::new(), Err(e)),
        };

        let request = GenerationRequest {
            grade_name: &ticket.grade_name,
            book_name: &ticket.book_name,
            images: &images,
            question_count,
        };
        let result = self
            .generator
            .generate_lesson(&request)
            .await
            .map_err(LessonError::from);

        if let Ok(content) = &result {
            info!(
                "Generated lesson {:?}: {} questions, {} flashcards",
                content.topic,
                content.quiz.len(),
                content.flashcards.len()
            );
        }

        self.session().complete_generation(ticket.id, images, result)
    }

    /// Replace the current quiz, reusing the images of the current lesson.
    ///
    /// Returns `None` when there is no lesson to regenerate a quiz for.
    pub async fn regenerate_quiz(&self) -> Option<Commit> {
        let ticket = self.session().begin_quiz_regeneration()?;

        let request = GenerationRequest {
            grade_name: &ticket.grade_name,
            book_name: &ticket.book_name,
            images: &ticket.images,
            question_count: ticket.question_count,
        };
        let result = self
            .generator
            .regenerate_quiz(&request)
            .await
            .map_err(LessonError::from);

        Some(self.session().complete_quiz_regeneration(ticket.id, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::generation;
    use crate::models::catalog::{Book, Grade};
    use crate::models::lesson::tests::{quiz_item, sample_lesson};
    use crate::models::lesson::{LessonContent, QuizItem};
    use crate::pdf::FakeDocument;
    use crate::session::View;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::Ordering;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct ScriptedGenerator {
        fail: bool,
        gate: Option<Arc<Notify>>,
        seen_images: Mutex<Vec<Vec<RasterImage>>>,
    }

    impl ScriptedGenerator {
        async fn record(&self, request: &GenerationRequest<'_>) -> generation::Result<()> {
            self.seen_images.lock().unwrap().push(request.images.to_vec());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(GenerationError::Service {
                    status: 429,
                    message: "quota exceeded".into(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl LessonGenerator for ScriptedGenerator {
        async fn generate_lesson(&self, request: &GenerationRequest<'_>) -> generation::Result<LessonContent> {
            self.record(request).await?;
            Ok(sample_lesson())
        }

        async fn regenerate_quiz(&self, request: &GenerationRequest<'_>) -> generation::Result<Vec<QuizItem>> {
            self.record(request).await?;
            Ok((0..request.question_count as usize).map(|i| quiz_item(100 + i)).collect())
        }
    }

    fn orchestrator(generator: ScriptedGenerator) -> LessonOrchestrator<ScriptedGenerator> {
        let mut session = LessonSession::default();
        session.select_grade(Grade::from_name("Grade 7"));
        session.select_book(Book::from_name("Science"));
        LessonOrchestrator::new(generator, Rasterizer::default(), session)
    }

    #[tokio::test]
    async fn test_generate_then_regenerate_reuses_images() {
        let orch = orchestrator(ScriptedGenerator::default());
        let doc = FakeDocument::new(40);

        assert_eq!(orch.generate(&doc, "٢٥-٢٧", 10).await, Commit::Applied);
        assert_eq!(orch.session().view(), View::Lesson);
        assert_eq!(*doc.rendered.lock().unwrap(), vec![25, 26, 27]);
        let calls_after_generate = doc.render_calls.load(Ordering::SeqCst);

        assert_eq!(orch.regenerate_quiz().await, Some(Commit::Applied));
        assert_eq!(doc.render_calls.load(Ordering::SeqCst), calls_after_generate);

        let seen = orch.generator.seen_images.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], seen[1]);
        assert_eq!(orch.session().content().unwrap().quiz[0], quiz_item(100));
    }

    #[tokio::test]
    async fn test_empty_page_input_is_validation_error() {
        let orch = orchestrator(ScriptedGenerator::default());
        let doc = FakeDocument::new(5);

        assert_eq!(orch.generate(&doc, "abc", 10).await, Commit::Failed);
        assert!(orch.session().error().unwrap().contains("no valid page numbers"));
        assert_eq!(doc.render_calls.load(Ordering::SeqCst), 0);
        assert!(orch.generator.seen_images.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_bounds_pages_never_reach_generator() {
        let orch = orchestrator(ScriptedGenerator::default());
        let doc = FakeDocument::new(5);

        assert_eq!(orch.generate(&doc, "4-6", 10).await, Commit::Failed);
        assert!(orch.session().error().unwrap().contains("between 1 and 5"));
        assert!(orch.generator.seen_images.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_service_failure_becomes_message() {
        let orch = orchestrator(ScriptedGenerator {
            fail: true,
            ..ScriptedGenerator::default()
        });
        let doc = FakeDocument::new(5);

        assert_eq!(orch.generate(&doc, "1", 5).await, Commit::Failed);
        assert_eq!(orch.session().view(), View::LessonPrep);
        assert!(orch.session().error().unwrap().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_navigation_during_generation_discards_result() {
        let gate = Arc::new(Notify::new());
        let orch = Arc::new(orchestrator(ScriptedGenerator {
            gate: Some(Arc::clone(&gate)),
            ..ScriptedGenerator::default()
        }));

        let task = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move {
                let doc = FakeDocument::new(5);
                orch.generate(&doc, "1-2", 5).await
            })
        };

        // Wait until the request reaches the generator
        while orch.generator.seen_images.lock().unwrap().is_empty() {
            tokio::task::yield_now().await;
        }
        orch.session().back_to_books();
        gate.notify_one();

        assert_eq!(task.await.unwrap(), Commit::Stale);
        assert_eq!(orch.session().view(), View::Books);
        assert!(orch.session().content().is_none());
    }

    #[tokio::test]
    async fn test_regenerate_without_lesson() {
        let orch = orchestrator(ScriptedGenerator::default());
        assert_eq!(orch.regenerate_quiz().await, None);
    }
}
