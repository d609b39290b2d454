//! Quiz-taking state.

use super::lesson::QuizItem;

/// Answers given to one quiz, plus whether results have been revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttempt {
    answers: Vec<Option<String>>,
    finished: bool,
}

impl QuizAttempt {
    /// Start a fresh attempt for a quiz of `len` questions.
    pub fn new(len: usize) -> Self {
        Self {
            answers: vec![None; len],
            finished: false,
        }
    }

    /// Record an answer. Ignored once results are shown or for out-of-range questions.
    pub fn answer(&mut self, index: usize, option: impl Into<String>) -> bool {
        if self.finished {
            return false;
        }
        match self.answers.get_mut(index) {
            Some(slot) => {
                *slot = Some(option.into());
                true
            }
            None => false,
        }
    }

    pub fn answer_for(&self, index: usize) -> Option<&str> {
        self.answers.get(index).and_then(|a| a.as_deref())
    }

    /// All questions have an answer.
    pub fn is_complete(&self) -> bool {
        self.answers.iter().all(Option::is_some)
    }

    /// Reveal results; further answers are ignored.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of correctly answered questions.
    pub fn score(&self, quiz: &[QuizItem]) -> usize {
        quiz.iter()
            .zip(&self.answers)
            .filter(|(item, answer)| answer.as_deref().is_some_and(|a| item.is_correct(a)))
            .count()
    }

    /// Clear all answers and hide results.
    pub fn reset(&mut self) {
        self.answers.iter_mut().for_each(|a| *a = None);
        self.finished = false;
    }
}
