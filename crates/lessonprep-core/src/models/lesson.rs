//! Lesson content produced by the generation service.
//!
//! Field names follow the service's camelCase schema so responses decode directly.

use serde::{Deserialize, Serialize};

/// Number of answer options every quiz item must carry.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Topic, tiered explanation, quiz, and flashcards for a set of pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LessonContent {
    /// Lesson title taken from the pages.
    pub topic: String,

    /// The lesson explained at three lengths.
    pub explanation: Explanation,

    /// Multiple-choice questions, in presentation order.
    pub quiz: Vec<QuizItem>,

    /// Key terms, in presentation order.
    pub flashcards: Vec<Flashcard>,
}

/// The lesson explained at three levels of detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Explanation {
    pub short: String,
    pub medium: String,
    pub long: String,
}

/// Which explanation variant to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl Explanation {
    /// Get the explanation text for a length.
    pub fn get(&self, length: ExplanationLength) -> &str {
        match length {
            ExplanationLength::Short => &self.short,
            ExplanationLength::Medium => &self.medium,
            ExplanationLength::Long => &self.long,
        }
    }
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QuizItem {
    pub question: String,
    pub options: Vec<String>,
    /// Must equal one of `options`.
    pub correct_answer: String,
}

impl QuizItem {
    /// Check whether `answer` is the correct option.
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }

    /// Validate the question and return a list of issues.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.question.trim().is_empty() {
            issues.push("Empty question text".to_string());
        }

        if self.options.len() != OPTIONS_PER_QUESTION {
            issues.push(format!(
                "Expected {} options, found {}",
                OPTIONS_PER_QUESTION,
                self.options.len()
            ));
        }

        if self.options.iter().any(|o| o.trim().is_empty()) {
            issues.push("Empty answer option".to_string());
        }

        if !self.options.contains(&self.correct_answer) {
            issues.push(format!(
                "Correct answer {:?} is not one of the options",
                self.correct_answer
            ));
        }

        issues
    }
}

/// A term and its definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Flashcard {
    pub term: String,
    pub definition: String,
}

impl LessonContent {
    /// Validate the content and return a list of issues.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.topic.trim().is_empty() {
            issues.push("Missing topic".to_string());
        }

        for (name, text) in [
            ("short", &self.explanation.short),
            ("medium", &self.explanation.medium),
            ("long", &self.explanation.long),
        ] {
            if text.trim().is_empty() {
                issues.push(format!("Missing {} explanation", name));
            }
        }

        issues.extend(validate_quiz(&self.quiz));

        for (i, card) in self.flashcards.iter().enumerate() {
            if card.term.trim().is_empty() || card.definition.trim().is_empty() {
                issues.push(format!("Flashcard {}: empty term or definition", i + 1));
            }
        }

        issues
    }

    /// Replace the quiz, keeping everything else.
    pub fn with_quiz(self, quiz: Vec<QuizItem>) -> Self {
        Self { quiz, ..self }
    }
}

/// Validate every quiz item, prefixing issues with the question number.
pub fn validate_quiz(quiz: &[QuizItem]) -> Vec<String> {
    quiz.iter()
        .enumerate()
        .flat_map(|(i, item)| {
            item.validate()
                .into_iter()
                .map(move |issue| format!("Question {}: {}", i + 1, issue))
        })
        .collect()
}
