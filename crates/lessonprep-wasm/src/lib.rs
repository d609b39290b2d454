//! WASM bindings for lesson preparation.
//!
//! Exposes page selection, response decoding, and quiz scoring to a browser
//! front-end. Rendering and the AI service call stay on the JavaScript side.

use wasm_bindgen::prelude::*;

use lessonprep_core::generation::{decode_lesson, decode_quiz};
use lessonprep_core::models::quiz::QuizAttempt;
use lessonprep_core::pages;
use lessonprep_core::pdf::Rasterizer;
use lessonprep_core::{Locale, QuizItem, ValidationError};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn parse_locale(locale: &str) -> Locale {
    match locale.to_ascii_lowercase().as_str() {
        "ckb" | "ku" | "sorani" => Locale::Sorani,
        _ => Locale::English,
    }
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Resolve page input such as "٢٥-٣٠، 41" into sorted, distinct page numbers.
#[wasm_bindgen]
pub fn resolve_pages(input: &str) -> Vec<u32> {
    pages::resolve_pages(input).into_vec()
}

/// Resolve page input and format it back as collapsed ranges ("25-30, 41").
#[wasm_bindgen]
pub fn format_pages(input: &str) -> String {
    pages::resolve_pages(input).to_string()
}

/// Write a number with Arabic-Indic digits.
#[wasm_bindgen]
pub fn to_eastern_digits(n: u32) -> String {
    pages::to_eastern_digits(n)
}

/// Check page input against a document's page count.
///
/// Returns `undefined` when the selection is usable, otherwise a message in
/// the requested locale ("en" or "ckb").
#[wasm_bindgen]
pub fn check_pages(input: &str, page_count: u32, locale: &str) -> Option<String> {
    let locale = parse_locale(locale);
    let pages = pages::resolve_pages(input);
    if pages.is_empty() {
        return Some(ValidationError::NoPages.localized(locale));
    }
    Rasterizer::validate(&pages, page_count)
        .err()
        .map(|e| e.localized(locale))
}

/// Strip an optional Markdown code fence from a model response.
#[wasm_bindgen]
pub fn strip_code_fence(text: &str) -> String {
    lessonprep_core::generation::strip_code_fence(text).to_string()
}

/// Decode and validate a lesson response from the generation service.
#[wasm_bindgen]
pub fn decode_lesson_response(text: &str) -> Result<JsValue, JsValue> {
    let lesson = decode_lesson(text).map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&lesson).map_err(to_js_error)
}

/// Decode and validate a quiz-only response from the generation service.
#[wasm_bindgen]
pub fn decode_quiz_response(text: &str) -> Result<JsValue, JsValue> {
    let quiz = decode_quiz(text).map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&quiz).map_err(to_js_error)
}

/// A quiz being taken in the browser.
#[wasm_bindgen]
pub struct QuizSession {
    quiz: Vec<QuizItem>,
    attempt: QuizAttempt,
}

#[wasm_bindgen]
impl QuizSession {
    /// Start a quiz from an array of `{question, options, correctAnswer}` objects.
    #[wasm_bindgen(constructor)]
    pub fn new(quiz: JsValue) -> Result<QuizSession, JsValue> {
        let quiz: Vec<QuizItem> = serde_wasm_bindgen::from_value(quiz).map_err(to_js_error)?;
        Ok(Self::from_items(quiz))
    }

    /// Record an answer. Returns false once results are shown.
    #[wasm_bindgen]
    pub fn answer(&mut self, index: usize, option: &str) -> bool {
        self.attempt.answer(index, option)
    }

    #[wasm_bindgen]
    pub fn answer_for(&self, index: usize) -> Option<String> {
        self.attempt.answer_for(index).map(str::to_string)
    }

    #[wasm_bindgen(getter)]
    pub fn question_count(&self) -> usize {
        self.quiz.len()
    }

    #[wasm_bindgen]
    pub fn is_complete(&self) -> bool {
        self.attempt.is_complete()
    }

    /// Reveal results.
    #[wasm_bindgen]
    pub fn finish(&mut self) {
        self.attempt.finish();
    }

    #[wasm_bindgen]
    pub fn is_finished(&self) -> bool {
        self.attempt.is_finished()
    }

    #[wasm_bindgen]
    pub fn score(&self) -> usize {
        self.attempt.score(&self.quiz)
    }

    /// Whether the answer to question `index` is correct.
    #[wasm_bindgen]
    pub fn is_correct(&self, index: usize) -> bool {
        match (self.quiz.get(index), self.attempt.answer_for(index)) {
            (Some(item), Some(answer)) => item.is_correct(answer),
            _ => false,
        }
    }

    /// Clear all answers, e.g. after the quiz was regenerated.
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.attempt.reset();
    }
}

impl QuizSession {
    fn from_items(quiz: Vec<QuizItem>) -> Self {
        let attempt = QuizAttempt::new(quiz.len());
        Self { quiz, attempt }
    }
}
