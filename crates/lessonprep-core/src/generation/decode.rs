//! Decoding of untrusted service responses.

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::Result;
use crate::error::GenerationError;
use crate::models::lesson::{validate_quiz, LessonContent, QuizItem};

lazy_static! {
    static ref OPENING_FENCE: Regex = Regex::new(r"^```[A-Za-z]*[ \t]*\r?\n?").unwrap();
    static ref CLOSING_FENCE: Regex = Regex::new(r"\r?\n?```$").unwrap();
}

/// Remove an optional Markdown code fence (```` ```json ... ``` ````) around the text.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let start = OPENING_FENCE.find(trimmed).map(|m| m.end()).unwrap_or(0);
    let body = &trimmed[start..];
    let end = CLOSING_FENCE.find(body).map(|m| m.start()).unwrap_or(body.len());
    body[..end].trim()
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    let body = strip_code_fence(text);
    serde_json::from_str(body).map_err(|e| {
        debug!("Undecodable response body: {}", body);
        GenerationError::Decode(e.to_string())
    })
}

fn fail_on_issues(issues: Vec<String>) -> Result<()> {
    if issues.is_empty() {
        return Ok(());
    }
    warn!("Response failed validation: {:?}", issues);
    Err(GenerationError::Decode(issues.join("; ")))
}

/// Decode and validate a full lesson response.
pub fn decode_lesson(text: &str) -> Result<LessonContent> {
    let lesson: LessonContent = decode(text)?;
    fail_on_issues(lesson.validate())?;
    Ok(lesson)
}

/// Decode and validate a quiz-only response.
pub fn decode_quiz(text: &str) -> Result<Vec<QuizItem>> {
    let quiz: Vec<QuizItem> = decode(text)?;
    if quiz.is_empty() {
        return Err(GenerationError::Decode("quiz has no questions".to_string()));
    }
    fail_on_issues(validate_quiz(&quiz))?;
    Ok(quiz)
}
