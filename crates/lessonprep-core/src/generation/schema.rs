//! Response schemas and prompts sent with each generation request.
//!
//! Schemas use the OpenAPI subset accepted by `generationConfig.responseSchema`.

use serde_json::{json, Value};

use super::GenerationRequest;
use crate::models::lesson::OPTIONS_PER_QUESTION;

fn quiz_item_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "question": {
                "type": "STRING",
                "description": "The question text."
            },
            "options": {
                "type": "ARRAY",
                "description": format!("Exactly {} distinct answer options.", OPTIONS_PER_QUESTION),
                "items": { "type": "STRING" }
            },
            "correctAnswer": {
                "type": "STRING",
                "description": "The correct answer, copied exactly from the options."
            }
        },
        "required": ["question", "options", "correctAnswer"]
    })
}

/// Schema for a quiz-only response: an array of quiz items.
pub fn quiz_schema() -> Value {
    json!({
        "type": "ARRAY",
        "description": "Multiple-choice questions drawn only from the book pages. No question or answer may repeat.",
        "items": quiz_item_schema()
    })
}

/// Schema for a full lesson response.
pub fn lesson_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "topic": {
                "type": "STRING",
                "description": "The lesson title taken from the pages."
            },
            "explanation": {
                "type": "OBJECT",
                "description": "The lesson explained at three lengths.",
                "properties": {
                    "short": { "type": "STRING", "description": "A brief summary." },
                    "medium": { "type": "STRING", "description": "A balanced explanation." },
                    "long": { "type": "STRING", "description": "A detailed explanation with more examples." }
                },
                "required": ["short", "medium", "long"]
            },
            "quiz": quiz_schema(),
            "flashcards": {
                "type": "ARRAY",
                "description": "Flashcards for the key points of the lesson.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "term": { "type": "STRING", "description": "Key term or question." },
                        "definition": { "type": "STRING", "description": "Definition or answer." }
                    },
                    "required": ["term", "definition"]
                }
            }
        },
        "required": ["topic", "explanation", "quiz", "flashcards"]
    })
}

/// Prompt for a full lesson.
pub fn lesson_prompt(request: &GenerationRequest<'_>, language: &str) -> String {
    format!(
        "Using the attached images of textbook pages, create the following four things. \
         Write all text in {language}.\n\
         Grade: {grade}\n\
         Book: {book}\n\n\
         1. Topic: the main title of the lesson on these pages.\n\
         2. Explanation: explain the lesson at three lengths: short, medium, and long.\n\
         3. Quiz: {count} multiple-choice questions about the lesson, each with {options} options \
         of which exactly one is correct. Questions and answers must not repeat.\n\
         4. Flashcards: flashcards for the key points of the lesson, each with a term and a definition.\n\n\
         The output must be JSON matching the provided schema.",
        language = language,
        grade = request.grade_name,
        book = request.book_name,
        count = request.question_count,
        options = OPTIONS_PER_QUESTION,
    )
}

/// Prompt for a replacement quiz.
pub fn quiz_prompt(request: &GenerationRequest<'_>, language: &str) -> String {
    format!(
        "Using the attached images of textbook pages, create only a new quiz of {count} \
         multiple-choice questions, each with {options} options of which exactly one is correct.\n\
         Make sure the questions differ from any earlier quiz on the same topic.\n\
         Write all text in {language}.\n\
         Grade: {grade}\n\
         Book: {book}",
        count = request.question_count,
        options = OPTIONS_PER_QUESTION,
        language = language,
        grade = request.grade_name,
        book = request.book_name,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::RasterImage;

    #[test]
    fn test_lesson_schema_requires_all_sections() {
        let schema = lesson_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert_eq!(required, vec!["topic", "explanation", "quiz", "flashcards"]);
        assert_eq!(schema["properties"]["quiz"]["type"], "ARRAY");
    }

    #[test]
    fn test_prompt_mentions_request_fields() {
        let images = [RasterImage::jpeg(vec![1])];
        let request = GenerationRequest {
            grade_name: "Grade 7",
            book_name: "Science",
            images: &images,
            question_count: 15,
        };
        let prompt = lesson_prompt(&request, "English");
        assert!(prompt.contains("Grade: Grade 7"));
        assert!(prompt.contains("Book: Science"));
        assert!(prompt.contains("15 multiple-choice"));
        assert!(quiz_prompt(&request, "English").contains("only a new quiz of 15"));
    }
}
