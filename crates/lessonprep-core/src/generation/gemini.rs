//! Gemini `generateContent` REST client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::decode::{decode_lesson, decode_quiz};
use super::schema::{lesson_prompt, lesson_schema, quiz_prompt, quiz_schema};
use super::{GenerationRequest, LessonGenerator, Result};
use crate::error::GenerationError;
use crate::models::config::GenerationConfig;
use crate::models::lesson::{LessonContent, QuizItem};
use crate::pdf::RasterImage;

/// Client for the Generative Language API.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    language: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationSettings,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Inline {
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationSettings {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn build_request<'a>(prompt: String, images: &'a [RasterImage], schema: Value) -> GenerateContentRequest<'a> {
    let mut parts = Vec::with_capacity(images.len() + 1);
    parts.push(Part::Text { text: prompt });
    parts.extend(images.iter().map(|image| Part::Inline {
        inline_data: InlineData {
            mime_type: &image.mime_type,
            data: image.to_base64(),
        },
    }));

    GenerateContentRequest {
        contents: vec![Content { parts }],
        generation_config: GenerationSettings {
            response_mime_type: "application/json",
            response_schema: schema,
        },
    }
}

/// Concatenate the text parts of the first candidate.
fn response_text(body: &str) -> Result<String> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::Decode(format!("unexpected response envelope: {}", e)))?;

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text)
}

impl GeminiClient {
    /// Create a client. The API key must be present in `config`.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| GenerationError::NotConfigured("API key not set".to_string()))?;

        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            endpoint,
            language: config.content_language.clone(),
        })
    }

    async fn generate_text(&self, prompt: String, images: &[RasterImage], schema: Value) -> Result<String> {
        let body = build_request(prompt, images, schema);

        debug!("POST {} with {} images", self.endpoint, images.len());
        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(GenerationError::Service {
                status: status.as_u16(),
                message,
            });
        }

        response_text(&text)
    }
}

#[async_trait]
impl LessonGenerator for GeminiClient {
    async fn generate_lesson(&self, request: &GenerationRequest<'_>) -> Result<LessonContent> {
        request.check()?;
        info!(
            "Generating lesson for {} / {} from {} pages",
            request.grade_name,
            request.book_name,
            request.images.len()
        );

        let prompt = lesson_prompt(request, &self.language);
        let text = self.generate_text(prompt, request.images, lesson_schema()).await?;
        decode_lesson(&text)
    }

    async fn regenerate_quiz(&self, request: &GenerationRequest<'_>) -> Result<Vec<QuizItem>> {
        request.check()?;
        info!("Regenerating quiz with {} questions", request.question_count);

        let prompt = quiz_prompt(request, &self.language);
        let text = self.generate_text(prompt, request.images, quiz_schema()).await?;
        decode_quiz(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_body_shape() {
        let images = vec![RasterImage::jpeg(vec![1, 2, 3])];
        let body = serde_json::to_value(build_request("hi".into(), &images, quiz_schema())).unwrap();

        assert_eq!(body["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["data"], "AQID");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"```json\n["},{"text":"]\n```"}]}}]}"#;
        assert_eq!(response_text(body).unwrap(), "```json\n[]\n```");
    }

    #[test]
    fn test_response_without_candidates() {
        assert!(matches!(response_text("{}"), Err(GenerationError::EmptyResponse)));
        assert!(matches!(response_text("<html>"), Err(GenerationError::Decode(_))));
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = GenerationConfig::default();
        assert!(matches!(GeminiClient::new(&config), Err(GenerationError::NotConfigured(_))));

        let config = GenerationConfig {
            api_key: Some("key".into()),
            base_url: "http://localhost:1/".into(),
            ..GenerationConfig::default()
        };
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint,
            "http://localhost:1/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_empty_request_rejected_before_network() {
        let config = GenerationConfig {
            api_key: Some("key".into()),
            base_url: "http://localhost:1".into(),
            ..GenerationConfig::default()
        };
        let client = GeminiClient::new(&config).unwrap();
        let request = GenerationRequest {
            grade_name: "g",
            book_name: "b",
            images: &[],
            question_count: 5,
        };
        assert!(matches!(
            client.generate_lesson(&request).await,
            Err(GenerationError::InvalidRequest(_))
        ));
    }
}
