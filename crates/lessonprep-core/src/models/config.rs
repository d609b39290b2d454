//! Configuration structures for lesson preparation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Locale;
use crate::pdf::RasterOptions;

/// Main configuration for lessonprep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonConfig {
    /// Lesson generation service configuration.
    pub generation: GenerationConfig,

    /// Page rendering configuration.
    pub render: RenderConfig,

    /// Local book store configuration.
    pub storage: StorageConfig,

    /// Language for user-facing messages.
    pub locale: Locale,
}

/// Generation service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// API key for the generation service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the Generative Language REST API.
    pub base_url: String,

    /// Model name.
    pub model: String,

    /// Language all generated text is written in.
    pub content_language: String,

    /// Number of quiz questions when none is given.
    pub question_count: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            content_language: "Central Kurdish (Sorani)".to_string(),
            question_count: 10,
        }
    }
}

/// Page rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Viewport scale for rendered pages, clamped to 0.1-4.0.
    pub scale: f32,

    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let options = RasterOptions::default();
        Self {
            scale: options.scale,
            jpeg_quality: options.jpeg_quality,
        }
    }
}

impl RenderConfig {
    pub fn raster_options(&self) -> RasterOptions {
        RasterOptions {
            scale: self.scale,
            jpeg_quality: self.jpeg_quality,
        }
        .sanitized()
    }
}

/// Local book store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding saved textbook files (platform data dir when unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_dir: Option<PathBuf>,
}

impl LessonConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
