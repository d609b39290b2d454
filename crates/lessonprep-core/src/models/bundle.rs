//! A generated lesson saved together with the page images it came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::lesson::LessonContent;
use crate::pages::PageSet;
use crate::pdf::RasterImage;

/// Everything needed to show a lesson again or regenerate its quiz.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonBundle {
    pub grade: String,
    pub book: String,
    pub pages: PageSet,
    pub images: Vec<RasterImage>,
    pub content: LessonContent,
    pub created_at: DateTime<Utc>,
}

impl LessonBundle {
    /// Load a bundle from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save the bundle to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}
