//! Subcommand implementations.

pub mod config;
pub mod generate;
pub mod library;
pub mod pages;
pub mod quiz;

use std::path::{Path, PathBuf};

use lessonprep_core::models::config::LessonConfig;
use lessonprep_core::BookStore;
use tracing::debug;

/// Load the config given with `--config`, else the default file if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<LessonConfig> {
    if let Some(path) = config_path {
        return Ok(LessonConfig::from_file(Path::new(path))?);
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using config at {}", default_path.display());
        Ok(LessonConfig::from_file(&default_path)?)
    } else {
        Ok(LessonConfig::default())
    }
}

/// Open the book store from config, falling back to the platform data directory.
pub fn book_store(config: &LessonConfig) -> BookStore {
    let root = config.storage.book_dir.clone().unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lessonprep")
            .join("books")
    });
    BookStore::new(root)
}
