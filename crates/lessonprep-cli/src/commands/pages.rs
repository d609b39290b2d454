//! Pages command - resolve a page selection without touching any document.

use clap::Args;

use lessonprep_core::pdf::Rasterizer;
use lessonprep_core::{resolve_pages, ValidationError};

use super::load_config;

/// Arguments for the pages command.
#[derive(Args)]
pub struct PagesArgs {
    /// Page selection, e.g. "25-30, 40" (Western or Arabic-Indic digits)
    #[arg(required = true)]
    input: String,

    /// Check the pages against a document with this many pages
    #[arg(long)]
    page_count: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON array of page numbers
    Json,
    /// Collapsed ranges, e.g. "25-30, 40"
    Text,
}

pub fn run(args: PagesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let pages = resolve_pages(&args.input);

    if pages.is_empty() {
        anyhow::bail!("{}", ValidationError::NoPages.localized(config.locale));
    }

    if let Some(page_count) = args.page_count {
        if let Err(e) = Rasterizer::validate(&pages, page_count) {
            anyhow::bail!("{}", e.localized(config.locale));
        }
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&pages)?),
        OutputFormat::Text => println!("{}", pages),
    }

    Ok(())
}
