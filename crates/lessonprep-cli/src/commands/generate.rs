//! Generate command - build a lesson from a range of textbook pages.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use lessonprep_core::models::bundle::LessonBundle;
use lessonprep_core::models::config::LessonConfig;
use lessonprep_core::{
    resolve_pages, Book, Commit, ExplanationLength, GeminiClient, Grade, LessonContent,
    LessonOrchestrator, LessonSession, PdfDocument, Rasterizer, StoredFile,
};

use super::{book_store, load_config};

/// Question counts offered for a quiz.
pub const QUESTION_COUNTS: [u32; 4] = [5, 10, 15, 20];

/// Arguments for the generate command.
#[derive(Args)]
pub struct GenerateArgs {
    /// Textbook PDF (omit to use the file saved for the book)
    input: Option<PathBuf>,

    /// Grade name, e.g. "Grade 7"
    #[arg(short, long)]
    grade: String,

    /// Book name, e.g. "Science"
    #[arg(short, long)]
    book: String,

    /// Book id in the library (default: derived from the book name)
    #[arg(long)]
    book_id: Option<String>,

    /// Also save the input PDF to the library for later runs
    #[arg(long)]
    save: bool,

    /// Page selection, e.g. "25-30" or "٢٥-٣٠"
    #[arg(short, long)]
    pages: String,

    /// Number of quiz questions (5, 10, 15 or 20)
    #[arg(short, long, value_parser = parse_question_count)]
    questions: Option<u32>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Write the lesson bundle (content plus page images) to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format for stdout
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Explanation to print in text output
    #[arg(short, long, value_enum, default_value = "medium")]
    length: LengthArg,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Lesson content as JSON
    Json,
    /// Readable lesson
    Text,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LengthArg {
    Short,
    Medium,
    Long,
}

impl From<LengthArg> for ExplanationLength {
    fn from(arg: LengthArg) -> Self {
        match arg {
            LengthArg::Short => ExplanationLength::Short,
            LengthArg::Medium => ExplanationLength::Medium,
            LengthArg::Long => ExplanationLength::Long,
        }
    }
}

fn parse_question_count(value: &str) -> Result<u32, String> {
    let count: u32 = value.parse().map_err(|_| format!("not a number: {}", value))?;
    if QUESTION_COUNTS.contains(&count) {
        Ok(count)
    } else {
        Err(format!("must be one of {:?}", QUESTION_COUNTS))
    }
}

/// Build a Gemini client, preferring a key given on the command line.
pub fn gemini_client(config: &LessonConfig, api_key: Option<String>) -> anyhow::Result<GeminiClient> {
    let mut generation = config.generation.clone();
    if api_key.is_some() {
        generation.api_key = api_key;
    }
    GeminiClient::new(&generation).map_err(|e| {
        anyhow::anyhow!("{}. Pass --api-key or set GEMINI_API_KEY.", e)
    })
}

pub fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

pub async fn run(args: GenerateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    // Fail before any rendering when no key is available
    let client = gemini_client(&config, args.api_key.clone())?;

    let grade = Grade::from_name(&args.grade);
    let mut book = Book::from_name(&args.book);
    if let Some(id) = &args.book_id {
        book.id = id.clone();
    }

    let store = book_store(&config);
    let document = match &args.input {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Input file not found: {}", path.display());
            }
            let file = StoredFile::read(path).await?;
            let document = PdfDocument::load(&file.data)?;
            if args.save {
                // The lesson does not depend on the library copy
                match store.put(&book.id, &file).await {
                    Ok(()) => info!("Saved {} to the library as {}", file.name, book.id),
                    Err(e) => {
                        warn!("Could not save {} as {}: {}", file.name, book.id, e);
                        eprintln!(
                            "{} Could not save {} to the library: {}",
                            style("⚠").yellow(),
                            file.name,
                            e
                        );
                    }
                }
            }
            document
        }
        None => match store.get(&book.id).await? {
            Some(file) => {
                debug!("Using saved textbook {} for {}", file.name, book.id);
                PdfDocument::load(&file.data)?
            }
            None => anyhow::bail!(
                "No PDF given and no textbook saved for {}. Run 'lessonprep library add'.",
                book.id
            ),
        },
    };

    let question_count = args.questions.unwrap_or(config.generation.question_count);

    let mut session = LessonSession::new(config.locale);
    session.select_grade(grade.clone());
    session.select_book(book.clone());

    let orchestrator = LessonOrchestrator::new(
        client,
        Rasterizer::new(config.render.raster_options()),
        session,
    );

    let pb = spinner("Rendering pages and generating lesson...");
    let commit = orchestrator.generate(&document, &args.pages, question_count).await;
    pb.finish_and_clear();

    let (content, images) = {
        let session = orchestrator.session();
        match commit {
            Commit::Applied => {}
            Commit::Failed => anyhow::bail!(
                "{}",
                session.error().unwrap_or("lesson generation failed")
            ),
            Commit::Stale => anyhow::bail!("lesson generation was interrupted"),
        }
        let content = session.content().cloned();
        match content {
            Some(content) => (content, session.images().to_vec()),
            None => anyhow::bail!("lesson generation produced no content"),
        }
    };

    for issue in content.validate() {
        eprintln!("{} {}", style("⚠").yellow(), issue);
    }

    if let Some(output_path) = &args.output {
        let bundle = LessonBundle {
            grade: grade.name,
            book: book.name,
            pages: resolve_pages(&args.pages),
            images,
            content: content.clone(),
            created_at: Utc::now(),
        };
        bundle.save(output_path)?;
        eprintln!(
            "{} Lesson written to {}",
            style("✓").green(),
            output_path.display()
        );
    }

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&content)?),
        OutputFormat::Text => print!("{}", format_text(&content, args.length.into())),
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Render a lesson for the terminal.
pub fn format_text(content: &LessonContent, length: ExplanationLength) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}\n\n", style(&content.topic).bold()));
    output.push_str(content.explanation.get(length));
    output.push_str("\n\n");

    output.push_str(&format!("{}\n", style("Quiz").underlined()));
    for (i, item) in content.quiz.iter().enumerate() {
        output.push_str(&format!("{}. {}\n", i + 1, item.question));
        for option in &item.options {
            output.push_str(&format!("   - {}\n", option));
        }
    }
    output.push('\n');

    output.push_str(&format!("{}\n", style("Flashcards").underlined()));
    for card in &content.flashcards {
        output.push_str(&format!("  {}: {}\n", style(&card.term).cyan(), card.definition));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_count_choices() {
        assert_eq!(parse_question_count("15"), Ok(15));
        assert!(parse_question_count("7").is_err());
        assert!(parse_question_count("ten").is_err());
    }
}
