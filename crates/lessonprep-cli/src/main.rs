//! CLI application for preparing lessons from textbook PDFs.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, generate, library, pages, quiz};

/// Lesson preparation - turn textbook pages into explanations, quizzes and flashcards
#[derive(Parser)]
#[command(name = "lessonprep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a page selection such as "25-30, 40"
    Pages(pages::PagesArgs),

    /// Generate a lesson from textbook pages
    Generate(generate::GenerateArgs),

    /// Take or regenerate the quiz of a saved lesson
    Quiz(quiz::QuizArgs),

    /// Manage saved textbook files
    Library(library::LibraryArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Pages(args) => pages::run(args, config_path),
        Commands::Generate(args) => generate::run(args, config_path).await,
        Commands::Quiz(args) => quiz::run(args, config_path).await,
        Commands::Library(args) => library::run(args, config_path).await,
        Commands::Config(args) => config::run(args).await,
    }
}
