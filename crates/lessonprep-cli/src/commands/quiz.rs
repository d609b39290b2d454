//! Quiz command - take the quiz of a saved lesson, or replace it with a fresh one.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use console::{style, Term};

use lessonprep_core::models::bundle::LessonBundle;
use lessonprep_core::models::quiz::QuizAttempt;
use lessonprep_core::{Book, Commit, Grade, LessonOrchestrator, LessonSession, QuizItem, Rasterizer};

use super::generate::{gemini_client, spinner};
use super::load_config;

/// Arguments for the quiz command.
#[derive(Args)]
pub struct QuizArgs {
    /// Lesson bundle written by `lessonprep generate --output`
    #[arg(required = true)]
    bundle: PathBuf,

    /// Generate a new quiz from the same page images before starting
    #[arg(long)]
    regenerate: bool,

    /// Answers as option numbers, e.g. "2,1,4" (skips interactive input)
    #[arg(long, value_delimiter = ',')]
    answers: Option<Vec<usize>>,

    /// Gemini API key (only needed with --regenerate)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

pub async fn run(args: QuizArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    if !args.bundle.exists() {
        anyhow::bail!("Lesson file not found: {}", args.bundle.display());
    }
    let mut bundle = LessonBundle::from_file(&args.bundle)?;

    if args.regenerate {
        bundle.content.quiz = regenerate(&bundle, config_path, args.api_key).await?;
        write_bundle(&bundle, &args.bundle)?;
        eprintln!(
            "{} New quiz saved to {}",
            style("✓").green(),
            args.bundle.display()
        );
    }

    let quiz = &bundle.content.quiz;
    if quiz.is_empty() {
        anyhow::bail!("This lesson has no quiz questions");
    }

    let mut attempt = QuizAttempt::new(quiz.len());
    match args.answers {
        Some(answers) => {
            for (index, choice) in answers.into_iter().enumerate().take(quiz.len()) {
                if let Some(option) = option_for(&quiz[index], choice) {
                    attempt.answer(index, option);
                }
            }
        }
        None => ask(quiz, &mut attempt)?,
    }

    attempt.finish();
    print_results(quiz, &attempt);
    Ok(())
}

/// Replace the quiz using the page images stored in the bundle.
async fn regenerate(
    bundle: &LessonBundle,
    config_path: Option<&str>,
    api_key: Option<String>,
) -> anyhow::Result<Vec<QuizItem>> {
    let config = load_config(config_path)?;
    let client = gemini_client(&config, api_key)?;

    let mut session = LessonSession::new(config.locale);
    session.resume(
        Grade::from_name(&bundle.grade),
        Book::from_name(&bundle.book),
        bundle.images.clone(),
        bundle.content.clone(),
    );
    let orchestrator = LessonOrchestrator::new(
        client,
        Rasterizer::new(config.render.raster_options()),
        session,
    );

    let pb = spinner("Generating a new quiz...");
    let commit = orchestrator.regenerate_quiz().await;
    pb.finish_and_clear();

    let session = orchestrator.session();
    match commit {
        Some(Commit::Applied) => {}
        Some(Commit::Failed) => {
            anyhow::bail!("{}", session.error().unwrap_or("quiz generation failed"))
        }
        Some(Commit::Stale) => anyhow::bail!("quiz generation was interrupted"),
        None => anyhow::bail!("The lesson bundle has no page images to generate from"),
    }
    let quiz = session.content().map(|content| content.quiz.clone());
    quiz.ok_or_else(|| anyhow::anyhow!("quiz generation produced no content"))
}

/// Keep a copy of the previous bundle next to the file before overwriting it.
fn write_bundle(bundle: &LessonBundle, path: &Path) -> anyhow::Result<()> {
    fs::copy(path, path.with_extension("json.bak"))?;
    bundle.save(path)?;
    Ok(())
}

/// Map a 1-based option number to the option text.
fn option_for(item: &QuizItem, choice: usize) -> Option<&str> {
    choice
        .checked_sub(1)
        .and_then(|i| item.options.get(i))
        .map(String::as_str)
}

fn ask(quiz: &[QuizItem], attempt: &mut QuizAttempt) -> anyhow::Result<()> {
    let term = Term::stdout();

    for (index, item) in quiz.iter().enumerate() {
        term.write_line(&format!("\n{}. {}", index + 1, style(&item.question).bold()))?;
        for (i, option) in item.options.iter().enumerate() {
            term.write_line(&format!("   {}) {}", i + 1, option))?;
        }

        loop {
            term.write_str("Answer: ")?;
            let line = term.read_line()?;
            let picked = line
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|choice| option_for(item, choice));
            match picked {
                Some(option) => {
                    attempt.answer(index, option);
                    break;
                }
                None => term.write_line(&format!(
                    "{} Enter a number from 1 to {}",
                    style("✗").red(),
                    item.options.len()
                ))?,
            }
        }
    }

    Ok(())
}

fn print_results(quiz: &[QuizItem], attempt: &QuizAttempt) {
    println!();
    for (index, item) in quiz.iter().enumerate() {
        match attempt.answer_for(index) {
            Some(answer) if item.is_correct(answer) => {
                println!("{} {}", style("✓").green(), item.question);
            }
            answer => {
                println!("{} {}", style("✗").red(), item.question);
                if let Some(answer) = answer {
                    println!("    your answer: {}", answer);
                }
                println!("    correct: {}", item.correct_answer);
            }
        }
    }

    println!();
    println!("Score: {}/{}", attempt.score(quiz), quiz.len());
}
