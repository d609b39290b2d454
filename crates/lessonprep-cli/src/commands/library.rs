//! Library command - manage textbook files saved per book id.

use std::fs;
use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;
use tracing::warn;

use lessonprep_core::models::catalog::slugify;
use lessonprep_core::StoredFile;

use super::{book_store, load_config};

/// Arguments for the library command.
#[derive(Args)]
pub struct LibraryArgs {
    #[command(subcommand)]
    command: LibraryCommand,
}

#[derive(Subcommand)]
enum LibraryCommand {
    /// Save a textbook PDF, replacing any file saved for the same book
    Add {
        /// PDF file to save
        file: PathBuf,

        /// Book id (default: derived from --name or the file name)
        #[arg(long)]
        id: Option<String>,

        /// Book name to derive the id from
        #[arg(long)]
        name: Option<String>,
    },

    /// Copy a saved textbook out of the library
    Export {
        /// Book id
        id: String,

        /// Destination path (default: original file name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove a saved textbook
    Remove {
        /// Book id
        id: String,
    },

    /// List saved book ids
    List,

    /// Show the library directory
    Path,
}

pub async fn run(args: LibraryArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = book_store(&config);

    match args.command {
        LibraryCommand::Add { file, id, name } => {
            if !file.exists() {
                anyhow::bail!("Input file not found: {}", file.display());
            }
            let id = match (id, name) {
                (Some(id), _) => id,
                (None, Some(name)) => slugify(&name),
                (None, None) => slugify(
                    &file
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                ),
            };

            let stored = StoredFile::read(&file).await?;
            store.put(&id, &stored).await?;
            println!(
                "{} Saved {} as {}",
                style("✓").green(),
                stored.name,
                style(&id).bold()
            );
        }
        LibraryCommand::Export { id, output } => {
            let Some(stored) = store.get(&id).await? else {
                anyhow::bail!("No textbook saved for {}", id);
            };
            let output = output.unwrap_or_else(|| PathBuf::from(&stored.name));
            fs::write(&output, &stored.data)?;
            println!(
                "{} Wrote {} ({} bytes)",
                style("✓").green(),
                output.display(),
                stored.data.len()
            );
        }
        LibraryCommand::Remove { id } => {
            // A record that cannot be removed is left for the next attempt
            if let Err(e) = store.delete(&id).await {
                warn!("Failed to remove {}: {}", id, e);
                eprintln!("{} Could not remove {}: {}", style("⚠").yellow(), id, e);
            }
            println!("{} Removed {}", style("✓").green(), id);
        }
        LibraryCommand::List => {
            let ids = store.list().await?;
            if ids.is_empty() {
                println!("{} No saved textbooks.", style("ℹ").blue());
            }
            for id in ids {
                println!("{}", id);
            }
        }
        LibraryCommand::Path => {
            println!("{}", store.root().display());
        }
    }

    Ok(())
}
