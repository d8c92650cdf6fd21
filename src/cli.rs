//! Command-line interface

use crate::client::ReviewClient;
use crate::generation::OllamaGenerator;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Parser)]
#[command(
    name = "review-rag",
    version,
    long_version = LONG_VERSION,
    about = "Semantic code index and review context for change review"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build (or rebuild) the semantic index for a source tree
    Index {
        /// Root of the source tree
        path: PathBuf,
    },
    /// Search the index with a text query
    Search {
        /// The search query
        query: String,
        /// Root of the indexed source tree
        #[arg(long, default_value = ".")]
        path: PathBuf,
        /// Number of results to return
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Review the working-tree changes of a repository
    Review {
        /// Repository root
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Index { path } => {
            let client = ReviewClient::new().await?;

            // Ctrl-C cancels the build instead of killing it mid-write
            let cancel = CancellationToken::new();
            let cancel_on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Interrupt received, cancelling build");
                    cancel_on_signal.cancel();
                }
            });

            let report = client.build_index(&path, cancel).await?;
            println!(
                "Indexed {} files into {} chunks in {}ms ({} embeddings reused, {} generated)",
                report.files_indexed,
                report.chunks_created,
                report.duration_ms,
                report.embeddings_reused,
                report.embeddings_generated
            );
            for error in &report.errors {
                eprintln!("warning: {error}");
            }
        }
        Commands::Search { query, path, top_k } => {
            let client = ReviewClient::new().await?;
            let results = client.search(&path, &query, top_k).await?;

            if results.is_empty() {
                println!("No results.");
            }
            for result in results {
                println!(
                    "{}:{}-{}  score {:.3}{}",
                    result.path,
                    result.start_line,
                    result.end_line,
                    result.score,
                    result
                        .symbol
                        .as_deref()
                        .map(|s| format!("  ({s})"))
                        .unwrap_or_default()
                );
                println!("{}", result.content);
                println!();
            }
        }
        Commands::Review { path } => {
            let client = ReviewClient::new().await?;
            let generator = OllamaGenerator::new(
                &client.config().generation.url,
                client.config().generation.model_name.clone(),
            );

            let review = client.review(&path, &generator).await?;
            println!("{review}");
        }
    }

    Ok(())
}
