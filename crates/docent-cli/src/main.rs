//! Docent CLI - Question answering over an uploaded document.
//!
//! # Usage
//!
//! ```bash
//! # Replace the corpus with a document (prior corpus is discarded)
//! docent ingest report.txt
//!
//! # Ask a question against the ingested corpus
//! docent ask "What is the capital of France?"
//! docent ask "What changed in Q3?" -k 3
//!
//! # Show what is currently indexed
//! docent status
//! ```

mod config;
mod loader;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Settings;
use docent_core::config::SimilarityMetric;
use docent_core::embedding::OpenAiEmbedder;
use docent_core::generation::HfChatGenerator;
use docent_core::index::VectorIndex;
use docent_core::ingest::IngestionPipeline;
use docent_core::retrieval::RetrievalService;
use docent_core::swap::IndexSwapCoordinator;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Docent document QA CLI.
///
/// Ingest a document and ask questions answered from its contents.
/// A new ingest replaces the previous corpus entirely.
#[derive(Parser)]
#[command(name = "docent", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a document, replacing the current corpus
    Ingest {
        /// Path to a UTF-8 text or markdown document
        path: PathBuf,
    },
    /// Ask a question against the ingested corpus
    Ask {
        /// The question to answer
        question: String,

        /// Number of chunks to retrieve (defaults to SEARCH_K)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Show the state of the current index
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_env()?;
    match cli.command {
        Command::Ingest { path } => ingest(&settings, &path).await,
        Command::Ask { question, top_k } => ask(&settings, &question, top_k).await,
        Command::Status => status(&settings),
    }
}

/// Builds the embedder, generator, service, and coordinator from settings.
fn build_stack(settings: &Settings) -> Result<(Arc<RetrievalService>, IndexSwapCoordinator)> {
    let normalize = settings.retrieval.similarity_metric == SimilarityMetric::Cosine;
    let embedder = Arc::new(OpenAiEmbedder::new(
        settings.openai_api_key.clone(),
        settings.embedding_model.clone(),
        settings.retrieval.embedding_dimension,
        settings.embedding_endpoint.clone(),
        settings.retrieval.provider_timeout,
        normalize,
    )?);
    let generator = Arc::new(HfChatGenerator::new(
        settings.hf_api_token.clone(),
        settings.llm_repo_id.clone(),
        settings.llm_endpoint.clone(),
        settings.retrieval.provider_timeout,
    )?);

    let service = Arc::new(RetrievalService::new(
        embedder.clone(),
        generator,
        settings.retrieval.clone(),
        settings.generation.clone(),
    ));
    let pipeline = IngestionPipeline::new(embedder, settings.retrieval.clone());
    let coordinator =
        IndexSwapCoordinator::new(pipeline, Arc::clone(&service), settings.index_path());
    Ok((service, coordinator))
}

async fn ingest(settings: &Settings, path: &std::path::Path) -> Result<()> {
    let document = loader::load_source_document(path)?;

    // Retain the raw source alongside the index so the corpus can be
    // re-ingested later (e.g. after a config change).
    let sources_dir = settings.sources_dir();
    std::fs::create_dir_all(&sources_dir)
        .with_context(|| format!("failed to create {}", sources_dir.display()))?;
    let retained = sources_dir.join(&document.source_id);
    std::fs::copy(path, &retained)
        .with_context(|| format!("failed to retain source at {}", retained.display()))?;

    // Prior raw sources are discarded only after the new snapshot is
    // persisted and published.
    let keep = document.source_id.clone();
    let cleanup_dir = sources_dir.clone();
    let (_, coordinator) = build_stack(settings)?;
    let coordinator = coordinator.with_cleanup(Box::new(move || {
        discard_other_sources(&cleanup_dir, &keep);
    }));

    let outcome = coordinator.replace_corpus(&[document]).await?;
    println!(
        "Ingested {} ({} chunks indexed at {})",
        path.display(),
        outcome.chunks,
        coordinator.artifact_path().display()
    );
    Ok(())
}

/// Removes every file in the sources directory except `keep`.
fn discard_other_sources(dir: &std::path::Path, keep: &str) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("failed to list {}: {e}", dir.display());
            return;
        }
    };
    for entry in entries.flatten() {
        if entry.file_name().to_string_lossy() != keep {
            if let Err(e) = std::fs::remove_file(entry.path()) {
                warn!("failed to remove {}: {e}", entry.path().display());
            }
        }
    }
}

async fn ask(settings: &Settings, question: &str, top_k: Option<usize>) -> Result<()> {
    let (service, coordinator) = build_stack(settings)?;
    coordinator
        .restore()
        .await
        .context("failed to load the index artifact")?;

    let result = service.answer(question, top_k).await?;
    println!("{}", result.answer);
    if !result.sources.is_empty() {
        println!("\nSources:");
        for (rank, source) in result.sources.iter().enumerate() {
            let preview: String = source.content.chars().take(80).collect();
            println!(
                "  {}. {} (page {}, score {:.3}): {}",
                rank + 1,
                source.source_id,
                source.page,
                source.score,
                preview
            );
        }
    }
    Ok(())
}

fn status(settings: &Settings) -> Result<()> {
    match VectorIndex::load(&settings.index_path()) {
        Ok(index) => {
            println!(
                "Index: {} chunks, {} dims, {} metric, embedder {}",
                index.len(),
                index.dimension(),
                index.metric().as_str(),
                index.embedder_id()
            );
        }
        Err(docent_core::error::IndexError::NotFound) => {
            println!("No corpus ingested yet ({})", settings.index_path().display());
        }
        Err(e) => return Err(e).context("failed to read the index artifact"),
    }
    Ok(())
}
