//! secqa command-line interface.
//!
//! Three entry points around the orchestration core: a one-shot question,
//! an interactive chat session, and the corpus build tool. Credentials
//! and deployment names come from the environment (or a `.env` file);
//! the corpus is a JSON file produced by `build-index`.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use secqa_agent::Orchestrator;
use secqa_completions::{AzureChatClient, CompletionClient, Conversation};
use secqa_embeddings::{AzureEmbeddingClient, EmbeddingProvider};
use secqa_passage_store::{Chunk, PassageIndex, TextChunker};

#[derive(Parser)]
#[command(
    name = "secqa",
    about = "Domain Q&A over NIST security publications",
    version
)]
struct Cli {
    /// Corpus file to use (defaults to the user data directory).
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a single question and print the answer.
    Ask {
        /// The question text.
        #[arg(required = true)]
        question: Vec<String>,
    },

    /// Start an interactive chat session.
    Chat,

    /// Chunk, embed and index plain-text documents into a corpus file.
    BuildIndex {
        /// Directory of .txt/.md files to ingest.
        docs_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Cli { corpus, command } = Cli::parse();
    let corpus_path = corpus.unwrap_or_else(default_corpus_path);

    match command {
        Command::Ask { question } => ask(&corpus_path, &question.join(" ")).await,
        Command::Chat => chat(&corpus_path).await,
        Command::BuildIndex { docs_dir } => build_index(&docs_dir, &corpus_path).await,
    }
}

fn default_corpus_path() -> PathBuf {
    dirs::data_dir().unwrap_or_default().join("secqa/corpus.json")
}

/// Load the corpus and wire up the gateways.
fn load_orchestrator(corpus_path: &Path) -> anyhow::Result<Orchestrator> {
    let index = PassageIndex::load(corpus_path).with_context(|| {
        format!(
            "failed to load corpus from {} (run `secqa build-index` first)",
            corpus_path.display()
        )
    })?;
    info!(
        "Loaded corpus: {} chunks, dimension {}",
        index.len(),
        index.dimension()
    );

    let embedder = AzureEmbeddingClient::from_env()
        .context("embedding backend not configured, check AZURE_OPENAI_ENDPOINT / EMBED_DEPLOYMENT / EMBED_API_VERSION")?
        .with_dimension(index.dimension());
    if !embedder.is_available() {
        bail!("AZURE_OPENAI_KEY is not set");
    }

    let completions = AzureChatClient::from_env()
        .context("chat backend not configured, check AZURE_OPENAI_ENDPOINT / CHAT_DEPLOYMENT / CHAT_API_VERSION")?;
    if !completions.is_available() {
        bail!("AZURE_OPENAI_KEY is not set");
    }

    Ok(Orchestrator::new(
        Arc::new(embedder),
        Arc::new(completions),
        Arc::new(index),
    ))
}

/// Answer a single question. Any gateway failure exits non-zero.
async fn ask(corpus_path: &Path, question: &str) -> anyhow::Result<()> {
    let orchestrator = load_orchestrator(corpus_path)?;

    let outcome = orchestrator
        .answer(&Conversation::new(), question)
        .await
        .context("failed to answer the question")?;

    println!("{}", outcome.answer);
    Ok(())
}

/// Interactive chat loop. A failed turn reports the error and leaves the
/// session history untouched; the session keeps going.
async fn chat(corpus_path: &Path) -> anyhow::Result<()> {
    let orchestrator = load_orchestrator(corpus_path)?;

    println!("{}", "=".repeat(70));
    println!("secqa - NIST security Q&A");
    println!("{}", "=".repeat(70));
    println!("Type your questions (or 'quit'/'exit' to stop)");
    println!("{}", "-".repeat(70));

    let mut conversation = Conversation::new();
    let stdin = std::io::stdin();

    loop {
        print!("\n[You]: ");
        std::io::stdout().flush()?;

        let Some(line) = stdin.lock().lines().next() else {
            break;
        };
        let input = line?.trim().to_string();

        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "quit" | "exit" | "q") {
            println!("\nGoodbye!");
            break;
        }

        match orchestrator.answer(&conversation, &input).await {
            Ok(outcome) => {
                println!("\n[Agent]: {}", outcome.answer);
                println!("{}", "-".repeat(70));
                conversation = outcome.conversation;
            }
            Err(err) => {
                eprintln!("\nError: {err}");
                eprintln!("Please try again.");
            }
        }
    }

    Ok(())
}

/// Build the corpus: chunk every document, embed every chunk, save.
async fn build_index(docs_dir: &Path, corpus_path: &Path) -> anyhow::Result<()> {
    let documents = collect_documents(docs_dir)?;
    if documents.is_empty() {
        bail!("no .txt or .md documents found in {}", docs_dir.display());
    }

    let chunker = TextChunker::default();
    let mut chunks = Vec::new();
    for (filename, contents) in &documents {
        for text in chunker.chunk(contents) {
            let id = chunks.len() as u64;
            chunks.push(
                Chunk::new(id, text)
                    .with_metadata(serde_json::json!({ "filename": filename })),
            );
        }
        info!("{filename}: {} chunks so far", chunks.len());
    }

    let embedder = AzureEmbeddingClient::from_env()
        .context("embedding backend not configured")?;
    if !embedder.is_available() {
        bail!("AZURE_OPENAI_KEY is not set");
    }

    info!("Embedding {} chunks...", chunks.len());
    let mut embeddings = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        embeddings.push(embedder.embed(&chunk.text).await?);
        if (i + 1) % 10 == 0 {
            info!("[{}/{}] embedded", i + 1, chunks.len());
        }
    }

    let index = PassageIndex::build(chunks, embeddings)?;
    if let Some(parent) = corpus_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    index.save(corpus_path)?;

    println!(
        "Built corpus with {} chunks at {}",
        index.len(),
        corpus_path.display()
    );
    Ok(())
}

/// Read every .txt/.md file under `dir`, sorted by name for stable ids.
fn collect_documents(dir: &Path) -> anyhow::Result<Vec<(String, String)>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("txt") | Some("md")
            )
        })
        .collect();
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        documents.push((name, contents));
    }

    Ok(documents)
}
